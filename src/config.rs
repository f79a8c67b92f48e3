/// 機体・負載の識別情報（デプロイ先ごとに固定）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroneConfig {
    pub model: String,
    pub drone_enum_value: String,
    pub drone_sub_enum_value: String,
    pub payload_enum_value: String,
    pub payload_position_index: String,
}

impl Default for DroneConfig {
    fn default() -> Self {
        // Mavic 3T
        Self {
            model: "M3T".to_string(),
            drone_enum_value: "77".to_string(),
            drone_sub_enum_value: "1".to_string(),
            payload_enum_value: "67".to_string(),
            payload_position_index: "0".to_string(),
        }
    }
}
