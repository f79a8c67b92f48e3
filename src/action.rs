use tracing::warn;

use crate::model::ActionDescriptor;

const MOUNT_POSITION: &str = "0";

/// 汎用の動作名から変換したWPMLのアクチュエータ関数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorFunc {
    TakePhoto,
    StartRecord,
    StopRecord,
    Focus,
    Zoom,
    CustomDirName,
    GimbalRotate { pitch_angle: String },
    RotateYaw { heading: String },
    Hover { time: String },
    GimbalEvenlyRotate,
    OrientedShoot,
    PanoShot,
    RecordPointCloud,
    /// 未対応の動作名は空の関数として出力する
    Unknown(String),
}

impl ActuatorFunc {
    pub fn from_descriptor(descriptor: &ActionDescriptor) -> Self {
        match descriptor.action.as_str() {
            "ShootPhoto" => Self::TakePhoto,
            "StartRecording" => Self::StartRecord,
            "StopRecording" => Self::StopRecord,
            "focus" => Self::Focus,
            "zoom" => Self::Zoom,
            "customDirName" => Self::CustomDirName,
            "GimbalPitch" => Self::GimbalRotate {
                pitch_angle: descriptor.param.clone(),
            },
            "AircraftYaw" => Self::RotateYaw {
                heading: descriptor.param.clone(),
            },
            "Hovering" => Self::Hover {
                time: descriptor.param.clone(),
            },
            "gimbalEvenlyRotate" => Self::GimbalEvenlyRotate,
            "orientedShoot" => Self::OrientedShoot,
            "panoShot" => Self::PanoShot,
            "recordPointCloud" => Self::RecordPointCloud,
            other => {
                warn!("Unsupported action {:?}, emitting empty actuator function", other);
                Self::Unknown(other.to_string())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TakePhoto => "takePhoto",
            Self::StartRecord => "startRecord",
            Self::StopRecord => "stopRecord",
            Self::Focus => "focus",
            Self::Zoom => "zoom",
            Self::CustomDirName => "customDirName",
            Self::GimbalRotate { .. } => "gimbalRotate",
            Self::RotateYaw { .. } => "rotateYaw",
            Self::Hover { .. } => "hover",
            Self::GimbalEvenlyRotate => "gimbalEvenlyRotate",
            Self::OrientedShoot => "orientedShoot",
            Self::PanoShot => "panoShot",
            Self::RecordPointCloud => "recordPointCloud",
            Self::Unknown(_) => "",
        }
    }

    /// `wpml:actionActuatorFuncParam` の子要素（出力順）
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::TakePhoto | Self::StartRecord => fixed(&[
                ("payloadPositionIndex", MOUNT_POSITION),
                ("fileSuffix", ""),
                ("useGlobalPayloadLensIndex", "1"),
            ]),
            Self::StopRecord => fixed(&[
                ("payloadPositionIndex", MOUNT_POSITION),
                ("payloadLensIndex", "zoom"),
            ]),
            Self::Focus => fixed(&[
                ("payloadPositionIndex", MOUNT_POSITION),
                ("isPointFocus", "0"),
                ("focusX", "0.5"),
                ("focusY", "0.5"),
                ("focusRegionWidth", "0"),
                ("focusRegionHeight", "0"),
                ("isInfiniteFocus", "0"),
            ]),
            Self::Zoom => fixed(&[
                ("payloadPositionIndex", MOUNT_POSITION),
                ("focalLength", "50"),
            ]),
            Self::CustomDirName => fixed(&[
                ("payloadPositionIndex", MOUNT_POSITION),
                ("directoryName", "folder"),
            ]),
            Self::GimbalRotate { pitch_angle } => fixed(&[
                ("payloadPositionIndex", MOUNT_POSITION),
                ("gimbalHeadingYawBase", "north"),
                ("gimbalRotateMode", "absoluteAngle"),
                ("gimbalPitchRotateEnable", "1"),
                ("gimbalPitchRotateAngle", pitch_angle.as_str()),
                ("gimbalRollRotateEnable", "0"),
                ("gimbalRollRotateAngle", "0"),
                ("gimbalYawRotateEnable", "0"),
                ("gimbalYawRotateAngle", "0"),
                ("gimbalRotateTimeEnable", "0"),
                ("gimbalRotateTime", "0"),
            ]),
            Self::RotateYaw { heading } => fixed(&[
                ("aircraftHeading", heading.as_str()),
                ("aircraftPathMode", "counterClockwise"),
            ]),
            Self::Hover { time } => fixed(&[("hoverTime", time.as_str())]),
            Self::GimbalEvenlyRotate => fixed(&[
                ("gimbalPitchRotateAngle", "0"),
                ("payloadPositionIndex", MOUNT_POSITION),
            ]),
            Self::RecordPointCloud => fixed(&[
                ("payloadPositionIndex", MOUNT_POSITION),
                ("recordPointCloudOperate", "startRecord"),
            ]),
            Self::OrientedShoot | Self::PanoShot | Self::Unknown(_) => Vec::new(),
        }
    }
}

fn fixed(pairs: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
    pairs.iter().map(|&(k, v)| (k, v.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(action: &str, param: &str) -> ActionDescriptor {
        ActionDescriptor {
            action: action.to_string(),
            param: param.to_string(),
            ..Default::default()
        }
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_function_names() {
        let table = [
            ("ShootPhoto", "takePhoto"),
            ("StartRecording", "startRecord"),
            ("StopRecording", "stopRecord"),
            ("focus", "focus"),
            ("zoom", "zoom"),
            ("customDirName", "customDirName"),
            ("GimbalPitch", "gimbalRotate"),
            ("AircraftYaw", "rotateYaw"),
            ("Hovering", "hover"),
            ("gimbalEvenlyRotate", "gimbalEvenlyRotate"),
            ("orientedShoot", "orientedShoot"),
            ("panoShot", "panoShot"),
            ("recordPointCloud", "recordPointCloud"),
        ];

        for (action, expected) in table {
            let func = ActuatorFunc::from_descriptor(&descriptor(action, ""));
            assert_eq!(func.name(), expected, "{action}");
        }
    }

    #[test]
    fn test_params_for_every_action() {
        let table: [(&str, &str, &[(&str, &str)]); 13] = [
            (
                "ShootPhoto",
                "",
                &[
                    ("payloadPositionIndex", "0"),
                    ("fileSuffix", ""),
                    ("useGlobalPayloadLensIndex", "1"),
                ],
            ),
            (
                "StartRecording",
                "",
                &[
                    ("payloadPositionIndex", "0"),
                    ("fileSuffix", ""),
                    ("useGlobalPayloadLensIndex", "1"),
                ],
            ),
            (
                "StopRecording",
                "",
                &[("payloadPositionIndex", "0"), ("payloadLensIndex", "zoom")],
            ),
            (
                "focus",
                "",
                &[
                    ("payloadPositionIndex", "0"),
                    ("isPointFocus", "0"),
                    ("focusX", "0.5"),
                    ("focusY", "0.5"),
                    ("focusRegionWidth", "0"),
                    ("focusRegionHeight", "0"),
                    ("isInfiniteFocus", "0"),
                ],
            ),
            (
                "zoom",
                "",
                &[("payloadPositionIndex", "0"), ("focalLength", "50")],
            ),
            (
                "customDirName",
                "",
                &[("payloadPositionIndex", "0"), ("directoryName", "folder")],
            ),
            (
                "GimbalPitch",
                "-30",
                &[
                    ("payloadPositionIndex", "0"),
                    ("gimbalHeadingYawBase", "north"),
                    ("gimbalRotateMode", "absoluteAngle"),
                    ("gimbalPitchRotateEnable", "1"),
                    ("gimbalPitchRotateAngle", "-30"),
                    ("gimbalRollRotateEnable", "0"),
                    ("gimbalRollRotateAngle", "0"),
                    ("gimbalYawRotateEnable", "0"),
                    ("gimbalYawRotateAngle", "0"),
                    ("gimbalRotateTimeEnable", "0"),
                    ("gimbalRotateTime", "0"),
                ],
            ),
            (
                "AircraftYaw",
                "45",
                &[
                    ("aircraftHeading", "45"),
                    ("aircraftPathMode", "counterClockwise"),
                ],
            ),
            ("Hovering", "3000", &[("hoverTime", "3000")]),
            (
                "gimbalEvenlyRotate",
                "",
                &[("gimbalPitchRotateAngle", "0"), ("payloadPositionIndex", "0")],
            ),
            ("orientedShoot", "", &[]),
            ("panoShot", "", &[]),
            (
                "recordPointCloud",
                "",
                &[
                    ("payloadPositionIndex", "0"),
                    ("recordPointCloudOperate", "startRecord"),
                ],
            ),
        ];

        for (action, value, expected) in table {
            let params = ActuatorFunc::from_descriptor(&descriptor(action, value)).params();
            let expected: Vec<(&str, String)> =
                expected.iter().map(|&(k, v)| (k, v.to_string())).collect();
            assert_eq!(params, expected, "{action}");
        }
    }

    #[test]
    fn test_param_driven_actions() {
        let hover = ActuatorFunc::from_descriptor(&descriptor("Hovering", "5")).params();
        assert_eq!(hover, vec![("hoverTime", "5".to_string())]);

        let gimbal = ActuatorFunc::from_descriptor(&descriptor("GimbalPitch", "-90")).params();
        assert_eq!(param(&gimbal, "gimbalPitchRotateAngle"), Some("-90"));
        assert_eq!(param(&gimbal, "gimbalYawRotateAngle"), Some("0"));
        assert_eq!(param(&gimbal, "gimbalHeadingYawBase"), Some("north"));

        let yaw = ActuatorFunc::from_descriptor(&descriptor("AircraftYaw", "135")).params();
        assert_eq!(param(&yaw, "aircraftHeading"), Some("135"));
        assert_eq!(param(&yaw, "aircraftPathMode"), Some("counterClockwise"));
    }

    #[test]
    fn test_fixed_literals_ignore_param() {
        let zoom = ActuatorFunc::from_descriptor(&descriptor("zoom", "200")).params();
        assert_eq!(param(&zoom, "focalLength"), Some("50"));

        let dir = ActuatorFunc::from_descriptor(&descriptor("customDirName", "mission-7")).params();
        assert_eq!(param(&dir, "directoryName"), Some("folder"));
    }

    #[test]
    fn test_unknown_action_passes_through() {
        let func = ActuatorFunc::from_descriptor(&descriptor("Somersault", "3"));
        assert_eq!(func, ActuatorFunc::Unknown("Somersault".to_string()));
        assert_eq!(func.name(), "");
        assert!(func.params().is_empty());
    }

    #[test]
    fn test_parameterless_actions() {
        for action in ["orientedShoot", "panoShot"] {
            let func = ActuatorFunc::from_descriptor(&descriptor(action, "1"));
            assert!(func.params().is_empty(), "{action}");
        }
    }
}
