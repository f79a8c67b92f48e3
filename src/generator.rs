use std::fmt;
use std::io::{self, Cursor};
use std::time::{SystemTime, UNIX_EPOCH};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, info};

use crate::action::ActuatorFunc;
use crate::config::DroneConfig;
use crate::error::{Error, Result};
use crate::mission::{Mission, Waypoint};
use crate::model::{ActionDescriptor, SemanticNode};
use crate::sequence::{ActionGroupSlot, Sequence, WaypointSlot};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const WPML_NAMESPACE: &str = "http://www.dji.com/wpmz/1.0.6";

const TURN_MODE: &str = "toPointAndStopWithDiscontinuityCurvature";
const HEADING_MODE: &str = "smoothTransition";
const POI_POINT: &str = "0.000000,0.000000,0.000000";

/// 生成する文書の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// template.kml
    Template,
    /// waylines.wpml
    Execution,
}

impl Mode {
    pub fn file_name(self) -> &'static str {
        match self {
            Mode::Template => "template.kml",
            Mode::Execution => "waylines.wpml",
        }
    }

    /// 動作グループ内の位置から動作IDを求める（テンプレートは常に0）
    pub fn action_id(self, position: usize) -> usize {
        match self {
            Mode::Template => 0,
            Mode::Execution => position,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Template => write!(f, "template"),
            Mode::Execution => write!(f, "execution"),
        }
    }
}

/// quick-xmlのWriterを包んだ要素単位の書き込み
struct XmlBuilder {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlBuilder {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn declaration(&mut self) -> io::Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn element<F>(&mut self, tag: &str, attrs: &[(&str, &str)], body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        let mut start = BytesStart::new(tag);
        for &attr in attrs {
            start.push_attribute(attr);
        }
        self.writer.write_event(Event::Start(start))?;
        body(self)?;
        self.writer.write_event(Event::End(BytesEnd::new(tag)))
    }

    fn leaf(&mut self, tag: &str, text: &str) -> io::Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new(tag)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(tag)))
    }

    fn empty(&mut self, tag: &str) -> io::Result<()> {
        self.writer.write_event(Event::Empty(BytesStart::new(tag)))
    }

    fn wpml_element<F>(&mut self, name: &str, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.element(&format!("wpml:{name}"), &[], body)
    }

    fn wpml(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.leaf(&format!("wpml:{name}"), text)
    }

    fn finish(self) -> io::Result<String> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// 正規化済みツリーからWPML文書を生成する
#[derive(Debug, Clone, Default)]
pub struct WaylineGenerator {
    config: DroneConfig,
    timestamp_ms: Option<u64>,
}

impl WaylineGenerator {
    pub fn new(config: DroneConfig) -> Self {
        Self {
            config,
            timestamp_ms: None,
        }
    }

    /// テンプレートの作成・更新時刻を固定する
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn config(&self) -> &DroneConfig {
        &self.config
    }

    pub fn generate(&self, root: &SemanticNode, mode: Mode) -> Result<String> {
        let mission = Mission::from_root(root, mode)?;
        let xml = self.render(&mission, mode).map_err(Error::Serialize)?;

        info!(
            "Generated {} ({} waypoints, {} bytes)",
            mode.file_name(),
            mission.waypoints.len(),
            xml.len()
        );
        Ok(xml)
    }

    fn render(&self, mission: &Mission, mode: Mode) -> io::Result<String> {
        let mut x = XmlBuilder::new();
        x.declaration()?;

        let namespaces = [("xmlns", KML_NAMESPACE), ("xmlns:wpml", WPML_NAMESPACE)];
        x.element("kml", &namespaces, |x| {
            x.element("Document", &[], |x| {
                if mode == Mode::Template {
                    let now = self.timestamp_ms.unwrap_or_else(now_millis).to_string();
                    x.wpml("author", mission.author.as_deref().unwrap_or_default())?;
                    x.wpml("createTime", &now)?;
                    x.wpml("updateTime", &now)?;
                }
                self.write_mission_config(x, mission)?;
                x.element("Folder", &[], |x| self.write_folder(x, mission, mode))
            })
        })?;

        x.finish()
    }

    fn write_mission_config(&self, x: &mut XmlBuilder, mission: &Mission) -> io::Result<()> {
        let config = &self.config;
        x.wpml_element("missionConfig", |x| {
            x.wpml("flyToWaylineMode", "safely")?;
            x.wpml("finishAction", "goHome")?;
            x.wpml("exitOnRCLost", "executeLostAction")?;
            x.wpml("executeRCLostAction", "goBack")?;
            x.wpml("globalTransitionalSpeed", &mission.global_speed)?;
            x.wpml_element("droneInfo", |x| {
                x.wpml("droneEnumValue", &config.drone_enum_value)?;
                x.wpml("droneSubEnumValue", &config.drone_sub_enum_value)
            })?;
            x.wpml_element("payloadInfo", |x| {
                x.wpml("payloadEnumValue", &config.payload_enum_value)?;
                x.wpml("payloadSubEnumValue", "0")?;
                x.wpml("payloadPositionIndex", &config.payload_position_index)
            })
        })
    }

    fn write_folder(&self, x: &mut XmlBuilder, mission: &Mission, mode: Mode) -> io::Result<()> {
        if mode == Mode::Template {
            x.wpml("templateType", "waypoint")?;
        }
        x.wpml("templateId", "0")?;

        match mode {
            Mode::Template => {
                x.wpml_element("waylineCoordinateSysParam", |x| {
                    x.wpml("coordinateMode", "WGS84")?;
                    x.wpml("heightMode", "EGM96")?;
                    x.wpml("positioningType", "GPS")
                })?;
            }
            Mode::Execution => {
                // 距離・所要時間は算出しない
                x.wpml("executeHeightMode", "WGS84")?;
                x.wpml("waylineId", "0")?;
                x.wpml("distance", "0")?;
                x.wpml("duration", "0")?;
            }
        }
        x.wpml("autoFlightSpeed", &mission.global_speed)?;

        if mode == Mode::Template {
            x.wpml("globalHeight", "0")?;
            x.wpml("caliFlightEnable", "0")?;
            x.wpml("gimbalPitchMode", "manual")?;
            x.wpml_element("globalWaypointHeadingParam", |x| {
                x.wpml("waypointHeadingMode", HEADING_MODE)?;
                x.wpml("waypointHeadingAngle", "0")?;
                x.wpml("waypointPoiPoint", POI_POINT)?;
                x.wpml("waypointHeadingPoiIndex", "0")
            })?;
            x.wpml("globalWaypointTurnMode", TURN_MODE)?;
            x.wpml("globalUseStraightLine", "1")?;
        }

        let mut sequence = Sequence::default();
        for waypoint in &mission.waypoints {
            let (slot, next) = sequence.advance(waypoint.has_actions());
            sequence = next;
            write_placemark(x, mission, waypoint, slot, mode)?;
        }
        debug!(
            "{}: {} waypoints, {} action groups",
            mode, sequence.waypoint_index, sequence.action_group_id
        );

        if mode == Mode::Template {
            x.wpml_element("payloadParam", |x| x.wpml("payloadPositionIndex", "0"))?;
        }

        Ok(())
    }
}

fn write_placemark(
    x: &mut XmlBuilder,
    mission: &Mission,
    waypoint: &Waypoint,
    slot: WaypointSlot,
    mode: Mode,
) -> io::Result<()> {
    debug!(
        "{}: waypoint {} at {} ({} actions)",
        mode,
        slot.index,
        waypoint.coordinates.lat_lon(),
        waypoint.actions.len()
    );

    x.element("Placemark", &[], |x| {
        x.element("Point", &[], |x| {
            x.leaf("coordinates", &waypoint.coordinates.lat_lon())
        })?;
        x.wpml("index", &slot.index.to_string())?;

        let altitude = waypoint.coordinates.altitude.as_str();
        match mode {
            Mode::Template => {
                x.wpml("ellipsoidHeight", altitude)?;
                x.wpml("height", altitude)?;
            }
            Mode::Execution => {
                x.wpml("executeHeight", altitude)?;
                // 航点ごとの速度もミッション全体の速度を使う
                x.wpml("waypointSpeed", &mission.global_speed)?;
            }
        }

        x.wpml_element("waypointHeadingParam", |x| {
            x.wpml("waypointHeadingMode", HEADING_MODE)?;
            x.wpml(
                "waypointHeadingAngle",
                waypoint.heading.as_deref().unwrap_or("0"),
            )?;
            x.wpml("waypointPoiPoint", POI_POINT)?;
            if mode == Mode::Execution {
                x.wpml("waypointHeadingAngleEnable", "1")?;
            }
            x.wpml("waypointHeadingPathMode", "followBadArc")?;
            x.wpml("waypointHeadingPoiIndex", "0")
        })?;

        match mode {
            Mode::Template => {
                x.wpml("useGlobalSpeed", "1")?;
                x.wpml("useGlobalTurnParam", "1")?;
                x.wpml("useStraightLine", "0")?;
            }
            Mode::Execution => {
                x.wpml_element("waypointTurnParam", |x| {
                    x.wpml("waypointTurnMode", TURN_MODE)?;
                    x.wpml("waypointTurnDampingDist", "0")
                })?;
                x.wpml("useStraightLine", "1")?;
            }
        }

        if let Some(group) = slot.action_group {
            write_action_group(x, group, &waypoint.actions, mode)?;
        }

        if mode == Mode::Execution {
            x.wpml_element("waypointGimbalHeadingParam", |x| {
                x.wpml("waypointGimbalPitchAngle", "0")?;
                x.wpml("waypointGimbalYawAngle", "0")
            })?;
        }
        x.wpml("isRisky", "0")?;
        if mode == Mode::Execution {
            x.wpml("waypointWorkType", "0")?;
        }
        Ok(())
    })
}

fn write_action_group(
    x: &mut XmlBuilder,
    group: ActionGroupSlot,
    actions: &[ActionDescriptor],
    mode: Mode,
) -> io::Result<()> {
    x.wpml_element("actionGroup", |x| {
        x.wpml("actionGroupId", &group.id.to_string())?;
        x.wpml("actionGroupStartIndex", &group.start_index.to_string())?;
        x.wpml("actionGroupEndIndex", &group.end_index.to_string())?;
        x.wpml("actionGroupMode", "sequence")?;
        x.wpml_element("actionTrigger", |x| {
            x.wpml("actionTriggerType", "reachPoint")
        })?;

        for (position, descriptor) in actions.iter().enumerate() {
            let func = ActuatorFunc::from_descriptor(descriptor);
            x.wpml_element("action", |x| {
                x.wpml("actionId", &mode.action_id(position).to_string())?;
                x.wpml("actionActuatorFunc", func.name())?;

                let params = func.params();
                if params.is_empty() {
                    return x.empty("wpml:actionActuatorFuncParam");
                }
                x.wpml_element("actionActuatorFuncParam", |x| {
                    for (name, value) in &params {
                        x.wpml(name, value)?;
                    }
                    Ok(())
                })
            })?;
        }
        Ok(())
    })
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
