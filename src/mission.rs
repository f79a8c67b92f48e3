use crate::error::{Error, Result};
use crate::generator::Mode;
use crate::model::{ActionDescriptor, SemanticNode, ACTIONS_TAG, PLACEMARK_TAG};

/// `"lon,lat,alt"` を分解した座標（各成分は元の文字列のまま保持）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub first: String,
    pub second: String,
    pub altitude: String,
}

impl Coordinates {
    pub fn parse(raw: &str) -> Result<Self> {
        const PATH: &str = "Point.coordinates";

        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return Err(Error::invalid(
                PATH,
                raw,
                "expected `lon,lat,alt` with three components",
            ));
        }

        for part in &parts[..3] {
            // "NaN" や "inf" も数値としては扱わない
            if !part.parse::<f64>().is_ok_and(f64::is_finite) {
                return Err(Error::invalid(
                    PATH,
                    raw,
                    format!("component {part:?} is not a number"),
                ));
            }
        }

        Ok(Self {
            first: parts[0].to_string(),
            second: parts[1].to_string(),
            altitude: parts[2].to_string(),
        })
    }

    /// 先頭2成分をそのままの順序で結合する
    pub fn lat_lon(&self) -> String {
        format!("{},{}", self.first, self.second)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub coordinates: Coordinates,
    pub heading: Option<String>,
    pub actions: Vec<ActionDescriptor>,
}

impl Waypoint {
    fn from_placemark(placemark: &SemanticNode, mode: Mode) -> Result<Self> {
        let raw = placemark
            .node("Point")
            .and_then(|p| p.scalar("coordinates"))
            .ok_or_else(|| Error::missing("Point.coordinates", mode))?;
        let coordinates = Coordinates::parse(raw)?;

        let extended = placemark.node("ExtendedData");
        let heading = extended
            .and_then(|e| e.scalar("heading"))
            .map(str::to_string);
        let actions = extended
            .and_then(|e| e.list(ACTIONS_TAG))
            .unwrap_or_default()
            .iter()
            .map(ActionDescriptor::from_node)
            .collect();

        Ok(Self {
            coordinates,
            heading,
            actions,
        })
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// 正規化済みツリーから取り出したミッション情報
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    pub author: Option<String>,
    pub global_speed: String,
    pub waypoints: Vec<Waypoint>,
}

impl Mission {
    pub fn from_root(root: &SemanticNode, mode: Mode) -> Result<Self> {
        let document = root
            .node("Document")
            .ok_or_else(|| Error::missing("Document", mode))?;

        let author = document.scalar("name").map(str::to_string);
        if mode == Mode::Template && author.is_none() {
            return Err(Error::missing("Document.name", mode));
        }

        let placemarks = document
            .node("Folder")
            .and_then(|f| f.list(PLACEMARK_TAG))
            .ok_or_else(|| Error::missing("Document.Folder.Placemark", mode))?;

        // ミッション全体の速度は文書直下の最初のPlacemarkから読む
        let speed_source = document
            .list(PLACEMARK_TAG)
            .and_then(|list| list.first())
            .or_else(|| placemarks.first());
        let global_speed = speed_source
            .and_then(|p| p.node("ExtendedData"))
            .and_then(|e| e.scalar("autoFlightSpeed"))
            .ok_or_else(|| Error::missing("Placemark[0].ExtendedData.autoFlightSpeed", mode))?
            .to_string();

        let waypoints = placemarks
            .iter()
            .map(|p| Waypoint::from_placemark(p, mode))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            author,
            global_speed,
            waypoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::normalize;

    fn mission_xml(speed: &str, coordinates: &str) -> String {
        format!(
            r#"<kml><Document><name>plan</name>
<Placemark><ExtendedData>{speed}</ExtendedData></Placemark>
<Folder><Placemark><Point><coordinates>{coordinates}</coordinates></Point></Placemark></Folder>
</Document></kml>"#
        )
    }

    #[test]
    fn test_coordinates_keep_raw_text() {
        let coords = Coordinates::parse("8.0, 47.0 ,100.50").unwrap();
        assert_eq!(coords.first, "8.0");
        assert_eq!(coords.second, "47.0");
        assert_eq!(coords.altitude, "100.50");
        assert_eq!(coords.lat_lon(), "8.0,47.0");
    }

    #[test]
    fn test_coordinates_rejects_bad_input() {
        for raw in ["8.0,47.0", "8.0,north,100", "", "NaN,47.0,100", "8.0,47.0,inf"] {
            let err = Coordinates::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Generation, "{raw}");
        }
    }

    #[test]
    fn test_mission_from_root() {
        let xml = mission_xml("<autoFlightSpeed>7</autoFlightSpeed>", "8.0,47.0,100");
        let root = normalize(xml.as_bytes()).unwrap();
        let mission = Mission::from_root(&root, Mode::Template).unwrap();

        assert_eq!(mission.author.as_deref(), Some("plan"));
        assert_eq!(mission.global_speed, "7");
        assert_eq!(mission.waypoints.len(), 1);
        assert_eq!(mission.waypoints[0].heading, None);
        assert!(!mission.waypoints[0].has_actions());
    }

    #[test]
    fn test_missing_speed_is_generation_error() {
        let xml = mission_xml("<heading>0</heading>", "8.0,47.0,100");
        let root = normalize(xml.as_bytes()).unwrap();

        for mode in [Mode::Template, Mode::Execution] {
            match Mission::from_root(&root, mode) {
                Err(Error::MissingField { path, .. }) => {
                    assert!(path.ends_with("autoFlightSpeed"), "{path}")
                }
                other => panic!("expected missing speed, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_author_required_only_for_template() {
        let xml = r#"<kml><Document>
<Folder><Placemark><Point><coordinates>1,2,3</coordinates></Point>
<ExtendedData><autoFlightSpeed>4</autoFlightSpeed></ExtendedData></Placemark></Folder>
</Document></kml>"#;
        let root = normalize(xml.as_bytes()).unwrap();

        assert!(Mission::from_root(&root, Mode::Template).is_err());

        // 文書直下にPlacemarkが無い場合は最初の航点から速度を読む
        let mission = Mission::from_root(&root, Mode::Execution).unwrap();
        assert_eq!(mission.author, None);
        assert_eq!(mission.global_speed, "4");
    }

    #[test]
    fn test_missing_coordinates() {
        let xml = r#"<kml><Document><name>p</name>
<Placemark><ExtendedData><autoFlightSpeed>4</autoFlightSpeed></ExtendedData></Placemark>
<Folder><Placemark><name>no point</name></Placemark></Folder>
</Document></kml>"#;
        let root = normalize(xml.as_bytes()).unwrap();
        let err = Mission::from_root(&root, Mode::Execution).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref path, .. } if path == "Point.coordinates"));
    }
}
