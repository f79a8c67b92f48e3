use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{SemanticNode, Value, ACTIONS_TAG, PLACEMARK_TAG};

/// 名前空間を除いた要素
#[derive(Debug, Default)]
struct RawElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<RawElement>,
}

impl RawElement {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            // 名前空間宣言は属性として扱わない
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let value = attr.unescape_value()?.into_owned();
            attributes.push((strip_namespace(&key).to_string(), value));
        }

        Ok(Self {
            tag: strip_namespace(&name).to_string(),
            attributes,
            ..Default::default()
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// タグ名から名前空間接頭辞（`wpml:` や `{uri}`）を取り除く
pub fn strip_namespace(tag: &str) -> &str {
    tag.rsplit_once(|c: char| c == ':' || c == '}')
        .map_or(tag, |(_, local)| local)
}

/// XMLバイト列を正規化済みのツリーに変換する
pub fn normalize(xml: &[u8]) -> Result<SemanticNode> {
    let root = parse_tree(xml)?;
    debug!(
        "Parsed XML tree: root <{}> with {} children",
        root.tag,
        root.children.len()
    );
    Ok(to_semantic(&root))
}

fn parse_tree(xml: &[u8]) -> Result<RawElement> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                ensure_single_root(&root)?;
                stack.push(RawElement::open(&e)?);
            }
            Event::Empty(e) => {
                ensure_single_root(&root)?;
                let element = RawElement::open(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(e) => {
                let element = stack.pop().ok_or_else(|| {
                    Error::Malformed(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(Error::Malformed(
                            "text content outside of the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::Malformed(format!("unclosed element <{}>", open.tag)));
    }

    root.ok_or_else(|| Error::Malformed("document has no root element".to_string()))
}

fn ensure_single_root(root: &Option<RawElement>) -> Result<()> {
    match root {
        Some(r) => Err(Error::Malformed(format!(
            "content after the root element <{}>",
            r.tag
        ))),
        None => Ok(()),
    }
}

fn attach(stack: &mut [RawElement], root: &mut Option<RawElement>, element: RawElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn to_semantic(element: &RawElement) -> SemanticNode {
    let mut node = SemanticNode::default();

    for child in &element.children {
        match child.tag.as_str() {
            PLACEMARK_TAG => node.push(PLACEMARK_TAG, to_semantic(child)),
            ACTIONS_TAG => node.push(ACTIONS_TAG, to_action_descriptor(child)),
            _ if child.children.is_empty() => {
                node.insert(child.tag.clone(), Value::Scalar(child.text.trim().to_string()))
            }
            _ => node.insert(child.tag.clone(), Value::Node(to_semantic(child))),
        }
    }

    node
}

/// `<actions label=".." param=".." targetMode="..">ShootPhoto</actions>`
fn to_action_descriptor(element: &RawElement) -> SemanticNode {
    let mut node = SemanticNode::default();
    node.insert(
        "action".to_string(),
        Value::Scalar(element.text.trim().to_string()),
    );
    for key in ["label", "param", "targetMode"] {
        let value = element.attribute(key).unwrap_or_default().to_string();
        node.insert(key.to_string(), Value::Scalar(value));
    }
    node
}
