use std::collections::BTreeMap;

/// 繰り返し要素として常にリストで保持するタグ
pub const PLACEMARK_TAG: &str = "Placemark";
pub const ACTIONS_TAG: &str = "actions";

/// 正規化後の要素の値
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(String),
    Node(SemanticNode),
    List(Vec<SemanticNode>),
}

/// 名前空間を取り除いたタグ名をキーとする正規化済みの要素
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticNode {
    entries: BTreeMap<String, Value>,
}

impl SemanticNode {
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(Value::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    pub fn node(&self, key: &str) -> Option<&SemanticNode> {
        match self.entries.get(key) {
            Some(Value::Node(n)) => Some(n),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[SemanticNode]> {
        match self.entries.get(key) {
            Some(Value::List(items)) => Some(items),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 同名タグは後勝ちで上書きする
    pub(crate) fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub(crate) fn push(&mut self, key: &str, item: SemanticNode) {
        match self.entries.get_mut(key) {
            Some(Value::List(items)) => items.push(item),
            _ => {
                self.entries
                    .insert(key.to_string(), Value::List(vec![item]));
            }
        }
    }
}

/// 航点で実行する動作の記述
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub action: String,
    pub label: String,
    pub param: String,
    pub target_mode: String,
}

impl ActionDescriptor {
    pub fn from_node(node: &SemanticNode) -> Self {
        let field = |key: &str| node.scalar(key).unwrap_or_default().to_string();
        Self {
            action: field("action"),
            label: field("label"),
            param: field("param"),
            target_mode: field("targetMode"),
        }
    }
}
