//! Property graph data model
//!
//! Nodes and relations carry open property maps. Values are restricted to a
//! small JSON-compatible union so graphs can be exchanged with any backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Open, ordered property map attached to nodes and relations
pub type Properties = BTreeMap<String, PropertyValue>;

/// Value stored in a property map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            PropertyValue::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(value: Vec<PropertyValue>) -> Self {
        PropertyValue::List(value)
    }
}

/// Graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id; left empty to let the backend assign one
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Category label such as "Constitution" or "Herb"
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: Properties,
    /// Alternative names, matched by search
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            properties: Properties::new(),
            aliases: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Name followed by aliases
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Directed, typed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub start_node: String,
    pub end_node: String,
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Relation {
    pub fn new(
        start_node: impl Into<String>,
        end_node: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            start_node: start_node.into(),
            end_node: end_node.into(),
            relation_type: relation_type.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Identity of a relation: (start, type, end)
    pub fn same_edge(&self, other: &Relation) -> bool {
        self.start_node == other.start_node
            && self.end_node == other.end_node
            && self.relation_type == other.relation_type
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.start_node == node_id || self.end_node == node_id
    }
}
