//! Graph-native values as returned by the store

use serde_json::Value;
use std::collections::BTreeMap;

/// Scalar leaf of a graph value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// What a composite value was in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    Node,
    Relationship,
    Map,
}

/// Property bag of a node, relationship or nested map
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub kind: CompositeKind,
    pub properties: BTreeMap<String, GraphValue>,
}

/// A single value inside a result row
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Scalar(Scalar),
    Composite(Composite),
    List(Vec<GraphValue>),
}

impl GraphValue {
    pub fn null() -> Self {
        GraphValue::Scalar(Scalar::Null)
    }

    pub fn text(value: impl Into<String>) -> Self {
        GraphValue::Scalar(Scalar::String(value.into()))
    }

    pub fn integer(value: i64) -> Self {
        GraphValue::Scalar(Scalar::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        GraphValue::Scalar(Scalar::Float(value))
    }

    /// Build a node-shaped composite from (property, value) pairs
    pub fn node<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, GraphValue)>,
        K: Into<String>,
    {
        Self::composite(CompositeKind::Node, properties)
    }

    /// Build a relationship-shaped composite from (property, value) pairs
    pub fn relationship<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, GraphValue)>,
        K: Into<String>,
    {
        Self::composite(CompositeKind::Relationship, properties)
    }

    fn composite<I, K>(kind: CompositeKind, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, GraphValue)>,
        K: Into<String>,
    {
        GraphValue::Composite(Composite {
            kind,
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// Convert a value from Neo4j's HTTP row format.
    ///
    /// `meta` is the matching entry of the row's `meta` array: an object with
    /// `type: node|relationship` for entities, an array for lists, null otherwise.
    pub fn from_json(value: Value, meta: Option<&Value>) -> Self {
        match value {
            Value::Null => GraphValue::null(),
            Value::Bool(b) => GraphValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => GraphValue::integer(i),
                None => GraphValue::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => GraphValue::text(s),
            Value::Array(items) => {
                let metas = meta.and_then(Value::as_array);
                GraphValue::List(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| {
                            GraphValue::from_json(item, metas.and_then(|m| m.get(i)))
                        })
                        .collect(),
                )
            }
            Value::Object(map) => {
                let kind = match meta.and_then(|m| m.get("type")).and_then(Value::as_str) {
                    Some("node") => CompositeKind::Node,
                    Some("relationship") => CompositeKind::Relationship,
                    _ => CompositeKind::Map,
                };
                GraphValue::Composite(Composite {
                    kind,
                    properties: map
                        .into_iter()
                        .map(|(k, v)| (k, GraphValue::from_json(v, None)))
                        .collect(),
                })
            }
        }
    }
}

impl From<&str> for GraphValue {
    fn from(value: &str) -> Self {
        GraphValue::text(value)
    }
}

impl From<i64> for GraphValue {
    fn from(value: i64) -> Self {
        GraphValue::integer(value)
    }
}

impl From<f64> for GraphValue {
    fn from(value: f64) -> Self {
        GraphValue::float(value)
    }
}

/// One result row: columns in projection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphRow {
    columns: Vec<(String, GraphValue)>,
}

impl GraphRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append
    pub fn with(mut self, column: impl Into<String>, value: GraphValue) -> Self {
        self.columns.push((column.into(), value));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: GraphValue) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&GraphValue> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GraphValue)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
