use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A primitive value stored in a node field.
///
/// The store is schemaless; typing a field as a record attribute is the
/// reader's job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// An explicitly cleared field.
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integral value, accepting floats with no fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// Store-internal bookkeeping attached to a node.
///
/// `soul` is the node's full path; `states` records the write sequence
/// that last touched each field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub soul: String,
    pub states: BTreeMap<String, u64>,
}

/// A node as delivered by the store: user fields plus optional metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub meta: Option<NodeMeta>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl RemoteNode {
    pub fn from_fields(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { meta: None, fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// `true` when the node carries bookkeeping but no user field with a value.
    pub fn is_metadata_only(&self) -> bool {
        self.meta.is_some() && self.fields.values().all(FieldValue::is_null)
    }
}

/// One delivery from a live subscription.
///
/// `node` is `None` when the key was cleared (a tombstone).
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteUpdate {
    pub namespace: String,
    pub id: String,
    pub node: Option<RemoteNode>,
}

/// A single mutation applied to the store.
///
/// This is also the journal record format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RemoteWrite {
    /// Merge the given fields into the node (creating it if needed).
    PutNode {
        namespace: String,
        id: String,
        fields: BTreeMap<String, FieldValue>,
    },
    /// Set a single field of a node.
    PutField {
        namespace: String,
        id: String,
        field: String,
        value: FieldValue,
    },
    /// Clear the node.
    Tombstone { namespace: String, id: String },
}

impl RemoteWrite {
    pub fn namespace(&self) -> &str {
        match self {
            Self::PutNode { namespace, .. }
            | Self::PutField { namespace, .. }
            | Self::Tombstone { namespace, .. } => namespace,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::PutNode { id, .. } | Self::PutField { id, .. } | Self::Tombstone { id, .. } => id,
        }
    }
}
