//! JSON-compatible resource values with structural sharing.
//!
//! Arrays and objects live behind `Arc`, so rewriting one path through
//! [`Resource::with_replaced`] allocates only the nodes along that path. Every
//! untouched sibling subtree in the new value is the *same* allocation as in
//! the old one, which [`Resource::same`] can observe.

mod path;

pub use path::{PathSegment, ResourcePath};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// Object fields of a [`Resource`].
pub type Fields = BTreeMap<String, Resource>;

static NULL: Resource = Resource::Null;

/// An immutable, cheaply clonable JSON-like value.
#[derive(Debug, Clone, Default)]
pub enum Resource {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Arc<Vec<Resource>>),
    Object(Arc<Fields>),
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Resource::Null, Resource::Null) => true,
            (Resource::Bool(a), Resource::Bool(b)) => a == b,
            (Resource::Number(a), Resource::Number(b)) => a == b,
            (Resource::String(a), Resource::String(b)) => a == b,
            (Resource::Array(a), Resource::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Resource::Object(a), Resource::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Resource {
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Resource)>) -> Self {
        Resource::Object(Arc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn array(items: impl IntoIterator<Item = Resource>) -> Self {
        Resource::Array(Arc::new(items.into_iter().collect()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Resource::Null)
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            Resource::Object(fields) => Some(fields.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Resource]> {
        match self {
            Resource::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Resource::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Resource::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Resource::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Field lookup on an object.
    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.as_object().and_then(|fields| fields.get(key))
    }

    /// Element lookup on an array.
    pub fn at(&self, index: usize) -> Option<&Resource> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Nested lookup. The root path returns `self`.
    pub fn pointer(&self, path: &ResourcePath) -> Option<&Resource> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match segment {
                PathSegment::Key(key) => node.get(key),
                PathSegment::Index(index) => node.at(*index),
            })
    }

    /// Identity comparison: compound values must share their allocation,
    /// scalars compare by value.
    pub fn same(&self, other: &Resource) -> bool {
        match (self, other) {
            (Resource::Array(a), Resource::Array(b)) => Arc::ptr_eq(a, b),
            (Resource::Object(a), Resource::Object(b)) => Arc::ptr_eq(a, b),
            (Resource::Array(_), _) | (Resource::Object(_), _) => false,
            _ => self == other,
        }
    }

    /// Shallow merge of `partial` into `self`.
    ///
    /// Two objects merge key by key with `partial` winning; any other
    /// combination yields `partial`.
    pub fn merged(&self, partial: &Resource) -> Resource {
        match (self, partial) {
            (Resource::Object(current), Resource::Object(patch)) => {
                let mut fields = Fields::clone(current);
                for (key, value) in patch.iter() {
                    fields.insert(key.clone(), value.clone());
                }
                Resource::Object(Arc::new(fields))
            }
            _ => partial.clone(),
        }
    }

    /// Copy of `self` with the value at `path` replaced.
    ///
    /// Missing object keys along the path are created; a key step through a
    /// non-object turns that node into an object. An index step must address
    /// an existing element or the slot just past the end (append); otherwise
    /// the value is returned unchanged.
    pub fn with_replaced(&self, path: &ResourcePath, value: Resource) -> Resource {
        self.replace_at(path.segments(), value)
    }

    fn replace_at(&self, segments: &[PathSegment], value: Resource) -> Resource {
        let Some((head, rest)) = segments.split_first() else {
            return value;
        };

        match head {
            PathSegment::Key(key) => {
                let mut fields = match self {
                    Resource::Object(fields) => Fields::clone(fields),
                    _ => Fields::new(),
                };
                let next = fields.get(key).unwrap_or(&NULL).replace_at(rest, value);
                fields.insert(key.clone(), next);
                Resource::Object(Arc::new(fields))
            }
            PathSegment::Index(index) => match self {
                Resource::Array(items) if *index <= items.len() => {
                    let mut items = Vec::clone(items);
                    if *index < items.len() {
                        let next = items[*index].replace_at(rest, value);
                        items[*index] = next;
                    } else {
                        items.push(NULL.replace_at(rest, value));
                    }
                    Resource::Array(Arc::new(items))
                }
                _ => self.clone(),
            },
        }
    }

    pub fn to_json(&self) -> Value {
        Value::from(self)
    }
}

impl From<Value> for Resource {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Resource::Null,
            Value::Bool(b) => Resource::Bool(b),
            Value::Number(n) => Resource::Number(n),
            Value::String(s) => Resource::String(s),
            Value::Array(items) => Resource::array(items.into_iter().map(Resource::from)),
            Value::Object(map) => {
                Resource::object(map.into_iter().map(|(k, v)| (k, Resource::from(v))))
            }
        }
    }
}

impl From<&Resource> for Value {
    fn from(resource: &Resource) -> Self {
        match resource {
            Resource::Null => Value::Null,
            Resource::Bool(b) => Value::Bool(*b),
            Resource::Number(n) => Value::Number(n.clone()),
            Resource::String(s) => Value::String(s.clone()),
            Resource::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            Resource::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Value::from(&resource)
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        Resource::String(s.to_string())
    }
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        Resource::String(s)
    }
}

impl From<bool> for Resource {
    fn from(b: bool) -> Self {
        Resource::Bool(b)
    }
}

impl From<i64> for Resource {
    fn from(n: i64) -> Self {
        Resource::Number(n.into())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Resource::Null => serializer.serialize_unit(),
            Resource::Bool(b) => serializer.serialize_bool(*b),
            Resource::Number(n) => n.serialize(serializer),
            Resource::String(s) => serializer.serialize_str(s),
            Resource::Array(items) => serializer.collect_seq(items.iter()),
            Resource::Object(fields) => serializer.collect_map(fields.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Resource::from)
    }
}
