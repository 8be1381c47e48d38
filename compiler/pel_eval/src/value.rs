//! Runtime values.
//!
//! Heap data lives behind `Heap<T>` (an `Arc` wrapper with a crate-private
//! constructor), so values clone in O(1) and concurrent read-only
//! evaluation over shared programs is safe. All construction of heap
//! values goes through the factory methods on `Value`.

use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared, immutable heap allocation.
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A runtime value.
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Heap<String>),
    Bytes(Heap<Vec<u8>>),
    List(Heap<Vec<Value>>),
    Map(Heap<FxHashMap<String, Value>>),
    /// A struct (message) instance. A field that is unset is simply not in
    /// the map; presence tests and probes check key membership.
    Struct {
        type_name: Heap<String>,
        fields: Heap<FxHashMap<String, Value>>,
    },
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(Heap::new(s.into()))
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(Heap::new(b.into()))
    }

    pub fn list(elems: impl IntoIterator<Item = Value>) -> Value {
        Value::List(Heap::new(elems.into_iter().collect()))
    }

    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Map(Heap::new(entries.into_iter().collect()))
    }

    pub fn strukt(
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) -> Value {
        Value::Struct {
            type_name: Heap::new(type_name.into()),
            fields: Heap::new(fields.into_iter().collect()),
        }
    }

    /// Short type tag for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Struct { .. } => "struct",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Field lookup on container values: `Some(None)` means the container
    /// supports fields but this one is missing; `None` means the value
    /// cannot carry named fields at all.
    pub fn field(&self, name: &str) -> Option<Option<&Value>> {
        match self {
            Value::Map(entries) => Some(entries.get(name)),
            Value::Struct { fields, .. } => Some(fields.get(name)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}u"),
            Value::Double(d) => write!(f, "{d:?}"),
            Value::String(s) => write!(f, "{:?}", s.as_str()),
            Value::Bytes(b) => write!(f, "b{b:?}"),
            Value::List(elems) => {
                f.write_str("[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                // Sort for a stable rendering; FxHashMap iteration order is not.
                let mut keys: Vec<_> = entries.keys().collect();
                keys.sort();
                f.write_str("{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {}", entries[key.as_str()])?;
                }
                f.write_str("}")
            }
            Value::Struct { type_name, fields } => {
                let mut keys: Vec<_> = fields.keys().collect();
                keys.sort();
                write!(f, "{}{{", type_name.as_str())?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {}", fields[key.as_str()])?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        assert_eq!(Value::string("x"), Value::string("x"));
        assert_ne!(Value::Int(1), Value::Uint(1));
        assert_eq!(
            Value::map([("k".to_string(), Value::Int(1))]),
            Value::map([("k".to_string(), Value::Int(1))]),
        );
    }

    #[test]
    fn field_lookup_distinguishes_missing_from_unsupported() {
        let map = Value::map([("k".to_string(), Value::Int(1))]);
        assert_eq!(map.field("k"), Some(Some(&Value::Int(1))));
        assert_eq!(map.field("z"), Some(None));
        assert_eq!(Value::Int(1).field("k"), None);
    }

    #[test]
    fn display_is_stable() {
        let v = Value::map([
            ("b".to_string(), Value::Int(2)),
            ("a".to_string(), Value::Int(1)),
        ]);
        assert_eq!(v.to_string(), "{\"a\": 1, \"b\": 2}");
    }
}
