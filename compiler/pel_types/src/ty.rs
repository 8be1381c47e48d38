//! PEL type representation.

use std::fmt;

/// A PEL type.
///
/// `Dyn` is the top type used wherever static knowledge runs out (e.g.
/// map values, unknown struct fields); it admits every operation and
/// defers checking to runtime.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Type {
    Dyn,
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    /// A declared struct (message) type, by name.
    Struct(String),
}

impl Type {
    pub fn list(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn strukt(name: impl Into<String>) -> Type {
        Type::Struct(name.into())
    }

    /// Whether a named field could ever be selected off a value of this
    /// type. Scalars and lists can never carry fields; maps, structs, and
    /// `Dyn` can.
    pub fn supports_field_selection(&self) -> bool {
        matches!(self, Type::Dyn | Type::Map(_, _) | Type::Struct(_))
    }

    /// The declared struct name, if this is a struct type.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Dyn => f.write_str("dyn"),
            Type::Null => f.write_str("null_type"),
            Type::Bool => f.write_str("bool"),
            Type::Int => f.write_str("int"),
            Type::Uint => f.write_str("uint"),
            Type::Double => f.write_str("double"),
            Type::String => f.write_str("string"),
            Type::Bytes => f.write_str("bytes"),
            Type::List(elem) => write!(f, "list<{elem}>"),
            Type::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Type::Struct(name) => f.write_str(name),
        }
    }
}
