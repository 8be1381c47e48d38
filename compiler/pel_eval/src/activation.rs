//! Input bindings.
//!
//! An activation resolves root variable names to values for one request.
//! The engine holds no activation state beyond the duration of a single
//! `eval` call.

use rustc_hash::FxHashMap;

use crate::Value;

/// Resolves root variable names for one evaluation.
pub trait Activation {
    /// The value bound to `name`, or `None` when unbound.
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// An activation with no bindings.
pub struct EmptyActivation;

impl Activation for EmptyActivation {
    fn resolve(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// The standard adapter: a set of named bindings.
#[derive(Default, Clone, Debug)]
pub struct MapActivation {
    bindings: FxHashMap<String, Value>,
}

impl MapActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, replacing any previous one for the same name.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }
}

impl FromIterator<(String, Value)> for MapActivation {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        MapActivation { bindings: iter.into_iter().collect() }
    }
}

impl Activation for MapActivation {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }
}

/// One extra binding layered over a parent activation; used for
/// comprehension loop variables.
pub struct ScopedActivation<'a> {
    parent: &'a dyn Activation,
    name: &'a str,
    value: Value,
}

impl<'a> ScopedActivation<'a> {
    pub fn new(parent: &'a dyn Activation, name: &'a str, value: Value) -> Self {
        ScopedActivation { parent, name, value }
    }
}

impl Activation for ScopedActivation<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        if name == self.name {
            Some(self.value.clone())
        } else {
            self.parent.resolve(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_activation_resolves_bindings() {
        let act = MapActivation::new().bind("a", Value::Int(1));
        assert_eq!(act.resolve("a"), Some(Value::Int(1)));
        assert_eq!(act.resolve("b"), None);
    }

    #[test]
    fn scoped_activation_shadows_parent() {
        let parent = MapActivation::new().bind("x", Value::Int(1));
        let scope = ScopedActivation::new(&parent, "x", Value::Int(2));
        assert_eq!(scope.resolve("x"), Some(Value::Int(2)));
        let other = ScopedActivation::new(&parent, "y", Value::Int(3));
        assert_eq!(other.resolve("x"), Some(Value::Int(1)));
        assert_eq!(other.resolve("y"), Some(Value::Int(3)));
    }
}
