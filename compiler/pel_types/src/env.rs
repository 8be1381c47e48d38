//! Variable and struct declarations.

use rustc_hash::FxHashMap;

use crate::Type;

/// A declared root variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDecl {
    name: String,
    ty: Type,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        VariableDecl { name: name.into(), ty }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

/// Declarations visible to one expression: root variables and struct
/// (message) types with their field layouts.
///
/// Built once, then consulted read-only by probe compilation and
/// struct-literal evaluation.
#[derive(Clone, Default, Debug)]
pub struct TypeEnv {
    variables: FxHashMap<String, VariableDecl>,
    structs: FxHashMap<String, FxHashMap<String, Type>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a root variable; replaces any previous declaration of the
    /// same name.
    pub fn declare_variable(&mut self, name: impl Into<String>, ty: Type) -> &mut Self {
        let name = name.into();
        self.variables.insert(name.clone(), VariableDecl::new(name, ty));
        self
    }

    /// Declare a struct type and its fields.
    pub fn declare_struct(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (String, Type)>,
    ) -> &mut Self {
        self.structs.insert(name.into(), fields.into_iter().collect());
        self
    }

    pub fn find_variable(&self, name: &str) -> Option<&VariableDecl> {
        self.variables.get(name)
    }

    /// The declared type of `field` on struct `type_name`, if both exist.
    pub fn find_struct_field_type(&self, type_name: &str, field: &str) -> Option<&Type> {
        self.structs.get(type_name)?.get(field)
    }

    /// Whether `type_name` is a declared struct type.
    pub fn has_struct(&self, type_name: &str) -> bool {
        self.structs.contains_key(type_name)
    }
}
