//! The `Env` facade: declarations + interner + program construction.

use pel_ir::{Ast, SharedInterner};
use pel_parse::ParseError;
use pel_types::{Type, TypeEnv, VariableDecl};

use crate::Program;

/// One expression environment: the declarations an expression is compiled
/// and evaluated against. Construction is the only mutation; every use
/// afterwards is read-only, so an `Env` can back any number of programs.
#[derive(Debug)]
pub struct Env {
    types: TypeEnv,
    interner: SharedInterner,
}

impl Env {
    pub fn new(types: TypeEnv) -> Self {
        Env { types, interner: SharedInterner::new() }
    }

    pub fn types(&self) -> &TypeEnv {
        &self.types
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Parse a source expression into its canonical tree.
    pub fn compile(&self, source: &str) -> Result<Ast, ParseError> {
        pel_parse::parse(source, self.interner.clone())
    }

    /// Build an executable for a compiled tree.
    pub fn program(&self, ast: &Ast) -> Program {
        Program::new(ast.clone())
    }

    pub fn find_variable(&self, name: &str) -> Option<&VariableDecl> {
        self.types.find_variable(name)
    }

    pub fn find_struct_field_type(&self, type_name: &str, field: &str) -> Option<&Type> {
        self.types.find_struct_field_type(type_name, field)
    }
}
