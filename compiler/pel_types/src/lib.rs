//! PEL Types - type representation and declarations.
//!
//! The engine consults types in exactly two places: compiling field probes
//! (walking a dotted path segment by segment) and struct-literal
//! evaluation. Both are read-only lookups against a [`TypeEnv`] built up
//! front, so there is no inference machinery here, just declarations.

mod env;
mod ty;

pub use env::{TypeEnv, VariableDecl};
pub use ty::Type;
