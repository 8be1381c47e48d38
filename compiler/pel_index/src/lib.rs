//! PEL Index - presence-indexed specialization of policy expressions.
//!
//! Presence tests (`has(x.y)`) and the short-circuited branches they guard
//! dominate the cost of many policy expressions. This crate precomputes,
//! ahead of evaluation, one constant-folded specialization of an
//! expression per distinct combination of present/absent answers over its
//! most frequent presence fields. Per request, the engine probes those
//! fields on the input, assembles a bit mask, and dispatches straight to
//! the matching specialization.
//!
//! # Pipeline
//!
//! tree -> locate presence tests -> field trie -> top-N fields ->
//! {for each distinct effective mask: rewrite tests to literals -> fold}
//! -> [`IndexedAst`] -> [`IndexedProgram`]
//!
//! # Example
//!
//! ```
//! use pel_eval::{Env, MapActivation, Value};
//! use pel_index::{IndexedProgram, Indexer};
//! use pel_types::{Type, TypeEnv};
//!
//! let mut types = TypeEnv::new();
//! types.declare_variable("a", Type::map(Type::String, Type::String));
//! types.declare_variable("b", Type::map(Type::String, Type::String));
//! let env = Env::new(types);
//!
//! let ast = env.compile("has(a.b) ? a : b").unwrap();
//! let indexed = Indexer::new().generate_index(&env, &ast).unwrap();
//! let program = IndexedProgram::new(&env, &indexed).unwrap();
//!
//! let input = MapActivation::new()
//!     .bind("a", Value::map([("b".to_string(), Value::string("x"))]))
//!     .bind("b", Value::map([]));
//! assert_eq!(
//!     program.eval(&input).unwrap(),
//!     Value::map([("b".to_string(), Value::string("x"))]),
//! );
//! ```

use std::fmt;

mod field_trie;
mod indexer;
mod mask;
mod program;

pub use field_trie::FieldFrequency;
pub use indexer::{IndexedAst, Indexer};
pub use program::IndexedProgram;

use pel_eval::TypeResolutionError;
use pel_opt::OptimizeError;

/// How many presence fields an index selects at most. Hard cap 8: the
/// mask is a single byte.
pub const MAX_FIELD_PATTERNS: usize = 4;

/// Index construction failure.
#[derive(Debug)]
pub enum IndexError {
    /// The rewrite/fold pipeline failed while specializing.
    Optimize(OptimizeError),
    /// A probe qualifier is statically impossible against the declared
    /// types.
    TypeResolution(TypeResolutionError),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Optimize(err) => err.fmt(f),
            IndexError::TypeResolution(err) => write!(f, "probe compilation failed: {err}"),
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Optimize(err) => Some(err),
            IndexError::TypeResolution(err) => Some(err),
        }
    }
}

impl From<OptimizeError> for IndexError {
    fn from(err: OptimizeError) -> Self {
        IndexError::Optimize(err)
    }
}
