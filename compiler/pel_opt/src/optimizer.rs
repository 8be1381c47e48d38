//! Pass composition.

use pel_ir::Ast;
use pel_types::TypeEnv;
use std::fmt;

/// A rewriter pass failed; the pipeline stops and the error propagates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimizeError {
    pub message: String,
}

impl OptimizeError {
    pub fn new(message: impl Into<String>) -> Self {
        OptimizeError { message: message.into() }
    }
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "optimizer failure: {}", self.message)
    }
}

impl std::error::Error for OptimizeError {}

/// One rewriter pass over a tree.
///
/// Passes mutate node kinds in place and may append fresh nodes; they must
/// never renumber or repurpose the ids of nodes they do not rewrite.
pub trait AstOptimizer {
    fn optimize(&self, env: &TypeEnv, ast: &mut Ast) -> Result<(), OptimizeError>;
}

/// Runs a sequence of passes over a clone of the input tree.
pub struct StaticOptimizer<'p> {
    passes: &'p [&'p dyn AstOptimizer],
}

impl<'p> StaticOptimizer<'p> {
    pub fn new(passes: &'p [&'p dyn AstOptimizer]) -> Self {
        StaticOptimizer { passes }
    }

    /// Apply every pass in order and return the rewritten tree. The input
    /// is cloned up front and never touched.
    pub fn optimize(&self, env: &TypeEnv, ast: &Ast) -> Result<Ast, OptimizeError> {
        let mut optimized = ast.clone();
        for pass in self.passes {
            pass.optimize(env, &mut optimized)?;
        }
        Ok(optimized)
    }
}
