//! PEL Opt - the pluggable static-optimizer pipeline.
//!
//! A pipeline composes rewriter passes over a *clone* of the input tree;
//! the caller's tree is never mutated. Passes replace node kinds in place,
//! which keeps every surviving node id stable across the run - downstream
//! consumers index per-node bookkeeping by id and rely on that.

mod fold;
mod optimizer;

pub use fold::ConstantFolding;
pub use optimizer::{AstOptimizer, OptimizeError, StaticOptimizer};
