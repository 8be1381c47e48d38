//! PEL IR - Expression Tree Types
//!
//! This crate contains the core data structures for the PEL engine:
//! - Spans for source locations
//! - Names for interned identifiers
//! - AST nodes (`Expr`, `ExprKind`, `Constant`) and the expression arena
//! - Navigation and descendant matching over the tree
//! - The canonical unparser
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: strings become `Name(u32)` handles
//! - **Flatten Everything**: no `Box<Expr>`, children are `ExprId(u32)` indices
//! - **One id space**: the arena index *is* the node id; rewrites mutate a
//!   node's kind in place and never renumber surviving nodes, while newly
//!   constructed nodes always receive a fresh id at the end of the arena

mod arena;
mod ast;
mod expr_id;
mod factory;
mod interner;
mod name;
pub mod navigate;
pub mod operators;
mod span;
mod unparse;

pub use arena::ExprArena;
pub use ast::{
    Ast, Comprehension, Constant, Expr, ExprKind, FieldInit, MapEntry,
};
pub use expr_id::{ComprehensionId, EntryRange, ExprId, ExprRange};
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use navigate::{match_descendants, navigate, CallExpr, NavigableExpr, SelectExpr};
pub use span::Span;
pub use unparse::unparse;
