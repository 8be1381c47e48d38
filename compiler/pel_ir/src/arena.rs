//! Arena allocation for the flat expression tree.
//!
//! Contiguous storage; children are referenced by `ExprId`, argument lists
//! through `ExprRange` into a flattened side table. The arena is also the
//! node-id generator: every allocation appends, so ids are unique and
//! monotonic for the lifetime of a tree, including across rewrite passes.

use crate::ast::{Comprehension, Expr, FieldInit, MapEntry};
use crate::{ComprehensionId, EntryRange, ExprId, ExprKind, ExprRange};

fn to_u32(value: usize, context: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| panic!("arena capacity exceeded: {context}"))
}

fn to_u16(value: usize, context: &str) -> u16 {
    u16::try_from(value).unwrap_or_else(|_| panic!("range length exceeded: {context}"))
}

/// Contiguous storage for all nodes of one expression tree.
#[derive(Clone, Default, Debug)]
pub struct ExprArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,

    /// Flattened expression lists (call args, list elements).
    expr_lists: Vec<ExprId>,

    /// Map entries.
    map_entries: Vec<MapEntry>,

    /// Struct field initializers.
    field_inits: Vec<FieldInit>,

    /// Comprehension bodies.
    comprehensions: Vec<Comprehension>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression, returning its id.
    #[inline]
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len(), "expressions"));
        self.exprs.push(expr);
        id
    }

    /// Get an expression by id.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Get the kind of a node by id.
    #[inline]
    #[track_caller]
    pub fn kind(&self, id: ExprId) -> ExprKind {
        self.exprs[id.index()].kind
    }

    /// Replace a node's kind in place, keeping its id and span.
    ///
    /// This is the only mutation rewrite passes perform: a replaced node
    /// keeps its identity while every other node is untouched.
    #[inline]
    #[track_caller]
    pub fn set_kind(&mut self, id: ExprId, kind: ExprKind) {
        self.exprs[id.index()].kind = kind;
    }

    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Allocate a flattened expression list.
    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = to_u32(self.expr_lists.len(), "expression lists");
        self.expr_lists.extend(exprs);
        let len = to_u16(self.expr_lists.len() - start as usize, "expression list");
        ExprRange::new(start, len)
    }

    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate map entries.
    pub fn alloc_map_entries(&mut self, entries: impl IntoIterator<Item = MapEntry>) -> EntryRange {
        let start = to_u32(self.map_entries.len(), "map entries");
        self.map_entries.extend(entries);
        let len = to_u16(self.map_entries.len() - start as usize, "map entry list");
        EntryRange::new(start, len)
    }

    #[inline]
    pub fn map_entries(&self, range: EntryRange) -> &[MapEntry] {
        &self.map_entries[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate struct field initializers.
    pub fn alloc_field_inits(&mut self, fields: impl IntoIterator<Item = FieldInit>) -> EntryRange {
        let start = to_u32(self.field_inits.len(), "field initializers");
        self.field_inits.extend(fields);
        let len = to_u16(self.field_inits.len() - start as usize, "field initializer list");
        EntryRange::new(start, len)
    }

    #[inline]
    pub fn field_inits(&self, range: EntryRange) -> &[FieldInit] {
        &self.field_inits[range.start as usize..range.start as usize + range.len()]
    }

    /// Allocate a comprehension body.
    pub fn alloc_comprehension(&mut self, comp: Comprehension) -> ComprehensionId {
        let id = ComprehensionId::new(to_u32(self.comprehensions.len(), "comprehensions"));
        self.comprehensions.push(comp);
        id
    }

    #[inline]
    pub fn comprehension(&self, id: ComprehensionId) -> &Comprehension {
        &self.comprehensions[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    #[test]
    fn alloc_assigns_sequential_ids() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(Expr::new(ExprKind::Literal(crate::Constant::Int(1)), Span::DUMMY));
        let b = arena.alloc(Expr::new(ExprKind::Literal(crate::Constant::Int(2)), Span::DUMMY));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.expr_count(), 2);
    }

    #[test]
    fn set_kind_keeps_id_and_span() {
        let mut arena = ExprArena::new();
        let span = Span::new(3, 7);
        let id = arena.alloc(Expr::new(ExprKind::Literal(crate::Constant::Bool(true)), span));
        arena.set_kind(id, ExprKind::Literal(crate::Constant::Bool(false)));
        let expr = arena.get(id);
        assert_eq!(expr.kind, ExprKind::Literal(crate::Constant::Bool(false)));
        assert_eq!(expr.span, span);
    }

    #[test]
    fn expr_list_round_trip() {
        let mut arena = ExprArena::new();
        let ids: Vec<_> = (0..3)
            .map(|i| arena.alloc(Expr::new(ExprKind::Literal(crate::Constant::Int(i)), Span::DUMMY)))
            .collect();
        let range = arena.alloc_expr_list(ids.clone());
        assert_eq!(arena.expr_list(range), ids.as_slice());
    }
}
