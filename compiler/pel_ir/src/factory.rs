//! Node constructors.
//!
//! The arena doubles as the expression factory: every constructor appends,
//! so each new node gets a fresh id even when it is synthesized mid-rewrite.

use crate::ast::{Comprehension, Expr, FieldInit, MapEntry};
use crate::{Constant, ExprArena, ExprId, ExprKind, Name, Span};

impl ExprArena {
    pub fn new_literal(&mut self, value: Constant, span: Span) -> ExprId {
        self.alloc(Expr::new(ExprKind::Literal(value), span))
    }

    pub fn new_bool(&mut self, value: bool, span: Span) -> ExprId {
        self.new_literal(Constant::Bool(value), span)
    }

    pub fn new_ident(&mut self, name: Name, span: Span) -> ExprId {
        self.alloc(Expr::new(ExprKind::Ident(name), span))
    }

    pub fn new_select(&mut self, operand: ExprId, field: Name, span: Span) -> ExprId {
        self.alloc(Expr::new(
            ExprKind::Select { operand, field, test_only: false },
            span,
        ))
    }

    /// A presence test: `has(operand.field)`.
    pub fn new_presence_test(&mut self, operand: ExprId, field: Name, span: Span) -> ExprId {
        self.alloc(Expr::new(
            ExprKind::Select { operand, field, test_only: true },
            span,
        ))
    }

    /// A global call; operators are global calls on reserved names.
    pub fn new_call(
        &mut self,
        function: Name,
        args: impl IntoIterator<Item = ExprId>,
        span: Span,
    ) -> ExprId {
        let args = self.alloc_expr_list(args);
        self.alloc(Expr::new(
            ExprKind::Call { function, target: ExprId::INVALID, args },
            span,
        ))
    }

    /// A member call: `target.function(args)`.
    pub fn new_member_call(
        &mut self,
        target: ExprId,
        function: Name,
        args: impl IntoIterator<Item = ExprId>,
        span: Span,
    ) -> ExprId {
        let args = self.alloc_expr_list(args);
        self.alloc(Expr::new(ExprKind::Call { function, target, args }, span))
    }

    pub fn new_list(&mut self, elems: impl IntoIterator<Item = ExprId>, span: Span) -> ExprId {
        let elems = self.alloc_expr_list(elems);
        self.alloc(Expr::new(ExprKind::List(elems), span))
    }

    pub fn new_map(&mut self, entries: impl IntoIterator<Item = MapEntry>, span: Span) -> ExprId {
        let entries = self.alloc_map_entries(entries);
        self.alloc(Expr::new(ExprKind::Map(entries), span))
    }

    pub fn new_struct(
        &mut self,
        type_name: Name,
        fields: impl IntoIterator<Item = FieldInit>,
        span: Span,
    ) -> ExprId {
        let fields = self.alloc_field_inits(fields);
        self.alloc(Expr::new(ExprKind::Struct { type_name, fields }, span))
    }

    pub fn new_comprehension(&mut self, comp: Comprehension, span: Span) -> ExprId {
        let id = self.alloc_comprehension(comp);
        self.alloc(Expr::new(ExprKind::Comprehension(id), span))
    }
}
