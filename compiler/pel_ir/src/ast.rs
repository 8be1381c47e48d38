//! Expression nodes and the compiled tree.

use std::fmt;

use crate::{ComprehensionId, EntryRange, ExprArena, ExprId, ExprRange, Name, SharedInterner, Span};

/// Expression node.
#[derive(Copy, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Expression variants.
///
/// A closed sum: every node the engine manipulates is one of these. All
/// children are arena indices, not boxes. Operators and macro expansions
/// are calls on the reserved names in [`crate::operators`].
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ExprKind {
    /// Placeholder for a node that has no meaning; never produced by the
    /// parser, only observed on freshly reserved slots.
    Unspecified,

    /// Constant literal: `42`, `"s"`, `true`, `null`.
    Literal(Constant),

    /// Variable reference.
    Ident(Name),

    /// Field selection: `operand.field`.
    ///
    /// With `test_only` set the node is a presence test (`has(operand.field)`)
    /// and evaluates to whether the field is present, not to its value.
    Select {
        operand: ExprId,
        field: Name,
        test_only: bool,
    },

    /// Function or operator call.
    ///
    /// `target` is `ExprId::INVALID` for global calls (all operators);
    /// member calls carry their receiver.
    Call {
        function: Name,
        target: ExprId,
        args: ExprRange,
    },

    /// List literal: `[a, b, c]`.
    List(ExprRange),

    /// Map literal: `{k: v}`.
    Map(EntryRange),

    /// Struct (message) literal: `Msg{field: v}`.
    Struct { type_name: Name, fields: EntryRange },

    /// Fold loop produced by macro expansion (`all`, `exists`).
    Comprehension(ComprehensionId),
}

/// Constant literal values.
///
/// Strings and bytes are interned; interning dedups, so `Name` equality is
/// content equality.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Name),
    Bytes(Name),
}

/// Map entry: `key_expr: value_expr`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MapEntry {
    pub key: ExprId,
    pub value: ExprId,
}

/// Struct field initializer: `field: value_expr`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct FieldInit {
    pub field: Name,
    pub value: ExprId,
}

/// Comprehension node: the canonical fold loop behind `all`/`exists`.
///
/// Evaluates as: bind `accu_var` to `accu_init`; for each element of
/// `iter_range` bound to `iter_var`, stop unless `loop_cond` holds, then
/// rebind `accu_var` to `loop_step`; finally yield `result`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Comprehension {
    pub iter_var: Name,
    pub iter_range: ExprId,
    pub accu_var: Name,
    pub accu_init: ExprId,
    pub loop_cond: ExprId,
    pub loop_step: ExprId,
    pub result: ExprId,
}

/// A parsed expression tree: arena, root, and the interner that owns every
/// `Name` inside it.
///
/// Cloning an `Ast` clones the arena; every node keeps its id, which is what
/// lets the specializer rewrite a clone while the original's ids stay
/// meaningful for both trees.
#[derive(Clone, Debug)]
pub struct Ast {
    arena: ExprArena,
    root: ExprId,
    interner: SharedInterner,
}

impl Ast {
    pub fn new(arena: ExprArena, root: ExprId, interner: SharedInterner) -> Self {
        Ast { arena, root, interner }
    }

    #[inline]
    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    #[inline]
    pub fn arena_mut(&mut self) -> &mut ExprArena {
        &mut self.arena
    }

    #[inline]
    pub fn root(&self) -> ExprId {
        self.root
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Resolve an interned name against this tree's interner.
    #[inline]
    pub fn name(&self, name: Name) -> &'static str {
        self.interner.resolve(name)
    }
}
