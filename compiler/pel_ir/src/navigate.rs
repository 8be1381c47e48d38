//! Read-only navigation and descendant matching over an `Ast`.
//!
//! `NavigableExpr` pairs a tree with a node id so matchers can inspect a
//! node and reach its children without touching the arena directly.
//! Traversal is pre-order and visits every child exactly once, so match
//! results are deterministic for a given tree.

use crate::ast::{Ast, Expr};
use crate::{ExprId, ExprKind, Name};

/// A node handle within a navigable tree.
#[derive(Copy, Clone)]
pub struct NavigableExpr<'a> {
    ast: &'a Ast,
    id: ExprId,
}

/// View of a field-selection node.
#[derive(Copy, Clone)]
pub struct SelectExpr<'a> {
    pub operand: NavigableExpr<'a>,
    pub field: Name,
    pub test_only: bool,
}

/// View of a call node.
#[derive(Copy, Clone)]
pub struct CallExpr<'a> {
    pub function: Name,
    /// Receiver of a member call; `None` for global calls.
    pub target: Option<NavigableExpr<'a>>,
    pub args: &'a [ExprId],
}

/// Navigate from the root of a tree.
pub fn navigate(ast: &Ast) -> NavigableExpr<'_> {
    NavigableExpr { ast, id: ast.root() }
}

impl<'a> NavigableExpr<'a> {
    pub fn new(ast: &'a Ast, id: ExprId) -> Self {
        NavigableExpr { ast, id }
    }

    #[inline]
    pub fn id(&self) -> ExprId {
        self.id
    }

    #[inline]
    pub fn expr(&self) -> &'a Expr {
        self.ast.arena().get(self.id)
    }

    #[inline]
    pub fn kind(&self) -> ExprKind {
        self.expr().kind
    }

    #[inline]
    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    fn at(&self, id: ExprId) -> NavigableExpr<'a> {
        NavigableExpr { ast: self.ast, id }
    }

    /// The node as a field selection, if it is one.
    pub fn as_select(&self) -> Option<SelectExpr<'a>> {
        match self.kind() {
            ExprKind::Select { operand, field, test_only } => Some(SelectExpr {
                operand: self.at(operand),
                field,
                test_only,
            }),
            _ => None,
        }
    }

    /// The node's identifier name, if it is an ident.
    pub fn as_ident(&self) -> Option<Name> {
        match self.kind() {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The node as a call, if it is one.
    pub fn as_call(&self) -> Option<CallExpr<'a>> {
        match self.kind() {
            ExprKind::Call { function, target, args } => Some(CallExpr {
                function,
                target: target.is_valid().then(|| self.at(target)),
                args: self.ast.arena().expr_list(args),
            }),
            _ => None,
        }
    }

    /// Direct children, in canonical order.
    pub fn children(&self) -> Vec<ExprId> {
        let arena = self.ast.arena();
        match self.kind() {
            ExprKind::Unspecified | ExprKind::Literal(_) | ExprKind::Ident(_) => Vec::new(),
            ExprKind::Select { operand, .. } => vec![operand],
            ExprKind::Call { target, args, .. } => {
                let mut out = Vec::with_capacity(args.len() + 1);
                if target.is_valid() {
                    out.push(target);
                }
                out.extend_from_slice(arena.expr_list(args));
                out
            }
            ExprKind::List(elems) => arena.expr_list(elems).to_vec(),
            ExprKind::Map(entries) => arena
                .map_entries(entries)
                .iter()
                .flat_map(|e| [e.key, e.value])
                .collect(),
            ExprKind::Struct { fields, .. } => {
                arena.field_inits(fields).iter().map(|f| f.value).collect()
            }
            ExprKind::Comprehension(id) => {
                let comp = arena.comprehension(id);
                vec![
                    comp.iter_range,
                    comp.accu_init,
                    comp.loop_cond,
                    comp.loop_step,
                    comp.result,
                ]
            }
        }
    }
}

impl std::fmt::Debug for NavigableExpr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NavigableExpr({:?}, {:?})", self.id, self.kind())
    }
}

/// Collect every descendant of `root` (including `root` itself) matching
/// the predicate, in pre-order.
pub fn match_descendants<'a>(
    root: NavigableExpr<'a>,
    predicate: impl Fn(&NavigableExpr<'a>) -> bool,
) -> Vec<NavigableExpr<'a>> {
    let mut matches = Vec::new();
    let mut stack = vec![root.id()];
    while let Some(id) = stack.pop() {
        let node = NavigableExpr::new(root.ast(), id);
        if predicate(&node) {
            matches.push(node);
        }
        // Push in reverse so children pop in canonical order.
        let children = node.children();
        stack.extend(children.into_iter().rev());
    }
    matches
}
