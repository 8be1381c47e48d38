//! Constant folding.
//!
//! Bottom-up, in-place fold over one tree. A folded node takes the kind of
//! its replacement while keeping its id; nothing else in the arena moves.
//!
//! # Scope
//!
//! - pure operator calls over literal operands (logic, comparison,
//!   arithmetic)
//! - short-circuit collapse of `&&`/`||` with one deciding literal operand
//! - ternary branch selection under a literal condition
//!
//! Runtime failures are never folded away: division by zero, integer
//! overflow, and mistyped operands are left in the tree for the evaluator
//! to report. Logical collapse relies on the evaluator's commutative
//! absorbing `&&`/`||`, under which `x && false` is `false` even when `x`
//! errors.

use std::cmp::Ordering;

use pel_ir::{operators, Ast, Constant, ExprArena, ExprId, ExprKind, Name, SharedInterner};
use pel_types::TypeEnv;

use crate::{AstOptimizer, OptimizeError};

/// The constant-folding pass.
pub struct ConstantFolding;

impl AstOptimizer for ConstantFolding {
    fn optimize(&self, _env: &TypeEnv, ast: &mut Ast) -> Result<(), OptimizeError> {
        let interner = ast.interner().clone();
        let ops = FoldOps::new(&interner);
        let root = ast.root();
        fold_expr(ast.arena_mut(), &interner, &ops, root);
        Ok(())
    }
}

/// Operator names, interned once per pass run.
struct FoldOps {
    conditional: Name,
    and: Name,
    or: Name,
    not: Name,
    neg: Name,
    eq: Name,
    ne: Name,
    lt: Name,
    le: Name,
    gt: Name,
    ge: Name,
    add: Name,
    sub: Name,
    mul: Name,
    div: Name,
    rem: Name,
}

impl FoldOps {
    fn new(interner: &SharedInterner) -> Self {
        FoldOps {
            conditional: interner.intern(operators::CONDITIONAL),
            and: interner.intern(operators::LOGICAL_AND),
            or: interner.intern(operators::LOGICAL_OR),
            not: interner.intern(operators::LOGICAL_NOT),
            neg: interner.intern(operators::NEGATE),
            eq: interner.intern(operators::EQUALS),
            ne: interner.intern(operators::NOT_EQUALS),
            lt: interner.intern(operators::LESS),
            le: interner.intern(operators::LESS_EQUALS),
            gt: interner.intern(operators::GREATER),
            ge: interner.intern(operators::GREATER_EQUALS),
            add: interner.intern(operators::ADD),
            sub: interner.intern(operators::SUBTRACT),
            mul: interner.intern(operators::MULTIPLY),
            div: interner.intern(operators::DIVIDE),
            rem: interner.intern(operators::MODULO),
        }
    }
}

fn fold_expr(arena: &mut ExprArena, interner: &SharedInterner, ops: &FoldOps, id: ExprId) {
    match arena.kind(id) {
        ExprKind::Unspecified | ExprKind::Literal(_) | ExprKind::Ident(_) => {}
        ExprKind::Select { operand, .. } => fold_expr(arena, interner, ops, operand),
        ExprKind::Call { function, target, args } => {
            if target.is_valid() {
                fold_expr(arena, interner, ops, target);
            }
            let args: Vec<ExprId> = arena.expr_list(args).to_vec();
            for &arg in &args {
                fold_expr(arena, interner, ops, arg);
            }
            if !target.is_valid() {
                try_fold_call(arena, interner, ops, id, function, &args);
            }
        }
        ExprKind::List(elems) => {
            for elem in arena.expr_list(elems).to_vec() {
                fold_expr(arena, interner, ops, elem);
            }
        }
        ExprKind::Map(entries) => {
            for entry in arena.map_entries(entries).to_vec() {
                fold_expr(arena, interner, ops, entry.key);
                fold_expr(arena, interner, ops, entry.value);
            }
        }
        ExprKind::Struct { fields, .. } => {
            for field in arena.field_inits(fields).to_vec() {
                fold_expr(arena, interner, ops, field.value);
            }
        }
        ExprKind::Comprehension(comp_id) => {
            let comp = *arena.comprehension(comp_id);
            fold_expr(arena, interner, ops, comp.iter_range);
            fold_expr(arena, interner, ops, comp.accu_init);
            fold_expr(arena, interner, ops, comp.loop_cond);
            fold_expr(arena, interner, ops, comp.loop_step);
            fold_expr(arena, interner, ops, comp.result);
        }
    }
}

/// The literal constant at `id`, if the node is a literal.
fn literal(arena: &ExprArena, id: ExprId) -> Option<Constant> {
    match arena.kind(id) {
        ExprKind::Literal(c) => Some(c),
        _ => None,
    }
}

fn literal_bool(arena: &ExprArena, id: ExprId) -> Option<bool> {
    match literal(arena, id) {
        Some(Constant::Bool(b)) => Some(b),
        _ => None,
    }
}

fn try_fold_call(
    arena: &mut ExprArena,
    interner: &SharedInterner,
    ops: &FoldOps,
    id: ExprId,
    function: Name,
    args: &[ExprId],
) {
    match args.len() {
        1 if function == ops.not => {
            if let Some(b) = literal_bool(arena, args[0]) {
                arena.set_kind(id, ExprKind::Literal(Constant::Bool(!b)));
            }
        }
        1 if function == ops.neg => match literal(arena, args[0]) {
            Some(Constant::Int(i)) => {
                if let Some(negated) = i.checked_neg() {
                    arena.set_kind(id, ExprKind::Literal(Constant::Int(negated)));
                }
            }
            Some(Constant::Double(d)) => {
                arena.set_kind(id, ExprKind::Literal(Constant::Double(-d)));
            }
            _ => {}
        },
        2 if function == ops.and => fold_logic(arena, id, args[0], args[1], false),
        2 if function == ops.or => fold_logic(arena, id, args[0], args[1], true),
        3 if function == ops.conditional => {
            if let Some(cond) = literal_bool(arena, args[0]) {
                let surviving = if cond { args[1] } else { args[2] };
                let kind = arena.kind(surviving);
                arena.set_kind(id, kind);
            }
        }
        2 => {
            let (Some(lhs), Some(rhs)) = (literal(arena, args[0]), literal(arena, args[1]))
            else {
                return;
            };
            if let Some(folded) = fold_binary(interner, ops, function, &lhs, &rhs) {
                arena.set_kind(id, ExprKind::Literal(folded));
            }
        }
        _ => {}
    }
}

/// Collapse `&&` / `||` around a deciding literal operand.
///
/// `absorbing` is the operand value that decides the result regardless of
/// the other side: `false` for `&&`, `true` for `||`. The identity operand
/// (`true` for `&&`) drops out, promoting the other side into this node -
/// but only when that other side is not a mistyped literal, so a runtime
/// overload error is never folded away.
fn fold_logic(arena: &mut ExprArena, id: ExprId, left: ExprId, right: ExprId, absorbing: bool) {
    let lhs = literal_bool(arena, left);
    let rhs = literal_bool(arena, right);
    if lhs == Some(absorbing) || rhs == Some(absorbing) {
        arena.set_kind(id, ExprKind::Literal(Constant::Bool(absorbing)));
        return;
    }
    let left_mistyped = lhs.is_none() && literal(arena, left).is_some();
    let right_mistyped = rhs.is_none() && literal(arena, right).is_some();
    if lhs == Some(!absorbing) && !right_mistyped {
        let kind = arena.kind(right);
        arena.set_kind(id, kind);
    } else if rhs == Some(!absorbing) && !left_mistyped {
        let kind = arena.kind(left);
        arena.set_kind(id, kind);
    }
}

/// Evaluate a pure binary operator over two constants.
///
/// `None` means "leave it to the runtime": no overload for these operand
/// types, overflow, division by zero, or an unordered double comparison.
fn fold_binary(
    interner: &SharedInterner,
    ops: &FoldOps,
    function: Name,
    lhs: &Constant,
    rhs: &Constant,
) -> Option<Constant> {
    if function == ops.eq {
        return Some(Constant::Bool(constants_equal(lhs, rhs)));
    }
    if function == ops.ne {
        return Some(Constant::Bool(!constants_equal(lhs, rhs)));
    }
    if function == ops.lt || function == ops.le || function == ops.gt || function == ops.ge {
        let ordering = compare_constants(interner, lhs, rhs)?;
        let result = if function == ops.lt {
            ordering == Ordering::Less
        } else if function == ops.le {
            ordering != Ordering::Greater
        } else if function == ops.gt {
            ordering == Ordering::Greater
        } else {
            ordering != Ordering::Less
        };
        return Some(Constant::Bool(result));
    }

    use Constant::{Double, Int, String as Str, Uint};
    if function == ops.add {
        return match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_add(*b).map(Int),
            (Uint(a), Uint(b)) => a.checked_add(*b).map(Uint),
            (Double(a), Double(b)) => Some(Double(a + b)),
            (Str(a), Str(b)) => {
                let mut joined = interner.resolve(*a).to_owned();
                joined.push_str(interner.resolve(*b));
                Some(Str(interner.intern(&joined)))
            }
            _ => None,
        };
    }
    if function == ops.sub {
        return match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_sub(*b).map(Int),
            (Uint(a), Uint(b)) => a.checked_sub(*b).map(Uint),
            (Double(a), Double(b)) => Some(Double(a - b)),
            _ => None,
        };
    }
    if function == ops.mul {
        return match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_mul(*b).map(Int),
            (Uint(a), Uint(b)) => a.checked_mul(*b).map(Uint),
            (Double(a), Double(b)) => Some(Double(a * b)),
            _ => None,
        };
    }
    if function == ops.div {
        return match (lhs, rhs) {
            (Int(_), Int(0)) | (Uint(_), Uint(0)) => None,
            (Int(a), Int(b)) => a.checked_div(*b).map(Int),
            (Uint(a), Uint(b)) => a.checked_div(*b).map(Uint),
            (Double(a), Double(b)) => Some(Double(a / b)),
            _ => None,
        };
    }
    if function == ops.rem {
        return match (lhs, rhs) {
            (Int(_), Int(0)) | (Uint(_), Uint(0)) => None,
            (Int(a), Int(b)) => a.checked_rem(*b).map(Int),
            (Uint(a), Uint(b)) => a.checked_rem(*b).map(Uint),
            _ => None,
        };
    }
    None
}

/// Constant equality mirroring runtime value equality: comparisons across
/// types are `false`, not an error, and interned handles compare by
/// content.
fn constants_equal(lhs: &Constant, rhs: &Constant) -> bool {
    lhs == rhs
}

fn compare_constants(
    interner: &SharedInterner,
    lhs: &Constant,
    rhs: &Constant,
) -> Option<Ordering> {
    match (lhs, rhs) {
        (Constant::Int(a), Constant::Int(b)) => Some(a.cmp(b)),
        (Constant::Uint(a), Constant::Uint(b)) => Some(a.cmp(b)),
        (Constant::Double(a), Constant::Double(b)) => a.partial_cmp(b),
        (Constant::String(a), Constant::String(b)) => {
            Some(interner.resolve(*a).cmp(interner.resolve(*b)))
        }
        _ => None,
    }
}
