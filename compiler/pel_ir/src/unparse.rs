//! Canonical unparser.
//!
//! Renders a tree back to source form with minimal parenthesization. The
//! output is the canonical spelling, not the original text: macro calls are
//! reconstructed (`has(...)`, `.all(...)`, `.exists(...)`) and whitespace is
//! normalized. Used by the indexer tests to compare specializations.

use std::fmt::Write;

use crate::ast::Ast;
use crate::{operators, Comprehension, Constant, ExprId, ExprKind, Name};

const PREC_ATOM: u8 = u8::MAX;
const PREC_POSTFIX: u8 = 8;

/// Render the tree rooted at `ast.root()`.
pub fn unparse(ast: &Ast) -> String {
    let mut out = String::new();
    write_expr(&mut out, ast, ast.root(), 0);
    out
}

fn write_expr(out: &mut String, ast: &Ast, id: ExprId, min_prec: u8) {
    match ast.arena().kind(id) {
        ExprKind::Unspecified => out.push_str("<unspecified>"),
        ExprKind::Literal(c) => write_constant(out, ast, c),
        ExprKind::Ident(name) => out.push_str(ast.name(name)),
        ExprKind::Select { operand, field, test_only } => {
            if test_only {
                out.push_str("has(");
                write_expr(out, ast, operand, PREC_POSTFIX);
                out.push('.');
                out.push_str(ast.name(field));
                out.push(')');
            } else {
                write_expr(out, ast, operand, PREC_POSTFIX);
                out.push('.');
                out.push_str(ast.name(field));
            }
        }
        ExprKind::Call { function, target, args } => {
            let args = ast.arena().expr_list(args).to_vec();
            write_call(out, ast, ast.name(function), target, &args, min_prec);
        }
        ExprKind::List(elems) => {
            out.push('[');
            for (i, &elem) in ast.arena().expr_list(elems).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, ast, elem, 0);
            }
            out.push(']');
        }
        ExprKind::Map(entries) => {
            out.push('{');
            for (i, entry) in ast.arena().map_entries(entries).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, ast, entry.key, 0);
                out.push_str(": ");
                write_expr(out, ast, entry.value, 0);
            }
            out.push('}');
        }
        ExprKind::Struct { type_name, fields } => {
            out.push_str(ast.name(type_name));
            out.push('{');
            for (i, field) in ast.arena().field_inits(fields).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(ast.name(field.field));
                out.push_str(": ");
                write_expr(out, ast, field.value, 0);
            }
            out.push('}');
        }
        ExprKind::Comprehension(comp_id) => {
            let comp = *ast.arena().comprehension(comp_id);
            write_comprehension(out, ast, &comp);
        }
    }
}

fn write_call(
    out: &mut String,
    ast: &Ast,
    function: &str,
    target: ExprId,
    args: &[ExprId],
    min_prec: u8,
) {
    let prec = operators::precedence(function);
    match function {
        operators::CONDITIONAL if args.len() == 3 => {
            paren_open(out, prec, min_prec);
            write_expr(out, ast, args[0], prec + 1);
            out.push_str(" ? ");
            write_expr(out, ast, args[1], prec);
            out.push_str(" : ");
            write_expr(out, ast, args[2], prec);
            paren_close(out, prec, min_prec);
        }
        operators::LOGICAL_NOT | operators::NEGATE if args.len() == 1 => {
            paren_open(out, prec, min_prec);
            out.push(if function == operators::LOGICAL_NOT { '!' } else { '-' });
            write_expr(out, ast, args[0], prec);
            paren_close(out, prec, min_prec);
        }
        operators::INDEX if args.len() == 2 => {
            write_expr(out, ast, args[0], PREC_POSTFIX);
            out.push('[');
            write_expr(out, ast, args[1], 0);
            out.push(']');
        }
        _ => {
            if let Some(symbol) = operators::binary_symbol(function) {
                if args.len() == 2 {
                    paren_open(out, prec, min_prec);
                    write_expr(out, ast, args[0], prec);
                    let _ = write!(out, " {symbol} ");
                    write_expr(out, ast, args[1], prec + 1);
                    paren_close(out, prec, min_prec);
                    return;
                }
            }
            if target.is_valid() {
                write_expr(out, ast, target, PREC_POSTFIX);
                out.push('.');
            }
            out.push_str(function);
            out.push('(');
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, ast, arg, 0);
            }
            out.push(')');
        }
    }
}

fn paren_open(out: &mut String, prec: u8, min_prec: u8) {
    if prec < min_prec {
        out.push('(');
    }
}

fn paren_close(out: &mut String, prec: u8, min_prec: u8) {
    if prec < min_prec {
        out.push(')');
    }
}

/// Reconstruct the macro form of a comprehension when its shape matches
/// `all`/`exists`; otherwise fall back to the explicit loop form.
fn write_comprehension(out: &mut String, ast: &Ast, comp: &Comprehension) {
    if let Some(macro_name) = macro_name_of(ast, comp) {
        write_expr(out, ast, comp.iter_range, PREC_POSTFIX);
        out.push('.');
        out.push_str(macro_name);
        out.push('(');
        out.push_str(ast.name(comp.iter_var));
        out.push_str(", ");
        write_expr(out, ast, loop_predicate(ast, comp), 0);
        out.push(')');
    } else {
        out.push_str("__comprehension__(");
        out.push_str(ast.name(comp.iter_var));
        out.push_str(", ");
        write_expr(out, ast, comp.iter_range, 0);
        out.push_str(", ");
        write_expr(out, ast, comp.result, 0);
        out.push(')');
    }
}

fn macro_name_of(ast: &Ast, comp: &Comprehension) -> Option<&'static str> {
    match ast.arena().kind(comp.loop_step) {
        ExprKind::Call { function, target, args }
            if !target.is_valid() && ast.arena().expr_list(args).len() == 2 =>
        {
            let first = ast.arena().expr_list(args)[0];
            if !is_accu_ref(ast, first, comp.accu_var) {
                return None;
            }
            match ast.name(function) {
                operators::LOGICAL_AND => Some("all"),
                operators::LOGICAL_OR => Some("exists"),
                _ => None,
            }
        }
        _ => None,
    }
}

fn loop_predicate(ast: &Ast, comp: &Comprehension) -> ExprId {
    match ast.arena().kind(comp.loop_step) {
        ExprKind::Call { args, .. } => ast.arena().expr_list(args)[1],
        _ => comp.loop_step,
    }
}

fn is_accu_ref(ast: &Ast, id: ExprId, accu_var: Name) -> bool {
    matches!(ast.arena().kind(id), ExprKind::Ident(name) if name == accu_var)
}

fn write_constant(out: &mut String, ast: &Ast, c: Constant) {
    match c {
        Constant::Null => out.push_str("null"),
        Constant::Bool(b) => out.push_str(if b { "true" } else { "false" }),
        Constant::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Constant::Uint(u) => {
            let _ = write!(out, "{u}u");
        }
        Constant::Double(d) => {
            let _ = write!(out, "{d:?}");
        }
        Constant::String(name) => {
            out.push('"');
            for ch in ast.name(name).chars() {
                match ch {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    '\r' => out.push_str("\\r"),
                    _ => out.push(ch),
                }
            }
            out.push('"');
        }
        Constant::Bytes(name) => {
            let _ = write!(out, "b\"{}\"", ast.name(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExprArena, SharedInterner, Span};

    #[test]
    fn unparses_nested_operators_with_minimal_parens() {
        // (a || b) && !c
        let interner = SharedInterner::new();
        let mut arena = ExprArena::new();
        let a = arena.new_ident(interner.intern("a"), Span::DUMMY);
        let b = arena.new_ident(interner.intern("b"), Span::DUMMY);
        let or = arena.new_call(interner.intern(operators::LOGICAL_OR), [a, b], Span::DUMMY);
        let c = arena.new_ident(interner.intern("c"), Span::DUMMY);
        let not = arena.new_call(interner.intern(operators::LOGICAL_NOT), [c], Span::DUMMY);
        let and = arena.new_call(interner.intern(operators::LOGICAL_AND), [or, not], Span::DUMMY);
        let ast = Ast::new(arena, and, interner);
        assert_eq!(unparse(&ast), "(a || b) && !c");
    }

    #[test]
    fn unparses_presence_test_and_ternary() {
        // has(a.b) ? a : b
        let interner = SharedInterner::new();
        let mut arena = ExprArena::new();
        let a0 = arena.new_ident(interner.intern("a"), Span::DUMMY);
        let test = arena.new_presence_test(a0, interner.intern("b"), Span::DUMMY);
        let a1 = arena.new_ident(interner.intern("a"), Span::DUMMY);
        let b = arena.new_ident(interner.intern("b"), Span::DUMMY);
        let cond =
            arena.new_call(interner.intern(operators::CONDITIONAL), [test, a1, b], Span::DUMMY);
        let ast = Ast::new(arena, cond, interner);
        assert_eq!(unparse(&ast), "has(a.b) ? a : b");
    }

    #[test]
    fn unparses_literals() {
        let interner = SharedInterner::new();
        let mut arena = ExprArena::new();
        let s = arena.new_literal(Constant::String(interner.intern("x\ny")), Span::DUMMY);
        let ast = Ast::new(arena, s, interner);
        assert_eq!(unparse(&ast), "\"x\\ny\"");
    }
}
