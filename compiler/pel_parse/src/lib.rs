//! PEL Parse - lexer and parser.
//!
//! `parse(source, interner)` produces the canonical `pel_ir::Ast`: macros
//! (`has`, `all`, `exists`) are already expanded and operators are global
//! calls on their reserved names.

mod error;
mod parser;
mod token;

pub use error::ParseError;
pub use parser::parse;

#[cfg(test)]
mod tests {
    use super::*;
    use pel_ir::{match_descendants, navigate, unparse, ExprKind, SharedInterner};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn roundtrip(src: &str) -> String {
        let ast = parse(src, SharedInterner::new()).expect("parse failed");
        unparse(&ast)
    }

    #[test_case("has(a.b) ? a : b")]
    #[test_case("has(a.b) ? a : has(b.c) ? b : c")]
    #[test_case("has(a.b) && has(a.b.c) ? a.b.c : !has(b.c) ? b.c : c.d")]
    #[test_case("x + 1")]
    #[test_case("a.b.c == \"x\" || 2 * n > 6")]
    #[test_case("m[\"k\"] in [1, 2, 3]")]
    #[test_case("msg.items.all(i, i.count >= 0)")]
    #[test_case("msg.tags.exists(t, t == \"prod\")")]
    #[test_case("Msg{child: Msg{}, count: 1}")]
    #[test_case("{\"k\": 1u}")]
    fn parse_unparse_roundtrip(src: &str) {
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn parens_drop_when_redundant() {
        assert_eq!(roundtrip("(a + b) * c"), "(a + b) * c");
        assert_eq!(roundtrip("a + (b * c)"), "a + b * c");
    }

    #[test]
    fn ternary_is_right_associative() {
        assert_eq!(roundtrip("a ? b : c ? d : e"), "a ? b : c ? d : e");
    }

    #[test]
    fn has_marks_select_test_only() {
        let ast = parse("has(a.b.c)", SharedInterner::new()).unwrap();
        let tests = match_descendants(navigate(&ast), |e| {
            matches!(e.kind(), ExprKind::Select { test_only: true, .. })
        });
        assert_eq!(tests.len(), 1);
        // The inner a.b select stays a plain selection.
        let plain = match_descendants(navigate(&ast), |e| {
            matches!(e.kind(), ExprKind::Select { test_only: false, .. })
        });
        assert_eq!(plain.len(), 1);
    }

    #[test]
    fn has_requires_field_selection() {
        let err = parse("has(a)", SharedInterner::new()).unwrap_err();
        assert!(err.message.contains("field selection"), "got: {}", err.message);
        assert!(parse("has(f(x))", SharedInterner::new()).is_err());
        assert!(parse("has(a.b, c)", SharedInterner::new()).is_err());
    }

    #[test]
    fn quantifier_requires_ident_variable() {
        let err = parse("xs.all(1, true)", SharedInterner::new()).unwrap_err();
        assert!(err.message.contains("identifier"), "got: {}", err.message);
    }

    #[test]
    fn trailing_input_rejected() {
        assert!(parse("a b", SharedInterner::new()).is_err());
    }

    #[test]
    fn unterminated_string_rejected() {
        assert!(parse("\"abc", SharedInterner::new()).is_err());
    }

    #[test]
    fn select_ids_follow_parse_order() {
        // Presence tests later in the source get larger node ids; the
        // indexer's tiebreaks depend on this.
        let ast = parse("has(a.b) ? a : has(b.c) ? b : c", SharedInterner::new()).unwrap();
        let tests = match_descendants(navigate(&ast), |e| {
            matches!(e.kind(), ExprKind::Select { test_only: true, .. })
        });
        assert_eq!(tests.len(), 2);
        let first = tests
            .iter()
            .map(|t| (ast.name(t.as_select().unwrap().field), t.id()))
            .collect::<Vec<_>>();
        assert_eq!(first[0].0, "b");
        assert_eq!(first[1].0, "c");
        assert!(first[0].1 < first[1].1);
    }
}
