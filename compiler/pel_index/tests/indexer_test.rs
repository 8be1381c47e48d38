//! Index generation: field selection, slot layout, specializations.

use pel_eval::Env;
use pel_index::{IndexedAst, Indexer, MAX_FIELD_PATTERNS};
use pel_ir::unparse;
use pel_types::{Type, TypeEnv};
use pretty_assertions::assert_eq;

struct IndexCase {
    expr: &'static str,
    vars: Vec<(&'static str, Type)>,
    fields: Vec<(&'static str, u32)>,
    mask_to_slot: Vec<usize>,
    asts: Vec<&'static str>,
}

fn string_map() -> Type {
    Type::map(Type::String, Type::String)
}

fn generate(expr: &str, vars: &[(&str, Type)]) -> (Env, IndexedAst) {
    let mut types = TypeEnv::new();
    for (name, ty) in vars {
        types.declare_variable(*name, ty.clone());
    }
    let env = Env::new(types);
    let ast = env.compile(expr).expect("compile failed");
    let indexed = Indexer::new().generate_index(&env, &ast).expect("generate_index failed");
    (env, indexed)
}

#[test]
fn generate_index_cases() {
    let cases = vec![
        IndexCase {
            expr: "has(a.b) ? a : b",
            vars: vec![("a", string_map()), ("b", string_map())],
            fields: vec![("a.b", 1)],
            mask_to_slot: vec![0, 1],
            asts: vec!["b", "a"],
        },
        IndexCase {
            expr: "has(a.b) ? a : has(b.c) ? b : c",
            vars: vec![("a", string_map()), ("b", string_map()), ("c", string_map())],
            fields: vec![("a.b", 1), ("b.c", 1)],
            mask_to_slot: vec![0, 1, 2, 3],
            asts: vec!["c", "a", "b", "a"],
        },
        IndexCase {
            expr: "!has(a.b) ? a.c : has(b.c) ? b.c : c.d",
            vars: vec![("a", string_map()), ("b", string_map()), ("c", string_map())],
            fields: vec![("a.b", 1), ("b.c", 1)],
            mask_to_slot: vec![0, 1, 2, 3],
            asts: vec!["a.c", "c.d", "a.c", "b.c"],
        },
        IndexCase {
            expr: "has(a.b) && has(a.b.c) ? a.b.c : !has(b.c) ? b.c : c.d",
            vars: vec![
                ("a", Type::map(Type::String, string_map())),
                ("b", string_map()),
                ("c", string_map()),
            ],
            fields: vec![("a.b", 2), ("a.b.c", 1), ("b.c", 1)],
            mask_to_slot: vec![0, 1, 0, 2, 3, 4, 3, 5],
            asts: vec!["b.c", "b.c", "a.b.c", "c.d", "c.d", "a.b.c"],
        },
    ];

    for case in cases {
        let (_env, indexed) = generate(case.expr, &case.vars);
        let fields: Vec<(&str, u32)> = indexed
            .fields()
            .iter()
            .map(|f| (f.field(), f.frequency()))
            .collect();
        assert_eq!(fields, case.fields, "fields for {}", case.expr);
        assert_eq!(
            indexed.mask_to_slot(),
            case.mask_to_slot.as_slice(),
            "mask_to_slot for {}",
            case.expr
        );
        let asts: Vec<String> = indexed.asts().iter().map(unparse).collect();
        assert_eq!(asts, case.asts, "specializations for {}", case.expr);
    }
}

#[test]
fn no_presence_tests_yields_pass_through_index() {
    let (_env, indexed) = generate("x + 1", &[("x", Type::Int)]);
    assert!(indexed.fields().is_empty());
    assert_eq!(indexed.mask_to_slot(), &[0]);
    assert_eq!(indexed.asts().len(), 1);
    assert_eq!(unparse(&indexed.asts()[0]), "x + 1");
}

#[test]
fn field_selection_truncates_to_the_cap() {
    let expr = "has(a.b) ? 1 : has(b.c) ? 2 : has(c.d) ? 3 : has(d.e) ? 4 : has(e.f) ? 5 : 6";
    let vars: Vec<(&str, Type)> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|v| (*v, string_map()))
        .collect();
    let (_env, indexed) = generate(expr, &vars);
    assert_eq!(indexed.fields().len(), MAX_FIELD_PATTERNS);
    // All tied on frequency, so the cap keeps the earliest tests.
    let names: Vec<&str> = indexed.fields().iter().map(|f| f.field()).collect();
    assert_eq!(names, ["a.b", "b.c", "c.d", "d.e"]);
    assert_eq!(indexed.mask_to_slot().len(), 1 << MAX_FIELD_PATTERNS);
}

#[test]
fn slot_zero_is_the_all_absent_specialization() {
    let (_env, indexed) = generate(
        "has(a.b) ? a : has(b.c) ? b : c",
        &[("a", string_map()), ("b", string_map()), ("c", string_map())],
    );
    assert_eq!(indexed.mask_to_slot()[0], 0);
    assert_eq!(unparse(&indexed.asts()[0]), "c");
}

#[test]
fn generation_is_deterministic() {
    let expr = "has(a.b) && has(a.b.c) ? a.b.c : !has(b.c) ? b.c : c.d";
    let vars = [
        ("a", Type::map(Type::String, string_map())),
        ("b", string_map()),
        ("c", string_map()),
    ];
    let (_e1, first) = generate(expr, &vars);
    let (_e2, second) = generate(expr, &vars);
    let shape = |idx: &IndexedAst| {
        (
            idx.fields()
                .iter()
                .map(|f| (f.field().to_owned(), f.frequency()))
                .collect::<Vec<_>>(),
            idx.mask_to_slot().to_vec(),
            idx.asts().iter().map(unparse).collect::<Vec<_>>(),
        )
    };
    assert_eq!(shape(&first), shape(&second));
}

#[test]
fn presence_tests_in_quantifiers_are_indexed() {
    let (_env, indexed) = generate(
        "xs.all(x, has(a.b) ? x > 0 : x < 0)",
        &[("a", string_map()), ("xs", Type::list(Type::Int))],
    );
    let names: Vec<&str> = indexed.fields().iter().map(|f| f.field()).collect();
    assert_eq!(names, ["a.b"]);
    assert_eq!(indexed.asts().len(), 2);
    assert_eq!(unparse(&indexed.asts()[0]), "xs.all(x, x < 0)");
    assert_eq!(unparse(&indexed.asts()[1]), "xs.all(x, x > 0)");
}
