//! Indexed execution: probe/mask dispatch agrees with reference
//! evaluation.

use pel_eval::{Env, EvalResult, MapActivation, Value};
use pel_index::{IndexedProgram, Indexer};
use pel_types::{Type, TypeEnv};
use pretty_assertions::assert_eq;

fn env_of(vars: &[(&str, Type)]) -> Env {
    let mut types = TypeEnv::new();
    for (name, ty) in vars {
        types.declare_variable(*name, ty.clone());
    }
    Env::new(types)
}

fn string_map() -> Type {
    Type::map(Type::String, Type::String)
}

/// Indexed and reference programs for one expression.
fn compile_both(env: &Env, expr: &str) -> (IndexedProgram, impl Fn(&MapActivation) -> EvalResult) {
    let ast = env.compile(expr).expect("compile failed");
    let indexed_ast = Indexer::new().generate_index(env, &ast).expect("generate_index failed");
    let indexed = IndexedProgram::new(env, &indexed_ast).expect("IndexedProgram::new failed");
    let reference = env.program(&ast);
    (indexed, move |activation: &MapActivation| reference.eval(activation))
}

fn str_map(pairs: &[(&str, &str)]) -> Value {
    Value::map(pairs.iter().map(|(k, v)| (k.to_string(), Value::string(*v))))
}

#[test]
fn single_presence_test_dispatch() {
    let env = env_of(&[("a", string_map()), ("b", string_map())]);
    let (indexed, reference) = compile_both(&env, "has(a.b) ? a : b");

    let present = MapActivation::new()
        .bind("a", str_map(&[("b", "x")]))
        .bind("b", str_map(&[]));
    assert_eq!(indexed.eval(&present).unwrap(), str_map(&[("b", "x")]));
    assert_eq!(indexed.eval(&present), reference(&present));

    let absent = MapActivation::new()
        .bind("a", str_map(&[]))
        .bind("b", str_map(&[("k", "v")]));
    assert_eq!(indexed.eval(&absent).unwrap(), str_map(&[("k", "v")]));
    assert_eq!(indexed.eval(&absent), reference(&absent));
}

#[test]
fn two_independent_tests_agree_with_reference_everywhere() {
    let env = env_of(&[("a", string_map()), ("b", string_map()), ("c", string_map())]);
    let (indexed, reference) = compile_both(&env, "has(a.b) ? a : has(b.c) ? b : c");

    let a_options = [str_map(&[]), str_map(&[("b", "B")])];
    let b_options = [str_map(&[]), str_map(&[("c", "C")])];
    for a in &a_options {
        for b in &b_options {
            let activation = MapActivation::new()
                .bind("a", a.clone())
                .bind("b", b.clone())
                .bind("c", str_map(&[("k", "K")]));
            assert_eq!(indexed.eval(&activation), reference(&activation));
        }
    }
}

#[test]
fn nested_tests_agree_with_reference_everywhere() {
    let env = env_of(&[
        ("a", Type::map(Type::String, string_map())),
        ("b", string_map()),
        ("c", string_map()),
    ]);
    let (indexed, reference) =
        compile_both(&env, "has(a.b) && has(a.b.c) ? a.b.c : !has(b.c) ? b.c : c.d");

    let a_options = [
        Value::map([]),
        Value::map([("b".to_string(), str_map(&[]))]),
        Value::map([("b".to_string(), str_map(&[("c", "C")]))]),
    ];
    let b_options = [str_map(&[]), str_map(&[("c", "X")])];
    let c_options = [str_map(&[]), str_map(&[("d", "D")])];
    for a in &a_options {
        for b in &b_options {
            for c in &c_options {
                let activation = MapActivation::new()
                    .bind("a", a.clone())
                    .bind("b", b.clone())
                    .bind("c", c.clone());
                // Taken branches may hit genuinely missing leaves; the
                // indexed program must then fail exactly like the
                // reference, not just succeed like it.
                assert_eq!(indexed.eval(&activation), reference(&activation));
            }
        }
    }
}

// ── Ternary object graph over a nested message ────────────────

fn msg_env() -> Env {
    let mut types = TypeEnv::new();
    types.declare_struct(
        "Msg",
        [
            ("child".to_string(), Type::strukt("Msg")),
            ("payload".to_string(), Type::strukt("Payload")),
        ],
    );
    types.declare_struct(
        "Payload",
        [("map_string_string".to_string(), string_map())],
    );
    types.declare_variable("msg", Type::strukt("Msg"));
    Env::new(types)
}

const GRAPH_EXPR: &str = "!has(msg.child) ? 1 \
    : has(msg.child.child) ? 2 \
    : has(msg.child.payload.map_string_string.key) ? 3 \
    : has(msg.child.payload) ? 4 \
    : 5";

fn msg(fields: Vec<(&str, Value)>) -> Value {
    Value::strukt("Msg", fields.into_iter().map(|(k, v)| (k.to_string(), v)))
}

fn payload(pairs: &[(&str, &str)]) -> Value {
    Value::strukt(
        "Payload",
        [("map_string_string".to_string(), str_map(pairs))],
    )
}

#[test]
fn ternary_object_graph_over_nested_message() {
    let env = msg_env();
    let (indexed, reference) = compile_both(&env, GRAPH_EXPR);

    let cases: Vec<(Value, i64)> = vec![
        (msg(vec![("payload", payload(&[]))]), 1),
        (msg(vec![("child", msg(vec![("child", msg(vec![]))]))]), 2),
        (
            msg(vec![("child", msg(vec![("payload", payload(&[("key", "value")]))]))]),
            3,
        ),
        (
            msg(vec![("child", msg(vec![("payload", payload(&[("wrong-key", "value")]))]))]),
            4,
        ),
        (msg(vec![("child", msg(vec![("payload", payload(&[]))]))]), 4),
        (msg(vec![("child", msg(vec![]))]), 5),
    ];

    for (input, expected) in cases {
        let activation = MapActivation::new().bind("msg", input);
        let got = indexed.eval(&activation).expect("indexed eval failed");
        assert_eq!(got, Value::Int(expected));
        assert_eq!(indexed.eval(&activation), reference(&activation));
    }
}

// ── Degradations ──────────────────────────────────────────────

#[test]
fn unknown_root_variable_degrades_to_all_absent() {
    // `ghost` appears in a presence test but is never declared: its probe
    // is omitted, the bit stays 0, and evaluation matches the reference
    // for every conforming input.
    let env = env_of(&[("x", Type::Int)]);
    let (indexed, reference) = compile_both(&env, "has(ghost.b) ? 1 : x");
    let activation = MapActivation::new().bind("x", Value::Int(42));
    assert_eq!(indexed.eval(&activation).unwrap(), Value::Int(42));
    assert_eq!(indexed.eval(&activation), reference(&activation));
}

#[test]
fn probe_errors_propagate() {
    // The probed link crosses a scalar at runtime: a hard error, not
    // absence.
    let env = env_of(&[("a", Type::map(Type::String, Type::Dyn))]);
    let (indexed, _reference) = compile_both(&env, "has(a.b.c) ? 1 : 2");
    let activation =
        MapActivation::new().bind("a", Value::map([("b".to_string(), Value::Int(1))]));
    let err = indexed.eval(&activation).unwrap_err();
    assert!(err.message.contains("cannot access field"), "got: {}", err.message);
}

#[test]
fn specialized_program_errors_propagate_unchanged() {
    let env = env_of(&[("a", string_map()), ("b", string_map())]);
    let (indexed, reference) = compile_both(&env, "has(a.b) ? a : b.missing");
    // Slot 0 evaluates `b.missing` strictly, which fails on this input.
    let activation = MapActivation::new()
        .bind("a", str_map(&[]))
        .bind("b", str_map(&[]));
    assert_eq!(indexed.eval(&activation), reference(&activation));
    assert!(indexed.eval(&activation).is_err());
}

// ── Stability ─────────────────────────────────────────────────

#[test]
fn repeated_evaluation_is_stable() {
    let env = env_of(&[("a", string_map()), ("b", string_map())]);
    let (indexed, _reference) = compile_both(&env, "has(a.b) ? a : b");
    let activation = MapActivation::new()
        .bind("a", str_map(&[("b", "x")]))
        .bind("b", str_map(&[]));
    assert_eq!(indexed.eval(&activation), indexed.eval(&activation));
}

#[test]
fn concurrent_evaluation_is_safe() {
    let env = msg_env();
    let (indexed, _reference) = compile_both(&env, GRAPH_EXPR);
    let activation = MapActivation::new()
        .bind("msg", msg(vec![("child", msg(vec![("child", msg(vec![]))]))]));
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(indexed.eval(&activation).unwrap(), Value::Int(2));
                }
            });
        }
    });
}
