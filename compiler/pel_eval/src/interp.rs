//! Tree-walking program evaluation.
//!
//! A `Program` owns its tree; evaluation walks the arena directly with no
//! intermediate compilation step. Logical `&&`/`||` use commutative
//! absorbing semantics (a deciding operand wins even if the other operand
//! errors), which is what makes short-circuit constant folding
//! semantics-preserving.

use std::cmp::Ordering;

use pel_ir::{operators, Ast, Comprehension, Constant, ExprId, ExprKind, Name, SharedInterner, Span};

use crate::activation::ScopedActivation;
use crate::errors::{
    cannot_access_field, condition_not_bool, division_by_zero, index_out_of_bounds,
    integer_overflow, map_key_not_string, modulo_by_zero, no_such_field, no_such_function,
    no_such_key, no_such_overload, no_such_variable, not_iterable,
};
use crate::{Activation, EvalError, EvalResult, Value};

/// Operator names, interned once per program.
#[derive(Debug)]
struct OpSet {
    conditional: Name,
    and: Name,
    or: Name,
    not: Name,
    eq: Name,
    ne: Name,
    lt: Name,
    le: Name,
    gt: Name,
    ge: Name,
    in_: Name,
    add: Name,
    sub: Name,
    mul: Name,
    div: Name,
    rem: Name,
    neg: Name,
    index: Name,
}

impl OpSet {
    fn new(interner: &SharedInterner) -> Self {
        OpSet {
            conditional: interner.intern(operators::CONDITIONAL),
            and: interner.intern(operators::LOGICAL_AND),
            or: interner.intern(operators::LOGICAL_OR),
            not: interner.intern(operators::LOGICAL_NOT),
            eq: interner.intern(operators::EQUALS),
            ne: interner.intern(operators::NOT_EQUALS),
            lt: interner.intern(operators::LESS),
            le: interner.intern(operators::LESS_EQUALS),
            gt: interner.intern(operators::GREATER),
            ge: interner.intern(operators::GREATER_EQUALS),
            in_: interner.intern(operators::IN),
            add: interner.intern(operators::ADD),
            sub: interner.intern(operators::SUBTRACT),
            mul: interner.intern(operators::MULTIPLY),
            div: interner.intern(operators::DIVIDE),
            rem: interner.intern(operators::MODULO),
            neg: interner.intern(operators::NEGATE),
            index: interner.intern(operators::INDEX),
        }
    }
}

/// An executable expression.
#[derive(Debug)]
pub struct Program {
    ast: Ast,
    ops: OpSet,
}

impl Program {
    pub(crate) fn new(ast: Ast) -> Self {
        let ops = OpSet::new(ast.interner());
        Program { ast, ops }
    }

    /// The tree this program executes.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Evaluate against one activation.
    pub fn eval(&self, activation: &dyn Activation) -> EvalResult {
        let evaluator = Evaluator { ast: &self.ast, ops: &self.ops, activation };
        evaluator.eval(self.ast.root())
    }
}

struct Evaluator<'a> {
    ast: &'a Ast,
    ops: &'a OpSet,
    activation: &'a dyn Activation,
}

impl<'a> Evaluator<'a> {
    fn scoped<'b>(&'b self, activation: &'b dyn Activation) -> Evaluator<'b> {
        Evaluator { ast: self.ast, ops: self.ops, activation }
    }

    fn eval(&self, id: ExprId) -> EvalResult {
        let expr = self.ast.arena().get(id);
        match expr.kind {
            ExprKind::Unspecified => {
                Err(EvalError::new("unspecified expression").with_span(expr.span))
            }
            ExprKind::Literal(c) => Ok(self.constant(c)),
            ExprKind::Ident(name) => {
                let name = self.ast.name(name);
                self.activation
                    .resolve(name)
                    .ok_or_else(|| no_such_variable(name).with_span(expr.span))
            }
            ExprKind::Select { operand, field, test_only } => {
                let field = self.ast.name(field);
                if test_only {
                    self.eval_presence(operand, field, expr.span)
                } else {
                    let base = self.eval(operand)?;
                    match base.field(field) {
                        Some(Some(value)) => Ok(value.clone()),
                        Some(None) => Err(no_such_field(field).with_span(expr.span)),
                        None => Err(cannot_access_field(base.type_name(), field)
                            .with_span(expr.span)),
                    }
                }
            }
            ExprKind::Call { function, target, args } => {
                self.eval_call(function, target, args, expr.span)
            }
            ExprKind::List(elems) => {
                let mut out = Vec::with_capacity(elems.len());
                for &elem in self.ast.arena().expr_list(elems) {
                    out.push(self.eval(elem)?);
                }
                Ok(Value::list(out))
            }
            ExprKind::Map(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for entry in self.ast.arena().map_entries(entries) {
                    let key = match self.eval(entry.key)? {
                        Value::String(s) => s.to_string(),
                        other => {
                            return Err(map_key_not_string(other.type_name())
                                .with_span(expr.span))
                        }
                    };
                    out.push((key, self.eval(entry.value)?));
                }
                Ok(Value::map(out))
            }
            ExprKind::Struct { type_name, fields } => {
                let mut out = Vec::with_capacity(fields.len());
                for field in self.ast.arena().field_inits(fields) {
                    out.push((self.ast.name(field.field).to_owned(), self.eval(field.value)?));
                }
                Ok(Value::strukt(self.ast.name(type_name), out))
            }
            ExprKind::Comprehension(comp_id) => {
                self.eval_comprehension(*self.ast.arena().comprehension(comp_id))
            }
        }
    }

    fn constant(&self, c: Constant) -> Value {
        match c {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(b),
            Constant::Int(i) => Value::Int(i),
            Constant::Uint(u) => Value::Uint(u),
            Constant::Double(d) => Value::Double(d),
            Constant::String(name) => Value::string(self.ast.name(name)),
            Constant::Bytes(name) => Value::bytes(self.ast.name(name).as_bytes()),
        }
    }

    // ── Presence tests ─────────────────────────────────────────

    /// Presence semantics are total over the qualification chain: an
    /// unbound root or a missing intermediate field answers `false`, the
    /// same way the compiled field probes do. Only selection into a value
    /// that can never carry fields is an error.
    fn eval_presence(&self, operand: ExprId, field: &str, span: Span) -> EvalResult {
        match self.eval_optional(operand)? {
            None => Ok(Value::Bool(false)),
            Some(base) => match base.field(field) {
                Some(present) => Ok(Value::Bool(present.is_some())),
                None => Err(cannot_access_field(base.type_name(), field).with_span(span)),
            },
        }
    }

    /// Evaluate a presence-test operand, absorbing missing links into
    /// `None`. Non-chain operands are evaluated strictly.
    fn eval_optional(&self, id: ExprId) -> Result<Option<Value>, EvalError> {
        let expr = self.ast.arena().get(id);
        match expr.kind {
            ExprKind::Ident(name) => Ok(self.activation.resolve(self.ast.name(name))),
            ExprKind::Select { operand, field, test_only: false } => {
                let field = self.ast.name(field);
                match self.eval_optional(operand)? {
                    None => Ok(None),
                    Some(base) => match base.field(field) {
                        Some(value) => Ok(value.cloned()),
                        None => Err(cannot_access_field(base.type_name(), field)
                            .with_span(expr.span)),
                    },
                }
            }
            _ => self.eval(id).map(Some),
        }
    }

    // ── Calls ──────────────────────────────────────────────────

    fn eval_call(&self, function: Name, target: ExprId, args: pel_ir::ExprRange, span: Span) -> EvalResult {
        let args = self.ast.arena().expr_list(args);
        let ops = self.ops;
        if !target.is_valid() {
            match args.len() {
                3 if function == ops.conditional => {
                    return self.eval_conditional(args[0], args[1], args[2], span);
                }
                2 if function == ops.and => return self.eval_and(args[0], args[1], span),
                2 if function == ops.or => return self.eval_or(args[0], args[1], span),
                1 if function == ops.not => {
                    return match self.eval(args[0])? {
                        Value::Bool(b) => Ok(Value::Bool(!b)),
                        v => Err(no_such_overload("!", &[v.type_name()]).with_span(span)),
                    };
                }
                1 if function == ops.neg => {
                    return match self.eval(args[0])? {
                        Value::Int(i) => i
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or_else(|| integer_overflow("negation").with_span(span)),
                        Value::Double(d) => Ok(Value::Double(-d)),
                        v => Err(no_such_overload("-", &[v.type_name()]).with_span(span)),
                    };
                }
                2 if function == ops.eq => {
                    return Ok(Value::Bool(self.eval(args[0])? == self.eval(args[1])?));
                }
                2 if function == ops.ne => {
                    return Ok(Value::Bool(self.eval(args[0])? != self.eval(args[1])?));
                }
                2 if function == ops.lt
                    || function == ops.le
                    || function == ops.gt
                    || function == ops.ge =>
                {
                    return self.eval_relation(function, args[0], args[1], span);
                }
                2 if function == ops.in_ => return self.eval_in(args[0], args[1], span),
                2 if function == ops.index => return self.eval_index(args[0], args[1], span),
                2 if function == ops.add
                    || function == ops.sub
                    || function == ops.mul
                    || function == ops.div
                    || function == ops.rem =>
                {
                    return self.eval_arith(function, args[0], args[1], span);
                }
                _ => {}
            }
            if self.ast.name(function) == "size" && args.len() == 1 {
                return self.eval_size(args[0], span);
            }
        }
        Err(no_such_function(self.ast.name(function)).with_span(span))
    }

    fn eval_conditional(&self, cond: ExprId, then: ExprId, otherwise: ExprId, span: Span) -> EvalResult {
        match self.eval(cond)? {
            Value::Bool(true) => self.eval(then),
            Value::Bool(false) => self.eval(otherwise),
            v => Err(condition_not_bool(v.type_name()).with_span(span)),
        }
    }

    /// Commutative absorbing `&&`: a `false` operand decides the result
    /// even when the other operand errors or is mistyped.
    fn eval_and(&self, left: ExprId, right: ExprId, span: Span) -> EvalResult {
        match self.eval(left) {
            Ok(Value::Bool(false)) => Ok(Value::Bool(false)),
            Ok(Value::Bool(true)) => match self.eval(right)? {
                Value::Bool(b) => Ok(Value::Bool(b)),
                v => Err(no_such_overload("&&", &["bool", v.type_name()]).with_span(span)),
            },
            Ok(v) => match self.eval(right) {
                Ok(Value::Bool(false)) => Ok(Value::Bool(false)),
                _ => Err(no_such_overload("&&", &[v.type_name()]).with_span(span)),
            },
            Err(err) => match self.eval(right) {
                Ok(Value::Bool(false)) => Ok(Value::Bool(false)),
                _ => Err(err),
            },
        }
    }

    /// Commutative absorbing `||`, dual of [`Self::eval_and`].
    fn eval_or(&self, left: ExprId, right: ExprId, span: Span) -> EvalResult {
        match self.eval(left) {
            Ok(Value::Bool(true)) => Ok(Value::Bool(true)),
            Ok(Value::Bool(false)) => match self.eval(right)? {
                Value::Bool(b) => Ok(Value::Bool(b)),
                v => Err(no_such_overload("||", &["bool", v.type_name()]).with_span(span)),
            },
            Ok(v) => match self.eval(right) {
                Ok(Value::Bool(true)) => Ok(Value::Bool(true)),
                _ => Err(no_such_overload("||", &[v.type_name()]).with_span(span)),
            },
            Err(err) => match self.eval(right) {
                Ok(Value::Bool(true)) => Ok(Value::Bool(true)),
                _ => Err(err),
            },
        }
    }

    fn eval_relation(&self, function: Name, left: ExprId, right: ExprId, span: Span) -> EvalResult {
        let lhs = self.eval(left)?;
        let rhs = self.eval(right)?;
        let ordering = compare(&lhs, &rhs).ok_or_else(|| {
            no_such_overload("comparison", &[lhs.type_name(), rhs.type_name()]).with_span(span)
        })?;
        let ops = self.ops;
        let result = if function == ops.lt {
            ordering == Ordering::Less
        } else if function == ops.le {
            ordering != Ordering::Greater
        } else if function == ops.gt {
            ordering == Ordering::Greater
        } else {
            ordering != Ordering::Less
        };
        Ok(Value::Bool(result))
    }

    fn eval_in(&self, elem: ExprId, collection: ExprId, span: Span) -> EvalResult {
        let needle = self.eval(elem)?;
        match self.eval(collection)? {
            Value::List(elems) => Ok(Value::Bool(elems.contains(&needle))),
            Value::Map(entries) => match needle {
                Value::String(key) => Ok(Value::Bool(entries.contains_key(key.as_str()))),
                v => Err(no_such_overload("in", &[v.type_name(), "map"]).with_span(span)),
            },
            v => Err(no_such_overload("in", &[needle.type_name(), v.type_name()]).with_span(span)),
        }
    }

    fn eval_index(&self, operand: ExprId, index: ExprId, span: Span) -> EvalResult {
        let base = self.eval(operand)?;
        let key = self.eval(index)?;
        match (&base, &key) {
            (Value::Map(entries), Value::String(k)) => entries
                .get(k.as_str())
                .cloned()
                .ok_or_else(|| no_such_key(k.as_str()).with_span(span)),
            (Value::List(elems), Value::Int(i)) => {
                let idx = usize::try_from(*i)
                    .ok()
                    .filter(|&idx| idx < elems.len())
                    .ok_or_else(|| index_out_of_bounds(*i, elems.len()).with_span(span))?;
                Ok(elems[idx].clone())
            }
            (Value::List(elems), Value::Uint(u)) => {
                let idx = usize::try_from(*u)
                    .ok()
                    .filter(|&idx| idx < elems.len())
                    .ok_or_else(|| index_out_of_bounds(*u as i64, elems.len()).with_span(span))?;
                Ok(elems[idx].clone())
            }
            _ => Err(no_such_overload("index", &[base.type_name(), key.type_name()])
                .with_span(span)),
        }
    }

    fn eval_arith(&self, function: Name, left: ExprId, right: ExprId, span: Span) -> EvalResult {
        let lhs = self.eval(left)?;
        let rhs = self.eval(right)?;
        let ops = self.ops;
        let (op, symbol) = if function == ops.add {
            (ArithOp::Add, "+")
        } else if function == ops.sub {
            (ArithOp::Sub, "-")
        } else if function == ops.mul {
            (ArithOp::Mul, "*")
        } else if function == ops.div {
            (ArithOp::Div, "/")
        } else {
            (ArithOp::Rem, "%")
        };
        arith(op, &lhs, &rhs)
            .unwrap_or_else(|| {
                Err(no_such_overload(symbol, &[lhs.type_name(), rhs.type_name()]))
            })
            .map_err(|e| e.with_span(span))
    }

    fn eval_size(&self, operand: ExprId, span: Span) -> EvalResult {
        let len = match self.eval(operand)? {
            Value::String(s) => s.chars().count(),
            Value::Bytes(b) => b.len(),
            Value::List(elems) => elems.len(),
            Value::Map(entries) => entries.len(),
            v => return Err(no_such_overload("size", &[v.type_name()]).with_span(span)),
        };
        Ok(Value::Int(len as i64))
    }

    // ── Comprehensions ─────────────────────────────────────────

    fn eval_comprehension(&self, comp: Comprehension) -> EvalResult {
        let range = self.eval(comp.iter_range)?;
        let items: Vec<Value> = match range {
            Value::List(elems) => elems.to_vec(),
            Value::Map(entries) => {
                // Iterate keys in sorted order for deterministic errors.
                let mut keys: Vec<_> = entries.keys().cloned().collect();
                keys.sort();
                keys.into_iter().map(Value::string).collect()
            }
            v => return Err(not_iterable(v.type_name())),
        };
        let iter_name = self.ast.name(comp.iter_var);
        let accu_name = self.ast.name(comp.accu_var);
        let mut accu = self.eval(comp.accu_init)?;
        for item in items {
            let accu_scope = ScopedActivation::new(self.activation, accu_name, accu.clone());
            let iter_scope = ScopedActivation::new(&accu_scope, iter_name, item);
            let scoped = self.scoped(&iter_scope);
            match scoped.eval(comp.loop_cond)? {
                Value::Bool(true) => {}
                Value::Bool(false) => break,
                v => return Err(condition_not_bool(v.type_name())),
            }
            accu = scoped.eval(comp.loop_step)?;
        }
        let result_scope = ScopedActivation::new(self.activation, accu_name, accu);
        self.scoped(&result_scope).eval(comp.result)
    }
}

#[derive(Copy, Clone)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Apply an arithmetic operator; `None` means no overload for the operand
/// types, `Some(Err(..))` a runtime failure (overflow, division by zero).
fn arith(op: ArithOp, lhs: &Value, rhs: &Value) -> Option<EvalResult> {
    use ArithOp::*;
    use Value::*;
    let result = match (op, lhs, rhs) {
        (Add, Int(a), Int(b)) => int_checked(a.checked_add(*b), "addition"),
        (Sub, Int(a), Int(b)) => int_checked(a.checked_sub(*b), "subtraction"),
        (Mul, Int(a), Int(b)) => int_checked(a.checked_mul(*b), "multiplication"),
        (Div, Int(_), Int(0)) => Err(division_by_zero()),
        (Div, Int(a), Int(b)) => int_checked(a.checked_div(*b), "division"),
        (Rem, Int(_), Int(0)) => Err(modulo_by_zero()),
        (Rem, Int(a), Int(b)) => int_checked(a.checked_rem(*b), "modulo"),

        (Add, Uint(a), Uint(b)) => uint_checked(a.checked_add(*b), "addition"),
        (Sub, Uint(a), Uint(b)) => uint_checked(a.checked_sub(*b), "subtraction"),
        (Mul, Uint(a), Uint(b)) => uint_checked(a.checked_mul(*b), "multiplication"),
        (Div, Uint(_), Uint(0)) => Err(division_by_zero()),
        (Div, Uint(a), Uint(b)) => uint_checked(a.checked_div(*b), "division"),
        (Rem, Uint(_), Uint(0)) => Err(modulo_by_zero()),
        (Rem, Uint(a), Uint(b)) => uint_checked(a.checked_rem(*b), "modulo"),

        (Add, Double(a), Double(b)) => Ok(Value::Double(a + b)),
        (Sub, Double(a), Double(b)) => Ok(Value::Double(a - b)),
        (Mul, Double(a), Double(b)) => Ok(Value::Double(a * b)),
        (Div, Double(a), Double(b)) => Ok(Value::Double(a / b)),

        (Add, String(a), String(b)) => {
            let mut s = a.to_string();
            s.push_str(b);
            Ok(Value::string(s))
        }
        (Add, Bytes(a), Bytes(b)) => {
            let mut bytes = a.to_vec();
            bytes.extend_from_slice(b);
            Ok(Value::bytes(bytes))
        }
        (Add, List(a), List(b)) => {
            let mut elems = a.to_vec();
            elems.extend(b.iter().cloned());
            Ok(Value::list(elems))
        }

        _ => return None,
    };
    Some(result)
}

fn int_checked(value: Option<i64>, operation: &str) -> EvalResult {
    value.map(Value::Int).ok_or_else(|| integer_overflow(operation))
}

fn uint_checked(value: Option<u64>, operation: &str) -> EvalResult {
    value.map(Value::Uint).ok_or_else(|| integer_overflow(operation))
}

/// Ordering between two values of the same comparable type.
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Uint(a), Value::Uint(b)) => Some(a.cmp(b)),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}
