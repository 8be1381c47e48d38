//! Reserved operator function names.
//!
//! Operators parse to global calls on these names; the evaluator, the
//! constant folder, and the unparser all dispatch on them.

pub const CONDITIONAL: &str = "_?_:_";
pub const LOGICAL_AND: &str = "_&&_";
pub const LOGICAL_OR: &str = "_||_";
pub const LOGICAL_NOT: &str = "!_";

pub const EQUALS: &str = "_==_";
pub const NOT_EQUALS: &str = "_!=_";
pub const LESS: &str = "_<_";
pub const LESS_EQUALS: &str = "_<=_";
pub const GREATER: &str = "_>_";
pub const GREATER_EQUALS: &str = "_>=_";
pub const IN: &str = "@in";

pub const ADD: &str = "_+_";
pub const SUBTRACT: &str = "_-_";
pub const MULTIPLY: &str = "_*_";
pub const DIVIDE: &str = "_/_";
pub const MODULO: &str = "_%_";
pub const NEGATE: &str = "-_";

pub const INDEX: &str = "_[_]";

/// Display form of a binary operator, if `function` is one.
pub fn binary_symbol(function: &str) -> Option<&'static str> {
    Some(match function {
        LOGICAL_AND => "&&",
        LOGICAL_OR => "||",
        EQUALS => "==",
        NOT_EQUALS => "!=",
        LESS => "<",
        LESS_EQUALS => "<=",
        GREATER => ">",
        GREATER_EQUALS => ">=",
        IN => "in",
        ADD => "+",
        SUBTRACT => "-",
        MULTIPLY => "*",
        DIVIDE => "/",
        MODULO => "%",
        _ => return None,
    })
}

/// Binding strength used by the unparser to decide parenthesization.
/// Higher binds tighter; 0 means "not an operator".
pub fn precedence(function: &str) -> u8 {
    match function {
        CONDITIONAL => 1,
        LOGICAL_OR => 2,
        LOGICAL_AND => 3,
        EQUALS | NOT_EQUALS | LESS | LESS_EQUALS | GREATER | GREATER_EQUALS | IN => 4,
        ADD | SUBTRACT => 5,
        MULTIPLY | DIVIDE | MODULO => 6,
        LOGICAL_NOT | NEGATE => 7,
        INDEX => 8,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_cover_comparisons() {
        assert_eq!(binary_symbol(LESS_EQUALS), Some("<="));
        assert_eq!(binary_symbol(CONDITIONAL), None);
    }

    #[test]
    fn precedence_orders_and_below_not() {
        assert!(precedence(LOGICAL_AND) < precedence(LOGICAL_NOT));
        assert!(precedence(CONDITIONAL) < precedence(LOGICAL_OR));
        assert_eq!(precedence("size"), 0);
    }
}
