//! Arithmetic and comparison evaluation
//!
//! Expressions are evaluated eagerly. Every operand must already be a
//! constant, a closed list or another expression; a variable left after
//! substitution is an `UnboundInArithmetic` error, never a failure.

use std::cmp::Ordering;
use std::sync::Arc;

use super::env::Env;
use crate::error::{LogicError, Result};
use crate::term::{ArithOp, Const, Expr, Term};

/// Substitute `env` into `expr` and evaluate it
pub fn evaluate(expr: &Expr, env: &mut Env) -> Result<Term> {
    match env.apply(&Term::Expr(expr.clone())) {
        Term::Expr(applied) => applied.eval(),
        // apply never changes the outer shape of an expression
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(term: &Term) -> Option<Num> {
        match term {
            Term::Const(Const::Int(i)) => Some(Num::Int(*i)),
            Term::Const(Const::Float(x)) => Some(Num::Float(*x)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(x) => x,
        }
    }
}

impl From<Num> for Term {
    fn from(n: Num) -> Term {
        match n {
            Num::Int(i) => Term::Const(Const::Int(i)),
            Num::Float(x) => Term::Const(Const::Float(x)),
        }
    }
}

impl Expr {
    /// Evaluate an expression whose operands are already substituted.
    ///
    /// Comparisons evaluate to a boolean constant.
    pub fn eval(&self) -> Result<Term> {
        let lhs = self.operand(self.lhs())?;
        let rhs = self.operand(self.rhs())?;

        if self.op().is_comparison() {
            let ordering = self.compare(&lhs, &rhs)?;
            let holds = match self.op() {
                ArithOp::Lt => ordering == Ordering::Less,
                ArithOp::Le => ordering != Ordering::Greater,
                ArithOp::Ge => ordering != Ordering::Less,
                ArithOp::Gt => ordering == Ordering::Greater,
                _ => unreachable!("comparison operators only"),
            };
            return Ok(Term::Const(Const::Bool(holds)));
        }

        if self.op() == ArithOp::Add {
            if let Some(joined) = self.concat(&lhs, &rhs)? {
                return Ok(joined);
            }
        }

        let (a, b) = match (Num::of(&lhs), Num::of(&rhs)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(self.mismatch(&lhs, &rhs)),
        };
        self.numeric(a, b).map(Term::from)
    }

    fn operand(&self, term: &Term) -> Result<Term> {
        match term {
            Term::Var(v) => Err(LogicError::UnboundInArithmetic {
                var: v.to_string(),
                expr: self.to_string(),
            }),
            Term::Expr(inner) => inner.eval(),
            Term::List(list) if !list.is_closed() => Err(LogicError::MalformedList {
                list: list.to_string(),
                rest: list.rest().to_string(),
            }),
            other => Ok(other.clone()),
        }
    }

    /// String and list concatenation for `+`
    fn concat(&self, lhs: &Term, rhs: &Term) -> Result<Option<Term>> {
        match (lhs, rhs) {
            (Term::Const(Const::Str(a)), Term::Const(Const::Str(b))) => {
                let joined = format!("{}{}", a, b);
                Ok(Some(Term::Const(Const::Str(Arc::from(joined.as_str())))))
            }
            (Term::Const(Const::Nil), Term::Const(Const::Nil) | Term::List(_)) => Ok(Some(rhs.clone())),
            (Term::List(list), Term::Const(Const::Nil) | Term::List(_)) => list.concat(rhs).map(Some),
            _ => Ok(None),
        }
    }

    fn numeric(&self, a: Num, b: Num) -> Result<Num> {
        let overflow = || LogicError::Arithmetic(format!("integer overflow in {}", self));
        let zero = || LogicError::Arithmetic(format!("division by zero in {}", self));

        match (self.op(), a, b) {
            (ArithOp::Add, Num::Int(x), Num::Int(y)) => x.checked_add(y).map(Num::Int).ok_or_else(overflow),
            (ArithOp::Sub, Num::Int(x), Num::Int(y)) => x.checked_sub(y).map(Num::Int).ok_or_else(overflow),
            (ArithOp::Mul, Num::Int(x), Num::Int(y)) => x.checked_mul(y).map(Num::Int).ok_or_else(overflow),
            (ArithOp::Add, ..) => Ok(Num::Float(a.as_f64() + b.as_f64())),
            (ArithOp::Sub, ..) => Ok(Num::Float(a.as_f64() - b.as_f64())),
            (ArithOp::Mul, ..) => Ok(Num::Float(a.as_f64() * b.as_f64())),
            (ArithOp::Div, ..) => {
                if b.as_f64() == 0.0 {
                    return Err(zero());
                }
                Ok(Num::Float(a.as_f64() / b.as_f64()))
            }
            (ArithOp::Mod, Num::Int(x), Num::Int(y)) => {
                if y == 0 {
                    return Err(zero());
                }
                // Result takes the sign of the divisor
                let r = x.checked_rem(y).ok_or_else(overflow)?;
                Ok(Num::Int(if r != 0 && (r < 0) != (y < 0) { r + y } else { r }))
            }
            (ArithOp::Mod, ..) => {
                let (x, y) = (a.as_f64(), b.as_f64());
                if y == 0.0 {
                    return Err(zero());
                }
                Ok(Num::Float(x - y * (x / y).floor()))
            }
            (ArithOp::Pow, Num::Int(x), Num::Int(y)) if y >= 0 => {
                let exp = u32::try_from(y).map_err(|_| overflow())?;
                x.checked_pow(exp).map(Num::Int).ok_or_else(overflow)
            }
            (ArithOp::Pow, ..) => {
                if a.as_f64() == 0.0 && b.as_f64() < 0.0 {
                    return Err(zero());
                }
                Ok(Num::Float(a.as_f64().powf(b.as_f64())))
            }
            _ => unreachable!("arithmetic operators only"),
        }
    }

    fn compare(&self, lhs: &Term, rhs: &Term) -> Result<Ordering> {
        if let (Some(a), Some(b)) = (Num::of(lhs), Num::of(rhs)) {
            return match (a, b) {
                (Num::Int(x), Num::Int(y)) => Ok(x.cmp(&y)),
                _ => a
                    .as_f64()
                    .partial_cmp(&b.as_f64())
                    .ok_or_else(|| LogicError::Arithmetic(format!("NaN in comparison {}", self))),
            };
        }
        match (lhs, rhs) {
            (Term::Const(Const::Str(a)), Term::Const(Const::Str(b))) => Ok(a.cmp(b)),
            _ => Err(self.mismatch(lhs, rhs)),
        }
    }

    fn mismatch(&self, lhs: &Term, rhs: &Term) -> LogicError {
        LogicError::Arithmetic(format!(
            "unsupported operands for '{}': {} and {}",
            self.op().symbol().trim(),
            lhs,
            rhs
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::VarAllocator;

    fn eval(expr: Expr) -> Result<Term> {
        expr.eval()
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(eval(Expr::add(2, 3)).unwrap(), Term::from(5));
        assert_eq!(eval(Expr::sub(2, 3)).unwrap(), Term::from(-1));
        assert_eq!(eval(Expr::mul(4, 3)).unwrap(), Term::from(12));
        assert_eq!(eval(Expr::pow(2, 10)).unwrap(), Term::from(1024));
    }

    #[test]
    fn test_division_is_float() {
        assert_eq!(eval(Expr::div(7, 2)).unwrap(), Term::from(3.5));
        assert_eq!(eval(Expr::div(6, 3)).unwrap(), Term::from(2.0));
    }

    #[test]
    fn test_modulo_follows_divisor_sign() {
        assert_eq!(eval(Expr::rem(7, 3)).unwrap(), Term::from(1));
        assert_eq!(eval(Expr::rem(-7, 3)).unwrap(), Term::from(2));
        assert_eq!(eval(Expr::rem(7, -3)).unwrap(), Term::from(-2));
    }

    #[test]
    fn test_mixed_numbers_promote_to_float() {
        assert_eq!(eval(Expr::add(1, 0.5)).unwrap(), Term::from(1.5));
        assert_eq!(eval(Expr::pow(2, -1)).unwrap(), Term::from(0.5));
    }

    #[test]
    fn test_nested_expressions() {
        let expr = Expr::mul(Expr::add(1, 2), Expr::sub(10, 4));
        assert_eq!(eval(expr).unwrap(), Term::from(18));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval(Expr::new(ArithOp::Lt, 1, 2)).unwrap(), Term::from(true));
        assert_eq!(eval(Expr::new(ArithOp::Le, 2, 2)).unwrap(), Term::from(true));
        assert_eq!(eval(Expr::new(ArithOp::Gt, 1, 2.5)).unwrap(), Term::from(false));
        assert_eq!(eval(Expr::new(ArithOp::Ge, "b", "a")).unwrap(), Term::from(true));
    }

    #[test]
    fn test_string_and_list_concatenation() {
        assert_eq!(eval(Expr::add("ab", "cd")).unwrap(), Term::from("abcd"));
        assert_eq!(
            eval(Expr::add(Term::list([1]), Term::list([2, 3]))).unwrap(),
            Term::list([1, 2, 3])
        );
        assert_eq!(eval(Expr::add(Term::nil(), Term::list([1]))).unwrap(), Term::list([1]));
    }

    #[test]
    fn test_unbound_variable_is_error() {
        let vars = VarAllocator::default();
        let x = vars.named("X").unwrap();
        let err = eval(Expr::add(&x, 1)).unwrap_err();
        assert_eq!(
            err,
            LogicError::UnboundInArithmetic { var: "X".into(), expr: "(X+1)".into() }
        );
    }

    #[test]
    fn test_evaluate_substitutes_bindings() {
        let vars = VarAllocator::default();
        let x = vars.named("X").unwrap();
        let mut env = Env::new();
        env.bind(&x, Term::from(4));
        assert_eq!(evaluate(&Expr::mul(&x, &x), &mut env).unwrap(), Term::from(16));
    }

    #[test]
    fn test_open_list_operand_is_malformed() {
        let vars = VarAllocator::default();
        let t = vars.named("T").unwrap();
        let err = eval(Expr::add(Term::partial_list([1], &t), Term::list([2]))).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_LIST");
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval(Expr::div(1, 0)).unwrap_err().code(), "ARITHMETIC");
        assert_eq!(eval(Expr::rem(1, 0)).unwrap_err().code(), "ARITHMETIC");
        assert_eq!(eval(Expr::add(i64::MAX, 1)).unwrap_err().code(), "ARITHMETIC");
        assert_eq!(eval(Expr::sub("a", 1)).unwrap_err().code(), "ARITHMETIC");
        assert_eq!(eval(Expr::new(ArithOp::Lt, "a", 1)).unwrap_err().code(), "ARITHMETIC");
    }
}
