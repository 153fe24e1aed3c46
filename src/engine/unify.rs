//! Structural unification
//!
//! `unify` extends an environment with the bindings that make two terms
//! equal. On `Ok(false)` the environment may hold partial bindings and must
//! be discarded by the caller.
//!
//! There is no occurs-check: `X = f(X)` succeeds and leaves a cyclic
//! binding, as in classical Prolog.

use super::arith::evaluate;
use super::env::Env;
use crate::error::Result;
use crate::term::{List, Term, Var};

/// Unify `left` with `right` under `env`.
///
/// Errors only come from evaluating arithmetic expressions.
pub fn unify(left: &Term, right: &Term, env: &mut Env) -> Result<bool> {
    let left = env.resolve(left);
    let right = env.resolve(right);

    match (&left, &right) {
        (Term::Expr(e), other) | (other, Term::Expr(e)) => {
            let value = evaluate(e, env)?;
            unify(&value, other, env)
        }
        (Term::Var(x), Term::Var(y)) => {
            if x != y {
                bind_vars(x, y, env);
            }
            Ok(true)
        }
        (Term::Var(x), _) => {
            env.bind(x, right.clone());
            Ok(true)
        }
        (_, Term::Var(y)) => {
            env.bind(y, left.clone());
            Ok(true)
        }
        (Term::Const(a), Term::Const(b)) => Ok(a == b),
        (Term::Compound(a), Term::Compound(b)) => {
            if a.functor() != b.functor() || a.arity() != b.arity() {
                return Ok(false);
            }
            for (x, y) in a.args().iter().zip(b.args()) {
                if !unify(x, y, env)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Term::List(a), Term::List(b)) => unify_lists(a, b, env),
        _ => Ok(false),
    }
}

/// Lower rank binds to higher; on a tie the left side binds and the
/// right side's rank grows.
fn bind_vars(x: &Var, y: &Var, env: &mut Env) {
    let (rx, ry) = (env.rank(x), env.rank(y));
    if rx < ry {
        env.bind(x, Term::Var(y.clone()));
    } else if rx > ry {
        env.bind(y, Term::Var(x.clone()));
    } else {
        env.bind(x, Term::Var(y.clone()));
        env.bump_rank(y);
    }
}

fn unify_lists(a: &List, b: &List, env: &mut Env) -> Result<bool> {
    let common = a.len().min(b.len());
    for (x, y) in a.items().iter().zip(b.items()) {
        if !unify(x, y, env)? {
            return Ok(false);
        }
    }

    if a.len() > common {
        return unify_remainder(a, common, b.rest(), env);
    }
    if b.len() > common {
        return unify_remainder(b, common, a.rest(), env);
    }
    unify(a.rest(), b.rest(), env)
}

/// Match the leftover items of `longer` (from `start`) against the other
/// list's `rest`. A closed shorter list cannot absorb them.
fn unify_remainder(longer: &List, start: usize, rest: &Term, env: &mut Env) -> Result<bool> {
    if rest.is_nil() {
        return Ok(false);
    }
    let remainder = Term::partial_list(longer.items()[start..].iter().cloned(), longer.rest().clone());
    unify(rest, &remainder, env)
}
