//! Goals and conjunctions
//!
//! Goals are built with plain constructors instead of operator overloading:
//!
//! ```
//! use hornlog::{Conjunction, Functor, Goal, VarAllocator};
//!
//! let vars = VarAllocator::default();
//! let (x, y) = (vars.named("X").unwrap(), vars.named("Y").unwrap());
//! let parent = Functor::new("parent");
//!
//! // parent(X, Y) & ~(X = Y) & !
//! let body = Conjunction::from(parent.apply([&x, &y]))
//!     .and(Goal::not(Goal::eq(&x, &y)))
//!     .and(Goal::Cut);
//! assert_eq!(body.to_string(), "parent(X,Y) & ~(X = Y) & !");
//! ```

use std::fmt;

use crate::error::{LogicError, Result};
use crate::term::{ArithOp, Compound, Const, Expr, Term, Var};

/// Placeholder substituted by `Goal::Format` arguments
pub const FORMAT_PLACEHOLDER: &str = "{}";

/// A single step of a clause body or query
#[derive(Debug, Clone, PartialEq)]
pub enum Goal {
    /// Resolve against the knowledge base
    Call(Compound),
    /// Nested (possibly negated) conjunction
    Conj(Conjunction),
    /// Evaluate an expression; comparisons succeed iff they hold
    Test(Expr),
    Eq(Term, Term),
    /// Succeeds iff the sides do not unify; never binds
    Ne(Term, Term),
    Cut,
    /// Render `template` with `args` and emit it as a log event
    Format { template: String, args: Vec<Term> },
}

impl Goal {
    /// `lhs = rhs`
    pub fn eq(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Goal {
        Goal::Eq(lhs.into(), rhs.into())
    }

    /// `lhs \= rhs`
    pub fn ne(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Goal {
        Goal::Ne(lhs.into(), rhs.into())
    }

    pub fn lt(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Goal {
        Goal::Test(Expr::new(ArithOp::Lt, lhs, rhs))
    }

    pub fn le(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Goal {
        Goal::Test(Expr::new(ArithOp::Le, lhs, rhs))
    }

    pub fn ge(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Goal {
        Goal::Test(Expr::new(ArithOp::Ge, lhs, rhs))
    }

    pub fn gt(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Goal {
        Goal::Test(Expr::new(ArithOp::Gt, lhs, rhs))
    }

    /// Negation as failure of `goal`
    pub fn not(goal: impl Into<Conjunction>) -> Goal {
        Goal::Conj(goal.into().not())
    }

    pub fn format<I, T>(template: &str, args: I) -> Goal
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        Goal::Format {
            template: template.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `self & other`
    pub fn and(self, other: impl Into<Goal>) -> Conjunction {
        Conjunction::from(self).and(other)
    }

    /// Variables in first-appearance order, without duplicates
    pub fn collect_vars(&self, out: &mut Vec<Var>) {
        match self {
            Goal::Call(c) => c.args().iter().for_each(|t| t.collect_vars(out)),
            Goal::Conj(conj) => conj.collect_vars(out),
            Goal::Test(e) => {
                e.lhs().collect_vars(out);
                e.rhs().collect_vars(out);
            }
            Goal::Eq(a, b) | Goal::Ne(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
            Goal::Cut => {}
            Goal::Format { args, .. } => args.iter().for_each(|t| t.collect_vars(out)),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Call(c) => c.fmt(f),
            Goal::Conj(conj) if conj.is_inverted() => conj.fmt(f),
            Goal::Conj(conj) => write!(f, "({})", conj),
            Goal::Test(e) => e.fmt(f),
            Goal::Eq(a, b) => write!(f, "{} = {}", a, b),
            Goal::Ne(a, b) => write!(f, "{} \\= {}", a, b),
            Goal::Cut => f.write_str("!"),
            Goal::Format { template, args } => {
                write!(f, "format({:?}", template)?;
                for arg in args {
                    write!(f, ",{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<Compound> for Goal {
    fn from(c: Compound) -> Self {
        Goal::Call(c)
    }
}

impl From<Conjunction> for Goal {
    fn from(conj: Conjunction) -> Self {
        Goal::Conj(conj)
    }
}

impl From<Expr> for Goal {
    fn from(e: Expr) -> Self {
        Goal::Test(e)
    }
}

/// Ordered goals, optionally negated as a whole
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conjunction {
    goals: Vec<Goal>,
    inverted: bool,
}

impl Conjunction {
    /// The empty conjunction, which succeeds once
    pub fn new() -> Self {
        Conjunction::default()
    }

    pub fn of<I, G>(goals: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Goal>,
    {
        goals.into_iter().fold(Conjunction::new(), |conj, goal| conj.and(goal))
    }

    /// Append `goal`. A plain conjunction is spliced in; a negated one (or
    /// `self` being negated) keeps its own scope.
    pub fn and(self, goal: impl Into<Goal>) -> Self {
        let mut conj = if self.inverted { Conjunction::wrap(self) } else { self };
        match goal.into() {
            Goal::Conj(inner) if !inner.inverted => conj.goals.extend(inner.goals),
            goal => conj.goals.push(goal),
        }
        conj
    }

    /// Negate the whole conjunction. Double negation nests rather than
    /// cancelling.
    pub fn not(self) -> Self {
        let mut conj = if self.inverted { Conjunction::wrap(self) } else { self };
        conj.inverted = true;
        conj
    }

    fn wrap(inner: Conjunction) -> Self {
        Conjunction { goals: vec![Goal::Conj(inner)], inverted: false }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn collect_vars(&self, out: &mut Vec<Var>) {
        self.goals.iter().for_each(|g| g.collect_vars(out));
    }

    pub(crate) fn from_parts(goals: Vec<Goal>, inverted: bool) -> Self {
        Conjunction { goals, inverted }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("~(")?;
        }
        for (i, goal) in self.goals.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{}", goal)?;
        }
        if self.inverted {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl From<Goal> for Conjunction {
    fn from(goal: Goal) -> Self {
        match goal {
            Goal::Conj(conj) => conj,
            goal => Conjunction { goals: vec![goal], inverted: false },
        }
    }
}

impl From<Compound> for Conjunction {
    fn from(c: Compound) -> Self {
        Conjunction::from(Goal::Call(c))
    }
}

impl From<Expr> for Conjunction {
    fn from(e: Expr) -> Self {
        Conjunction::from(Goal::Test(e))
    }
}

/// Substitute `args` for the `{}` placeholders of `template`.
///
/// Strings are inserted without quotes; everything else uses its term
/// notation. The number of placeholders must match the number of arguments.
pub fn render(template: &str, args: &[Term]) -> Result<String> {
    let pieces: Vec<&str> = template.split(FORMAT_PLACEHOLDER).collect();
    let placeholders = pieces.len() - 1;
    if placeholders != args.len() {
        return Err(LogicError::Format(format!(
            "{:?} has {} placeholders but {} arguments were given",
            template,
            placeholders,
            args.len()
        )));
    }

    let mut out = String::with_capacity(template.len());
    for (i, piece) in pieces.iter().enumerate() {
        out.push_str(piece);
        if let Some(arg) = args.get(i) {
            match arg {
                Term::Const(Const::Str(s)) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
    }
    Ok(out)
}
