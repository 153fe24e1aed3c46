//! Binding environments
//!
//! An [`Env`] maps variable identities to the terms they are bound to.
//! It is backed by persistent maps (`im`), so cloning is O(1) and a
//! snapshot handed to one branch of the search can never observe bindings
//! made in another.

use im::HashMap;

use crate::term::{Compound, Expr, List, Term, Var, VarId};

/// Variable bindings plus the rank table used to pick binding direction
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: HashMap<VarId, Term>,
    ranks: HashMap<VarId, u32>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Direct binding of `var`, without following chains
    pub fn lookup(&self, var: &Var) -> Option<&Term> {
        self.bindings.get(&var.id())
    }

    pub fn is_bound(&self, var: &Var) -> bool {
        self.bindings.contains_key(&var.id())
    }

    pub(crate) fn bind(&mut self, var: &Var, term: Term) {
        self.bindings.insert(var.id(), term);
    }

    pub fn rank(&self, var: &Var) -> u32 {
        self.ranks.get(&var.id()).copied().unwrap_or(0)
    }

    pub(crate) fn bump_rank(&mut self, var: &Var) {
        let rank = self.rank(var) + 1;
        self.ranks.insert(var.id(), rank);
    }

    /// Follow the binding chain of `term` to an unbound variable or a
    /// non-variable term.
    ///
    /// Intermediate entries of a chain longer than one hop are rewritten to
    /// point at the final term, which shortens later lookups in this
    /// environment only.
    pub fn resolve(&mut self, term: &Term) -> Term {
        let mut chain: Vec<VarId> = Vec::new();
        let mut current = term.clone();
        loop {
            let next = match &current {
                Term::Var(v) => match self.bindings.get(&v.id()) {
                    Some(bound) => {
                        chain.push(v.id());
                        bound.clone()
                    }
                    None => break,
                },
                _ => break,
            };
            current = next;
        }
        if chain.len() > 1 {
            for id in chain {
                self.bindings.insert(id, current.clone());
            }
        }
        current
    }

    /// Substitute bindings throughout `term`.
    ///
    /// Lists whose rest resolves to another list are spliced into one.
    /// A variable bound to a structure containing itself makes this
    /// diverge: there is no occurs-check.
    pub fn apply(&mut self, term: &Term) -> Term {
        match self.resolve(term) {
            Term::Compound(c) => Term::Compound(self.apply_compound(&c)),
            Term::List(list) => self.apply_list(&list),
            Term::Expr(e) => Term::Expr(Expr::new(e.op(), self.apply(e.lhs()), self.apply(e.rhs()))),
            other => other,
        }
    }

    pub fn apply_compound(&mut self, compound: &Compound) -> Compound {
        let args = compound.args().iter().map(|arg| self.apply(arg)).collect();
        Compound::new(compound.functor().clone(), args)
    }

    fn apply_list(&mut self, list: &List) -> Term {
        let items: Vec<Term> = list.items().iter().map(|item| self.apply(item)).collect();
        let rest = self.apply(list.rest());
        Term::partial_list(items, rest)
    }

    /// New environment holding `self`'s bindings overridden by `delta`'s.
    ///
    /// Neither input is modified.
    pub fn merge(&self, delta: &Env) -> Env {
        Env {
            bindings: delta.bindings.clone().union(self.bindings.clone()),
            ranks: self.ranks.clone().union_with(delta.ranks.clone(), u32::max),
        }
    }
}
