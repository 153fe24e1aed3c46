//! Clause storage
//!
//! Clauses are grouped by predicate, the (functor, arity) pair of their
//! head. Within a predicate, declaration order is trial order.

use std::collections::HashMap;
use std::fmt;

use super::goal::{Conjunction, Goal};
use crate::term::{Compound, Expr, Functor, List, Term, Var, VarAllocator, VarId};

/// Predicate identity: functor identity plus arity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateKey {
    pub functor: Functor,
    pub arity: usize,
}

impl PredicateKey {
    pub fn new(functor: Functor, arity: usize) -> Self {
        PredicateKey { functor, arity }
    }

    pub fn of(head: &Compound) -> Self {
        PredicateKey::new(head.functor().clone(), head.arity())
    }
}

impl fmt::Display for PredicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.functor, self.arity)
    }
}

/// A head and the body that must hold for it; facts have an empty body
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    head: Compound,
    body: Conjunction,
}

impl Clause {
    pub fn fact(head: Compound) -> Self {
        Clause { head, body: Conjunction::new() }
    }

    pub fn rule(head: Compound, body: impl Into<Conjunction>) -> Self {
        Clause { head, body: body.into() }
    }

    pub fn head(&self) -> &Compound {
        &self.head
    }

    pub fn body(&self) -> &Conjunction {
        &self.body
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty() && !self.body.is_inverted()
    }

    pub fn key(&self) -> PredicateKey {
        PredicateKey::of(&self.head)
    }

    /// Copy of head and body with every variable replaced by a fresh one,
    /// the same source variable always mapping to the same replacement.
    pub(crate) fn instantiate(&self, vars: &VarAllocator) -> (Compound, Conjunction) {
        let mut renamer = Renamer { vars, fresh: HashMap::new() };
        let head = renamer.compound(&self.head);
        let body = renamer.conjunction(&self.body);
        (head, body)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_fact() {
            write!(f, "{}", self.head)
        } else {
            write!(f, "{} <= {}", self.head, self.body)
        }
    }
}

struct Renamer<'a> {
    vars: &'a VarAllocator,
    fresh: HashMap<VarId, Var>,
}

impl Renamer<'_> {
    fn var(&mut self, var: &Var) -> Var {
        let vars = self.vars;
        self.fresh.entry(var.id()).or_insert_with(|| vars.fresh()).clone()
    }

    fn term(&mut self, term: &Term) -> Term {
        match term {
            Term::Const(_) => term.clone(),
            Term::Var(v) => Term::Var(self.var(v)),
            Term::Compound(c) => Term::Compound(self.compound(c)),
            Term::List(list) => self.list(list),
            Term::Expr(e) => Term::Expr(Expr::new(e.op(), self.term(e.lhs()), self.term(e.rhs()))),
        }
    }

    fn compound(&mut self, compound: &Compound) -> Compound {
        let args = compound.args().iter().map(|arg| self.term(arg)).collect();
        Compound::new(compound.functor().clone(), args)
    }

    fn list(&mut self, list: &List) -> Term {
        let items: Vec<Term> = list.items().iter().map(|item| self.term(item)).collect();
        let rest = self.term(list.rest());
        Term::partial_list(items, rest)
    }

    fn goal(&mut self, goal: &Goal) -> Goal {
        match goal {
            Goal::Call(c) => Goal::Call(self.compound(c)),
            Goal::Conj(conj) => Goal::Conj(self.conjunction(conj)),
            Goal::Test(e) => Goal::Test(Expr::new(e.op(), self.term(e.lhs()), self.term(e.rhs()))),
            Goal::Eq(a, b) => Goal::Eq(self.term(a), self.term(b)),
            Goal::Ne(a, b) => Goal::Ne(self.term(a), self.term(b)),
            Goal::Cut => Goal::Cut,
            Goal::Format { template, args } => Goal::Format {
                template: template.clone(),
                args: args.iter().map(|arg| self.term(arg)).collect(),
            },
        }
    }

    fn conjunction(&mut self, conj: &Conjunction) -> Conjunction {
        let goals = conj.goals().iter().map(|goal| self.goal(goal)).collect();
        Conjunction::from_parts(goals, conj.is_inverted())
    }
}

/// Clauses by predicate
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    predicates: HashMap<PredicateKey, Vec<Clause>>,
    clause_count: usize,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        KnowledgeBase::default()
    }

    /// Append `clause` after the existing clauses of its predicate
    pub fn add(&mut self, clause: Clause) {
        self.predicates.entry(clause.key()).or_default().push(clause);
        self.clause_count += 1;
    }

    /// Clauses for `functor/arity` in declaration order, `None` if the
    /// predicate was never declared
    pub fn clauses(&self, functor: &Functor, arity: usize) -> Option<&[Clause]> {
        self.predicates
            .get(&PredicateKey::new(functor.clone(), arity))
            .map(Vec::as_slice)
    }

    pub fn contains(&self, functor: &Functor, arity: usize) -> bool {
        self.clauses(functor, arity).is_some()
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn clause_count(&self) -> usize {
        self.clause_count
    }
}
