//! Backtracking search
//!
//! A [`Search`] resolves one conjunction against the knowledge base and
//! produces its solutions on demand. All of its state lives on the heap, so
//! proof depth is bounded by memory rather than by the native stack:
//!
//! - the continuation is a shared linked list of conjunction positions
//!   still to run, innermost first;
//! - the choice stack holds one entry per call with untried clauses, plus
//!   one fallback per open negation. Each entry remembers the environment
//!   and continuation it was created with.
//!
//! Failure resumes the newest choice point; an exhausted one is popped.
//!
//! Every conjunction runs in a scope that records the height of the choice
//! stack when it was entered. Cut truncates the stack back to that height,
//! discarding the alternatives of the goals to its left. In a clause body
//! it also commits the call: no further clauses are tried once the body is
//! exhausted. A cut inside a nested conjunction stays local to it.
//!
//! A negated conjunction leaves a fallback below its scope. Reaching the
//! end of the conjunction removes the fallback and fails; exhausting the
//! conjunction resumes the fallback, which succeeds once with the
//! environment the negation started with.

use std::rc::Rc;

use tracing::{trace, warn};

use super::arith::evaluate;
use super::env::Env;
use super::goal::{render, Conjunction, Goal};
use super::kb::{Clause, KnowledgeBase};
use super::unify::unify;
use crate::error::{LogicError, Result};
use crate::metrics::Metrics;
use crate::term::{Compound, Const, Term, VarAllocator};

/// Shared, read-only state every search of one query refers to
#[derive(Clone, Copy)]
pub struct Context<'s> {
    pub kb: &'s KnowledgeBase,
    pub vars: &'s VarAllocator,
    pub metrics: &'s Metrics,
}

impl<'s> Context<'s> {
    pub fn new(kb: &'s KnowledgeBase, vars: &'s VarAllocator, metrics: &'s Metrics) -> Self {
        Context { kb, vars, metrics }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    /// A solution was handed out; resume by backtracking
    Suspended,
    Done,
}

/// Lazy resolution of one conjunction
pub struct Search<'s> {
    ctx: Context<'s>,
    env: Env,
    cont: Option<Rc<Cont>>,
    choices: Vec<Choice<'s>>,
    state: State,
}

/// Remaining goals of one conjunction, then whatever follows it
struct Cont {
    conj: Rc<Conjunction>,
    index: usize,
    scope: Rc<Scope>,
    next: Option<Rc<Cont>>,
}

impl Drop for Cont {
    // Unlink iteratively; a deep proof leaves a long chain
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(cont) = next {
            next = match Rc::try_unwrap(cont) {
                Ok(mut cont) => cont.next.take(),
                Err(_) => None,
            };
        }
    }
}

struct Scope {
    /// Choice stack height when the conjunction was entered
    barrier: usize,
    /// Clause choice point committed by a cut, for clause bodies
    commit: Option<usize>,
    inverted: bool,
}

struct Choice<'s> {
    env: Env,
    cont: Option<Rc<Cont>>,
    kind: ChoiceKind<'s>,
}

enum ChoiceKind<'s> {
    /// Remaining clauses for a call
    Clauses {
        goal: Term,
        clauses: &'s [Clause],
        next: usize,
    },
    /// Success of a negation whose conjunction had no solution
    Fallback,
}

impl<'s> Search<'s> {
    pub fn new(ctx: Context<'s>, conj: Conjunction, env: Env) -> Self {
        let mut search = Search {
            ctx,
            env,
            cont: None,
            choices: Vec::new(),
            state: State::Fresh,
        };
        search.cont = search.enter(Rc::new(conj), None, None);
        search
    }

    /// Next solution environment, `Ok(None)` once exhausted.
    ///
    /// An error ends the search; later calls return `Ok(None)`.
    pub fn next_solution(&mut self) -> Result<Option<Env>> {
        let result = self.step();
        if result.is_err() {
            self.state = State::Done;
            self.cont = None;
            self.choices.clear();
        }
        result
    }

    fn step(&mut self) -> Result<Option<Env>> {
        match self.state {
            State::Done => return Ok(None),
            State::Fresh => {}
            State::Suspended => {
                if !self.resume()? {
                    self.state = State::Done;
                    return Ok(None);
                }
            }
        }
        self.run()
    }

    /// Continuation that runs `conj` and then `next`
    fn enter(&mut self, conj: Rc<Conjunction>, commit: Option<usize>, next: Option<Rc<Cont>>) -> Option<Rc<Cont>> {
        if conj.is_inverted() {
            self.choices.push(Choice {
                env: self.env.clone(),
                cont: next.clone(),
                kind: ChoiceKind::Fallback,
            });
        }
        let scope = Rc::new(Scope {
            barrier: self.choices.len(),
            commit,
            inverted: conj.is_inverted(),
        });
        Some(Rc::new(Cont { conj, index: 0, scope, next }))
    }

    fn run(&mut self) -> Result<Option<Env>> {
        loop {
            let Some(cont) = self.cont.take() else {
                self.state = State::Suspended;
                return Ok(Some(self.env.clone()));
            };

            let proceed = match cont.conj.goals().get(cont.index) {
                Some(goal) => {
                    let rest = Rc::new(Cont {
                        conj: Rc::clone(&cont.conj),
                        index: cont.index + 1,
                        scope: Rc::clone(&cont.scope),
                        next: cont.next.clone(),
                    });
                    self.solve(goal, &cont.scope, rest)?
                }
                None if cont.scope.inverted => {
                    // The negated conjunction holds: drop its fallback and fail
                    self.choices.truncate(cont.scope.barrier.saturating_sub(1));
                    false
                }
                None => {
                    self.cont = cont.next.clone();
                    true
                }
            };

            if !proceed && !self.resume()? {
                self.state = State::Done;
                return Ok(None);
            }
        }
    }

    /// Run one goal. `false` means the caller must backtrack.
    fn solve(&mut self, goal: &Goal, scope: &Scope, rest: Rc<Cont>) -> Result<bool> {
        let rest = Some(rest);
        match goal {
            Goal::Call(compound) => {
                let clauses = self.lookup(compound)?;
                self.choices.push(Choice {
                    env: self.env.clone(),
                    cont: rest,
                    kind: ChoiceKind::Clauses {
                        goal: Term::Compound(compound.clone()),
                        clauses,
                        next: 0,
                    },
                });
                // The first clause is tried by resuming the new choice point
                Ok(false)
            }
            Goal::Conj(conj) => {
                self.cont = self.enter(Rc::new(conj.clone()), None, rest);
                Ok(true)
            }
            Goal::Cut => {
                self.cut(scope);
                self.cont = rest;
                Ok(true)
            }
            Goal::Test(expr) => {
                let value = evaluate(expr, &mut self.env)?;
                let holds = !expr.op().is_comparison() || value == Term::Const(Const::Bool(true));
                if holds {
                    self.cont = rest;
                }
                Ok(holds)
            }
            Goal::Eq(lhs, rhs) => {
                let mut env = self.env.clone();
                let unified = unify(lhs, rhs, &mut env)?;
                if unified {
                    self.env = env;
                    self.cont = rest;
                }
                Ok(unified)
            }
            Goal::Ne(lhs, rhs) => {
                let unified = unify(lhs, rhs, &mut self.env.clone())?;
                if !unified {
                    self.cont = rest;
                }
                Ok(!unified)
            }
            Goal::Format { template, args } => {
                let args = args
                    .iter()
                    .map(|arg| match self.env.apply(arg) {
                        Term::Expr(e) => e.eval(),
                        other => Ok(other),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let text = render(template, &args)?;
                tracing::info!(target: "hornlog::format", "{}", text);
                self.cont = rest;
                Ok(true)
            }
        }
    }

    fn lookup(&self, goal: &Compound) -> Result<&'s [Clause]> {
        let kb: &'s KnowledgeBase = self.ctx.kb;
        self.ctx.metrics.record_call();
        let Some(clauses) = kb.clauses(goal.functor(), goal.arity()) else {
            warn!("undefined procedure {}/{} called as {}", goal.functor(), goal.arity(), goal);
            return Err(LogicError::UndefinedProcedure {
                name: goal.functor().name().to_string(),
                arity: goal.arity(),
            });
        };
        trace!("call {} ({} clauses)", goal, clauses.len());
        Ok(clauses)
    }

    fn cut(&mut self, scope: &Scope) {
        self.choices.truncate(scope.barrier);
        if let Some(at) = scope.commit {
            if let Some(Choice { kind: ChoiceKind::Clauses { goal, clauses, next }, .. }) = self.choices.get_mut(at) {
                trace!("cut commits {}", goal);
                *next = clauses.len();
            }
        }
    }

    /// Take the next alternative of the newest choice point, popping
    /// exhausted ones. `false` once the stack is empty.
    fn resume(&mut self) -> Result<bool> {
        loop {
            let depth = self.choices.len();
            let Some(choice) = self.choices.last_mut() else {
                return Ok(false);
            };

            if let ChoiceKind::Clauses { goal, clauses, next } = &mut choice.kind {
                let clauses: &'s [Clause] = *clauses;
                while let Some(clause) = clauses.get(*next) {
                    *next += 1;
                    self.ctx.metrics.record_activation();

                    let (head, body) = clause.instantiate(self.ctx.vars);
                    let mut env = choice.env.clone();
                    let unified = unify(goal, &Term::Compound(head), &mut env)?;
                    self.ctx.metrics.record_unification(unified);
                    if unified {
                        trace!("{} matches clause #{} of {}", goal, *next, clause.key());
                        let cont = choice.cont.clone();
                        self.env = env;
                        self.cont = self.enter(Rc::new(body), Some(depth - 1), cont);
                        return Ok(true);
                    }
                }
                self.choices.pop();
                self.ctx.metrics.record_backtrack();
                continue;
            }

            if let Some(fallback) = self.choices.pop() {
                self.env = fallback.env;
                self.cont = fallback.cont;
            }
            return Ok(true);
        }
    }
}

impl Iterator for Search<'_> {
    type Item = Result<Env>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_solution().transpose()
    }
}
