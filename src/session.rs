//! Session - knowledge base, variable allocator and query entry point
//!
//! A [`Session`] owns everything one logic program needs: the clauses
//! declared so far, the counter that hands out variable identities and the
//! work counters. Queries borrow the session immutably, so clauses cannot be
//! added while a [`Solutions`] iterator is alive.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::{Clause, Conjunction, Context, Env, KnowledgeBase, Search};
use crate::error::{LogicError, Result};
use crate::metrics::{Metrics, StatsSnapshot};
use crate::term::{Compound, Functor, Term, Var, VarAllocator, VarId};

/// Session settings
///
/// Every field has a default, so a partial JSON document is accepted:
///
/// ```
/// use hornlog::SessionConfig;
///
/// let config = SessionConfig::from_json(r#"{"first_var_id": 100}"#).unwrap();
/// assert_eq!(config.first_var_id, 100);
/// assert!(config.collect_stats);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Identifier given to the first variable the session allocates
    pub first_var_id: u64,
    /// Count resolution work (see [`Session::stats`])
    pub collect_stats: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            first_var_id: 0,
            collect_stats: true,
        }
    }
}

impl SessionConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// A logic program and its query interface
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    kb: KnowledgeBase,
    vars: VarAllocator,
    metrics: Metrics,
}

impl Session {
    pub fn new() -> Self {
        Session::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Session {
            kb: KnowledgeBase::new(),
            vars: VarAllocator::starting_at(config.first_var_id),
            metrics: Metrics::with_enabled(config.collect_stats),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// A new functor. Functors are compared by identity, so keep the
    /// returned value and reuse it for every clause and query of the
    /// predicate.
    pub fn functor(&self, name: &str) -> Functor {
        Functor::new(name)
    }

    /// A named variable, reported in query results unless the name
    /// starts with `_`
    pub fn var(&self, name: &str) -> Result<Var> {
        self.vars.named(name)
    }

    /// A fresh anonymous (don't care) variable.
    ///
    /// Every call returns a distinct variable. Call it once per don't-care
    /// position: a handle used twice in one clause or query is one variable,
    /// so both positions must then take the same value.
    pub fn anon(&self) -> Var {
        self.vars.fresh()
    }

    /// Declare an unconditional clause
    pub fn fact(&mut self, head: Compound) {
        self.add_clause(Clause::fact(head));
    }

    /// Declare `head <= body`
    pub fn rule(&mut self, head: Compound, body: impl Into<Conjunction>) {
        self.add_clause(Clause::rule(head, body));
    }

    pub fn add_clause(&mut self, clause: Clause) {
        debug!("declare {}", clause);
        self.kb.add(clause);
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Run a query lazily.
    ///
    /// Solutions come in clause-declaration order, goals left to right.
    /// Dropping the iterator early is always safe.
    pub fn query(&self, goal: impl Into<Conjunction>) -> Solutions<'_> {
        let conj = goal.into();
        let mut vars = Vec::new();
        conj.collect_vars(&mut vars);
        vars.retain(Var::is_reported);

        debug!("query {}", conj);
        self.metrics.record_query();

        let ctx = Context::new(&self.kb, &self.vars, &self.metrics);
        Solutions {
            search: Search::new(ctx, conj, Env::new()),
            vars,
            metrics: &self.metrics,
            produced: 0,
        }
    }

    /// Run a query to exhaustion
    pub fn query_all(&self, goal: impl Into<Conjunction>) -> Result<Vec<Solution>> {
        self.query(goal).collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_stats(&self) {
        self.metrics.reset();
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// Lazy sequence of query solutions
pub struct Solutions<'s> {
    search: Search<'s>,
    vars: Vec<Var>,
    metrics: &'s Metrics,
    produced: usize,
}

impl Iterator for Solutions<'_> {
    type Item = Result<Solution>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.search.next_solution() {
            Ok(Some(env)) => {
                self.produced += 1;
                self.metrics.record_solution();
                Some(Ok(Solution::from_env(&self.vars, env)))
            }
            Ok(None) => {
                debug!("query exhausted after {} solutions", self.produced);
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Bindings of the query's reported variables for one solution.
///
/// Variables that end up aliased to each other are folded: the last of
/// them (in order of appearance) stays unbound and is left out, the others
/// map to it. A variable that is still free and aliased to nothing is left
/// out as well.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    bindings: Vec<(Var, Term)>,
}

impl Solution {
    fn from_env(vars: &[Var], mut env: Env) -> Self {
        let mut values: Vec<(Var, Term)> = vars
            .iter()
            .map(|var| (var.clone(), env.apply(&Term::from(var))))
            .collect();

        // Classes of query variables sharing the same free variable
        let mut classes: Vec<(VarId, Vec<usize>)> = Vec::new();
        for (i, (_, value)) in values.iter().enumerate() {
            if let Term::Var(free) = value {
                match classes.iter_mut().find(|(id, _)| *id == free.id()) {
                    Some((_, members)) => members.push(i),
                    None => classes.push((free.id(), vec![i])),
                }
            }
        }

        let mut dropped = vec![false; values.len()];
        for (_, members) in &classes {
            for pair in members.windows(2) {
                values[pair[0]].1 = Term::Var(values[pair[1]].0.clone());
            }
            if let Some(&last) = members.last() {
                dropped[last] = true;
            }
        }

        let bindings = values
            .into_iter()
            .zip(dropped)
            .filter(|(_, dropped)| !dropped)
            .map(|(binding, _)| binding)
            .collect();
        Solution { bindings }
    }

    pub fn get(&self, var: &Var) -> Option<&Term> {
        self.bindings.iter().find(|(v, _)| v == var).map(|(_, t)| t)
    }

    /// Lookup by display name; the first variable with that name wins
    pub fn get_by_name(&self, name: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|(v, _)| v.name() == Some(name))
            .map(|(_, t)| t)
    }

    pub fn contains(&self, var: &Var) -> bool {
        self.get(var).is_some()
    }

    /// Host value of `var`, `Ok(None)` if it is not part of the solution
    pub fn value(&self, var: &Var) -> Result<Option<Value>> {
        self.get(var).map(Term::to_json).transpose()
    }

    /// All bindings as a JSON object keyed by variable name.
    ///
    /// Fails with `DuplicateName` when two reported variables share a name.
    pub fn to_json(&self) -> Result<Value> {
        let mut object = Map::new();
        for (var, term) in &self.bindings {
            let name = var.to_string();
            if object.contains_key(&name) {
                return Err(LogicError::DuplicateName(name));
            }
            object.insert(name, term.to_json()?);
        }
        Ok(Value::Object(object))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Var, &Term)> {
        self.bindings.iter().map(|(v, t)| (v, t))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (var, term)) in self.bindings.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = {}", var, term)?;
        }
        f.write_str("}")
    }
}
