//! Resolution engine: environments, unification, goals, clause storage
//! and the backtracking search.

pub mod arith;
pub mod env;
pub mod goal;
pub mod kb;
pub mod search;
pub mod unify;

pub use arith::evaluate;
pub use env::Env;
pub use goal::{Conjunction, Goal};
pub use kb::{Clause, KnowledgeBase, PredicateKey};
pub use search::{Context, Search};
pub use unify::unify;
