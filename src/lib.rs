//! hornlog - an embedded logic-programming engine
//!
//! Facts and rules are declared as in-memory terms, and queries are
//! answered by SLD resolution with backtracking, cut and negation as
//! failure. Solutions are produced lazily, in clause-declaration order.
//!
//! ```
//! use hornlog::{Session, Term};
//!
//! let mut session = Session::new();
//! let parent = session.functor("parent");
//! session.fact(parent.apply([Term::symbol("tom"), Term::symbol("bob")]));
//! session.fact(parent.apply([Term::symbol("tom"), Term::symbol("liz")]));
//!
//! let x = session.var("X").unwrap();
//! let children: Vec<String> = session
//!     .query(parent.apply([Term::symbol("tom"), Term::from(&x)]))
//!     .map(|solution| solution.unwrap().to_string())
//!     .collect();
//! assert_eq!(children, ["{X = bob}", "{X = liz}"]);
//! ```

pub mod engine;
pub mod error;
pub mod metrics;
pub mod session;
pub mod term;

pub use engine::{Clause, Conjunction, Env, Goal, KnowledgeBase, PredicateKey};
pub use error::{LogicError, Result};
pub use metrics::{Metrics, StatsSnapshot};
pub use session::{Session, SessionConfig, Solution, Solutions};
pub use term::{ArithOp, Compound, Const, Expr, Functor, List, Term, Var, VarAllocator, VarId};
