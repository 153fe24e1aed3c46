//! Term model
//!
//! Everything the engine reasons about is a [`Term`]: constants, variables,
//! compound terms, lists (possibly open) and arithmetic expressions.
//!
//! Variables and functors are identity-bearing handles. Two variables named
//! `X` are different variables unless they share a [`VarId`], and two
//! functors called `parent` are different predicates unless they are the
//! same [`Functor`] value (clones share identity).

pub mod host;

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{LogicError, Result};

/// Prefix reserved for generated variables (`_G0`, `_G1`, ...)
pub const FRESH_PREFIX: &str = "_G";

// ============================================================================
// Variables
// ============================================================================

/// Opaque variable identity, used as the environment key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u64);

impl VarId {
    /// Raw allocator index
    pub fn index(&self) -> u64 {
        self.0
    }
}

/// A logic variable.
///
/// Named variables come from [`crate::Session::var`]; unnamed ones are
/// generated for anonymous positions and clause renaming.
#[derive(Clone)]
pub struct Var {
    id: VarId,
    name: Option<Arc<str>>,
}

impl Var {
    pub fn id(&self) -> VarId {
        self.id
    }

    /// Declared name, `None` for generated variables
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_generated(&self) -> bool {
        self.name.is_none()
    }

    /// Whether the variable shows up in query results.
    ///
    /// Generated variables and names starting with `_` are don't-care.
    pub fn is_reported(&self) -> bool {
        matches!(&self.name, Some(name) if !name.starts_with('_'))
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}{}", FRESH_PREFIX, self.id.0),
        }
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self, self.id.0)
    }
}

/// Monotonic variable allocator owned by a session.
///
/// Named and generated variables share one counter, so identities never
/// collide within a session.
#[derive(Debug)]
pub struct VarAllocator {
    next: Cell<u64>,
}

impl VarAllocator {
    pub fn starting_at(first: u64) -> Self {
        VarAllocator { next: Cell::new(first) }
    }

    fn allocate(&self) -> VarId {
        let id = self.next.get();
        self.next.set(id + 1);
        VarId(id)
    }

    /// Allocate a named variable
    pub fn named(&self, name: &str) -> Result<Var> {
        if name.starts_with(FRESH_PREFIX) {
            return Err(LogicError::IllegalVariableName(name.to_string()));
        }
        Ok(Var { id: self.allocate(), name: Some(Arc::from(name)) })
    }

    /// Allocate a generated (anonymous) variable
    pub fn fresh(&self) -> Var {
        Var { id: self.allocate(), name: None }
    }

    /// Identifier the next allocation will receive
    pub fn peek(&self) -> u64 {
        self.next.get()
    }
}

impl Default for VarAllocator {
    fn default() -> Self {
        VarAllocator::starting_at(0)
    }
}

// ============================================================================
// Functors
// ============================================================================

/// Predicate / structure name with identity semantics.
///
/// Equality and hashing use the allocation, not the printed name.
#[derive(Clone)]
pub struct Functor(Arc<str>);

impl Functor {
    pub fn new(name: &str) -> Self {
        Functor(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Build a compound term `name(args...)` with this functor
    pub fn apply<I, T>(&self, args: I) -> Compound
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        Compound::new(self.clone(), args.into_iter().map(Into::into).collect())
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const u8 as usize
    }
}

impl PartialEq for Functor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Functor {}

impl Hash for Functor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Functor({}@{:x})", self.0, self.addr())
    }
}

impl fmt::Display for Functor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Constants
// ============================================================================

/// Atomic, immutable value
#[derive(Debug, Clone)]
pub enum Const {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// Bare atom, printed without quotes
    Symbol(Arc<str>),
    /// Empty-list marker `[]`
    Nil,
}

impl PartialEq for Const {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Const::Null, Const::Null) | (Const::Nil, Const::Nil) => true,
            (Const::Bool(a), Const::Bool(b)) => a == b,
            (Const::Int(a), Const::Int(b)) => a == b,
            (Const::Float(a), Const::Float(b)) => a == b,
            (Const::Int(a), Const::Float(b)) | (Const::Float(b), Const::Int(a)) => (*a as f64) == *b,
            (Const::Str(a), Const::Str(b)) => a == b,
            (Const::Symbol(a), Const::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Null => f.write_str("none"),
            Const::Bool(b) => write!(f, "{}", b),
            Const::Int(i) => write!(f, "{}", i),
            Const::Float(x) => write!(f, "{:?}", x),
            Const::Str(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Const::Symbol(s) => f.write_str(s),
            Const::Nil => f.write_str("[]"),
        }
    }
}

// ============================================================================
// Compound terms
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    functor: Functor,
    args: Vec<Term>,
}

impl Compound {
    pub fn new(functor: Functor, args: Vec<Term>) -> Self {
        Compound { functor, args }
    }

    pub fn functor(&self) -> &Functor {
        &self.functor
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.functor)?;
        write_joined(f, &self.args)?;
        f.write_str(")")
    }
}

// ============================================================================
// Lists
// ============================================================================

/// Non-empty sequence of items followed by a `rest` term.
///
/// A closed list has `rest == []`; an open (partial) list has a variable
/// or other unresolved term as its rest. Empty lists are never represented
/// by this type: they are the [`Const::Nil`] constant.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    items: Vec<Term>,
    rest: Box<Term>,
}

impl List {
    /// Callers guarantee `items` is non-empty and `rest` is not a list
    pub(crate) fn from_parts(items: Vec<Term>, rest: Term) -> Self {
        debug_assert!(!items.is_empty());
        debug_assert!(!matches!(rest, Term::List(_)));
        List { items, rest: Box::new(rest) }
    }

    pub fn items(&self) -> &[Term] {
        &self.items
    }

    pub fn rest(&self) -> &Term {
        &self.rest
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.rest.is_nil()
    }

    pub(crate) fn into_parts(self) -> (Vec<Term>, Term) {
        (self.items, *self.rest)
    }

    /// Items of a closed list, `MalformedList` if the tail is unresolved
    pub fn to_vec(&self) -> Result<Vec<Term>> {
        if !self.is_closed() {
            return Err(LogicError::MalformedList {
                list: self.to_string(),
                rest: self.rest.to_string(),
            });
        }
        Ok(self.items.clone())
    }

    /// Append `other` (nil or a list) after this closed list
    pub fn concat(&self, other: &Term) -> Result<Term> {
        if !self.is_closed() {
            return Err(LogicError::MalformedList {
                list: self.to_string(),
                rest: self.rest.to_string(),
            });
        }
        match other {
            Term::Const(Const::Nil) => Ok(Term::List(self.clone())),
            Term::List(tail) => {
                let mut items = self.items.clone();
                items.extend(tail.items.iter().cloned());
                Ok(Term::List(List::from_parts(items, (*tail.rest).clone())))
            }
            _ => Err(LogicError::Arithmetic(format!(
                "{} and {} cannot be concatenated",
                self, other
            ))),
        }
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        write_joined(f, &self.items)?;
        f.write_str("]")?;
        if !self.is_closed() {
            write!(f, "+{}", self.rest)?;
        }
        Ok(())
    }
}

// ============================================================================
// Arithmetic expressions
// ============================================================================

/// Operators of the evaluation sublanguage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Le,
    Ge,
    Gt,
}

impl ArithOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => " mod ",
            ArithOp::Pow => "**",
            ArithOp::Lt => "<",
            ArithOp::Le => "=<",
            ArithOp::Ge => ">=",
            ArithOp::Gt => ">",
        }
    }

    /// Comparisons produce success/failure instead of a value
    pub fn is_comparison(&self) -> bool {
        matches!(self, ArithOp::Lt | ArithOp::Le | ArithOp::Ge | ArithOp::Gt)
    }
}

/// Eagerly evaluated binary expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    op: ArithOp,
    lhs: Box<Term>,
    rhs: Box<Term>,
}

impl Expr {
    pub fn new(op: ArithOp, lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Expr { op, lhs: Box::new(lhs.into()), rhs: Box::new(rhs.into()) }
    }

    pub fn add(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Expr::new(ArithOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Expr::new(ArithOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Expr::new(ArithOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Expr::new(ArithOp::Div, lhs, rhs)
    }

    pub fn rem(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Expr::new(ArithOp::Mod, lhs, rhs)
    }

    pub fn pow(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Expr::new(ArithOp::Pow, lhs, rhs)
    }

    pub fn op(&self) -> ArithOp {
        self.op
    }

    pub fn lhs(&self) -> &Term {
        &self.lhs
    }

    pub fn rhs(&self) -> &Term {
        &self.rhs
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}{}{})", self.lhs, self.op.symbol(), self.rhs)
    }
}

// ============================================================================
// Terms
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Const(Const),
    Var(Var),
    Compound(Compound),
    List(List),
    Expr(Expr),
}

impl Term {
    pub fn nil() -> Term {
        Term::Const(Const::Nil)
    }

    pub fn null() -> Term {
        Term::Const(Const::Null)
    }

    pub fn symbol(name: &str) -> Term {
        Term::Const(Const::Symbol(Arc::from(name)))
    }

    pub fn string(value: &str) -> Term {
        Term::Const(Const::Str(Arc::from(value)))
    }

    /// Closed list; an empty sequence gives `[]`
    pub fn list<I, T>(items: I) -> Term
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        Term::partial_list(items, Term::nil())
    }

    /// `[items...]+rest`. A list-valued `rest` is spliced; with no items
    /// the result is `rest` itself.
    pub fn partial_list<I, T>(items: I, rest: impl Into<Term>) -> Term
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        let mut items: Vec<Term> = items.into_iter().map(Into::into).collect();
        let rest = rest.into();
        if items.is_empty() {
            return rest;
        }
        match rest {
            Term::List(tail) => {
                let (tail_items, tail_rest) = tail.into_parts();
                items.extend(tail_items);
                Term::List(List::from_parts(items, tail_rest))
            }
            rest => Term::List(List::from_parts(items, rest)),
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Const(Const::Nil))
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Const> {
        match self {
            Term::Const(c) => Some(c),
            _ => None,
        }
    }

    /// No variables anywhere inside
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Const(_) => true,
            Term::Var(_) => false,
            Term::Compound(c) => c.args.iter().all(Term::is_ground),
            Term::List(l) => l.items.iter().all(Term::is_ground) && l.rest.is_ground(),
            Term::Expr(e) => e.lhs.is_ground() && e.rhs.is_ground(),
        }
    }

    /// Collect variables in first-appearance order, without duplicates
    pub fn collect_vars(&self, out: &mut Vec<Var>) {
        match self {
            Term::Const(_) => {}
            Term::Var(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Term::Compound(c) => c.args.iter().for_each(|t| t.collect_vars(out)),
            Term::List(l) => {
                l.items.iter().for_each(|t| t.collect_vars(out));
                l.rest.collect_vars(out);
            }
            Term::Expr(e) => {
                e.lhs.collect_vars(out);
                e.rhs.collect_vars(out);
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Const(c) => c.fmt(f),
            Term::Var(v) => v.fmt(f),
            Term::Compound(c) => c.fmt(f),
            Term::List(l) => l.fmt(f),
            Term::Expr(e) => e.fmt(f),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, terms: &[Term]) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", term)?;
    }
    Ok(())
}

// ============================================================================
// Conversions from host values
// ============================================================================

impl From<Const> for Term {
    fn from(c: Const) -> Self {
        Term::Const(c)
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl From<&Var> for Term {
    fn from(v: &Var) -> Self {
        Term::Var(v.clone())
    }
}

impl From<Compound> for Term {
    fn from(c: Compound) -> Self {
        Term::Compound(c)
    }
}

impl From<List> for Term {
    fn from(l: List) -> Self {
        Term::List(l)
    }
}

impl From<Expr> for Term {
    fn from(e: Expr) -> Self {
        Term::Expr(e)
    }
}

impl From<&Term> for Term {
    fn from(t: &Term) -> Self {
        t.clone()
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::Const(Const::Int(i))
    }
}

impl From<i32> for Term {
    fn from(i: i32) -> Self {
        Term::Const(Const::Int(i64::from(i)))
    }
}

impl From<f64> for Term {
    fn from(x: f64) -> Self {
        Term::Const(Const::Float(x))
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Const(Const::Bool(b))
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::string(s)
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Const(Const::Str(Arc::from(s)))
    }
}

impl<T: Into<Term>> From<Option<T>> for Term {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Term::null, Into::into)
    }
}

impl<T: Into<Term>> From<Vec<T>> for Term {
    fn from(items: Vec<T>) -> Self {
        Term::list(items)
    }
}
