//! Property tests for unification and host-value conversion
//!
//! Terms are generated as shapes over a small pool of functors, symbols and
//! variables, then built against one shared allocator so that repeated
//! variables really are the same variable. When both sides are open they
//! are flat, so a variable is only ever bound to a constant or another
//! variable and no cyclic binding can arise.

use std::collections::HashMap;

use proptest::prelude::*;
use serde_json::Value;

use hornlog::engine::unify;
use hornlog::{Env, Functor, Term, Var, VarAllocator, VarId};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const SYMBOLS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Shape {
    Int(i64),
    Sym(usize),
    Var(usize),
    Comp(usize, Vec<Shape>),
    /// Items, plus an optional rest variable
    List(Vec<Shape>, Option<usize>),
}

fn arb_shape(with_vars: bool) -> impl Strategy<Value = Shape> {
    let leaf = if with_vars {
        prop_oneof![
            (-5i64..5).prop_map(Shape::Int),
            (0..SYMBOLS.len()).prop_map(Shape::Sym),
            (0..3usize).prop_map(Shape::Var),
        ]
        .boxed()
    } else {
        prop_oneof![(-5i64..5).prop_map(Shape::Int), (0..SYMBOLS.len()).prop_map(Shape::Sym)].boxed()
    };

    leaf.prop_recursive(3, 24, 3, move |inner| {
        let rest = if with_vars { prop::option::of(0..2usize).boxed() } else { Just(None).boxed() };
        prop_oneof![
            (0..2usize, prop::collection::vec(inner.clone(), 1..3)).prop_map(|(f, args)| Shape::Comp(f, args)),
            (prop::collection::vec(inner, 0..3), rest).prop_map(|(items, rest)| Shape::List(items, rest)),
        ]
    })
}

/// A compound or closed list whose elements are constants or variables
fn arb_flat_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (-2i64..2).prop_map(Shape::Int),
        (0..SYMBOLS.len()).prop_map(Shape::Sym),
        (0..3usize).prop_map(Shape::Var),
    ];
    prop_oneof![
        (0..2usize, prop::collection::vec(leaf.clone(), 1..4)).prop_map(|(f, args)| Shape::Comp(f, args)),
        prop::collection::vec(leaf, 1..4).prop_map(|items| Shape::List(items, None)),
    ]
}

fn arb_host_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| prop::collection::vec(inner, 0..4).prop_map(Value::Array))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct World {
    functors: Vec<Functor>,
    vars: Vec<Var>,
    rests: Vec<Var>,
}

impl World {
    fn new() -> Self {
        let alloc = VarAllocator::default();
        World {
            functors: vec![Functor::new("f"), Functor::new("g")],
            vars: ["X", "Y", "Z"].iter().map(|n| alloc.named(n).unwrap()).collect(),
            rests: ["R", "S"].iter().map(|n| alloc.named(n).unwrap()).collect(),
        }
    }

    /// Build `shape`, replacing variables by `subst` when given
    fn build(&self, shape: &Shape, subst: Option<(&[Term], &[Term])>) -> Term {
        match shape {
            Shape::Int(i) => Term::from(*i),
            Shape::Sym(s) => Term::symbol(SYMBOLS[*s]),
            Shape::Var(v) => match subst {
                Some((values, _)) => values[*v].clone(),
                None => Term::from(&self.vars[*v]),
            },
            Shape::Comp(f, args) => {
                Term::from(self.functors[*f].apply(args.iter().map(|a| self.build(a, subst))))
            }
            Shape::List(items, rest) => {
                let items: Vec<Term> = items.iter().map(|i| self.build(i, subst)).collect();
                let rest = match (rest, subst) {
                    (None, _) => Term::nil(),
                    (Some(r), Some((_, rests))) => rests[*r].clone(),
                    (Some(r), None) => Term::from(&self.rests[*r]),
                };
                Term::partial_list(items, rest)
            }
        }
    }

    fn ground(&self, shape: &Shape) -> Term {
        self.build(shape, None)
    }
}

/// Same structure, with a one-to-one mapping between the variables of
/// `a` and those of `b`
fn equal_up_to_renaming(a: &Term, b: &Term) -> bool {
    fn walk(a: &Term, b: &Term, there: &mut HashMap<VarId, VarId>, back: &mut HashMap<VarId, VarId>) -> bool {
        match (a, b) {
            (Term::Var(x), Term::Var(y)) => {
                let (x, y) = (x.id(), y.id());
                *there.entry(x).or_insert(y) == y && *back.entry(y).or_insert(x) == x
            }
            (Term::Compound(f), Term::Compound(g)) => {
                f.functor() == g.functor()
                    && f.arity() == g.arity()
                    && f.args().iter().zip(g.args()).all(|(a, b)| walk(a, b, there, back))
            }
            (Term::List(l), Term::List(m)) => {
                l.items().len() == m.items().len()
                    && l.items().iter().zip(m.items()).all(|(a, b)| walk(a, b, there, back))
                    && walk(l.rest(), m.rest(), there, back)
            }
            (Term::Var(_), _) | (_, Term::Var(_)) => false,
            _ => a == b,
        }
    }
    walk(a, b, &mut HashMap::new(), &mut HashMap::new())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn ground_term_unifies_with_itself(shape in arb_shape(false)) {
        let world = World::new();
        let term = world.ground(&shape);
        let mut env = Env::new();
        prop_assert!(unify(&term, &term, &mut env).unwrap());
        prop_assert!(env.is_empty());
    }

    #[test]
    fn pattern_matches_its_own_instance(
        pattern in arb_shape(true),
        values in prop::collection::vec(arb_shape(false), 3),
        rests in prop::collection::vec(prop::collection::vec(arb_shape(false), 0..3), 2),
    ) {
        let world = World::new();
        let values: Vec<Term> = values.iter().map(|v| world.ground(v)).collect();
        let rests: Vec<Term> = rests
            .iter()
            .map(|items| Term::list(items.iter().map(|i| world.ground(i)).collect::<Vec<_>>()))
            .collect();

        let open = world.build(&pattern, None);
        let instance = world.build(&pattern, Some((values.as_slice(), rests.as_slice())));

        let mut env = Env::new();
        prop_assert!(unify(&open, &instance, &mut env).unwrap());
        prop_assert_eq!(env.apply(&open), instance.clone());

        let mut env = Env::new();
        prop_assert!(unify(&instance, &open, &mut env).unwrap());
        prop_assert_eq!(env.apply(&open), instance);
    }

    #[test]
    fn unification_is_symmetric(left in arb_flat_shape(), right in arb_flat_shape()) {
        let world = World::new();
        let (lhs, rhs) = (world.build(&left, None), world.build(&right, None));

        let mut forward = Env::new();
        let mut backward = Env::new();
        let unified = unify(&lhs, &rhs, &mut forward).unwrap();
        prop_assert_eq!(unified, unify(&rhs, &lhs, &mut backward).unwrap());
        if unified {
            let common = forward.apply(&lhs);
            prop_assert_eq!(&common, &forward.apply(&rhs));
            let reversed = backward.apply(&lhs);
            prop_assert_eq!(&reversed, &backward.apply(&rhs));
            prop_assert!(
                equal_up_to_renaming(&common, &reversed),
                "{} and {} differ beyond variable names", common, reversed
            );
        }
    }

    #[test]
    fn open_and_ground_terms_unify_in_either_order(pattern in arb_shape(true), other in arb_shape(false)) {
        let world = World::new();
        let open = world.build(&pattern, None);
        let ground = world.ground(&other);

        let forward = unify(&open, &ground, &mut Env::new()).unwrap();
        let backward = unify(&ground, &open, &mut Env::new()).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn host_values_survive_the_term_model(value in arb_host_value()) {
        let term = Term::from_json(&value).unwrap();
        prop_assert!(term.is_ground());
        prop_assert_eq!(term.to_json().unwrap(), value);
    }
}
