//! Benchmark suite for hornlog resolution
//!
//! Covers:
//! - Unification: long closed lists, open list tails
//! - Resolution: member/2 enumeration, naive reverse, counting recursion
//! - Cut: committed choice over a large fact table
//!
//! Run: cargo bench --bench resolution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hornlog::engine::unify;
use hornlog::{Conjunction, Env, Expr, Functor, Goal, Session, Term, VarAllocator};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn int_list(len: usize) -> Term {
    Term::list((0..len as i64).collect::<Vec<_>>())
}

/// member(X, [X]+_).
/// member(X, [_]+T) <= member(X, T).
fn declare_member(session: &mut Session) -> Functor {
    let member = session.functor("member");
    let (x, t) = (session.var("X").unwrap(), session.var("T").unwrap());
    let (rest, skip) = (session.anon(), session.anon());
    session.fact(member.apply([Term::from(&x), Term::partial_list([&x], &rest)]));
    session.rule(
        member.apply([Term::from(&x), Term::partial_list([&skip], &t)]),
        member.apply([&x, &t]),
    );
    member
}

/// append([], L, L).
/// append([H]+T, L, [H]+R) <= append(T, L, R).
/// reverse([], []).
/// reverse([H]+T, R) <= reverse(T, RT) & append(RT, [H], R).
fn declare_reverse(session: &mut Session) -> Functor {
    let append = session.functor("append");
    let reverse = session.functor("reverse");
    let [h, t, l, r, rt] = ["H", "T", "L", "R", "RT"].map(|n| session.var(n).unwrap());

    session.fact(append.apply([Term::nil(), Term::from(&l), Term::from(&l)]));
    session.rule(
        append.apply([Term::partial_list([&h], &t), Term::from(&l), Term::partial_list([&h], &r)]),
        append.apply([&t, &l, &r]),
    );
    session.fact(reverse.apply([Term::nil(), Term::nil()]));
    session.rule(
        reverse.apply([Term::partial_list([&h], &t), Term::from(&r)]),
        Goal::from(reverse.apply([&t, &rt])).and(append.apply([Term::from(&rt), Term::list([&h]), Term::from(&r)])),
    );
    reverse
}

/// count(N, N) <= !.
/// count(I, N) <= J = I + 1 & count(J, N).
fn declare_count(session: &mut Session) -> Functor {
    let count = session.functor("count");
    let [i, j, n] = ["I", "J", "N"].map(|name| session.var(name).unwrap());
    session.rule(count.apply([&n, &n]), Goal::Cut);
    session.rule(
        count.apply([&i, &n]),
        Conjunction::of([Goal::eq(&j, Expr::add(&i, 1)), Goal::from(count.apply([&j, &n]))]),
    );
    count
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_unify_lists(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify_lists");

    for size in [10, 100, 1000] {
        let left = int_list(size);
        let right = int_list(size);
        group.bench_with_input(BenchmarkId::new("closed", size), &size, |b, _| {
            b.iter(|| unify(black_box(&left), black_box(&right), &mut Env::new()).unwrap())
        });

        let vars = VarAllocator::default();
        let tail = vars.fresh();
        let open = Term::partial_list((0..size as i64 / 2).collect::<Vec<_>>(), &tail);
        group.bench_with_input(BenchmarkId::new("open_tail", size), &size, |b, _| {
            b.iter(|| unify(black_box(&open), black_box(&right), &mut Env::new()).unwrap())
        });
    }

    group.finish();
}

fn bench_member(c: &mut Criterion) {
    let mut group = c.benchmark_group("member_enumerate");

    for size in [10, 100, 500] {
        let mut session = Session::new();
        let member = declare_member(&mut session);
        let x = session.var("Item").unwrap();
        let goal = member.apply([Term::from(&x), int_list(size)]);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let count = session.query(goal.clone()).count();
                assert_eq!(count, size);
            })
        });
    }

    group.finish();
}

fn bench_naive_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("naive_reverse");

    for size in [10, 30, 60] {
        let mut session = Session::new();
        let reverse = declare_reverse(&mut session);
        let out = session.var("Out").unwrap();
        let goal = reverse.apply([int_list(size), Term::from(&out)]);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| session.query_all(black_box(goal.clone())).unwrap())
        });
    }

    group.finish();
}

fn bench_count_with_cut(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_with_cut");

    for limit in [10, 100, 300] {
        let mut session = Session::new();
        let count = declare_count(&mut session);
        let goal = count.apply([0, limit]);

        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, _| {
            b.iter(|| {
                let solutions = session.query_all(black_box(goal.clone())).unwrap();
                assert_eq!(solutions.len(), 1);
            })
        });
    }

    group.finish();
}

fn bench_fact_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("fact_lookup");

    for size in [100, 1000, 5000] {
        let mut session = Session::new();
        let edge = session.functor("edge");
        for i in 0..size as i64 {
            session.fact(edge.apply([i, i + 1]));
        }
        let next = session.var("Next").unwrap();
        let goal = Goal::from(edge.apply([Term::from(size as i64 / 2), Term::from(&next)])).and(Goal::Cut);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| session.query_all(black_box(goal.clone())).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_unify_lists,
    bench_member,
    bench_naive_reverse,
    bench_count_with_cut,
    bench_fact_lookup,
);
criterion_main!(benches);
