//! river-crossing - farmer, fox, goose and beans
//!
//! The farmer must bring the fox, the goose and the beans across the
//! river. The boat holds the farmer and at most one passenger. Left alone,
//! the fox eats the goose and the goose eats the beans.
//!
//! A state is the bank (`l` or `r`) of farmer, fox, goose and beans, in
//! that order. Every plan that never repeats a state is printed.

use anyhow::{bail, Result};
use clap::Parser;
use hornlog::{Conjunction, Functor, Goal, Session, SessionConfig, Term};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const PASSENGERS: [&str; 3] = ["fox", "goose", "beans"];

#[derive(Parser)]
#[command(name = "river-crossing", about = "Solve the river-crossing puzzle with hornlog", version)]
struct Cli {
    /// Starting banks of farmer, fox, goose and beans
    #[arg(long, default_value = "llll")]
    start: String,

    /// Banks everyone must end up on
    #[arg(long, default_value = "rrrr")]
    target: String,

    /// Stop after this many plans
    #[arg(long)]
    limit: Option<usize>,

    /// Log plans as they are found
    #[arg(short, long)]
    verbose: bool,

    /// Print resolution statistics as JSON
    #[arg(long)]
    stats: bool,
}

fn bank_state(banks: &str) -> Result<Term> {
    if banks.len() != 4 || !banks.chars().all(|c| c == 'l' || c == 'r') {
        bail!("a state is four of 'l'/'r' (farmer, fox, goose, beans), got {:?}", banks);
    }
    Ok(Term::list(banks.chars().map(|c| Term::from(c.to_string()))))
}

/// Declare the puzzle and return the `river/1` predicate
fn declare(session: &mut Session, start: Term, target: Term) -> Result<Functor> {
    let initial = session.functor("initial");
    let goal_state = session.functor("final");
    let crossing = session.functor("crossing");
    let member = session.functor("member");
    let not_allowed = session.functor("not_allowed");
    let river_aux = session.functor("river_aux");
    let river = session.functor("river");

    let (x, y, z, t) = (session.var("X")?, session.var("Y")?, session.var("Z")?, session.var("T")?);
    let (a, b, c, v) = (session.var("A")?, session.var("B")?, session.var("C")?, session.var("V")?);
    let (p, plan, action) = (session.var("P")?, session.var("Plan")?, session.var("Action")?);
    let (from, to) = (session.var("Start")?, session.var("End")?);

    session.fact(initial.apply([start]));
    session.fact(goal_state.apply([target]));

    // member(X, [X]+_).
    // member(X, [_]+T) <= member(X, T).
    let rest = session.anon();
    let skip = session.anon();
    session.fact(member.apply([Term::from(&x), Term::partial_list([&x], &rest)]));
    session.rule(
        member.apply([Term::from(&x), Term::partial_list([&skip], &t)]),
        member.apply([&x, &t]),
    );

    // The farmer rows alone or with one passenger on the same bank
    for (here, there, label) in [("l", "r", "cross"), ("r", "l", "back")] {
        let banks = |farmer: &str| vec![Term::from(farmer), Term::from(&x), Term::from(&y), Term::from(&z)];
        session.fact(crossing.apply([
            Term::list(banks(here)),
            Term::list(banks(there)),
            Term::symbol(&format!("farmer_{}", label)),
        ]));
        for (i, passenger) in PASSENGERS.iter().enumerate() {
            let (mut before, mut after) = (banks(here), banks(there));
            before[i + 1] = Term::from(here);
            after[i + 1] = Term::from(there);
            session.fact(crossing.apply([
                Term::list(before),
                Term::list(after),
                Term::symbol(&format!("{}_{}", passenger, label)),
            ]));
        }
    }

    // not_allowed([X, Y, Y, _]) <= X \= Y.
    // not_allowed([X, _, Y, Y]) <= X \= Y.
    let any = session.anon();
    session.rule(not_allowed.apply([Term::list([&x, &y, &y, &any])]), Goal::ne(&x, &y));
    session.rule(not_allowed.apply([Term::list([&x, &any, &y, &y])]), Goal::ne(&x, &y));

    // river_aux(A, A, _, []).
    // river_aux(A, B, V, P) <= crossing(A, C, Action) & ~not_allowed(C) & ~member(C, V)
    //     & river_aux(C, B, [C]+V, Plan) & P = [Action]+Plan.
    let visited = session.anon();
    session.fact(river_aux.apply([Term::from(&a), Term::from(&a), Term::from(&visited), Term::nil()]));
    session.rule(
        river_aux.apply([&a, &b, &v, &p]),
        Conjunction::of([
            Goal::from(crossing.apply([&a, &c, &action])),
            Goal::not(not_allowed.apply([&c])),
            Goal::not(member.apply([&c, &v])),
            Goal::from(river_aux.apply([
                Term::from(&c),
                Term::from(&b),
                Term::partial_list([&c], &v),
                Term::from(&plan),
            ])),
            Goal::eq(&p, Term::partial_list([&action], &plan)),
        ]),
    );

    // river(P) <= initial(Start) & final(End) & river_aux(Start, End, [Start], P).
    session.rule(
        river.apply([&p]),
        Conjunction::of([
            Goal::from(initial.apply([&from])),
            Goal::from(goal_state.apply([&to])),
            Goal::from(river_aux.apply([Term::from(&from), Term::from(&to), Term::list([&from]), Term::from(&p)])),
        ]),
    );

    Ok(river)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "hornlog=info" } else { "hornlog=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    let mut session = Session::with_config(SessionConfig { collect_stats: cli.stats, ..SessionConfig::default() });
    let river = declare(&mut session, bank_state(&cli.start)?, bank_state(&cli.target)?)?;

    let p = session.var("P")?;
    let query = Goal::from(river.apply([&p])).and(Goal::format("plan found: {}", [&p]));

    let mut found = 0;
    for solution in session.query(query).take(cli.limit.unwrap_or(usize::MAX)) {
        let moves: Vec<String> = match solution?.value(&p)? {
            Some(Value::Array(moves)) => moves
                .iter()
                .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                .collect(),
            other => bail!("expected a list of crossings, got {:?}", other),
        };
        found += 1;
        println!("plan {} ({} crossings): {}", found, moves.len(), moves.join(", "));
    }

    if found == 0 {
        println!("no plan leads from {} to {}", cli.start, cli.target);
    }

    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&session.stats())?);
    }

    Ok(())
}
