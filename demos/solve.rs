use clap::Parser;
use color_eyre::eyre::eyre;

use evar_rs::engine::{Engine, EngineConfig};
use evar_rs::expr::Expr;
use evar_rs::program::Program;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Loop variable as `name:initial:update`, in declaration order.
    /// Without any, a symmetric random walk is analysed.
    #[arg(long = "var", value_name = "SPEC")]
    vars: Vec<String>,

    /// Goal expressions (defaults to every variable).
    #[arg(value_name = "EXPR")]
    goals: Vec<String>,

    /// Raise each default goal to this power.
    #[clap(long, value_name = "INT", default_value = "1")]
    power: u32,

    /// Memo store size (in bits).
    #[clap(long, value_name = "INT", default_value = "10")]
    cache_bits: usize,

    /// Print the memoized recurrences and solutions.
    #[clap(long)]
    dump: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mut builder = Program::builder();
    if args.vars.is_empty() {
        builder = builder.var("x", "0", "x + 1 @ 1/2; x - 1 @ 1/2");
    }
    for spec in &args.vars {
        let parts: Vec<&str> = spec.splitn(3, ':').collect();
        let [name, initial, update] = parts.as_slice() else {
            return Err(eyre!("Expected `name:initial:update`, got `{}`", spec));
        };
        builder = builder.var(name.trim(), initial, update);
    }
    let program = builder.build()?;
    print!("{}", program);

    let goals: Vec<Expr> = if args.goals.is_empty() {
        program
            .variables()
            .iter()
            .map(|v| Expr::from(v.clone()).pow(args.power))
            .collect()
    } else {
        args.goals.iter().map(|g| g.parse::<Expr>()).collect::<Result<_, _>>()?
    };

    let config = EngineConfig::default().with_cache_bits(args.cache_bits);
    let mut engine = Engine::with_config(&program, config);
    for goal in &goals {
        let time = std::time::Instant::now();
        let solution = engine.solve_expr(goal)?;
        println!("E[{}] = {} (in {:.3}s)", goal, solution, time.elapsed().as_secs_f64());
    }

    println!("stats: {}", engine.stats());
    if args.dump {
        print!("{}", engine.dump_state());
    }

    println!("Total time: {:.3}s", time_total.elapsed().as_secs_f64());
    Ok(())
}
