//! `metrosat` - encode metro routing problems as CNF, solve them, and decode the routes.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use metrosat::domain::{BufferConfig, Buffered, FullGrid, Pruning};
use metrosat::io::{self, Artifacts};
use metrosat::{decode, encode, solve, MetroMap, Problem, SolverResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "metrosat")]
#[command(version, about = "Route metro lines on a grid with a SAT solver", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write <BASE>.satinput and <BASE>.varmap for <BASE>.city
    Encode {
        base: PathBuf,
        #[command(flatten)]
        pruning: PruneArgs,
    },
    /// Write <BASE>.metromap from <BASE>.satoutput
    Decode {
        base: PathBuf,
    },
    /// Encode, solve in process, and decode <BASE>.city
    Solve {
        base: PathBuf,
        #[command(flatten)]
        pruning: PruneArgs,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Strategy {
    /// Every line may use the whole grid
    Full,
    /// Confine each line to a buffered box around its endpoints
    Buffered,
}

#[derive(Args)]
struct PruneArgs {
    #[arg(long, value_enum, default_value_t = Strategy::Buffered)]
    strategy: Strategy,
    /// JSON file overriding buffer settings; missing fields keep their defaults
    #[arg(long)]
    prune_config: Option<PathBuf>,
}

impl PruneArgs {
    fn pruning(&self) -> anyhow::Result<Box<dyn Pruning>> {
        match (self.strategy, &self.prune_config) {
            (Strategy::Full, None) => Ok(Box::new(FullGrid)),
            (Strategy::Full, Some(_)) => bail!("--prune-config only applies to --strategy buffered"),
            (Strategy::Buffered, None) => Ok(Box::new(Buffered::default())),
            (Strategy::Buffered, Some(path)) => {
                let config = load_config(path)?;
                tracing::info!("buffer settings: {:?}", config);
                Ok(Box::new(Buffered::new(config)))
            }
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<BufferConfig> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("reading buffer settings from {}", path.display()))
}

fn run_encode(artifacts: &Artifacts, pruning: &PruneArgs) -> anyhow::Result<()> {
    let problem = io::read_problem(&artifacts.problem())?;
    let encoding = encode(&problem, &pruning.pruning()?);
    io::write_cnf(&artifacts.cnf(), &encoding)?;
    io::write_var_map(&artifacts.var_map(), encoding.vars())?;

    println!("wrote {} ({})", artifacts.cnf().display(), encoding.stats());
    Ok(())
}

fn report(problem: &Problem, result: &SolverResult, routes: Option<&[metrosat::Route]>) {
    match routes {
        Some(routes) => {
            let map = MetroMap::new(problem, routes);
            print!("{map}");
            for violation in map.violations() {
                tracing::warn!("{}", violation);
            }
        }
        None if !result.is_sat() => println!("unsatisfiable"),
        None => {}
    }
}

fn run_decode(artifacts: &Artifacts) -> anyhow::Result<()> {
    let problem = io::read_problem(&artifacts.problem())?;
    let vars = io::read_var_map(&artifacts.var_map())?;
    let result = io::read_solver_output(&artifacts.solver_output())?;

    let routes = decode(&problem, &vars, &result);
    io::write_route_file(&artifacts.routes(), &problem, routes.as_deref())?;
    report(&problem, &result, routes.as_deref());
    Ok(())
}

fn run_solve(artifacts: &Artifacts, pruning: &PruneArgs) -> anyhow::Result<()> {
    let problem = io::read_problem(&artifacts.problem())?;
    let encoding = encode(&problem, &pruning.pruning()?);
    io::write_cnf(&artifacts.cnf(), &encoding)?;
    io::write_var_map(&artifacts.var_map(), encoding.vars())?;

    let result = solve(&encoding).context("solving")?;
    io::write_solver_output(&artifacts.solver_output(), &result)?;

    let routes = decode(&problem, encoding.vars(), &result);
    io::write_route_file(&artifacts.routes(), &problem, routes.as_deref())?;
    report(&problem, &result, routes.as_deref());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Encode { base, pruning } => run_encode(&Artifacts::new(base), &pruning),
        Commands::Decode { base } => run_decode(&Artifacts::new(base)),
        Commands::Solve { base, pruning } => run_solve(&Artifacts::new(base), &pruning),
    }
}
