//! geo-ddar CLI
//!
//! Loads one JSON problem, runs the saturation search and prints the proof.

use anyhow::{bail, Context, Result};
use clap::Parser;
use geo_ddar_core::{load_problem, Solver, SolverConfig};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "geo-ddar-solve")]
#[command(about = "Prove plane geometry goals by deduction and algebraic closure")]
struct Args {
    /// Input problem file (JSON)
    problem: PathBuf,

    /// Solver configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of levels
    #[arg(long)]
    max_levels: Option<usize>,

    /// Wall-clock budget in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Rule match cache file
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Skip the algebraic derivation sweep
    #[arg(long)]
    no_algebra: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<SolverConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SolverConfig::default(),
    };
    if let Some(levels) = args.max_levels {
        config.max_levels = levels;
    }
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = ms;
    }
    if args.cache.is_some() {
        config.cache_path = args.cache.clone();
    }
    if args.no_algebra {
        config.use_algebra = false;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    let config = load_config(&args)?;
    let problem = load_problem(&args.problem)?;
    let mut state = problem
        .to_state()
        .with_context(|| format!("building problem {}", problem.id))?;
    if state.goal.is_none() {
        bail!("problem {} has no goal", problem.id);
    }
    info!(problem = %problem.id, points = state.points().len(), "problem loaded");

    let solver = Solver::new(config)?;
    let result = solver.run(&mut state)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{}: {} after {} level(s), {} ms",
        problem.id,
        result.outcome,
        result.levels_run(),
        result.elapsed_ms
    );
    if let Some(proof) = &result.proof {
        for step in &proof.steps {
            println!("{step}");
        }
        let stats = proof.statistics();
        println!("{} steps, {} premises", stats.num_steps, stats.num_premises);
        if let Some((rule, count)) = stats.most_used_rule() {
            println!("most used: {rule} ({count}x)");
        }
    }
    Ok(())
}
