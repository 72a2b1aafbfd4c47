//! halomesh - barrier-synchronized 2D diffusion over decomposed tiles.
//!
//! Runs the canonical heated-block diffusion problem across a grid of
//! worker-owned tiles and reports the final field's mean and population
//! standard deviation.
//!
//! ```bash
//! halomesh --nx 128 --ny 128 --nt 200 --workers 8
//! halomesh --physical --sigma 0.25 --nu 0.05
//! halomesh --workers 6 --px 3 --py 2
//! ```

use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use colored::Colorize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use halomesh_core::{
    DiffusionParams, DiffusionSolver, Result, SolveReport, SolverConfig, WorkerGrid,
};

/// Barrier-synchronized 2D diffusion over decomposed tiles
#[derive(Parser)]
#[command(name = "halomesh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Grid width in cells
    #[arg(long, default_value_t = 64)]
    nx: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 64)]
    ny: usize,

    /// Number of iterations
    #[arg(long, default_value_t = 50)]
    nt: usize,

    /// Stencil update coefficient
    #[arg(long, default_value_t = 0.25, conflicts_with = "physical")]
    alpha: f64,

    /// Derive the coefficient from physical parameters instead of --alpha
    #[arg(long)]
    physical: bool,

    /// Domain extent along x (with --physical)
    #[arg(long, default_value_t = 2.0)]
    x_len: f64,

    /// Domain extent along y (with --physical)
    #[arg(long, default_value_t = 2.0)]
    y_len: f64,

    /// Stability factor scaling the time step (with --physical)
    #[arg(long, default_value_t = 0.25)]
    sigma: f64,

    /// Diffusion coefficient (with --physical)
    #[arg(long, default_value_t = 0.05)]
    nu: f64,

    /// Worker count (defaults to the available parallelism)
    #[arg(short, long)]
    workers: Option<NonZeroUsize>,

    /// Worker-grid columns (with --py; must multiply to the worker count)
    #[arg(long, requires = "py")]
    px: Option<usize>,

    /// Worker-grid rows (with --px)
    #[arg(long, requires = "px")]
    py: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print only the final mean and standard deviation
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn resolve_worker_grid(cli: &Cli) -> Result<WorkerGrid> {
    match (cli.px, cli.py) {
        (Some(px), Some(py)) => match cli.workers {
            Some(workers) => WorkerGrid::with_count(workers.get(), px, py),
            None => WorkerGrid::new(px, py),
        },
        _ => {
            let workers = cli.workers.map(NonZeroUsize::get).unwrap_or_else(|| {
                thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            });
            WorkerGrid::for_workers(workers)
        }
    }
}

fn resolve_alpha(cli: &Cli) -> f64 {
    if !cli.physical {
        return cli.alpha;
    }
    let params = DiffusionParams::new(cli.x_len, cli.y_len, cli.nx, cli.ny, cli.sigma, cli.nu);
    debug!(
        "derived dx {:.6}, dy {:.6}, dt {:.6}",
        params.dx, params.dy, params.dt
    );
    if !params.is_stable() {
        warn!(
            "alpha {:.4} exceeds the stable limit of 0.25; the scheme may diverge",
            params.alpha()
        );
    }
    params.alpha()
}

fn print_report(cli: &Cli, report: &SolveReport, alpha: f64) {
    if cli.quiet {
        println!("{:.12} {:.12}", report.stats.mean, report.stats.std_dev);
        return;
    }
    // Pad before coloring; escape codes would count toward the width.
    let label = |text: &str| format!("{:<12}", text).dimmed();
    println!();
    println!("{}", "halomesh diffusion report".bright_cyan().bold());
    println!("  {}{} x {}", label("grid"), cli.nx, cli.ny);
    println!(
        "  {}{} ({} x {} tiles)",
        label("workers"),
        report.workers.worker_count(),
        report.workers.px(),
        report.workers.py()
    );
    println!("  {}{}", label("iterations"), report.iterations);
    println!("  {}{:.6}", label("alpha"), alpha);
    println!("  {}{:.12}", label("mean"), report.stats.mean);
    println!("  {}{:.12}", label("std dev"), report.stats.std_dev);
    println!(
        "  {}{:.3} ms",
        label("elapsed"),
        report.elapsed.as_secs_f64() * 1e3
    );
}

fn run(cli: &Cli) -> Result<()> {
    let workers = resolve_worker_grid(cli)?;
    let alpha = resolve_alpha(cli);

    let config = SolverConfig {
        nx: cli.nx,
        ny: cli.ny,
        nt: cli.nt,
        alpha,
        workers,
    };
    let mut solver = DiffusionSolver::new(config)?;
    let report = solver.run();
    print_report(cli, &report, alpha);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
