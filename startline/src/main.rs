use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use startline::args;
use startline::cli_output;
use startline::report::{self, RunSummary, SystemInfo};
use startline::workload::{CountingWorkload, ValueType, DEFAULT_ITERATIONS};
use startline_core::{HostPlatform, Launcher, StartlineResult};

#[derive(Parser)]
#[command(name = "startline")]
#[command(about = "Launch pinned CPU-bound workers from a common starting line and time them")]
#[command(version)]
struct Cli {
    /// Thread count and/or pin directive, in any order:
    /// N, pin, pin@UNIT, pin:UNIT,UNIT,...  (UNIT is `N` or `GROUP-INDEX`)
    #[arg(value_name = "THREADS|PIN")]
    run_args: Vec<String>,

    /// Launch file (.toml, .yaml or .yml); positional arguments override it
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Counting steps per worker
    #[arg(short = 'n', long = "iterations", default_value_t = DEFAULT_ITERATIONS)]
    iterations: u64,

    /// Counter arithmetic: int or double
    #[arg(short = 't', long = "value-type", default_value_t = ValueType::Int)]
    value_type: ValueType,

    /// Try to raise worker thread priority before the start
    #[arg(long = "raise-priority")]
    raise_priority: bool,

    /// Print the report as JSON instead of text
    #[arg(long = "json")]
    json: bool,

    /// Increase output verbosity (show debug messages)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Suppress informational output
    #[arg(short = 'Q', long = "quiet-all")]
    quiet_all: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet_all || cli.json {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::debug!("startline v{}", env!("CARGO_PKG_VERSION"));

    if cli.config.is_none() && cli.run_args.is_empty() {
        // Nothing to launch.
        let _ = Cli::command().print_help();
        return;
    }

    if let Err(e) = run(cli) {
        cli_output::error(&e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> StartlineResult<()> {
    let mut config = args::resolve(cli.config.as_deref(), &cli.run_args)?;
    if cli.raise_priority {
        config.options.raise_priority = true;
    }

    let platform = HostPlatform::detect();
    let system = SystemInfo::collect(&platform);
    if !cli.json && !cli.quiet_all {
        system.print();
        cli_output::field("value type", cli.value_type);
        cli_output::field("placement", &config.run.placement);
    }

    let workload = CountingWorkload::new(cli.iterations, cli.value_type);
    let launcher = Launcher::new(platform).with_options(config.options.clone());
    let report = launcher.run(&config.run, &workload)?;

    if cli.json {
        let summary = RunSummary::new(system, &config.run, &workload, &report);
        println!("{}", summary.to_json()?);
    } else {
        report::print_report(&report);
    }
    Ok(())
}
