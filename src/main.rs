use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use shop_schedule::config::SolveConfig;
use shop_schedule::input::ScheduleData;
use shop_schedule::service::{run_job, SolveResponse};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "shop-schedule")]
#[command(about = "Schedule repair jobs on shop stations minimizing overtime and idle cost")]
struct Args {
    /// Path to the JSON payload (T, I, ST, OV_limit, d, e)
    payload: PathBuf,

    /// Path to a TOML solve configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Solver time budget in seconds
    #[arg(long, conflicts_with = "no_time_limit")]
    time_limit: Option<f64>,

    /// Let the solver run until optimality is proven
    #[arg(long)]
    no_time_limit: bool,

    /// Multiplier turning cost weights into integers
    #[arg(long)]
    cost_scale: Option<i64>,

    /// Do not seed the solver with the greedy schedule
    #[arg(long)]
    no_hint: bool,

    /// Pretty-print the JSON response
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "shop_schedule=debug,info"
    } else {
        "shop_schedule=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<SolveConfig> {
    let mut config = match &args.config {
        Some(path) => SolveConfig::from_path(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => SolveConfig::default(),
    };
    if let Some(secs) = args.time_limit {
        config = config.with_time_limit_secs(Some(secs));
    }
    if args.no_time_limit {
        config = config.with_time_limit_secs(None);
    }
    if let Some(scale) = args.cost_scale {
        config = config.with_cost_scale(scale);
    }
    if args.no_hint {
        config = config.with_greedy_hint(false);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run(args: &Args) -> anyhow::Result<SolveResponse> {
    let config = load_config(args)?;
    tracing::debug!(?config, "configuration");

    let data = ScheduleData::from_path(&args.payload)
        .with_context(|| format!("failed to read payload '{}'", args.payload.display()))?;
    tracing::info!(payload = %args.payload.display(), "solving");

    let response = run_job(data, &config);
    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");
    Ok(response)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    match run(&args) {
        Ok(response) if response.is_solved() => ExitCode::SUCCESS,
        Ok(response) if response.is_no_solution() => ExitCode::from(2),
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
