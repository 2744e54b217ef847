//! shoal: offline driver for the Shoal planning engine.
//!
//! Runs a single planning cycle over a snapshot file and prints the result
//! as JSON. Useful for replaying a scheduler's view of the cluster.
//!
//! # Usage
//!
//! ```text
//! shoal plan --config shoal.toml --snapshot cycle.json
//! shoal order-by
//! shoal list-apps --snapshot cycle.json
//! ```

mod snapshot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shoal_core::{PlannerKind, ShoalConfig, epoch_secs};
use shoal_planner::{ApplicationRegistry, NaivePlanner, Planner, run_cycle};
use tracing::info;

use crate::snapshot::{Report, Snapshot};

#[derive(Parser)]
#[command(name = "shoal", about = "Shoal batch job planner")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan one cycle from a snapshot and print the plan.
    Plan {
        /// Scheduler configuration (shoal.toml). Defaults apply if omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON snapshot with offers, jobs and applications.
        #[arg(long)]
        snapshot: PathBuf,

        /// Override the configured run-as user.
        #[arg(long)]
        run_as_user: Option<String>,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the job ordering the planner expects.
    OrderBy,
    /// List the applications registered in a snapshot.
    ListApps {
        #[arg(long)]
        snapshot: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Plan {
            config,
            snapshot,
            run_as_user,
            pretty,
        } => plan(config, snapshot, run_as_user, pretty),
        Command::OrderBy => {
            let keys: Vec<String> = NaivePlanner::new()
                .order_by()
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("{}", keys.join(","));
            Ok(())
        }
        Command::ListApps { snapshot } => {
            let registry = Snapshot::from_file(&snapshot)?.registry();
            for app in registry.list() {
                println!("{}", serde_json::to_string(&app)?);
            }
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,shoal=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn plan(
    config_path: Option<PathBuf>,
    snapshot_path: PathBuf,
    run_as_user: Option<String>,
    pretty: bool,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => ShoalConfig::from_file(path)?,
        None => ShoalConfig::default(),
    };
    if run_as_user.is_some() {
        config.planner.run_as_user = run_as_user;
    }

    let snapshot = Snapshot::from_file(&snapshot_path)?;
    let now = snapshot.now.unwrap_or_else(epoch_secs);
    let registry = snapshot.registry();

    info!(
        offers = snapshot.offers.len(),
        jobs = snapshot.jobs.len(),
        applications = registry.len(),
        gpu_enabled = config.planner.gpu_enabled,
        max_stock = config.planner.max_stock,
        "planning cycle"
    );

    let planner = match config.planner.kind {
        PlannerKind::Naive => NaivePlanner::new(),
    };
    let cycle = run_cycle(
        &planner,
        &config.planner,
        snapshot.offers,
        snapshot.jobs,
        &registry,
        now,
    )?;

    let report = Report::from(&cycle);
    let out = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");
    Ok(())
}
