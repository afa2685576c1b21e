//! RS Rank CLI: rebuild, update and inspect relative strength rankings.
//!
//! Commands:
//! - `rebuild`: fetch about a year of bars for the whole universe and rank
//! - `update`: append yesterday's bars to the stored history and re-rank
//! - `show`: print the top of an existing rankings file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rsrank_core::artifacts::RankingsArtifact;
use rsrank_core::data::PolygonProvider;
use rsrank_runner::{
    run_daily_update, run_full_rebuild, RankingStats, RunConfig, RunReport, StdoutProgress,
    STRONG_RANK,
};

#[derive(Parser)]
#[command(
    name = "rsrank",
    about = "RS Rank, IBD-style relative strength rankings"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch history for the whole universe and rebuild both artifacts.
    Rebuild {
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Extend stored history with the previous trading day and re-rank.
    Update {
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Print the top of an existing rankings file.
    Show {
        /// Rankings file. Defaults to the configured path.
        #[arg(long)]
        rankings: Option<PathBuf>,

        /// Number of rows to print.
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
}

#[derive(clap::Args)]
struct PathArgs {
    /// Rankings output file.
    #[arg(long)]
    rankings: Option<PathBuf>,

    /// History store file.
    #[arg(long)]
    history: Option<PathBuf>,
}

impl PathArgs {
    fn apply(self, config: &mut RunConfig) {
        if let Some(p) = self.rankings {
            config.paths.rankings = p;
        }
        if let Some(p) = self.history {
            config.paths.history = p;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = RunConfig::load(cli.config.as_deref()).context("loading config")?;
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Rebuild { paths } => {
            paths.apply(&mut config);
            println!("=== IBD-Style RS Full Rebuild ===");
            let provider = build_provider(&config)?;
            let report = run_full_rebuild(&provider, &config, &StdoutProgress::default(), now())?;
            print_report(&report, 20);
        }
        Commands::Update { paths } => {
            paths.apply(&mut config);
            println!("=== IBD-Style RS Daily Update ===");
            let provider = build_provider(&config)?;
            let report = run_daily_update(&provider, &config, &StdoutProgress::default(), now())?;
            print_report(&report, 20);
        }
        Commands::Show { rankings, top } => {
            let path = rankings.unwrap_or_else(|| config.paths.rankings.clone());
            let Some(artifact) = RankingsArtifact::load(&path)
                .with_context(|| format!("reading {}", path.display()))?
            else {
                bail!("no rankings at {} (run `rsrank rebuild` first)", path.display());
            };
            print_header(&artifact);
            print_table(&artifact, top);
            print_stats(&artifact);
        }
    }

    Ok(())
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Build the Polygon client. Fails before any request if the key is unset.
fn build_provider(config: &RunConfig) -> Result<PolygonProvider> {
    let settings = config
        .polygon_settings()
        .context("POLYGON_API_KEY must be set for rebuild and update")?;
    Ok(PolygonProvider::new(settings)?)
}

fn print_report(report: &RunReport, top: usize) {
    let stats = &report.stats;
    println!();
    println!("=== Run Summary ===");
    println!("Type:           {}", report.update_type);
    if let Some(date) = report.data_date {
        println!("Data date:      {date}");
    }
    println!("Instruments:    {}", stats.total);
    println!("Scored:         {}", stats.scored);
    println!("Insufficient:   {}", stats.insufficient);
    println!("Not found:      {}", stats.not_found);
    println!("No bar:         {}", stats.no_bar);
    println!("Out of order:   {}", stats.out_of_order);
    println!("Failed:         {}", stats.failed);
    if stats.already_current > 0 {
        println!("Already current: {}", stats.already_current);
    }
    println!();
    print_table(&report.rankings, top);
    print_stats(&report.rankings);
}

fn print_header(artifact: &RankingsArtifact) {
    println!("=== {} ===", artifact.formula_used);
    println!("Benchmark:      {}", artifact.benchmark);
    println!("Updated:        {} ({})", artifact.last_updated, artifact.update_type);
    println!();
}

fn print_table(artifact: &RankingsArtifact, top: usize) {
    match artifact.data_date {
        Some(date) => println!("Top {top} RS Rankings (data {date}):"),
        None => println!("Top {top} RS Rankings:"),
    }
    println!("Rank | Symbol | RS | 3M Rel  | 12M Rel  |   Volume");
    println!("{}", "-".repeat(55));
    for (i, r) in artifact.data.iter().take(top).enumerate() {
        println!(
            "{:4} | {:6} | {:2} | {:>7} | {:>8} | {:>8}",
            i + 1,
            r.symbol,
            r.rs_rank,
            r.relative_3m,
            r.relative_12m,
            r.avg_volume
        );
    }
}

fn print_stats(artifact: &RankingsArtifact) {
    let Some(stats) = RankingStats::from_artifact(artifact) else {
        println!("\nNo ranked instruments.");
        return;
    };
    println!();
    println!("--- Statistics ---");
    println!("Ranked:         {}", stats.count);
    println!("Highest score:  {:.3}", stats.highest_score);
    println!("Lowest score:   {:.3}", stats.lowest_score);
    println!("Average score:  {:.3}", stats.average_score);
    println!("RS >= {STRONG_RANK}:       {}", stats.strong_count);
    if let Some(date) = stats.data_date {
        println!("Data date:      {date}");
    }
}
