//! cash-daily
//!
//! Runs the daily crypto workflow once: market scan, portfolio check and bot
//! hunt, then the playbook and money log when running in full mode.
//!
//! Log lines go to stderr and to `cash_daily_YYYYMMDD.log` in the logs
//! directory.

mod workflow;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cash_core::{AppConfig, OutputPaths, WorkflowContext};

use crate::workflow::Mode;

#[derive(Debug, Parser)]
#[command(name = "cash-daily", version, about = "Cash daily workflow")]
#[command(group(ArgGroup::new("mode").args(["full", "market_only", "portfolio_only", "bots_only", "update_kb"])))]
struct Cli {
    /// Run the complete workflow (default)
    #[arg(long)]
    full: bool,

    /// Only run the market scan
    #[arg(long)]
    market_only: bool,

    /// Only check the portfolio
    #[arg(long)]
    portfolio_only: bool,

    /// Only hunt for new bots and scripts
    #[arg(long)]
    bots_only: bool,

    /// Rebuild the knowledge base from the newest snapshots
    #[arg(long)]
    update_kb: bool,

    /// Config file, created with defaults when missing
    #[arg(long, env = "CASH_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Directory for scan snapshots and playbooks
    #[arg(long, env = "CASH_RESULTS_DIR", default_value = "results")]
    results_dir: PathBuf,

    /// Directory for the portfolio history and money logs
    #[arg(long, env = "CASH_LOGS_DIR", default_value = "logs")]
    logs_dir: PathBuf,

    /// Knowledge base written by --update-kb
    #[arg(long, env = "CASH_KNOWLEDGE_BASE", default_value = "KNOWLEDGE_BASE.md")]
    knowledge_base: PathBuf,
}

impl Cli {
    const fn mode(&self) -> Mode {
        if self.market_only {
            Mode::MarketOnly
        } else if self.portfolio_only {
            Mode::PortfolioOnly
        } else if self.bots_only {
            Mode::BotsOnly
        } else if self.update_kb {
            Mode::KnowledgeBase
        } else {
            Mode::Full
        }
    }
}

fn log_file_name(date: NaiveDate) -> String {
    format!("cash_daily_{}.log", date.format("%Y%m%d"))
}

/// Log to stderr and append to today's log file
fn init_tracing(logs_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let path = logs_dir.join(log_file_name(Local::now().date_naive()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let log_file = init_tracing(&cli.logs_dir)?;
    let started = std::time::Instant::now();
    tracing::info!(mode = ?cli.mode(), log_file = %log_file.display(), "Starting Cash daily workflow");

    let paths =
        OutputPaths::new(&cli.results_dir, &cli.logs_dir).with_knowledge_base(&cli.knowledge_base);
    paths.ensure_dirs().context("failed to create output directories")?;

    let mut config = AppConfig::load_or_init(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    config.apply_env();

    let ctx = WorkflowContext::new(config, paths);
    let summary = workflow::run(&ctx, cli.mode()).await.inspect_err(|e| {
        tracing::error!(error = %e, "Cash daily workflow failed");
    })?;

    tracing::info!(
        snapshots = summary.snapshots.len(),
        playbook = ?summary.playbook,
        knowledge_base = ?summary.knowledge_base,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Cash daily workflow completed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_full() {
        let cli = Cli::parse_from(["cash-daily"]);
        assert_eq!(cli.mode(), Mode::Full);
        assert_eq!(cli.config, PathBuf::from("config.json"));
    }

    #[test]
    fn test_single_phase_flags() {
        assert_eq!(Cli::parse_from(["cash-daily", "--market-only"]).mode(), Mode::MarketOnly);
        assert_eq!(Cli::parse_from(["cash-daily", "--portfolio-only"]).mode(), Mode::PortfolioOnly);
        assert_eq!(Cli::parse_from(["cash-daily", "--bots-only"]).mode(), Mode::BotsOnly);
        assert_eq!(Cli::parse_from(["cash-daily", "--update-kb"]).mode(), Mode::KnowledgeBase);
    }

    #[test]
    fn test_knowledge_base_path_flag() {
        let cli = Cli::parse_from(["cash-daily", "--update-kb", "--knowledge-base", "notes/kb.md"]);
        assert_eq!(cli.knowledge_base, PathBuf::from("notes/kb.md"));
        assert!(Cli::try_parse_from(["cash-daily", "--full", "--update-kb"]).is_err());
    }

    #[test]
    fn test_log_file_named_by_day() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert_eq!(log_file_name(date), "cash_daily_20250501.log");
    }

    #[test]
    fn test_modes_are_exclusive() {
        assert!(Cli::try_parse_from(["cash-daily", "--market-only", "--bots-only"]).is_err());
    }
}
