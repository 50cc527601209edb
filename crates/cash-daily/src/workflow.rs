//! One pass of the daily workflow.
//!
//! Phases run in order. A phase that cannot be built from config is logged
//! and skipped; failing to write a snapshot stops the run.
//!
//! [`Mode::KnowledgeBase`] runs no phase and only refreshes the knowledge
//! base from snapshots already on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use cash_core::{
    compose, BotHunt, BotHunter, KnowledgeBase, MarketScan, MarketScanner, MoneyLogger,
    PortfolioEvaluator, PortfolioReport, WorkflowContext,
};

const FILE_STAMP: &str = "%Y%m%d_%H%M%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Full,
    MarketOnly,
    PortfolioOnly,
    BotsOnly,
    KnowledgeBase,
}

impl Mode {
    const fn market(self) -> bool {
        matches!(self, Self::Full | Self::MarketOnly)
    }

    const fn portfolio(self) -> bool {
        matches!(self, Self::Full | Self::PortfolioOnly)
    }

    const fn bots(self) -> bool {
        matches!(self, Self::Full | Self::BotsOnly)
    }
}

/// Files written by one run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub snapshots: Vec<PathBuf>,
    pub playbook: Option<PathBuf>,
    pub knowledge_base: Option<PathBuf>,
}

pub async fn run(ctx: &WorkflowContext, mode: Mode) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();

    if mode == Mode::KnowledgeBase {
        summary.knowledge_base = update_knowledge_base(ctx)?;
        return Ok(summary);
    }

    let market = if mode.market() {
        scan_market(ctx).await
    } else {
        None
    };
    if let Some(scan) = &market {
        summary
            .snapshots
            .push(write_snapshot(&ctx.paths.results_dir, "market_scan", scan.timestamp, scan)?);
    }

    let portfolio = if mode.portfolio() {
        check_portfolio(ctx).await
    } else {
        None
    };
    if let Some(report) = &portfolio {
        summary
            .snapshots
            .push(write_snapshot(&ctx.paths.results_dir, "portfolio", report.timestamp, report)?);
    }

    let bots = if mode.bots() { hunt_bots(ctx).await } else { None };
    if let Some(hunt) = &bots {
        summary
            .snapshots
            .push(write_snapshot(&ctx.paths.results_dir, "bot_hunt", hunt.timestamp, hunt)?);
    }

    if mode != Mode::Full {
        return Ok(summary);
    }

    let any_data = market.as_ref().is_some_and(MarketScan::has_data)
        || portfolio.as_ref().is_some_and(PortfolioReport::has_data)
        || bots.as_ref().is_some_and(BotHunt::has_data);
    if !any_data {
        tracing::warn!("No phase returned data, skipping playbook");
        return Ok(summary);
    }

    let now = Utc::now();
    let report = compose(market.as_ref(), portfolio.as_ref(), bots.as_ref(), now);
    let path = ctx
        .paths
        .results_dir
        .join(format!("playbook_{}.md", now.format(FILE_STAMP)));
    fs::write(&path, &report.text)
        .with_context(|| format!("failed to write playbook to {}", path.display()))?;
    tracing::info!(path = %path.display(), "✓ Playbook written");
    summary.playbook = Some(path);

    let logger = MoneyLogger::new(&ctx.paths.logs_dir).context("failed to open money logs")?;
    logger
        .record(market.as_ref(), portfolio.as_ref(), &report, now)
        .context("failed to log money moves")?;

    Ok(summary)
}

async fn scan_market(ctx: &WorkflowContext) -> Option<MarketScan> {
    match MarketScanner::from_context(ctx) {
        Ok(scanner) => Some(scanner.scan().await),
        Err(e) => {
            tracing::error!(error = %e, "⚠ Market scan unavailable");
            None
        }
    }
}

async fn check_portfolio(ctx: &WorkflowContext) -> Option<PortfolioReport> {
    match PortfolioEvaluator::from_context(ctx) {
        Ok(evaluator) => Some(evaluator.evaluate().await),
        Err(e) => {
            tracing::error!(error = %e, "⚠ Portfolio check unavailable");
            None
        }
    }
}

async fn hunt_bots(ctx: &WorkflowContext) -> Option<BotHunt> {
    match BotHunter::from_context(ctx) {
        Ok(hunter) => Some(hunter.hunt().await),
        Err(e) => {
            tracing::error!(error = %e, "⚠ Bot hunt unavailable");
            None
        }
    }
}

fn update_knowledge_base(ctx: &WorkflowContext) -> anyhow::Result<Option<PathBuf>> {
    let kb = KnowledgeBase::new(&ctx.paths.knowledge_base);
    let updated = kb
        .update(&ctx.paths.results_dir, Utc::now())
        .with_context(|| format!("failed to update {}", kb.path().display()))?;
    Ok(updated.then(|| kb.path().to_path_buf()))
}

fn write_snapshot<T: Serialize>(
    dir: &Path,
    prefix: &str,
    timestamp: DateTime<Utc>,
    value: &T,
) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("{prefix}_{}.json", timestamp.format(FILE_STAMP)));
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "✓ Snapshot saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cash_core::ledger::{PortfolioHistory, LESSONS_FILE, MONEY_MOVES_FILE};
    use cash_core::{AppConfig, OutputPaths};

    fn context(root: &Path) -> WorkflowContext {
        let paths = OutputPaths::new(root.join("results"), root.join("logs"))
            .with_knowledge_base(root.join("KNOWLEDGE_BASE.md"));
        paths.ensure_dirs().unwrap();
        WorkflowContext::new(AppConfig::default(), paths)
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_full_run_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let summary = run(&ctx, Mode::Full).await.unwrap();

        let written = names(&summary.snapshots);
        assert_eq!(written.len(), 3);
        assert!(written[0].starts_with("market_scan_"));
        assert!(written[1].starts_with("portfolio_"));
        assert!(written[2].starts_with("bot_hunt_"));

        let playbook = fs::read_to_string(summary.playbook.unwrap()).unwrap();
        assert!(playbook.starts_with("# Cash Playbook - "));
        assert!(playbook.contains("## Action Plan"));

        let logs = &ctx.paths.logs_dir;
        assert!(logs.join(MONEY_MOVES_FILE).exists());
        assert!(logs.join(LESSONS_FILE).exists());
        assert_eq!(PortfolioHistory::in_dir(logs).load().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_phase_skips_playbook() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let summary = run(&ctx, Mode::BotsOnly).await.unwrap();

        let written = names(&summary.snapshots);
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("bot_hunt_"));
        assert!(summary.playbook.is_none());
        assert!(!ctx.paths.logs_dir.join(MONEY_MOVES_FILE).exists());
    }

    #[tokio::test]
    async fn test_snapshot_json_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let summary = run(&ctx, Mode::MarketOnly).await.unwrap();
        let raw = fs::read_to_string(&summary.snapshots[0]).unwrap();
        let scan: MarketScan = serde_json::from_str(&raw).unwrap();
        assert!(scan.has_data());
    }

    #[tokio::test]
    async fn test_knowledge_base_from_earlier_runs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let empty = run(&ctx, Mode::KnowledgeBase).await.unwrap();
        assert!(empty.knowledge_base.is_none());
        assert!(!ctx.paths.knowledge_base.exists());

        run(&ctx, Mode::MarketOnly).await.unwrap();
        run(&ctx, Mode::BotsOnly).await.unwrap();
        let summary = run(&ctx, Mode::KnowledgeBase).await.unwrap();

        assert!(summary.snapshots.is_empty());
        assert!(summary.playbook.is_none());
        let kb = fs::read_to_string(summary.knowledge_base.unwrap()).unwrap();
        assert!(kb.starts_with("# Cash Knowledge Base\n\n**Harvest Date:** "));
        assert!(kb.contains("## Top Open-Source Crypto Trading Bots & Frameworks"));
        assert!(kb.contains("## Trending Coins"));
    }

    #[tokio::test]
    async fn test_unwritable_results_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = WorkflowContext::new(
            AppConfig::default(),
            OutputPaths::new(dir.path().join("missing"), dir.path().join("logs")),
        );
        assert!(run(&ctx, Mode::BotsOnly).await.is_err());
    }
}
