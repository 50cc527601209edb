//! Money Logger
//!
//! Append-only record of each full run in the logs directory:
//!
//! - `portfolio_history.json` - one snapshot per run
//! - `money_moves.md` - portfolio value and the recommended actions
//! - `lessons_learned.md` - warnings and risks, when there were any
//!
//! [`knowledge`] rebuilds the knowledge base from the newest snapshots.

mod extract;
mod history;
pub mod knowledge;

pub use extract::extract_action_items;
pub use history::{PortfolioHistory, PortfolioHistoryEntry, HISTORY_FILE};
pub use knowledge::{KnowledgeBase, KNOWLEDGE_BASE_FILE};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::market::MarketScan;
use crate::playbook::PlaybookReport;
use crate::portfolio::PortfolioReport;

pub const MONEY_MOVES_FILE: &str = "money_moves.md";
pub const LESSONS_FILE: &str = "lessons_learned.md";

const MONEY_MOVES_HEADER: &str = "# Money Moves Log\n\n\
    This file tracks all money moves, including trades, deposits, withdrawals, and other financial actions.\n\n\
    ## Entries\n\n";

const LESSONS_HEADER: &str = "# Lessons Learned\n\n\
    This file captures lessons learned from trading decisions, market analysis, and portfolio management.\n\n\
    ## Entries\n\n";

/// What one `record` call wrote
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogSummary {
    /// History length after the append, `None` when there was no portfolio
    pub history_len: Option<usize>,
    pub actions: usize,
    pub lessons: usize,
}

pub struct MoneyLogger {
    history: PortfolioHistory,
    money_moves: PathBuf,
    lessons: PathBuf,
}

impl MoneyLogger {
    /// Open the logs directory, creating it and any missing log file
    pub fn new(logs_dir: &Path) -> Result<Self> {
        fs::create_dir_all(logs_dir)?;

        let logger = Self {
            history: PortfolioHistory::in_dir(logs_dir),
            money_moves: logs_dir.join(MONEY_MOVES_FILE),
            lessons: logs_dir.join(LESSONS_FILE),
        };
        logger.history.init()?;
        init_markdown(&logger.money_moves, MONEY_MOVES_HEADER)?;
        init_markdown(&logger.lessons, LESSONS_HEADER)?;
        Ok(logger)
    }

    pub const fn history(&self) -> &PortfolioHistory {
        &self.history
    }

    pub fn record(
        &self,
        market: Option<&MarketScan>,
        portfolio: Option<&PortfolioReport>,
        report: &PlaybookReport,
        now: DateTime<Utc>,
    ) -> Result<LogSummary> {
        tracing::info!("Logging money moves");

        let history_len = match portfolio {
            Some(portfolio) => Some(self.history.append(PortfolioHistoryEntry {
                timestamp: now,
                total_value_usd: portfolio.total_value_usd,
                performance: portfolio.performance,
                holdings: portfolio.holdings.clone(),
            })?),
            None => {
                tracing::warn!("No portfolio data to log");
                None
            }
        };

        let actions = extract_action_items(&report.text).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "No action items recovered from playbook");
            Vec::new()
        });
        append(&self.money_moves, &money_moves_entry(portfolio, &actions, now))?;

        let lessons = lessons(market, portfolio);
        if !lessons.is_empty() {
            append(&self.lessons, &lessons_entry(&lessons, now))?;
        }

        let summary = LogSummary {
            history_len,
            actions: actions.len(),
            lessons: lessons.len(),
        };
        tracing::info!(
            history = ?summary.history_len,
            actions = summary.actions,
            lessons = summary.lessons,
            "Money moves logged"
        );
        Ok(summary)
    }
}

fn init_markdown(path: &Path, header: &str) -> Result<()> {
    if !path.exists() {
        fs::write(path, header)?;
    }
    Ok(())
}

fn append(path: &Path, entry: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.as_bytes())?;
    Ok(())
}

fn stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn money_moves_entry(portfolio: Option<&PortfolioReport>, actions: &[String], now: DateTime<Utc>) -> String {
    let mut entry = format!("### {}\n\n", stamp(now));

    if let Some(portfolio) = portfolio {
        let day = portfolio
            .performance
            .change_24h
            .map_or_else(|| "N/A".to_string(), |c| format!("{:.2}%", c.round_dp(2)));
        entry.push_str(&format!(
            "**Portfolio Value:** ${:.2}\n**24h Performance:** {day}\n\n",
            portfolio.total_value_usd.round_dp(2)
        ));
    }

    if actions.is_empty() {
        entry.push_str("*No specific money moves recommended today.*\n");
    } else {
        entry.push_str("**Recommended Actions:**\n\n");
        for action in actions {
            entry.push_str(&format!("- {action}\n"));
        }
    }

    entry.push_str("\n---\n\n");
    entry
}

fn lessons(market: Option<&MarketScan>, portfolio: Option<&PortfolioReport>) -> Vec<String> {
    let warnings = market.into_iter().flat_map(|m| &m.warnings).map(|w| {
        format!(
            "Market warning for {}: {}",
            w.subject.as_deref().unwrap_or("Unknown"),
            w.message
        )
    });
    let risks = portfolio
        .into_iter()
        .flat_map(|p| &p.risks)
        .map(|r| format!("Portfolio risk: {}", r.message));

    warnings.chain(risks).collect()
}

fn lessons_entry(lessons: &[String], now: DateTime<Utc>) -> String {
    let mut entry = format!("### {}\n\n", stamp(now));
    for lesson in lessons {
        entry.push_str(&format!("- {lesson}\n"));
    }
    entry.push_str("\n---\n\n");
    entry
}
