//! Knowledge Base
//!
//! Rebuilds `KNOWLEDGE_BASE.md` from the newest market scan, portfolio and
//! bot hunt snapshots in the results directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::bots::{BotHunt, ScoredRepository};
use crate::error::{CashError, Result};
use crate::market::{MarketScan, TrendingCoin};
use crate::portfolio::PortfolioReport;

pub const KNOWLEDGE_BASE_FILE: &str = "KNOWLEDGE_BASE.md";

/// Repositories listed, most starred first
pub const TOP_BOTS: usize = 10;

/// Trending coins listed, highest score first
pub const TOP_TRENDING: usize = 5;

const TA_LIBRARIES: &str = "## Technical Analysis & Market Data Libraries
- [TA-Lib](https://github.com/TA-Lib/ta-lib-python): Python technical analysis library
- [ccxt](https://github.com/ccxt/ccxt): Unified crypto exchange API (Python/JS/PHP)
- [pandas-ta](https://github.com/twopirllc/pandas-ta): 120+ indicators for Pandas
- [TradingView](https://www.tradingview.com/): Charts, signals, and community scripts

";

const NEXT_STEPS: &str = "## Next Steps
- Vet, test, and adapt the top bots for our wallets/exchanges
- Integrate best strategies and automation into Cash's daily workflow
- Set up daily/weekly harvest for new tools, strategies, and market changes
- Document all findings, scripts, and results in this knowledge base

---

*This file is the foundation for Cash's automated trading intelligence. Update regularly with new tools, scripts, and lessons learned.*
";

/// Newest snapshot of each kind, if any were written
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatestResults {
    pub market: Option<MarketScan>,
    pub portfolio: Option<PortfolioReport>,
    pub bots: Option<BotHunt>,
}

impl LatestResults {
    /// Load the newest `market_scan_*`, `portfolio_*` and `bot_hunt_*` snapshot
    pub fn load(results_dir: &Path) -> Result<Self> {
        Ok(Self {
            market: load_latest(results_dir, "market_scan")?,
            portfolio: load_latest(results_dir, "portfolio")?,
            bots: load_latest(results_dir, "bot_hunt")?,
        })
    }

    pub const fn is_empty(&self) -> bool {
        self.market.is_none() && self.portfolio.is_none() && self.bots.is_none()
    }
}

/// Path of the newest `<prefix>_YYYYMMDD_HHMMSS.json` in `dir`
pub fn latest_snapshot(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let pattern = Regex::new(&format!(r"^{}_\d{{8}}_\d{{6}}\.json$", regex::escape(prefix)))
        .map_err(|e| CashError::ReportParse(e.to_string()))?;

    if !dir.exists() {
        return Ok(None);
    }

    let mut newest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !pattern.is_match(&name) {
            continue;
        }
        if newest.as_ref().is_none_or(|(best, _)| name > *best) {
            newest = Some((name, entry.path()));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

fn load_latest<T: DeserializeOwned>(dir: &Path, prefix: &str) -> Result<Option<T>> {
    let Some(path) = latest_snapshot(dir, prefix)? else {
        return Ok(None);
    };
    tracing::debug!(path = %path.display(), "Reading snapshot");
    let raw = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

pub struct KnowledgeBase {
    path: PathBuf,
}

impl KnowledgeBase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the knowledge base from the newest snapshots.
    ///
    /// Returns `false` and leaves the file alone when there are no snapshots.
    pub fn update(&self, results_dir: &Path, now: DateTime<Utc>) -> Result<bool> {
        tracing::info!(results = %results_dir.display(), "Updating knowledge base");

        let latest = LatestResults::load(results_dir)?;
        if latest.is_empty() {
            tracing::warn!("No results found, run the daily workflow first");
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, render(&latest, now))?;
        tracing::info!(path = %self.path.display(), "✓ Knowledge base updated");
        Ok(true)
    }
}

/// Knowledge base text for a set of snapshots
pub fn render(latest: &LatestResults, now: DateTime<Utc>) -> String {
    let date = now.format("%Y-%m-%d");
    let mut sections = Vec::new();

    if let Some(hunt) = &latest.bots {
        let bots = top_bots(&hunt.repositories);
        if !bots.is_empty() {
            let mut section = format!("## Top Open-Source Crypto Trading Bots & Frameworks ({date})\n\n");
            for (n, repo) in bots.iter().enumerate() {
                let c = &repo.candidate;
                let description = if c.description.trim().is_empty() {
                    "No description"
                } else {
                    c.description.as_str()
                };
                section.push_str(&format!(
                    "### {}. [{}]({})\n- {}, {} stars\n- {description}\n\n",
                    n + 1,
                    c.name,
                    c.url,
                    c.language.as_deref().unwrap_or("Unknown"),
                    c.stars
                ));
            }
            sections.push(section);
        }
    }

    if let Some(scan) = &latest.market {
        let coins = top_trending(&scan.trending_coins);
        if !coins.is_empty() {
            let mut section = format!("## Trending Coins ({date})\n\n");
            for (n, coin) in coins.iter().enumerate() {
                section.push_str(&format!(
                    "### {}. {} ({})\n- Trend Score: {:.2}\n\n",
                    n + 1,
                    coin.name,
                    coin.symbol,
                    coin.score.unwrap_or_default()
                ));
            }
            sections.push(section);
        }
    }

    if latest.bots.is_some() {
        sections.push(TA_LIBRARIES.to_string());
    }
    sections.push(NEXT_STEPS.to_string());

    format!(
        "# Cash Knowledge Base\n\n**Harvest Date:** {date}\n\n{}",
        sections.join("\n")
    )
}

fn top_bots(repositories: &[ScoredRepository]) -> Vec<&ScoredRepository> {
    let mut sorted: Vec<_> = repositories.iter().collect();
    sorted.sort_by(|a, b| b.candidate.stars.cmp(&a.candidate.stars));
    sorted.truncate(TOP_BOTS);
    sorted
}

fn top_trending(coins: &[TrendingCoin]) -> Vec<&TrendingCoin> {
    let mut sorted: Vec<_> = coins.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .unwrap_or_default()
            .total_cmp(&a.score.unwrap_or_default())
    });
    sorted.truncate(TOP_TRENDING);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::{RepositoryCandidate, RepositoryScorer};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 11, 9, 30, 0).unwrap()
    }

    fn coin(name: &str, symbol: &str, score: Option<f64>) -> TrendingCoin {
        TrendingCoin {
            name: name.into(),
            symbol: symbol.into(),
            source: "coingecko".into(),
            score,
            market_cap_rank: None,
        }
    }

    fn scan(coins: Vec<TrendingCoin>) -> MarketScan {
        MarketScan {
            timestamp: now(),
            trending_coins: coins,
            global: None,
            top_coins: Vec::new(),
            signals: Vec::new(),
            opportunities: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn hunt(count: u64) -> BotHunt {
        let candidates = (1..=count)
            .map(|n| RepositoryCandidate {
                name: format!("org/bot{n}"),
                url: format!("https://github.com/org/bot{n}"),
                stars: n * 100,
                language: (n % 2 == 0).then(|| "Python".to_string()),
                ..RepositoryCandidate::default()
            })
            .collect();
        RepositoryScorer::default().score(candidates)
    }

    fn write(dir: &Path, name: &str, value: &impl serde::Serialize) {
        fs::write(dir.join(name), serde_json::to_string(value).unwrap()).unwrap();
    }

    #[test]
    fn test_latest_snapshot_by_timestamp_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "bot_hunt_20250510_235959.json",
            "bot_hunt_20250511_093000.json",
            "bot_hunt_20250509_120000.json",
            "bot_hunt_latest.json",
            "market_scan_20250512_000000.json",
        ] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }

        let latest = latest_snapshot(dir.path(), "bot_hunt").unwrap().unwrap();
        assert!(latest.ends_with("bot_hunt_20250511_093000.json"));
        assert_eq!(latest_snapshot(dir.path(), "portfolio").unwrap(), None);
        assert_eq!(latest_snapshot(&dir.path().join("missing"), "portfolio").unwrap(), None);
    }

    #[test]
    fn test_render_bots_and_coins() {
        let latest = LatestResults {
            market: Some(scan(vec![
                coin("Pepe", "PEPE", Some(1.0)),
                coin("Render", "RNDR", None),
                coin("Solana", "SOL", Some(4.0)),
            ])),
            portfolio: None,
            bots: Some(hunt(12)),
        };
        let text = render(&latest, now());

        assert!(text.starts_with("# Cash Knowledge Base\n\n**Harvest Date:** 2025-05-11\n\n"));
        assert!(text.contains("## Top Open-Source Crypto Trading Bots & Frameworks (2025-05-11)\n\n"));
        assert!(text.contains("### 1. [org/bot12](https://github.com/org/bot12)\n- Python, 1200 stars\n- No description\n"));
        assert!(text.contains("### 10. [org/bot3](https://github.com/org/bot3)\n- Unknown, 300 stars\n"));
        assert!(!text.contains("[org/bot2]"));

        assert!(text.contains("### 1. Solana (SOL)\n- Trend Score: 4.00\n"));
        assert!(text.contains("### 3. Render (RNDR)\n- Trend Score: 0.00\n"));
        assert!(text.contains("## Technical Analysis & Market Data Libraries"));
        assert!(text.ends_with(NEXT_STEPS));
    }

    #[test]
    fn test_render_without_bots_skips_libraries() {
        let latest = LatestResults {
            market: Some(scan(vec![coin("Bitcoin", "BTC", Some(0.0))])),
            ..LatestResults::default()
        };
        let text = render(&latest, now());
        assert!(!text.contains("Technical Analysis"));
        assert!(text.contains("## Next Steps"));
    }

    #[test]
    fn test_update_writes_file_from_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        fs::create_dir_all(&results).unwrap();
        write(&results, "market_scan_20250511_093000.json", &scan(vec![coin("Solana", "SOL", Some(2.0))]));
        write(&results, "bot_hunt_20250511_093001.json", &hunt(3));

        let kb = KnowledgeBase::new(dir.path().join(KNOWLEDGE_BASE_FILE));
        assert!(kb.update(&results, now()).unwrap());

        let text = fs::read_to_string(kb.path()).unwrap();
        assert!(text.contains("### 1. Solana (SOL)"));
        assert!(text.contains("### 1. [org/bot3]"));
    }

    #[test]
    fn test_update_without_snapshots_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let kb = KnowledgeBase::new(dir.path().join(KNOWLEDGE_BASE_FILE));

        assert!(!kb.update(dir.path(), now()).unwrap());
        assert!(!kb.path().exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("portfolio_20250511_093000.json"), "not json").unwrap();

        let err = LatestResults::load(dir.path()).unwrap_err();
        assert!(matches!(err, CashError::Serialization(_)));
    }
}
