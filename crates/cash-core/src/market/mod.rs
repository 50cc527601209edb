//! Market Scan
//!
//! Fans out to every configured signal source, then merges their items into
//! trending-coin opportunities and negative-sentiment warnings.
//!
//! ```text
//!   coingecko ─┐
//!   reddit    ─┤  JoinSet   ┌──────────────┐   opportunities
//!   twitter   ─┼──────────▶ │  aggregate() │ ▶ warnings
//!   news      ─┘            └──────────────┘
//! ```

mod aggregator;

pub use aggregator::{aggregate, Aggregation, MIN_SOURCES};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio::time::error::Elapsed;

use crate::config::WorkflowContext;
use crate::error::Result;
use crate::model::{Channel, Opportunity, RiskFlag, RiskKind, SignalItem, Warning};
use crate::signals::{
    sources_from_config, CoinGeckoSource, GlobalMarket, MarketOverview, SampleMarketOverview,
    SignalSource, SourceOutcome, TopCoin,
};

/// A coin from the price-trend channel, as listed in reports
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub name: String,
    pub symbol: String,
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
}

/// Everything one market scan produced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketScan {
    pub timestamp: DateTime<Utc>,
    pub trending_coins: Vec<TrendingCoin>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalMarket>,

    /// Market-cap leaderboard, `market_scan.top_coins` rows
    #[serde(default)]
    pub top_coins: Vec<TopCoin>,

    /// Raw items grouped by source, in source order
    pub signals: Vec<SignalItem>,

    pub opportunities: Vec<Opportunity>,
    pub warnings: Vec<Warning>,
}

impl MarketScan {
    /// Whether the scan has anything worth reporting
    pub fn has_data(&self) -> bool {
        !self.signals.is_empty()
            || self.global.is_some()
            || !self.top_coins.is_empty()
            || !self.warnings.is_empty()
    }
}

pub struct MarketScanner {
    sources: Vec<Arc<dyn SignalSource>>,
    overview: Option<Arc<dyn MarketOverview>>,
    timeout: Duration,
}

impl MarketScanner {
    pub fn new(sources: Vec<Arc<dyn SignalSource>>, timeout: Duration) -> Self {
        Self {
            sources,
            overview: None,
            timeout,
        }
    }

    pub fn with_overview(mut self, overview: Arc<dyn MarketOverview>) -> Self {
        self.overview = Some(overview);
        self
    }

    /// Build the scanner from the `market_scan` config section
    pub fn from_context(ctx: &WorkflowContext) -> Result<Self> {
        let scan = &ctx.config.market_scan;
        let timeout = Duration::from_secs(scan.request_timeout_secs);
        let sources = sources_from_config(scan, &ctx.config.api_keys.coingecko)?;
        let scanner = Self::new(sources, timeout);

        let wants_overview = scan
            .sources
            .iter()
            .any(|s| s.eq_ignore_ascii_case(Channel::PriceTrend.source_id()));
        if !wants_overview {
            return Ok(scanner);
        }

        let overview: Arc<dyn MarketOverview> = if scan.live {
            Arc::new(CoinGeckoSource::new(
                &ctx.config.api_keys.coingecko,
                scan.top_coins,
                timeout,
            )?)
        } else {
            Arc::new(SampleMarketOverview::new(scan.top_coins))
        };
        Ok(scanner.with_overview(overview))
    }

    /// Run every source concurrently and aggregate the results
    ///
    /// Never fails: a source that errors, panics or times out becomes a
    /// `source_error` warning and the rest of the scan continues.
    pub async fn scan(&self) -> MarketScan {
        tracing::info!(sources = self.sources.len(), "Starting market scan");

        let mut tasks = JoinSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let timeout = self.timeout;
            tasks.spawn(async move { (index, SourceOutcome::collect(source, timeout).await) });
        }

        let overview_task = self.overview.as_ref().map(|overview| {
            let overview = Arc::clone(overview);
            let timeout = self.timeout;
            tokio::spawn(async move {
                tokio::join!(
                    tokio::time::timeout(timeout, overview.global()),
                    tokio::time::timeout(timeout, overview.top_coins()),
                )
            })
        });

        let mut outcomes: Vec<Option<SourceOutcome>> = vec![None; self.sources.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "Source task aborted"),
            }
        }

        let mut signals = Vec::new();
        let mut warnings = Vec::new();
        for (source, outcome) in self.sources.iter().zip(outcomes) {
            match outcome {
                Some(SourceOutcome::Fetched { items, .. }) => signals.extend(items),
                Some(SourceOutcome::Failed { warning, .. }) => warnings.push(warning),
                None => warnings.push(
                    RiskFlag::new(
                        RiskKind::SourceError,
                        format!("Failed to scan {}: task aborted", source.id()),
                    )
                    .with_source(source.id()),
                ),
            }
        }

        let (global, top_coins) = match overview_task {
            Some(handle) => match handle.await {
                Ok((global, top_coins)) => (
                    overview_part("global market data", global, &mut warnings),
                    overview_part("top coins", top_coins, &mut warnings).unwrap_or_default(),
                ),
                Err(e) => {
                    tracing::error!(error = %e, "Market overview task aborted");
                    warnings.push(overview_warning("market overview", "task aborted"));
                    (None, Vec::new())
                }
            },
            None => (None, Vec::new()),
        };

        let Aggregation {
            opportunities,
            warnings: sentiment_warnings,
        } = aggregate(&signals);
        warnings.extend(sentiment_warnings);

        let scan = MarketScan {
            timestamp: Utc::now(),
            trending_coins: trending_coins(&signals),
            global,
            top_coins,
            signals,
            opportunities,
            warnings,
        };

        tracing::info!(
            items = scan.signals.len(),
            opportunities = scan.opportunities.len(),
            warnings = scan.warnings.len(),
            "Market scan complete"
        );
        scan
    }
}

fn overview_part<T>(
    what: &str,
    result: std::result::Result<Result<T>, Elapsed>,
    warnings: &mut Vec<Warning>,
) -> Option<T> {
    let reason = match result {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(e)) => e.to_string(),
        Err(_) => "timed out".to_string(),
    };
    tracing::error!(part = what, reason = %reason, "Market overview fetch failed");
    warnings.push(overview_warning(what, &reason));
    None
}

fn overview_warning(what: &str, reason: &str) -> Warning {
    let source = Channel::PriceTrend.source_id();
    RiskFlag::new(
        RiskKind::SourceError,
        format!("Failed to fetch {what} from {source}: {reason}"),
    )
    .with_source(source)
}

fn trending_coins(signals: &[SignalItem]) -> Vec<TrendingCoin> {
    signals
        .iter()
        .filter(|item| item.channel == Channel::PriceTrend)
        .filter_map(|item| {
            let symbol = item.asset_symbols.first()?.clone();
            Some(TrendingCoin {
                name: item.payload.coin_name.clone().unwrap_or_else(|| symbol.clone()),
                symbol,
                source: item.source_id.clone(),
                score: item.payload.score,
                market_cap_rank: item.payload.market_cap_rank,
            })
        })
        .collect()
}
