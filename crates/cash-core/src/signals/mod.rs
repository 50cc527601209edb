//! Signal Sources
//!
//! One adapter per external channel (price trends, two social feeds, news).
//! Adapters never share state; the scanner runs them as independent tasks and
//! turns every failure into a tagged [`SourceOutcome::Failed`].

mod coingecko;
mod sample;

pub use coingecko::CoinGeckoSource;
pub use sample::{SampleMarketOverview, SampleSource};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MarketScanConfig;
use crate::error::{CashError, Result};
use crate::model::{Channel, RiskFlag, RiskKind, SignalItem, Warning};

/// Signal source trait (Strategy pattern)
///
/// Implement this for each feed: CoinGecko, Reddit, Twitter, a news API, etc.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Source identifier recorded on produced items
    fn id(&self) -> &str;

    fn channel(&self) -> Channel;

    /// Fetch the current batch of symbol-tagged items
    async fn fetch(&self) -> Result<Vec<SignalItem>>;
}

/// Whole-market statistics from the price-trend channel
#[async_trait]
pub trait MarketOverview: Send + Sync {
    async fn global(&self) -> Result<GlobalMarket>;

    /// Largest coins by market cap, biggest first
    async fn top_coins(&self) -> Result<Vec<TopCoin>>;
}

/// Global market snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMarket {
    pub market_cap_change_24h_pct: Option<Decimal>,
    pub total_market_cap_usd: Option<Decimal>,
    pub total_volume_usd: Option<Decimal>,

    /// Dominance by symbol, in percent
    #[serde(default)]
    pub market_cap_percentage: BTreeMap<String, Decimal>,

    pub source: String,
}

/// One row of the market-cap leaderboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    pub price_change_24h_pct: Option<Decimal>,
    pub price_change_7d_pct: Option<Decimal>,
    pub source: String,
}

/// Result of running one adapter
#[derive(Clone, Debug, PartialEq)]
pub enum SourceOutcome {
    Fetched {
        source_id: String,
        items: Vec<SignalItem>,
    },
    Failed {
        source_id: String,
        warning: Warning,
    },
}

impl SourceOutcome {
    /// Run a source under a timeout, never propagating its error
    pub async fn collect(source: Arc<dyn SignalSource>, timeout: Duration) -> Self {
        let source_id = source.id().to_string();
        tracing::info!(source = %source_id, "Scanning source");

        let result = match tokio::time::timeout(timeout, source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(CashError::source_fetch(
                &source_id,
                format!("timed out after {}s", timeout.as_secs()),
            )),
        };

        match result {
            Ok(items) => {
                tracing::debug!(source = %source_id, items = items.len(), "Source returned items");
                Self::Fetched { source_id, items }
            }
            Err(e) => {
                tracing::error!(source = %source_id, error = %e, "Source scan failed");
                let warning = RiskFlag::new(
                    RiskKind::SourceError,
                    format!("Failed to scan {source_id}: {e}"),
                )
                .with_source(&source_id);
                Self::Failed { source_id, warning }
            }
        }
    }

    pub fn source_id(&self) -> &str {
        match self {
            Self::Fetched { source_id, .. } | Self::Failed { source_id, .. } => source_id,
        }
    }
}

/// Build the adapters named in the scan config
///
/// Unknown ids are skipped with a warning log.
pub fn sources_from_config(
    config: &MarketScanConfig,
    coingecko_key: &str,
) -> Result<Vec<Arc<dyn SignalSource>>> {
    let mut sources: Vec<Arc<dyn SignalSource>> = Vec::new();

    for id in &config.sources {
        let channel = match id.to_lowercase().as_str() {
            "coingecko" => Channel::PriceTrend,
            "reddit" => Channel::SocialReddit,
            "twitter" => Channel::SocialTwitter,
            "news" => Channel::News,
            other => {
                tracing::warn!(source = other, "Unknown market source, skipping");
                continue;
            }
        };

        if channel == Channel::PriceTrend && config.live {
            sources.push(Arc::new(CoinGeckoSource::new(
                coingecko_key,
                config.top_coins,
                Duration::from_secs(config.request_timeout_secs),
            )?));
        } else {
            sources.push(Arc::new(SampleSource::new(channel)));
        }
    }

    Ok(sources)
}
