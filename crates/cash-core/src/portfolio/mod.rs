//! Portfolio Check
//!
//! Collects holdings from exchanges, tracked wallets and the manual list,
//! values them in USD and flags concentration risk and staking candidates.

mod performance;
mod wallet;

pub use performance::{FixedPerformance, HistoryPerformance, PerformanceSource};
pub use wallet::{abbreviate, PlaceholderWallets, WalletLookup};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{ManualHolding, WorkflowContext};
use crate::error::Result;
use crate::exchange::{exchanges_from_config, ExchangeClient};
use crate::ledger::PortfolioHistory;
use crate::model::{apply_allocations, Holding, Opportunity, Performance, RiskFlag, RiskKind};

/// Allocation above which a holding is a concentration risk, in percent
pub const CONCENTRATION_THRESHOLD_PCT: u32 = 20;

/// Assets that can be staked for yield
pub const STAKEABLE_ASSETS: [&str; 4] = ["ETH", "SOL", "ADA", "DOT"];

/// Valued holdings plus the risks and opportunities found in them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub timestamp: DateTime<Utc>,
    pub holdings: Vec<Holding>,
    pub total_value_usd: Decimal,
    pub performance: Performance,
    pub risks: Vec<RiskFlag>,
    pub opportunities: Vec<Opportunity>,
}

impl PortfolioReport {
    /// Holdings or risks worth reporting
    pub fn has_data(&self) -> bool {
        !self.holdings.is_empty() || !self.risks.is_empty()
    }
}

pub struct PortfolioEvaluator {
    exchanges: Vec<Arc<dyn ExchangeClient>>,
    wallets: Arc<dyn WalletLookup>,
    performance: Arc<dyn PerformanceSource>,
    track_wallets: Vec<String>,
    manual_holdings: BTreeMap<String, ManualHolding>,
}

impl PortfolioEvaluator {
    pub fn new(performance: Arc<dyn PerformanceSource>) -> Self {
        Self {
            exchanges: Vec::new(),
            wallets: Arc::new(PlaceholderWallets),
            performance,
            track_wallets: Vec::new(),
            manual_holdings: BTreeMap::new(),
        }
    }

    pub fn with_exchange(mut self, exchange: Arc<dyn ExchangeClient>) -> Self {
        self.exchanges.push(exchange);
        self
    }

    pub fn with_wallet_lookup(mut self, wallets: Arc<dyn WalletLookup>) -> Self {
        self.wallets = wallets;
        self
    }

    pub fn with_wallets(mut self, addresses: Vec<String>) -> Self {
        self.track_wallets = addresses;
        self
    }

    pub fn with_manual_holdings(mut self, holdings: BTreeMap<String, ManualHolding>) -> Self {
        self.manual_holdings = holdings;
        self
    }

    /// Wire exchanges, wallets and history-based performance from config
    pub fn from_context(ctx: &WorkflowContext) -> Result<Self> {
        let timeout = Duration::from_secs(ctx.config.market_scan.request_timeout_secs);
        let history = PortfolioHistory::in_dir(&ctx.paths.logs_dir);

        let mut evaluator = Self::new(Arc::new(HistoryPerformance::new(history)))
            .with_wallets(ctx.config.portfolio.track_wallets.clone())
            .with_manual_holdings(ctx.config.portfolio.manual_holdings.clone());
        for exchange in exchanges_from_config(&ctx.config.api_keys, timeout)? {
            evaluator = evaluator.with_exchange(exchange);
        }
        Ok(evaluator)
    }

    /// Run the full check. Per-source failures become risks, never errors.
    pub async fn evaluate(&self) -> PortfolioReport {
        tracing::info!(
            exchanges = self.exchanges.len(),
            wallets = self.track_wallets.len(),
            manual = self.manual_holdings.len(),
            "Checking portfolio"
        );

        let mut holdings = Vec::new();
        let mut risks = Vec::new();
        let mut known_prices: HashMap<String, Decimal> = HashMap::new();

        self.exchange_holdings(&mut holdings, &mut risks, &mut known_prices).await;
        self.wallet_holdings(&mut holdings, &mut risks).await;
        self.manual_entries(&mut holdings, &known_prices).await;

        let total_value_usd = apply_allocations(&mut holdings);
        let now = Utc::now();
        let performance = self
            .performance
            .performance(total_value_usd, now)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Performance unavailable");
                Performance::default()
            });

        risks.extend(concentration_risks(&holdings));
        let opportunities = staking_opportunities(&holdings);

        tracing::info!(
            holdings = holdings.len(),
            total_usd = %total_value_usd.round_dp(2),
            risks = risks.len(),
            opportunities = opportunities.len(),
            "Portfolio check complete"
        );

        PortfolioReport {
            timestamp: now,
            holdings,
            total_value_usd,
            performance,
            risks,
            opportunities,
        }
    }

    async fn exchange_holdings(
        &self,
        holdings: &mut Vec<Holding>,
        risks: &mut Vec<RiskFlag>,
        known_prices: &mut HashMap<String, Decimal>,
    ) {
        for exchange in &self.exchanges {
            let name = exchange.name();
            tracing::info!(exchange = name, "Checking exchange balances");

            let balances = match exchange.balances().await {
                Ok(balances) => balances,
                Err(e) => {
                    tracing::error!(exchange = name, error = %e, "Exchange balance check failed");
                    risks.push(
                        RiskFlag::new(RiskKind::ExchangeError, format!("Failed to check balances: {e}"))
                            .with_subject(name),
                    );
                    continue;
                }
            };

            for balance in balances.iter().filter(|b| !b.is_empty()) {
                match exchange.price_usd(&balance.asset).await {
                    Ok(price) => {
                        known_prices.insert(balance.asset.to_uppercase(), price);
                        holdings.push(Holding::new(&balance.asset, balance.total(), price, name));
                    }
                    Err(e) => {
                        tracing::error!(exchange = name, asset = %balance.asset, error = %e, "Exchange price lookup failed");
                        risks.push(
                            RiskFlag::new(
                                RiskKind::ExchangeError,
                                format!("Failed to price {} on {name}: {e}", balance.asset),
                            )
                            .with_subject(&balance.asset)
                            .with_source(name),
                        );
                    }
                }
            }
        }
    }

    async fn wallet_holdings(&self, holdings: &mut Vec<Holding>, risks: &mut Vec<RiskFlag>) {
        for address in &self.track_wallets {
            match self.wallets.holdings(address).await {
                Ok(found) => holdings.extend(found),
                Err(e) => {
                    tracing::error!(wallet = %address, error = %e, "Wallet check failed");
                    risks.push(
                        RiskFlag::new(RiskKind::WalletError, format!("Failed to check balance: {e}"))
                            .with_subject(address),
                    );
                }
            }
        }
    }

    async fn manual_entries(&self, holdings: &mut Vec<Holding>, known_prices: &HashMap<String, Decimal>) {
        for (asset, manual) in &self.manual_holdings {
            let asset = asset.to_uppercase();
            let price = match manual.price_usd {
                Some(price) => price,
                None => match known_prices.get(&asset) {
                    Some(price) => *price,
                    None => self.lookup_price(&asset).await,
                },
            };
            holdings.push(Holding::new(asset, manual.balance, price, "manual"));
        }
    }

    /// First exchange that quotes the asset, otherwise zero
    async fn lookup_price(&self, asset: &str) -> Decimal {
        for exchange in &self.exchanges {
            match exchange.price_usd(asset).await {
                Ok(price) => return price,
                Err(e) => tracing::debug!(exchange = exchange.name(), asset, error = %e, "Price lookup failed"),
            }
        }
        tracing::warn!(asset, "No price for manual holding, valuing at zero");
        Decimal::ZERO
    }
}

fn concentration_risks(holdings: &[Holding]) -> Vec<RiskFlag> {
    let threshold = Decimal::from(CONCENTRATION_THRESHOLD_PCT);
    holdings
        .iter()
        .filter(|h| h.allocation_pct > threshold)
        .map(|h| {
            RiskFlag::new(
                RiskKind::ConcentrationRisk,
                format!(
                    "High concentration in {} ({:.1}% of portfolio)",
                    h.asset,
                    h.allocation_pct.round_dp(1)
                ),
            )
            .with_subject(&h.asset)
            .with_score(h.allocation_pct.to_f64().unwrap_or_default())
        })
        .collect()
}

fn staking_opportunities(holdings: &[Holding]) -> Vec<Opportunity> {
    holdings
        .iter()
        .filter(|h| STAKEABLE_ASSETS.contains(&h.asset.as_str()))
        .map(|h| Opportunity::staking(&h.asset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CashError;
    use crate::exchange::{Balance, SimulatedExchange};
    use crate::model::OpportunityKind;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct DownExchange;

    #[async_trait]
    impl ExchangeClient for DownExchange {
        fn name(&self) -> &str {
            "kraken"
        }

        async fn balances(&self) -> Result<Vec<Balance>> {
            Err(CashError::Exchange("HTTP 503".into()))
        }

        async fn price_usd(&self, asset: &str) -> Result<Decimal> {
            Err(CashError::PriceUnavailable(asset.into()))
        }
    }

    fn manual(balance: Decimal, price: Option<Decimal>) -> ManualHolding {
        ManualHolding {
            balance,
            price_usd: price,
        }
    }

    fn evaluator() -> PortfolioEvaluator {
        PortfolioEvaluator::new(Arc::new(FixedPerformance(Performance::default())))
    }

    #[tokio::test]
    async fn test_two_asset_scenario() {
        let holdings = BTreeMap::from([
            ("BTC".to_string(), manual(dec!(0.5), Some(dec!(85000)))),
            ("ETH".to_string(), manual(dec!(5), Some(dec!(4500)))),
        ]);
        let report = evaluator().with_manual_holdings(holdings).evaluate().await;

        assert_eq!(report.total_value_usd, dec!(65000));
        let btc = report.holdings.iter().find(|h| h.asset == "BTC").unwrap();
        let eth = report.holdings.iter().find(|h| h.asset == "ETH").unwrap();
        assert_eq!(btc.allocation_pct.round_dp(2), dec!(65.38));
        assert_eq!(eth.allocation_pct.round_dp(2), dec!(34.62));

        let btc_risk = report
            .risks
            .iter()
            .find(|r| r.subject.as_deref() == Some("BTC"))
            .unwrap();
        assert_eq!(btc_risk.kind, RiskKind::ConcentrationRisk);
        assert_eq!(btc_risk.message, "High concentration in BTC (65.4% of portfolio)");

        assert_eq!(report.opportunities.len(), 1);
        assert_eq!(report.opportunities[0].kind, OpportunityKind::Staking);
        assert_eq!(report.opportunities[0].asset, "ETH");
    }

    #[tokio::test]
    async fn test_simulated_exchange_and_price_fallback() {
        let holdings = BTreeMap::from([
            ("BTC".to_string(), manual(dec!(0.1), None)),
            ("SOL".to_string(), manual(dec!(10), None)),
            ("XYZ".to_string(), manual(dec!(3), None)),
        ]);
        let report = evaluator()
            .with_exchange(Arc::new(SimulatedExchange::binance()))
            .with_manual_holdings(holdings)
            .evaluate()
            .await;

        let from_exchange: Vec<_> = report.holdings.iter().filter(|h| h.source == "binance").collect();
        assert_eq!(from_exchange.len(), 4);

        let manual_price = |asset: &str| {
            report
                .holdings
                .iter()
                .find(|h| h.source == "manual" && h.asset == asset)
                .map(|h| h.price_usd)
        };
        assert_eq!(manual_price("BTC"), Some(dec!(85000)));
        assert_eq!(manual_price("SOL"), Some(dec!(180)));
        assert_eq!(manual_price("XYZ"), Some(Decimal::ZERO));

        let sum: Decimal = report.holdings.iter().map(|h| h.allocation_pct).sum();
        assert!((sum - dec!(100)).abs() < dec!(0.0001));
    }

    #[tokio::test]
    async fn test_unpriced_exchange_asset_is_risk_not_holding() {
        let exchange = SimulatedExchange::new("binance")
            .with_balance("XYZ", dec!(3))
            .with_balance("BTC", dec!(1))
            .with_price("BTC", dec!(10));
        let report = evaluator().with_exchange(Arc::new(exchange)).evaluate().await;

        let assets: Vec<_> = report.holdings.iter().map(|h| h.asset.as_str()).collect();
        assert_eq!(assets, vec!["BTC"]);
        assert_eq!(report.total_value_usd, dec!(10));
        assert_eq!(report.holdings[0].allocation_pct, dec!(100));

        let priced = &report.risks[0];
        assert_eq!(priced.kind, RiskKind::ExchangeError);
        assert_eq!(priced.subject.as_deref(), Some("XYZ"));
        assert_eq!(priced.source.as_deref(), Some("binance"));
        assert!(priced.message.starts_with("Failed to price XYZ on binance: "));
        assert_eq!(report.risks[1].kind, RiskKind::ConcentrationRisk);
    }

    #[tokio::test]
    async fn test_failures_become_risks() {
        let report = evaluator()
            .with_exchange(Arc::new(DownExchange))
            .with_wallets(vec!["bad".into(), "0x1234567890abcdef1234567890abcdef12345678".into()])
            .evaluate()
            .await;

        let kinds: Vec<_> = report.risks.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RiskKind::ExchangeError, RiskKind::WalletError]);
        assert_eq!(report.risks[0].subject.as_deref(), Some("kraken"));

        // the good wallet still contributes its placeholder
        assert_eq!(report.holdings.len(), 1);
        assert_eq!(report.total_value_usd, Decimal::ZERO);
        assert!(report.holdings[0].allocation_pct.is_zero());
    }

    #[tokio::test]
    async fn test_empty_portfolio() {
        let report = evaluator().evaluate().await;
        assert!(!report.has_data());
        assert!(report.risks.is_empty());
        assert!(report.opportunities.is_empty());
    }
}
