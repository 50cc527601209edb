//! Exchange Integration
//!
//! Read-only account access for the portfolio check: balances and USD prices.
//! No order placement.

mod binance;
mod simulated;

pub use binance::BinanceClient;
pub use simulated::SimulatedExchange;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ApiKeys;
use crate::error::Result;

/// Quote assets treated as one US dollar
pub const STABLECOINS: [&str; 4] = ["USDT", "USDC", "BUSD", "DAI"];

/// One asset balance on an exchange account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn new(asset: impl Into<String>, free: Decimal, locked: Decimal) -> Self {
        Self {
            asset: asset.into().to_uppercase(),
            free,
            locked,
        }
    }

    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }

    pub fn is_empty(&self) -> bool {
        self.free <= Decimal::ZERO && self.locked <= Decimal::ZERO
    }
}

/// Exchange client trait (Strategy pattern)
///
/// Implement this for each exchange: Binance, Coinbase, Kraken, etc.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Exchange name, recorded as the holding source
    fn name(&self) -> &str;

    /// All balances on the account, including empty ones
    async fn balances(&self) -> Result<Vec<Balance>>;

    /// Current USD price for an asset
    async fn price_usd(&self, asset: &str) -> Result<Decimal>;
}

/// Build the exchange clients that have credentials configured
pub fn exchanges_from_config(keys: &ApiKeys, timeout: Duration) -> Result<Vec<Arc<dyn ExchangeClient>>> {
    let creds = &keys.binance;
    if !creds.is_configured() {
        tracing::warn!("Binance API keys not configured, skipping exchange balances");
        return Ok(Vec::new());
    }

    let client: Arc<dyn ExchangeClient> = if creds.live {
        Arc::new(BinanceClient::new(&creds.api_key, &creds.api_secret, timeout)?)
    } else {
        Arc::new(SimulatedExchange::binance())
    };
    Ok(vec![client])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeCredentials;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_total() {
        let balance = Balance::new("btc", dec!(0.4), dec!(0.1));
        assert_eq!(balance.asset, "BTC");
        assert_eq!(balance.total(), dec!(0.5));
        assert!(!balance.is_empty());
        assert!(Balance::new("ETH", dec!(0), dec!(0)).is_empty());
    }

    #[test]
    fn test_no_credentials_no_exchange() {
        let exchanges = exchanges_from_config(&ApiKeys::default(), Duration::from_secs(5)).unwrap();
        assert!(exchanges.is_empty());
    }

    #[test]
    fn test_credentials_select_simulated_by_default() {
        let keys = ApiKeys {
            binance: ExchangeCredentials {
                api_key: "key".into(),
                api_secret: "secret".into(),
                live: false,
            },
            ..ApiKeys::default()
        };
        let exchanges = exchanges_from_config(&keys, Duration::from_secs(5)).unwrap();
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges[0].name(), "binance");
    }
}
