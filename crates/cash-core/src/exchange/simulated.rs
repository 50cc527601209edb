//! Simulated Exchange
//!
//! For testing and demo purposes. Returns a fixed account and static prices.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{Balance, ExchangeClient};
use crate::error::{CashError, Result};

/// Exchange with a fixed account and price table
pub struct SimulatedExchange {
    name: String,
    balances: Vec<Balance>,
    prices: Vec<(String, Decimal)>,
}

impl SimulatedExchange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            balances: Vec::new(),
            prices: Vec::new(),
        }
    }

    /// Demo Binance account: BTC, ETH, BNB and USDT
    pub fn binance() -> Self {
        Self::new("binance")
            .with_balance("BTC", dec!(0.5))
            .with_balance("ETH", dec!(5.0))
            .with_balance("BNB", dec!(10.0))
            .with_balance("USDT", dec!(1000.0))
            .with_price("BTC", dec!(85000))
            .with_price("ETH", dec!(4500))
            .with_price("BNB", dec!(750))
            .with_price("SOL", dec!(180))
            .with_price("ADA", dec!(1.2))
            .with_price("DOT", dec!(25))
            .with_price("USDT", dec!(1))
    }

    pub fn with_balance(mut self, asset: &str, free: Decimal) -> Self {
        self.balances.push(Balance::new(asset, free, Decimal::ZERO));
        self
    }

    pub fn with_price(mut self, asset: &str, price: Decimal) -> Self {
        self.prices.push((asset.to_uppercase(), price));
        self
    }
}

#[async_trait]
impl ExchangeClient for SimulatedExchange {
    fn name(&self) -> &str {
        &self.name
    }

    async fn balances(&self) -> Result<Vec<Balance>> {
        Ok(self.balances.clone())
    }

    async fn price_usd(&self, asset: &str) -> Result<Decimal> {
        let asset = asset.to_uppercase();
        self.prices
            .iter()
            .find(|(symbol, _)| *symbol == asset)
            .map(|(_, price)| *price)
            .ok_or(CashError::PriceUnavailable(asset))
    }
}
