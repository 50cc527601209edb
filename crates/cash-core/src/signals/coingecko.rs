//! CoinGecko Source
//!
//! Live trending coins, global market stats and the market-cap leaderboard
//! from the public CoinGecko API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{GlobalMarket, MarketOverview, SignalSource, TopCoin};
use crate::error::{CashError, Result};
use crate::model::{Channel, Sentiment, SignalItem, SignalPayload};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Largest page `/coins/markets` serves
const MAX_PER_PAGE: u32 = 250;

pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    top_coins: u32,
}

impl CoinGeckoSource {
    pub fn new(api_key: &str, top_coins: u32, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cash-daily/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
            api_key: Some(api_key.trim().to_string()).filter(|k| !k.is_empty()),
            top_coins,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let mut request = self.client.get(format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CashError::source_fetch(
                Channel::PriceTrend.source_id(),
                format!("{path} returned HTTP {status}"),
            ));
        }

        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingEntry>,
}

#[derive(Deserialize)]
struct TrendingEntry {
    item: TrendingCoin,
}

#[derive(Deserialize)]
struct TrendingCoin {
    #[serde(default)]
    id: String,
    name: String,
    symbol: String,
    market_cap_rank: Option<u32>,
    score: Option<f64>,
}

#[derive(Deserialize)]
struct MarketEntry {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    market_cap_rank: Option<u32>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
}

#[derive(Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Deserialize)]
struct GlobalData {
    market_cap_change_percentage_24h_usd: Option<f64>,
    #[serde(default)]
    total_market_cap: BTreeMap<String, f64>,
    #[serde(default)]
    total_volume: BTreeMap<String, f64>,
    #[serde(default)]
    market_cap_percentage: BTreeMap<String, f64>,
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value).map(|d| d.round_dp(4))
}

#[async_trait]
impl SignalSource for CoinGeckoSource {
    fn id(&self) -> &str {
        Channel::PriceTrend.source_id()
    }

    fn channel(&self) -> Channel {
        Channel::PriceTrend
    }

    async fn fetch(&self) -> Result<Vec<SignalItem>> {
        let trending: TrendingResponse = self.get("/search/trending").await?;

        let items = trending
            .coins
            .into_iter()
            .map(|entry| {
                let coin = entry.item;
                let payload = SignalPayload {
                    text: format!("{} is trending", coin.name),
                    url: Some(format!("https://www.coingecko.com/en/coins/{}", coin.id)),
                    coin_name: Some(coin.name),
                    score: coin.score,
                    market_cap_rank: coin.market_cap_rank,
                    ..SignalPayload::default()
                };
                SignalItem::new(Channel::PriceTrend, &[coin.symbol], Sentiment::Neutral, payload)
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl MarketOverview for CoinGeckoSource {
    async fn global(&self) -> Result<GlobalMarket> {
        let global: GlobalResponse = self.get("/global").await?;
        let data = global.data;

        Ok(GlobalMarket {
            market_cap_change_24h_pct: data.market_cap_change_percentage_24h_usd.and_then(to_decimal),
            total_market_cap_usd: data.total_market_cap.get("usd").copied().and_then(to_decimal),
            total_volume_usd: data.total_volume.get("usd").copied().and_then(to_decimal),
            market_cap_percentage: data
                .market_cap_percentage
                .into_iter()
                .filter_map(|(symbol, pct)| to_decimal(pct).map(|p| (symbol, p)))
                .collect(),
            source: Channel::PriceTrend.source_id().into(),
        })
    }

    async fn top_coins(&self) -> Result<Vec<TopCoin>> {
        let per_page = self.top_coins.clamp(1, MAX_PER_PAGE);
        let path = format!(
            "/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={per_page}&page=1&price_change_percentage=24h,7d"
        );
        let markets: Vec<MarketEntry> = self.get(&path).await?;
        Ok(markets.into_iter().map(top_coin).collect())
    }
}

fn top_coin(entry: MarketEntry) -> TopCoin {
    TopCoin {
        id: entry.id,
        symbol: entry.symbol.to_uppercase(),
        name: entry.name,
        current_price: entry.current_price.and_then(to_decimal),
        market_cap: entry.market_cap.and_then(to_decimal),
        market_cap_rank: entry.market_cap_rank,
        price_change_24h_pct: entry.price_change_percentage_24h.and_then(to_decimal),
        price_change_7d_pct: entry.price_change_percentage_7d_in_currency.and_then(to_decimal),
        source: Channel::PriceTrend.source_id().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_payload_shape() {
        let raw = r#"{"coins": [{"item": {"id": "pepe", "name": "Pepe", "symbol": "pepe", "market_cap_rank": 24, "score": 0, "price_btc": 1.2e-10}}]}"#;
        let parsed: TrendingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.coins.len(), 1);
        assert_eq!(parsed.coins[0].item.symbol, "pepe");
        assert_eq!(parsed.coins[0].item.market_cap_rank, Some(24));
    }

    #[test]
    fn test_global_payload_shape() {
        let raw = r#"{"data": {"market_cap_change_percentage_24h_usd": -1.25, "total_market_cap": {"usd": 2.4e12}, "total_volume": {"usd": 9.1e10}, "market_cap_percentage": {"btc": 55.1}}}"#;
        let parsed: GlobalResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.total_market_cap.get("usd").copied(), Some(2.4e12));
        assert_eq!(to_decimal(-1.25), Some(Decimal::new(-125, 2)));
    }

    #[test]
    fn test_markets_payload_shape() {
        let raw = r#"[{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 85000.5, "market_cap": 1.68e12, "market_cap_rank": 1, "price_change_percentage_24h": -0.75, "price_change_percentage_7d_in_currency": 3.2, "total_volume": 3.1e10}]"#;
        let parsed: Vec<MarketEntry> = serde_json::from_str(raw).unwrap();
        let coin = top_coin(parsed.into_iter().next().unwrap());

        assert_eq!(coin.symbol, "BTC");
        assert_eq!(coin.market_cap_rank, Some(1));
        assert_eq!(coin.current_price, Some(Decimal::new(850_005, 1)));
        assert_eq!(coin.price_change_24h_pct, Some(Decimal::new(-75, 2)));
        assert_eq!(coin.price_change_7d_pct, Some(Decimal::new(32, 1)));
    }

    #[test]
    fn test_missing_market_fields_are_none() {
        let raw = r#"[{"id": "newcoin", "symbol": "new", "name": "New", "current_price": null, "market_cap_rank": null}]"#;
        let parsed: Vec<MarketEntry> = serde_json::from_str(raw).unwrap();
        let coin = top_coin(parsed.into_iter().next().unwrap());
        assert_eq!(coin.current_price, None);
        assert_eq!(coin.price_change_7d_pct, None);
    }

    #[test]
    fn test_blank_key_is_not_sent() {
        let source = CoinGeckoSource::new("  ", 10, Duration::from_secs(5)).unwrap();
        assert!(source.api_key.is_none());
    }
}
