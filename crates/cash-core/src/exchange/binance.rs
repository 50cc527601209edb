//! Binance Client
//!
//! Signed account endpoint for balances, public ticker endpoint for prices.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;

use super::{Balance, ExchangeClient, STABLECOINS};
use crate::error::{CashError, Result};

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Quote asset used for USD prices
const QUOTE: &str = "USDT";

pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    balances: Vec<Balance>,
}

#[derive(Deserialize)]
struct TickerPrice {
    price: Decimal,
}

impl BinanceClient {
    pub fn new(api_key: &str, api_secret: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Hex HMAC-SHA256 of the query string, keyed by the API secret
    fn sign(&self, query: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| CashError::Exchange(format!("invalid API secret: {e}")))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CashError::Exchange(format!("Binance API error {status}: {body}")));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn balances(&self) -> Result<Vec<Balance>> {
        let query = format!("timestamp={}", Utc::now().timestamp_millis());
        let signature = self.sign(&query)?;
        let url = format!("{}/api/v3/account?{query}&signature={signature}", self.base_url);

        let request = self.client.get(url).header("X-MBX-APIKEY", &self.api_key);
        let account: AccountResponse = self.send(request).await?;
        Ok(account.balances)
    }

    async fn price_usd(&self, asset: &str) -> Result<Decimal> {
        let asset = asset.to_uppercase();
        if STABLECOINS.contains(&asset.as_str()) {
            return Ok(Decimal::ONE);
        }

        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let request = self.client.get(url).query(&[("symbol", format!("{asset}{QUOTE}"))]);
        let ticker: TickerPrice = self
            .send(request)
            .await
            .map_err(|e| match e {
                CashError::Exchange(_) => CashError::PriceUnavailable(asset.clone()),
                other => other,
            })?;
        Ok(ticker.price)
    }
}
