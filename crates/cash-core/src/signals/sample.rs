//! Sample Signal Sources
//!
//! Fixed payloads standing in for the real feeds. Used by default so a run
//! works offline and produces the same market picture every time.

use async_trait::async_trait;
use rust_decimal_macros::dec;

use super::{GlobalMarket, MarketOverview, SignalSource, TopCoin};
use crate::error::Result;
use crate::model::{Channel, Sentiment, SignalItem, SignalPayload};

/// Sample adapter for one channel
pub struct SampleSource {
    channel: Channel,
}

impl SampleSource {
    pub const fn new(channel: Channel) -> Self {
        Self { channel }
    }

    /// All four channels, in scan order
    pub fn all() -> Vec<Self> {
        vec![
            Self::new(Channel::PriceTrend),
            Self::new(Channel::SocialReddit),
            Self::new(Channel::SocialTwitter),
            Self::new(Channel::News),
        ]
    }

    fn items(&self) -> Vec<SignalItem> {
        match self.channel {
            Channel::PriceTrend => trending_coins(),
            Channel::SocialReddit => reddit_threads(),
            Channel::SocialTwitter => tweets(),
            Channel::News => headlines(),
        }
    }
}

#[async_trait]
impl SignalSource for SampleSource {
    fn id(&self) -> &str {
        self.channel.source_id()
    }

    fn channel(&self) -> Channel {
        self.channel
    }

    async fn fetch(&self) -> Result<Vec<SignalItem>> {
        Ok(self.items())
    }
}

fn trending_coins() -> Vec<SignalItem> {
    // (name, symbol, market cap rank)
    let coins = [
        ("Bitcoin", "BTC", 1),
        ("Ethereum", "ETH", 2),
        ("Solana", "SOL", 5),
        ("Dogecoin", "DOGE", 8),
        ("Pepe", "PEPE", 24),
        ("Render", "RNDR", 41),
    ];

    coins
        .iter()
        .zip(0_u32..)
        .map(|(&(name, symbol, rank), score)| {
            let payload = SignalPayload {
                text: format!("{name} is trending"),
                coin_name: Some(name.to_string()),
                score: Some(f64::from(score)),
                market_cap_rank: Some(rank),
                ..SignalPayload::default()
            };
            SignalItem::new(Channel::PriceTrend, &[symbol], Sentiment::Neutral, payload)
        })
        .collect()
}

fn reddit_threads() -> Vec<SignalItem> {
    vec![
        SignalItem::new(
            Channel::SocialReddit,
            &["BTC", "ETH", "SOL"],
            Sentiment::Neutral,
            SignalPayload::text("Daily Discussion")
                .with_outlet("r/CryptoCurrency")
                .with_url("https://reddit.com/r/CryptoCurrency/comments/daily"),
        ),
        SignalItem::new(
            Channel::SocialReddit,
            &["BTC"],
            Sentiment::Positive,
            SignalPayload::text("Bitcoin breaks $100k!")
                .with_outlet("r/Bitcoin")
                .with_url("https://reddit.com/r/Bitcoin/comments/btc100k"),
        ),
        SignalItem::new(
            Channel::SocialReddit,
            &["PEPE", "DOGE", "SHIB"],
            Sentiment::Bullish,
            SignalPayload::text("What's your moonshot for this week?")
                .with_outlet("r/SatoshiStreetBets")
                .with_url("https://reddit.com/r/SatoshiStreetBets/comments/moonshot"),
        ),
    ]
}

fn tweets() -> Vec<SignalItem> {
    vec![
        SignalItem::new(
            Channel::SocialTwitter,
            &["DOGE"],
            Sentiment::Positive,
            SignalPayload::text("Dogecoin to the moon!")
                .with_outlet("elonmusk")
                .with_url("https://twitter.com/elonmusk/status/doge"),
        ),
        SignalItem::new(
            Channel::SocialTwitter,
            &["ETH"],
            Sentiment::Positive,
            SignalPayload::text("Excited about the latest Ethereum upgrade. Scaling solutions are coming.")
                .with_outlet("VitalikButerin")
                .with_url("https://twitter.com/VitalikButerin/status/eth"),
        ),
        SignalItem::new(
            Channel::SocialTwitter,
            &["BTC", "ETH"],
            Sentiment::Negative,
            SignalPayload::text("Bear market incoming. Protect your assets.")
                .with_outlet("CryptoWhale")
                .with_url("https://twitter.com/CryptoWhale/status/bear"),
        ),
    ]
}

fn headlines() -> Vec<SignalItem> {
    vec![
        SignalItem::new(
            Channel::News,
            &["ETH"],
            Sentiment::Positive,
            SignalPayload::text("SEC Approves Spot Ethereum ETF")
                .with_outlet("bloomberg")
                .with_url("https://example.com/news/eth-etf"),
        ),
        SignalItem::new(
            Channel::News,
            &["BTC"],
            Sentiment::Positive,
            SignalPayload::text("Major Bank Adds Bitcoin to Balance Sheet")
                .with_outlet("cnbc")
                .with_url("https://example.com/news/bank-btc"),
        ),
        SignalItem::new(
            Channel::News,
            &["BNB", "CRO"],
            Sentiment::Neutral,
            SignalPayload::text("New Regulations Coming for Crypto Exchanges")
                .with_outlet("coindesk")
                .with_url("https://example.com/news/regulations"),
        ),
    ]
}

/// Fixed global market numbers and leaderboard
pub struct SampleMarketOverview {
    top_coins: usize,
}

impl SampleMarketOverview {
    /// Leaderboard cut to the first `top_coins` rows
    pub fn new(top_coins: u32) -> Self {
        Self {
            top_coins: usize::try_from(top_coins).unwrap_or(usize::MAX),
        }
    }
}

impl Default for SampleMarketOverview {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl MarketOverview for SampleMarketOverview {
    async fn global(&self) -> Result<GlobalMarket> {
        Ok(GlobalMarket {
            market_cap_change_24h_pct: Some(dec!(2.5)),
            total_market_cap_usd: Some(dec!(2500000000000)),
            total_volume_usd: Some(dec!(150000000000)),
            market_cap_percentage: [("btc".to_string(), dec!(54.2)), ("eth".to_string(), dec!(17.1))]
                .into_iter()
                .collect(),
            source: "coingecko".into(),
        })
    }

    async fn top_coins(&self) -> Result<Vec<TopCoin>> {
        // (id, symbol, name, price, market cap, 24h %, 7d %)
        let leaderboard = [
            ("bitcoin", "BTC", "Bitcoin", dec!(85000), dec!(1685000000000), dec!(1.8), dec!(4.2)),
            ("ethereum", "ETH", "Ethereum", dec!(4500), dec!(541000000000), dec!(2.6), dec!(6.9)),
            ("tether", "USDT", "Tether", dec!(1), dec!(144000000000), dec!(0.01), dec!(-0.02)),
            ("binancecoin", "BNB", "BNB", dec!(750), dec!(109000000000), dec!(-0.4), dec!(1.1)),
            ("solana", "SOL", "Solana", dec!(180), dec!(93000000000), dec!(5.3), dec!(12.7)),
            ("cardano", "ADA", "Cardano", dec!(1.2), dec!(42000000000), dec!(-1.2), dec!(-3.4)),
            ("polkadot", "DOT", "Polkadot", dec!(25), dec!(36000000000), dec!(0.7), dec!(2.5)),
        ];

        Ok(leaderboard
            .into_iter()
            .zip(1_u32..)
            .take(self.top_coins)
            .map(|((id, symbol, name, price, cap, day, week), rank)| TopCoin {
                id: id.into(),
                symbol: symbol.into(),
                name: name.into(),
                current_price: Some(price),
                market_cap: Some(cap),
                market_cap_rank: Some(rank),
                price_change_24h_pct: Some(day),
                price_change_7d_pct: Some(week),
                source: "coingecko".into(),
            })
            .collect())
    }
}
