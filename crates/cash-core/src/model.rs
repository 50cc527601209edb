//! Domain Models
//!
//! Types shared by the market scan, the portfolio check, the playbook and the
//! ledger. Uses `rust_decimal` for all monetary values - never use f64 for money!

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Mood attached to a signal item by its source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Bullish,
}

/// The four channel types a signal can come from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    PriceTrend,
    SocialReddit,
    SocialTwitter,
    News,
}

impl Channel {
    /// Number of known channel types, used to normalise confidence
    pub const COUNT: usize = 4;

    /// Source identifier recorded on items from this channel
    pub const fn source_id(self) -> &'static str {
        match self {
            Self::PriceTrend => "coingecko",
            Self::SocialReddit => "reddit",
            Self::SocialTwitter => "twitter",
            Self::News => "news",
        }
    }
}

/// Free-form content carried by a signal item
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    /// Headline, post title or tweet text
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Author, subreddit or news outlet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet: Option<String>,

    /// Full coin name (price-trend items)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_name: Option<String>,

    /// Trending score (price-trend items)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
}

impl SignalPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_outlet(mut self, outlet: impl Into<String>) -> Self {
        self.outlet = Some(outlet.into());
        self
    }
}

/// One symbol-tagged item produced by a signal source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalItem {
    pub source_id: String,
    pub channel: Channel,

    /// Uppercased, de-duplicated, in the order the source listed them
    pub asset_symbols: Vec<String>,

    pub sentiment: Sentiment,
    pub payload: SignalPayload,
}

impl SignalItem {
    pub fn new<S: AsRef<str>>(
        channel: Channel,
        symbols: &[S],
        sentiment: Sentiment,
        payload: SignalPayload,
    ) -> Self {
        let mut asset_symbols: Vec<String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_uppercase();
            if !symbol.is_empty() && !asset_symbols.contains(&symbol) {
                asset_symbols.push(symbol);
            }
        }

        Self {
            source_id: channel.source_id().to_string(),
            channel,
            asset_symbols,
            sentiment,
            payload,
        }
    }

    pub fn mentions(&self, symbol: &str) -> bool {
        self.asset_symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    TrendingCoin,
    Staking,
}

/// A derived record pointing at something worth acting on
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    pub asset: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Distinct source ids in discovery order
    pub sources: Vec<String>,

    /// `sources.len() / 4.0`, in `[0, 1]`
    pub confidence: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Opportunity {
    pub fn trending(asset: impl Into<String>, name: Option<String>, sources: Vec<String>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let confidence = (sources.len() as f64 / Channel::COUNT as f64).min(1.0);
        Self {
            kind: OpportunityKind::TrendingCoin,
            asset: asset.into(),
            name,
            sources,
            confidence,
            message: None,
        }
    }

    pub fn staking(asset: impl Into<String>) -> Self {
        let asset = asset.into();
        Self {
            kind: OpportunityKind::Staking,
            message: Some(format!("Consider staking {asset} for passive income")),
            asset,
            name: None,
            sources: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Full name when known, otherwise the symbol
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.asset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    SourceError,
    NegativeSentiment,
    ExchangeError,
    WalletError,
    ConcentrationRisk,
}

impl RiskKind {
    /// Title-cased label used in reports
    pub const fn label(self) -> &'static str {
        match self {
            Self::SourceError => "Source Error",
            Self::NegativeSentiment => "Negative Sentiment",
            Self::ExchangeError => "Exchange Error",
            Self::WalletError => "Wallet Error",
            Self::ConcentrationRisk => "Concentration Risk",
        }
    }
}

/// A warning or risk raised during a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub kind: RiskKind,

    /// Asset, exchange or wallet the flag is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub message: String,

    /// Allocation percentage for concentration risks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Market-side name for a [`RiskFlag`]
pub type Warning = RiskFlag;

impl RiskFlag {
    pub fn new(kind: RiskKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: None,
            source: None,
            message: message.into(),
            score: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// A valued position in one asset from one source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub asset: String,
    pub balance: Decimal,
    pub price_usd: Decimal,
    pub value_usd: Decimal,

    /// Share of the portfolio total, recomputed whenever the total changes
    pub allocation_pct: Decimal,

    /// Exchange name, `manual`, or `wallet:<abbrev>`
    pub source: String,
}

impl Holding {
    pub fn new(
        asset: impl Into<String>,
        balance: Decimal,
        price_usd: Decimal,
        source: impl Into<String>,
    ) -> Self {
        let balance = balance.max(Decimal::ZERO);
        let price_usd = price_usd.max(Decimal::ZERO);
        Self {
            asset: asset.into().to_uppercase(),
            balance,
            price_usd,
            value_usd: balance * price_usd,
            allocation_pct: Decimal::ZERO,
            source: source.into(),
        }
    }
}

/// Recompute every holding's allocation against the sum of their values.
///
/// Returns the total. All allocations are zero when the total is zero.
pub fn apply_allocations(holdings: &mut [Holding]) -> Decimal {
    let total: Decimal = holdings.iter().map(|h| h.value_usd).sum();
    for holding in holdings.iter_mut() {
        holding.allocation_pct = if total > Decimal::ZERO {
            (holding.value_usd / total) * Decimal::from(100)
        } else {
            Decimal::ZERO
        };
    }
    total
}

/// Percentage change of portfolio value over trailing windows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(rename = "24h")]
    pub change_24h: Option<Decimal>,

    #[serde(rename = "7d")]
    pub change_7d: Option<Decimal>,

    #[serde(rename = "30d")]
    pub change_30d: Option<Decimal>,
}
