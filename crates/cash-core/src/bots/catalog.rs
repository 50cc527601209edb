//! Repository Discovery
//!
//! Finds trading-bot repositories by topic. The bundled catalog is the
//! default; the GitHub search API is used when `bot_hunt.live` is set.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CashError, Result};

/// A repository found by a topic search, before scoring
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryCandidate {
    /// `owner/name`
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub url: String,
    pub stars: u64,
    pub forks: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    /// Security score from a manual review, replaces the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_override: Option<f64>,
}

impl RepositoryCandidate {
    /// Repository name without the owner
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[async_trait]
pub trait RepositorySearch: Send + Sync {
    async fn search(&self, topic: &str) -> Result<Vec<RepositoryCandidate>>;
}

/// (name, description, stars, forks, language, updated, topics)
type CatalogEntry = (
    &'static str,
    &'static str,
    u64,
    u64,
    &'static str,
    &'static str,
    &'static [&'static str],
);

const CRYPTO_TRADING_BOT: &[CatalogEntry] = &[
    (
        "freqtrade/freqtrade",
        "Free, open source crypto trading bot",
        39000,
        7700,
        "Python",
        "2025-05-10T12:00:00Z",
        &["crypto-trading-bot", "trading-bot", "cryptocurrency", "bitcoin", "altcoin"],
    ),
    (
        "jesse-ai/jesse",
        "An advanced crypto trading bot written in Python",
        5200,
        950,
        "Python",
        "2025-05-09T18:30:00Z",
        &["crypto-trading-bot", "trading-bot", "cryptocurrency", "backtesting"],
    ),
    (
        "Drakkar-Software/OctoBot",
        "Cryptocurrency trading bot using technical analysis based strategies",
        2800,
        650,
        "Python",
        "2025-05-08T09:15:00Z",
        &["crypto-trading-bot", "trading-bot", "cryptocurrency", "technical-analysis"],
    ),
];

const TRADING_BOT: &[CatalogEntry] = &[
    (
        "hummingbot/hummingbot",
        "Hummingbot is open source software that helps you build trading bots that run on centralized and decentralized exchanges",
        6800,
        1900,
        "Python",
        "2025-05-10T15:45:00Z",
        &["trading-bot", "market-making", "arbitrage", "cryptocurrency"],
    ),
    (
        "DeviaVir/zenbot",
        "Zenbot is a command-line cryptocurrency trading bot using Node.js and MongoDB",
        8100,
        2200,
        "JavaScript",
        "2025-05-07T22:10:00Z",
        &["trading-bot", "cryptocurrency", "bitcoin", "altcoin"],
    ),
    (
        "askmike/gekko",
        "A bitcoin trading bot written in Node.js",
        9700,
        3100,
        "JavaScript",
        "2025-05-05T14:20:00Z",
        &["trading-bot", "bitcoin", "cryptocurrency"],
    ),
];

const CRYPTO_BOT: &[CatalogEntry] = &[
    (
        "kiridefi/DeFi_Trading_Bot",
        "Advanced DeFi trading bot with anti-bot bypass, P2P, and sniping capabilities",
        1200,
        350,
        "Python",
        "2025-05-09T20:30:00Z",
        &["crypto-bot", "defi", "sniping-bot", "trading-bot"],
    ),
    (
        "SherriMaxwell438/Crypto-Trading-Bot",
        "ML-driven crypto trading bot with beginner-friendly interface",
        850,
        210,
        "Python",
        "2025-05-08T11:45:00Z",
        &["crypto-bot", "machine-learning", "trading-bot"],
    ),
    (
        "botcrypto-io/awesome-crypto-trading-bots",
        "A curated list of awesome crypto trading bot frameworks, libraries, software and resources",
        3500,
        420,
        "Markdown",
        "2025-05-10T08:20:00Z",
        &["awesome-list", "crypto-bot", "trading-bot", "cryptocurrency"],
    ),
];

/// Fixed set of well-known bot repositories, grouped by topic
pub struct SampleCatalog;

#[async_trait]
impl RepositorySearch for SampleCatalog {
    async fn search(&self, topic: &str) -> Result<Vec<RepositoryCandidate>> {
        let entries = match topic {
            "crypto-trading-bot" => CRYPTO_TRADING_BOT,
            "trading-bot" => TRADING_BOT,
            "crypto-bot" => CRYPTO_BOT,
            _ => return Ok(Vec::new()),
        };

        Ok(entries
            .iter()
            .map(|&(name, description, stars, forks, language, updated, topics)| RepositoryCandidate {
                name: name.into(),
                description: description.into(),
                url: format!("https://github.com/{name}"),
                stars,
                forks,
                language: Some(language.into()),
                topics: topics.iter().map(|t| (*t).to_string()).collect(),
                last_updated: DateTime::parse_from_rfc3339(updated)
                    .ok()
                    .map(|d| d.with_timezone(&Utc)),
                security_override: None,
            })
            .collect())
    }
}

const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub repository search, most-starred first
pub struct GitHubSearch {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    min_stars: u64,
    per_page: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    full_name: String,
    description: Option<String>,
    html_url: String,
    stargazers_count: u64,
    forks_count: u64,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    pushed_at: Option<DateTime<Utc>>,
}

impl From<SearchItem> for RepositoryCandidate {
    fn from(item: SearchItem) -> Self {
        Self {
            name: item.full_name,
            description: item.description.unwrap_or_default(),
            url: item.html_url,
            stars: item.stargazers_count,
            forks: item.forks_count,
            language: item.language,
            topics: item.topics,
            last_updated: item.pushed_at,
            security_override: None,
        }
    }
}

impl GitHubSearch {
    pub fn new(token: Option<String>, min_stars: u64, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cash-daily/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: GITHUB_API_URL.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            min_stars,
            per_page: 10,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query(&self, topic: &str) -> String {
        format!("topic:{topic} stars:>={}", self.min_stars)
    }
}

#[async_trait]
impl RepositorySearch for GitHubSearch {
    async fn search(&self, topic: &str) -> Result<Vec<RepositoryCandidate>> {
        let per_page = self.per_page.to_string();
        let mut request = self
            .client
            .get(format!("{}/search/repositories", self.base_url))
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", self.query(topic).as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CashError::source_fetch(
                "github",
                format!("search for {topic} returned HTTP {status}"),
            ));
        }

        let found: SearchResponse = response.json().await?;
        Ok(found.items.into_iter().map(RepositoryCandidate::from).collect())
    }
}
