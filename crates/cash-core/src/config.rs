//! Workflow Configuration
//!
//! The JSON config file has four sections: `api_keys`, `portfolio`,
//! `market_scan` and `bot_hunt`. Every leaf has a default, but each section
//! must be present. Credentials can be overridden from the environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CashError, Result};
use crate::ledger::KNOWLEDGE_BASE_FILE;

/// Complete workflow configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_keys: ApiKeys,
    pub portfolio: PortfolioConfig,
    pub market_scan: MarketScanConfig,
    pub bot_hunt: BotHuntConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub binance: ExchangeCredentials,

    /// Kept so existing config files load and save unchanged. No source
    /// reads it yet.
    pub coinmarketcap: String,

    pub coingecko: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeCredentials {
    pub api_key: String,
    pub api_secret: String,

    /// Call the real exchange API instead of the simulated account
    pub live: bool,
}

impl ExchangeCredentials {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_secret.trim().is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub track_wallets: Vec<String>,
    pub manual_holdings: BTreeMap<String, ManualHolding>,
}

/// A holding declared by hand in the config file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualHolding {
    #[serde(default)]
    pub balance: Decimal,

    /// Looked up from an exchange when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketScanConfig {
    /// Rows requested for the market-cap leaderboard
    pub top_coins: u32,

    /// Kept so existing config files load and save unchanged. Opportunities
    /// use the fixed two-source rule instead.
    pub trending_threshold: u32,

    /// Source ids to scan: `coingecko`, `reddit`, `twitter`, `news`
    pub sources: Vec<String>,

    /// Query CoinGecko over HTTP instead of the bundled sample data
    pub live: bool,

    pub request_timeout_secs: u64,
}

impl Default for MarketScanConfig {
    fn default() -> Self {
        Self {
            top_coins: 100,
            trending_threshold: 5,
            sources: vec![
                "coingecko".into(),
                "reddit".into(),
                "twitter".into(),
                "news".into(),
            ],
            live: false,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotHuntConfig {
    pub github_topics: Vec<String>,
    pub min_stars: u64,

    /// Query the GitHub search API instead of the bundled catalog
    pub live: bool,
}

impl Default for BotHuntConfig {
    fn default() -> Self {
        Self {
            github_topics: vec![
                "crypto-trading-bot".into(),
                "trading-bot".into(),
                "crypto-bot".into(),
            ],
            min_stars: 100,
            live: false,
        }
    }
}

impl AppConfig {
    /// Parse a config document
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| CashError::Config(e.to_string()))
    }

    /// Load the config file, writing the defaults first if it does not exist
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, creating default config");
            let config = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&config)?)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path)
            .map_err(|e| CashError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Apply `BINANCE_API_KEY`, `BINANCE_API_SECRET` and `GITHUB_TOKEN`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("BINANCE_API_KEY") {
            self.api_keys.binance.api_key = key;
        }
        if let Some(secret) = non_empty("BINANCE_API_SECRET") {
            self.api_keys.binance.api_secret = secret;
        }
        if let Some(token) = non_empty("GITHUB_TOKEN") {
            self.api_keys.github_token = Some(token);
        }
    }
}

/// Where a run writes its results and logs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub knowledge_base: PathBuf,
}

impl OutputPaths {
    pub fn new(results_dir: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            logs_dir: logs_dir.into(),
            knowledge_base: PathBuf::from(KNOWLEDGE_BASE_FILE),
        }
    }

    pub fn with_knowledge_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.knowledge_base = path.into();
        self
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.results_dir)?;
        fs::create_dir_all(&self.logs_dir)?;
        tracing::info!(
            results = %self.results_dir.display(),
            logs = %self.logs_dir.display(),
            "Directory structure verified"
        );
        Ok(())
    }
}

/// Configuration and output locations handed to every component
#[derive(Clone, Debug)]
pub struct WorkflowContext {
    pub config: AppConfig,
    pub paths: OutputPaths,
}

impl WorkflowContext {
    pub const fn new(config: AppConfig, paths: OutputPaths) -> Self {
        Self { config, paths }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let created = AppConfig::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.market_scan.top_coins, 100);
        assert_eq!(created.bot_hunt.min_stars, 100);

        let reloaded = AppConfig::load_or_init(&path).unwrap();
        assert_eq!(created, reloaded);
    }

    #[test]
    fn test_manual_holdings_parse() {
        let config = AppConfig::from_json(
            r#"{
                "api_keys": {"binance": {"api_key": "", "api_secret": ""}},
                "portfolio": {
                    "track_wallets": [],
                    "manual_holdings": {"BTC": {"balance": 0.5}, "ETH": {"balance": 5.0, "price_usd": 4500}}
                },
                "market_scan": {"top_coins": 10},
                "bot_hunt": {}
            }"#,
        )
        .unwrap();

        let btc = &config.portfolio.manual_holdings["BTC"];
        assert_eq!(btc.balance, dec!(0.5));
        assert_eq!(btc.price_usd, None);
        assert_eq!(config.portfolio.manual_holdings["ETH"].price_usd, Some(dec!(4500)));
        assert_eq!(config.market_scan.top_coins, 10);
        assert_eq!(config.market_scan.sources.len(), 4);
        assert!(!config.api_keys.binance.is_configured());
    }

    #[test]
    fn test_unread_keys_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "api_keys": {"coinmarketcap": "cmc-key"},
                "portfolio": {},
                "market_scan": {"trending_threshold": 8},
                "bot_hunt": {}
            }"#,
        )
        .unwrap();

        let config = AppConfig::load_or_init(&path).unwrap();
        assert_eq!(config.api_keys.coinmarketcap, "cmc-key");
        assert_eq!(config.market_scan.trending_threshold, 8);

        let saved = serde_json::to_value(&config).unwrap();
        assert_eq!(saved["api_keys"]["coinmarketcap"], "cmc-key");
        assert_eq!(saved["market_scan"]["trending_threshold"], 8);
    }

    #[test]
    fn test_knowledge_base_path_defaults_to_cwd() {
        let paths = OutputPaths::new("results", "logs");
        assert_eq!(paths.knowledge_base, PathBuf::from(KNOWLEDGE_BASE_FILE));

        let moved = paths.with_knowledge_base("notes/kb.md");
        assert_eq!(moved.knowledge_base, PathBuf::from("notes/kb.md"));
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let err = AppConfig::from_json(r#"{"api_keys": {}, "portfolio": {}}"#).unwrap_err();
        assert!(matches!(err, CashError::Config(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "BINANCE_API_KEY" => Some("key".into()),
            "BINANCE_API_SECRET" => Some("secret".into()),
            "GITHUB_TOKEN" => Some("  ".into()),
            _ => None,
        });

        assert!(config.api_keys.binance.is_configured());
        assert_eq!(config.api_keys.github_token, None);
    }
}
