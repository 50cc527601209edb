//! Cross-Source Aggregation
//!
//! Groups signal items by symbol. A symbol mentioned by two or more distinct
//! sources becomes a trending-coin opportunity; every negative item becomes a
//! warning for each asset it tags.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Channel, Opportunity, RiskFlag, RiskKind, Sentiment, SignalItem, Warning};

/// Minimum number of distinct sources for an opportunity
pub const MIN_SOURCES: usize = 2;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub opportunities: Vec<Opportunity>,
    pub warnings: Vec<Warning>,
}

struct SymbolMentions {
    symbol: String,
    name: Option<String>,
    sources: Vec<String>,
}

/// Merge adapter output into opportunities and warnings
pub fn aggregate(items: &[SignalItem]) -> Aggregation {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut mentions: Vec<SymbolMentions> = Vec::new();

    for item in items {
        for symbol in &item.asset_symbols {
            let symbol = symbol.to_uppercase();
            let slot = *index.entry(symbol.clone()).or_insert_with(|| {
                mentions.push(SymbolMentions {
                    symbol: symbol.clone(),
                    name: None,
                    sources: Vec::new(),
                });
                mentions.len() - 1
            });
            let entry = &mut mentions[slot];

            if entry.sources.contains(&item.source_id) {
                tracing::debug!(symbol = %symbol, source = %item.source_id, "Repeated mention from same source");
            } else {
                entry.sources.push(item.source_id.clone());
            }

            if entry.name.is_none() && item.channel == Channel::PriceTrend {
                entry.name.clone_from(&item.payload.coin_name);
            }
        }
    }

    let opportunities = mentions
        .into_iter()
        .filter(|m| m.sources.len() >= MIN_SOURCES)
        .map(|m| Opportunity::trending(m.symbol, m.name, m.sources))
        .collect();

    let warnings = items
        .iter()
        .filter(|item| item.sentiment == Sentiment::Negative)
        .flat_map(|item| {
            item.asset_symbols.iter().map(move |asset| {
                RiskFlag::new(RiskKind::NegativeSentiment, item.payload.text.clone())
                    .with_subject(asset)
                    .with_source(&item.source_id)
            })
        })
        .collect();

    Aggregation {
        opportunities,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SignalPayload;

    fn item(channel: Channel, symbols: &[&str], sentiment: Sentiment) -> SignalItem {
        SignalItem::new(channel, symbols, sentiment, SignalPayload::text("post"))
    }

    fn named(symbol: &str, name: &str) -> SignalItem {
        let payload = SignalPayload {
            text: format!("{name} is trending"),
            coin_name: Some(name.into()),
            ..SignalPayload::default()
        };
        SignalItem::new(Channel::PriceTrend, &[symbol], Sentiment::Neutral, payload)
    }

    #[test]
    fn test_confidence_is_source_count_over_four() {
        let channels = [Channel::PriceTrend, Channel::SocialReddit, Channel::SocialTwitter, Channel::News];

        for n in 2..=4 {
            let items: Vec<_> = channels[..n]
                .iter()
                .map(|&c| item(c, &["SOL"], Sentiment::Neutral))
                .collect();
            let result = aggregate(&items);

            assert_eq!(result.opportunities.len(), 1);
            let opp = &result.opportunities[0];
            assert_eq!(opp.sources.len(), n);
            #[allow(clippy::cast_precision_loss)]
            let expected = n as f64 / 4.0;
            assert!((opp.confidence - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_single_source_yields_nothing() {
        let items = vec![
            item(Channel::SocialReddit, &["SHIB"], Sentiment::Bullish),
            item(Channel::SocialReddit, &["SHIB", "PEPE"], Sentiment::Positive),
        ];
        assert!(aggregate(&items).opportunities.is_empty());
    }

    #[test]
    fn test_repeated_source_counted_once() {
        let items = vec![
            named("BTC", "Bitcoin"),
            item(Channel::SocialReddit, &["BTC"], Sentiment::Neutral),
            item(Channel::SocialReddit, &["btc"], Sentiment::Positive),
            item(Channel::SocialTwitter, &["BTC"], Sentiment::Neutral),
            item(Channel::News, &["BTC"], Sentiment::Positive),
        ];
        let result = aggregate(&items);

        let btc = &result.opportunities[0];
        assert_eq!(btc.sources, vec!["coingecko", "reddit", "twitter", "news"]);
        assert!((btc.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(btc.display_name(), "Bitcoin");
    }

    #[test]
    fn test_discovery_order_preserved() {
        let items = vec![
            item(Channel::SocialReddit, &["DOGE", "ETH"], Sentiment::Neutral),
            item(Channel::News, &["ETH", "DOGE"], Sentiment::Neutral),
        ];
        let assets: Vec<_> = aggregate(&items).opportunities.into_iter().map(|o| o.asset).collect();
        assert_eq!(assets, vec!["DOGE", "ETH"]);
    }

    #[test]
    fn test_negative_items_warn_per_asset() {
        let mut bear = item(Channel::SocialTwitter, &["BTC", "ETH"], Sentiment::Negative);
        bear.payload.text = "Bear market incoming. Protect your assets.".into();
        let items = vec![bear, item(Channel::News, &["BNB"], Sentiment::Neutral)];

        let warnings = aggregate(&items).warnings;
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, RiskKind::NegativeSentiment);
        assert_eq!(warnings[0].subject.as_deref(), Some("BTC"));
        assert_eq!(warnings[1].subject.as_deref(), Some("ETH"));
        assert_eq!(warnings[1].source.as_deref(), Some("twitter"));
        assert_eq!(warnings[1].message, "Bear market incoming. Protect your assets.");
    }
}
