//! Action Plan
//!
//! Turns findings from the three phases into prioritised action items.

use serde::{Deserialize, Serialize};

use crate::bots::BotHunt;
use crate::market::MarketScan;
use crate::model::{OpportunityKind, RiskKind};
use crate::portfolio::PortfolioReport;

/// Opportunities above this confidence become high-priority research items
pub const HIGH_CONFIDENCE: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    pub const fn heading(self) -> &'static str {
        match self {
            Self::High => "High Priority",
            Self::Medium => "Medium Priority",
            Self::Low => "Low Priority",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Market,
    Portfolio,
    Automation,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Portfolio => "Portfolio",
            Self::Automation => "Automation",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: Priority,
    pub category: Category,
    pub action: String,
    pub rationale: String,
}

/// Derive action items, high priority first. Order within a priority is
/// market, then portfolio, then automation.
pub fn action_items(
    market: Option<&MarketScan>,
    portfolio: Option<&PortfolioReport>,
    bots: Option<&BotHunt>,
) -> Vec<ActionItem> {
    let mut items = Vec::new();

    if let Some(market) = market {
        for opp in market
            .opportunities
            .iter()
            .filter(|o| o.confidence > HIGH_CONFIDENCE)
        {
            items.push(ActionItem {
                priority: Priority::High,
                category: Category::Market,
                action: format!("Research {} for potential entry positions", opp.display_name()),
                rationale: format!(
                    "High confidence opportunity based on multiple sources: {}",
                    opp.sources.join(", ")
                ),
            });
        }
    }

    if let Some(portfolio) = portfolio {
        for risk in portfolio
            .risks
            .iter()
            .filter(|r| r.kind == RiskKind::ConcentrationRisk)
        {
            items.push(ActionItem {
                priority: Priority::High,
                category: Category::Portfolio,
                action: format!(
                    "Consider rebalancing portfolio to reduce {} exposure",
                    risk.subject.as_deref().unwrap_or("Unknown")
                ),
                rationale: risk.message.clone(),
            });
        }

        for opp in portfolio
            .opportunities
            .iter()
            .filter(|o| o.kind == OpportunityKind::Staking)
        {
            items.push(ActionItem {
                priority: Priority::Medium,
                category: Category::Portfolio,
                action: format!("Stake {} for passive income", opp.asset),
                rationale: opp
                    .message
                    .clone()
                    .unwrap_or_else(|| "Staking opportunity".into()),
            });
        }
    }

    if let Some(pick) = bots.and_then(|b| b.top_picks.first()) {
        items.push(ActionItem {
            priority: Priority::Medium,
            category: Category::Automation,
            action: format!("Test {} in a sandbox environment", pick.repository),
            rationale: format!("Highest-rated trading bot with score {:.1}/100", pick.overall_score),
        });
    }

    items.sort_by_key(|item| item.priority);
    items
}

/// Markdown body of the action plan, without its `## Action Plan` heading
pub fn render(items: &[ActionItem]) -> String {
    let mut out = String::new();
    for priority in Priority::ALL {
        let group: Vec<_> = items.iter().filter(|i| i.priority == priority).collect();
        if group.is_empty() {
            continue;
        }

        out.push_str(&format!("### {}\n\n", priority.heading()));
        for (n, item) in group.iter().enumerate() {
            out.push_str(&format!(
                "{}. **{}**\n   - *Rationale:* {}\n   - *Category:* {}\n\n",
                n + 1,
                item.action,
                item.rationale,
                item.category.label()
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::TopPick;
    use crate::model::{Opportunity, RiskFlag};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn market(opportunities: Vec<Opportunity>) -> MarketScan {
        MarketScan {
            timestamp: Utc::now(),
            trending_coins: Vec::new(),
            global: None,
            top_coins: Vec::new(),
            signals: Vec::new(),
            opportunities,
            warnings: Vec::new(),
        }
    }

    fn portfolio(risks: Vec<RiskFlag>, opportunities: Vec<Opportunity>) -> PortfolioReport {
        PortfolioReport {
            timestamp: Utc::now(),
            holdings: Vec::new(),
            total_value_usd: Decimal::ZERO,
            performance: crate::model::Performance::default(),
            risks,
            opportunities,
        }
    }

    fn hunt() -> BotHunt {
        BotHunt {
            timestamp: Utc::now(),
            repositories: Vec::new(),
            top_picks: vec![TopPick {
                repository: "freqtrade/freqtrade".into(),
                url: "https://github.com/freqtrade/freqtrade".into(),
                overall_score: 93.333,
                recommendation: String::new(),
            }],
            security_concerns: Vec::new(),
        }
    }

    #[test]
    fn test_items_sorted_by_priority() {
        let m = market(vec![
            Opportunity::trending("SOL", Some("Solana".into()), vec!["coingecko".into(), "reddit".into(), "twitter".into()]),
            Opportunity::trending("PEPE", None, vec!["reddit".into(), "coingecko".into()]),
        ]);
        let p = portfolio(
            vec![RiskFlag::new(RiskKind::ConcentrationRisk, "High concentration in BTC (65.4% of portfolio)")
                .with_subject("BTC")],
            vec![Opportunity::staking("ETH")],
        );
        let b = hunt();

        let items = action_items(Some(&m), Some(&p), Some(&b));
        let actions: Vec<_> = items.iter().map(|i| i.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![
                "Research Solana for potential entry positions",
                "Consider rebalancing portfolio to reduce BTC exposure",
                "Stake ETH for passive income",
                "Test freqtrade/freqtrade in a sandbox environment",
            ]
        );
        assert_eq!(items[3].rationale, "Highest-rated trading bot with score 93.3/100");
    }

    #[test]
    fn test_render_numbers_per_group() {
        let p = portfolio(Vec::new(), vec![Opportunity::staking("ETH"), Opportunity::staking("SOL")]);
        let text = render(&action_items(None, Some(&p), None));

        assert!(text.starts_with("### Medium Priority\n\n1. **Stake ETH for passive income**\n"));
        assert!(text.contains("2. **Stake SOL for passive income**\n   - *Rationale:* Consider staking SOL for passive income\n   - *Category:* Portfolio\n"));
        assert!(!text.contains("### High Priority"));
    }

    #[test]
    fn test_nothing_to_do() {
        assert!(action_items(None, None, None).is_empty());
        assert_eq!(render(&[]), "");
    }
}
