//! Playbook Composer
//!
//! Renders the day's Markdown playbook from whatever phases produced data.
//! Output depends only on the inputs and the timestamp passed in.
//!
//! ```text
//!   # Cash Playbook - <date>
//!   ## Market Summary
//!   ## Portfolio Summary
//!   ## Trading Bot Recommendations
//!   ## Action Plan
//!   ---
//! ```

mod action_plan;

pub use action_plan::{action_items, render as render_action_plan, ActionItem, Category, Priority, HIGH_CONFIDENCE};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bots::BotHunt;
use crate::market::MarketScan;
use crate::model::{Performance, RiskFlag};
use crate::portfolio::PortfolioReport;

/// Rows shown in the trending coins table
pub const TRENDING_ROWS: usize = 5;

pub const ACTION_PLAN_HEADING: &str = "## Action Plan";

const MARKET_PLACEHOLDER: &str =
    "*No market data available. Run a market scan to get the latest trends and opportunities.*";
const PORTFOLIO_PLACEHOLDER: &str =
    "*No portfolio data available. Configure API keys and run a portfolio check to get your current status.*";
const BOTS_PLACEHOLDER: &str =
    "*No bot data available. Run a bot hunt to discover new trading tools and automation options.*";
const NO_PICKS: &str = "*No top picks available.*";
const NO_ACTIONS: &str = "*No action items generated. Run more scans to get actionable recommendations.*";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookReport {
    pub generated_at: DateTime<Utc>,
    pub text: String,
}

/// Compose the playbook. Missing or empty phases render a placeholder section.
pub fn compose(
    market: Option<&MarketScan>,
    portfolio: Option<&PortfolioReport>,
    bots: Option<&BotHunt>,
    generated_at: DateTime<Utc>,
) -> PlaybookReport {
    let market = market.filter(|m| m.has_data());
    let portfolio = portfolio.filter(|p| p.has_data());
    let bots = bots.filter(|b| b.has_data());

    let stamp = generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let items = action_items(market, portfolio, bots);

    let sections = [
        header(generated_at, &stamp),
        market.map_or_else(|| placeholder("## Market Summary", MARKET_PLACEHOLDER), market_section),
        portfolio.map_or_else(
            || placeholder("## Portfolio Summary", PORTFOLIO_PLACEHOLDER),
            portfolio_section,
        ),
        bots.map_or_else(
            || placeholder("## Trading Bot Recommendations", BOTS_PLACEHOLDER),
            bots_section,
        ),
        if items.is_empty() {
            placeholder(ACTION_PLAN_HEADING, NO_ACTIONS)
        } else {
            format!("{ACTION_PLAN_HEADING}\n\n{}", render_action_plan(&items))
        },
        footer(&stamp),
    ];

    let text = sections
        .iter()
        .map(|s| s.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n");

    tracing::info!(actions = items.len(), chars = text.len(), "Playbook composed");
    PlaybookReport { generated_at, text }
}

fn placeholder(heading: &str, body: &str) -> String {
    format!("{heading}\n\n{body}")
}

fn header(generated_at: DateTime<Utc>, stamp: &str) -> String {
    format!(
        "# Cash Playbook - {}\n\n**Generated:** {stamp}\n\n\
         This playbook provides actionable insights and recommendations based on the latest market data, \
         your portfolio status, and available trading tools. Use it to guide your crypto trading decisions \
         and automation strategy.\n\n---",
        generated_at.format("%Y-%m-%d")
    )
}

fn footer(stamp: &str) -> String {
    format!(
        "---\n\n*This playbook was generated by Cash on {stamp}. All recommendations should be reviewed \
         and validated before implementation. Past performance is not indicative of future results.*"
    )
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Snake-case serde name of a unit enum variant, e.g. `trending_coin`
fn variant_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Table cell text: pipes escaped, line breaks folded into spaces
fn cell(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|part| !part.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn billions(value: Decimal) -> Decimal {
    (value / Decimal::from(1_000_000_000)).round_dp(2)
}

fn market_section(scan: &MarketScan) -> String {
    let mut out = String::from("## Market Summary\n\n### Overall Market\n\n");

    if let Some(global) = &scan.global {
        if let Some(change) = global.market_cap_change_24h_pct {
            out.push_str(&format!("- **24h Market Cap Change:** {:.2}%\n", change.round_dp(2)));
        }
        if let Some(cap) = global.total_market_cap_usd.filter(|c| !c.is_zero()) {
            out.push_str(&format!("- **Total Market Cap:** ${:.2}B\n", billions(cap)));
        }
        if let Some(volume) = global.total_volume_usd.filter(|v| !v.is_zero()) {
            out.push_str(&format!("- **24h Volume:** ${:.2}B\n", billions(volume)));
        }
    }

    if !scan.trending_coins.is_empty() {
        out.push_str("\n\n### Trending Coins\n\n| Coin | Symbol | Source | Score |\n|------|--------|--------|-------|\n");
        for coin in scan.trending_coins.iter().take(TRENDING_ROWS) {
            let score = coin.score.map_or_else(|| "N/A".to_string(), |s| s.to_string());
            out.push_str(&format!(
                "| {} | {} | {} | {score} |\n",
                cell(&coin.name),
                cell(&coin.symbol),
                cell(&coin.source)
            ));
        }
    }

    if !scan.opportunities.is_empty() {
        out.push_str("\n\n### Market Opportunities\n\n| Type | Asset | Confidence | Sources |\n|------|-------|------------|---------|\n");
        for opp in &scan.opportunities {
            out.push_str(&format!(
                "| {} | {} | {:.1}% | {} |\n",
                title_case(&variant_name(&opp.kind)),
                cell(opp.display_name()),
                opp.confidence * 100.0,
                cell(&opp.sources.join(", "))
            ));
        }
    }

    if !scan.warnings.is_empty() {
        out.push_str("\n\n### Market Warnings\n\n| Type | Asset | Source | Message |\n|------|-------|--------|---------|\n");
        for warning in &scan.warnings {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                warning.kind.label(),
                cell(warning.subject.as_deref().unwrap_or("N/A")),
                cell(warning.source.as_deref().unwrap_or("Unknown")),
                cell(&warning.message)
            ));
        }
    }

    out
}

fn percent(change: Option<Decimal>) -> String {
    change.map_or_else(|| "N/A".to_string(), |c| format!("{:.2}%", c.round_dp(2)))
}

fn performance_lines(perf: &Performance) -> String {
    format!(
        "- **24h Performance:** {}\n- **7d Performance:** {}\n- **30d Performance:** {}",
        percent(perf.change_24h),
        percent(perf.change_7d),
        percent(perf.change_30d)
    )
}

fn risk_list(heading: &str, risks: &[RiskFlag]) -> String {
    let mut out = format!("\n\n### {heading}\n\n");
    for risk in risks {
        out.push_str(&format!("- **{}:** {}\n", risk.kind.label(), risk.message));
    }
    out
}

fn portfolio_section(report: &PortfolioReport) -> String {
    let mut out = format!(
        "## Portfolio Summary\n\n- **Total Value:** ${:.2}\n{}",
        report.total_value_usd.round_dp(2),
        performance_lines(&report.performance)
    );

    if !report.holdings.is_empty() {
        let mut holdings: Vec<_> = report.holdings.iter().collect();
        holdings.sort_by(|a, b| b.value_usd.cmp(&a.value_usd));

        out.push_str("\n\n### Holdings\n\n| Asset | Balance | Value (USD) | Allocation | Source |\n|-------|---------|-------------|------------|--------|\n");
        for h in holdings {
            out.push_str(&format!(
                "| {} | {} | ${:.2} | {:.1}% | {} |\n",
                cell(&h.asset),
                h.balance.round_dp(8).normalize(),
                h.value_usd.round_dp(2),
                h.allocation_pct.round_dp(1),
                cell(&h.source)
            ));
        }
    }

    if !report.opportunities.is_empty() {
        out.push_str("\n\n### Portfolio Opportunities\n\n");
        for opp in &report.opportunities {
            out.push_str(&format!(
                "- **{}:** {}\n",
                title_case(&variant_name(&opp.kind)),
                opp.message.as_deref().unwrap_or("No details")
            ));
        }
    }

    if !report.risks.is_empty() {
        out.push_str(&risk_list("Portfolio Risks", &report.risks));
    }

    out
}

fn bots_section(hunt: &BotHunt) -> String {
    let mut out = String::from("## Trading Bot Recommendations\n\n");

    if hunt.top_picks.is_empty() {
        out.push_str(NO_PICKS);
        out.push_str("\n\n");
    }
    for (n, pick) in hunt.top_picks.iter().enumerate() {
        out.push_str(&format!(
            "### {}. [{}]({}) - Score: {:.1}/100\n\n{}\n\n",
            n + 1,
            pick.repository,
            pick.url,
            pick.overall_score,
            pick.recommendation
        ));
    }

    if !hunt.security_concerns.is_empty() {
        out.push_str("### Security Concerns\n\n");
        for concern in &hunt.security_concerns {
            out.push_str(&format!(
                "- **{}** (Score: {:.1}/100): {}\n",
                concern.repository, concern.score, concern.message
            ));
        }
    }

    out
}
