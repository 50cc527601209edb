//! Action Item Recovery
//!
//! Pulls the numbered bold actions back out of a rendered playbook so the
//! money-moves log can list them.

use regex::Regex;

use crate::error::{CashError, Result};

const ACTION_PLAN: &str = "## Action Plan";

/// Subsections read from the action plan, with the label each item gets
const PRIORITIES: [(&str, &str); 2] = [
    ("### High Priority", "HIGH PRIORITY"),
    ("### Medium Priority", "MEDIUM PRIORITY"),
];

/// Lines after `heading` up to the first line accepted by `ends`
fn section<'a>(lines: &[&'a str], heading: &str, ends: impl Fn(&str) -> bool) -> Option<Vec<&'a str>> {
    let start = lines.iter().position(|l| l.trim_end() == heading)?;
    Some(
        lines[start + 1..]
            .iter()
            .take_while(|&&l| !ends(l))
            .copied()
            .collect(),
    )
}

/// Action items as `HIGH PRIORITY: <action>` / `MEDIUM PRIORITY: <action>`
///
/// Fails when the report has no action plan section at all.
pub fn extract_action_items(report: &str) -> Result<Vec<String>> {
    let lines: Vec<&str> = report.lines().collect();
    let plan = section(&lines, ACTION_PLAN, |l| l.starts_with("## ") || l.trim_end() == "---")
        .ok_or_else(|| CashError::ReportParse("no action plan section".into()))?;

    let numbered = Regex::new(r"\d+\.\s+\*\*(.+?)\*\*")
        .map_err(|e| CashError::ReportParse(e.to_string()))?;

    let mut items = Vec::new();
    for (heading, label) in PRIORITIES {
        let Some(body) = section(&plan, heading, |l| l.starts_with('#')) else {
            continue;
        };
        let body = body.join("\n");
        items.extend(
            numbered
                .captures_iter(&body)
                .filter_map(|c| c.get(1))
                .map(|m| format!("{label}: {}", m.as_str())),
        );
    }
    Ok(items)
}
