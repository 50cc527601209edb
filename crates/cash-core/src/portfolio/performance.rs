//! Portfolio Performance
//!
//! Trailing 24h / 7d / 30d change of the portfolio total. The default source
//! compares against the persisted history; a window with no snapshot old
//! enough stays `None`.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::ledger::{PortfolioHistory, PortfolioHistoryEntry};
use crate::model::Performance;

pub trait PerformanceSource: Send + Sync {
    fn performance(&self, current_total: Decimal, now: DateTime<Utc>) -> Result<Performance>;
}

/// Deltas against the newest history entry at or before each window start
pub struct HistoryPerformance {
    history: PortfolioHistory,
}

impl HistoryPerformance {
    pub const fn new(history: PortfolioHistory) -> Self {
        Self { history }
    }
}

impl PerformanceSource for HistoryPerformance {
    fn performance(&self, current_total: Decimal, now: DateTime<Utc>) -> Result<Performance> {
        let entries = self.history.load()?;
        Ok(Performance {
            change_24h: change_since(&entries, current_total, now - Duration::hours(24)),
            change_7d: change_since(&entries, current_total, now - Duration::days(7)),
            change_30d: change_since(&entries, current_total, now - Duration::days(30)),
        })
    }
}

/// Always reports the same numbers
pub struct FixedPerformance(pub Performance);

impl PerformanceSource for FixedPerformance {
    fn performance(&self, _current_total: Decimal, _now: DateTime<Utc>) -> Result<Performance> {
        Ok(self.0)
    }
}

fn change_since(
    entries: &[PortfolioHistoryEntry],
    current_total: Decimal,
    cutoff: DateTime<Utc>,
) -> Option<Decimal> {
    let baseline = entries
        .iter()
        .filter(|e| e.timestamp <= cutoff)
        .max_by_key(|e| e.timestamp)?
        .total_value_usd;

    if baseline <= Decimal::ZERO {
        return None;
    }
    Some(((current_total - baseline) / baseline * Decimal::from(100)).round_dp(2))
}
