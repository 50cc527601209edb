//! Repository Scoring
//!
//! Scores come from popularity alone: activity tracks stars, quality blends
//! stars and forks, and security is a flat default unless a review says
//! otherwise.
//!
//! ```text
//!   activity = min(100, stars / 100)
//!   quality  = min(100, 0.7 * stars / 100 + 0.3 * forks / 50)
//!   security = 80
//!   overall  = (activity + security + quality) / 3
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::RepositoryCandidate;

pub const DEFAULT_SECURITY_SCORE: f64 = 80.0;

/// Security scores below this raise a concern
pub const SECURITY_CONCERN_BELOW: f64 = 60.0;

pub const TOP_PICK_COUNT: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryScores {
    pub activity: f64,
    pub security: f64,
    pub quality: f64,
    pub overall: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredRepository {
    #[serde(flatten)]
    pub candidate: RepositoryCandidate,
    pub scores: RepositoryScores,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopPick {
    pub repository: String,
    pub url: String,
    pub overall_score: f64,
    pub recommendation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecurityConcern {
    pub repository: String,
    pub score: f64,
    pub message: String,
}

/// Scored repositories, best first, with picks and concerns
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BotHunt {
    pub timestamp: DateTime<Utc>,
    pub repositories: Vec<ScoredRepository>,
    pub top_picks: Vec<TopPick>,
    pub security_concerns: Vec<SecurityConcern>,
}

impl BotHunt {
    pub fn has_data(&self) -> bool {
        !self.repositories.is_empty()
    }
}

/// Supplies a security score for a candidate
pub trait SecurityReview: Send + Sync {
    fn security_score(&self, candidate: &RepositoryCandidate) -> f64;
}

/// Flat default for every repository
pub struct DefaultSecurityReview;

impl SecurityReview for DefaultSecurityReview {
    fn security_score(&self, _candidate: &RepositoryCandidate) -> f64 {
        DEFAULT_SECURITY_SCORE
    }
}

pub struct RepositoryScorer {
    review: Arc<dyn SecurityReview>,
}

impl Default for RepositoryScorer {
    fn default() -> Self {
        Self::new(Arc::new(DefaultSecurityReview))
    }
}

impl RepositoryScorer {
    pub fn new(review: Arc<dyn SecurityReview>) -> Self {
        Self { review }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn score_one(&self, candidate: &RepositoryCandidate) -> RepositoryScores {
        let stars = candidate.stars as f64;
        let forks = candidate.forks as f64;

        let activity = clamp_score(stars / 100.0);
        let quality = clamp_score(0.7 * (stars / 100.0) + 0.3 * (forks / 50.0));
        let security = clamp_score(
            candidate
                .security_override
                .unwrap_or_else(|| self.review.security_score(candidate)),
        );

        RepositoryScores {
            activity,
            security,
            quality,
            overall: (activity + security + quality) / 3.0,
        }
    }

    /// Score, rank and pick. Ties keep their input order.
    pub fn score(&self, candidates: Vec<RepositoryCandidate>) -> BotHunt {
        let mut repositories: Vec<ScoredRepository> = candidates
            .into_iter()
            .map(|candidate| {
                let scores = self.score_one(&candidate);
                ScoredRepository { candidate, scores }
            })
            .collect();

        let security_concerns = repositories
            .iter()
            .filter(|r| r.scores.security < SECURITY_CONCERN_BELOW)
            .map(|r| SecurityConcern {
                repository: r.candidate.name.clone(),
                score: r.scores.security,
                message: "Low security score - review code carefully before using".into(),
            })
            .collect();

        repositories.sort_by(|a, b| b.scores.overall.total_cmp(&a.scores.overall));

        let top_picks = repositories
            .iter()
            .take(TOP_PICK_COUNT)
            .map(|r| TopPick {
                repository: r.candidate.name.clone(),
                url: r.candidate.url.clone(),
                overall_score: r.scores.overall,
                recommendation: recommendation(&r.candidate),
            })
            .collect();

        BotHunt {
            timestamp: Utc::now(),
            repositories,
            top_picks,
            security_concerns,
        }
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// One-paragraph pitch keyed on the repository language
pub fn recommendation(candidate: &RepositoryCandidate) -> String {
    let name = candidate.short_name();
    let stars = candidate.stars;

    match candidate.language.as_deref() {
        Some("Python") => format!(
            "Consider using {name} for its Python-based approach, making it easy to customize and integrate with our existing tools. With {stars} stars, it has a strong community and active development."
        ),
        Some("JavaScript") => format!(
            "Consider using {name} for its JavaScript-based approach, which could integrate well with web-based dashboards. With {stars} stars, it has a solid community backing."
        ),
        _ => format!(
            "Consider exploring {name} further to evaluate its potential for our trading strategy. With {stars} stars, it's worth investigating."
        ),
    }
}
