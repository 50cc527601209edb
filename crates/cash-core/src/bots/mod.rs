//! Bot Hunt
//!
//! Searches each configured topic for trading-bot repositories, drops the
//! unpopular ones, merges duplicates and ranks the rest.

mod catalog;
mod scorer;

pub use catalog::{GitHubSearch, RepositoryCandidate, RepositorySearch, SampleCatalog};
pub use scorer::{
    recommendation, BotHunt, DefaultSecurityReview, RepositoryScorer, RepositoryScores,
    ScoredRepository, SecurityConcern, SecurityReview, TopPick, DEFAULT_SECURITY_SCORE,
    SECURITY_CONCERN_BELOW, TOP_PICK_COUNT,
};

use std::sync::Arc;
use std::time::Duration;

use crate::config::WorkflowContext;
use crate::error::Result;

pub struct BotHunter {
    search: Arc<dyn RepositorySearch>,
    scorer: RepositoryScorer,
    topics: Vec<String>,
    min_stars: u64,
}

impl BotHunter {
    pub fn new(search: Arc<dyn RepositorySearch>, topics: Vec<String>, min_stars: u64) -> Self {
        Self {
            search,
            scorer: RepositoryScorer::default(),
            topics,
            min_stars,
        }
    }

    pub fn with_scorer(mut self, scorer: RepositoryScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn from_context(ctx: &WorkflowContext) -> Result<Self> {
        let hunt = &ctx.config.bot_hunt;
        let search: Arc<dyn RepositorySearch> = if hunt.live {
            Arc::new(GitHubSearch::new(
                ctx.config.api_keys.github_token.clone(),
                hunt.min_stars,
                Duration::from_secs(ctx.config.market_scan.request_timeout_secs),
            )?)
        } else {
            Arc::new(SampleCatalog)
        };
        Ok(Self::new(search, hunt.github_topics.clone(), hunt.min_stars))
    }

    /// Gather candidates across topics, then score them
    pub async fn hunt(&self) -> BotHunt {
        tracing::info!(topics = self.topics.len(), min_stars = self.min_stars, "Starting bot hunt");

        let mut candidates: Vec<RepositoryCandidate> = Vec::new();
        for topic in &self.topics {
            let found = match self.search.search(topic).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::error!(topic = %topic, error = %e, "Repository search failed");
                    continue;
                }
            };
            tracing::debug!(topic = %topic, found = found.len(), "Topic searched");

            for candidate in found.into_iter().filter(|c| c.stars >= self.min_stars) {
                merge_candidate(&mut candidates, candidate);
            }
        }

        let hunt = self.scorer.score(candidates);
        tracing::info!(
            repositories = hunt.repositories.len(),
            top_picks = hunt.top_picks.len(),
            concerns = hunt.security_concerns.len(),
            "Bot hunt complete"
        );
        hunt
    }
}

/// Keep the first sighting of a repository, adding any new topics to it
fn merge_candidate(candidates: &mut Vec<RepositoryCandidate>, candidate: RepositoryCandidate) {
    match candidates
        .iter_mut()
        .find(|c| c.name.eq_ignore_ascii_case(&candidate.name))
    {
        Some(existing) => {
            for topic in candidate.topics {
                if !existing.topics.contains(&topic) {
                    existing.topics.push(topic);
                }
            }
        }
        None => candidates.push(candidate),
    }
}
