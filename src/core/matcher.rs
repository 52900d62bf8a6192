use crate::core::{keywords::search_keywords, scoring::calculate_match_score};
use crate::models::{DesignerCandidate, Proposal, RecommendedDesigner, ScoredDesigner, ScoringWeights};
use crate::services::{CandidateSource, SourceError};

/// Maximum number of ranked designers kept per proposal
pub const TOP_K: usize = 10;

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ScoredDesigner>,
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Keyword extraction from the proposal
/// 2. Vocabulary normalization (synonym tokens)
/// 3. Candidate lookup through a [`CandidateSource`]
/// 4. Scoring and ranking
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    top_k: usize,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, top_k: usize) -> Self {
        Self { weights, top_k }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), TOP_K)
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score and rank designers for a proposal
    ///
    /// Looks candidates up with the merged keyword set, then scores and ranks
    /// them. Lookup failures propagate unchanged; an empty keyword set or an
    /// empty candidate pool gives an empty result.
    pub async fn find_scored_matching_designers<S>(
        &self,
        proposal: &Proposal,
        source: &S,
    ) -> Result<Vec<ScoredDesigner>, SourceError>
    where
        S: CandidateSource + ?Sized,
    {
        let keywords = search_keywords(Some(proposal));
        tracing::info!("Final search keywords: {:?}", keywords);

        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = source.find_candidates(&keywords).await?;
        tracing::debug!("Candidate source returned {} designers", candidates.len());

        let result = self.find_matches(&keywords, candidates);

        tracing::info!(
            "Scored matching complete - top designers: {} (from {} candidates)",
            result.matches.len(),
            result.total_candidates
        );

        Ok(result.matches)
    }

    /// Score every candidate against the keywords and keep the top K
    pub fn find_matches(&self, keywords: &[String], candidates: Vec<DesignerCandidate>) -> MatchResult {
        let total_candidates = candidates.len();

        let scored = candidates
            .iter()
            .map(|candidate| {
                let (matching_score, matched_keywords) =
                    calculate_match_score(candidate, keywords, &self.weights);

                ScoredDesigner {
                    designer: RecommendedDesigner::from(candidate),
                    matching_score,
                    matched_keywords,
                }
            })
            .collect();

        MatchResult {
            matches: rank_designers(scored, self.top_k),
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Sort by score (descending) and keep the first `limit`
///
/// The sort is stable, so equal scores keep their retrieval order.
pub fn rank_designers(mut scored: Vec<ScoredDesigner>, limit: usize) -> Vec<ScoredDesigner> {
    scored.sort_by(|a, b| b.matching_score.cmp(&a.matching_score));
    scored.truncate(limit);
    scored
}
