use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DesignCategory, DesignStyle, DesignerCandidate, Portfolio};

/// Errors raised by a candidate lookup
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] super::postgres::PostgresError),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Candidate source unavailable: {0}")]
    Unavailable(String),
}

/// Looks up designers whose profile or portfolios mention any keyword
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn find_candidates(&self, keywords: &[String]) -> Result<Vec<DesignerCandidate>, SourceError>;
}

/// Candidate source backed by an in-memory designer list
///
/// Applies the same rule as the database query: a designer is returned when
/// a category or style token, or any portfolio title, description or
/// category token contains one of the keywords (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandidateSource {
    designers: Vec<DesignerCandidate>,
    limit: Option<usize>,
}

impl InMemoryCandidateSource {
    pub fn new(designers: Vec<DesignerCandidate>) -> Self {
        Self {
            designers,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Load designers from a JSON array fixture
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Fixture(format!("{}: {}", path.display(), e)))?;

        let designers: Vec<DesignerCandidate> = serde_json::from_str(&raw)
            .map_err(|e| SourceError::Fixture(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Loaded {} designers from {}", designers.len(), path.display());
        Ok(Self::new(designers))
    }

    pub fn len(&self) -> usize {
        self.designers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designers.is_empty()
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateSource {
    async fn find_candidates(&self, keywords: &[String]) -> Result<Vec<DesignerCandidate>, SourceError> {
        let needles = normalize_needles(keywords);
        if needles.is_empty() {
            return Ok(Vec::new());
        }

        let matched = self
            .designers
            .iter()
            .filter(|designer| mentions_any(designer, &needles))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(matched)
    }
}

/// Trimmed, lower-cased, non-blank keywords
pub fn normalize_needles(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn mentions_any(designer: &DesignerCandidate, needles: &[String]) -> bool {
    needles.iter().any(|needle| {
        designer.categories.iter().any(|c| category_token_contains(*c, needle))
            || designer.styles.iter().any(|s| style_token_contains(*s, needle))
            || designer.portfolios.iter().any(|p| portfolio_mentions(p, needle))
    })
}

fn portfolio_mentions(portfolio: &Portfolio, needle: &str) -> bool {
    let text_hit = [portfolio.title.as_deref(), portfolio.description.as_deref()]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(needle));

    text_hit || portfolio.categories.iter().any(|c| category_token_contains(*c, needle))
}

#[inline]
fn category_token_contains(category: DesignCategory, needle: &str) -> bool {
    category.token().to_lowercase().contains(needle)
}

#[inline]
fn style_token_contains(style: DesignStyle, needle: &str) -> bool {
    style.token().to_lowercase().contains(needle)
}
