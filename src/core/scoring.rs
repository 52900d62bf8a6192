use crate::models::{DesignCategory, DesignStyle, DesignerCandidate, Portfolio, ScoringWeights};

/// Calculate a keyword match score for a designer
///
/// Scoring formula, per keyword (case-insensitive):
/// score = (
///     category_weight        # any selected category contains the keyword (first hit)
///     + style_weight         # any selected style contains the keyword (first hit)
///     + portfolio_weight * n # n = portfolios whose title, description or categories contain it
/// )
///
/// Returns the total over all keywords and the keywords that scored.
pub fn calculate_match_score(
    candidate: &DesignerCandidate,
    keywords: &[String],
    weights: &ScoringWeights,
) -> (u32, Vec<String>) {
    let mut total_score = 0;
    let mut matched_keywords = Vec::new();

    for keyword in keywords {
        let keyword_score = calculate_keyword_score(candidate, keyword, weights);
        if keyword_score > 0 {
            total_score += keyword_score;
            matched_keywords.push(keyword.clone());
        }
    }

    (total_score, matched_keywords)
}

/// Score a single keyword against a designer
pub fn calculate_keyword_score(
    candidate: &DesignerCandidate,
    keyword: &str,
    weights: &ScoringWeights,
) -> u32 {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return 0;
    }

    let mut score = 0;

    if candidate
        .categories
        .iter()
        .any(|category| category_contains(*category, &keyword))
    {
        score += weights.category;
    }

    if candidate
        .styles
        .iter()
        .any(|style| style_contains(*style, &keyword))
    {
        score += weights.style;
    }

    let matched_portfolios = candidate
        .portfolios
        .iter()
        .filter(|portfolio| portfolio_contains(portfolio, &keyword))
        .count() as u32;

    score + matched_portfolios * weights.portfolio
}

/// Title, then description, then categories; the first hit counts once
#[inline]
fn portfolio_contains(portfolio: &Portfolio, keyword: &str) -> bool {
    if text_contains(portfolio.title.as_deref(), keyword) {
        return true;
    }

    if text_contains(portfolio.description.as_deref(), keyword) {
        return true;
    }

    portfolio
        .categories
        .iter()
        .any(|category| category_contains(*category, keyword))
}

#[inline]
fn category_contains(category: DesignCategory, keyword: &str) -> bool {
    category.token().to_lowercase().contains(keyword)
        || category.description().to_lowercase().contains(keyword)
}

#[inline]
fn style_contains(style: DesignStyle, keyword: &str) -> bool {
    style.token().to_lowercase().contains(keyword)
        || style.description().to_lowercase().contains(keyword)
}

#[inline]
fn text_contains(text: Option<&str>, keyword: &str) -> bool {
    text.map(|t| t.to_lowercase().contains(keyword)).unwrap_or(false)
}
