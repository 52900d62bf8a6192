use std::collections::HashSet;

use crate::models::{DesignCategory, DesignStyle, Proposal};

/// Words that carry no matching signal on their own
pub const STOP_WORDS: &[&str] = &[
    "그리고", "하고", "또는", "등", "같은", "느낌", "스타일", "디자인",
    "위한", "대한", "있는", "하는", "되는", "것", "수", "를", "을", "이", "가", "의", "에", "로", "으로",
];

const TOKEN_SEPARATORS: &[char] = &['-', '/', '&', '(', ')'];

/// Extract keywords from the three proposal fields
///
/// Fields are processed in order (direction, target customer, required
/// designs) and the result keeps first-seen order without duplicates.
/// A missing proposal yields no keywords.
pub fn extract_keywords(proposal: Option<&Proposal>) -> Vec<String> {
    let Some(proposal) = proposal else {
        return Vec::new();
    };

    dedup_preserving_order(
        proposal
            .fields()
            .into_iter()
            .flatten()
            .flat_map(extract_from_text),
    )
}

/// Extract keywords from a single free-text field
///
/// Text is split on commas into phrases, then each phrase on whitespace and
/// `-/&()`. Tokens shorter than two characters, stop words and purely
/// numeric tokens are dropped.
pub fn extract_from_text(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let tokens = text
        .split(',')
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .flat_map(|phrase| {
            phrase
                .split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
                .map(str::trim)
                .filter(|token| token.chars().count() >= 2)
                .filter(|token| is_valid_keyword(token))
                .map(str::to_string)
        });

    dedup_preserving_order(tokens)
}

/// Check a token against the stop-word list and the numeric rule
#[inline]
pub fn is_valid_keyword(token: &str) -> bool {
    let lower = token.to_lowercase();
    if STOP_WORDS.contains(&lower.as_str()) {
        return false;
    }

    !token.chars().all(|c| c.is_ascii_digit())
}

/// Map keywords onto lower-cased vocabulary tokens
///
/// A keyword matches a style or category when either its description
/// contains the keyword or the keyword contains the description. Every
/// matching entry contributes its token once.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let synonyms = keywords.iter().flat_map(|keyword| {
        let keyword = keyword.trim().to_string();

        let styles = DesignStyle::ALL
            .into_iter()
            .filter(|style| symmetric_contains(style.description(), &keyword))
            .map(|style| style.token().to_lowercase());

        let categories = DesignCategory::ALL
            .into_iter()
            .filter(|category| symmetric_contains(category.description(), &keyword))
            .map(|category| category.token().to_lowercase());

        styles.chain(categories).collect::<Vec<_>>()
    });

    dedup_preserving_order(synonyms)
}

/// Extracted keywords followed by their vocabulary synonyms
pub fn search_keywords(proposal: Option<&Proposal>) -> Vec<String> {
    let extracted = extract_keywords(proposal);
    let synonyms = normalize_keywords(&extracted);

    tracing::debug!("Extracted keywords: {:?}, synonyms: {:?}", extracted, synonyms);

    dedup_preserving_order(extracted.into_iter().chain(synonyms))
}

#[inline]
fn symmetric_contains(description: &str, keyword: &str) -> bool {
    !keyword.is_empty() && (description.contains(keyword) || keyword.contains(description))
}

fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
