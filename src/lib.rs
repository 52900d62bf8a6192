//! ArtConnect designer matching
//!
//! Turns an analyzed design brief into a ranked list of designers and serves
//! it a page at a time through short-lived recommendation sessions.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Matcher, SessionConfig, SessionStore, search_keywords};
pub use crate::models::{DesignerCandidate, Proposal, RecommendedDesigner, ScoredDesigner, ScoringWeights};
