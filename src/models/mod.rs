// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    DesignCategory, DesignStyle, DesignerCandidate, Portfolio, PortfolioImage, Proposal,
    RecommendedDesigner, ScoredDesigner, ScoringWeights, UnknownToken,
};
pub use requests::{RecommendRequest, RefreshRequest};
pub use responses::{ErrorResponse, HealthResponse, RecommendationResponse};
