use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Request for a fresh recommendation from a free-text brief
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendRequest {
    #[validate(length(min = 1, max = 4000), custom(function = "not_blank"))]
    pub prompt: String,
}

/// Request to refresh a recommendation session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1), custom(function = "not_blank"))]
    #[serde(alias = "session_id", rename = "sessionId")]
    pub session_id: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
