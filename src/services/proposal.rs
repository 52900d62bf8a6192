use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::Proposal;

const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = r#"당신은 전문 디자인 컨설턴트입니다. 클라이언트의 요청을 분석해 디자인 방향성을 제안하세요.
비즈니스 특성, 타겟 고객층, 최근 트렌드, 브랜드 아이덴티티를 고려하세요.

반드시 아래 JSON 객체 하나만 출력하세요. 다른 설명은 붙이지 마세요.
{"designDirection": "추천 디자인 방향성 (예: 모던하고 심플한 미니멀 스타일)",
 "targetCustomer": "주요 타겟 고객층 (예: 20-30대 직장인 여성)",
 "requiredDesigns": "필요한 디자인 요소, 쉼표로 구분 (예: 로고, 명함, 포스터)"}"#;

/// Errors that can occur when generating a proposal
#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Turns a client's free-text brief into a structured proposal
#[async_trait]
pub trait ProposalGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Proposal, ProposalError>;
}

/// Messages-API client that asks a language model for a proposal
pub struct ProposalClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    client: Client,
}

impl ProposalClient {
    /// Create a new proposal client
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, ProposalError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            model,
            max_tokens,
            client,
        })
    }
}

#[async_trait]
impl ProposalGenerator for ProposalClient {
    async fn generate(&self, prompt: &str) -> Result<Proposal, ProposalError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        tracing::info!("Requesting design proposal from {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProposalError::ApiError(format!(
                "Failed to generate proposal: {} {}",
                status, detail
            )));
        }

        let json: Value = response.json().await?;

        let text = json
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
            })
            .and_then(|block| block.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| ProposalError::InvalidResponse("Missing text content block".into()))?;

        tracing::debug!("Proposal response text: {}", text);

        let proposal = parse_proposal(text)?;
        tracing::info!(
            "Design proposal generated - direction: {:?}",
            proposal.design_direction
        );

        Ok(proposal)
    }
}

/// Parse the model's JSON answer, tolerating Markdown code fences
pub fn parse_proposal(text: &str) -> Result<Proposal, ProposalError> {
    let trimmed = strip_code_fence(text.trim());

    serde_json::from_str(trimmed)
        .map_err(|e| ProposalError::InvalidResponse(format!("Failed to parse proposal: {}", e)))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // drop the optional language tag on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}
