use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{Matcher, SessionStore};
use crate::models::{
    ErrorResponse, HealthResponse, RecommendRequest, RecommendationResponse, RecommendedDesigner,
    RefreshRequest, ScoredDesigner,
};
use crate::services::{CandidateSource, ProposalGenerator};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub proposals: Arc<dyn ProposalGenerator>,
    pub candidates: Arc<dyn CandidateSource>,
    pub sessions: Arc<SessionStore>,
    pub matcher: Matcher,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/ai/recommend", web::post().to(recommend))
        .route("/ai/refresh", web::post().to(refresh_by_body))
        .route("/ai/refresh/{session_id}", web::post().to(refresh_by_path))
        .route("/ai/session/{session_id}", web::get().to(session_info));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        active_sessions: state.sessions.active_session_count(),
    })
}

/// Recommend designers for a free-text brief
///
/// POST /api/v1/ai/recommend
///
/// Request body:
/// ```json
/// { "prompt": "string" }
/// ```
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommend request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            errors.to_string(),
            400,
        ));
    }

    let proposal = match state.proposals.generate(&req.prompt).await {
        Ok(proposal) => proposal,
        Err(e) => {
            tracing::error!("Failed to generate design proposal: {}", e);
            return HttpResponse::BadGateway().json(ErrorResponse::new(
                "Failed to generate proposal",
                e.to_string(),
                502,
            ));
        }
    };

    let scored = match state
        .matcher
        .find_scored_matching_designers(&proposal, state.candidates.as_ref())
        .await
    {
        Ok(scored) => scored,
        Err(e) => {
            tracing::error!("Failed to look up designer candidates: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to find designers",
                e.to_string(),
                500,
            ));
        }
    };

    let session_id = state.sessions.create_session(proposal.clone(), scored);
    let page = state.sessions.get_initial_recommendations(&session_id);

    tracing::info!(
        "Returning {} recommended designers for session {}",
        page.len(),
        session_id
    );

    HttpResponse::Ok().json(RecommendationResponse {
        proposal,
        recommended_designers: summaries(page),
        session_id,
    })
}

/// Refresh recommendations, session id in the path
///
/// POST /api/v1/ai/refresh/{sessionId}
async fn refresh_by_path(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    refresh(&state, &path.into_inner())
}

/// Refresh recommendations, session id in the body
///
/// POST /api/v1/ai/refresh
///
/// Request body:
/// ```json
/// { "sessionId": "string" }
/// ```
async fn refresh_by_body(
    state: web::Data<AppState>,
    req: web::Json<RefreshRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            errors.to_string(),
            400,
        ));
    }

    refresh(&state, &req.session_id)
}

fn refresh(state: &AppState, session_id: &str) -> HttpResponse {
    let page = state.sessions.get_refreshed_recommendations(session_id);

    if page.is_empty() {
        return session_not_found(session_id);
    }

    HttpResponse::Ok().json(summaries(page))
}

/// Session introspection
///
/// GET /api/v1/ai/session/{sessionId}
async fn session_info(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match state.sessions.get_session(&session_id) {
        Some(session) => HttpResponse::Ok().json(session.snapshot()),
        None => session_not_found(&session_id),
    }
}

fn session_not_found(session_id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        "Session not found",
        format!("No active recommendations for session {}", session_id),
        404,
    ))
}

fn summaries(page: Vec<ScoredDesigner>) -> Vec<RecommendedDesigner> {
    page.into_iter().map(|scored| scored.designer).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionConfig;
    use crate::models::{DesignCategory, DesignStyle, DesignerCandidate, Proposal};
    use crate::services::{InMemoryCandidateSource, ProposalError};
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;

    struct FixedProposal(Option<Proposal>);

    #[async_trait]
    impl ProposalGenerator for FixedProposal {
        async fn generate(&self, _prompt: &str) -> Result<Proposal, ProposalError> {
            self.0
                .clone()
                .ok_or_else(|| ProposalError::ApiError("upstream down".to_string()))
        }
    }

    fn designer(id: i64, categories: Vec<DesignCategory>, styles: Vec<DesignStyle>) -> DesignerCandidate {
        DesignerCandidate {
            user_id: id,
            nickname: format!("designer{}", id),
            categories,
            styles,
            ..Default::default()
        }
    }

    fn state(proposal: Option<Proposal>) -> AppState {
        let designers = vec![
            designer(1, vec![DesignCategory::Logo], vec![DesignStyle::Modern]),
            designer(2, vec![DesignCategory::Logo], vec![]),
            designer(3, vec![DesignCategory::Card], vec![]),
            designer(4, vec![], vec![DesignStyle::Modern]),
        ];

        AppState {
            proposals: Arc::new(FixedProposal(proposal)),
            candidates: Arc::new(InMemoryCandidateSource::new(designers)),
            sessions: Arc::new(SessionStore::new(SessionConfig {
                shuffle_seed: Some(11),
                ..Default::default()
            })),
            matcher: Matcher::default(),
        }
    }

    fn logo_proposal() -> Proposal {
        Proposal::new("모던한 느낌", "직장인", "로고, 명함")
    }

    #[actix_web::test]
    async fn test_recommend_returns_top_two_and_session() {
        let state = state(Some(logo_proposal()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/ai/recommend")
            .set_json(serde_json::json!({ "prompt": "카페 로고와 명함이 필요해요" }))
            .to_request();
        let body: RecommendationResponse = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<i64> = body.recommended_designers.iter().map(|d| d.user_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(body.session_id.starts_with("session_"));
        assert_eq!(state.sessions.len(), 1);
    }

    #[actix_web::test]
    async fn test_recommend_rejects_blank_prompt() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(Some(logo_proposal()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/ai/recommend")
            .set_json(serde_json::json!({ "prompt": "   " }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_recommend_maps_generation_failure() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(None)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/ai/recommend")
            .set_json(serde_json::json!({ "prompt": "로고" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_refresh_unknown_session_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(Some(logo_proposal()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/ai/refresh/session_missing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/ai/refresh")
            .set_json(serde_json::json!({ "sessionId": "session_missing" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_refresh_and_session_info() {
        let state = state(Some(logo_proposal()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/ai/recommend")
            .set_json(serde_json::json!({ "prompt": "로고" }))
            .to_request();
        let body: RecommendationResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/ai/refresh/{}", body.session_id))
            .to_request();
        let refreshed: Vec<RecommendedDesigner> = test::call_and_read_body_json(&app, req).await;

        // four candidates, two already shown
        let mut ids: Vec<i64> = refreshed.iter().map(|d| d.user_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![3, 4]);

        let req = test::TestRequest::get()
            .uri(&format!("/ai/session/{}", body.session_id))
            .to_request();
        let snapshot: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(snapshot["sessionId"], body.session_id.as_str());
        assert_eq!(snapshot["allMatchingDesigners"].as_array().map(Vec::len), Some(4));
        assert_eq!(snapshot["returnedDesignerIds"].as_array().map(Vec::len), Some(4));
    }

    #[actix_web::test]
    async fn test_health_reports_active_sessions() {
        let state = state(Some(logo_proposal()));
        state.sessions.create_session(logo_proposal(), Vec::new());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "healthy");
        assert_eq!(body.active_sessions, 1);
    }
}
