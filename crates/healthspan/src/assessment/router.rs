use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{Question, ScoredResult, SystemTag};
use super::narrative::NarrativeService;
use super::service::{
    AssessmentOutcome, AssessmentService, AssessmentSubmission, NarrativeOutcome, SharedOutcome,
};
use super::session::ViewState;
use crate::error::AppError;

/// Router builder exposing the questionnaire, scoring, narrative and share endpoints.
pub fn assessment_router<N>(service: Arc<AssessmentService<N>>) -> Router
where
    N: NarrativeService + 'static,
{
    Router::new()
        .route("/api/v1/questions", get(catalog_handler::<N>))
        .route("/api/v1/assessments", post(submit_handler::<N>))
        .route("/api/v1/narratives", post(narrative_handler::<N>))
        .route("/api/v1/share/:token", get(shared_handler::<N>))
        .route("/api/v1/landing", get(landing_handler::<N>))
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub struct SystemEntry {
    pub system: SystemTag,
    pub label: &'static str,
    pub max_score: u32,
    pub question_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub systems: Vec<SystemEntry>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct NarrativeRequest {
    pub result: ScoredResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct LandingQuery {
    pub share: Option<String>,
}

pub(crate) async fn catalog_handler<N>(
    State(service): State<Arc<AssessmentService<N>>>,
) -> Json<CatalogResponse>
where
    N: NarrativeService + 'static,
{
    let catalog = service.catalog();
    let systems = SystemTag::ordered()
        .into_iter()
        .map(|system| SystemEntry {
            system,
            label: system.label(),
            max_score: system.config().max_score,
            question_count: catalog.questions_for(system).len(),
        })
        .collect();

    Json(CatalogResponse {
        systems,
        questions: catalog.questions().to_vec(),
    })
}

pub(crate) async fn submit_handler<N>(
    State(service): State<Arc<AssessmentService<N>>>,
    Json(submission): Json<AssessmentSubmission>,
) -> Result<(StatusCode, Json<AssessmentOutcome>), AppError>
where
    N: NarrativeService + 'static,
{
    let outcome = service.submit(submission)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub(crate) async fn narrative_handler<N>(
    State(service): State<Arc<AssessmentService<N>>>,
    Json(request): Json<NarrativeRequest>,
) -> Json<NarrativeOutcome>
where
    N: NarrativeService + 'static,
{
    Json(service.narrate(&request.result).await)
}

pub(crate) async fn shared_handler<N>(
    State(service): State<Arc<AssessmentService<N>>>,
    Path(token): Path<String>,
) -> Result<Json<SharedOutcome>, AppError>
where
    N: NarrativeService + 'static,
{
    Ok(Json(service.open_shared(&token)?))
}

pub(crate) async fn landing_handler<N>(
    State(service): State<Arc<AssessmentService<N>>>,
    Query(query): Query<LandingQuery>,
) -> Json<ViewState>
where
    N: NarrativeService + 'static,
{
    Json(service.landing(query.share.as_deref()))
}
