use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use healthspan::assessment::{
    assessment_router, share, AssessmentService, DisabledNarrative, Narrative, NarrativeService,
    QuestionCatalog, ScoredResult,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use url::Url;

#[derive(Default)]
struct CannedNarrative {
    calls: AtomicUsize,
}

#[async_trait]
impl NarrativeService for CannedNarrative {
    async fn narrate(&self, result: &ScoredResult) -> Option<Narrative> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(Narrative {
            summary: Some(format!("Overall {}%.", result.overall_percentage)),
            strengths: vec!["Energy".to_string()],
            weaknesses: vec![],
            recommendations: vec!["Sleep earlier".to_string()],
        })
    }
}

fn service<N: NarrativeService + 'static>(narrator: Arc<N>) -> Arc<AssessmentService<N>> {
    Arc::new(AssessmentService::new(
        Arc::new(QuestionCatalog::standard().expect("standard catalog is consistent")),
        narrator,
        Url::parse("https://healthspan.example/").unwrap(),
    ))
}

fn router() -> Router {
    assessment_router(service(Arc::new(DisabledNarrative)))
}

fn full_answers(value: u8) -> Value {
    let catalog = QuestionCatalog::standard().unwrap();
    let answers: serde_json::Map<String, Value> = catalog
        .questions()
        .iter()
        .map(|question| (question.id.to_string(), json!(value)))
        .collect();
    Value::Object(answers)
}

fn user() -> Value {
    json!({ "name": "Dana", "age": "52", "gender": "Female" })
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_assessment(payload: Value) -> Request<Body> {
    Request::post("/api/v1/assessments")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn questions_endpoint_lists_catalog() {
    let (status, body) = send(
        router(),
        Request::get("/api/v1/questions").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["systems"].as_array().unwrap().len(), 7);
    assert_eq!(body["questions"].as_array().unwrap().len(), 32);
    assert_eq!(body["systems"][3]["system"], "detox");
    assert_eq!(body["systems"][3]["max_score"], 20);
}

#[tokio::test]
async fn complete_submission_is_scored_without_narrative() {
    let (status, body) = send(
        router(),
        post_assessment(json!({ "user": user(), "answers": full_answers(3) })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result"]["total_score"], 96);
    assert_eq!(body["result"]["overall_percentage"], 60);
    assert_eq!(body["view"]["grade"], "moderate");
    assert_eq!(body["narrative"]["status"], "unavailable");
    assert!(body["text_summary"]
        .as_str()
        .unwrap()
        .contains("AI analysis unavailable."));

    let share_url = body["share_url"].as_str().unwrap();
    let token = body["share_token"].as_str().unwrap();
    assert_eq!(share_url, format!("https://healthspan.example/?share={token}"));
}

#[tokio::test]
async fn narrative_is_fetched_after_the_result() {
    let narrator = Arc::new(CannedNarrative::default());
    let router = assessment_router(service(narrator.clone()));

    let (status, created) = send(
        router.clone(),
        post_assessment(json!({ "user": user(), "answers": full_answers(4) })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["narrative"]["status"], "pending");
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 0);

    let (status, body) = send(
        router,
        Request::post("/api/v1/narratives")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({ "result": created["result"] })).unwrap(),
            ))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(body["narrative"]["status"], "available");
    assert_eq!(body["narrative"]["report"]["strengths"][0], "Energy");
    assert!(body["text_summary"].as_str().unwrap().contains("\"Overall "));
    assert!(body["text_summary"].as_str().unwrap().contains("Name: Dana"));
}

#[tokio::test]
async fn narrative_can_be_skipped() {
    let narrator = Arc::new(CannedNarrative::default());
    let router = assessment_router(service(narrator.clone()));

    let (status, body) = send(
        router,
        post_assessment(json!({
            "user": user(),
            "answers": full_answers(2),
            "include_narrative": false,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(narrator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(body["narrative"]["status"], "unavailable");
}

#[tokio::test]
async fn incomplete_submission_is_rejected_unless_partial_allowed() {
    let mut answers = full_answers(5);
    answers.as_object_mut().unwrap().remove("dx2");

    let (status, body) = send(
        router(),
        post_assessment(json!({ "user": user(), "answers": answers.clone() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("dx2"));

    let (status, body) = send(
        router(),
        post_assessment(json!({ "user": user(), "answers": answers, "allow_partial": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result"]["raw_answers"].as_object().unwrap().len(), 31);
}

#[tokio::test]
async fn missing_profile_field_is_rejected() {
    let (status, body) = send(
        router(),
        post_assessment(json!({
            "user": { "name": "Dana", "age": "", "gender": "Female" },
            "answers": full_answers(3),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("age"));
}

#[tokio::test]
async fn out_of_range_answer_is_rejected() {
    let mut answers = full_answers(3);
    answers["c4"] = json!(9);

    let (status, body) = send(
        router(),
        post_assessment(json!({ "user": user(), "answers": answers })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("c4"));
}

#[tokio::test]
async fn shared_endpoint_returns_anonymized_result() {
    let (_, created) = send(
        router(),
        post_assessment(json!({ "user": user(), "answers": full_answers(4) })),
    )
    .await;
    let token = created["share_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        router(),
        Request::get(format!("/api/v1/share/{token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["identity"]["name"], "anonymous user");
    assert_eq!(body["result"]["raw_answers"], json!({}));
    assert_eq!(body["result"]["total_score"], created["result"]["total_score"]);
    assert_eq!(body["view"]["shared"], true);
    assert!(!body["text_summary"].as_str().unwrap().contains("Dana"));
}

#[tokio::test]
async fn shared_endpoint_rejects_malformed_token() {
    let (status, body) = send(
        router(),
        Request::get("/api/v1/share/definitely-not-a-token")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("malformed share token"));
}

#[tokio::test]
async fn landing_falls_back_to_assessment() {
    let (status, body) = send(
        router(),
        Request::get("/api/v1/landing?share=broken")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "view": "assessment" }));

    let (_, body) = send(
        router(),
        Request::get("/api/v1/landing").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(body, json!({ "view": "assessment" }));
}

#[tokio::test]
async fn landing_with_share_token_opens_shared_results() {
    let catalog = QuestionCatalog::standard().unwrap();
    let result = healthspan::assessment::score(
        &Default::default(),
        healthspan::assessment::UserInfo {
            name: "Dana".to_string(),
            age: "52".to_string(),
            gender: "Female".to_string(),
        },
        &catalog,
        chrono::Utc::now(),
    )
    .unwrap();
    let token = share::encode(&result);

    let (status, body) = send(
        router(),
        Request::get(format!("/api/v1/landing?share={token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "results");
    assert_eq!(body["shared"], true);
    assert_eq!(body["result"]["identity"]["name"], "anonymous user");
}
