//! Healthspan self-assessment: question catalog, scoring, share tokens and narrative.

pub mod catalog;
pub mod domain;
pub mod export;
pub mod narrative;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;
pub mod share;
pub mod views;

pub use catalog::{CatalogError, QuestionCatalog};
pub use domain::{
    Grade, InputValidationError, Polarity, Question, RawAnswers, ScoredResult, SystemConfig,
    SystemScore, SystemTag, UserInfo,
};
pub use export::render_text_summary;
pub use narrative::{
    DisabledNarrative, GeminiNarrativeClient, Narrative, NarrativeReport, NarrativeService,
    NarrativeTracker,
};
pub use router::assessment_router;
pub use scoring::score;
pub use service::{
    AssessmentOutcome, AssessmentService, AssessmentSubmission, NarrativeOutcome, SharedOutcome,
};
pub use session::{ResultSession, ViewState};
pub use share::{ShareDecodeError, ShareToken};
pub use views::{ResultView, ScoreBand};
