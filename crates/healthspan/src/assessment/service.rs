use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::catalog::QuestionCatalog;
use super::domain::{InputValidationError, RawAnswers, ScoredResult, UserInfo};
use super::export::render_text_summary;
use super::narrative::{NarrativeReport, NarrativeService};
use super::scoring::score;
use super::session::ViewState;
use super::share::{self, ShareDecodeError, ShareToken};
use super::views::ResultView;

/// A completed questionnaire as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentSubmission {
    pub user: UserInfo,
    #[serde(default)]
    pub answers: RawAnswers,
    /// Score even when questions are unanswered; they count as neutral.
    #[serde(default)]
    pub allow_partial: bool,
    #[serde(default = "default_include_narrative")]
    pub include_narrative: bool,
}

fn default_include_narrative() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentOutcome {
    pub result: ScoredResult,
    pub view: ResultView,
    pub share_token: ShareToken,
    pub share_url: String,
    pub narrative: NarrativeReport,
    pub text_summary: String,
}

/// Narrative for a result already on screen, with the export re-rendered to include it.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeOutcome {
    pub narrative: NarrativeReport,
    pub text_summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedOutcome {
    pub result: ScoredResult,
    pub view: ResultView,
    pub text_summary: String,
}

/// Composes the catalog, scoring engine, share codec and narrative collaborator.
pub struct AssessmentService<N> {
    catalog: Arc<QuestionCatalog>,
    narrator: Arc<N>,
    share_base: Url,
}

impl<N> AssessmentService<N>
where
    N: NarrativeService + 'static,
{
    pub fn new(catalog: Arc<QuestionCatalog>, narrator: Arc<N>, share_base: Url) -> Self {
        Self {
            catalog,
            narrator,
            share_base,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Validate, score and share one assessment.
    ///
    /// Never waits on the narrative service: the outcome reports the narrative as
    /// `pending` and the client fetches it through [`AssessmentService::narrate`].
    pub fn submit(
        &self,
        submission: AssessmentSubmission,
    ) -> Result<AssessmentOutcome, InputValidationError> {
        let AssessmentSubmission {
            user,
            answers,
            allow_partial,
            include_narrative,
        } = submission;

        user.validate()?;
        if !allow_partial {
            let unanswered = self.catalog.unanswered(&answers);
            if !unanswered.is_empty() {
                return Err(InputValidationError::Unanswered {
                    question_ids: unanswered.into_iter().map(str::to_string).collect(),
                });
            }
        }

        let result = score(&answers, user, &self.catalog, Utc::now())?;
        info!(
            total = result.total_score,
            overall_pct = result.overall_percentage,
            "assessment scored"
        );

        let share_token = share::encode(&result);
        let share_url = share::share_link(&self.share_base, &share_token).to_string();

        let narrative = if include_narrative && self.narrator.is_enabled() {
            NarrativeReport::Pending
        } else {
            NarrativeReport::Unavailable
        };

        let text_summary = render_text_summary(&result, None);
        let view = ResultView::from_result(&result, false);

        Ok(AssessmentOutcome {
            result,
            view,
            share_token,
            share_url,
            narrative,
            text_summary,
        })
    }

    /// Ask the narrative service about a scored result.
    pub async fn narrate(&self, result: &ScoredResult) -> NarrativeOutcome {
        let narrative = NarrativeReport::from(self.narrator.narrate(result).await);
        let text_summary = render_text_summary(result, narrative.narrative());
        NarrativeOutcome {
            narrative,
            text_summary,
        }
    }

    /// Rebuild the anonymized result behind a share token.
    pub fn open_shared(&self, token: &str) -> Result<SharedOutcome, ShareDecodeError> {
        let result = share::decode(token)?;
        let text_summary = render_text_summary(&result, None);
        let view = ResultView::from_result(&result, true);
        Ok(SharedOutcome {
            result,
            view,
            text_summary,
        })
    }

    pub fn landing(&self, share: Option<&str>) -> ViewState {
        ViewState::from_share_param(share)
    }
}
