use serde::Serialize;
use tracing::{debug, info};

use super::domain::ScoredResult;
use super::narrative::{NarrativeReport, NarrativeTicket, NarrativeTracker};
use super::share;

/// Which screen the client should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewState {
    Assessment,
    Results { result: ScoredResult, shared: bool },
}

impl ViewState {
    /// Resolve the landing view from an optional `share` query value.
    ///
    /// A malformed token falls back to the assessment entry view.
    pub fn from_share_param(share: Option<&str>) -> Self {
        let Some(token) = share.filter(|token| !token.trim().is_empty()) else {
            return Self::Assessment;
        };

        match share::decode(token) {
            Ok(result) => {
                info!("opening shared result");
                Self::Results {
                    result,
                    shared: true,
                }
            }
            Err(err) => {
                debug!(error = %err, "falling back to assessment view");
                Self::Assessment
            }
        }
    }

    pub fn result(&self) -> Option<&ScoredResult> {
        match self {
            Self::Results { result, .. } => Some(result),
            Self::Assessment => None,
        }
    }
}

/// Client-side flow between the questionnaire and a result page.
#[derive(Debug)]
pub struct ResultSession {
    view: ViewState,
    narrative: Option<NarrativeReport>,
    tracker: NarrativeTracker,
}

impl ResultSession {
    pub fn open(share: Option<&str>) -> Self {
        Self {
            view: ViewState::from_share_param(share),
            narrative: None,
            tracker: NarrativeTracker::default(),
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn narrative(&self) -> Option<&NarrativeReport> {
        self.narrative.as_ref()
    }

    /// Show a freshly scored result and start a narrative request for it.
    pub fn complete(&mut self, result: ScoredResult) -> NarrativeTicket {
        self.view = ViewState::Results {
            result,
            shared: false,
        };
        self.narrative = None;
        self.tracker.begin()
    }

    /// Start a narrative request for whatever result is on screen.
    pub fn request_narrative(&mut self) -> Option<NarrativeTicket> {
        self.view.result()?;
        self.narrative = None;
        Some(self.tracker.begin())
    }

    /// Back to the questionnaire; outstanding narrative replies become stale.
    pub fn reset(&mut self) {
        self.view = ViewState::Assessment;
        self.narrative = None;
        self.tracker.invalidate();
    }

    /// Store a narrative reply if it belongs to the current request.
    pub fn apply_narrative(&mut self, ticket: NarrativeTicket, report: NarrativeReport) -> bool {
        match self.tracker.accept(ticket, report) {
            Some(report) => {
                self.narrative = Some(report);
                true
            }
            None => false,
        }
    }
}
