use async_trait::async_trait;
use healthspan::assessment::{
    DisabledNarrative, GeminiNarrativeClient, Narrative, NarrativeService, RawAnswers,
    ScoredResult,
};
use healthspan::config::NarrativeConfig;
use healthspan::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Narrative backend chosen at startup from configuration.
pub(crate) enum Narrator {
    Gemini(GeminiNarrativeClient),
    Disabled(DisabledNarrative),
}

impl Narrator {
    pub(crate) fn from_config(config: &NarrativeConfig) -> Self {
        if config.api_key.is_none() {
            info!("narrative api key not set; narratives disabled");
            return Self::Disabled(DisabledNarrative);
        }

        match GeminiNarrativeClient::new(config) {
            Ok(client) => {
                info!(model = %config.model, "narrative client configured");
                Self::Gemini(client)
            }
            Err(err) => {
                warn!(error = %err, "narrative client unavailable; narratives disabled");
                Self::Disabled(DisabledNarrative)
            }
        }
    }
}

#[async_trait]
impl NarrativeService for Narrator {
    async fn narrate(&self, result: &ScoredResult) -> Option<Narrative> {
        match self {
            Self::Gemini(client) => client.narrate(result).await,
            Self::Disabled(disabled) => disabled.narrate(result).await,
        }
    }

    fn is_enabled(&self) -> bool {
        matches!(self, Self::Gemini(_))
    }
}

/// Read a JSON object of `question id -> answer` from disk.
pub(crate) fn load_answers(path: &Path) -> Result<RawAnswers, AppError> {
    let raw = std::fs::read_to_string(path)?;
    parse_answers(&raw)
}

pub(crate) fn parse_answers(raw: &str) -> Result<RawAnswers, AppError> {
    Ok(serde_json::from_str(raw)?)
}
