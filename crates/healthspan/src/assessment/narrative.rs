//! Optional natural-language interpretation of a scored result.
//!
//! The narrative is enrichment only: it is requested after the scored result has been
//! returned, and every failure collapses into [`NarrativeReport::Unavailable`].

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::domain::ScoredResult;
use crate::config::NarrativeConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Narrative {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.recommendations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "report", rename_all = "snake_case")]
pub enum NarrativeReport {
    Available(Narrative),
    /// Requested separately once the scored result is on screen.
    Pending,
    Unavailable,
}

impl NarrativeReport {
    pub fn narrative(&self) -> Option<&Narrative> {
        match self {
            Self::Available(narrative) => Some(narrative),
            Self::Pending | Self::Unavailable => None,
        }
    }
}

impl From<Option<Narrative>> for NarrativeReport {
    fn from(value: Option<Narrative>) -> Self {
        match value {
            Some(narrative) => Self::Available(narrative),
            None => Self::Unavailable,
        }
    }
}

/// Produces a narrative for a result, or nothing.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn narrate(&self, result: &ScoredResult) -> Option<Narrative>;

    /// Whether asking is worth it at all; a disabled service always answers `None`.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNarrative;

#[async_trait]
impl NarrativeService for DisabledNarrative {
    async fn narrate(&self, _result: &ScoredResult) -> Option<Narrative> {
        None
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative api key is not configured")]
    MissingApiKey,
    #[error("narrative transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("narrative service returned HTTP {status}")]
    Status { status: u16 },
    #[error("narrative reply was malformed: {0}")]
    MalformedReply(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiNarrativeClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiNarrativeClient {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(NarrativeError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub async fn request(&self, result: &ScoredResult) -> Result<Narrative, NarrativeError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(result),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        debug!(%url, "requesting narrative");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NarrativeError::Status {
                status: status.as_u16(),
            });
        }

        let reply: GenerateResponse = response.json().await.map_err(transport)?;
        let text = reply
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.text)
            .ok_or_else(|| NarrativeError::MalformedReply("no candidate text".to_string()))?;

        parse_reply(&text)
    }
}

/// Transport errors are logged, so they must not carry the request URL.
fn transport(err: reqwest::Error) -> NarrativeError {
    NarrativeError::Transport(err.without_url())
}

#[async_trait]
impl NarrativeService for GeminiNarrativeClient {
    async fn narrate(&self, result: &ScoredResult) -> Option<Narrative> {
        match self.request(result).await {
            Ok(narrative) => {
                info!(model = %self.model, "narrative generated");
                Some(narrative)
            }
            Err(err) => {
                warn!(error = %err, "narrative unavailable");
                None
            }
        }
    }
}

/// Prompt embedding the profile, totals and per-system scores.
pub fn build_prompt(result: &ScoredResult) -> String {
    let mut prompt = String::from(
        "You are a functional medicine specialist reviewing the results of the \
         four-week healthspan self-assessment.\n\n",
    );

    let identity = &result.identity;
    let _ = writeln!(prompt, "Profile");
    let _ = writeln!(prompt, "Name: {}", identity.name);
    let _ = writeln!(prompt, "Age: {}", identity.age);
    let _ = writeln!(prompt, "Gender: {}\n", identity.gender);
    let _ = writeln!(
        prompt,
        "Overall score: {}/{} ({}%)\n",
        result.total_score, result.total_max, result.overall_percentage
    );
    let _ = writeln!(prompt, "Scores by system");
    for entry in &result.system_scores {
        let _ = writeln!(
            prompt,
            "- {}: {}/{} ({}%)",
            entry.system.label(),
            entry.score,
            entry.max_score,
            entry.percentage
        );
    }

    if let Some(weakest) = result.weakest_systems().first() {
        let _ = writeln!(
            prompt,
            "\nPrioritise advice for the weakest system ({}).",
            weakest.system.label()
        );
    }

    prompt.push_str(
        "\nWrite a personalised report in a professional, warm and encouraging tone. \
         Reply with JSON only, in exactly this shape:\n\
         {\n  \"summary\": \"two-sentence overview\",\n  \"strengths\": [\"...\", \"...\"],\n  \
         \"weaknesses\": [\"...\", \"...\"],\n  \"recommendations\": [\"...\", \"...\", \"...\"]\n}\n",
    );
    prompt
}

/// Lenient parse of the model reply; any field may be missing or mistyped.
pub fn parse_reply(raw: &str) -> Result<Narrative, NarrativeError> {
    let cleaned = strip_code_fence(raw);
    let value: Value = serde_json::from_str(cleaned)
        .map_err(|err| NarrativeError::MalformedReply(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| NarrativeError::MalformedReply("reply is not an object".to_string()))?;

    let strings = |key: &str| -> Vec<String> {
        object
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let narrative = Narrative {
        summary: object
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        strengths: strings("strengths"),
        weaknesses: strings("weaknesses"),
        recommendations: strings("recommendations"),
    };

    if narrative.is_empty() {
        return Err(NarrativeError::MalformedReply(
            "reply carried no usable fields".to_string(),
        ));
    }
    Ok(narrative)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Identifies one in-flight narrative request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrativeTicket(u64);

/// Discards narrative replies that arrive after the user has moved on.
#[derive(Debug, Default)]
pub struct NarrativeTracker {
    generation: AtomicU64,
}

impl NarrativeTracker {
    pub fn begin(&self) -> NarrativeTicket {
        NarrativeTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_current(&self, ticket: NarrativeTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    pub fn accept(&self, ticket: NarrativeTicket, report: NarrativeReport) -> Option<NarrativeReport> {
        if self.is_current(ticket) {
            Some(report)
        } else {
            debug!("discarding stale narrative reply");
            None
        }
    }
}
