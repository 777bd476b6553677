//! Privacy-stripped share tokens.
//!
//! A token carries exactly five fields of a [`ScoredResult`]: system scores, total score,
//! total max, overall percentage and timestamp. Identity and raw answers never reach the
//! wire, so a decoded token is rebuilt with the anonymous profile and an empty answer map.
//!
//! Wire form: compact JSON with the fixed key order `s, t, tm, op, d`, encoded with the
//! URL-safe base64 alphabet without padding. There is no schema version tag; adding a
//! field is a breaking change for existing links.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::domain::{RawAnswers, ScoredResult, SystemScore, SystemTag, UserInfo};

/// Query parameter carrying a share token.
pub const SHARE_PARAM: &str = "share";

/// Opaque, URL-safe share token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ShareToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ShareToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareDecodeError {
    #[error("malformed share token: {0}")]
    MalformedToken(String),
}

impl ShareDecodeError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken(reason.into())
    }
}

/// The only fields allowed on the wire.
#[derive(Debug, Serialize)]
struct SharePayloadRef<'a> {
    s: &'a [SystemScore],
    t: u32,
    tm: u32,
    op: u8,
    d: &'a DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SharePayload {
    s: Vec<WireSystemScore>,
    t: u32,
    tm: u32,
    op: u8,
    d: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireSystemScore {
    system: SystemTag,
    score: u32,
    max_score: u32,
    percentage: u8,
}

impl From<WireSystemScore> for SystemScore {
    fn from(value: WireSystemScore) -> Self {
        SystemScore {
            system: value.system,
            score: value.score,
            max_score: value.max_score,
            percentage: value.percentage,
        }
    }
}

/// Serialize the shareable projection of `result`. Identity and answers are dropped.
pub fn encode(result: &ScoredResult) -> ShareToken {
    let payload = SharePayloadRef {
        s: &result.system_scores,
        t: result.total_score,
        tm: result.total_max,
        op: result.overall_percentage,
        d: &result.timestamp,
    };
    let json = serde_json::to_vec(&payload)
        .expect("share payload of integers, unit enums and a timestamp serializes");
    ShareToken(URL_SAFE_NO_PAD.encode(json))
}

/// Rebuild an anonymized result from a token. Never yields a partial result.
pub fn decode(token: &str) -> Result<ScoredResult, ShareDecodeError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|err| {
        debug!(token_len = token.len(), "share token is not url-safe base64");
        ShareDecodeError::malformed(format!("invalid encoding ({err})"))
    })?;

    let payload: SharePayload = serde_json::from_slice(&bytes).map_err(|err| {
        debug!(token_len = token.len(), "share token payload failed to parse");
        ShareDecodeError::malformed(format!("invalid payload ({err})"))
    })?;

    let system_scores: Vec<SystemScore> = payload.s.into_iter().map(SystemScore::from).collect();
    validate(&system_scores, payload.t, payload.tm, payload.op)?;

    Ok(ScoredResult {
        identity: UserInfo::anonymous(),
        raw_answers: RawAnswers::new(),
        system_scores,
        total_score: payload.t,
        total_max: payload.tm,
        overall_percentage: payload.op,
        timestamp: payload.d,
    })
}

fn validate(
    system_scores: &[SystemScore],
    total_score: u32,
    total_max: u32,
    overall_percentage: u8,
) -> Result<(), ShareDecodeError> {
    let ordered = SystemTag::ordered();
    if system_scores.len() != ordered.len()
        || system_scores
            .iter()
            .zip(ordered)
            .any(|(entry, expected)| entry.system != expected)
    {
        return Err(ShareDecodeError::malformed(
            "system scores must list every system once in order",
        ));
    }

    if let Some(entry) = system_scores
        .iter()
        .find(|entry| entry.score > entry.max_score || entry.percentage > 100)
    {
        return Err(ShareDecodeError::malformed(format!(
            "score for '{}' is out of range",
            entry.system.label()
        )));
    }

    if total_score > total_max || overall_percentage > 100 {
        return Err(ShareDecodeError::malformed("overall score is out of range"));
    }

    Ok(())
}

/// `base` with its query replaced by a single `share` pair.
pub fn share_link(base: &Url, token: &ShareToken) -> Url {
    let mut link = base.clone();
    link.set_query(None);
    link.set_fragment(None);
    link.query_pairs_mut().append_pair(SHARE_PARAM, token.as_str());
    link
}

pub fn token_from_url(url: &Url) -> Option<ShareToken> {
    url.query_pairs()
        .find(|(key, _)| key == SHARE_PARAM)
        .map(|(_, value)| ShareToken(value.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ScoredResult {
        let system_scores = SystemTag::ordered()
            .into_iter()
            .map(|system| {
                let max_score = system.config().max_score;
                SystemScore {
                    system,
                    score: max_score - 3,
                    max_score,
                    percentage: ((max_score - 3) * 100 / max_score) as u8,
                }
            })
            .collect();
        let mut raw_answers = RawAnswers::new();
        raw_answers.insert("a1".to_string(), 2);
        ScoredResult {
            identity: UserInfo {
                name: "Robin".to_string(),
                age: "52".to_string(),
                gender: "Male".to_string(),
            },
            raw_answers,
            system_scores,
            total_score: 139,
            total_max: 160,
            overall_percentage: 87,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn token_uses_only_url_safe_characters() {
        let token = encode(&sample());
        assert!(token
            .as_str()
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }

    #[test]
    fn encoded_token_always_carries_a_payload() {
        let mut extreme = sample();
        for entry in &mut extreme.system_scores {
            entry.score = 0;
            entry.percentage = 0;
        }
        extreme.total_score = 0;
        extreme.overall_percentage = 0;

        let token = encode(&extreme);
        assert!(!token.as_str().is_empty());
        let decoded = decode(token.as_str()).expect("zero scores decode");
        assert_eq!(decoded.total_score, 0);
        assert_eq!(decoded.system_scores, extreme.system_scores);
    }

    #[test]
    fn wire_form_omits_identity_and_answers() {
        let token = encode(&sample());
        let json = URL_SAFE_NO_PAD.decode(token.as_str()).unwrap();
        let text = String::from_utf8(json).unwrap();
        assert!(text.starts_with("{\"s\":["));
        assert!(!text.contains("Robin"));
        assert!(!text.contains("a1"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn rejects_unknown_wire_fields() {
        let text = r#"{"s":[],"t":0,"tm":0,"op":0,"d":"2025-06-01T08:00:00Z","name":"x"}"#;
        let token = URL_SAFE_NO_PAD.encode(text);
        assert!(matches!(
            decode(&token),
            Err(ShareDecodeError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_scores_above_their_ceiling() {
        let mut tampered = sample();
        tampered.system_scores[2].score = 99;
        let token = encode(&tampered);
        let err = decode(token.as_str()).expect_err("score above max");
        assert!(err.to_string().contains("Energy"));
    }

    #[test]
    fn share_link_replaces_existing_query() {
        let base = Url::parse("https://example.org/healthspan/?share=old&x=1#top").unwrap();
        let token = ShareToken::from("abc-_123");
        let link = share_link(&base, &token);
        assert_eq!(link.as_str(), "https://example.org/healthspan/?share=abc-_123");
        assert_eq!(token_from_url(&link), Some(token));
    }
}
