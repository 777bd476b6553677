use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answer recorded when a question was left blank.
pub const NEUTRAL_ANSWER: u8 = 3;
pub const MIN_ANSWER: u8 = 1;
pub const MAX_ANSWER: u8 = 5;

/// Placeholder identity attached to results rebuilt from a share token.
pub const ANONYMOUS_NAME: &str = "anonymous user";
pub const ANONYMOUS_FIELD: &str = "-";

/// The seven physiological systems questions and scores are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemTag {
    Assimilation,
    Defense,
    Energy,
    Detox,
    Transport,
    Communication,
    Structural,
}

/// Normalization ceiling and expected catalog cardinality for one system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemConfig {
    pub max_score: u32,
    pub expected_question_count: usize,
}

impl SystemTag {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Assimilation,
            Self::Defense,
            Self::Energy,
            Self::Detox,
            Self::Transport,
            Self::Communication,
            Self::Structural,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Assimilation => "Assimilation (Digestion)",
            Self::Defense => "Defense & Repair",
            Self::Energy => "Energy",
            Self::Detox => "Detoxification",
            Self::Transport => "Transport (Circulation)",
            Self::Communication => "Communication (Hormones)",
            Self::Structural => "Structural (Musculoskeletal)",
        }
    }

    pub const fn config(self) -> SystemConfig {
        match self {
            Self::Assimilation | Self::Defense | Self::Energy | Self::Communication => {
                SystemConfig {
                    max_score: 25,
                    expected_question_count: 5,
                }
            }
            Self::Detox | Self::Transport | Self::Structural => SystemConfig {
                max_score: 20,
                expected_question_count: 4,
            },
        }
    }
}

/// Whether a frequent answer signals good (`Positive`) or poor (`Negative`) health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// Map a raw 1-5 answer onto the "higher is healthier" scale.
    pub const fn contribution(self, answer: u8) -> u32 {
        match self {
            Self::Positive => answer as u32,
            Self::Negative => (MAX_ANSWER + MIN_ANSWER - answer) as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub system: SystemTag,
    pub polarity: Polarity,
    pub text: &'static str,
}

/// Free-form profile captured before the questionnaire starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub age: String,
    pub gender: String,
}

impl UserInfo {
    pub fn anonymous() -> Self {
        Self {
            name: ANONYMOUS_NAME.to_string(),
            age: ANONYMOUS_FIELD.to_string(),
            gender: ANONYMOUS_FIELD.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), InputValidationError> {
        for (field, value) in [
            ("name", &self.name),
            ("age", &self.age),
            ("gender", &self.gender),
        ] {
            if value.trim().is_empty() {
                return Err(InputValidationError::MissingProfileField(field));
            }
        }
        Ok(())
    }
}

/// Question id to raw answer in `[1, 5]`. Missing ids score as [`NEUTRAL_ANSWER`].
pub type RawAnswers = BTreeMap<String, u8>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemScore {
    pub system: SystemTag,
    pub score: u32,
    pub max_score: u32,
    pub percentage: u8,
}

/// Outcome of one completed assessment. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub identity: UserInfo,
    pub raw_answers: RawAnswers,
    pub system_scores: Vec<SystemScore>,
    pub total_score: u32,
    pub total_max: u32,
    pub overall_percentage: u8,
    pub timestamp: DateTime<Utc>,
}

impl ScoredResult {
    pub fn system(&self, tag: SystemTag) -> Option<&SystemScore> {
        self.system_scores.iter().find(|score| score.system == tag)
    }

    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.overall_percentage)
    }

    /// Systems ordered weakest first, ties kept in enumeration order.
    pub fn weakest_systems(&self) -> Vec<&SystemScore> {
        let mut scores: Vec<&SystemScore> = self.system_scores.iter().collect();
        scores.sort_by_key(|score| score.percentage);
        scores
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Optimal,
    Good,
    Moderate,
    NeedsAttention,
}

impl Grade {
    pub const fn from_percentage(percentage: u8) -> Self {
        match percentage {
            90..=u8::MAX => Self::Optimal,
            75..=89 => Self::Good,
            60..=74 => Self::Moderate,
            _ => Self::NeedsAttention,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Optimal => "Optimal",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::NeedsAttention => "Needs Attention",
        }
    }
}

/// Recoverable, user-correctable input problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputValidationError {
    #[error("profile field '{0}' is required")]
    MissingProfileField(&'static str),
    #[error("answer {value} for question '{question_id}' is outside [1, 5]")]
    AnswerOutOfRange { question_id: String, value: u8 },
    #[error("{} question(s) left unanswered: {}", .question_ids.len(), .question_ids.join(", "))]
    Unanswered { question_ids: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_polarity_flips_the_scale() {
        assert_eq!(Polarity::Negative.contribution(5), 1);
        assert_eq!(Polarity::Negative.contribution(1), 5);
        assert_eq!(Polarity::Negative.contribution(3), 3);
        assert_eq!(Polarity::Positive.contribution(4), 4);
    }

    #[test]
    fn grade_thresholds_follow_result_bands() {
        assert_eq!(Grade::from_percentage(100), Grade::Optimal);
        assert_eq!(Grade::from_percentage(90), Grade::Optimal);
        assert_eq!(Grade::from_percentage(89), Grade::Good);
        assert_eq!(Grade::from_percentage(75), Grade::Good);
        assert_eq!(Grade::from_percentage(74), Grade::Moderate);
        assert_eq!(Grade::from_percentage(60), Grade::Moderate);
        assert_eq!(Grade::from_percentage(59), Grade::NeedsAttention);
        assert_eq!(Grade::from_percentage(0), Grade::NeedsAttention);
    }

    #[test]
    fn profile_requires_every_field() {
        let mut info = UserInfo {
            name: "Jordan".to_string(),
            age: "41".to_string(),
            gender: "Other".to_string(),
        };
        assert!(info.validate().is_ok());

        info.age = "   ".to_string();
        assert_eq!(
            info.validate(),
            Err(InputValidationError::MissingProfileField("age"))
        );
    }

    #[test]
    fn system_configuration_totals_one_hundred_sixty() {
        let total: u32 = SystemTag::ordered()
            .into_iter()
            .map(|tag| tag.config().max_score)
            .sum();
        let questions: usize = SystemTag::ordered()
            .into_iter()
            .map(|tag| tag.config().expected_question_count)
            .sum();
        assert_eq!(total, 160);
        assert_eq!(questions, 32);
    }
}
