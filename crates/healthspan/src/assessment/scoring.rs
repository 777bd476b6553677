use chrono::{DateTime, Utc};
use tracing::warn;

use super::catalog::QuestionCatalog;
use super::domain::{
    InputValidationError, RawAnswers, ScoredResult, SystemScore, SystemTag, UserInfo, MAX_ANSWER,
    MIN_ANSWER, NEUTRAL_ANSWER,
};

/// Round `numerator / denominator` half-up using exact integer arithmetic.
///
/// Both operands are non-negative, so this matches round-half-away-from-zero.
pub fn round_ratio(numerator: u64, denominator: u64) -> u64 {
    debug_assert!(denominator > 0, "catalog verification guarantees a divisor");
    (2 * numerator + denominator) / (2 * denominator)
}

/// `round(part / whole * 100)`, capped at 100.
pub fn percentage_of(part: u32, whole: u32) -> u8 {
    round_ratio(u64::from(part) * 100, u64::from(whole)).min(100) as u8
}

/// Score a set of raw answers against the catalog.
///
/// Missing answers count as the neutral midpoint. Answers outside `[1, 5]` are rejected
/// rather than clamped; ids the catalog does not know are ignored.
pub fn score(
    answers: &RawAnswers,
    identity: UserInfo,
    catalog: &QuestionCatalog,
    timestamp: DateTime<Utc>,
) -> Result<ScoredResult, InputValidationError> {
    for (question_id, &value) in answers {
        if !(MIN_ANSWER..=MAX_ANSWER).contains(&value) {
            warn!(%question_id, value, "rejecting out-of-range answer");
            return Err(InputValidationError::AnswerOutOfRange {
                question_id: question_id.clone(),
                value,
            });
        }
        if catalog.get(question_id).is_none() {
            warn!(%question_id, "ignoring answer for unknown question");
        }
    }

    let system_scores: Vec<SystemScore> = SystemTag::ordered()
        .into_iter()
        .map(|system| score_system(system, answers, catalog))
        .collect();

    let total_score = system_scores.iter().map(|entry| entry.score).sum();
    let total_max = system_scores.iter().map(|entry| entry.max_score).sum();

    Ok(ScoredResult {
        identity,
        raw_answers: answers.clone(),
        system_scores,
        total_score,
        total_max,
        overall_percentage: percentage_of(total_score, total_max),
        timestamp,
    })
}

fn score_system(system: SystemTag, answers: &RawAnswers, catalog: &QuestionCatalog) -> SystemScore {
    let questions = catalog.questions_for(system);
    let raw: u32 = questions
        .iter()
        .map(|question| {
            let answer = answers
                .get(question.id)
                .copied()
                .unwrap_or(NEUTRAL_ANSWER);
            question.polarity.contribution(answer)
        })
        .sum();
    let raw_max = questions.len() as u64 * u64::from(MAX_ANSWER);

    let max_score = system.config().max_score;
    let score = round_ratio(u64::from(raw) * u64::from(max_score), raw_max) as u32;

    SystemScore {
        system,
        score,
        max_score,
        percentage: percentage_of(score, max_score),
    }
}
