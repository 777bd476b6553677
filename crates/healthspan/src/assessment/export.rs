use std::fmt::Write as _;

use super::domain::ScoredResult;
use super::narrative::Narrative;

const TITLE: &str = "[4-Week Healthspan Project] Assessment Result";
const NARRATIVE_UNAVAILABLE: &str = "AI analysis unavailable.";

/// Plain-text summary for copy/paste sharing. Deterministic for a given input.
pub fn render_text_summary(result: &ScoredResult, narrative: Option<&Narrative>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Name: {}", result.identity.name);
    let _ = writeln!(
        out,
        "Overall score: {}/{} ({}%)",
        result.total_score, result.total_max, result.overall_percentage
    );
    let _ = writeln!(out, "Health grade: {}", result.grade().label());
    let _ = writeln!(out);
    let _ = writeln!(out, "[Scores by system]");
    for entry in &result.system_scores {
        let _ = writeln!(
            out,
            "- {}: {}/{} ({}%)",
            entry.system.label(),
            entry.score,
            entry.max_score,
            entry.percentage
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "AI health advice");
    match narrative.and_then(|narrative| narrative.summary.as_deref()) {
        Some(summary) => {
            let _ = writeln!(out, "\"{summary}\"");
        }
        None => {
            let _ = writeln!(out, "{NARRATIVE_UNAVAILABLE}");
        }
    }
    let _ = writeln!(out);
    let _ = write!(out, "Assessed on: {}", result.timestamp.format("%Y-%m-%d"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::catalog::QuestionCatalog;
    use crate::assessment::domain::{RawAnswers, UserInfo};
    use crate::assessment::scoring::score;
    use chrono::{TimeZone, Utc};

    fn neutral_result() -> ScoredResult {
        let catalog = QuestionCatalog::standard().unwrap();
        score(
            &RawAnswers::new(),
            UserInfo {
                name: "Alex".to_string(),
                age: "45".to_string(),
                gender: "Other".to_string(),
            },
            &catalog,
            Utc.with_ymd_and_hms(2025, 11, 2, 23, 59, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn renders_golden_summary_without_narrative() {
        let text = render_text_summary(&neutral_result(), None);
        let expected = "\
[4-Week Healthspan Project] Assessment Result

Name: Alex
Overall score: 96/160 (60%)
Health grade: Moderate

[Scores by system]
- Assimilation (Digestion): 15/25 (60%)
- Defense & Repair: 15/25 (60%)
- Energy: 15/25 (60%)
- Detoxification: 12/20 (60%)
- Transport (Circulation): 12/20 (60%)
- Communication (Hormones): 15/25 (60%)
- Structural (Musculoskeletal): 12/20 (60%)

AI health advice
AI analysis unavailable.

Assessed on: 2025-11-02";
        assert_eq!(text, expected);
    }

    #[test]
    fn quotes_narrative_summary_when_present() {
        let narrative = Narrative {
            summary: Some("Balanced overall.".to_string()),
            ..Narrative::default()
        };
        let text = render_text_summary(&neutral_result(), Some(&narrative));
        assert!(text.contains("\n\"Balanced overall.\"\n"));
        assert_eq!(text, render_text_summary(&neutral_result(), Some(&narrative)));
    }
}
