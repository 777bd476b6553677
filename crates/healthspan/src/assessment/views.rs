use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Grade, ScoredResult, SystemScore, SystemTag};

/// Colour band for a system's bar in the result chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub const fn from_percentage(percentage: u8) -> Self {
        if percentage > 70 {
            Self::Strong
        } else if percentage > 40 {
            Self::Fair
        } else {
            Self::Weak
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Fair => "Fair",
            Self::Weak => "Weak",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemScoreView {
    pub system: SystemTag,
    pub system_label: &'static str,
    pub score: u32,
    pub max_score: u32,
    pub percentage: u8,
    pub band: ScoreBand,
}

impl From<&SystemScore> for SystemScoreView {
    fn from(entry: &SystemScore) -> Self {
        Self {
            system: entry.system,
            system_label: entry.system.label(),
            score: entry.score,
            max_score: entry.max_score,
            percentage: entry.percentage,
            band: ScoreBand::from_percentage(entry.percentage),
        }
    }
}

/// One spoke of the radar chart, scaled 0-100.
#[derive(Debug, Clone, Serialize)]
pub struct RadarPoint {
    pub label: &'static str,
    pub value: u8,
}

/// Everything the result page renders, derived from a [`ScoredResult`] alone.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub recipient: String,
    pub shared: bool,
    pub total_score: u32,
    pub total_max: u32,
    pub overall_percentage: u8,
    pub grade: Grade,
    pub grade_label: &'static str,
    pub systems: Vec<SystemScoreView>,
    pub radar: Vec<RadarPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_system: Option<&'static str>,
    pub assessed_at: DateTime<Utc>,
}

impl ResultView {
    pub fn from_result(result: &ScoredResult, shared: bool) -> Self {
        let grade = result.grade();
        let systems: Vec<SystemScoreView> = result
            .system_scores
            .iter()
            .map(SystemScoreView::from)
            .collect();
        let radar = systems
            .iter()
            .map(|entry| RadarPoint {
                label: entry.system_label,
                value: entry.percentage,
            })
            .collect();
        let focus_system = result
            .weakest_systems()
            .first()
            .filter(|entry| entry.percentage < 100)
            .map(|entry| entry.system.label());

        Self {
            recipient: result.identity.name.clone(),
            shared,
            total_score: result.total_score,
            total_max: result.total_max,
            overall_percentage: result.overall_percentage,
            grade,
            grade_label: grade.label(),
            systems,
            radar,
            focus_system,
            assessed_at: result.timestamp,
        }
    }
}
