use crate::diagnostic::domain::{CategoryResult, DiagnosticId, LevelId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Descriptive label attached to every performance metric.
pub const PERFORMANCE_PERIOD: &str = "last month";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_delta(delta: i64) -> Self {
        match delta {
            d if d > 0 => Self::Up,
            d if d < 0 => Self::Down,
            _ => Self::Flat,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Flat => "flat",
        }
    }
}

/// One diagnostic on the general evolution chart, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub diagnostic_id: DiagnosticId,
    pub performed_at: DateTime<Utc>,
    pub label: String,
    pub level_id: LevelId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_rank: Option<usize>,
    pub score: u32,
    pub delta: i64,
}

/// Highest scoring categories of the last diagnostic taken in a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTopCategories {
    pub label: String,
    pub diagnostic_id: DiagnosticId,
    pub performed_at: DateTime<Utc>,
    pub categories: Vec<CategoryResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    pub previous_score: u32,
    pub current_score: u32,
    pub delta: i64,
    pub percentage_change: f64,
    pub trend: Trend,
    pub period: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub diagnostics: usize,
    pub latest_score: u32,
    pub latest_level_id: LevelId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_level_rank: Option<usize>,
    pub overall_delta: i64,
    pub first_performed_at: DateTime<Utc>,
    pub latest_performed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionSeries {
    pub points: Vec<SeriesPoint>,
    pub top_categories: Vec<MonthlyTopCategories>,
    /// Absent until at least two diagnostics exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetric>,
    pub summary: DashboardSummary,
}

impl EvolutionSeries {
    /// Points ordered newest first, for history listings.
    pub fn latest_first(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter().rev()
    }
}

/// Result of evolution analytics. An empty history is a normal state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "series", rename_all = "snake_case")]
pub enum Evolution {
    NoData,
    Ready(EvolutionSeries),
}

impl Evolution {
    pub fn series(&self) -> Option<&EvolutionSeries> {
        match self {
            Evolution::NoData => None,
            Evolution::Ready(series) => Some(series),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Evolution::NoData)
    }
}
