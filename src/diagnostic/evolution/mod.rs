mod series;
pub mod views;

pub use views::{
    DashboardSummary, Evolution, EvolutionSeries, MonthlyTopCategories, PerformanceMetric,
    SeriesPoint, Trend, PERFORMANCE_PERIOD,
};

use super::domain::{DiagnosticSnapshot, LevelCatalog};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Window sizes for the per-month category chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub trend_months: usize,
    pub top_categories: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            trend_months: 12,
            top_categories: 3,
        }
    }
}

/// Stateless analyzer over a subject's diagnostic history.
#[derive(Debug, Clone, Default)]
pub struct EvolutionAnalyzer<'a> {
    config: EvolutionConfig,
    levels: Option<&'a LevelCatalog>,
}

impl<'a> EvolutionAnalyzer<'a> {
    pub fn new(config: EvolutionConfig) -> Self {
        Self {
            config,
            levels: None,
        }
    }

    /// Attaches a level catalog so points carry their maturity rank.
    pub fn with_levels(mut self, levels: &'a LevelCatalog) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn analyze(&self, snapshots: &[DiagnosticSnapshot]) -> Evolution {
        if snapshots.is_empty() {
            debug!("no diagnostic history; evolution unavailable");
            return Evolution::NoData;
        }

        let mut ordered: Vec<&DiagnosticSnapshot> = snapshots.iter().collect();
        ordered.sort_by_key(|snapshot| snapshot.performed_at);

        let points = series::general_points(&ordered, self.levels);
        let top_categories = series::top_categories_by_month(
            &ordered,
            self.config.trend_months,
            self.config.top_categories,
        );
        let performance = series::performance_metric(&points);

        let Some((first, latest)) = ordered.first().zip(points.last()) else {
            return Evolution::NoData;
        };
        let summary = DashboardSummary {
            diagnostics: points.len(),
            latest_score: latest.score,
            latest_level_id: latest.level_id,
            latest_level_rank: latest.level_rank,
            overall_delta: latest.delta,
            first_performed_at: first.performed_at,
            latest_performed_at: latest.performed_at,
        };

        debug!(
            diagnostics = summary.diagnostics,
            months = top_categories.len(),
            overall_delta = summary.overall_delta,
            "computed diagnostic evolution"
        );

        Evolution::Ready(EvolutionSeries {
            points,
            top_categories,
            performance,
            summary,
        })
    }
}

/// Evolution analytics with the default windows and no level ranks.
pub fn compute_evolution(snapshots: &[DiagnosticSnapshot]) -> Evolution {
    EvolutionAnalyzer::default().analyze(snapshots)
}
