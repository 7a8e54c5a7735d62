use crate::diagnostic::domain::{DiagnosticSnapshot, LevelCatalog};
use super::views::{MonthlyTopCategories, PerformanceMetric, SeriesPoint, Trend, PERFORMANCE_PERIOD};
use chrono::{DateTime, Datelike, Utc};

pub(crate) fn month_label(at: &DateTime<Utc>) -> String {
    at.format("%m/%Y").to_string()
}

fn month_key(at: &DateTime<Utc>) -> (i32, u32) {
    (at.year(), at.month())
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Every snapshot becomes a point; same-month diagnostics are not collapsed.
pub(crate) fn general_points(
    ordered: &[&DiagnosticSnapshot],
    levels: Option<&LevelCatalog>,
) -> Vec<SeriesPoint> {
    let mut previous: Option<u32> = None;

    ordered
        .iter()
        .map(|snapshot| {
            let delta = previous
                .map(|prior| i64::from(snapshot.overall_score) - i64::from(prior))
                .unwrap_or(0);
            previous = Some(snapshot.overall_score);

            SeriesPoint {
                diagnostic_id: snapshot.id.clone(),
                performed_at: snapshot.performed_at,
                label: month_label(&snapshot.performed_at),
                level_id: snapshot.overall_level_id,
                level_rank: levels.and_then(|catalog| catalog.rank(snapshot.overall_level_id)),
                score: snapshot.overall_score,
                delta,
            }
        })
        .collect()
}

/// Latest diagnostic per month over the most recent `months` months, top `limit`
/// categories each, oldest month first.
pub(crate) fn top_categories_by_month(
    ordered: &[&DiagnosticSnapshot],
    months: usize,
    limit: usize,
) -> Vec<MonthlyTopCategories> {
    let mut latest_per_month: Vec<&DiagnosticSnapshot> = Vec::new();
    for &snapshot in ordered {
        let same_month = latest_per_month
            .last()
            .is_some_and(|last| month_key(&last.performed_at) == month_key(&snapshot.performed_at));
        if same_month {
            latest_per_month.pop();
        }
        latest_per_month.push(snapshot);
    }

    let skip = latest_per_month.len().saturating_sub(months);
    latest_per_month
        .into_iter()
        .skip(skip)
        .map(|snapshot| {
            let mut categories = snapshot.categories.clone();
            // Stable sort: equal scores keep their stored order.
            categories.sort_by(|a, b| b.score.cmp(&a.score));
            categories.truncate(limit);

            MonthlyTopCategories {
                label: month_label(&snapshot.performed_at),
                diagnostic_id: snapshot.id.clone(),
                performed_at: snapshot.performed_at,
                categories,
            }
        })
        .collect()
}

pub(crate) fn performance_metric(points: &[SeriesPoint]) -> Option<PerformanceMetric> {
    let [.., previous, current] = points else {
        return None;
    };

    let delta = current.delta;
    let percentage_change = if previous.score > 0 {
        round1(delta as f64 / f64::from(previous.score) * 100.0)
    } else {
        0.0
    };

    Some(PerformanceMetric {
        previous_score: previous.score,
        current_score: current.score,
        delta,
        percentage_change,
        trend: Trend::from_delta(delta),
        period: PERFORMANCE_PERIOD,
    })
}
