use crate::commands::write_legacy_csv;
use crate::infra::{
    build_service, parse_timestamp, CatalogFixture, InMemoryHistoryStore, SubmissionFixture,
};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use maturity_diagnostic::config::AppConfig;
use maturity_diagnostic::diagnostic::{
    AnswerId, AnswerRecord, Evolution, SubjectId, SubmissionOutcome,
};
use maturity_diagnostic::error::AppError;
use std::io;
use std::sync::Arc;

const DEMO_CATALOG: &str = include_str!("../fixtures/catalog.json");
const DEMO_SUBMISSION: &str = include_str!("../fixtures/submission.json");
const DEMO_SUBJECT: &str = "demo";

/// Score penalties applied to the baseline answers, oldest submission first.
const DEMO_PENALTIES: [u32; 3] = [2, 1, 0];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Subject whose history the demo builds (defaults to "demo")
    #[arg(long)]
    pub(crate) subject: Option<String>,
    /// Timestamp of the latest submission (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) latest: Option<DateTime<Utc>>,
    /// Skip the legacy CSV row at the end of the demo output.
    #[arg(long)]
    pub(crate) skip_legacy: bool,
}

pub(crate) fn run_demo(args: DemoArgs, config: &AppConfig) -> Result<(), AppError> {
    let DemoArgs {
        subject,
        latest,
        skip_legacy,
    } = args;

    let catalog: CatalogFixture = serde_json::from_str(DEMO_CATALOG)?;
    let baseline: SubmissionFixture = serde_json::from_str(DEMO_SUBMISSION)?;
    let subject = SubjectId(subject.unwrap_or_else(|| DEMO_SUBJECT.to_string()));
    let latest = latest.unwrap_or_else(Utc::now);

    let service = build_service(&catalog, Arc::new(InMemoryHistoryStore::default()), config);

    println!("Maturity diagnostic demo for '{subject}'");
    println!("\nSubmissions");
    let mut last_outcome = None;
    for (months_back, penalty) in (0..DEMO_PENALTIES.len()).rev().zip(DEMO_PENALTIES) {
        let performed_at = latest - Duration::days(30 * months_back as i64);
        let answers = with_penalty(&baseline.answers, penalty);
        let outcome = service.submit(&subject, &answers, &baseline.profile, performed_at)?;
        render_submission(&outcome);
        last_outcome = Some(outcome);
    }

    println!("\nEvolution");
    render_evolution(&service.evolution(&subject)?);

    if let (false, Some(outcome)) = (skip_legacy, last_outcome) {
        println!("\nLegacy export row");
        write_legacy_csv(io::stdout().lock(), &outcome.legacy)?;
    }

    Ok(())
}

/// Lowers every score by `penalty`, keeping answer ids aligned with the fixture's
/// `question * 10 + score` convention so answer texts still resolve.
fn with_penalty(answers: &[AnswerRecord], penalty: u32) -> Vec<AnswerRecord> {
    answers
        .iter()
        .map(|answer| {
            let score = answer.score.saturating_sub(penalty);
            AnswerRecord {
                answer_id: AnswerId(answer.question_id.0 * 10 + score),
                score,
                ..*answer
            }
        })
        .collect()
}

fn render_submission(outcome: &SubmissionOutcome) {
    let result = &outcome.calculation.result;
    println!(
        "- {} on {}: total {} -> {}",
        outcome.snapshot.id.0,
        outcome.snapshot.performed_at.format("%Y-%m-%d"),
        result.total_score,
        result.general_level.title
    );
    let categories: Vec<String> = result
        .categories
        .iter()
        .map(|category| {
            format!(
                "#{} {} ({})",
                category.category_id, category.score, category.level.title
            )
        })
        .collect();
    println!("  categories: {}", categories.join(" | "));
    for skipped in &outcome.calculation.skipped {
        println!(
            "  skipped category #{} with score {}",
            skipped.category_id, skipped.score
        );
    }
}

fn render_evolution(evolution: &Evolution) {
    let Some(series) = evolution.series() else {
        println!("- No diagnostics recorded yet");
        return;
    };

    println!(
        "- {} diagnostics | latest score {} | {:+} against the previous one",
        series.summary.diagnostics, series.summary.latest_score, series.summary.overall_delta
    );
    if let Some(metric) = &series.performance {
        println!(
            "- Performance ({}): {} -> {} ({:+.1}%, {})",
            metric.period,
            metric.previous_score,
            metric.current_score,
            metric.percentage_change,
            metric.trend.label()
        );
    }

    println!("History (latest first):");
    for point in series.latest_first() {
        let rank = point
            .level_rank
            .map(|rank| format!(", rank {}", rank + 1))
            .unwrap_or_default();
        println!(
            "  - {} {}: score {} ({:+}) level {}{}",
            point.label, point.diagnostic_id.0, point.score, point.delta, point.level_id, rank
        );
    }

    println!("Top categories by month:");
    for month in &series.top_categories {
        let top: Vec<String> = month
            .categories
            .iter()
            .map(|category| format!("#{} {}", category.category_id, category.score))
            .collect();
        println!("  - {}: {}", month.label, top.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maturity_diagnostic::diagnostic::{CategoryId, QuestionId};

    #[test]
    fn penalty_keeps_answer_ids_in_step_with_scores() {
        let answers = [AnswerRecord {
            question_id: QuestionId(101),
            answer_id: AnswerId(1013),
            category_id: CategoryId(1),
            score: 3,
        }];

        let lowered = with_penalty(&answers, 2);
        assert_eq!(lowered[0].score, 1);
        assert_eq!(lowered[0].answer_id, AnswerId(1011));

        let floored = with_penalty(&answers, 5);
        assert_eq!(floored[0].score, 0);
        assert_eq!(floored[0].answer_id, AnswerId(1010));
    }

    #[test]
    fn demo_history_improves_over_three_submissions() {
        let catalog: CatalogFixture = serde_json::from_str(DEMO_CATALOG).expect("catalog");
        let baseline: SubmissionFixture = serde_json::from_str(DEMO_SUBMISSION).expect("answers");

        let totals: Vec<u32> = DEMO_PENALTIES
            .iter()
            .map(|penalty| {
                let answers = with_penalty(&baseline.answers, *penalty);
                answers.iter().map(|answer| answer.score).sum()
            })
            .collect();

        assert_eq!(totals, vec![3, 15, 32]);
        assert_eq!(catalog.levels.len(), 4);
    }
}
