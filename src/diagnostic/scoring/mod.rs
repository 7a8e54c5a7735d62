mod aggregate;
mod bands;

pub use aggregate::{AggregateError, ScoreAggregator, ScoreTotals};
pub use bands::{validate_coverage, CoverageIssue, CoverageReport, LevelRangeResolver, ResolveError};

use super::domain::{
    AnswerRecord, BandScope, CalculatedResult, CategoryId, CategoryResult, ScoringCatalog,
};
use serde::Serialize;
use tracing::warn;

/// Failure of a whole calculation: the general level or the totals themselves.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Aggregation(#[from] AggregateError),
    #[error("general level unresolved for total score {total}")]
    GeneralLevelUnresolved {
        total: u32,
        #[source]
        source: ResolveError,
    },
}

/// Why a category was left out of a calculated result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoBandsConfigured,
    Unresolved {
        #[serde(serialize_with = "serialize_display")]
        error: ResolveError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCategory {
    pub category_id: CategoryId,
    pub score: u32,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A calculated result together with the categories that had to be dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationOutcome {
    pub result: CalculatedResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedCategory>,
}

/// Turns one submission's answers into leveled scores against a band catalog.
pub struct ResultCalculator<'a> {
    catalog: &'a ScoringCatalog,
}

impl<'a> ResultCalculator<'a> {
    pub fn new(catalog: &'a ScoringCatalog) -> Self {
        Self { catalog }
    }

    pub fn calculate(&self, answers: &[AnswerRecord]) -> Result<CalculatedResult, ScoringError> {
        self.calculate_detailed(answers).map(|outcome| outcome.result)
    }

    pub fn calculate_detailed(
        &self,
        answers: &[AnswerRecord],
    ) -> Result<CalculationOutcome, ScoringError> {
        let totals = ScoreAggregator::aggregate(answers)?;
        let resolver = LevelRangeResolver::new(&self.catalog.levels);

        let general_level = resolver
            .resolve(
                totals.total,
                BandScope::General,
                &self.catalog.general_bands,
            )
            .map_err(|source| ScoringError::GeneralLevelUnresolved {
                total: totals.total,
                source,
            })?
            .clone();

        let mut categories = Vec::with_capacity(totals.per_category.len());
        let mut skipped = Vec::new();

        for (&category_id, &score) in &totals.per_category {
            let scope = BandScope::Category(category_id);
            let bands = self.catalog.bands_for(scope);
            if bands.is_empty() {
                warn!(%category_id, score, "category has no scoring bands; omitted from result");
                skipped.push(SkippedCategory {
                    category_id,
                    score,
                    reason: SkipReason::NoBandsConfigured,
                });
                continue;
            }

            match resolver.resolve(score, scope, bands) {
                Ok(level) => categories.push(CategoryResult {
                    category_id,
                    score,
                    level: level.clone(),
                }),
                Err(error) => {
                    warn!(%category_id, score, %error, "category level unresolved; omitted from result");
                    skipped.push(SkippedCategory {
                        category_id,
                        score,
                        reason: SkipReason::Unresolved { error },
                    });
                }
            }
        }

        Ok(CalculationOutcome {
            result: CalculatedResult {
                total_score: totals.total,
                general_level,
                categories,
            },
            skipped,
        })
    }
}

/// Calculates a result for one submission against freshly supplied bands and levels.
pub fn calculate_result(
    answers: &[AnswerRecord],
    catalog: &ScoringCatalog,
) -> Result<CalculatedResult, ScoringError> {
    ResultCalculator::new(catalog).calculate(answers)
}

fn serialize_display<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: std::fmt::Display,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::domain::{AnswerId, Level, LevelCatalog, LevelId, QuestionId, ScoringBand};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn answer(question: u32, category: u32, score: u32) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId(question),
            answer_id: AnswerId(question * 100 + score),
            category_id: CategoryId(category),
            score,
        }
    }

    fn catalog() -> ScoringCatalog {
        let levels = LevelCatalog::new(vec![
            Level::new(LevelId(1), "levelA"),
            Level::new(LevelId(2), "levelB"),
            Level::new(LevelId(3), "levelC"),
        ]);
        let category_bands = |category: u32| {
            vec![
                ScoringBand::new(0, 3, LevelId(1)).for_category(CategoryId(category)),
                ScoringBand::new(4, 7, LevelId(2)).for_category(CategoryId(category)),
                ScoringBand::new(8, 9, LevelId(3)).for_category(CategoryId(category)),
            ]
        };

        ScoringCatalog {
            levels,
            general_bands: vec![
                ScoringBand::new(0, 9, LevelId(1)),
                ScoringBand::new(10, 19, LevelId(2)),
                ScoringBand::new(20, 27, LevelId(3)),
            ],
            category_bands: HashMap::from([
                (CategoryId(1), category_bands(1)),
                (CategoryId(2), category_bands(2)),
                (CategoryId(3), category_bands(3)),
            ]),
        }
    }

    #[test]
    fn category_scores_resolve_against_their_own_bands() {
        let catalog = catalog();
        let answers = [answer(1, 1, 3), answer(2, 1, 2), answer(3, 1, 1)];

        let result = calculate_result(&answers, &catalog).expect("calculation succeeds");

        assert_eq!(result.total_score, 6);
        assert_eq!(result.general_level.title, "levelA");
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].score, 6);
        assert_eq!(result.categories[0].level.title, "levelB");
    }

    #[test]
    fn categories_without_bands_are_skipped_not_fatal() {
        let catalog = catalog();
        let answers = [answer(1, 1, 3), answer(2, 7, 3), answer(3, 2, 2)];

        let outcome = ResultCalculator::new(&catalog)
            .calculate_detailed(&answers)
            .expect("general level resolves");

        let ids: Vec<_> = outcome
            .result
            .categories
            .iter()
            .map(|category| category.category_id)
            .collect();
        assert_eq!(ids, vec![CategoryId(1), CategoryId(2)]);
        assert_eq!(
            outcome.skipped,
            vec![SkippedCategory {
                category_id: CategoryId(7),
                score: 3,
                reason: SkipReason::NoBandsConfigured,
            }]
        );
    }

    #[test]
    fn category_gap_is_skipped_with_resolution_error() {
        let mut catalog = catalog();
        catalog.category_bands.insert(
            CategoryId(2),
            vec![ScoringBand::new(0, 3, LevelId(1)).for_category(CategoryId(2))],
        );
        let answers = [answer(1, 2, 3), answer(2, 2, 3)];

        let outcome = ResultCalculator::new(&catalog)
            .calculate_detailed(&answers)
            .expect("general level resolves");

        assert!(outcome.result.categories.is_empty());
        match &outcome.skipped[..] {
            [SkippedCategory {
                reason: SkipReason::Unresolved { error },
                ..
            }] => assert!(matches!(error, ResolveError::LevelNotFound { score: 6, .. })),
            other => panic!("expected a single unresolved category, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_general_level_aborts_calculation() {
        let catalog = catalog();
        let answers: Vec<_> = (0..10).map(|question| answer(question, 1, 3)).collect();

        let err = calculate_result(&answers, &catalog).expect_err("30 exceeds general bands");
        match err {
            ScoringError::GeneralLevelUnresolved { total, source } => {
                assert_eq!(total, 30);
                assert!(matches!(source, ResolveError::LevelNotFound { score: 30, .. }));
            }
            other => panic!("expected unresolved general level, got {other:?}"),
        }
    }

    #[test]
    fn overflowing_answers_fail_instead_of_wrapping() {
        let catalog = catalog();
        let half = u32::MAX / 2 + 1;
        let answers = [answer(1, 1, half), answer(2, 2, half)];

        let err = calculate_result(&answers, &catalog).expect_err("total exceeds u32::MAX");

        assert_eq!(
            err,
            ScoringError::Aggregation(AggregateError::Overflow {
                question_id: QuestionId(2)
            })
        );
    }

    #[test]
    fn skipped_categories_serialize_with_reason_tag() {
        let skipped = SkippedCategory {
            category_id: CategoryId(4),
            score: 12,
            reason: SkipReason::Unresolved {
                error: ResolveError::LevelNotFound {
                    score: 12,
                    scope: BandScope::Category(CategoryId(4)),
                },
            },
        };

        let json = serde_json::to_value(&skipped).expect("serializes");
        assert_eq!(json["reason"], "unresolved");
        assert_eq!(json["categoryId"], 4);
        assert_eq!(json["error"], "no scoring band covers score 12 for category 4");
    }

    proptest! {
        #[test]
        fn repeated_calculation_is_identical(
            raw in prop::collection::vec((1u32..4, 0u32..4), 0..9)
        ) {
            let catalog = catalog();
            let answers: Vec<_> = raw
                .iter()
                .enumerate()
                .map(|(index, (category, score))| answer(index as u32, *category, *score))
                .collect();

            let first = calculate_result(&answers, &catalog);
            let second = calculate_result(&answers, &catalog);
            prop_assert_eq!(
                serde_json::to_string(&first.expect("first run")).expect("serializes"),
                serde_json::to_string(&second.expect("second run")).expect("serializes")
            );
        }
    }
}
