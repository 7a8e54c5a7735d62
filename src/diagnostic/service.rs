use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{AnswerId, AnswerRecord, DiagnosticId, DiagnosticSnapshot, SubjectId, UserProfile};
use super::evolution::{Evolution, EvolutionAnalyzer, EvolutionConfig};
use super::legacy::{LegacyRecord, LegacyRecordMapper, LegacySchema};
use super::repository::{
    AnswerTextRepository, BandRepository, DiagnosticHistoryStore, RepositoryError,
};
use super::scoring::{CalculationOutcome, ResultCalculator, ScoringError};

/// Composes the scoring core with the band, answer-text and history collaborators.
pub struct DiagnosticService<B, T, H> {
    bands: Arc<B>,
    texts: Arc<T>,
    history: Arc<H>,
    mapper: LegacyRecordMapper,
    evolution: EvolutionConfig,
}

static DIAGNOSTIC_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_diagnostic_id() -> DiagnosticId {
    let id = DIAGNOSTIC_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DiagnosticId(format!("diag-{id:06}"))
}

/// Everything produced for one quiz submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub calculation: CalculationOutcome,
    pub snapshot: DiagnosticSnapshot,
    pub legacy: LegacyRecord,
}

impl<B, T, H> DiagnosticService<B, T, H>
where
    B: BandRepository + 'static,
    T: AnswerTextRepository + 'static,
    H: DiagnosticHistoryStore + 'static,
{
    pub fn new(bands: Arc<B>, texts: Arc<T>, history: Arc<H>) -> Self {
        Self {
            bands,
            texts,
            history,
            mapper: LegacyRecordMapper::default(),
            evolution: EvolutionConfig::default(),
        }
    }

    pub fn with_legacy_schema(mut self, schema: LegacySchema) -> Self {
        self.mapper = LegacyRecordMapper::new(schema);
        self
    }

    pub fn with_evolution_config(mut self, config: EvolutionConfig) -> Self {
        self.evolution = config;
        self
    }

    /// Score a submission, store it in the subject's history and build its legacy row.
    pub fn submit(
        &self,
        subject: &SubjectId,
        answers: &[AnswerRecord],
        profile: &UserProfile,
        performed_at: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, DiagnosticServiceError> {
        let catalog = self.bands.scoring_catalog()?;
        let calculation = ResultCalculator::new(&catalog).calculate_detailed(answers)?;

        let texts = self.answer_texts(answers);
        let legacy = self
            .mapper
            .map(answers, &calculation.result, profile, &texts);

        let snapshot =
            DiagnosticSnapshot::from_result(next_diagnostic_id(), performed_at, &calculation.result);
        self.history.record(subject, snapshot.clone())?;

        info!(
            %subject,
            diagnostic = %snapshot.id.0,
            total_score = calculation.result.total_score,
            level = %calculation.result.general_level.title,
            skipped_categories = calculation.skipped.len(),
            "diagnostic calculated"
        );

        Ok(SubmissionOutcome {
            calculation,
            snapshot,
            legacy,
        })
    }

    /// Evolution analytics over the subject's stored history.
    pub fn evolution(&self, subject: &SubjectId) -> Result<Evolution, DiagnosticServiceError> {
        let history = self.history.history(subject)?;
        let analyzer = EvolutionAnalyzer::new(self.evolution);

        // Without a catalog the series omits level ranks.
        let evolution = match self.bands.scoring_catalog() {
            Ok(catalog) => analyzer.with_levels(&catalog.levels).analyze(&history),
            Err(err) => {
                warn!(%subject, error = %err, "level catalog unavailable; evolution without ranks");
                analyzer.analyze(&history)
            }
        };

        Ok(evolution)
    }

    fn answer_texts(&self, answers: &[AnswerRecord]) -> HashMap<AnswerId, String> {
        let ids: Vec<AnswerId> = answers.iter().map(|answer| answer.answer_id).collect();
        match self.texts.answer_texts(&ids) {
            Ok(texts) => texts,
            Err(err) => {
                warn!(error = %err, "answer text lookup failed; using score labels");
                HashMap::new()
            }
        }
    }
}

/// Error raised by the diagnostic service.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::domain::{
        CategoryId, Level, LevelCatalog, LevelId, QuestionId, ScoringBand, ScoringCatalog,
    };
    use crate::diagnostic::scoring::ResolveError;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StaticBands {
        unavailable: bool,
    }

    impl BandRepository for StaticBands {
        fn scoring_catalog(&self) -> Result<ScoringCatalog, RepositoryError> {
            if self.unavailable {
                return Err(RepositoryError::Unavailable("cms offline".to_string()));
            }
            Ok(ScoringCatalog::from_bands(
                LevelCatalog::new(vec![
                    Level::new(LevelId(1), "Inicial"),
                    Level::new(LevelId(2), "Intermediário"),
                ]),
                vec![
                    ScoringBand::new(0, 5, LevelId(1)),
                    ScoringBand::new(6, 12, LevelId(2)),
                    ScoringBand::new(0, 3, LevelId(1)).for_category(CategoryId(1)),
                    ScoringBand::new(4, 6, LevelId(2)).for_category(CategoryId(1)),
                ],
            ))
        }
    }

    struct FailingTexts;

    impl AnswerTextRepository for FailingTexts {
        fn answer_texts(
            &self,
            _answer_ids: &[AnswerId],
        ) -> Result<HashMap<AnswerId, String>, RepositoryError> {
            Err(RepositoryError::Unavailable("timeout".to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryHistory {
        entries: Mutex<Vec<(SubjectId, DiagnosticSnapshot)>>,
    }

    impl DiagnosticHistoryStore for MemoryHistory {
        fn history(&self, subject: &SubjectId) -> Result<Vec<DiagnosticSnapshot>, RepositoryError> {
            let guard = self.entries.lock().expect("history mutex poisoned");
            Ok(guard
                .iter()
                .filter(|(owner, _)| owner == subject)
                .map(|(_, snapshot)| snapshot.clone())
                .collect())
        }

        fn record(
            &self,
            subject: &SubjectId,
            snapshot: DiagnosticSnapshot,
        ) -> Result<(), RepositoryError> {
            let mut guard = self.entries.lock().expect("history mutex poisoned");
            guard.push((subject.clone(), snapshot));
            Ok(())
        }
    }

    fn answer(question: u32, category: u32, score: u32) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId(question),
            answer_id: AnswerId(question),
            category_id: CategoryId(category),
            score,
        }
    }

    fn subject() -> SubjectId {
        SubjectId("user-1".to_string())
    }

    #[test]
    fn submit_degrades_when_answer_texts_fail() {
        let history = Arc::new(MemoryHistory::default());
        let service = DiagnosticService::new(
            Arc::new(StaticBands::default()),
            Arc::new(FailingTexts),
            history.clone(),
        );
        let at = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).single().expect("valid");

        let outcome = service
            .submit(&subject(), &[answer(1, 1, 3), answer(2, 1, 1)], &UserProfile::default(), at)
            .expect("submission succeeds");

        assert_eq!(outcome.calculation.result.total_score, 4);
        assert_eq!(outcome.legacy.text("estrategia_r1"), Some("Sempre"));
        assert_eq!(outcome.legacy.text("estrategia_r2"), Some("Raramente"));
        assert_eq!(
            history.history(&subject()).expect("history readable").len(),
            1
        );
    }

    #[test]
    fn submit_fails_when_general_level_is_unresolved() {
        let history = Arc::new(MemoryHistory::default());
        let service = DiagnosticService::new(
            Arc::new(StaticBands::default()),
            Arc::new(FailingTexts),
            history.clone(),
        );
        let answers: Vec<_> = (1..=5).map(|question| answer(question, 2, 3)).collect();
        let at = Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).single().expect("valid");

        match service.submit(&subject(), &answers, &UserProfile::default(), at) {
            Err(DiagnosticServiceError::Scoring(ScoringError::GeneralLevelUnresolved {
                total: 15,
                source: ResolveError::LevelNotFound { .. },
            })) => {}
            other => panic!("expected unresolved general level, got {other:?}"),
        }
        assert!(history
            .history(&subject())
            .expect("history readable")
            .is_empty());
    }

    #[test]
    fn evolution_survives_catalog_outage() {
        let history = Arc::new(MemoryHistory::default());
        let snapshot = DiagnosticSnapshot {
            id: DiagnosticId("stored".to_string()),
            performed_at: Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).single().expect("valid"),
            overall_score: 8,
            overall_level_id: LevelId(2),
            categories: Vec::new(),
        };
        history
            .record(&subject(), snapshot)
            .expect("record succeeds");
        let service = DiagnosticService::new(
            Arc::new(StaticBands { unavailable: true }),
            Arc::new(FailingTexts),
            history,
        );

        let evolution = service.evolution(&subject()).expect("evolution computed");
        let series = evolution.series().expect("history present");
        assert_eq!(series.points[0].level_rank, None);
        assert_eq!(series.summary.latest_score, 8);
    }
}
