use std::collections::HashMap;

use super::domain::{AnswerId, DiagnosticSnapshot, ScoringCatalog, SubjectId};

/// Source of scoring bands and the level catalog. Read on every calculation.
pub trait BandRepository: Send + Sync {
    fn scoring_catalog(&self) -> Result<ScoringCatalog, RepositoryError>;
}

/// Best-effort source of answer display text.
pub trait AnswerTextRepository: Send + Sync {
    fn answer_texts(
        &self,
        answer_ids: &[AnswerId],
    ) -> Result<HashMap<AnswerId, String>, RepositoryError>;
}

/// Per-subject diagnostic history. Results are already filtered to the subject.
pub trait DiagnosticHistoryStore: Send + Sync {
    fn history(&self, subject: &SubjectId) -> Result<Vec<DiagnosticSnapshot>, RepositoryError>;
    fn record(
        &self,
        subject: &SubjectId,
        snapshot: DiagnosticSnapshot,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
