//! Diagnostic scoring, evolution analytics and legacy export.
//!
//! Everything under this module is synchronous and side-effect free apart from the
//! `service` layer, which pulls bands, levels and history from the external
//! collaborators described in `repository` on every call.

pub mod domain;
pub mod evolution;
pub mod legacy;
pub mod repository;
pub mod scoring;
pub mod service;

pub use domain::{
    AnswerId, AnswerRecord, BandScope, CalculatedResult, CategoryId, CategoryResult,
    DiagnosticId, DiagnosticSnapshot, Level, LevelCatalog, LevelId, QuestionId, ScoringBand,
    ScoringCatalog, SubjectId, UserProfile,
};
pub use evolution::{
    compute_evolution, DashboardSummary, Evolution, EvolutionAnalyzer, EvolutionConfig,
    EvolutionSeries, MonthlyTopCategories, PerformanceMetric, SeriesPoint, Trend,
};
pub use legacy::{
    fallback_label, map_to_legacy_record, AnswerText, AnswerTextLookup, CsvLegacyWriter,
    LegacyCategory, LegacyExportError, LegacyField, LegacyRecord, LegacyRecordMapper,
    LegacySchema, LegacyWriter, ProfileDefaults,
};
pub use repository::{
    AnswerTextRepository, BandRepository, DiagnosticHistoryStore, RepositoryError,
};
pub use scoring::{
    calculate_result, validate_coverage, AggregateError, CalculationOutcome, CoverageIssue,
    CoverageReport, LevelRangeResolver, ResolveError, ResultCalculator, ScoreAggregator,
    ScoreTotals, ScoringError, SkipReason, SkippedCategory,
};
pub use service::{DiagnosticService, DiagnosticServiceError, SubmissionOutcome};
