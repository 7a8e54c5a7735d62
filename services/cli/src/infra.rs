use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use maturity_diagnostic::config::AppConfig;
use maturity_diagnostic::diagnostic::{
    AnswerId, AnswerRecord, AnswerTextRepository, BandRepository, DiagnosticHistoryStore,
    DiagnosticService, DiagnosticSnapshot, Level, LevelCatalog, RepositoryError, ScoringBand,
    ScoringCatalog, SubjectId, UserProfile,
};
use maturity_diagnostic::error::AppError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const DEFAULT_SUBJECT: &str = "anonymous";

/// Levels in maturity order, a flat band list and optional answer texts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CatalogFixture {
    pub(crate) levels: Vec<Level>,
    pub(crate) bands: Vec<ScoringBand>,
    #[serde(default)]
    pub(crate) answer_texts: HashMap<AnswerId, String>,
}

impl CatalogFixture {
    pub(crate) fn scoring_catalog(&self) -> ScoringCatalog {
        ScoringCatalog::from_bands(LevelCatalog::new(self.levels.clone()), self.bands.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionFixture {
    #[serde(default = "default_subject")]
    pub(crate) subject: SubjectId,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub(crate) performed_at: Option<DateTime<Utc>>,
    pub(crate) answers: Vec<AnswerRecord>,
    #[serde(default)]
    pub(crate) profile: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryFixture {
    #[serde(default = "default_subject")]
    pub(crate) subject: SubjectId,
    #[serde(default)]
    pub(crate) diagnostics: Vec<DiagnosticSnapshot>,
}

fn default_subject() -> SubjectId {
    SubjectId(DEFAULT_SUBJECT.to_string())
}

pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Serves the same catalog on every call, standing in for the content store.
#[derive(Debug, Clone)]
pub(crate) struct FixtureBandRepository {
    catalog: ScoringCatalog,
}

impl FixtureBandRepository {
    pub(crate) fn new(catalog: ScoringCatalog) -> Self {
        Self { catalog }
    }
}

impl BandRepository for FixtureBandRepository {
    fn scoring_catalog(&self) -> Result<ScoringCatalog, RepositoryError> {
        Ok(self.catalog.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryAnswerTexts {
    texts: HashMap<AnswerId, String>,
}

impl InMemoryAnswerTexts {
    pub(crate) fn new(texts: HashMap<AnswerId, String>) -> Self {
        Self { texts }
    }
}

impl AnswerTextRepository for InMemoryAnswerTexts {
    fn answer_texts(
        &self,
        answer_ids: &[AnswerId],
    ) -> Result<HashMap<AnswerId, String>, RepositoryError> {
        Ok(answer_ids
            .iter()
            .filter_map(|id| self.texts.get(id).map(|text| (*id, text.clone())))
            .collect())
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryHistoryStore {
    entries: Arc<Mutex<HashMap<SubjectId, Vec<DiagnosticSnapshot>>>>,
}

impl InMemoryHistoryStore {
    pub(crate) fn seeded(subject: SubjectId, diagnostics: Vec<DiagnosticSnapshot>) -> Self {
        let store = Self::default();
        if let Ok(mut guard) = store.entries.lock() {
            guard.insert(subject, diagnostics);
        }
        store
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<SubjectId, Vec<DiagnosticSnapshot>>>, RepositoryError> {
        self.entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("history store lock poisoned".to_string()))
    }
}

impl DiagnosticHistoryStore for InMemoryHistoryStore {
    fn history(&self, subject: &SubjectId) -> Result<Vec<DiagnosticSnapshot>, RepositoryError> {
        Ok(self.lock()?.get(subject).cloned().unwrap_or_default())
    }

    fn record(
        &self,
        subject: &SubjectId,
        snapshot: DiagnosticSnapshot,
    ) -> Result<(), RepositoryError> {
        self.lock()?
            .entry(subject.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }
}

pub(crate) type FixtureService =
    DiagnosticService<FixtureBandRepository, InMemoryAnswerTexts, InMemoryHistoryStore>;

pub(crate) fn build_service(
    catalog: &CatalogFixture,
    history: Arc<InMemoryHistoryStore>,
    config: &AppConfig,
) -> FixtureService {
    DiagnosticService::new(
        Arc::new(FixtureBandRepository::new(catalog.scoring_catalog())),
        Arc::new(InMemoryAnswerTexts::new(catalog.answer_texts.clone())),
        history,
    )
    .with_legacy_schema(config.diagnostic.legacy.clone())
    .with_evolution_config(config.diagnostic.evolution)
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_timestamp(&value).map_err(serde::de::Error::custom))
        .transpose()
}
