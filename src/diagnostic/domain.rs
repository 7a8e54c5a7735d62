use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Quiz question identifier; also the positional sort key for legacy slots.
    QuestionId
);
numeric_id!(AnswerId);
numeric_id!(CategoryId);
numeric_id!(LevelId);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticId(pub String);

/// Identifies whose diagnostic history is being read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One answered question of a single quiz submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub answer_id: AnswerId,
    pub category_id: CategoryId,
    pub score: u32,
}

/// Which score a band classifies: the total, or a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandScope {
    General,
    Category(CategoryId),
}

impl fmt::Display for BandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandScope::General => f.write_str("general"),
            BandScope::Category(id) => write!(f, "category {id}"),
        }
    }
}

/// Inclusive `[min_score, max_score]` range mapped to a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringBand {
    pub min_score: u32,
    pub max_score: u32,
    pub level_id: LevelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl ScoringBand {
    pub const fn new(min_score: u32, max_score: u32, level_id: LevelId) -> Self {
        Self {
            min_score,
            max_score,
            level_id,
            category_id: None,
        }
    }

    pub fn for_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub const fn contains(&self, score: u32) -> bool {
        self.min_score <= score && score <= self.max_score
    }

    pub const fn scope(&self) -> BandScope {
        match self.category_id {
            Some(id) => BandScope::Category(id),
            None => BandScope::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub title: String,
}

impl Level {
    pub fn new(id: LevelId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Ordered level catalog. Position defines maturity rank, lowest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelCatalog(Vec<Level>);

impl LevelCatalog {
    pub fn new(levels: Vec<Level>) -> Self {
        Self(levels)
    }

    pub fn get(&self, id: LevelId) -> Option<&Level> {
        self.0.iter().find(|level| level.id == id)
    }

    pub fn rank(&self, id: LevelId) -> Option<usize> {
        self.0.iter().position(|level| level.id == id)
    }

    pub fn levels(&self) -> &[Level] {
        &self.0
    }
}

impl From<Vec<Level>> for LevelCatalog {
    fn from(levels: Vec<Level>) -> Self {
        Self(levels)
    }
}

/// Bands and levels fetched for one calculation. Not cached across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringCatalog {
    pub levels: LevelCatalog,
    #[serde(default)]
    pub general_bands: Vec<ScoringBand>,
    #[serde(default)]
    pub category_bands: HashMap<CategoryId, Vec<ScoringBand>>,
}

impl ScoringCatalog {
    /// Splits a flat band list by scope, keeping the supplied order within each scope.
    pub fn from_bands(levels: LevelCatalog, bands: Vec<ScoringBand>) -> Self {
        let mut general_bands = Vec::new();
        let mut category_bands: HashMap<CategoryId, Vec<ScoringBand>> = HashMap::new();

        for band in bands {
            match band.scope() {
                BandScope::General => general_bands.push(band),
                BandScope::Category(id) => category_bands.entry(id).or_default().push(band),
            }
        }

        Self {
            levels,
            general_bands,
            category_bands,
        }
    }

    pub fn bands_for(&self, scope: BandScope) -> &[ScoringBand] {
        match scope {
            BandScope::General => &self.general_bands,
            BandScope::Category(id) => self
                .category_bands
                .get(&id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub category_id: CategoryId,
    pub score: u32,
    pub level: Level,
}

/// Output of a single quiz calculation. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedResult {
    pub total_score: u32,
    pub general_level: Level,
    pub categories: Vec<CategoryResult>,
}

impl CalculatedResult {
    pub fn category(&self, id: CategoryId) -> Option<&CategoryResult> {
        self.categories
            .iter()
            .find(|category| category.category_id == id)
    }
}

/// A stored diagnostic used as a point in evolution analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSnapshot {
    pub id: DiagnosticId,
    pub performed_at: DateTime<Utc>,
    pub overall_score: u32,
    pub overall_level_id: LevelId,
    #[serde(default)]
    pub categories: Vec<CategoryResult>,
}

impl DiagnosticSnapshot {
    /// Builds the snapshot that a freshly calculated result would be stored as.
    pub fn from_result(
        id: DiagnosticId,
        performed_at: DateTime<Utc>,
        result: &CalculatedResult,
    ) -> Self {
        Self {
            id,
            performed_at,
            overall_score: result.total_score,
            overall_level_id: result.general_level.id,
            categories: result.categories.clone(),
        }
    }
}

/// Display fields of the person who answered the quiz. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}
