use crate::diagnostic::domain::CategoryId;
use serde::{Deserialize, Serialize};

/// Answer slots per category in the legacy table.
pub const LEGACY_SLOTS: usize = 3;

/// A category column group of the legacy table, e.g. `estrategia_r1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCategory {
    pub category_id: CategoryId,
    pub prefix: String,
}

impl LegacyCategory {
    pub fn new(category_id: CategoryId, prefix: impl Into<String>) -> Self {
        Self {
            category_id,
            prefix: prefix.into(),
        }
    }
}

/// Placeholders written when the profile lacks a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDefaults {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub job_title: String,
    pub city: String,
    pub state: String,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            name: "Usuário".to_string(),
            email: "nao-informado@diagnostico.local".to_string(),
            phone: "Não informado".to_string(),
            company: "Não informada".to_string(),
            job_title: "Não informado".to_string(),
            city: "Não informada".to_string(),
            state: "NI".to_string(),
        }
    }
}

/// Fixed column layout of the legacy diagnostic table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySchema {
    pub categories: Vec<LegacyCategory>,
    #[serde(default)]
    pub profile_defaults: ProfileDefaults,
}

impl LegacySchema {
    pub fn new(categories: Vec<LegacyCategory>) -> Self {
        Self {
            categories,
            profile_defaults: ProfileDefaults::default(),
        }
    }

    pub fn standard() -> Self {
        Self::new(
            [
                (1, "estrategia"),
                (2, "processos"),
                (3, "pessoas"),
                (4, "tecnologia"),
                (5, "dados"),
                (6, "cliente"),
            ]
            .into_iter()
            .map(|(id, prefix)| LegacyCategory::new(CategoryId(id), prefix))
            .collect(),
        )
    }

    pub fn prefix_for(&self, category_id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.category_id == category_id)
            .map(|category| category.prefix.as_str())
    }
}

impl Default for LegacySchema {
    fn default() -> Self {
        Self::standard()
    }
}
