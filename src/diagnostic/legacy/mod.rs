//! Flattening of a calculated diagnostic into the fixed legacy table layout.
//!
//! Each schema category gets three answer slots filled positionally from its answers
//! sorted by question id. Categories with fewer answers leave trailing slots empty;
//! extra answers are dropped. Level and score columns are copied from the
//! `CalculatedResult`, never recomputed here.

mod record;
mod schema;
mod writer;

pub use record::{LegacyField, LegacyRecord};
pub use schema::{LegacyCategory, LegacySchema, ProfileDefaults, LEGACY_SLOTS};
pub use writer::{CsvLegacyWriter, LegacyExportError, LegacyWriter};

use super::domain::{AnswerId, AnswerRecord, CalculatedResult, UserProfile};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Best-effort source of human readable answer text.
pub trait AnswerTextLookup {
    fn answer_text(&self, answer_id: AnswerId) -> Option<String>;
}

impl<F> AnswerTextLookup for F
where
    F: Fn(AnswerId) -> Option<String>,
{
    fn answer_text(&self, answer_id: AnswerId) -> Option<String> {
        self(answer_id)
    }
}

impl AnswerTextLookup for HashMap<AnswerId, String> {
    fn answer_text(&self, answer_id: AnswerId) -> Option<String> {
        self.get(&answer_id).cloned()
    }
}

/// Text written into an `_r` slot, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerText {
    Resolved(String),
    Fallback(&'static str),
}

impl AnswerText {
    pub fn resolve(lookup: &dyn AnswerTextLookup, answer: &AnswerRecord) -> Self {
        match lookup.answer_text(answer.answer_id) {
            Some(text) if !text.trim().is_empty() => AnswerText::Resolved(text),
            _ => {
                debug!(answer_id = %answer.answer_id, score = answer.score, "answer text unavailable; using score label");
                AnswerText::Fallback(fallback_label(answer.score))
            }
        }
    }

    pub fn into_string(self) -> String {
        match self {
            AnswerText::Resolved(text) => text,
            AnswerText::Fallback(label) => label.to_string(),
        }
    }
}

/// Generic frequency label used when an answer's own text cannot be fetched.
pub const fn fallback_label(score: u32) -> &'static str {
    match score {
        s if s >= 3 => "Sempre",
        2 => "Às vezes",
        1 => "Raramente",
        _ => "Nunca",
    }
}

#[derive(Debug, Clone, Default)]
pub struct LegacyRecordMapper {
    schema: LegacySchema,
}

impl LegacyRecordMapper {
    pub fn new(schema: LegacySchema) -> Self {
        Self { schema }
    }

    pub fn map(
        &self,
        answers: &[AnswerRecord],
        calculated: &CalculatedResult,
        profile: &UserProfile,
        lookup: &dyn AnswerTextLookup,
    ) -> LegacyRecord {
        let mut fields = IndexMap::new();
        self.insert_profile(&mut fields, profile);

        for category in &self.schema.categories {
            let mut grouped: Vec<&AnswerRecord> = answers
                .iter()
                .filter(|answer| answer.category_id == category.category_id)
                .collect();
            grouped.sort_by_key(|answer| answer.question_id);

            if grouped.len() > LEGACY_SLOTS {
                debug!(
                    category_id = %category.category_id,
                    answers = grouped.len(),
                    "legacy schema holds {LEGACY_SLOTS} answers per category; extra answers dropped"
                );
            }

            let prefix = &category.prefix;
            let slots: Vec<Option<&AnswerRecord>> = (0..LEGACY_SLOTS)
                .map(|slot| grouped.get(slot).copied())
                .collect();

            for (slot, answer) in slots.iter().copied().enumerate() {
                let value = answer
                    .map(|answer| {
                        LegacyField::Text(AnswerText::resolve(lookup, answer).into_string())
                    })
                    .unwrap_or(LegacyField::Empty);
                fields.insert(format!("{prefix}_r{}", slot + 1), value);
            }
            for (slot, answer) in slots.iter().copied().enumerate() {
                fields.insert(
                    format!("{prefix}_p{}", slot + 1),
                    answer.map(|answer| answer.score).into(),
                );
            }

            let result = calculated.category(category.category_id);
            fields.insert(
                format!("nvl_{prefix}"),
                result
                    .map(|result| LegacyField::Text(result.level.title.clone()))
                    .unwrap_or(LegacyField::Empty),
            );
            fields.insert(
                format!("total_pts_{prefix}"),
                result.map(|result| result.score).into(),
            );
        }

        fields.insert(
            "nvl_geral".to_string(),
            LegacyField::Text(calculated.general_level.title.clone()),
        );
        fields.insert(
            "total_pts".to_string(),
            LegacyField::Number(calculated.total_score),
        );

        LegacyRecord::from_fields(fields)
    }

    fn insert_profile(&self, fields: &mut IndexMap<String, LegacyField>, profile: &UserProfile) {
        let defaults = &self.schema.profile_defaults;
        let columns = [
            ("nome", &profile.name, &defaults.name),
            ("email", &profile.email, &defaults.email),
            ("telefone", &profile.phone, &defaults.phone),
            ("empresa", &profile.company, &defaults.company),
            ("cargo", &profile.job_title, &defaults.job_title),
            ("cidade", &profile.city, &defaults.city),
            ("estado", &profile.state, &defaults.state),
        ];

        for (column, value, default) in columns {
            let value = match value.as_deref().map(str::trim) {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => {
                    debug!(column, "profile field missing; using placeholder");
                    default.clone()
                }
            };
            fields.insert(column.to_string(), LegacyField::Text(value));
        }
    }
}

/// Maps a submission onto the standard legacy schema.
pub fn map_to_legacy_record(
    answers: &[AnswerRecord],
    calculated: &CalculatedResult,
    profile: &UserProfile,
    lookup: &dyn AnswerTextLookup,
) -> LegacyRecord {
    LegacyRecordMapper::default().map(answers, calculated, profile, lookup)
}
