use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LegacyField {
    Text(String),
    Number(u32),
    Empty,
}

impl LegacyField {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LegacyField::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<u32> {
        match self {
            LegacyField::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, LegacyField::Empty)
    }
}

impl fmt::Display for LegacyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyField::Text(value) => f.write_str(value),
            LegacyField::Number(value) => write!(f, "{value}"),
            LegacyField::Empty => Ok(()),
        }
    }
}

impl From<Option<u32>> for LegacyField {
    fn from(value: Option<u32>) -> Self {
        value.map(LegacyField::Number).unwrap_or(LegacyField::Empty)
    }
}

/// Flat, ordered row handed to the legacy writer. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LegacyRecord {
    fields: IndexMap<String, LegacyField>,
}

impl LegacyRecord {
    pub(crate) fn from_fields(fields: IndexMap<String, LegacyField>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&LegacyField> {
        self.fields.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(LegacyField::as_text)
    }

    pub fn number(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(LegacyField::as_number)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &LegacyField)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }
}
