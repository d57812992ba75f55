//! Reading front/back values out of generated cards
//!
//! Strict records expose their sides directly. Raw records only carry
//! whatever keys the model chose, so they go through a [`FieldExtractor`].

use serde_json::{Map, Value};

use super::models::{coerce_values, GeneratedCard, BACK_KEY, FRONT_KEY};

/// Front and back values of one card, before padding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardSides {
    pub front: Vec<String>,
    pub back: Vec<String>,
}

/// Strategy for locating front/back values inside a raw record
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, record: &Map<String, Value>) -> CardSides;
}

/// Exact lookup of the canonical keys
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectFields;

impl FieldExtractor for DirectFields {
    fn extract(&self, record: &Map<String, Value>) -> CardSides {
        let side = |key: &str| {
            record
                .get(key)
                .and_then(coerce_values)
                .unwrap_or_default()
        };

        CardSides {
            front: side(FRONT_KEY),
            back: side(BACK_KEY),
        }
    }
}

/// Takes the first list-valued entry whose key contains a marker word
#[derive(Debug, Clone)]
pub struct MarkerFields {
    pub front_marker: String,
    pub back_marker: String,
}

impl Default for MarkerFields {
    fn default() -> Self {
        Self {
            front_marker: "anverso".to_string(),
            back_marker: "reverso".to_string(),
        }
    }
}

impl MarkerFields {
    fn find(&self, record: &Map<String, Value>, marker: &str) -> Vec<String> {
        record
            .iter()
            .filter(|(key, value)| value.is_array() && key.to_lowercase().contains(marker))
            .find_map(|(_, value)| coerce_values(value))
            .unwrap_or_default()
    }
}

impl FieldExtractor for MarkerFields {
    fn extract(&self, record: &Map<String, Value>) -> CardSides {
        CardSides {
            front: self.find(record, &self.front_marker),
            back: self.find(record, &self.back_marker),
        }
    }
}

impl GeneratedCard {
    /// Front/back values, using `raw` for records that skipped validation
    pub fn sides(&self, raw: &dyn FieldExtractor) -> CardSides {
        match self {
            GeneratedCard::Record(record) => CardSides {
                front: record.front.clone(),
                back: record.back.clone(),
            },
            GeneratedCard::Raw(map) => raw.extract(map),
        }
    }
}

/// Pad with empty strings or truncate so exactly `count` values remain
pub fn fit_values(mut values: Vec<String>, count: usize) -> Vec<String> {
    values.resize(count, String::new());
    values
}
