//! Data models for templates, generated cards and packaged decks

use std::collections::HashSet;
use std::path::PathBuf;

use rand::Rng;
use serde::de;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Key under which the model emits front-side values.
pub const FRONT_KEY: &str = "campos_anverso";

/// Key under which the model emits back-side values.
pub const BACK_KEY: &str = "campo_reverso";

/// Lowest identifier handed out by [`generate_id`].
const MIN_ID: i64 = 1 << 31;

/// Identifiers stay below 2^53 so they survive a trip through JSON numbers.
const MAX_ID: i64 = 1 << 53;

/// Generate a random identifier for a deck or template.
pub fn generate_id() -> i64 {
    rand::thread_rng().gen_range(MIN_ID..MAX_ID)
}

/// Why a template was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Template needs at least one front field")]
    NoFrontFields,

    #[error("Template needs at least one back field")]
    NoBackFields,

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),
}

/// The ordered front/back field schema a deck's notes conform to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub template_id: i64,
    pub template_name: String,
    pub front: Vec<String>,
    pub back: Vec<String>,
}

impl TemplateSpec {
    pub fn new(template_id: i64, template_name: impl Into<String>, front: Vec<String>, back: Vec<String>) -> Self {
        Self {
            template_id,
            template_name: template_name.into(),
            front,
            back,
        }
    }

    /// All field names, front first, in order
    pub fn field_names(&self) -> Vec<String> {
        self.front.iter().chain(self.back.iter()).cloned().collect()
    }

    /// Check the field lists before they are used to shape notes.
    ///
    /// Names must be unique across both sides and usable as Anki field names.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.front.is_empty() {
            return Err(TemplateError::NoFrontFields);
        }
        if self.back.is_empty() {
            return Err(TemplateError::NoBackFields);
        }

        let mut seen = HashSet::new();
        for name in self.front.iter().chain(self.back.iter()) {
            if !is_valid_field_name(name) {
                return Err(TemplateError::InvalidFieldName(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(TemplateError::DuplicateField(name.clone()));
            }
        }

        Ok(())
    }
}

fn is_valid_field_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && !trimmed.starts_with(['#', '/', '^'])
        && !trimmed.contains([':', '{', '}', '"'])
}

/// Sampling settings and system instruction for one generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

impl GenerationParameters {
    pub fn new(system_prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

/// A validated front/back value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardRecord {
    #[serde(rename = "campos_anverso", deserialize_with = "one_or_many")]
    pub front: Vec<String>,
    #[serde(rename = "campo_reverso", deserialize_with = "one_or_many")]
    pub back: Vec<String>,
}

impl FlashcardRecord {
    /// Build a record from loosely typed JSON values.
    ///
    /// Each side may be a single string or an array of strings and must end
    /// up non-empty; anything else yields `None`.
    pub fn from_values(front: &Value, back: &Value) -> Option<Self> {
        let front = coerce_values(front)?;
        let back = coerce_values(back)?;
        if front.is_empty() || back.is_empty() {
            return None;
        }
        Some(Self { front, back })
    }
}

/// Coerce a JSON value into a list of strings.
pub fn coerce_values(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Key carrying a card's variant in serialized drafts.
pub const CARD_KIND_KEY: &str = "kind";

/// A card returned by a generation run, awaiting user review
///
/// Serialized as a flat object tagged with `"kind": "record" | "raw"`.
/// Records are revalidated when read back; untagged objects load as raw.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedCard {
    /// Passed strict validation
    Record(FlashcardRecord),
    /// Passed through as-is; keys are interpreted at packaging time
    Raw(Map<String, Value>),
}

impl Serialize for GeneratedCard {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = serializer.serialize_map(None)?;
        match self {
            GeneratedCard::Record(record) => {
                out.serialize_entry(CARD_KIND_KEY, "record")?;
                out.serialize_entry(FRONT_KEY, &record.front)?;
                out.serialize_entry(BACK_KEY, &record.back)?;
            }
            GeneratedCard::Raw(map) => {
                out.serialize_entry(CARD_KIND_KEY, "raw")?;
                for (key, value) in map.iter().filter(|(key, _)| key.as_str() != CARD_KIND_KEY) {
                    out.serialize_entry(key, value)?;
                }
            }
        }
        out.end()
    }
}

impl<'de> Deserialize<'de> for GeneratedCard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        match map.remove(CARD_KIND_KEY) {
            None => Ok(GeneratedCard::Raw(map)),
            Some(Value::String(kind)) if kind == "raw" => Ok(GeneratedCard::Raw(map)),
            Some(Value::String(kind)) if kind == "record" => {
                let front = map.get(FRONT_KEY).unwrap_or(&Value::Null);
                let back = map.get(BACK_KEY).unwrap_or(&Value::Null);
                FlashcardRecord::from_values(front, back)
                    .map(GeneratedCard::Record)
                    .ok_or_else(|| {
                        de::Error::custom(format!("record needs non-empty {} and {} strings", FRONT_KEY, BACK_KEY))
                    })
            }
            Some(other) => Err(de::Error::custom(format!("unknown card kind: {}", other))),
        }
    }
}

/// Confirmation payload that triggers packaging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSpec {
    #[serde(rename = "deckname")]
    pub name: String,
    pub template: TemplateSpec,
    #[serde(rename = "flashc")]
    pub cards: Vec<GeneratedCard>,
}

/// Durable record of a packaged deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckArtifact {
    pub deck_name: String,
    pub deck_id: i64,
    pub file_path: PathBuf,
    pub template_name: String,
    pub template_id: i64,
}

impl DeckArtifact {
    /// File name of the packaged deck, as used by the sync layer
    pub fn file_name(&self) -> Option<String> {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
    }
}

/// A template persisted independently of any deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTemplate {
    #[serde(flatten)]
    pub spec: TemplateSpec,
}

impl StoredTemplate {
    pub fn id(&self) -> i64 {
        self.spec.template_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(front: &[&str], back: &[&str]) -> TemplateSpec {
        TemplateSpec::new(
            1,
            "Basic",
            front.iter().map(|s| s.to_string()).collect(),
            back.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_template_validation() {
        assert!(template(&["Question"], &["Answer"]).validate().is_ok());
        assert_eq!(
            template(&[], &["Answer"]).validate(),
            Err(TemplateError::NoFrontFields)
        );
        assert_eq!(
            template(&["Question"], &[]).validate(),
            Err(TemplateError::NoBackFields)
        );
        assert_eq!(
            template(&["Term", "Hint"], &["Term"]).validate(),
            Err(TemplateError::DuplicateField("Term".to_string()))
        );
        assert_eq!(
            template(&["a:b"], &["Answer"]).validate(),
            Err(TemplateError::InvalidFieldName("a:b".to_string()))
        );
        assert_eq!(
            template(&["  "], &["Answer"]).validate(),
            Err(TemplateError::InvalidFieldName("  ".to_string()))
        );
    }

    #[test]
    fn test_record_coerces_single_string() {
        let record = FlashcardRecord::from_values(&json!("Q"), &json!(["A", "B"])).unwrap();
        assert_eq!(record.front, vec!["Q"]);
        assert_eq!(record.back, vec!["A", "B"]);
    }

    #[test]
    fn test_record_rejects_bad_values() {
        assert!(FlashcardRecord::from_values(&json!(["Q"]), &json!([])).is_none());
        assert!(FlashcardRecord::from_values(&json!([1, 2]), &json!(["A"])).is_none());
        assert!(FlashcardRecord::from_values(&json!({"x": 1}), &json!(["A"])).is_none());
        assert!(FlashcardRecord::from_values(&Value::Null, &json!(["A"])).is_none());
    }

    #[test]
    fn test_generated_card_keeps_its_kind() {
        let record = GeneratedCard::Record(FlashcardRecord {
            front: vec!["Q".to_string()],
            back: vec!["A".to_string()],
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"kind": "record", "campos_anverso": ["Q"], "campo_reverso": ["A"]}));
        assert_eq!(serde_json::from_value::<GeneratedCard>(value).unwrap(), record);

        let raw = GeneratedCard::Raw(json!({"campos_anverso": "Q", "campo_reverso": "A"}).as_object().cloned().unwrap());
        let value = serde_json::to_value(&raw).unwrap();
        assert_eq!(value["kind"], json!("raw"));
        assert_eq!(serde_json::from_value::<GeneratedCard>(value).unwrap(), raw);
    }

    #[test]
    fn test_untagged_card_loads_as_raw() {
        let card: GeneratedCard =
            serde_json::from_value(json!({"campos_anverso": [], "campo_reverso": []})).unwrap();
        assert!(matches!(card, GeneratedCard::Raw(_)));

        let card: GeneratedCard = serde_json::from_value(json!({"pregunta": ["Q"]})).unwrap();
        assert!(matches!(card, GeneratedCard::Raw(map) if map.contains_key("pregunta")));
    }

    #[test]
    fn test_record_kind_is_revalidated() {
        let empty = json!({"kind": "record", "campos_anverso": [], "campo_reverso": []});
        assert!(serde_json::from_value::<GeneratedCard>(empty).is_err());

        let missing_back = json!({"kind": "record", "campos_anverso": ["Q"]});
        assert!(serde_json::from_value::<GeneratedCard>(missing_back).is_err());

        let unknown = json!({"kind": "other", "campos_anverso": ["Q"], "campo_reverso": ["A"]});
        assert!(serde_json::from_value::<GeneratedCard>(unknown).is_err());

        let coerced: GeneratedCard =
            serde_json::from_value(json!({"kind": "record", "campos_anverso": "Q", "campo_reverso": ["A"]})).unwrap();
        assert_eq!(
            coerced,
            GeneratedCard::Record(FlashcardRecord {
                front: vec!["Q".to_string()],
                back: vec!["A".to_string()],
            })
        );
    }

    #[test]
    fn test_ids_unique_across_many_draws() {
        let ids: HashSet<i64> = (0..10_000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 10_000);
        assert!(ids.iter().all(|id| (MIN_ID..MAX_ID).contains(id)));
    }

    #[test]
    fn test_stored_template_layout() {
        let stored = StoredTemplate {
            spec: template(&["Question"], &["Answer"]),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["template_id"], json!(1));
        assert_eq!(value["template_name"], json!("Basic"));
        assert_eq!(value["front"], json!(["Question"]));
        assert_eq!(value["back"], json!(["Answer"]));
    }
}
