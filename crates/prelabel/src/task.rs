//! Task documents as handed over by the annotation tool.
//!
//! Metadata fields are read leniently: a value of the wrong JSON type reads as
//! absent instead of failing the whole task.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{PrelabelError, Result};

/// Fallback data key holding the image reference.
pub const DEFAULT_IMAGE_KEY: &str = "image";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "or_default")]
    pub data: TaskData,
    #[serde(default, deserialize_with = "or_default")]
    pub meta: TaskMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(default, deserialize_with = "string_list")]
    pub default_colors: Vec<String>,
    #[serde(rename = "default_taille", default, deserialize_with = "non_empty_string")]
    pub default_size: Option<String>,
    #[serde(rename = "default_motif", default, deserialize_with = "non_empty_string")]
    pub default_pattern: Option<String>,
    /// Everything else, including the image reference
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    #[serde(rename = "couleurs", default, deserialize_with = "string_list")]
    pub colors: Vec<String>,
    /// First entry of `tailles`, if it is a non-empty string
    #[serde(rename = "tailles", default, deserialize_with = "first_entry", serialize_with = "as_list")]
    pub size: Option<String>,
    /// First entry of `motifs`, if it is a non-empty string
    #[serde(rename = "motifs", default, deserialize_with = "first_entry", serialize_with = "as_list")]
    pub pattern: Option<String>,
}

impl Task {
    /// Parse one task document. Only a non-object document is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PrelabelError::InvalidTask(
                "task document must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| PrelabelError::InvalidTask(e.to_string()))
    }

    /// Image reference stored under `key`, falling back to `data.image`.
    pub fn image_reference(&self, key: &str) -> Option<&str> {
        self.data
            .fields
            .get(key)
            .or_else(|| self.data.fields.get(DEFAULT_IMAGE_KEY))
            .and_then(Value::as_str)
    }
}

fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64())
}

fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        })
        .collect())
}

/// Only element 0 counts; a bad first entry is not replaced by a later one.
fn first_entry<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(mut items) if !items.is_empty() => match items.swap_remove(0) {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        },
        _ => None,
    })
}

fn as_list<S>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    value.as_slice().serialize(serializer)
}

fn non_empty_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_full_task() {
        let task = Task::from_value(json!({
            "id": 7,
            "data": {
                "image": "/data/local-files/?d=images/a.jpg",
                "default_colors": ["Gris"],
                "default_taille": "Petite",
                "default_motif": "Uni"
            },
            "meta": {
                "couleurs": ["Noir", "Blanc"],
                "tailles": ["Grande"],
                "espece": "Accipiter gentilis"
            }
        }))
        .unwrap();

        assert_eq!(task.id, Some(7));
        assert_eq!(task.meta.colors, vec!["Noir", "Blanc"]);
        assert_eq!(task.meta.size.as_deref(), Some("Grande"));
        assert!(task.meta.pattern.is_none());
        assert_eq!(task.data.default_colors, vec!["Gris"]);
        assert_eq!(task.data.default_size.as_deref(), Some("Petite"));
        assert_eq!(task.data.default_pattern.as_deref(), Some("Uni"));
        assert_eq!(
            task.image_reference("image"),
            Some("/data/local-files/?d=images/a.jpg")
        );
    }

    #[test]
    fn test_malformed_metadata_reads_as_absent() {
        let task = Task::from_value(json!({
            "id": "not-a-number",
            "data": { "img": "photo.png", "default_colors": "Noir", "default_taille": 3 },
            "meta": { "couleurs": "Noir", "tailles": [1, "", "Moyenne"], "motifs": null }
        }))
        .unwrap();

        assert_eq!(task.id, None);
        assert!(task.meta.colors.is_empty());
        assert!(task.meta.size.is_none());
        assert!(task.data.default_colors.is_empty());
        assert!(task.data.default_size.is_none());
        assert_eq!(task.image_reference("img"), Some("photo.png"));
        assert_eq!(task.image_reference("image"), None);
    }

    #[test]
    fn test_only_first_size_and_pattern_entry_counts() {
        let task = Task::from_value(json!({
            "meta": { "tailles": ["", "Grande"], "motifs": [1, "Uni"] }
        }))
        .unwrap();
        assert!(task.meta.size.is_none());
        assert!(task.meta.pattern.is_none());

        let task = Task::from_value(json!({ "meta": { "tailles": ["Petite", "Grande"] } })).unwrap();
        assert_eq!(task.meta.size.as_deref(), Some("Petite"));
        assert_eq!(serde_json::to_value(&task.meta).unwrap()["tailles"], json!(["Petite"]));
    }

    #[test]
    fn test_non_object_sections_fall_back_to_default() {
        let task = Task::from_value(json!({ "data": ["x"], "meta": 12 })).unwrap();
        assert_eq!(task.data, TaskData::default());
        assert_eq!(task.meta, TaskMeta::default());
    }

    #[test]
    fn test_non_object_task_is_rejected() {
        let err = Task::from_value(json!("just a string")).unwrap_err();
        assert!(matches!(err, PrelabelError::InvalidTask(_)));
        assert!(!err.is_fatal());
    }
}
