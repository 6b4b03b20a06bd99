use schemars::JsonSchema;
use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::types::{Defaults, PercentBox};

/// The attribute annotations that can hang off a region.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, JsonSchema,
    Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributeKind {
    Colors,
    Size,
    Pattern,
}

impl AttributeKind {
    /// Suffix appended to the parent region id to form the attribute id.
    pub fn id_suffix(&self) -> &'static str {
        match self {
            Self::Colors => "colors",
            Self::Size => "taille",
            Self::Pattern => "motif",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct RectangleValue {
    pub rectanglelabels: Vec<String>,
    #[serde(flatten)]
    pub bbox: PercentBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct RegionRecord {
    pub id: String,
    pub from_name: String,
    pub to_name: String,
    pub value: RectangleValue,
    pub score: f64,
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ChoicesValue {
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct AttributeRecord {
    pub id: String,
    #[serde(skip)]
    pub kind: AttributeKind,
    pub from_name: String,
    pub to_name: String,
    pub value: ChoicesValue,
    pub readonly: bool,
    pub origin: String,
    /// Id of the region this attribute describes
    pub parent_id: String,
}

/// One entry of a prediction's flat `result` list.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "type")]
pub enum AnnotationRecord {
    #[serde(rename = "rectanglelabels")]
    Region(RegionRecord),
    #[serde(rename = "choices")]
    Attribute(AttributeRecord),
}

impl AnnotationRecord {
    pub fn id(&self) -> &str {
        match self {
            Self::Region(region) => &region.id,
            Self::Attribute(attribute) => &attribute.id,
        }
    }

    pub fn as_region(&self) -> Option<&RegionRecord> {
        match self {
            Self::Region(region) => Some(region),
            Self::Attribute(_) => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&AttributeRecord> {
        match self {
            Self::Region(_) => None,
            Self::Attribute(attribute) => Some(attribute),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PredictionSummary {
    pub num_detections: usize,
    pub defaults_applied: Defaults,
}

/// Pre-annotation for a single task.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Prediction {
    pub result: Vec<AnnotationRecord>,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PredictionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Prediction {
    /// Fold assembled records into a prediction.
    ///
    /// The score is the mean over region records only; attribute records carry
    /// no score of their own. A prediction without regions scores `0`.
    pub fn aggregate(result: Vec<AnnotationRecord>, defaults: Defaults, model_version: &str) -> Self {
        let scores: Vec<f64> = result
            .iter()
            .filter_map(AnnotationRecord::as_region)
            .map(|region| region.score)
            .collect();

        let score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            result,
            score,
            model_version: Some(model_version.to_string()),
            meta: Some(PredictionSummary {
                num_detections: scores.len(),
                defaults_applied: defaults,
            }),
            error: None,
        }
    }

    /// Empty stand-in for a task that could not be processed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            result: Vec::new(),
            score: 0.0,
            model_version: None,
            meta: None,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn regions(&self) -> impl Iterator<Item = &RegionRecord> {
        self.result.iter().filter_map(AnnotationRecord::as_region)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeRecord> {
        self.result.iter().filter_map(AnnotationRecord::as_attribute)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Prediction)
    }
}
