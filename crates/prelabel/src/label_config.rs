//! Names the prediction records must carry to line up with the labelling
//! interface. Read once at start-up; anything unexpected is fatal.

use std::{collections::BTreeMap, fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{PrelabelError, Result},
    prediction::AttributeKind,
};

const RECTANGLE_LABELS: &str = "RectangleLabels";
const CHOICES: &str = "Choices";

/// One control tag of a parsed Label Studio config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControlTag {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub to_name: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<InputTag>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputTag {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: String,
}

/// Control tags keyed by their `name`.
pub type ParsedLabelConfig = BTreeMap<String, ControlTag>;

/// `from_name` of each attribute control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AttributeNames {
    pub colors: String,
    pub size: String,
    pub pattern: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            colors: "colors".to_string(),
            size: "taille".to_string(),
            pattern: "motif".to_string(),
        }
    }
}

impl AttributeNames {
    pub fn get(&self, kind: AttributeKind) -> &str {
        match kind {
            AttributeKind::Colors => &self.colors,
            AttributeKind::Size => &self.size,
            AttributeKind::Pattern => &self.pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    /// Name of the rectangle control
    pub from_name: String,
    /// Name of the image object the rectangles refer to
    pub to_name: String,
    /// Task data key holding the image reference
    pub image_key: String,
    /// Class written into every region
    pub region_label: String,
    pub attribute_names: AttributeNames,
}

impl LabelSchema {
    pub fn new(
        from_name: impl Into<String>,
        to_name: impl Into<String>,
        image_key: impl Into<String>,
        region_label: impl Into<String>,
    ) -> Self {
        Self {
            from_name: from_name.into(),
            to_name: to_name.into(),
            image_key: image_key.into(),
            region_label: region_label.into(),
            attribute_names: AttributeNames::default(),
        }
    }

    pub fn with_attribute_names(mut self, attribute_names: AttributeNames) -> Self {
        self.attribute_names = attribute_names;
        self
    }

    pub fn attribute_from_name(&self, kind: AttributeKind) -> &str {
        self.attribute_names.get(kind)
    }

    /// Validate a parsed config and pull the names out of it.
    ///
    /// Requires exactly one `RectangleLabels` control with a target and an
    /// input, the region label among its labels when it lists any, and a
    /// `Choices` control for every attribute name.
    pub fn from_parsed_config(
        config: &ParsedLabelConfig,
        region_label: &str,
        attribute_names: AttributeNames,
    ) -> Result<Self> {
        let rectangles: Vec<(&String, &ControlTag)> = config
            .iter()
            .filter(|(_, tag)| tag.kind.eq_ignore_ascii_case(RECTANGLE_LABELS))
            .collect();

        let (from_name, control) = match rectangles.as_slice() {
            [single] => *single,
            other => {
                return Err(PrelabelError::Configuration(format!(
                    "expected exactly 1 {RECTANGLE_LABELS} control, found {}",
                    other.len()
                )));
            }
        };

        let to_name = control.to_name.first().ok_or_else(|| {
            PrelabelError::Configuration(format!("control '{from_name}' has no to_name"))
        })?;
        let image_key = control.inputs.first().map(|input| &input.value).ok_or_else(|| {
            PrelabelError::Configuration(format!("control '{from_name}' has no inputs"))
        })?;

        if !control.labels.is_empty() && !control.labels.iter().any(|l| l == region_label) {
            return Err(PrelabelError::Configuration(format!(
                "label '{region_label}' is not one of {:?} in control '{from_name}'",
                control.labels
            )));
        }

        for kind in [AttributeKind::Colors, AttributeKind::Size, AttributeKind::Pattern] {
            let name = attribute_names.get(kind);
            match config.get(name) {
                Some(tag) if tag.kind.eq_ignore_ascii_case(CHOICES) => {}
                Some(tag) => {
                    return Err(PrelabelError::Configuration(format!(
                        "{kind} control '{name}' must be {CHOICES}, found {}",
                        tag.kind
                    )));
                }
                None => {
                    return Err(PrelabelError::Configuration(format!(
                        "{kind} control '{name}' is missing from the label config"
                    )));
                }
            }
        }

        info!(from_name = %from_name, to_name = %to_name, image_key = %image_key, "Label config parsed");

        Ok(Self {
            from_name: from_name.clone(),
            to_name: to_name.clone(),
            image_key: image_key.clone(),
            region_label: region_label.to_string(),
            attribute_names,
        })
    }

    pub fn from_json(content: &str, region_label: &str, attribute_names: AttributeNames) -> Result<Self> {
        let config: ParsedLabelConfig = serde_json::from_str(content)
            .map_err(|e| PrelabelError::Configuration(format!("unreadable label config: {e}")))?;
        Self::from_parsed_config(&config, region_label, attribute_names)
    }

    pub fn from_json_file<P: AsRef<Path>>(
        path: P,
        region_label: &str,
        attribute_names: AttributeNames,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PrelabelError::Configuration(format!("cannot read label config {}: {e}", path.display()))
        })?;
        Self::from_json(&content, region_label, attribute_names)
    }
}
