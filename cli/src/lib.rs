use prelabel::{
    AttributeNames, FilterConfig, ImageRootsConfig, LabelSchema, LocalFilesResolver, Pipeline,
    PrelabelError, pipeline::DEFAULT_MODEL_VERSION,
};
use sam::{SamError, SamOracleConfig, SamSubprocessOracle};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Prelabel(#[from] PrelabelError),
    #[error(transparent)]
    Sam(#[from] SamError),
    #[error("Tasks file must contain a JSON array of tasks")]
    TasksNotAnArray,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Everything the backend needs before the first task arrives.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BackendConfig {
    #[serde(default = "default_model_version")]
    pub model_version: String,
    /// Class written into every region
    #[serde(default = "default_region_label")]
    pub region_label: String,
    /// Parsed Label Studio label config (JSON)
    pub label_config: PathBuf,
    #[serde(default)]
    pub attributes: AttributeNames,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub images: ImageRootsConfig,
    #[serde(default)]
    pub oracle: SamOracleConfig,
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

fn default_region_label() -> String {
    "Plume".to_string()
}

impl BackendConfig {
    /// Load BackendConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load BackendConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load BackendConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load BackendConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Convert BackendConfig to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(BackendConfig)
    }

    /// Read and validate the label config. Any problem here is fatal.
    pub fn label_schema(&self) -> Result<LabelSchema, CliError> {
        Ok(LabelSchema::from_json_file(
            &self.label_config,
            &self.region_label,
            self.attributes.clone(),
        )?)
    }

    /// Wire the SAM oracle, resolver and filters into a pipeline.
    pub fn build_pipeline(&self) -> Result<Pipeline, CliError> {
        let schema = self.label_schema()?;
        let oracle = SamSubprocessOracle::new(self.oracle.clone())?;

        Ok(Pipeline::builder(schema)
            .oracle(oracle)
            .resolver(LocalFilesResolver::new(&self.images))
            .with_filter_config(&self.filter)?
            .model_version(self.model_version.clone())
            .build()?)
    }
}

/// Read a JSON array of task documents, leaving each element unparsed.
pub fn read_task_documents<P: AsRef<Path>>(path: P) -> Result<Vec<serde_json::Value>, CliError> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        serde_json::Value::Array(documents) => Ok(documents),
        _ => Err(CliError::TasksNotAnArray),
    }
}
