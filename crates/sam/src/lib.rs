//! SAM (`segment_anything`, ViT-B/L/H checkpoints) automatic mask generation
//! through a Python helper process.
//!
//! The image goes to the helper as a temporary PNG, the generator settings as a
//! temporary JSON file; the helper prints `{"masks": [...]}` on stdout with each
//! mask as uncompressed RLE.

pub mod config;
pub mod error;
pub mod rle;

use std::{path::Path, process::Command};

use image::{ImageFormat, RgbImage};
use prelabel::{MaskCandidate, MaskOracle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use config::{GeneratorParams, SamModelType, SamOracleConfig};
pub use error::{Result, SamError};
use rle::UncompressedRle;

/// Parameters file handed to the helper.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    checkpoint: &'a Path,
    model_type: SamModelType,
    device: Option<&'a str>,
    #[serde(flatten)]
    generator: &'a GeneratorParams,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    masks: Vec<GeneratedMask>,
}

#[derive(Debug, Deserialize)]
struct GeneratedMask {
    segmentation: UncompressedRle,
    #[serde(default)]
    predicted_iou: f64,
    #[serde(default)]
    stability_score: f64,
    #[serde(default)]
    area: Option<u32>,
}

impl GeneratedMask {
    fn into_candidate(self) -> Result<MaskCandidate> {
        let segmentation = self.segmentation.decode()?;
        let mut candidate = MaskCandidate::new(segmentation, self.predicted_iou)
            .with_stability_score(self.stability_score);
        if let Some(area) = self.area {
            candidate.area = area;
        }
        Ok(candidate)
    }
}

/// [`MaskOracle`] backed by `segment_anything`'s automatic mask generator.
pub struct SamSubprocessOracle {
    config: SamOracleConfig,
    model_type: SamModelType,
}

impl SamSubprocessOracle {
    /// Check that the checkpoint and helper script exist before any task runs.
    pub fn new(config: SamOracleConfig) -> Result<Self> {
        if !config.checkpoint.exists() {
            return Err(SamError::CheckpointNotFound { path: config.checkpoint.clone() });
        }
        if !config.script_path.exists() {
            return Err(SamError::ScriptNotFound { path: config.script_path.clone() });
        }

        let model_type = config.resolved_model_type();
        info!(
            model_type = %model_type,
            checkpoint = %config.checkpoint.display(),
            "Configured SAM mask generator"
        );

        Ok(Self { config, model_type })
    }

    pub fn model_type(&self) -> SamModelType {
        self.model_type
    }

    /// Run the helper on `image` and decode its masks.
    pub fn generate_masks(&self, image: &RgbImage) -> Result<Vec<MaskCandidate>> {
        let input = tempfile::Builder::new()
            .prefix("sam-input-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        let params = tempfile::Builder::new()
            .prefix("sam-params-")
            .suffix(".json")
            .tempfile()?;
        serde_json::to_writer(&params, &GenerateRequest {
            checkpoint: &self.config.checkpoint,
            model_type: self.model_type,
            device: self.config.device.as_deref(),
            generator: &self.config.generator,
        })?;

        let mut cmd = if let Some(uv_path) = &self.config.uv_env_path {
            let mut c = Command::new(uv_path);
            c.arg("run")
                .arg(&self.config.python)
                .arg(&self.config.script_path);
            c
        } else {
            let mut c = Command::new(&self.config.python);
            c.arg(&self.config.script_path);
            c
        };

        debug!(image = %input.path().display(), "Running mask generator");
        let output = cmd
            .arg("--input")
            .arg(input.path())
            .arg("--params")
            .arg(params.path())
            .output()?;

        if !output.status.success() {
            return Err(SamError::ScriptFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let response: GenerateResponse = serde_json::from_slice(&output.stdout)?;
        response
            .masks
            .into_iter()
            .map(GeneratedMask::into_candidate)
            .collect()
    }
}

impl MaskOracle for SamSubprocessOracle {
    fn generate(&self, image: &RgbImage) -> prelabel::Result<Vec<MaskCandidate>> {
        Ok(self.generate_masks(image)?)
    }
}
