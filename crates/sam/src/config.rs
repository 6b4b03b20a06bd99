use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::warn;

/// SAM backbone size, as named by `segment_anything.sam_model_registry`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SamModelType {
    VitH,
    VitL,
    VitB,
}

impl SamModelType {
    /// Infer the backbone from a checkpoint file name such as
    /// `sam_vit_b_01ec64.pth`; unknown names fall back to `vit_h`.
    pub fn from_checkpoint(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.contains("vit_h") {
            Self::VitH
        } else if name.contains("vit_l") {
            Self::VitL
        } else if name.contains("vit_b") {
            Self::VitB
        } else {
            warn!(checkpoint = %path.display(), "Unknown SAM model type, defaulting to vit_h");
            Self::VitH
        }
    }
}

/// Automatic mask generator settings, passed through to SAM.
///
/// Defaults favour few, large, stable masks over dense coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratorParams {
    pub points_per_side: u32,
    pub pred_iou_thresh: f32,
    pub stability_score_thresh: f32,
    pub crop_n_layers: u32,
    pub crop_n_points_downscale_factor: u32,
    /// Masks smaller than this many pixels are dropped by SAM itself
    pub min_mask_region_area: u32,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            points_per_side: 100,
            pred_iou_thresh: 0.60,
            stability_score_thresh: 0.90,
            crop_n_layers: 0,
            crop_n_points_downscale_factor: 1,
            min_mask_region_area: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SamOracleConfig {
    /// Python helper that runs the mask generator
    pub script_path: PathBuf,
    /// Interpreter used when no uv environment is given
    pub python: String,
    /// `uv` executable; when set the helper runs as `uv run python <script>`
    pub uv_env_path: Option<PathBuf>,
    pub checkpoint: PathBuf,
    /// Overrides the type inferred from the checkpoint name
    pub model_type: Option<SamModelType>,
    /// `cuda` / `cpu`; the helper picks when unset
    pub device: Option<String>,
    pub generator: GeneratorParams,
}

impl Default for SamOracleConfig {
    fn default() -> Self {
        Self {
            script_path: PathBuf::from("crates/sam/scripts/generate_masks.py"),
            python: "python".to_string(),
            uv_env_path: None,
            checkpoint: PathBuf::from("models/sam_vit_b_01ec64.pth"),
            model_type: None,
            device: None,
            generator: GeneratorParams::default(),
        }
    }
}

impl SamOracleConfig {
    pub fn resolved_model_type(&self) -> SamModelType {
        self.model_type
            .unwrap_or_else(|| SamModelType::from_checkpoint(&self.checkpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_from_checkpoint() {
        assert_eq!(SamModelType::from_checkpoint(Path::new("models/sam_vit_b_01ec64.pth")), SamModelType::VitB);
        assert_eq!(SamModelType::from_checkpoint(Path::new("/m/sam_vit_l_0b3195.pth")), SamModelType::VitL);
        assert_eq!(SamModelType::from_checkpoint(Path::new("SAM_VIT_H_4b8939.pth")), SamModelType::VitH);
        assert_eq!(SamModelType::from_checkpoint(Path::new("custom.pth")), SamModelType::VitH);
    }

    #[test]
    fn test_model_type_override_wins() {
        let config = SamOracleConfig {
            model_type: Some(SamModelType::VitL),
            ..SamOracleConfig::default()
        };
        assert_eq!(config.resolved_model_type(), SamModelType::VitL);
        assert_eq!(SamOracleConfig::default().resolved_model_type(), SamModelType::VitB);
    }

    #[test]
    fn test_partial_config_keeps_generator_defaults() {
        let config: SamOracleConfig = serde_json::from_str(
            r#"{ "checkpoint": "sam_vit_h.pth", "generator": { "points_per_side": 32 } }"#,
        )
        .unwrap();
        assert_eq!(config.generator.points_per_side, 32);
        assert_eq!(config.generator.min_mask_region_area, 500);
        assert_eq!(config.python, "python");
        assert_eq!(SamModelType::VitH.to_string(), "vit_h");
    }
}
