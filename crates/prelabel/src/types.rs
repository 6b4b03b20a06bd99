use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One segmentation proposal emitted by a mask oracle.
#[derive(Debug, Clone)]
pub struct MaskCandidate {
    /// Pixel mask; any non-zero pixel belongs to the object
    pub segmentation: GrayImage,
    /// Oracle's own estimate of mask quality (0..1)
    pub predicted_iou: f64,
    /// Carried through from the oracle, not used for filtering
    pub stability_score: f64,
    /// Number of mask pixels as reported by the oracle
    pub area: u32,
}

impl MaskCandidate {
    pub fn new(segmentation: GrayImage, predicted_iou: f64) -> Self {
        let area = segmentation.pixels().filter(|p| p[0] > 0).count() as u32;
        Self {
            segmentation,
            predicted_iou,
            stability_score: 0.0,
            area,
        }
    }

    pub fn with_stability_score(mut self, stability_score: f64) -> Self {
        self.stability_score = stability_score;
        self
    }

    /// Tight bounding box of the mask pixels, `None` for an empty mask.
    pub fn pixel_bbox(&self) -> Option<PixelBox> {
        let mut bbox: Option<PixelBox> = None;

        for (x, y, pixel) in self.segmentation.enumerate_pixels() {
            if pixel[0] == 0 {
                continue;
            }
            bbox = Some(match bbox {
                None => PixelBox { x_min: x, y_min: y, x_max: x, y_max: y },
                Some(b) => PixelBox {
                    x_min: b.x_min.min(x),
                    y_min: b.y_min.min(y),
                    x_max: b.x_max.max(x),
                    y_max: b.y_max.max(y),
                },
            });
        }

        bbox
    }
}

/// Inclusive pixel extent of a mask: min/max column (x) and row (y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl PixelBox {
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    /// `width / height`, or `None` when the box has no height.
    pub fn aspect_ratio(&self) -> Option<f64> {
        match self.height() {
            0 => None,
            h => Some(self.width() as f64 / h as f64),
        }
    }
}

/// Box in percent of the image size, the unit annotation tools expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PercentBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Attribute values pre-filled from task metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Defaults {
    pub colors: Vec<String>,
    #[serde(rename = "taille")]
    pub size: Option<String>,
    #[serde(rename = "motif")]
    pub pattern: Option<String>,
}

impl Defaults {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.size.is_none() && self.pattern.is_none()
    }
}
