use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{PrelabelError, Result},
    traits::{CandidateFilter, Rejection},
    types::MaskCandidate,
};

/// Thresholds for the default filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FilterConfig {
    /// Candidates below this predicted IoU are dropped
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_predicted_iou: f64,
    /// Exclusive lower bound on width / height
    pub min_aspect_ratio: f64,
    /// Exclusive upper bound on width / height
    pub max_aspect_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_predicted_iou: 0.93,
            min_aspect_ratio: 0.15,
            max_aspect_ratio: 0.6,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_predicted_iou) {
            return Err(PrelabelError::Configuration(format!(
                "min_predicted_iou must be within [0, 1], got {}",
                self.min_predicted_iou
            )));
        }
        if !(self.min_aspect_ratio >= 0.0 && self.min_aspect_ratio < self.max_aspect_ratio) {
            return Err(PrelabelError::Configuration(format!(
                "aspect ratio bounds must satisfy 0 <= min < max, got ({}, {})",
                self.min_aspect_ratio, self.max_aspect_ratio
            )));
        }
        Ok(())
    }
}

/// Drops candidates the oracle itself is unsure about.
#[derive(Debug, Clone)]
pub struct ConfidenceFilter {
    pub min_predicted_iou: f64,
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self { min_predicted_iou: FilterConfig::default().min_predicted_iou }
    }
}

impl CandidateFilter for ConfidenceFilter {
    fn evaluate(&self, candidate: &MaskCandidate) -> std::result::Result<(), Rejection> {
        if candidate.predicted_iou < self.min_predicted_iou {
            return Err(Rejection::LowConfidence {
                predicted_iou: candidate.predicted_iou,
                threshold: self.min_predicted_iou,
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "confidence"
    }
}

/// Keeps only elongated masks: `min < width / height < max`, both ends open.
///
/// Near-square masks (ratio around 1.0) are grid cells and background patches,
/// not targets.
#[derive(Debug, Clone)]
pub struct AspectRatioFilter {
    pub min: f64,
    pub max: f64,
}

impl Default for AspectRatioFilter {
    fn default() -> Self {
        let config = FilterConfig::default();
        Self {
            min: config.min_aspect_ratio,
            max: config.max_aspect_ratio,
        }
    }
}

impl CandidateFilter for AspectRatioFilter {
    fn evaluate(&self, candidate: &MaskCandidate) -> std::result::Result<(), Rejection> {
        let bbox = candidate.pixel_bbox().ok_or(Rejection::EmptyMask)?;
        let ratio = bbox.aspect_ratio().ok_or(Rejection::ZeroHeight)?;

        if ratio > self.min && ratio < self.max {
            Ok(())
        } else {
            Err(Rejection::AspectRatio { ratio, min: self.min, max: self.max })
        }
    }

    fn name(&self) -> &'static str {
        "aspect_ratio"
    }
}

/// Run `filters` over `candidates` in order, keeping emission order.
///
/// Filters short-circuit: the first rejection ends evaluation of that
/// candidate, so cheap filters belong first. `on_reject` sees the candidate
/// index, the rejecting filter's name and the reason.
pub fn filter_candidates<F>(
    filters: &[Box<dyn CandidateFilter>],
    candidates: Vec<MaskCandidate>,
    mut on_reject: F,
) -> Vec<MaskCandidate>
where
    F: FnMut(usize, &'static str, &Rejection),
{
    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            for filter in filters {
                if let Err(rejection) = filter.evaluate(&candidate) {
                    on_reject(index, filter.name(), &rejection);
                    return None;
                }
            }
            Some(candidate)
        })
        .collect()
}

/// The confidence-then-shape chain built from `config`.
pub fn default_filters(config: &FilterConfig) -> Vec<Box<dyn CandidateFilter>> {
    vec![
        Box::new(ConfidenceFilter { min_predicted_iou: config.min_predicted_iou }),
        Box::new(AspectRatioFilter {
            min: config.min_aspect_ratio,
            max: config.max_aspect_ratio,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn rect_candidate(cols: (u32, u32), rows: (u32, u32), predicted_iou: f64) -> MaskCandidate {
        let mut img = GrayImage::new(200, 400);
        for y in rows.0..=rows.1 {
            for x in cols.0..=cols.1 {
                img.put_pixel(x, y, Luma([1u8]));
            }
        }
        MaskCandidate::new(img, predicted_iou)
    }

    fn run(candidates: Vec<MaskCandidate>) -> (Vec<MaskCandidate>, Vec<(usize, &'static str, Rejection)>) {
        let filters = default_filters(&FilterConfig::default());
        let mut rejected = Vec::new();
        let kept = filter_candidates(&filters, candidates, |i, name, r| rejected.push((i, name, *r)));
        (kept, rejected)
    }

    #[test]
    fn test_elongated_confident_mask_is_accepted() {
        let (kept, rejected) = run(vec![rect_candidate((10, 50), (20, 140), 0.95)]);
        assert_eq!(kept.len(), 1);
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_low_confidence_rejected_regardless_of_shape() {
        for iou in [0.0, 0.5, 0.929, 0.9299] {
            let (kept, rejected) = run(vec![rect_candidate((10, 50), (20, 140), iou)]);
            assert!(kept.is_empty());
            assert_eq!(rejected[0].1, "confidence");
            assert!(matches!(rejected[0].2, Rejection::LowConfidence { .. }));
        }
    }

    #[test]
    fn test_threshold_itself_passes() {
        let (kept, _) = run(vec![rect_candidate((10, 50), (20, 140), 0.93)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_just_below_threshold_is_rejected() {
        let (kept, rejected) = run(vec![rect_candidate((10, 50), (20, 140), 0.929_999_99)]);
        assert!(kept.is_empty());
        assert_eq!(rejected[0].1, "confidence");
    }

    #[test]
    fn test_confidence_checked_before_shape() {
        // Empty mask and low confidence: the confidence filter must be the one to reject.
        let (_, rejected) = run(vec![MaskCandidate::new(GrayImage::new(10, 10), 0.2)]);
        assert_eq!(rejected[0].1, "confidence");
    }

    #[test]
    fn test_square_mask_rejected() {
        let (kept, rejected) = run(vec![rect_candidate((10, 110), (10, 110), 0.99)]);
        assert!(kept.is_empty());
        match rejected[0].2 {
            Rejection::AspectRatio { ratio, .. } => assert!((ratio - 1.0).abs() < 1e-9),
            other => panic!("unexpected rejection {other:?}"),
        }
    }

    #[test]
    fn test_aspect_ratio_bounds_are_strict() {
        // width 30 / height 200 = 0.15 exactly
        let (kept, _) = run(vec![rect_candidate((10, 40), (10, 210), 0.99)]);
        assert!(kept.is_empty());
        // width 60 / height 100 = 0.6 exactly
        let (kept, _) = run(vec![rect_candidate((10, 70), (10, 110), 0.99)]);
        assert!(kept.is_empty());
        // width 59 / height 100 just inside
        let (kept, _) = run(vec![rect_candidate((10, 69), (10, 110), 0.99)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_degenerate_masks_rejected() {
        let (kept, rejected) = run(vec![
            MaskCandidate::new(GrayImage::new(10, 10), 0.99),
            rect_candidate((5, 80), (30, 30), 0.99),
        ]);
        assert!(kept.is_empty());
        assert_eq!(rejected[0].2, Rejection::EmptyMask);
        assert_eq!(rejected[1].2, Rejection::ZeroHeight);
    }

    #[test]
    fn test_order_is_preserved() {
        let (kept, rejected) = run(vec![
            rect_candidate((10, 50), (20, 140), 0.94),
            rect_candidate((10, 110), (10, 110), 0.99),
            rect_candidate((100, 120), (50, 150), 0.99),
            rect_candidate((0, 20), (0, 90), 0.96),
        ]);
        let scores: Vec<f64> = kept.iter().map(|c| c.predicted_iou).collect();
        assert_eq!(scores, vec![0.94, 0.99, 0.96]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, 1);
    }

    #[test]
    fn test_every_accepted_candidate_satisfies_bounds() {
        let mut candidates = Vec::new();
        for w in (0..120).step_by(7) {
            for h in (0..300).step_by(13) {
                candidates.push(rect_candidate((5, 5 + w), (5, 5 + h), 0.97));
            }
        }
        let (kept, _) = run(candidates);
        assert!(!kept.is_empty());
        for candidate in kept {
            let ratio = candidate.pixel_bbox().unwrap().aspect_ratio().unwrap();
            assert!(ratio > 0.15 && ratio < 0.6, "ratio {ratio} escaped the filter");
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(FilterConfig::default().validate().is_ok());
        let inverted = FilterConfig { min_aspect_ratio: 0.7, ..FilterConfig::default() };
        assert!(inverted.validate().unwrap_err().is_fatal());
        let iou = FilterConfig { min_predicted_iou: 1.5, ..FilterConfig::default() };
        assert!(iou.validate().is_err());
    }
}
