use std::{fmt, path::PathBuf};

use image::RgbImage;

use crate::{
    error::{PrelabelError, Result},
    prediction::Prediction,
    types::{Defaults, MaskCandidate},
};

/// External segmentation model: one RGB image in, candidate masks out.
///
/// Candidates are returned in the oracle's emission order, which the rest of
/// the pipeline preserves.
pub trait MaskOracle: Send + Sync {
    /// Segment the image into candidate masks
    fn generate(&self, image: &RgbImage) -> Result<Vec<MaskCandidate>>;
}

/// Maps a task's image reference to a readable local file.
pub trait ImageResolver: Send + Sync {
    /// Resolve the reference to an existing local path
    fn resolve(&self, reference: &str) -> Result<PathBuf>;
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    LowConfidence { predicted_iou: f64, threshold: f64 },
    EmptyMask,
    ZeroHeight,
    AspectRatio { ratio: f64, min: f64, max: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowConfidence { predicted_iou, threshold } => {
                write!(f, "predicted IoU {predicted_iou:.3} below {threshold:.3}")
            }
            Self::EmptyMask => write!(f, "mask has no pixels"),
            Self::ZeroHeight => write!(f, "mask bounding box has zero height"),
            Self::AspectRatio { ratio, min, max } => {
                write!(f, "aspect ratio {ratio:.3} outside ({min}, {max})")
            }
        }
    }
}

/// Predicate over a single candidate.
pub trait CandidateFilter: Send + Sync {
    /// Accept the candidate or say why not
    fn evaluate(&self, candidate: &MaskCandidate) -> std::result::Result<(), Rejection>;

    /// Get the filter name
    fn name(&self) -> &'static str;
}

/// Receives progress events from the prediction pipeline.
///
/// Every method has an empty default so implementations only pick what they
/// need. Observers must not fail; they are told about faults, never cause them.
pub trait PipelineObserver: Send + Sync {
    /// A task is about to be processed
    fn task_started(&self, _task_index: usize, _image_reference: Option<&str>) {}

    /// Attribute defaults were read from the task metadata
    fn defaults_extracted(&self, _task_index: usize, _defaults: &Defaults) {}

    /// The oracle returned `count` candidates
    fn candidates_generated(&self, _task_index: usize, _count: usize) {}

    /// A filter dropped one candidate
    fn candidate_rejected(&self, _task_index: usize, _candidate_index: usize, _filter: &'static str, _rejection: &Rejection) {}

    /// Filtering finished with `accepted` of `generated` candidates kept
    fn candidates_accepted(&self, _task_index: usize, _generated: usize, _accepted: usize) {}

    /// A prediction was produced for the task
    fn task_completed(&self, _task_index: usize, _prediction: &Prediction) {}

    /// The task failed and gets an error prediction
    fn task_failed(&self, _task_index: usize, _error: &PrelabelError) {}
}
