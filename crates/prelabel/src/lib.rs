//! # Prelabel
//!
//! Turns segmentation candidates from a mask oracle (SAM or anything that
//! speaks [`MaskOracle`]) into pre-annotations for an image labelling tool:
//! rectangle regions plus attribute choices pre-filled from task metadata.
//!
//! ## Core Features
//!
//! - **Candidate filtering**: confidence first, then a strict aspect-ratio window
//! - **Percent boxes**: pixel extents projected into image-relative coordinates
//! - **Linked attributes**: colors / size / pattern annotations tied to their region by `parent_id`
//! - **Failure isolation**: one broken task never takes the batch down
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prelabel::{AttributeNames, LabelSchema, Pipeline, Task};
//! # use prelabel::{MaskOracle, MaskCandidate};
//! # struct MyOracle;
//! # impl MaskOracle for MyOracle {
//! #     fn generate(&self, _: &image::RgbImage) -> prelabel::Result<Vec<MaskCandidate>> { Ok(vec![]) }
//! # }
//!
//! let schema = LabelSchema::from_json_file("label_config.json", "Plume", AttributeNames::default())?;
//! let pipeline = Pipeline::builder(schema)
//!     .oracle(MyOracle)
//!     .build()?;
//!
//! let task = Task::from_value(serde_json::json!({
//!     "data": { "image": "images/feather.jpg" },
//!     "meta": { "couleurs": ["Noir", "Blanc"], "tailles": ["Grande"] }
//! }))?;
//! let predictions = pipeline.predict(&[task]);
//! println!("{}", serde_json::to_string_pretty(&predictions)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod task;
pub mod prediction;
pub mod traits;
pub mod algorithms;
pub mod assembly;
pub mod label_config;
pub mod resolve;
pub mod observe;
pub mod pipeline;

// Re-exports for convenience
pub use error::{PrelabelError, Result};
pub use types::{Defaults, ImageDimensions, MaskCandidate, PercentBox, PixelBox};
pub use task::Task;
pub use prediction::{AnnotationRecord, AttributeKind, AttributeRecord, Prediction, RegionRecord};
pub use traits::*;
pub use algorithms::*;
pub use assembly::{RegionAssembler, RegionIdGenerator};
pub use label_config::{AttributeNames, LabelSchema};
pub use resolve::{ImageRootsConfig, LocalFilesResolver};
pub use observe::{NoopObserver, TracingObserver};
pub use pipeline::{Pipeline, builder::PipelineBuilder};
