pub mod builder;

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::Arc,
};

use image::RgbImage;
use serde_json::Value;

use crate::{
    algorithms::{extract_defaults, filter_candidates},
    assembly::{RegionAssembler, RegionIdGenerator},
    error::{PrelabelError, Result},
    label_config::LabelSchema,
    prediction::Prediction,
    task::Task,
    traits::{CandidateFilter, ImageResolver, MaskOracle, PipelineObserver},
    types::ImageDimensions,
};

pub const DEFAULT_MODEL_VERSION: &str = "SAM-with-metadata-v1";

/// Task-to-prediction pipeline: resolve, segment, filter, assemble, aggregate.
///
/// Tasks are processed one after another and each one is isolated: whatever
/// goes wrong inside a task becomes that task's error prediction.
pub struct Pipeline {
    oracle: Box<dyn MaskOracle>,
    resolver: Box<dyn ImageResolver>,
    filters: Vec<Box<dyn CandidateFilter>>,
    observer: Arc<dyn PipelineObserver>,
    schema: LabelSchema,
    model_version: String,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(schema: LabelSchema) -> builder::PipelineBuilder {
        builder::PipelineBuilder::new(schema)
    }

    pub fn new(
        oracle: Box<dyn MaskOracle>,
        resolver: Box<dyn ImageResolver>,
        filters: Vec<Box<dyn CandidateFilter>>,
        observer: Arc<dyn PipelineObserver>,
        schema: LabelSchema,
        model_version: String,
    ) -> Self {
        Self {
            oracle,
            resolver,
            filters,
            observer,
            schema,
            model_version,
        }
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    /// One prediction per task, in input order.
    pub fn predict(&self, tasks: &[Task]) -> Vec<Prediction> {
        tasks
            .iter()
            .enumerate()
            .map(|(index, task)| self.predict_task(index, task))
            .collect()
    }

    /// Like [`Pipeline::predict`] but over raw task documents; a document that
    /// is not a task yields an error prediction in its slot.
    pub fn predict_documents(&self, documents: Vec<Value>) -> Vec<Prediction> {
        documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| match Task::from_value(document) {
                Ok(task) => self.predict_task(index, &task),
                Err(e) => self.fail(index, e),
            })
            .collect()
    }

    /// Predict a single task, converting any fault into an error prediction.
    pub fn predict_task(&self, task_index: usize, task: &Task) -> Prediction {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_predict_task(task_index, task)))
            .unwrap_or_else(|payload| Err(PrelabelError::Internal(panic_message(payload))));

        match outcome {
            Ok(prediction) => {
                self.observer.task_completed(task_index, &prediction);
                prediction
            }
            Err(e) => self.fail(task_index, e),
        }
    }

    /// Predict a single task, surfacing faults to the caller.
    pub fn try_predict_task(&self, task_index: usize, task: &Task) -> Result<Prediction> {
        let reference = task.image_reference(&self.schema.image_key);
        self.observer.task_started(task_index, reference);

        let reference = reference.ok_or_else(|| {
            PrelabelError::InvalidTask(format!("task has no '{}' image reference", self.schema.image_key))
        })?;

        let path = self.resolver.resolve(reference)?;
        let image = load_rgb(&path)?;
        let dimensions = ImageDimensions {
            width: image.width(),
            height: image.height(),
        };
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(PrelabelError::ImageResolution {
                reference: reference.to_string(),
                reason: "image has no pixels".to_string(),
            });
        }

        let defaults = extract_defaults(task);
        self.observer.defaults_extracted(task_index, &defaults);

        let candidates = self.oracle.generate(&image)?;
        let generated = candidates.len();
        self.observer.candidates_generated(task_index, generated);

        let accepted = filter_candidates(&self.filters, candidates, |index, filter, rejection| {
            self.observer.candidate_rejected(task_index, index, filter, rejection)
        });
        self.observer.candidates_accepted(task_index, generated, accepted.len());

        let mut ids = RegionIdGenerator::new();
        let records = RegionAssembler::new(&self.schema).assemble(&accepted, &defaults, dimensions, &mut ids);

        Ok(Prediction::aggregate(records, defaults, &self.model_version))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let filters: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        format!(
            "Pipeline: model_version={}, filters=[{}], region '{}' -> {}",
            self.model_version,
            filters.join(", "),
            self.schema.region_label,
            self.schema.from_name
        )
    }

    fn fail(&self, task_index: usize, error: PrelabelError) -> Prediction {
        self.observer.task_failed(task_index, &error);
        Prediction::failed(error.to_string())
    }
}

fn load_rgb(path: &Path) -> Result<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task processing panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task processing panicked: {message}")
    } else {
        "task processing panicked".to_string()
    }
}
