use std::sync::Arc;

use crate::{
    algorithms::{FilterConfig, default_filters},
    error::{PrelabelError, Result},
    label_config::LabelSchema,
    observe::TracingObserver,
    pipeline::{DEFAULT_MODEL_VERSION, Pipeline},
    resolve::{ImageRootsConfig, LocalFilesResolver},
    traits::{CandidateFilter, ImageResolver, MaskOracle, PipelineObserver},
};

/// Builder for creating prediction pipelines with a fluent API
pub struct PipelineBuilder {
    schema: LabelSchema,
    oracle: Option<Box<dyn MaskOracle>>,
    resolver: Option<Box<dyn ImageResolver>>,
    filters: Vec<Box<dyn CandidateFilter>>,
    observer: Option<Arc<dyn PipelineObserver>>,
    model_version: String,
}

impl PipelineBuilder {
    pub fn new(schema: LabelSchema) -> Self {
        Self {
            schema,
            oracle: None,
            resolver: None,
            filters: Vec::new(),
            observer: None,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
        }
    }

    /// Set the mask oracle (required)
    pub fn oracle<O>(mut self, oracle: O) -> Self
    where
        O: MaskOracle + 'static,
    {
        self.oracle = Some(Box::new(oracle));
        self
    }

    /// Set the image resolver (defaults to [`LocalFilesResolver`] rooted at `.`)
    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: ImageResolver + 'static,
    {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Append a filter; filters run in the order they were added
    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: CandidateFilter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append the confidence and aspect-ratio filters configured by `config`
    pub fn with_filter_config(mut self, config: &FilterConfig) -> Result<Self> {
        config.validate()?;
        self.filters.extend(default_filters(config));
        Ok(self)
    }

    /// Set the observer receiving pipeline events (defaults to [`TracingObserver`])
    pub fn observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn model_version(mut self, model_version: impl Into<String>) -> Self {
        self.model_version = model_version.into();
        self
    }

    /// Build the pipeline, filling unset components with defaults.
    ///
    /// Without any filter the default confidence-then-shape chain is used.
    pub fn build(self) -> Result<Pipeline> {
        let oracle = self
            .oracle
            .ok_or_else(|| PrelabelError::Configuration("no mask oracle configured".to_string()))?;

        let resolver = self
            .resolver
            .unwrap_or_else(|| Box::new(LocalFilesResolver::new(&ImageRootsConfig::default())));

        let filters = if self.filters.is_empty() {
            default_filters(&FilterConfig::default())
        } else {
            self.filters
        };

        let observer = self.observer.unwrap_or_else(|| Arc::new(TracingObserver));

        Ok(Pipeline::new(
            oracle,
            resolver,
            filters,
            observer,
            self.schema,
            self.model_version,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::ConfidenceFilter,
        types::MaskCandidate,
    };
    use image::RgbImage;

    struct EmptyOracle;

    impl MaskOracle for EmptyOracle {
        fn generate(&self, _image: &RgbImage) -> Result<Vec<MaskCandidate>> {
            Ok(Vec::new())
        }
    }

    fn schema() -> LabelSchema {
        LabelSchema::new("feathers", "image", "image", "Plume")
    }

    #[test]
    fn test_oracle_is_required() {
        let err = PipelineBuilder::new(schema()).build().err().expect("build must fail");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_default_filter_chain() {
        let pipeline = PipelineBuilder::new(schema()).oracle(EmptyOracle).build().unwrap();
        assert!(pipeline.info().contains("filters=[confidence, aspect_ratio]"));
        assert!(pipeline.info().contains(DEFAULT_MODEL_VERSION));
    }

    #[test]
    fn test_custom_filters_and_version() {
        let pipeline = PipelineBuilder::new(schema())
            .oracle(EmptyOracle)
            .add_filter(ConfidenceFilter { min_predicted_iou: 0.5 })
            .model_version("feathers-v2")
            .build()
            .unwrap();
        assert!(pipeline.info().contains("filters=[confidence]"));
        assert!(pipeline.info().contains("feathers-v2"));
    }

    #[test]
    fn test_invalid_filter_config_is_fatal() {
        let config = FilterConfig { min_aspect_ratio: 0.9, max_aspect_ratio: 0.1, ..FilterConfig::default() };
        let err = PipelineBuilder::new(schema()).with_filter_config(&config).err().unwrap();
        assert!(err.is_fatal());
    }
}
