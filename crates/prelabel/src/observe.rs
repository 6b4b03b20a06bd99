use tracing::{debug, info, warn};

use crate::{
    error::PrelabelError,
    prediction::Prediction,
    traits::{PipelineObserver, Rejection},
    types::Defaults,
};

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Forwards pipeline events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn task_started(&self, task_index: usize, image_reference: Option<&str>) {
        debug!(task_index, image_reference = image_reference.unwrap_or("<none>"), "Processing task");
    }

    fn defaults_extracted(&self, task_index: usize, defaults: &Defaults) {
        info!(
            task_index,
            colors = ?defaults.colors,
            size = ?defaults.size,
            pattern = ?defaults.pattern,
            "Using metadata defaults"
        );
    }

    fn candidates_generated(&self, task_index: usize, count: usize) {
        info!(task_index, count, "Generated mask candidates");
    }

    fn candidate_rejected(&self, task_index: usize, candidate_index: usize, filter: &'static str, rejection: &Rejection) {
        debug!(task_index, candidate_index, filter, %rejection, "Rejected candidate");
    }

    fn candidates_accepted(&self, task_index: usize, generated: usize, accepted: usize) {
        info!(task_index, generated, accepted, "Filtered mask candidates");
    }

    fn task_completed(&self, task_index: usize, prediction: &Prediction) {
        info!(
            task_index,
            regions = prediction.regions().count(),
            records = prediction.result.len(),
            score = prediction.score,
            "Task predicted"
        );
    }

    fn task_failed(&self, task_index: usize, error: &PrelabelError) {
        warn!(task_index, %error, "Task failed");
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Keeps a textual log of events for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingObserver {
        pub events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl PipelineObserver for RecordingObserver {
        fn candidate_rejected(&self, task_index: usize, candidate_index: usize, filter: &'static str, _: &Rejection) {
            self.push(format!("rejected {task_index}/{candidate_index} by {filter}"));
        }

        fn candidates_accepted(&self, task_index: usize, generated: usize, accepted: usize) {
            self.push(format!("accepted {task_index}: {accepted}/{generated}"));
        }

        fn task_completed(&self, task_index: usize, _: &Prediction) {
            self.push(format!("completed {task_index}"));
        }

        fn task_failed(&self, task_index: usize, _: &PrelabelError) {
            self.push(format!("failed {task_index}"));
        }
    }
}
