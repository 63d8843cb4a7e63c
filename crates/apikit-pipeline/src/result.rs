//! Aggregate outcome of a pipeline execution

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::StepError;

/// A record that failed, with the step that failed it
#[derive(Debug)]
pub struct FailedRecord<I> {
    /// The input record exactly as it was passed to `execute`
    pub original: I,
    pub error: StepError,
    /// Name of the failing step
    pub step: String,
}

/// Successful outputs and failed inputs of one execution
///
/// `success_count + failure_count == total_count` always holds, and both
/// lists keep the relative order of the input records.
#[derive(Debug)]
pub struct PipelineResult<I, O> {
    pub successful: Vec<O>,
    pub failed: Vec<FailedRecord<I>>,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_count: usize,
}

impl<I, O> PipelineResult<I, O> {
    pub(crate) fn from_parts(successful: Vec<O>, failed: Vec<FailedRecord<I>>) -> Self {
        Self {
            success_count: successful.len(),
            failure_count: failed.len(),
            total_count: successful.len() + failed.len(),
            successful,
            failed,
        }
    }

    /// `true` when no record failed
    pub fn is_complete_success(&self) -> bool {
        self.failure_count == 0
    }

    /// Fraction of records that succeeded, `1.0` for an empty batch
    pub fn success_rate(&self) -> f64 {
        if self.total_count == 0 {
            1.0
        } else {
            self.success_count as f64 / self.total_count as f64
        }
    }

    /// Counts suitable for logging or reporting
    pub fn summary(&self) -> PipelineSummary {
        let mut failures_by_step = BTreeMap::new();
        for record in &self.failed {
            *failures_by_step.entry(record.step.clone()).or_insert(0) += 1;
        }

        PipelineSummary {
            total: self.total_count,
            succeeded: self.success_count,
            failed: self.failure_count,
            failures_by_step,
        }
    }
}

/// Serializable counts of a [`PipelineResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures_by_step: BTreeMap<String, usize>,
}
