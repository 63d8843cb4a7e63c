//! Typed record transformation pipelines
//!
//! A [`Pipeline`] chains synchronous or async steps over a batch of records.
//! Each record flows through every step in order; a step failure removes
//! that record from the output and records it in [`PipelineResult::failed`]
//! together with the original input and the name of the failing step.
//! Failures never abort the batch.

pub mod error;
pub mod pipeline;
pub mod result;

pub use error::{BoxError, StepError};
pub use pipeline::Pipeline;
pub use result::{FailedRecord, PipelineResult, PipelineSummary};
