//! Persistent, typed chain of transformation steps

use std::{fmt, future::Future, panic::AssertUnwindSafe, sync::Arc};

use futures::{
    future::{BoxFuture, FutureExt},
    stream::{self, StreamExt},
};
use tracing::{debug, info, warn};

use crate::{
    error::{BoxError, StepError},
    result::{FailedRecord, PipelineResult},
};

/// Failure of one record, tagged with the step that raised it
struct StepFailure {
    step: Arc<str>,
    error: StepError,
}

type Runner<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, StepFailure>> + Send + Sync>;

/// Ordered sequence of named steps turning `I` records into `O` records
///
/// Pipelines are immutable values. Every `transform*` call returns a new
/// pipeline sharing the existing steps, so a partially built pipeline can be
/// extended in several directions without the branches affecting each other.
///
/// ```rust,ignore
/// let parse = Pipeline::<String>::new()
///     .transform_named("parse", |line: String| line.trim().parse::<i64>());
/// let doubled = parse.transform_named("double", |n: i64| Ok::<_, String>(n * 2));
///
/// let result = doubled.execute(vec!["1".into(), "x".into(), "3".into()]).await;
/// assert_eq!(result.successful, vec![2, 6]);
/// assert_eq!(result.failed[0].step, "parse");
/// ```
pub struct Pipeline<I, O = I> {
    runner: Runner<I, O>,
    step_names: Arc<Vec<String>>,
}

impl<I> Pipeline<I, I>
where
    I: Send + 'static,
{
    /// Pipeline with no steps; every record passes through unchanged
    pub fn new() -> Self {
        Self {
            runner: Arc::new(|record| -> BoxFuture<'static, Result<I, StepFailure>> {
                Box::pin(async move { Ok(record) })
            }),
            step_names: Arc::new(Vec::new()),
        }
    }
}

impl<I> Default for Pipeline<I, I>
where
    I: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> Clone for Pipeline<I, O> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            step_names: Arc::clone(&self.step_names),
        }
    }
}

impl<I, O> fmt::Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names)
            .finish()
    }
}

impl<I, O> Pipeline<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Number of steps
    pub fn len(&self) -> usize {
        self.step_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step_names.is_empty()
    }

    /// Step names in execution order
    pub fn step_names(&self) -> &[String] {
        &self.step_names
    }

    /// Append a synchronous step labelled by its position (`step_<n>`)
    pub fn transform<N, E, F>(&self, f: F) -> Pipeline<I, N>
    where
        N: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        F: Fn(O) -> Result<N, E> + Send + Sync + 'static,
    {
        let name = self.positional_name();
        self.transform_named(name, f)
    }

    /// Append a named synchronous step
    pub fn transform_named<N, E, F>(&self, name: impl Into<String>, f: F) -> Pipeline<I, N>
    where
        N: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        F: Fn(O) -> Result<N, E> + Send + Sync + 'static,
    {
        self.transform_async_named(name, move |value| std::future::ready(f(value)))
    }

    /// Append an async step labelled by its position (`step_<n>`)
    pub fn transform_async<N, E, F, Fut>(&self, f: F) -> Pipeline<I, N>
    where
        N: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        F: Fn(O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<N, E>> + Send + 'static,
    {
        let name = self.positional_name();
        self.transform_async_named(name, f)
    }

    /// Append a named async step
    pub fn transform_async_named<N, E, F, Fut>(
        &self,
        name: impl Into<String>,
        f: F,
    ) -> Pipeline<I, N>
    where
        N: Send + 'static,
        E: Into<BoxError> + Send + 'static,
        F: Fn(O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<N, E>> + Send + 'static,
    {
        let name = name.into();
        let step: Arc<str> = Arc::from(name.as_str());
        let previous = Arc::clone(&self.runner);
        let f = Arc::new(f);

        let runner: Runner<I, N> = Arc::new(
            move |record| -> BoxFuture<'static, Result<N, StepFailure>> {
                let previous = Arc::clone(&previous);
                let f = Arc::clone(&f);
                let step = Arc::clone(&step);
                Box::pin(async move {
                    let value = match previous(record).await {
                        Ok(value) => value,
                        Err(failure) => return Err(failure),
                    };
                    let outcome = AssertUnwindSafe(async move { f(value).await })
                        .catch_unwind()
                        .await;
                    let error = match outcome {
                        Ok(Ok(next)) => return Ok(next),
                        Ok(Err(e)) => StepError::new(e),
                        Err(panic) => StepError::from_panic(panic),
                    };
                    Err(StepFailure { step, error })
                })
            },
        );

        let mut step_names = Vec::clone(&self.step_names);
        step_names.push(name);

        Pipeline {
            runner,
            step_names: Arc::new(step_names),
        }
    }

    /// Run every record through all steps, one record at a time
    ///
    /// A failing step stops processing of that record only; the record is
    /// reported with its original input and the failing step's name.
    pub async fn execute(&self, records: impl IntoIterator<Item = I>) -> PipelineResult<I, O> {
        let mut outcomes = Vec::new();
        for record in records {
            let original = record.clone();
            outcomes.push((original, (self.runner)(record).await));
        }
        self.collect(outcomes)
    }

    /// Run records concurrently with at most `limit` in flight
    ///
    /// Steps still run in order for each record, and both output lists keep
    /// input order. A `limit` of zero is treated as one.
    pub async fn execute_concurrent(
        &self,
        records: impl IntoIterator<Item = I>,
        limit: usize,
    ) -> PipelineResult<I, O> {
        let outcomes = stream::iter(records)
            .map(|record| {
                let original = record.clone();
                let run = (self.runner)(record);
                async move { (original, run.await) }
            })
            .buffered(limit.max(1))
            .collect::<Vec<_>>()
            .await;

        self.collect(outcomes)
    }

    fn collect(&self, outcomes: Vec<(I, Result<O, StepFailure>)>) -> PipelineResult<I, O> {
        let mut successful = Vec::new();
        let mut failed = Vec::new();

        for (index, (original, outcome)) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => successful.push(value),
                Err(StepFailure { step, error }) => {
                    warn!(record = index, step = %step, error = %error, "Record failed");
                    failed.push(FailedRecord {
                        original,
                        error,
                        step: step.to_string(),
                    });
                }
            }
        }

        let result = PipelineResult::from_parts(successful, failed);
        info!(
            steps = self.len(),
            total = result.total_count,
            succeeded = result.success_count,
            failed = result.failure_count,
            "Pipeline executed"
        );
        debug!(steps = ?self.step_names, "Pipeline steps");
        result
    }

    fn positional_name(&self) -> String {
        format!("step_{}", self.len() + 1)
    }
}
