//! Property-based tests for pipeline execution
//!
//! Checks the count invariant, input-order preservation and the
//! original-record guarantee for arbitrary batches.

use apikit_pipeline::Pipeline;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

/// Widens to `i64`, then rejects multiples of three and doubles everything else
fn checked_pipeline() -> Pipeline<i32, i64> {
    Pipeline::<i32>::new()
        .transform_named("widen", |n: i32| Ok::<_, String>(i64::from(n)))
        .transform_named("reject_threes", |n: i64| {
            if n % 3 == 0 {
                Err(format!("{n} is divisible by three"))
            } else {
                Ok(n * 2)
            }
        })
}

proptest! {
    /// Every record ends up in exactly one of the two lists
    #[test]
    fn prop_counts_add_up(records in proptest::collection::vec(-1000i32..1000, 0..50)) {
        let result = runtime().block_on(checked_pipeline().execute(records.clone()));

        prop_assert_eq!(result.total_count, records.len());
        prop_assert_eq!(result.success_count + result.failure_count, result.total_count);
        prop_assert_eq!(result.successful.len(), result.success_count);
        prop_assert_eq!(result.failed.len(), result.failure_count);
    }

    /// Outputs and failures both keep input order, failures keep their input
    #[test]
    fn prop_order_and_originals_preserved(
        records in proptest::collection::vec(-1000i32..1000, 0..50)
    ) {
        let result = runtime().block_on(checked_pipeline().execute(records.clone()));

        let expected_ok: Vec<i64> = records
            .iter()
            .filter(|n| *n % 3 != 0)
            .map(|n| i64::from(*n) * 2)
            .collect();
        let expected_failed: Vec<i32> = records.iter().copied().filter(|n| n % 3 == 0).collect();
        let failed_originals: Vec<i32> = result.failed.iter().map(|f| f.original).collect();

        prop_assert_eq!(result.successful, expected_ok);
        prop_assert_eq!(failed_originals, expected_failed);
        prop_assert!(result.failed.iter().all(|f| f.step == "reject_threes"));
    }

    /// Bounded concurrency yields the same result as sequential execution
    #[test]
    fn prop_concurrent_matches_sequential(
        records in proptest::collection::vec(-1000i32..1000, 0..50),
        limit in 0usize..8,
    ) {
        let rt = runtime();
        let pipeline = checked_pipeline();
        let sequential = rt.block_on(pipeline.execute(records.clone()));
        let concurrent = rt.block_on(pipeline.execute_concurrent(records, limit));

        let seq_failed: Vec<i32> = sequential.failed.iter().map(|f| f.original).collect();
        let con_failed: Vec<i32> = concurrent.failed.iter().map(|f| f.original).collect();

        prop_assert_eq!(sequential.successful, concurrent.successful);
        prop_assert_eq!(seq_failed, con_failed);
    }

    /// Extending a pipeline never changes the pipeline it was built from
    #[test]
    fn prop_transform_leaves_source_untouched(extra_steps in 1usize..5) {
        let base = Pipeline::<u32>::new().transform(|n: u32| Ok::<_, String>(n + 1));
        let mut extended = base.clone();
        for _ in 0..extra_steps {
            extended = extended.transform(|n: u32| Ok::<_, String>(n + 1));
        }

        let rt = runtime();
        prop_assert_eq!(base.len(), 1);
        prop_assert_eq!(extended.len(), 1 + extra_steps);
        prop_assert_eq!(rt.block_on(base.execute(vec![0])).successful, vec![1]);
        prop_assert_eq!(
            rt.block_on(extended.execute(vec![0])).successful,
            vec![1 + extra_steps as u32]
        );
    }
}
