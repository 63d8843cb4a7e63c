//! Property-based tests for the retry policy
//!
//! Covers the backoff bound, full-jitter range and the attempt count of the
//! retry loop for arbitrary policies.

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use apikit_http::{ApiError, QueryParams, RetryMiddleware, RetryPolicy};
use proptest::prelude::*;

/// Strategy for generating valid retry policies
fn policy_strategy() -> impl Strategy<Value = RetryPolicy> {
    (0u32..6, 0u64..2_000, 0u64..20_000, 1.0f64..4.0).prop_map(
        |(max_retries, initial, extra, multiplier)| {
            RetryPolicy::default()
                .with_max_retries(max_retries)
                .with_delays(
                    Duration::from_millis(initial),
                    Duration::from_millis(initial + extra),
                )
                .with_multiplier(multiplier)
        },
    )
}

proptest! {
    /// The cap never exceeds max_delay and follows initial * multiplier^i below it
    #[test]
    fn prop_capped_delay_is_bounded(policy in policy_strategy(), attempt in 0u32..40) {
        let cap = policy.capped_delay(attempt);
        prop_assert!(cap <= policy.max_delay);

        let exact = policy.initial_delay.as_millis() as f64
            * policy.backoff_multiplier.powi(attempt as i32);
        let expected = exact.min(policy.max_delay.as_millis() as f64) as u64;
        prop_assert_eq!(cap.as_millis() as u64, expected);
    }

    /// The jittered delay is drawn from [0, cap]
    #[test]
    fn prop_jittered_delay_within_cap(policy in policy_strategy(), attempt in 0u32..40) {
        let cap = policy.capped_delay(attempt);
        for _ in 0..20 {
            prop_assert!(policy.jittered_delay(attempt) <= cap);
        }
    }

    /// Caps never shrink from one attempt to the next
    #[test]
    fn prop_capped_delay_is_monotonic(policy in policy_strategy(), attempt in 0u32..30) {
        prop_assert!(policy.capped_delay(attempt) <= policy.capped_delay(attempt + 1));
    }

    /// A permanently failing retryable operation runs exactly max_retries + 1 times
    #[test]
    fn prop_retry_exhaustion_attempt_count(max_retries in 0u32..6) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let middleware = RetryMiddleware::new(RetryPolicy::default().with_max_retries(max_retries));
        let calls = Arc::new(AtomicU32::new(0));

        let result = runtime.block_on(middleware.execute(|_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiError::http(502, None))
            }
        }));

        prop_assert!(result.is_err());
        prop_assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
    }

    /// Query serialization keeps insertion order and round-trips through decoding
    #[test]
    fn prop_query_string_preserves_order(
        entries in proptest::collection::vec(("[a-z]{1,6}", "[ -~]{0,12}"), 1..6)
    ) {
        let mut params = QueryParams::new();
        let mut expected: Vec<(String, String)> = Vec::new();
        for (key, value) in &entries {
            params.insert(key.clone(), value.clone());
            match expected.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.clone(),
                None => expected.push((key.clone(), value.clone())),
            }
        }

        let query = params.to_query_string();
        let decoded: Vec<(String, String)> = query
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (
                    urlencoding::decode(k).unwrap().into_owned(),
                    urlencoding::decode(v).unwrap().into_owned(),
                )
            })
            .collect();

        prop_assert_eq!(decoded, expected);
    }
}
