//! Property-based tests for event dispatch

use std::sync::Arc;

use apikit_events::EventEmitter;
use parking_lot::Mutex;
use proptest::prelude::*;

proptest! {
    /// Every listener runs once per emit, in registration order, whatever fails
    #[test]
    fn prop_failures_never_skip_listeners(failing in proptest::collection::vec(any::<bool>(), 0..20)) {
        let emitter = EventEmitter::<&'static str, u32>::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for (index, fails) in failing.iter().copied().enumerate() {
            let calls = calls.clone();
            emitter.on("tick", move |_: &u32| {
                calls.lock().push(index);
                if fails {
                    Err(format!("listener {index} failed"))
                } else {
                    Ok(())
                }
            });
        }

        let report = emitter.emit(&"tick", &1);

        let expected: Vec<usize> = (0..failing.len()).collect();
        prop_assert_eq!(calls.lock().clone(), expected);
        prop_assert_eq!(report.invoked, failing.len());
        prop_assert_eq!(report.failed(), failing.iter().filter(|f| **f).count());
    }

    /// Once listeners fire on the first emit only
    #[test]
    fn prop_once_listeners_fire_once(persistent in 0usize..6, once in 0usize..6, emits in 1usize..5) {
        let emitter = EventEmitter::<u8, ()>::new();
        let count = Arc::new(Mutex::new(0usize));

        for _ in 0..persistent {
            let count = count.clone();
            emitter.on(0, move |_: &()| *count.lock() += 1);
        }
        for _ in 0..once {
            let count = count.clone();
            emitter.once(0, move |_: &()| *count.lock() += 1);
        }

        for _ in 0..emits {
            emitter.emit(&0, &());
        }

        prop_assert_eq!(*count.lock(), persistent * emits + once);
        prop_assert_eq!(emitter.listener_count(&0), persistent);
    }
}
