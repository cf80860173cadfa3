//! Property tests for release ordering and failure folding.

use std::fmt;

use ebbtide::testing::{ReleaseLog, StubResource};
use ebbtide::{run_scoped, Fault};
use proptest::prelude::*;

#[derive(Debug)]
struct ReleaseFailed(usize);

impl fmt::Display for ReleaseFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "release {} failed", self.0)
    }
}

impl std::error::Error for ReleaseFailed {}

proptest! {
    // Every registered resource is released exactly once, in registration
    // order, however many there are.
    #[test]
    fn releases_run_once_each_in_registration_order(n in 0usize..24) {
        let log = ReleaseLog::new();
        let mut handles = Vec::new();

        let chain = run_scoped(|scope| {
            for i in 0..n {
                handles.push(scope.register(StubResource::new(format!("r{:02}", i), &log)));
            }
            Ok(())
        });

        prop_assert!(chain.primary().is_none());

        let expected: Vec<String> = (0..n).map(|i| format!("r{:02}", i)).collect();
        prop_assert_eq!(log.entries(), expected);

        for handle in &handles {
            prop_assert_eq!(handle.release_count(), 1);
        }
    }

    // With a clean body, the first release failure becomes the outcome and
    // every later one is suppressed on it, in release order.
    #[test]
    fn release_failures_fold_first_wins_rest_suppressed(
        failures in proptest::collection::vec(any::<bool>(), 0..24)
    ) {
        let log = ReleaseLog::new();

        let chain = run_scoped(|scope| {
            for (i, fails) in failures.iter().enumerate() {
                if *fails {
                    scope.register(StubResource::failing(format!("r{}", i), &log, move || {
                        Fault::new(ReleaseFailed(i))
                    }));
                } else {
                    scope.register(StubResource::new(format!("r{}", i), &log));
                }
            }
            Ok(())
        });

        let failing: Vec<usize> = failures
            .iter()
            .enumerate()
            .filter(|(_, fails)| **fails)
            .map(|(i, _)| i)
            .collect();

        match failing.split_first() {
            None => prop_assert!(chain.primary().is_none()),
            Some((first, rest)) => {
                let fault = chain.primary().expect("first release failure becomes the outcome");
                prop_assert_eq!(
                    fault.downcast_ref::<ReleaseFailed>().map(|e| e.0),
                    Some(*first)
                );

                let trail: Vec<usize> = fault
                    .suppressed()
                    .iter()
                    .filter_map(|f| f.downcast_ref::<ReleaseFailed>())
                    .map(|e| e.0)
                    .collect();
                prop_assert_eq!(trail, rest.to_vec());
            }
        }

        // every release was attempted regardless of earlier failures
        prop_assert_eq!(log.entries().len(), failures.len());
    }

    // A body fault stays primary; release failures only ever attach to it.
    #[test]
    fn body_fault_keeps_primacy_over_release_failures(
        failures in proptest::collection::vec(any::<bool>(), 0..24)
    ) {
        let log = ReleaseLog::new();

        let chain = run_scoped(|scope| {
            for (i, fails) in failures.iter().enumerate() {
                if *fails {
                    scope.register(StubResource::failing(format!("r{}", i), &log, move || {
                        Fault::new(ReleaseFailed(i))
                    }));
                } else {
                    scope.register(StubResource::new(format!("r{}", i), &log));
                }
            }
            Err(Fault::msg("body failed"))
        });

        let fault = chain.primary().expect("body fault must survive");
        let fault_text = fault.to_string();
        prop_assert_eq!(fault_text.lines().next(), Some("body failed"));

        let failing_count = failures.iter().filter(|f| **f).count();
        prop_assert_eq!(fault.suppressed().len(), failing_count);
    }
}
