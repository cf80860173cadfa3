//! Typed recovery chain over a captured outcome
//!
//! A [`Recovery`] holds at most two outstanding faults:
//!
//! - **primary** — the body's (or a release's) failure, not yet handled by
//!   any `catch` step;
//! - **secondary** — a failure raised *by* a catch handler while it was
//!   handling the primary.
//!
//! The chain is driven by value: each step consumes the chain and returns the
//! next state, ending in a mandatory [`finally`](Recovery::finally) that
//! merges whatever is still outstanding with the finalizer's own result and
//! returns at most one fault, suppressed history attached.
//!
//! # Examples
//!
//! ```
//! use ebbtide::{run_scoped, Fault};
//! use std::fmt;
//!
//! #[derive(Debug)]
//! struct QueryTimeout;
//!
//! impl fmt::Display for QueryTimeout {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "query timed out")
//!     }
//! }
//!
//! impl std::error::Error for QueryTimeout {}
//!
//! let result = run_scoped(|_scope| Err(Fault::new(QueryTimeout)))
//!     .catch(|_: &QueryTimeout| Ok(()))
//!     .finally(|| Ok(()));
//!
//! assert!(result.is_ok());
//! ```

use std::error::Error as StdError;

use crate::fault::Fault;

/// An ordered chain of typed recovery steps over a captured outcome.
///
/// Created by [`run_scoped`](crate::run_scoped) (or directly from an outcome
/// with [`Recovery::new`]), threaded by ownership through zero or more
/// [`catch`](Recovery::catch) steps, and terminated by
/// [`finally`](Recovery::finally).
///
/// Only the first catch step whose type matches the primary fault runs;
/// a match consumes the primary even when the handler itself fails, so the
/// fault is never re-offered to later steps.
#[must_use = "a recovery chain does nothing until `finally` runs"]
#[derive(Debug)]
pub struct Recovery {
    primary: Option<Fault>,
    secondary: Option<Fault>,
}

impl Recovery {
    /// Seed a chain from a captured outcome.
    ///
    /// `primary` mirrors the outcome; `secondary` starts empty.
    pub fn new(outcome: Option<Fault>) -> Self {
        Recovery {
            primary: outcome,
            secondary: None,
        }
    }

    /// The outstanding unhandled fault, if any.
    pub fn primary(&self) -> Option<&Fault> {
        self.primary.as_ref()
    }

    /// The fault raised by a catch handler, if any.
    pub fn secondary(&self) -> Option<&Fault> {
        self.secondary.as_ref()
    }

    /// Handle the primary fault if its wrapped error is an `E`.
    ///
    /// On a match the handler runs with a typed view of the error and the
    /// primary is consumed — unconditionally, even when the handler fails.
    /// A failing handler parks its fault in the secondary slot for `finally`
    /// to merge. Without a match (or with nothing outstanding) this is a
    /// no-op and the chain passes through unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebbtide::{Fault, Recovery};
    /// use std::io;
    ///
    /// let chain = Recovery::new(Some(Fault::new(io::Error::other("boom"))))
    ///     .catch(|_: &std::fmt::Error| Ok(())) // wrong type: no-op
    ///     .catch(|err: &io::Error| {
    ///         assert_eq!(err.to_string(), "boom");
    ///         Ok(())
    ///     });
    ///
    /// assert!(chain.primary().is_none());
    /// chain.finally(|| Ok(())).unwrap();
    /// ```
    pub fn catch<E, H>(mut self, handler: H) -> Self
    where
        E: StdError + Send + Sync + 'static,
        H: FnOnce(&E) -> Result<(), Fault>,
    {
        let Some(fault) = self.primary.take() else {
            return self;
        };

        if let Some(error) = fault.downcast_ref::<E>() {
            if let Err(raised) = handler(error) {
                self.secondary = Some(raised);
            }
            // the matched fault is consumed here, handler failure or not
        } else {
            self.primary = Some(fault);
        }

        self
    }

    /// Run the mandatory finalizer and resolve the chain.
    ///
    /// The block always runs exactly once. Afterwards at most one fault comes
    /// back, chosen by this table (an unhandled primary beats a handler's
    /// secondary, and a failing block is never dropped — it is suppressed
    /// onto whichever fault wins):
    ///
    /// | block     | primary | secondary | result                                  |
    /// |-----------|---------|-----------|-----------------------------------------|
    /// | `Ok`      | none    | none      | `Ok(())`                                |
    /// | `Ok`      | none    | set       | `Err(secondary)`                        |
    /// | `Ok`      | set     | none      | `Err(primary)`                          |
    /// | `Ok`      | set     | set       | `Err(primary)`, secondary suppressed    |
    /// | `Err(f)`  | none    | none      | `Err(f)`                                |
    /// | `Err(f)`  | none    | set       | `Err(secondary)`, f suppressed          |
    /// | `Err(f)`  | set     | none      | `Err(primary)`, f suppressed            |
    ///
    /// (`Err` with both slots set cannot occur: a matched catch always clears
    /// the primary before it can set the secondary.)
    ///
    /// # Examples
    ///
    /// ```
    /// use ebbtide::{Fault, Recovery};
    ///
    /// let result = Recovery::new(Some(Fault::msg("body failed")))
    ///     .finally(|| Err(Fault::msg("finalizer failed")));
    ///
    /// let fault = result.unwrap_err();
    /// assert_eq!(fault.to_string().lines().next(), Some("body failed"));
    /// assert_eq!(fault.suppressed()[0].to_string(), "finalizer failed");
    /// ```
    pub fn finally<F>(self, block: F) -> Result<(), Fault>
    where
        F: FnOnce() -> Result<(), Fault>,
    {
        let Recovery { primary, secondary } = self;

        match block() {
            Ok(()) => match (primary, secondary) {
                (None, None) => Ok(()),
                (None, Some(raised)) => Err(raised),
                (Some(unhandled), None) => Err(unhandled),
                (Some(mut unhandled), Some(raised)) => {
                    unhandled.suppress(raised);
                    Err(unhandled)
                }
            },
            Err(from_block) => match (primary, secondary) {
                (None, None) => Err(from_block),
                (None, Some(mut raised)) => {
                    raised.suppress(from_block);
                    Err(raised)
                }
                (Some(mut unhandled), secondary) => {
                    // a matched catch clears the primary, so the secondary
                    // must still be empty on this path
                    debug_assert!(secondary.is_none());
                    unhandled.suppress(from_block);
                    Err(unhandled)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct QueryError;

    impl fmt::Display for QueryError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "query error")
        }
    }

    impl StdError for QueryError {}

    #[derive(Debug)]
    struct AuditError;

    impl fmt::Display for AuditError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "audit error")
        }
    }

    impl StdError for AuditError {}

    fn failed() -> Recovery {
        Recovery::new(Some(Fault::new(QueryError)))
    }

    #[test]
    fn catch_on_empty_primary_is_a_noop() {
        let handled = AtomicUsize::new(0);

        let chain = Recovery::new(None).catch(|_: &QueryError| {
            handled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(handled.load(Ordering::SeqCst), 0);
        assert!(chain.finally(|| Ok(())).is_ok());
    }

    #[test]
    fn catch_of_wrong_type_passes_the_fault_through() {
        let chain = failed().catch(|_: &AuditError| Ok(()));

        assert!(chain.primary().is_some());
        let fault = chain.finally(|| Ok(())).unwrap_err();
        assert!(fault.is::<QueryError>());
    }

    #[test]
    fn matching_catch_consumes_the_primary() {
        let chain = failed().catch(|_: &QueryError| Ok(()));

        assert!(chain.primary().is_none());
        assert!(chain.finally(|| Ok(())).is_ok());
    }

    #[test]
    fn only_the_first_matching_catch_runs() {
        let runs = AtomicUsize::new(0);

        let result = failed()
            .catch(|_: &AuditError| {
                runs.fetch_add(100, Ordering::SeqCst);
                Ok(())
            })
            .catch(|_: &QueryError| {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .catch(|_: &QueryError| {
                runs.fetch_add(100, Ordering::SeqCst);
                Ok(())
            })
            .finally(|| Ok(()));

        assert!(result.is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_handler_consumes_the_primary_and_sets_secondary() {
        let chain = failed().catch(|_: &QueryError| Err(Fault::new(AuditError)));

        assert!(chain.primary().is_none());
        assert!(chain.secondary().is_some());

        let fault = chain.finally(|| Ok(())).unwrap_err();
        assert!(fault.is::<AuditError>());
        assert!(fault.suppressed().is_empty());
    }

    #[test]
    fn later_catch_cannot_rescue_a_failed_handler() {
        let fault = failed()
            .catch(|_: &QueryError| Err(Fault::new(AuditError)))
            .catch(|_: &AuditError| Ok(()))
            .finally(|| Ok(()))
            .unwrap_err();

        // the secondary slot is not re-offered to catch steps
        assert!(fault.is::<AuditError>());
    }

    #[test]
    fn finally_all_clear_returns_ok() {
        assert!(Recovery::new(None).finally(|| Ok(())).is_ok());
    }

    #[test]
    fn finally_raises_an_unhandled_primary() {
        let fault = failed().finally(|| Ok(())).unwrap_err();
        assert!(fault.is::<QueryError>());
    }

    #[test]
    fn failing_finalizer_alone_raises_its_own_fault() {
        let fault = Recovery::new(None)
            .finally(|| Err(Fault::msg("finalizer failed")))
            .unwrap_err();

        assert_eq!(fault.to_string(), "finalizer failed");
    }

    #[test]
    fn failing_finalizer_is_suppressed_on_the_primary() {
        let fault = failed()
            .finally(|| Err(Fault::new(AuditError)))
            .unwrap_err();

        assert!(fault.is::<QueryError>());
        assert_eq!(fault.suppressed().len(), 1);
        assert!(fault.suppressed()[0].is::<AuditError>());
    }

    #[test]
    fn failing_finalizer_is_suppressed_on_the_secondary() {
        let fault = failed()
            .catch(|_: &QueryError| Err(Fault::new(AuditError)))
            .finally(|| Err(Fault::msg("finalizer failed")))
            .unwrap_err();

        assert!(fault.is::<AuditError>());
        assert_eq!(fault.suppressed().len(), 1);
        assert_eq!(fault.suppressed()[0].to_string(), "finalizer failed");
    }

    #[test]
    fn finalizer_runs_exactly_once_on_every_path() {
        for seed in [None, Some(Fault::new(QueryError))] {
            let runs = AtomicUsize::new(0);

            let _ = Recovery::new(seed)
                .catch(|_: &QueryError| Err(Fault::new(AuditError)))
                .finally(|| {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });

            assert_eq!(runs.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn handler_sees_the_typed_error() {
        let seen = AtomicUsize::new(0);

        let result = failed()
            .catch(|err: &QueryError| {
                assert_eq!(err.to_string(), "query error");
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .finally(|| Ok(()));

        assert!(result.is_ok());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
