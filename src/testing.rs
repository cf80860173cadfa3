//! Testing utilities for scopes and recovery chains
//!
//! This module provides stub resources for exercising release ordering and
//! failure folding, a shared [`ReleaseLog`] for asserting the order releases
//! ran in, and the [`assert_fault!`](crate::assert_fault) macro for checking
//! that a chain resolved to a fault of a given type.
//!
//! # Examples
//!
//! ```
//! use ebbtide::run_scoped;
//! use ebbtide::testing::{ReleaseLog, StubResource};
//!
//! let log = ReleaseLog::new();
//!
//! run_scoped(|scope| {
//!     scope.register(StubResource::new("connection", &log));
//!     scope.register(StubResource::new("statement", &log));
//!     Ok(())
//! })
//! .finally(|| Ok(()))
//! .unwrap();
//!
//! assert_eq!(log.entries(), vec!["connection", "statement"]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::fault::Fault;
use crate::scope::Release;

/// A shared, ordered log of release events.
///
/// Clones share the same underlying log, so a single `ReleaseLog` can be
/// handed to every stub in a test and inspected at the end.
#[derive(Clone, Debug, Default)]
pub struct ReleaseLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ReleaseLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, name: &str) {
        self.entries.lock().unwrap().push(name.to_string());
    }

    /// Snapshot of the entries in the order they were recorded.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// A releasable stub that records when and how often it was released.
///
/// Built with [`StubResource::new`] for a stub whose release succeeds, or
/// [`StubResource::failing`] to inject a release fault.
pub struct StubResource {
    name: String,
    log: ReleaseLog,
    releases: AtomicUsize,
    fail_with: Option<Box<dyn Fn() -> Fault + Send + Sync>>,
}

impl fmt::Debug for StubResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubResource")
            .field("name", &self.name)
            .field("releases", &self.release_count())
            .field("fail_with", &self.fail_with.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl StubResource {
    /// A stub whose release succeeds.
    pub fn new(name: impl Into<String>, log: &ReleaseLog) -> Self {
        StubResource {
            name: name.into(),
            log: log.clone(),
            releases: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    /// A stub whose release fails with the fault produced by `fail_with`.
    ///
    /// The release is still recorded in the log before the fault is returned.
    pub fn failing<F>(name: impl Into<String>, log: &ReleaseLog, fail_with: F) -> Self
    where
        F: Fn() -> Fault + Send + Sync + 'static,
    {
        StubResource {
            name: name.into(),
            log: log.clone(),
            releases: AtomicUsize::new(0),
            fail_with: Some(Box::new(fail_with)),
        }
    }

    /// Whether this stub has been released at least once.
    pub fn released(&self) -> bool {
        self.release_count() > 0
    }

    /// How many times `release` has run.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Release for StubResource {
    fn release(&self) -> Result<(), Fault> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.log.record(&self.name);

        match &self.fail_with {
            Some(fail_with) => Err(fail_with()),
            None => Ok(()),
        }
    }
}

/// Assert that a chain resolved to a fault wrapping an error of the given
/// type, and evaluate to that fault for further inspection.
///
/// # Example
///
/// ```
/// use ebbtide::{assert_fault, run_scoped, Fault};
/// use std::io;
///
/// let result = run_scoped(|_scope| Err(Fault::new(io::Error::other("boom"))))
///     .finally(|| Ok(()));
///
/// let fault = assert_fault!(result, io::Error);
/// assert!(fault.suppressed().is_empty());
/// ```
#[macro_export]
macro_rules! assert_fault {
    ($result:expr, $ty:ty) => {
        match $result {
            Err(fault) => {
                assert!(
                    fault.is::<$ty>(),
                    "expected a {} fault, got: {}",
                    stringify!($ty),
                    fault
                );
                fault
            }
            Ok(value) => panic!("expected a fault, got Ok({:?})", value),
        }
    };
}
