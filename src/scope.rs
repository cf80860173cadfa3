//! Scoped resource registration with guaranteed release
//!
//! This module provides the [`Scope`] registry and the [`run_scoped`] entry
//! point. A body runs against a scope, registering every resource it acquires;
//! when the body finishes — normally or with a fault — the scope releases
//! every registered resource exactly once and folds release failures into the
//! body's outcome. The merged outcome then seeds a
//! [`Recovery`](crate::Recovery) chain.
//!
//! Resources are released in **registration order** (FIFO), not in reverse.
//! Callers that need reverse-order teardown should register in the order they
//! want releases to happen.
//!
//! # Examples
//!
//! ```
//! use ebbtide::{run_scoped, Fault, Release};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! struct Connection {
//!     open: AtomicBool,
//! }
//!
//! impl Release for Connection {
//!     fn release(&self) -> Result<(), Fault> {
//!         self.open.store(false, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! let mut handle = None;
//! run_scoped(|scope| {
//!     let conn = scope.register(Connection {
//!         open: AtomicBool::new(true),
//!     });
//!     handle = Some(conn);
//!     Ok(())
//! })
//! .finally(|| Ok(()))
//! .unwrap();
//!
//! let conn = handle.unwrap();
//! assert!(!conn.open.load(Ordering::SeqCst));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::fault::Fault;
use crate::recovery::Recovery;

/// The single cleanup capability a registered resource must expose.
///
/// `release` takes `&self` so the body can keep using the resource through
/// the handle returned by [`Scope::register`]; implementors use interior
/// mutability for whatever state teardown needs to touch.
///
/// A scope invokes `release` exactly once per registration, sequentially,
/// after the body has returned.
pub trait Release {
    /// Release the resource. May itself fail.
    fn release(&self) -> Result<(), Fault>;
}

/// An ordered registry of resources awaiting release.
///
/// A scope is created by [`run_scoped`], handed to the body by reference, and
/// drained once the body returns. Registration is safe from multiple threads;
/// release always happens afterwards, on the calling thread, in registration
/// order.
pub struct Scope {
    resources: Mutex<Vec<Arc<dyn Release + Send + Sync>>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("registered", &self.len())
            .finish()
    }
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Scope {
            resources: Mutex::new(Vec::new()),
        }
    }

    /// Register a resource and get back a shared handle to it.
    ///
    /// The handle is how the body keeps using the resource after
    /// registration; the scope keeps its own handle for release.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebbtide::{Fault, Release, Scope};
    ///
    /// struct File;
    ///
    /// impl Release for File {
    ///     fn release(&self) -> Result<(), Fault> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let scope = Scope::new();
    /// let file = scope.register(File);
    /// assert_eq!(scope.len(), 1);
    /// # let _ = file;
    /// ```
    pub fn register<R>(&self, resource: R) -> Arc<R>
    where
        R: Release + Send + Sync + 'static,
    {
        self.register_arc(Arc::new(resource))
    }

    /// Register an already-shared resource, returning it unchanged.
    ///
    /// Pass-through registration: the argument comes back so callers can
    /// register while binding.
    pub fn register_arc<R>(&self, resource: Arc<R>) -> Arc<R>
    where
        R: Release + Send + Sync + 'static,
    {
        let tracked: Arc<dyn Release + Send + Sync> = resource.clone();
        self.resources.lock().unwrap().push(tracked);
        resource
    }

    /// Number of resources currently registered and not yet released.
    pub fn len(&self) -> usize {
        self.resources.lock().unwrap().len()
    }

    /// Whether no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every registered resource in registration order, folding
    /// failures into `outcome`.
    ///
    /// A release failure never stops iteration. The first failure fills an
    /// empty outcome; every later failure is attached as suppressed on
    /// whatever the outcome holds by then. The list is drained up front, so
    /// each resource is released at most once even if this is reached twice.
    pub(crate) fn release_all(&self, outcome: &mut Option<Fault>) {
        let drained = std::mem::take(&mut *self.resources.lock().unwrap());

        for resource in drained {
            if let Err(fault) = resource.release() {
                #[cfg(feature = "tracing")]
                tracing::warn!(%fault, "resource release failed");

                match outcome {
                    None => *outcome = Some(fault),
                    Some(primary) => primary.suppress(fault),
                }
            }
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a body against a fresh scope and hand the merged outcome to a
/// [`Recovery`] chain.
///
/// The body's fault, if any, is captured rather than propagated; the scope's
/// resources are then released in registration order, with release failures
/// folded in. Nothing is raised here — the returned chain decides, at
/// `finally` time, what comes back out.
///
/// A body that panics is outside the fault model: the panic propagates and
/// no releases run.
///
/// # Examples
///
/// ```
/// use ebbtide::{run_scoped, Fault};
///
/// let result = run_scoped(|_scope| Err(Fault::msg("lookup failed")))
///     .finally(|| Ok(()));
///
/// assert_eq!(result.unwrap_err().to_string(), "lookup failed");
/// ```
pub fn run_scoped<B>(body: B) -> Recovery
where
    B: FnOnce(&Scope) -> Result<(), Fault>,
{
    let scope = Scope::new();
    let mut outcome = body(&scope).err();
    scope.release_all(&mut outcome);
    Recovery::new(outcome)
}

/// Async variant of [`run_scoped`].
///
/// The body receives the scope behind an `Arc`, so it can move clones into
/// spawned tasks that register resources concurrently. Releases still run
/// synchronously and sequentially once the body future completes; tasks that
/// outlive the body and register afterwards are a caller bug — those
/// registrations are never released.
#[cfg(feature = "async")]
pub async fn run_scoped_async<B, Fut>(body: B) -> Recovery
where
    B: FnOnce(Arc<Scope>) -> Fut,
    Fut: std::future::Future<Output = Result<(), Fault>>,
{
    let scope = Arc::new(Scope::new());
    let mut outcome = body(Arc::clone(&scope)).await.err();
    scope.release_all(&mut outcome);
    Recovery::new(outcome)
}
