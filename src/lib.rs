//! # Ebbtide
//!
//! > *"What the tide carries in, the ebb carries out"*
//!
//! Scoped resource cleanup with typed error recovery.
//!
//! ## Shape
//!
//! One call chain, three steps:
//!
//! - [`run_scoped`] runs a body against a [`Scope`]; every resource the body
//!   registers is released exactly once when the body finishes, in
//!   registration order, whether the body succeeded or failed. Release
//!   failures fold into the body's outcome instead of being dropped.
//! - [`Recovery::catch`] offers the outcome to typed handlers; the first
//!   handler whose error type matches consumes it, and any failure the
//!   handler itself raises is kept, not swallowed.
//! - [`Recovery::finally`] always runs, then resolves everything still
//!   outstanding into at most one [`Fault`], with every other failure
//!   attached as suppressed history.
//!
//! ## Quick Example
//!
//! ```rust
//! use ebbtide::{run_scoped, Fault, Release};
//! use std::fmt;
//! use std::sync::atomic::{AtomicBool, Ordering};
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
//!
//! let result = run_scoped(|scope| {
//!     let conn = scope.register(Connection {
//!         open: AtomicBool::new(true),
//!     });
//!     handle = Some(conn);
//!     Err(Fault::new(QueryTimeout))
//! })
//! .catch(|_: &QueryTimeout| Ok(()))
//! .finally(|| Ok(()));
//!
//! assert!(result.is_ok());
//! assert!(!handle.unwrap().open.load(Ordering::SeqCst), "released");
//! ```
//!
//! No I/O, retries, timeouts, or pooling live here: this is a pure
//! control-flow and error-bookkeeping layer for code that owns resources.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod fault;
pub mod recovery;
pub mod scope;
pub mod testing;

// Re-exports
pub use fault::Fault;
pub use recovery::Recovery;
#[cfg(feature = "async")]
pub use scope::run_scoped_async;
pub use scope::{run_scoped, Release, Scope};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fault::Fault;
    pub use crate::recovery::Recovery;
    #[cfg(feature = "async")]
    pub use crate::scope::run_scoped_async;
    pub use crate::scope::{run_scoped, Release, Scope};
}
