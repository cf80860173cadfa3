//! The failure value threaded through scopes and recovery chains
//!
//! This module provides the `Fault` type, which wraps an arbitrary error and
//! carries an ordered list of *suppressed* faults: failures that occurred
//! while the wrapped one was already in flight (a resource that failed to
//! release, a finalizer that failed while an earlier error was being raised).
//! Suppressed faults are contextual history; they never replace the fault
//! they are attached to.
//!
//! # Examples
//!
//! ## Basic usage
//!
//! ```
//! use ebbtide::Fault;
//! use std::io;
//!
//! let mut fault = Fault::new(io::Error::other("connection reset"));
//! fault.suppress(Fault::msg("socket close failed"));
//!
//! assert!(fault.is::<io::Error>());
//! assert_eq!(fault.suppressed().len(), 1);
//! ```
//!
//! ## Typed inspection
//!
//! ```
//! use ebbtide::Fault;
//! use std::io;
//!
//! let fault = Fault::new(io::Error::other("disk full"));
//!
//! match fault.downcast_ref::<io::Error>() {
//!     Some(err) => assert_eq!(err.to_string(), "disk full"),
//!     None => panic!("expected an io::Error"),
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;

/// A failure with an ordered trail of suppressed companions
///
/// `Fault` is the single error currency of this crate. It wraps any
/// `std::error::Error + Send + Sync` value and accumulates suppressed faults
/// in the order they were attached.
///
/// Type checks (`is`, `downcast_ref`) look only at the wrapped error, never
/// at the suppressed trail.
///
/// # Examples
///
/// ```
/// use ebbtide::Fault;
/// use std::io;
///
/// let mut primary = Fault::new(io::Error::other("write failed"));
/// primary.suppress(Fault::msg("flush failed"));
/// primary.suppress(Fault::msg("close failed"));
///
/// println!("{}", primary);
/// // Output:
/// // write failed
/// //   suppressed: flush failed
/// //   suppressed: close failed
/// ```
#[derive(Debug)]
pub struct Fault {
    error: Box<dyn StdError + Send + Sync + 'static>,
    suppressed: Vec<Fault>,
}

/// Ad-hoc fault payload created by [`Fault::msg`].
#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

impl Fault {
    /// Wrap an error as a fault with no suppressed history.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebbtide::Fault;
    /// use std::io;
    ///
    /// let fault = Fault::new(io::Error::other("boom"));
    /// assert!(fault.is::<io::Error>());
    /// assert!(fault.suppressed().is_empty());
    /// ```
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Fault {
            error: Box::new(error),
            suppressed: Vec::new(),
        }
    }

    /// Create a fault from a plain message.
    ///
    /// Message faults carry a private payload type, so they match no typed
    /// `catch` step; they are meant for bodies and finalizers that have
    /// nothing more structured to report.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebbtide::Fault;
    ///
    /// let fault = Fault::msg("temp dir vanished");
    /// assert_eq!(fault.to_string(), "temp dir vanished");
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Fault::new(Message(message.into()))
    }

    /// Check whether the wrapped error is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.error.is::<E>()
    }

    /// Get a typed view of the wrapped error, if it is an `E`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ebbtide::Fault;
    /// use std::io;
    ///
    /// let fault = Fault::new(io::Error::other("boom"));
    /// assert!(fault.downcast_ref::<io::Error>().is_some());
    /// assert!(fault.downcast_ref::<std::fmt::Error>().is_none());
    /// ```
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Attach another fault as suppressed history.
    ///
    /// Suppressed faults accumulate in attachment order and are rendered
    /// after the wrapped error by `Display`.
    pub fn suppress(&mut self, fault: Fault) {
        self.suppressed.push(fault);
    }

    /// The suppressed faults, in the order they were attached.
    pub fn suppressed(&self) -> &[Fault] {
        &self.suppressed
    }

    /// Disassemble into the wrapped error and the suppressed trail.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(self) -> (Box<dyn StdError + Send + Sync + 'static>, Vec<Fault>) {
        (self.error, self.suppressed)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        for fault in &self.suppressed {
            write!(f, "\n  suppressed: {}", fault)?;
        }

        Ok(())
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}
