//! The interceptable-error seam: the [`Fault`] trait and exact-type
//! downcasting for `dyn Fault` values.
//!
//! Any error type that should be routable to reporters implements [`Fault`].
//! For most types this is a one-liner on top of an existing
//! [`Error`](core::error::Error) implementation:
//!
//! ```rust
//! use tripwire::Fault;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("document failed validation")]
//! struct ValidationError;
//!
//! impl Fault for ValidationError {}
//! ```
//!
//! # Exact-type identity
//!
//! Reporter dispatch matches faults by the [`TypeId`] of the concrete type
//! that was raised, never by name and never by walking
//! [`Error::source`](core::error::Error::source) chains. A reporter
//! registered for a wrapper type does not fire for the wrapped type, and
//! vice versa. [`fault_type_id`](Fault::fault_type_id) preserves that
//! concrete identity behind `dyn Fault`.

use core::any::TypeId;

use serde_json::{Map, Value};

/// A boxed fault, as produced by guarded functions.
pub type BoxFault = Box<dyn Fault>;

/// An error that can be intercepted and routed to registered reporters.
///
/// Implementors get three points of customization, all optional:
///
/// - [`context`](Fault::context): key-value fields that are merged into the
///   diagnostic [`SecurityContext`](crate::SecurityContext) when the fault is
///   intercepted.
/// - [`name`](Fault::name): the declared name used to derive default remote
///   report channel names. Defaults to the unqualified type name.
/// - The [`Error`](core::error::Error) supertrait supplies the human-readable
///   rendering forwarded over the remote bridge.
pub trait Fault: core::error::Error + Send + Sync + 'static {
    /// Key-value fields this fault carries into its diagnostic context.
    ///
    /// Returns `None` by default. When present, the fields are merged into
    /// the context built at interception time, with the context's own
    /// `target`/`currentTarget`/`action`/`stackTrace` fields taking
    /// precedence on key collision.
    fn context(&self) -> Option<&Map<String, Value>> {
        None
    }

    /// The declared name of this fault type.
    ///
    /// Used to derive default report channel names of the form
    /// `"/tripwire/reporters/<name>"`. Defaults to the unqualified type name,
    /// so `my_app::errors::TimeoutError` yields `"TimeoutError"`.
    fn name() -> &'static str
    where
        Self: Sized,
    {
        let full = core::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// The [`TypeId`] of the concrete fault type.
    ///
    /// Do not override this method: reporter dispatch relies on it returning
    /// the exact concrete type, even when the fault is handled through
    /// `dyn Fault`.
    #[doc(hidden)]
    fn fault_type_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

impl dyn Fault {
    /// Returns `true` if the concrete type of this fault is `F`.
    ///
    /// This is an exact check: subtype or source-chain relationships are
    /// never considered.
    pub fn is<F: Fault>(&self) -> bool {
        self.fault_type_id() == TypeId::of::<F>()
    }

    /// Downcasts this fault to a concrete reference, if the types match
    /// exactly.
    ///
    /// ```rust
    /// use tripwire::{BoxFault, Fault};
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("timed out")]
    /// struct TimeoutError;
    /// impl Fault for TimeoutError {}
    ///
    /// let fault: BoxFault = Box::new(TimeoutError);
    /// assert!(fault.downcast_ref::<TimeoutError>().is_some());
    /// ```
    pub fn downcast_ref<F: Fault>(&self) -> Option<&F> {
        if self.is::<F>() {
            let erased: &(dyn core::error::Error + 'static) = self;
            erased.downcast_ref::<F>()
        } else {
            None
        }
    }
}

impl<F: Fault> From<F> for BoxFault {
    fn from(fault: F) -> Self {
        Box::new(fault)
    }
}
