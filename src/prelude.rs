//! Commonly used items for convenient importing.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tripwire::prelude::*;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("timed out")]
//! struct TimeoutError;
//! impl Fault for TimeoutError {}
//!
//! let registry = Arc::new(Registry::new());
//! registry.register_isolated_reporter::<TimeoutError, _>(
//!     |_context: &SecurityContext, fault: &TimeoutError| eprintln!("{fault}"),
//! );
//! ```

pub use crate::{
    context::SecurityContext,
    fault::{BoxFault, Fault},
    guard::{Call, Guarded, IntoGuarded, Invocation, Outcome},
    model::{Event, Instance},
    registry::{Registry, RegistryError, Reporter},
    remote::{RemoteError, RemoteHandler, RemoteMethods, Side},
};
