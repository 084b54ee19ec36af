#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
//! Fault interception and reporter dispatch for guarded calls and event
//! handlers.
//!
//! ## Overview
//!
//! This crate wraps fallible functions — including event handlers of a
//! reactive object model — so that faults raised during their execution are
//! intercepted, enriched with a diagnostic context, and dispatched to the
//! reporters registered for the fault's concrete type, instead of
//! propagating uncaught. A remote bridge forwards intercepted faults from a
//! client process to a server process by name-addressed invocation over a
//! host-supplied transport.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tripwire::prelude::*;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("document failed validation")]
//! struct ValidationError;
//! impl Fault for ValidationError {}
//!
//! // One registry per process, shared by everything that guards calls.
//! let registry = Arc::new(Registry::new());
//! registry.register_isolated_reporter::<ValidationError, _>(
//!     |context: &SecurityContext, fault: &ValidationError| {
//!         eprintln!("intercepted {fault}: {context:?}");
//!     },
//! );
//!
//! let save = registry.secure(|_: Invocation<'_>| -> Result<(), BoxFault> {
//!     Err(ValidationError.into())
//! });
//!
//! // The reporter consumed the fault, so the call is recovered, not an Err.
//! let outcome = save.call(Call::new()).unwrap();
//! assert!(matches!(outcome, Outcome::Recovered(_)));
//!
//! // Freeze the extension points once the application has booted.
//! registry.lock_api();
//! ```
//!
//! ## Core Concepts
//!
//! - **[`Fault`]**: the interceptable-error trait. Dispatch matches the
//!   `TypeId` of the concrete type that was raised — exact matching, never
//!   by name and never through source chains.
//! - **[`Registry`]**: an explicit, constructed value holding the per-type
//!   reporter lists, the used report channel names, and the one-way API
//!   lock. Registration against a locked registry is a silent no-op.
//! - **[`Guarded`]**: a wrapped function. Success passes through unchanged;
//!   failure builds a [`SecurityContext`], cancels the triggering event's
//!   default action (for event-handler invocations), runs matching reporters
//!   in registration order, then an optional error-first callback, and
//!   re-raises only when nothing consumed the fault.
//! - **[`RemoteMethods`]**: the transport seam for the remote bridge;
//!   [`Registry::publish_server_reporter`] and
//!   [`Registry::subscribe_server_reporter`] wire a fault type to a
//!   collision-checked report channel on the server and client sides.
//!
//! ## Collaborators
//!
//! The reactive object model and the remote transport are deliberately not
//! part of this crate; they appear only as the [`Instance`], [`Event`] and
//! [`RemoteMethods`] traits. Diagnostics go through [`tracing`]; verbosity
//! and silencing are the host subscriber's concern.

pub mod context;
pub mod fault;
pub mod guard;
pub mod model;
pub mod prelude;
pub mod registry;
pub mod remote;
pub mod serialize;

pub use crate::{
    context::{SecurityContext, build_failure_context, event_to_context},
    fault::{BoxFault, Fault},
    guard::{Call, Guarded, IntoGuarded, Invocation, Outcome},
    model::{Event, Instance},
    registry::{REPORT_NAME_PREFIX, Registry, RegistryError, Reporter},
    remote::{RemoteError, RemoteHandler, RemoteMethods, Side},
};
