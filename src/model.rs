//! Collaborator traits for the host's reactive object model.
//!
//! This crate never owns a class system or an event loop. It only needs
//! three capabilities from the host model, and these two traits are the
//! whole contract:
//!
//! - serialize a model instance into a plain key-value payload
//!   ([`Instance`]),
//! - read an event's origin and current targets ([`Event`]),
//! - cancel an event's default action when its handler fails
//!   ([`Event::prevent_default`]).

use serde_json::Value;

/// An instance of a known host-model type.
///
/// The guarded-call machinery serializes instances into diagnostic payloads
/// keyed by their declared type name; see
/// [`serialize_instance`](crate::serialize::serialize_instance).
pub trait Instance: 'static {
    /// The declared name of this instance's model type.
    fn type_name(&self) -> &str;

    /// The raw key-value representation of this instance.
    ///
    /// Treated as opaque by this crate; whatever the host model considers a
    /// safe, transmissible rendering of the instance.
    fn raw(&self) -> Value;
}

/// An event from the host's reactive model.
///
/// Carries the instance the event originated on, the instance the handler is
/// currently running on, and a cancelable default action.
pub trait Event {
    /// The instance the event originated on.
    fn target(&self) -> &dyn Instance;

    /// The instance the currently-running handler is attached to.
    ///
    /// For events that do not propagate this is the same object as
    /// [`target`](Event::target).
    fn current_target(&self) -> &dyn Instance;

    /// Suppresses the event's default action.
    ///
    /// Called exactly once by the secure wrapper when an event-handler
    /// invocation fails, so a failed handler cannot let the triggering
    /// action complete anyway.
    fn prevent_default(&self);

    /// Whether `target` and `current_target` are the same object.
    ///
    /// Compared by identity, not by value.
    fn targets_are_same_object(&self) -> bool {
        core::ptr::addr_eq(
            self.target() as *const dyn Instance,
            self.current_target() as *const dyn Instance,
        )
    }
}
