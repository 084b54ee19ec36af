//! The secure wrapper: guarded functions and the protected-call routine.
//!
//! [`Registry::secure`] converts a fallible function into a [`Guarded`]
//! function. Invoking a guarded function is a transparent pass-through on
//! success; on failure the fault is intercepted, a diagnostic
//! [`SecurityContext`](crate::SecurityContext) is built, and the fault is
//! routed to every reporter registered for its exact concrete type. When
//! nothing consumed the fault it is re-raised unchanged, so a fault is never
//! silently swallowed while nobody is listening.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tripwire::{BoxFault, Call, Fault, Invocation, Outcome, Registry, SecurityContext};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("document failed validation")]
//! struct ValidationError;
//! impl Fault for ValidationError {}
//!
//! let registry = Arc::new(Registry::new());
//! registry.register_isolated_reporter::<ValidationError, _>(
//!     |_context: &SecurityContext, fault: &ValidationError| eprintln!("{fault}"),
//! );
//!
//! let save = registry.secure(|_invocation: Invocation<'_>| -> Result<u32, BoxFault> {
//!     Err(ValidationError.into())
//! });
//!
//! let outcome = save.call(Call::new()).unwrap();
//! assert!(matches!(outcome, Outcome::Recovered(_)));
//! ```

use std::sync::Arc;

use crate::{
    context::build_failure_context,
    fault::{BoxFault, Fault},
    model::{Event, Instance},
    registry::Registry,
};

/// The view of an invocation handed to the underlying function.
///
/// Carries the receiver the call was made on and, for event-handler
/// invocations, the triggering event.
#[derive(Clone, Copy, Default)]
pub struct Invocation<'a> {
    /// The receiver the guarded function was called on, if any.
    pub receiver: Option<&'a dyn Instance>,
    /// The triggering event, when this call is an event-handler invocation.
    pub event: Option<&'a dyn Event>,
}

/// One invocation of a guarded function.
///
/// The explicit `callback` field replaces the original convention of
/// inspecting the call site for a trailing callable: when present, it is
/// invoked error-first with the intercepted fault after reporters ran (or
/// instead of re-raising, when no reporter matched).
#[derive(Default)]
pub struct Call<'a> {
    /// The receiver the guarded function is called on, if any.
    pub receiver: Option<&'a dyn Instance>,
    /// The triggering event, when this call is an event-handler invocation.
    pub event: Option<&'a dyn Event>,
    /// Error-first callback consuming the fault when the call fails.
    pub callback: Option<&'a mut dyn FnMut(&dyn Fault)>,
}

impl<'a> Call<'a> {
    /// A call with no receiver, no event and no callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the receiver the guarded function is called on.
    pub fn receiver(mut self, receiver: &'a dyn Instance) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Marks this call as an event-handler invocation for `event`.
    pub fn event(mut self, event: &'a dyn Event) -> Self {
        self.event = Some(event);
        self
    }

    /// Attaches an error-first callback.
    pub fn callback(mut self, callback: &'a mut dyn FnMut(&dyn Fault)) -> Self {
        self.callback = Some(callback);
        self
    }
}

/// How a failed guarded call ended, when it did not re-raise.
#[derive(Debug)]
pub enum Outcome<R> {
    /// The underlying function succeeded; its result passed through
    /// unchanged.
    Returned(R),
    /// The underlying function failed and a reporter or callback consumed
    /// the fault.
    Recovered(BoxFault),
}

impl<R> Outcome<R> {
    /// The pass-through result, if the call succeeded.
    pub fn returned(self) -> Option<R> {
        match self {
            Outcome::Returned(value) => Some(value),
            Outcome::Recovered(_) => None,
        }
    }

    /// The consumed fault, if the call was recovered.
    pub fn recovered(&self) -> Option<&dyn Fault> {
        match self {
            Outcome::Returned(_) => None,
            Outcome::Recovered(fault) => Some(fault.as_ref()),
        }
    }
}

/// A function wrapped so that its faults are intercepted and routed to
/// reporters.
///
/// Created by [`Registry::secure`]; holds the underlying function, an
/// optional `action` descriptor tag for diagnostics, and the registry it
/// dispatches against.
pub struct Guarded<F> {
    inner: F,
    action: Option<String>,
    registry: Arc<Registry>,
}

impl<F> Guarded<F> {
    /// Tags this guarded function with an opaque `action` descriptor.
    ///
    /// The tag appears as the `action` field of every context built for
    /// faults intercepted here.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// The descriptor tag, if one was set.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Invokes the underlying function under guard.
    ///
    /// On success the result passes through unchanged as
    /// [`Outcome::Returned`]. On failure:
    ///
    /// 1. reporters registered for the fault's exact concrete type are
    ///    looked up;
    /// 2. the diagnostic context is built, merging the fault's own attached
    ///    context;
    /// 3. if this was an event-handler invocation, the event's default
    ///    action is suppressed exactly once;
    /// 4. matching reporters run in registration order with the context and
    ///    the fault, then the callback (if any) runs error-first;
    /// 5. with no reporters and no callback the fault is re-raised unchanged
    ///    as `Err`.
    ///
    /// Reporter panics are not caught; reporters are trusted collaborator
    /// code.
    pub fn call<R>(&self, call: Call<'_>) -> Result<Outcome<R>, BoxFault>
    where
        F: Fn(Invocation<'_>) -> Result<R, BoxFault>,
    {
        let Call { receiver, event, callback } = call;
        let fault = match (self.inner)(Invocation { receiver, event }) {
            Ok(value) => return Ok(Outcome::Returned(value)),
            Err(fault) => fault,
        };

        let reporters = self.registry.reporters_for(fault.fault_type_id());
        let context = build_failure_context(receiver, event, fault.as_ref(), self.action.as_deref());
        if let Some(event) = event {
            event.prevent_default();
        }
        if reporters.is_empty() {
            match callback {
                Some(callback) => {
                    callback(fault.as_ref());
                    Ok(Outcome::Recovered(fault))
                }
                None => Err(fault),
            }
        } else {
            for reporter in &reporters {
                reporter.report_untyped(&context, fault.as_ref());
            }
            if let Some(callback) = callback {
                callback(fault.as_ref());
            }
            Ok(Outcome::Recovered(fault))
        }
    }
}

/// Conversion into a [`Guarded`] function, with idempotence built into the
/// types.
///
/// A plain function wraps; an already-guarded function converts to itself
/// unchanged, so securing twice guards exactly once:
///
/// ```rust
/// use std::sync::Arc;
///
/// use tripwire::{BoxFault, Invocation, Registry};
///
/// let registry = Arc::new(Registry::new());
/// let guarded = registry.secure(|_: Invocation<'_>| -> Result<(), BoxFault> { Ok(()) });
/// let guarded = registry.secure(guarded); // identity, not a second guard
/// # let _ = guarded;
/// ```
pub trait IntoGuarded<F> {
    /// Performs the conversion.
    fn into_guarded(self, registry: &Arc<Registry>) -> Guarded<F>;
}

impl<F, R> IntoGuarded<F> for F
where
    F: Fn(Invocation<'_>) -> Result<R, BoxFault>,
{
    fn into_guarded(self, registry: &Arc<Registry>) -> Guarded<F> {
        Guarded {
            inner: self,
            action: None,
            registry: Arc::clone(registry),
        }
    }
}

impl<F> IntoGuarded<F> for Guarded<F> {
    fn into_guarded(self, _registry: &Arc<Registry>) -> Guarded<F> {
        self
    }
}

impl Registry {
    /// Wraps `f` so its faults are intercepted and dispatched against this
    /// registry.
    ///
    /// Securing an already-guarded function returns it unchanged; see
    /// [`IntoGuarded`].
    pub fn secure<T, F>(self: &Arc<Self>, f: T) -> Guarded<F>
    where
        T: IntoGuarded<F>,
    {
        f.into_guarded(self)
    }

    /// Wraps `f` and tags it with an `action` descriptor in one step.
    ///
    /// Securing an already-guarded function replaces its tag but does not
    /// add a second guard.
    pub fn secure_action<T, F>(self: &Arc<Self>, f: T, action: impl Into<String>) -> Guarded<F>
    where
        T: IntoGuarded<F>,
    {
        f.into_guarded(self).with_action(action)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::context::SecurityContext;

    #[derive(Debug, thiserror::Error)]
    #[error("validation failed")]
    struct ValidationError;
    impl Fault for ValidationError {}

    #[test]
    fn test_pass_through_on_success() {
        let registry = Arc::new(Registry::new());
        let double = registry.secure(|_: Invocation<'_>| -> Result<u32, BoxFault> { Ok(21 * 2) });
        let outcome = double.call(Call::new()).unwrap();
        assert_eq!(outcome.returned(), Some(42));
    }

    #[test]
    fn test_reraise_when_nothing_listens() {
        let registry = Arc::new(Registry::new());
        let fail =
            registry.secure(|_: Invocation<'_>| -> Result<(), BoxFault> { Err(ValidationError.into()) });
        let fault = fail.call(Call::new()).unwrap_err();
        assert!(fault.is::<ValidationError>());
    }

    #[test]
    fn test_callback_consumes_without_reporters() {
        let registry = Arc::new(Registry::new());
        let fail =
            registry.secure(|_: Invocation<'_>| -> Result<(), BoxFault> { Err(ValidationError.into()) });
        let mut seen = Vec::new();
        let mut callback = |fault: &dyn Fault| seen.push(fault.to_string());
        let outcome = fail.call(Call::new().callback(&mut callback)).unwrap();
        assert!(outcome.recovered().is_some());
        assert_eq!(seen, vec!["validation failed".to_owned()]);
    }

    #[test]
    fn test_securing_twice_guards_once() {
        let registry = Arc::new(Registry::new());
        let calls = Arc::new(Mutex::new(0u32));
        let counted = Arc::clone(&calls);
        registry.register_isolated_reporter::<ValidationError, _>(
            move |_: &SecurityContext, _: &ValidationError| {
                *counted.lock().unwrap() += 1;
            },
        );

        let guarded =
            registry.secure(|_: Invocation<'_>| -> Result<(), BoxFault> { Err(ValidationError.into()) });
        let guarded = registry.secure(guarded);
        guarded.call(Call::new()).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_action_tag_reaches_context() {
        let registry = Arc::new(Registry::new());
        let actions = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&actions);
        registry.register_isolated_reporter::<ValidationError, _>(
            move |context: &SecurityContext, _: &ValidationError| {
                recorded.lock().unwrap().push(context.action.clone());
            },
        );

        let guarded = registry.secure_action(
            |_: Invocation<'_>| -> Result<(), BoxFault> { Err(ValidationError.into()) },
            "document.save",
        );
        guarded.call(Call::new()).unwrap();
        assert_eq!(
            actions.lock().unwrap().as_slice(),
            &[Some("document.save".to_owned())]
        );
    }
}
