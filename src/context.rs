//! The diagnostic context attached to every intercepted fault.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{fault::Fault, model::{Event, Instance}, serialize::serialize_instance};

/// Context keys owned by the builders in this module.
///
/// Fault-attached fields with these names lose on merge.
const RESERVED_KEYS: [&str; 4] = ["target", "currentTarget", "action", "stackTrace"];

/// Diagnostic payload describing what a failed guarded call was acting upon.
///
/// Built by the secure wrapper at interception time and handed to every
/// matching reporter, and forwarded over the remote bridge when one is
/// subscribed. Serializes to the flat key-value shape the original report
/// consumers expect, with fault-attached [`extra`](SecurityContext::extra)
/// fields inlined alongside the named ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Fields merged from the fault's own [`context`](Fault::context) map.
    ///
    /// Named fields below take precedence: colliding keys are stripped from
    /// this map when the context is built.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Serialized acting instance, or `None` when the target was not a
    /// recognized instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    /// Serialized current target, present only when the triggering event's
    /// current target differs (by identity) from its origin target.
    #[serde(default, rename = "currentTarget", skip_serializing_if = "Option::is_none")]
    pub current_target: Option<Value>,
    /// The descriptor tag of the guarded function, if one was registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Rendering of the stack captured when the fault was intercepted.
    #[serde(default, rename = "stackTrace")]
    pub stack_trace: String,
}

/// Builds the target portion of a context from a model event.
///
/// Always sets `target` from the event's origin target; sets
/// `current_target` only when the event's current target is a different
/// object from its origin target.
pub fn event_to_context(event: &dyn Event) -> SecurityContext {
    let mut context = SecurityContext {
        target: serialize_instance(Some(event.target())),
        ..SecurityContext::default()
    };
    if !event.targets_are_same_object() {
        context.current_target = serialize_instance(Some(event.current_target()));
    }
    context
}

/// Builds the full diagnostic context for an intercepted fault.
///
/// When `event` is present the invocation was an event-handler call and the
/// target fields come from the event; otherwise `target` is the receiver the
/// guarded function was called on. The fault's own attached context is merged
/// in, then `action` and a freshly captured stack trace are set, with the
/// named fields winning any key collision.
pub fn build_failure_context(
    receiver: Option<&dyn Instance>,
    event: Option<&dyn Event>,
    fault: &dyn Fault,
    action: Option<&str>,
) -> SecurityContext {
    let mut context = match event {
        Some(event) => event_to_context(event),
        None => SecurityContext {
            target: serialize_instance(receiver),
            ..SecurityContext::default()
        },
    };
    if let Some(attached) = fault.context() {
        context
            .extra
            .extend(attached.iter().map(|(key, value)| (key.clone(), value.clone())));
        for key in RESERVED_KEYS {
            context.extra.remove(key);
        }
    }
    context.action = action.map(str::to_owned);
    context.stack_trace = render_stack_trace();
    context
}

fn render_stack_trace() -> String {
    format!("{:?}", backtrace::Backtrace::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Device {
        serial: &'static str,
    }

    impl Instance for Device {
        fn type_name(&self) -> &str {
            "Device"
        }

        fn raw(&self) -> Value {
            json!({ "serial": self.serial })
        }
    }

    struct Bubbled<'a> {
        origin: &'a Device,
        current: &'a Device,
    }

    impl Event for Bubbled<'_> {
        fn target(&self) -> &dyn Instance {
            self.origin
        }

        fn current_target(&self) -> &dyn Instance {
            self.current
        }

        fn prevent_default(&self) {}
    }

    #[derive(Debug, thiserror::Error)]
    #[error("probe fault")]
    struct ProbeFault {
        attached: Map<String, Value>,
    }

    impl Fault for ProbeFault {
        fn context(&self) -> Option<&Map<String, Value>> {
            Some(&self.attached)
        }
    }

    #[test]
    fn test_current_target_absent_when_same_object() {
        let device = Device { serial: "A1" };
        let event = Bubbled { origin: &device, current: &device };
        let context = event_to_context(&event);
        assert!(context.target.is_some());
        assert!(context.current_target.is_none());
    }

    #[test]
    fn test_current_target_present_when_distinct() {
        let origin = Device { serial: "A1" };
        let current = Device { serial: "B2" };
        let event = Bubbled { origin: &origin, current: &current };
        let context = event_to_context(&event);
        assert_eq!(context.target, Some(json!({ "Device": { "serial": "A1" } })));
        assert_eq!(
            context.current_target,
            Some(json!({ "Device": { "serial": "B2" } }))
        );
    }

    #[test]
    fn test_named_fields_win_over_fault_context() {
        let mut attached = Map::new();
        attached.insert("action".to_owned(), json!("smuggled"));
        attached.insert("requestId".to_owned(), json!(42));
        let fault = ProbeFault { attached };
        let device = Device { serial: "A1" };

        let context = build_failure_context(Some(&device), None, &fault, Some("device.flash"));

        assert_eq!(context.action.as_deref(), Some("device.flash"));
        assert_eq!(context.extra.get("requestId"), Some(&json!(42)));
        assert!(!context.extra.contains_key("action"));
        assert!(!context.stack_trace.is_empty());
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let mut attached = Map::new();
        attached.insert("requestId".to_owned(), json!(42));
        let fault = ProbeFault { attached };
        let device = Device { serial: "A1" };

        let context = build_failure_context(Some(&device), None, &fault, Some("device.flash"));
        let value = serde_json::to_value(&context).unwrap();

        assert_eq!(value["requestId"], json!(42));
        assert_eq!(value["action"], json!("device.flash"));
        assert_eq!(value["target"], json!({ "Device": { "serial": "A1" } }));
        assert!(value.get("currentTarget").is_none());
    }
}
