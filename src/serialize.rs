//! Serialization of model instances into diagnostic payloads.

use serde_json::Value;

use crate::model::Instance;

/// Serializes a model instance into a payload keyed by its type name.
///
/// Produces `{ "<type name>": <raw representation> }` for a recognized
/// instance. When no instance is available (`None`), emits a warning and
/// returns `None` instead: serialization is on the diagnostic-reporting path
/// and must never itself fail a call.
///
/// ```rust
/// use serde_json::json;
/// use tripwire::{Instance, serialize::serialize_instance};
///
/// struct Document {
///     title: String,
/// }
///
/// impl Instance for Document {
///     fn type_name(&self) -> &str {
///         "Document"
///     }
///     fn raw(&self) -> serde_json::Value {
///         json!({ "title": self.title })
///     }
/// }
///
/// let doc = Document { title: "draft".into() };
/// let payload = serialize_instance(Some(&doc));
/// assert_eq!(payload, Some(json!({ "Document": { "title": "draft" } })));
/// assert_eq!(serialize_instance(None), None);
/// ```
pub fn serialize_instance(value: Option<&dyn Instance>) -> Option<Value> {
    let Some(instance) = value else {
        tracing::warn!("the target of a guarded call should always be an instance of a known model type");
        return None;
    };
    let mut payload = serde_json::Map::with_capacity(1);
    payload.insert(instance.type_name().to_owned(), instance.raw());
    Some(Value::Object(payload))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Account {
        id: u64,
    }

    impl Instance for Account {
        fn type_name(&self) -> &str {
            "Account"
        }

        fn raw(&self) -> Value {
            json!({ "id": self.id })
        }
    }

    #[test]
    fn test_payload_is_keyed_by_type_name() {
        let account = Account { id: 7 };
        let payload = serialize_instance(Some(&account)).unwrap();
        assert_eq!(payload, json!({ "Account": { "id": 7 } }));
    }

    #[test]
    fn test_missing_instance_soft_fails() {
        assert_eq!(serialize_instance(None), None);
    }
}
