//! Slot text ⇄ records.
//!
//! A collection slot holds one JSON array of record objects. Reading is
//! forgiving: a missing slot, unparseable text or a non-array all read as
//! an empty collection, and an element that does not decode as the record
//! type is skipped. Every such case is logged.
//!
//! Writes work on the documents, not the typed view, so fields a record
//! type does not declare and records it cannot decode survive every
//! `create`, `update` and `delete`.
//!
//! Instants are revived by the record types themselves (see
//! [`lifelog::instant::iso8601`]), so only fields declared as instants are
//! ever turned into dates.

use lifelog::{Document, Record, ID_FIELD};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;

/// Parse a slot into raw record documents.
pub fn decode_documents(key: &str, raw: Option<&str>) -> Vec<Document> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            warn!(key, found = kind(&other), "collection slot is not an array, reading as empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(key, error = %e, "collection slot is not valid JSON, reading as empty");
            return Vec::new();
        }
    };

    let total = items.len();
    let docs: Vec<Document> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if docs.len() < total {
        warn!(key, skipped = total - docs.len(), "skipped non-object elements");
    }
    docs
}

/// Turn documents into typed records, skipping any that don't decode.
pub fn records_from_documents<T: Record>(key: &str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.get(ID_FIELD).cloned();
            match serde_json::from_value::<T>(Value::Object(doc)) {
                Ok(mut record) => {
                    record.normalize();
                    Some(record)
                }
                Err(e) => {
                    warn!(key, id = ?id, error = %e, "skipping record that does not decode");
                    None
                }
            }
        })
        .collect()
}

/// Parse a collection slot into typed records.
pub fn decode<T: Record>(key: &str, raw: Option<&str>) -> Vec<T> {
    records_from_documents(key, decode_documents(key, raw))
}

/// Serialize a collection to slot text.
pub fn encode<T: Serialize>(key: &str, records: &[T]) -> Result<String, StoreError> {
    serde_json::to_string(records).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Parse a singleton slot. `None` when missing or unreadable.
pub fn decode_one<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> Option<T> {
    match serde_json::from_str(raw?) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "singleton slot does not decode");
            None
        }
    }
}

/// Serialize a singleton to slot text.
pub fn encode_one<T: Serialize>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Shallow-merge `patch` into `base`: each top-level patch field replaces
/// the base field of the same name. The `id` field is never replaced.
pub fn merge_patch(base: &mut Document, patch: Document) {
    for (field, value) in patch {
        if field == ID_FIELD {
            continue;
        }
        base.insert(field, value);
    }
}

/// A record or patch as a JSON object.
pub fn to_document<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Patch {
            key: key.to_string(),
            reason: format!("expected an object, got {}", kind(&other)),
        }),
        Err(source) => Err(StoreError::Encode {
            key: key.to_string(),
            source,
        }),
    }
}

/// The `id` of a stored document, when it is a string.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Apply a shallow patch to a stored document and re-validate it as `T`.
///
/// Returns the typed record and the document to store. Fields `T` does
/// not declare are carried over untouched; declared fields are rewritten
/// in their canonical form.
pub fn patch_document<T: Record, P: Serialize + ?Sized>(
    key: &str,
    stored: &Document,
    patch: &P,
) -> Result<(T, Document), StoreError> {
    let patch = to_document(key, patch)?;
    let mut doc = stored.clone();
    merge_patch(&mut doc, patch);

    let mut record: T =
        serde_json::from_value(Value::Object(doc.clone())).map_err(|e| StoreError::Patch {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    record.normalize();
    for (field, value) in to_document(key, &record)? {
        doc.insert(field, value);
    }
    Ok((record, doc))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifelog::{Schedule, Todo, TodoDraft};
    use serde_json::json;

    #[test]
    fn missing_and_malformed_read_as_empty() {
        assert!(decode::<Todo>("todos", None).is_empty());
        assert!(decode::<Todo>("todos", Some("not json{")).is_empty());
        assert!(decode::<Todo>("todos", Some("{\"a\":1}")).is_empty());
        assert!(decode::<Todo>("todos", Some("null")).is_empty());
        assert!(decode::<Todo>("todos", Some("[]")).is_empty());
    }

    #[test]
    fn undecodable_elements_are_skipped() {
        let raw = json!([
            { "id": "1", "text": "ok", "completed": false, "createdAt": "2024-01-15T10:30:00.000Z" },
            { "id": "2", "text": "no createdAt", "completed": false },
            42,
        ])
        .to_string();
        let todos: Vec<Todo> = decode("todos", Some(raw.as_str()));
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, "1");
    }

    #[test]
    fn instants_are_revived_only_where_declared() {
        let raw = json!([{
            "id": "s1",
            "text": "2024-01-15T10:30:00.000Z",
            "date": "2024-01-15",
            "time": "2024-01-15T10:30:00.000Z",
            "completed": false
        }])
        .to_string();
        let schedules: Vec<Schedule> = decode("schedules", Some(raw.as_str()));
        assert_eq!(schedules[0].text, "2024-01-15T10:30:00.000Z");
        assert_eq!(schedules[0].date, "2024-01-15");
        assert_eq!(
            schedules[0].time.map(|t| t.timestamp_millis()),
            Some(1_705_314_600_000)
        );
    }

    #[test]
    fn encode_writes_instants_as_millisecond_text() {
        let todo = Todo::from_draft(
            "t1".into(),
            TodoDraft {
                created_at: lifelog::instant::parse_instant("2024-01-15T10:30:00Z"),
                ..TodoDraft::new("Buy milk")
            },
        );
        let raw = encode("todos", &[todo]).unwrap();
        assert!(raw.contains("\"createdAt\":\"2024-01-15T10:30:00.000Z\""));
    }

    #[test]
    fn merge_ignores_id() {
        let mut base = json!({ "id": "a", "text": "old", "completed": false })
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({ "id": "b", "completed": true }).as_object().cloned().unwrap();
        merge_patch(&mut base, patch);
        assert_eq!(
            Value::Object(base),
            json!({ "id": "a", "text": "old", "completed": true })
        );
    }

    fn stored_todo() -> Document {
        json!({
            "id": "t1",
            "text": "x",
            "completed": false,
            "createdAt": "2024-01-15T10:30:00Z",
            "userId": 7
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn patch_document_rejects_wrong_types() {
        let stored = stored_todo();
        let err = patch_document::<Todo, _>("todos", &stored, &json!({ "completed": "yes" }))
            .unwrap_err();
        assert!(matches!(err, StoreError::Patch { .. }));
        let err = patch_document::<Todo, _>("todos", &stored, &json!(["not", "an", "object"]))
            .unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn patch_document_keeps_undeclared_fields() {
        let (done, doc) =
            patch_document::<Todo, _>("todos", &stored_todo(), &json!({ "completed": true }))
                .unwrap();
        assert!(done.completed);
        assert_eq!(doc["userId"], 7);
        assert_eq!(doc["completed"], true);
        assert_eq!(doc["createdAt"], "2024-01-15T10:30:00.000Z");
        assert_eq!(document_id(&doc), Some("t1"));
    }

    #[test]
    fn singleton_round_trip_and_corruption() {
        let settings = lifelog::UserSettings::default();
        let raw = encode_one("userSettings", &settings).unwrap();
        assert_eq!(decode_one("userSettings", Some(raw.as_str())), Some(settings));
        assert_eq!(decode_one::<lifelog::UserSettings>("userSettings", Some("{")), None);
        assert_eq!(decode_one::<lifelog::UserSettings>("userSettings", None), None);
    }
}
