//! Stored document
//!
//! On disk a document is a codec map whose first entry is `_id` as a `UInt`.
//! In memory the identifier is kept apart from the caller's fields.

use crate::codec::{self, CodecResult, Map, Value};
use crate::error::{HoardError, HoardResult};

/// Name of the reserved identifier field
pub const ID_FIELD: &str = "_id";

/// A document as persisted in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: u64,
    fields: Map,
}

impl Document {
    /// Pairs caller fields with an assigned identifier.
    ///
    /// Any `_id` already present in `fields` is dropped.
    pub(crate) fn new(id: u64, mut fields: Map) -> Self {
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    /// Assigned identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Caller fields, without `_id`
    pub fn fields(&self) -> &Map {
        &self.fields
    }

    /// Looks up a field; `_id` resolves to the identifier
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == ID_FIELD {
            Some(Value::UInt(self.id))
        } else {
            self.fields.get(key).cloned()
        }
    }

    /// Consumes the document, returning the caller fields
    pub fn into_fields(self) -> Map {
        self.fields
    }

    /// The stored form: `_id` first, then the fields in insertion order
    pub fn to_map(&self) -> Map {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert(ID_FIELD, Value::UInt(self.id));
        for (key, value) in self.fields.iter() {
            map.insert(key, value.clone());
        }
        map
    }

    /// JSON object with `_id` first
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.to_map().to_json())
    }

    pub(crate) fn encode(&self) -> CodecResult<Vec<u8>> {
        codec::encode_map(&self.to_map())
    }

    /// Rebuilds a document from a verified frame payload.
    ///
    /// Anything other than a map led by a positive `UInt` `_id` is corruption.
    pub(crate) fn decode_stored(collection: &str, offset: u64, payload: &[u8]) -> HoardResult<Self> {
        let map = codec::decode_map(payload)
            .map_err(|e| HoardError::storage_corrupt_record(collection, offset, e))?;

        let mut entries = map.into_iter();
        let id = match entries.next() {
            Some((key, Value::UInt(id))) if key == ID_FIELD && id >= 1 => id,
            Some((key, value)) => {
                return Err(HoardError::storage_corrupt(format!(
                    "Record in collection '{}' does not start with a valid _id (found '{}': {})",
                    collection,
                    key,
                    value.kind()
                ))
                .with_details(format!("byte_offset: {}", offset)))
            }
            None => {
                return Err(HoardError::storage_corrupt(format!(
                    "Record in collection '{}' is an empty map",
                    collection
                ))
                .with_details(format!("byte_offset: {}", offset)))
            }
        };

        let mut fields = Map::with_capacity(entries.len());
        for (key, value) in entries {
            if key == ID_FIELD {
                return Err(HoardError::storage_corrupt(format!(
                    "Record in collection '{}' repeats _id",
                    collection
                ))
                .with_details(format!("byte_offset: {}", offset)));
            }
            fields.insert(key, value);
        }

        Ok(Self { id, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HoardErrorCode;

    fn sample() -> Map {
        Map::new()
            .with("data", "test")
            .with("age", 23)
            .with("test_arr", vec![Value::from(1), Value::from(2), Value::from(3)])
            .with("test_obj", Map::new().with("a", 1).with("b", 2))
    }

    #[test]
    fn test_caller_id_is_dropped() {
        let doc = Document::new(7, Map::new().with("_id", 99).with("name", "x"));
        assert_eq!(doc.id(), 7);
        assert!(!doc.fields().contains_key(ID_FIELD));
        assert_eq!(doc.get("_id"), Some(Value::UInt(7)));
    }

    #[test]
    fn test_to_map_puts_id_first() {
        let doc = Document::new(1, sample());
        let map = doc.to_map();
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["_id", "data", "age", "test_arr", "test_obj"]);
    }

    #[test]
    fn test_to_json() {
        let doc = Document::new(1, sample());
        let json = doc.to_json();
        assert_eq!(json["_id"], 1);
        assert_eq!(json["data"], "test");
        assert_eq!(json["test_obj"]["b"], 2);
    }

    #[test]
    fn test_stored_round_trip() {
        let doc = Document::new(42, sample());
        let bytes = doc.encode().unwrap();
        let back = Document::decode_stored("test", 0, &bytes).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_missing_id_is_corruption() {
        let bytes = codec::encode_map(&Map::new().with("name", "x")).unwrap();
        let err = Document::decode_stored("test", 16, &bytes).unwrap_err();
        assert_eq!(err.code(), HoardErrorCode::StorageCorrupt);
        assert_eq!(err.details(), Some("byte_offset: 16"));
    }

    #[test]
    fn test_signed_or_zero_id_is_corruption() {
        let signed = codec::encode_map(&Map::new().with("_id", 1i64)).unwrap();
        assert!(Document::decode_stored("test", 0, &signed).is_err());

        let zero = codec::encode_map(&Map::new().with("_id", 0u64)).unwrap();
        assert!(Document::decode_stored("test", 0, &zero).is_err());
    }

    #[test]
    fn test_undecodable_payload_is_corruption() {
        let err = Document::decode_stored("test", 0, &[0xFF]).unwrap_err();
        assert_eq!(err.code(), HoardErrorCode::StorageCorrupt);
    }
}
