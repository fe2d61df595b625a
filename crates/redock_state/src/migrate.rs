//! Schema migrations for the persisted record.
//!
//! Migrations run on the raw JSON document, before it is decoded into a
//! [`PersistedRecord`](crate::PersistedRecord), so a step only has to know
//! about the fields it touches. `MIGRATIONS[n]` upgrades a document from
//! version `n` to `n + 1`; adding a version means appending one step.

use serde_json::{Map, Value};
use tracing::debug;

use crate::record::CONTAINERS_KEY;

pub(crate) const SCHEMA_VERSION_KEY: &str = "schema_version";

type MigrationStep = fn(&mut Map<String, Value>);

const MIGRATIONS: &[MigrationStep] = &[v0_to_v1];

/// The version every record is upgraded to on load.
pub const CURRENT_SCHEMA_VERSION: u64 = MIGRATIONS.len() as u64;

/// Read the version tag of a raw document. Absent or `null` means 0 (legacy).
pub fn schema_version(doc: &Map<String, Value>) -> Result<u64, String> {
    match doc.get(SCHEMA_VERSION_KEY) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| format!("{SCHEMA_VERSION_KEY} must be a non-negative integer, got {value}")),
    }
}

/// Apply every pending step in order and return the version the document
/// started at. Documents at or above the current version are left untouched.
pub fn upgrade(doc: &mut Map<String, Value>) -> Result<u64, String> {
    let stored = schema_version(doc)?;
    let mut version = stored;
    while version < CURRENT_SCHEMA_VERSION {
        debug!(from = version, to = version + 1, "Migrating state record");
        MIGRATIONS[version as usize](doc);
        version += 1;
        doc.insert(SCHEMA_VERSION_KEY.to_string(), Value::from(version));
    }
    Ok(stored)
}

fn v0_to_v1(doc: &mut Map<String, Value>) {
    match doc.get(CONTAINERS_KEY) {
        None | Some(Value::Null) => {
            doc.insert(CONTAINERS_KEY.to_string(), Value::Object(Map::new()));
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_legacy_record_gets_default_shape() {
        let mut legacy = doc(json!({}));
        assert_eq!(upgrade(&mut legacy).unwrap(), 0);
        assert_eq!(Value::Object(legacy), json!({"schema_version": 1, "containers": {}}));

        let mut explicit_zero = doc(json!({"schema_version": 0, "other": true}));
        upgrade(&mut explicit_zero).unwrap();
        assert_eq!(
            Value::Object(explicit_zero),
            json!({"schema_version": 1, "containers": {}, "other": true})
        );
    }

    #[test]
    fn test_v0_keeps_existing_containers() {
        let mut legacy = doc(json!({"containers": {"abc": 1}}));
        upgrade(&mut legacy).unwrap();
        assert_eq!(legacy["containers"], json!({"abc": 1}));
    }

    #[test]
    fn test_current_version_is_noop() {
        let original = json!({"schema_version": 1, "containers": {"abc": {"x": 1}}});
        let mut current = doc(original.clone());
        assert_eq!(upgrade(&mut current).unwrap(), 1);
        assert_eq!(Value::Object(current), original);
    }

    #[test]
    fn test_future_version_is_accepted() {
        let original = json!({"schema_version": 7, "containers": {}, "new_thing": [1]});
        let mut future = doc(original.clone());
        assert_eq!(upgrade(&mut future).unwrap(), 7);
        assert_eq!(Value::Object(future), original);
    }

    #[test]
    fn test_bad_version_tag() {
        assert!(schema_version(&doc(json!({"schema_version": "1"}))).is_err());
        assert!(schema_version(&doc(json!({"schema_version": -1}))).is_err());
        assert_eq!(schema_version(&doc(json!({"schema_version": null}))), Ok(0));
    }
}
