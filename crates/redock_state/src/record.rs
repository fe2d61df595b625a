//! The persisted record and its on-disk encoding.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::migrate::{CURRENT_SCHEMA_VERSION, SCHEMA_VERSION_KEY};

pub(crate) const CONTAINERS_KEY: &str = "containers";

/// Top-level keys owned by the store; `set_field` refuses them.
pub const RESERVED_FIELDS: [&str; 2] = [SCHEMA_VERSION_KEY, CONTAINERS_KEY];

/// The single runtime record shared by every Redock invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersistedRecord {
    schema_version: u64,

    /// Managed containers keyed by container id. Values belong to the caller.
    #[serde(default)]
    pub containers: BTreeMap<String, Value>,

    /// Top-level fields this version does not know about, kept verbatim.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Default for PersistedRecord {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            containers: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

impl PersistedRecord {
    /// On-disk layout revision. Never lower than [`CURRENT_SCHEMA_VERSION`]
    /// once loaded through the store.
    pub fn schema_version(&self) -> u64 {
        self.schema_version
    }

    /// Look up an additional top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Set an additional top-level field, returning the previous value.
    ///
    /// Reserved names are left alone and the value is handed back as `Err`.
    pub fn set_field(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> std::result::Result<Option<Value>, Value> {
        let name = name.into();
        if RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(value);
        }
        Ok(self.extra.insert(name, value))
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.extra.remove(name)
    }

    /// Names of the additional top-level fields, sorted.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(String::as_str)
    }

    pub(crate) fn into_document(self) -> Map<String, Value> {
        let mut doc = self.extra;
        doc.insert(
            CONTAINERS_KEY.to_string(),
            Value::Object(self.containers.into_iter().collect()),
        );
        doc.insert(
            SCHEMA_VERSION_KEY.to_string(),
            Value::from(self.schema_version),
        );
        doc
    }
}

/// Encode a record as pretty JSON with sorted keys and a trailing newline.
///
/// The output is canonical: decoding and re-encoding yields the same bytes.
pub fn encode(record: &PersistedRecord) -> Vec<u8> {
    let doc = Value::Object(record.clone().into_document());
    // Serializing a `Value` cannot fail.
    let mut bytes = serde_json::to_vec_pretty(&doc).unwrap_or_default();
    bytes.push(b'\n');
    bytes
}

/// Decode a record exactly as stored, without migrating it.
pub fn decode(bytes: &[u8]) -> serde_json::Result<PersistedRecord> {
    serde_json::from_slice(bytes)
}
