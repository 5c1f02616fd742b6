//! On-disk collection format.
//!
//! A collection file is a single JSON object with one array field:
//!
//! ```json
//! {
//!     "data": [
//!         { "id": 10000000000001, "name": "Ann" }
//!     ]
//! }
//! ```
//!
//! The whole file is parsed on every call and rewritten on every mutation.

use crate::error::{CoreError, CoreResult};
use crate::query::{type_name, Record};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Name of the top-level array field.
pub const DATA_FIELD: &str = "data";

/// In-memory image of a collection file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Records in insertion order.
    pub records: Vec<Record>,
    /// Top-level fields other than `data`, preserved across rewrites.
    extra: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a collection file's bytes.
    ///
    /// # Errors
    ///
    /// Returns `CorruptFile` if the bytes are not JSON or the layout is wrong.
    pub fn decode(path: &Path, bytes: &[u8]) -> CoreResult<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| CoreError::corrupt(path, format!("invalid JSON: {e}")))?;

        let Value::Object(mut root) = value else {
            return Err(CoreError::corrupt(path, "top level is not an object"));
        };

        let data = match root.remove(DATA_FIELD) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(CoreError::corrupt(
                    path,
                    format!("`{DATA_FIELD}` is a {}, expected array", type_name(&other)),
                ))
            }
            None => return Err(CoreError::corrupt(path, format!("missing `{DATA_FIELD}`"))),
        };

        let records = data
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(CoreError::corrupt(
                    path,
                    format!("record {i} is a {}, expected object", type_name(&other)),
                )),
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            records,
            extra: root,
        })
    }

    /// Serializes the document, pretty-printed with four-space indentation.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut root = Map::new();
        root.insert(
            DATA_FIELD.to_string(),
            Value::Array(self.records.iter().cloned().map(Value::Object).collect()),
        );
        for (key, value) in &self.extra {
            root.insert(key.clone(), value.clone());
        }
        to_pretty_json(&Value::Object(root))
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let bytes = fs::read(path)?;
        Self::decode(path, &bytes)
    }

    /// Writes the document to `path` atomically.
    ///
    /// The bytes go to `temp` first, are synced, then renamed over `path`.
    pub fn save(&self, path: &Path, temp: &Path) -> CoreResult<()> {
        write_atomic(path, temp, &self.encode()?)
    }
}

/// Serializes any value with four-space indentation, keeping non-ASCII text.
pub fn to_pretty_json<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write-then-rename so readers never observe a half-written file.
pub fn write_atomic(path: &Path, temp: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp, path)?;
    Ok(())
}
