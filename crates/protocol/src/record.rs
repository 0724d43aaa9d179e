//! The log record flowing through the pipeline

use std::collections::HashMap;

use serde::Serialize;

use crate::LogValue;

/// A flat field name -> value mapping
///
/// Built once by the assembler, then copied by value into one in-memory
/// batch per matched route. Field names are master-schema column names;
/// fields the assembler could not populate are simply absent and bind as
/// NULL at insert time.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: HashMap<&'static str, LogValue>,
}

impl LogRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value
    ///
    /// `Option` values map `None` to an explicit null; both read back the
    /// same way at insert time.
    pub fn set(&mut self, name: &'static str, value: impl Into<LogValue>) {
        self.fields.insert(name, value.into());
    }

    /// Get a field value
    ///
    /// Absent fields and explicit nulls both return [`LogValue::Null`].
    pub fn get(&self, name: &str) -> &LogValue {
        self.fields.get(name).unwrap_or(&LogValue::Null)
    }

    /// Number of populated fields (explicit nulls included)
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are populated
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over populated fields
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &LogValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }
}
