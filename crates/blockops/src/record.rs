use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::value::Value;

static EMPTY: Value = Value::Empty;

/// Named input fields of one operator invocation (`NUM1`, `STRING`, ...).
///
/// Operators only read from a record. A field that was never set reads as
/// [`Value::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecord {
    fields: HashMap<String, Value>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for InputRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = InputRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl From<serde_json::Map<String, JsonValue>> for InputRecord {
    fn from(map: serde_json::Map<String, JsonValue>) -> Self {
        map.into_iter().collect()
    }
}
