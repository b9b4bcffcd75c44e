use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::record::InputRecord;
use crate::value::Value;

/// A batch of operator invocations, usually loaded from YAML.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CallFile {
    pub version: u8,
    /// Seed for a reproducible random source.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub calls: Vec<Call>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Call {
    #[serde(default)]
    pub name: Option<String>,
    pub opcode: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub expect: Option<JsonValue>,
}

impl Call {
    pub fn record(&self) -> InputRecord {
        self.inputs
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value.clone())))
            .collect()
    }

    pub fn expected(&self) -> Option<Value> {
        self.expect.clone().map(Value::from)
    }

    /// Human-readable label: the `name` if given, else `opcode#index`.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}#{}", self.opcode, index),
        }
    }
}
