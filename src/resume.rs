//! Resume documents.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A resume as loaded from JSON. The structure is not interpreted; it is
/// handed to templates as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resume(Value);

impl Resume {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Resume {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
