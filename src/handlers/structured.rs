//! Structured (object) formats: JSON and TOML

use serde_json::Value;

use super::traits::{FileHandler, ObjectHandler};
use super::types::Extensions;
use crate::error::BoxError;

/// JSON handler backed by `serde_json`
#[derive(Debug, Clone)]
pub struct JsonFileHandler {
    extensions: Extensions,
    pretty: bool,
}

impl JsonFileHandler {
    pub fn new() -> Self {
        Self {
            extensions: Extensions::new(".json"),
            pretty: true,
        }
    }

    /// Toggle indented output on writes
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler for JsonFileHandler {
    fn format(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

impl ObjectHandler for JsonFileHandler {
    fn decode(&self, raw: &[u8]) -> Result<Value, BoxError> {
        Ok(serde_json::from_slice(raw)?)
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
        let mut encoded = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        encoded.push(b'\n');
        Ok(encoded)
    }
}

/// TOML handler; documents must have a table at the root
#[derive(Debug, Clone)]
pub struct TomlFileHandler {
    extensions: Extensions,
}

impl TomlFileHandler {
    pub fn new() -> Self {
        Self {
            extensions: Extensions::new(".toml"),
        }
    }
}

impl Default for TomlFileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler for TomlFileHandler {
    fn format(&self) -> &'static str {
        "TOML"
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

impl ObjectHandler for TomlFileHandler {
    fn decode(&self, raw: &[u8]) -> Result<Value, BoxError> {
        let text = std::str::from_utf8(raw)?;
        Ok(toml::from_str(text)?)
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
        if !value.is_object() {
            return Err("TOML documents must have a table at the root".into());
        }
        Ok(toml::to_string_pretty(value)?.into_bytes())
    }
}
