use bytes::Bytes;
use serde_json::Value;
use std::path::Path;

use super::types::{Extensions, OpenMode, OptionKind};
use crate::error::BoxError;

/// Base contract shared by every format handler
///
/// `can_handle` must stay pure and cheap: the registry probes many handlers
/// per dispatch and relies on it looking only at the path.
pub trait FileHandler: Send + Sync + 'static {
    /// Format label used in logs and errors (e.g. "TXT")
    fn format(&self) -> &'static str;

    fn extensions(&self) -> &Extensions;

    fn can_handle(&self, path: &Path) -> bool {
        self.extensions().matches(path)
    }

    /// Option type this handler expects on writes
    fn write_option_kind(&self) -> OptionKind {
        OptionKind::Unused
    }
}

/// Plain text formats (TXT, Markdown, logs)
pub trait TextHandler: FileHandler {
    fn read_text(&self, path: &Path) -> Result<String, BoxError>;

    fn write_text(&self, path: &Path, content: &str, mode: OpenMode) -> Result<(), BoxError>;
}

/// Structured formats decoded into a self-describing value tree
///
/// File access and typed conversion happen in the façade; a codec only turns
/// raw bytes into a [`Value`] and back.
pub trait ObjectHandler: FileHandler {
    fn decode(&self, raw: &[u8]) -> Result<Value, BoxError>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, BoxError>;
}

/// Raw byte formats (images, audio, game assets)
pub trait BinaryHandler: FileHandler {
    fn read_bytes(&self, path: &Path) -> Result<Bytes, BoxError>;

    fn write_bytes(&self, path: &Path, data: &[u8], mode: OpenMode) -> Result<(), BoxError>;
}
