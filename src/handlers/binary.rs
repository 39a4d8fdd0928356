use bytes::Bytes;
use std::fs;
use std::io::Write;
use std::path::Path;

use super::traits::{BinaryHandler, FileHandler};
use super::types::{Extensions, OpenMode, OptionKind};
use crate::error::BoxError;

/// Raw byte handler; content is passed through untouched
#[derive(Debug, Clone)]
pub struct RawFileHandler {
    extensions: Extensions,
}

impl RawFileHandler {
    pub fn new() -> Self {
        Self {
            extensions: Extensions::new(".bin").with_aliases([".dat"]),
        }
    }

    pub fn with_extensions(extensions: Extensions) -> Self {
        Self { extensions }
    }
}

impl Default for RawFileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler for RawFileHandler {
    fn format(&self) -> &'static str {
        "BINARY"
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn write_option_kind(&self) -> OptionKind {
        OptionKind::OpenMode
    }
}

impl BinaryHandler for RawFileHandler {
    fn read_bytes(&self, path: &Path) -> Result<Bytes, BoxError> {
        Ok(Bytes::from(fs::read(path)?))
    }

    fn write_bytes(&self, path: &Path, data: &[u8], mode: OpenMode) -> Result<(), BoxError> {
        let mut file = mode.open_options().open(path)?;
        file.write_all(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bytes_round_trip_with_append() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("frame.bin");
        let handler = RawFileHandler::new();

        handler.write_bytes(&path, &[0, 1, 2], OpenMode::Truncate).unwrap();
        handler.write_bytes(&path, &[255], OpenMode::Append).unwrap();

        assert_eq!(handler.read_bytes(&path).unwrap().as_ref(), &[0, 1, 2, 255]);
    }

    #[test]
    fn test_custom_extensions() {
        let handler = RawFileHandler::with_extensions(Extensions::new("png").with_aliases(["jpg"]));
        assert!(handler.can_handle(Path::new("photo.JPG")));
        assert!(!handler.can_handle(Path::new("blob.bin")));
    }
}
