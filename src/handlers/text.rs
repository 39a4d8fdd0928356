use std::fs;
use std::io::Write;
use std::path::Path;

use super::traits::{FileHandler, TextHandler};
use super::types::{Extensions, OpenMode, OptionKind};
use crate::error::BoxError;

const DATA_FORMAT: &str = "TXT";
const FILE_EXTENSION: &str = ".txt";
const DEFAULT_ALIASES: [&str; 2] = [".md", ".log"];

/// UTF-8 text handler for `.txt`, Markdown and log files
#[derive(Debug, Clone)]
pub struct TxtFileHandler {
    extensions: Extensions,
}

impl TxtFileHandler {
    pub fn new() -> Self {
        Self {
            extensions: Extensions::new(FILE_EXTENSION).with_aliases(DEFAULT_ALIASES),
        }
    }

    /// Handler recognizing a custom extension list
    pub fn with_extensions(extensions: Extensions) -> Self {
        Self { extensions }
    }
}

impl Default for TxtFileHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHandler for TxtFileHandler {
    fn format(&self) -> &'static str {
        DATA_FORMAT
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn write_option_kind(&self) -> OptionKind {
        OptionKind::OpenMode
    }
}

impl TextHandler for TxtFileHandler {
    fn read_text(&self, path: &Path) -> Result<String, BoxError> {
        Ok(fs::read_to_string(path)?)
    }

    fn write_text(&self, path: &Path, content: &str, mode: OpenMode) -> Result<(), BoxError> {
        let mut file = mode.open_options().open(path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
