use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Capability tag attached to every registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Text,
    Object,
    Binary,
    /// Dispatch query matching every tag
    Generic,
}

impl Capability {
    pub fn admits(self, tag: Capability) -> bool {
        self == Capability::Generic || self == tag
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Capability::Text => "text",
            Capability::Object => "object",
            Capability::Binary => "binary",
            Capability::Generic => "generic",
        };
        f.write_str(label)
    }
}

/// Target type descriptor for generic reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Plain string content
    Text,
    /// Whatever the handler naturally produces
    Opaque,
    Bytes,
    /// A structured shape, identified by name for diagnostics
    Object(String),
}

impl TargetType {
    /// Structured target named after a Rust type
    pub fn object_of<T>() -> Self {
        TargetType::Object(short_type_name::<T>().to_string())
    }

    /// Capability a handler needs to produce this target
    pub fn capability(&self) -> Capability {
        match self {
            TargetType::Text => Capability::Text,
            TargetType::Object(_) => Capability::Object,
            TargetType::Bytes => Capability::Binary,
            TargetType::Opaque => Capability::Generic,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Text => f.write_str("String"),
            TargetType::Opaque => f.write_str("Opaque"),
            TargetType::Bytes => f.write_str("Bytes"),
            TargetType::Object(name) => f.write_str(name),
        }
    }
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Content produced by a generic read, or handed to a generic write
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Bytes(Bytes),
    Object(Value),
}

impl Content {
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Text(_) => "String",
            Content::Bytes(_) => "Bytes",
            Content::Object(_) => "Object",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Content::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Value> {
        match self {
            Content::Object(value) => Some(value),
            _ => None,
        }
    }

    /// Deserialize structured content into a concrete type
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            Content::Object(value) => serde_json::from_value(value),
            Content::Text(text) => serde_json::from_value(Value::String(text)),
            Content::Bytes(bytes) => serde_json::from_slice(&bytes),
        }
    }

    /// Serialize any value into the structured variant
    pub fn object<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Content::Object(serde_json::to_value(value)?))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(Bytes::from(bytes))
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::Object(value)
    }
}

/// How text and binary handlers open a file for writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Create the file or overwrite it
    #[default]
    Truncate,
    /// Create the file or append to it
    Append,
    /// Fail if the file already exists
    CreateNew,
}

impl OpenMode {
    pub fn open_options(self) -> std::fs::OpenOptions {
        let mut options = std::fs::OpenOptions::new();
        options.write(true);
        match self {
            OpenMode::Truncate => options.create(true).truncate(true),
            OpenMode::Append => options.create(true).append(true),
            OpenMode::CreateNew => options.create_new(true),
        };
        options
    }
}

/// Opaque option passed along with generic and batch writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteOption {
    #[default]
    Default,
    Mode(OpenMode),
}

impl From<OpenMode> for WriteOption {
    fn from(mode: OpenMode) -> Self {
        WriteOption::Mode(mode)
    }
}

/// Option type a handler expects for its writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    OpenMode,
    Unused,
}

/// Recognized file extensions: one primary plus aliases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions {
    primary: String,
    aliases: Vec<String>,
}

impl Extensions {
    pub fn new(primary: &str) -> Self {
        Self {
            primary: normalize_extension(primary),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|a| normalize_extension(a.as_ref())));
        self
    }

    /// Build from a list whose first entry is the primary extension
    pub fn from_list(list: &[String]) -> Option<Self> {
        let (primary, aliases) = list.split_first()?;
        Some(Self::new(primary).with_aliases(aliases))
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Case-insensitive suffix match on the file name
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = file_name_lower(path) else {
            return false;
        };
        self.iter().any(|ext| name.ends_with(ext))
    }
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Lower-cased file name of a path, the text every suffix match runs against
pub(crate) fn file_name_lower(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
}

/// Longest of `extensions` that the file name of `path` ends with
pub(crate) fn longest_suffix_match<'a, I>(path: &Path, extensions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let name = file_name_lower(path)?;
    extensions
        .into_iter()
        .filter(|ext| name.ends_with(*ext))
        .max_by_key(|ext| ext.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::path::PathBuf;

    #[test]
    fn test_extensions_match_case_insensitively() {
        let exts = Extensions::new("txt").with_aliases(["MD", ".log"]);

        assert!(exts.matches(Path::new("notes/README.MD")));
        assert!(exts.matches(Path::new("server.LOG")));
        assert!(exts.matches(Path::new("a.txt")));
        assert!(!exts.matches(Path::new("a.json")));
        assert!(!exts.matches(Path::new("txt")));
        assert_eq!(exts.primary(), ".txt");
        assert_eq!(exts.aliases(), &[".md".to_string(), ".log".to_string()]);
    }

    #[test]
    fn test_extensions_from_list() {
        let list = vec!["bin".to_string(), "dat".to_string()];
        let exts = Extensions::from_list(&list).unwrap();
        assert_eq!(exts.iter().collect::<Vec<_>>(), vec![".bin", ".dat"]);
        assert!(Extensions::from_list(&[]).is_none());
    }

    #[test]
    fn test_longest_suffix_match() {
        let known = [".txt", ".gz", ".tar.gz"];

        assert_eq!(
            longest_suffix_match(&PathBuf::from("/data/report.TXT"), known),
            Some(".txt")
        );
        assert_eq!(
            longest_suffix_match(&PathBuf::from("db.2024.01.tar.gz"), known),
            Some(".tar.gz")
        );
        assert_eq!(longest_suffix_match(&PathBuf::from("logs.gz"), known), Some(".gz"));
        assert_eq!(longest_suffix_match(&PathBuf::from("Makefile"), known), None);
    }

    #[test]
    fn test_capability_admits() {
        assert!(Capability::Generic.admits(Capability::Binary));
        assert!(Capability::Text.admits(Capability::Text));
        assert!(!Capability::Text.admits(Capability::Object));
    }

    #[test]
    fn test_content_deserialize() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Config {
            name: String,
        }

        let content = Content::Object(serde_json::json!({"name": "svc"}));
        let config: Config = content.deserialize().unwrap();
        assert_eq!(config.name, "svc");

        let bad = Content::Object(serde_json::json!({"other": 1}));
        assert!(bad.deserialize::<Config>().is_err());
    }

    #[test]
    fn test_target_type_names() {
        struct Config;
        assert_eq!(TargetType::object_of::<Config>(), TargetType::Object("Config".to_string()));
        assert_eq!(TargetType::Text.to_string(), "String");
        assert_eq!(
            TargetType::object_of::<Vec<std::path::PathBuf>>(),
            TargetType::Object("Vec".to_string())
        );
        assert_eq!(
            TargetType::object_of::<std::collections::HashMap<String, u8>>().to_string(),
            "HashMap"
        );
    }
}
