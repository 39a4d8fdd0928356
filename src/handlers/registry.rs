use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::binary::RawFileHandler;
use super::structured::{JsonFileHandler, TomlFileHandler};
use super::text::TxtFileHandler;
use super::traits::{BinaryHandler, FileHandler as _, ObjectHandler, TextHandler};
use super::types::{
    Capability, Content, Extensions, OpenMode, OptionKind, TargetType, WriteOption,
    longest_suffix_match, normalize_extension,
};
use crate::config::HandlersConfig;
use crate::error::{FileError, Result};
use crate::execution::{Executor, PendingRead, PendingWrite};

macro_rules! with_base {
    ($entry:expr, $h:ident => $body:expr) => {
        match $entry {
            RegisteredHandler::Text($h) => $body,
            RegisteredHandler::Object($h) => $body,
            RegisteredHandler::Binary($h) => $body,
        }
    };
}

/// A handler together with its capability tag
///
/// The tag is fixed at registration and is what dispatch filters on.
#[derive(Clone)]
pub enum RegisteredHandler {
    Text(Arc<dyn TextHandler>),
    Object(Arc<dyn ObjectHandler>),
    Binary(Arc<dyn BinaryHandler>),
}

impl RegisteredHandler {
    pub fn text(handler: impl TextHandler) -> Self {
        RegisteredHandler::Text(Arc::new(handler))
    }

    pub fn object(handler: impl ObjectHandler) -> Self {
        RegisteredHandler::Object(Arc::new(handler))
    }

    pub fn binary(handler: impl BinaryHandler) -> Self {
        RegisteredHandler::Binary(Arc::new(handler))
    }

    pub fn capability(&self) -> Capability {
        match self {
            RegisteredHandler::Text(_) => Capability::Text,
            RegisteredHandler::Object(_) => Capability::Object,
            RegisteredHandler::Binary(_) => Capability::Binary,
        }
    }

    pub fn format(&self) -> &'static str {
        with_base!(self, h => h.format())
    }

    pub fn extensions(&self) -> &Extensions {
        with_base!(self, h => h.extensions())
    }

    pub fn can_handle(&self, path: &Path) -> bool {
        with_base!(self, h => h.can_handle(path))
    }

    pub fn write_option_kind(&self) -> OptionKind {
        with_base!(self, h => h.write_option_kind())
    }

    fn expected(&self) -> &'static str {
        match self {
            RegisteredHandler::Text(_) => "String",
            RegisteredHandler::Object(_) => "Object",
            RegisteredHandler::Binary(_) => "Bytes",
        }
    }

    fn mismatch(&self, requested: impl fmt::Display) -> FileError {
        FileError::TypeMismatch {
            handler: self.format(),
            expected: self.expected(),
            requested: requested.to_string(),
        }
    }

    pub fn read_text(&self, executor: &Executor, path: &Path) -> Result<PendingRead<String>> {
        let RegisteredHandler::Text(handler) = self else {
            return Err(self.mismatch(TargetType::Text));
        };
        let handler = Arc::clone(handler);
        Ok(executor.execute_read(path, handler.format(), move |p| handler.read_text(p)))
    }

    pub fn write_text(
        &self,
        executor: &Executor,
        path: &Path,
        content: impl Into<String>,
        mode: OpenMode,
    ) -> Result<PendingWrite> {
        let RegisteredHandler::Text(handler) = self else {
            return Err(self.mismatch("String"));
        };
        let handler = Arc::clone(handler);
        let content = content.into();
        Ok(executor.execute_write(path, handler.format(), "String", move |p| {
            handler.write_text(p, &content, mode)
        }))
    }

    /// Decode a structured file and convert it into `T`
    ///
    /// A shape mismatch between the document and `T` is a decode failure.
    pub fn read_object<T>(&self, executor: &Executor, path: &Path) -> Result<PendingRead<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let RegisteredHandler::Object(handler) = self else {
            return Err(self.mismatch(TargetType::object_of::<T>()));
        };
        let handler = Arc::clone(handler);
        Ok(executor.execute_read(path, handler.format(), move |p| {
            let value = handler.decode(&fs::read(p)?)?;
            Ok(serde_json::from_value(value)?)
        }))
    }

    pub fn write_object<T>(&self, executor: &Executor, path: &Path, value: &T) -> Result<PendingWrite>
    where
        T: Serialize + ?Sized,
    {
        let RegisteredHandler::Object(_) = self else {
            return Err(self.mismatch("Object"));
        };
        let value = serde_json::to_value(value)?;
        self.write_value(executor, path, value)
    }

    pub fn read_bytes(&self, executor: &Executor, path: &Path) -> Result<PendingRead<Bytes>> {
        let RegisteredHandler::Binary(handler) = self else {
            return Err(self.mismatch(TargetType::Bytes));
        };
        let handler = Arc::clone(handler);
        Ok(executor.execute_read(path, handler.format(), move |p| handler.read_bytes(p)))
    }

    pub fn write_bytes(
        &self,
        executor: &Executor,
        path: &Path,
        data: impl Into<Bytes>,
        mode: OpenMode,
    ) -> Result<PendingWrite> {
        let RegisteredHandler::Binary(handler) = self else {
            return Err(self.mismatch("Bytes"));
        };
        let handler = Arc::clone(handler);
        let data = data.into();
        Ok(executor.execute_write(path, handler.format(), "Bytes", move |p| {
            handler.write_bytes(p, &data, mode)
        }))
    }

    /// Read into whatever [`Content`] variant `target` asks for
    pub fn read(
        &self,
        executor: &Executor,
        path: &Path,
        target: &TargetType,
    ) -> Result<PendingRead<Content>> {
        let format = self.format();
        match (self, target) {
            (RegisteredHandler::Text(handler), TargetType::Text | TargetType::Opaque) => {
                let handler = Arc::clone(handler);
                Ok(executor.execute_read(path, format, move |p| {
                    Ok(Content::Text(handler.read_text(p)?))
                }))
            }
            (RegisteredHandler::Object(handler), TargetType::Object(_) | TargetType::Opaque) => {
                let handler = Arc::clone(handler);
                Ok(executor.execute_read(path, format, move |p| {
                    Ok(Content::Object(handler.decode(&fs::read(p)?)?))
                }))
            }
            (RegisteredHandler::Binary(handler), TargetType::Bytes | TargetType::Opaque) => {
                let handler = Arc::clone(handler);
                Ok(executor.execute_read(path, format, move |p| {
                    Ok(Content::Bytes(handler.read_bytes(p)?))
                }))
            }
            (_, requested) => Err(self.mismatch(requested)),
        }
    }

    /// Write any [`Content`] this handler understands
    ///
    /// Object handlers also accept text holding a document, parsed on the
    /// worker before encoding.
    pub fn write(
        &self,
        executor: &Executor,
        path: &Path,
        content: Content,
        option: WriteOption,
    ) -> Result<PendingWrite> {
        let mode = match option {
            WriteOption::Mode(mode) => mode,
            WriteOption::Default => OpenMode::default(),
        };

        match (self, content) {
            (RegisteredHandler::Text(_), Content::Text(text)) => {
                self.write_text(executor, path, text, mode)
            }
            (RegisteredHandler::Binary(_), Content::Bytes(bytes)) => {
                self.write_bytes(executor, path, bytes, mode)
            }
            (RegisteredHandler::Object(_), Content::Object(value)) => {
                self.write_value(executor, path, value)
            }
            (RegisteredHandler::Object(handler), Content::Text(document)) => {
                let handler = Arc::clone(handler);
                Ok(executor.execute_write(path, handler.format(), "String", move |p| {
                    let value = handler.decode(document.as_bytes())?;
                    fs::write(p, handler.encode(&value)?)?;
                    Ok(())
                }))
            }
            (_, other) => Err(self.mismatch(other.kind())),
        }
    }

    fn write_value(
        &self,
        executor: &Executor,
        path: &Path,
        value: serde_json::Value,
    ) -> Result<PendingWrite> {
        let RegisteredHandler::Object(handler) = self else {
            return Err(self.mismatch("Object"));
        };
        let handler = Arc::clone(handler);
        Ok(executor.execute_write(path, handler.format(), "Object", move |p| {
            fs::write(p, handler.encode(&value)?)?;
            Ok(())
        }))
    }
}

impl fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("capability", &self.capability())
            .field("format", &self.format())
            .field("extensions", self.extensions())
            .finish()
    }
}

impl From<TxtFileHandler> for RegisteredHandler {
    fn from(handler: TxtFileHandler) -> Self {
        RegisteredHandler::text(handler)
    }
}

impl From<JsonFileHandler> for RegisteredHandler {
    fn from(handler: JsonFileHandler) -> Self {
        RegisteredHandler::object(handler)
    }
}

impl From<TomlFileHandler> for RegisteredHandler {
    fn from(handler: TomlFileHandler) -> Self {
        RegisteredHandler::object(handler)
    }
}

impl From<RawFileHandler> for RegisteredHandler {
    fn from(handler: RawFileHandler) -> Self {
        RegisteredHandler::binary(handler)
    }
}

/// Ordered list of handlers; the first applicable entry wins
///
/// Built once with `&mut self`, then shared read-only (usually behind an
/// `Arc`) so dispatch never locks.
#[derive(Clone, Debug, Default)]
pub struct HandlerRegistry {
    entries: Vec<RegisteredHandler>,
    write_options: HashMap<String, OptionKind>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; overlapping extensions are resolved by order
    pub fn register(&mut self, handler: impl Into<RegisteredHandler>) -> &mut Self {
        let handler = handler.into();
        let kind = handler.write_option_kind();
        for extension in handler.extensions().iter() {
            self.write_options
                .entry(extension.to_string())
                .or_insert(kind);
        }
        tracing::debug!(
            format = handler.format(),
            capability = %handler.capability(),
            position = self.entries.len(),
            "Registered file handler"
        );
        self.entries.push(handler);
        self
    }

    /// Override the option kind used for an extension
    pub fn register_write_option(&mut self, extension: &str, kind: OptionKind) -> &mut Self {
        self.write_options.insert(normalize_extension(extension), kind);
        self
    }

    /// First handler tagged with `capability` that accepts `path`
    pub fn dispatch(&self, path: &Path, capability: Capability) -> Result<&RegisteredHandler> {
        self.entries
            .iter()
            .filter(|entry| capability.admits(entry.capability()))
            .find(|entry| entry.can_handle(path))
            .ok_or_else(|| FileError::NoSuitableHandler {
                capability,
                path: path.to_path_buf(),
            })
    }

    /// Translate a shared write option into what the handler for `path` expects
    pub fn resolve_write_option(&self, path: &Path, option: WriteOption) -> Result<WriteOption> {
        let kind = longest_suffix_match(path, self.write_options.keys().map(String::as_str))
            .and_then(|ext| self.write_options.get(ext))
            .copied()
            .ok_or_else(|| {
                FileError::Configuration(format!(
                    "no write option mapping for file: {}",
                    path.display()
                ))
            })?;

        Ok(match (kind, option) {
            (OptionKind::OpenMode, WriteOption::Default) => WriteOption::Mode(OpenMode::Truncate),
            (OptionKind::OpenMode, explicit) => explicit,
            (OptionKind::Unused, _) => WriteOption::Default,
        })
    }

    /// Text, JSON, TOML and binary handlers, in that order
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(TxtFileHandler::new())
            .register(JsonFileHandler::new())
            .register(TomlFileHandler::new())
            .register(RawFileHandler::new());
        registry
    }

    /// Registry honoring enable flags, extension lists and option overrides
    pub fn from_config(config: &HandlersConfig) -> Result<Self> {
        let mut registry = Self::new();

        if config.text.enabled {
            let extensions = configured_extensions("text", &config.text.extensions)?;
            registry.register(TxtFileHandler::with_extensions(extensions));
        }
        if config.json.enabled {
            registry.register(JsonFileHandler::new().pretty(config.json.pretty));
        }
        if config.toml.enabled {
            registry.register(TomlFileHandler::new());
        }
        if config.binary.enabled {
            let extensions = configured_extensions("binary", &config.binary.extensions)?;
            registry.register(RawFileHandler::with_extensions(extensions));
        }
        for (extension, kind) in &config.write_options {
            registry.register_write_option(extension, *kind);
        }

        tracing::info!(handlers = registry.len(), "Handler registry initialized");
        Ok(registry)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &RegisteredHandler> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn configured_extensions(handler: &str, list: &[String]) -> Result<Extensions> {
    Extensions::from_list(list).ok_or_else(|| {
        FileError::Configuration(format!("{handler} handler has no extensions configured"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlersConfig;
    use std::path::PathBuf;

    #[test]
    fn test_dispatch_by_capability() {
        let registry = HandlerRegistry::with_defaults();

        let text = registry
            .dispatch(Path::new("notes/report.md"), Capability::Text)
            .unwrap();
        assert_eq!(text.format(), "TXT");

        let object = registry
            .dispatch(Path::new("settings.TOML"), Capability::Object)
            .unwrap();
        assert_eq!(object.format(), "TOML");

        let any = registry
            .dispatch(Path::new("sprite.dat"), Capability::Generic)
            .unwrap();
        assert_eq!(any.capability(), Capability::Binary);
    }

    #[test]
    fn test_dispatch_is_deterministic() {
        let registry = HandlerRegistry::with_defaults();
        let path = Path::new("a.json");

        let first = registry.dispatch(path, Capability::Generic).unwrap();
        let second = registry.dispatch(path, Capability::Generic).unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_wrong_capability_is_no_suitable_handler() {
        let registry = HandlerRegistry::with_defaults();

        let err = registry
            .dispatch(Path::new("report.md"), Capability::Object)
            .unwrap_err();
        assert!(matches!(
            err,
            FileError::NoSuitableHandler { capability: Capability::Object, ref path }
                if path == &PathBuf::from("report.md")
        ));
        assert_eq!(
            err.to_string(),
            "no suitable object file handler found for file: report.md"
        );
    }

    #[test]
    fn test_unknown_extension() {
        let registry = HandlerRegistry::with_defaults();
        assert!(registry
            .dispatch(Path::new("photo.png"), Capability::Generic)
            .is_err());
        assert!(HandlerRegistry::new()
            .dispatch(Path::new("a.txt"), Capability::Generic)
            .is_err());
    }

    #[test]
    fn test_first_registered_wins() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(TxtFileHandler::with_extensions(Extensions::new(".json")))
            .register(JsonFileHandler::new());

        let handler = registry
            .dispatch(Path::new("a.json"), Capability::Generic)
            .unwrap();
        assert_eq!(handler.format(), "TXT");

        // The object query skips the earlier text entry
        let handler = registry
            .dispatch(Path::new("a.json"), Capability::Object)
            .unwrap();
        assert_eq!(handler.format(), "JSON");
    }

    #[test]
    fn test_resolve_write_option() {
        let registry = HandlerRegistry::with_defaults();

        assert_eq!(
            registry
                .resolve_write_option(Path::new("out.txt"), WriteOption::Default)
                .unwrap(),
            WriteOption::Mode(OpenMode::Truncate)
        );
        assert_eq!(
            registry
                .resolve_write_option(Path::new("out.log"), OpenMode::Append.into())
                .unwrap(),
            WriteOption::Mode(OpenMode::Append)
        );
        assert_eq!(
            registry
                .resolve_write_option(Path::new("out.json"), OpenMode::Append.into())
                .unwrap(),
            WriteOption::Default
        );
        assert!(matches!(
            registry.resolve_write_option(Path::new("out.xyz"), WriteOption::Default),
            Err(FileError::Configuration(_))
        ));
    }

    #[test]
    fn test_write_option_override() {
        let mut registry = HandlerRegistry::with_defaults();
        registry.register_write_option("TAR.GZ", OptionKind::OpenMode);

        assert_eq!(
            registry
                .resolve_write_option(Path::new("backup.tar.gz"), WriteOption::Default)
                .unwrap(),
            WriteOption::Mode(OpenMode::Truncate)
        );
    }

    #[test]
    fn test_write_option_follows_longest_registered_suffix() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(RawFileHandler::with_extensions(Extensions::new(".tar.gz")))
            .register_write_option(".gz", OptionKind::Unused);
        let path = Path::new("backups/db.2024.01.tar.gz");

        let handler = registry.dispatch(path, Capability::Generic).unwrap();
        assert_eq!(handler.format(), "BINARY");
        assert_eq!(
            registry
                .resolve_write_option(path, OpenMode::Append.into())
                .unwrap(),
            WriteOption::Mode(OpenMode::Append)
        );
        assert_eq!(
            registry
                .resolve_write_option(Path::new("logs.gz"), OpenMode::Append.into())
                .unwrap(),
            WriteOption::Default
        );
    }

    #[test]
    fn test_from_config_honors_flags() {
        let mut config = HandlersConfig::default();
        config.toml.enabled = false;
        config.text.extensions = vec![".rst".to_string()];

        let registry = HandlerRegistry::from_config(&config).unwrap();
        let formats: Vec<_> = registry.handlers().map(|h| h.format()).collect();

        assert_eq!(formats, vec!["TXT", "JSON", "BINARY"]);
        assert!(registry
            .dispatch(Path::new("a.txt"), Capability::Text)
            .is_err());
        assert!(registry
            .dispatch(Path::new("a.rst"), Capability::Text)
            .is_ok());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_immediate() {
        let registry = HandlerRegistry::with_defaults();
        let executor = Executor::new(crate::pool::WorkerPool::current(2).unwrap());
        let text = registry
            .dispatch(Path::new("a.txt"), Capability::Text)
            .unwrap();

        let err = text
            .read(&executor, Path::new("a.txt"), &TargetType::Bytes)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "TXT handler can only work with String, but received Bytes"
        );

        let err = text
            .write(
                &executor,
                Path::new("a.txt"),
                Content::from(vec![1u8, 2]),
                WriteOption::Default,
            )
            .unwrap_err();
        assert!(matches!(err, FileError::TypeMismatch { .. }));
    }
}
