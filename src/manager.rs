//! Caller-facing façade: dispatch a path, then run the handler on the pool
//!
//! Every call returns as soon as the work is submitted. A pre-flight failure
//! (no handler, wrong type, unknown write option) comes back as `Err` right
//! away; anything that happens on the worker is reported by the returned
//! handle.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::execution::{Executor, PendingRead, PendingWrite};
use crate::handlers::{Capability, Content, HandlerRegistry, OpenMode, TargetType, WriteOption};
use crate::observability::OperationObserver;
use crate::pool::WorkerPool;

#[derive(Clone)]
pub struct FileManager {
    registry: Arc<HandlerRegistry>,
    executor: Executor,
    tolerate_partial_failures: bool,
}

impl FileManager {
    pub fn new(registry: HandlerRegistry, executor: Executor) -> Self {
        Self {
            registry: Arc::new(registry),
            executor,
            tolerate_partial_failures: true,
        }
    }

    /// Manager with the built-in handlers over `pool`
    pub fn with_defaults(pool: WorkerPool) -> Self {
        Self::new(HandlerRegistry::with_defaults(), Executor::new(pool))
    }

    /// Manager built from loaded configuration
    pub fn from_config(config: &Config, pool: WorkerPool) -> Result<Self> {
        let registry = HandlerRegistry::from_config(&config.handlers)?;
        Ok(Self::new(registry, Executor::new(pool))
            .tolerate_partial_failures(config.batch.tolerate_partial_failures))
    }

    /// Attach an observer to every operation
    pub fn with_observer(mut self, observer: Arc<dyn OperationObserver>) -> Self {
        self.executor = Executor::with_observer(self.executor.pool().clone(), observer);
        self
    }

    /// Default batch tolerance used by callers that do not pass one
    pub fn tolerate_partial_failures(mut self, tolerate: bool) -> Self {
        self.tolerate_partial_failures = tolerate;
        self
    }

    pub fn default_tolerance(&self) -> bool {
        self.tolerate_partial_failures
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn pool(&self) -> &WorkerPool {
        self.executor.pool()
    }

    pub fn read_text(&self, path: impl AsRef<Path>) -> Result<PendingRead<String>> {
        let path = path.as_ref();
        self.registry
            .dispatch(path, Capability::Text)?
            .read_text(&self.executor, path)
    }

    pub fn write_text(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<String>,
        mode: OpenMode,
    ) -> Result<PendingWrite> {
        let path = path.as_ref();
        self.registry
            .dispatch(path, Capability::Text)?
            .write_text(&self.executor, path, content, mode)
    }

    pub fn read_object<T>(&self, path: impl AsRef<Path>) -> Result<PendingRead<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let path = path.as_ref();
        self.registry
            .dispatch(path, Capability::Object)?
            .read_object(&self.executor, path)
    }

    pub fn write_object<T>(&self, path: impl AsRef<Path>, value: &T) -> Result<PendingWrite>
    where
        T: Serialize + ?Sized,
    {
        let path = path.as_ref();
        self.registry
            .dispatch(path, Capability::Object)?
            .write_object(&self.executor, path, value)
    }

    pub fn read_bytes(&self, path: impl AsRef<Path>) -> Result<PendingRead<Bytes>> {
        let path = path.as_ref();
        self.registry
            .dispatch(path, Capability::Binary)?
            .read_bytes(&self.executor, path)
    }

    pub fn write_bytes(
        &self,
        path: impl AsRef<Path>,
        data: impl Into<Bytes>,
        mode: OpenMode,
    ) -> Result<PendingWrite> {
        let path = path.as_ref();
        self.registry
            .dispatch(path, Capability::Binary)?
            .write_bytes(&self.executor, path, data, mode)
    }

    /// Read through whichever handler can produce `target` for this path
    pub fn read(&self, path: impl AsRef<Path>, target: &TargetType) -> Result<PendingRead<Content>> {
        let path = path.as_ref();
        let handler = self.registry.dispatch(path, target.capability())?;
        debug!(file = %path.display(), format = handler.format(), %target, "Dispatched read");
        handler.read(&self.executor, path, target)
    }

    /// Write through the first handler for this path
    ///
    /// `option` is translated into what that handler expects first; an
    /// extension without a known option mapping is rejected.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        content: Content,
        option: WriteOption,
    ) -> Result<PendingWrite> {
        let path = path.as_ref();
        let option = self.registry.resolve_write_option(path, option)?;
        self.submit_write(path, content, option)
    }

    /// Submit a write whose option is already resolved
    pub(crate) fn submit_write(
        &self,
        path: &Path,
        content: Content,
        option: WriteOption,
    ) -> Result<PendingWrite> {
        let handler = self.registry.dispatch(path, Capability::Generic)?;
        debug!(
            file = %path.display(),
            format = handler.format(),
            content = content.kind(),
            ?option,
            "Dispatched write"
        );
        handler.write(&self.executor, path, content, option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct ServiceConfig {
        name: String,
        port: u16,
    }

    fn manager() -> FileManager {
        FileManager::with_defaults(WorkerPool::current(4).unwrap())
    }

    #[tokio::test]
    async fn test_text_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.md");
        let manager = manager();

        manager
            .write_text(&path, "# Title\nbody", OpenMode::Truncate)
            .unwrap()
            .await
            .unwrap();
        let outcome = manager.read_text(&path).unwrap().await;

        assert_eq!(outcome.into_value().as_deref(), Some("# Title\nbody"));
    }

    #[tokio::test]
    async fn test_object_round_trip_json_and_toml() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager();
        let value = ServiceConfig {
            name: "svc".to_string(),
            port: 8080,
        };

        for name in ["svc.json", "svc.toml"] {
            let path = temp_dir.path().join(name);
            manager.write_object(&path, &value).unwrap().await.unwrap();
            let read: ServiceConfig = manager
                .read_object(&path)
                .unwrap()
                .await
                .into_value()
                .unwrap();
            assert_eq!(read, value, "round trip through {name}");
        }
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("svc.json");
        std::fs::write(&path, r#"{"name": "svc"}"#).unwrap();

        let outcome = manager().read_object::<ServiceConfig>(&path).unwrap().await;

        assert!(matches!(
            outcome.error().map(|e| e.as_ref()),
            Some(FileError::Decode { format: "JSON", .. })
        ));
    }

    #[tokio::test]
    async fn test_bytes_append() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blob.bin");
        let manager = manager();

        manager
            .write_bytes(&path, vec![1u8, 2], OpenMode::Truncate)
            .unwrap()
            .await
            .unwrap();
        manager
            .write_bytes(&path, Bytes::from_static(&[3]), OpenMode::Append)
            .unwrap()
            .await
            .unwrap();

        let bytes = manager.read_bytes(&path).unwrap().await.into_value().unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_markdown_readable_as_text_not_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.md");
        std::fs::write(&path, "quarterly numbers").unwrap();
        let manager = manager();

        let text = manager.read(&path, &TargetType::Text).unwrap().await;
        assert_eq!(
            text.value().and_then(Content::as_text),
            Some("quarterly numbers")
        );

        let err = manager
            .read(&path, &TargetType::object_of::<ServiceConfig>())
            .unwrap_err();
        assert!(matches!(
            err,
            FileError::NoSuitableHandler {
                capability: Capability::Object,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generic_write_resolves_option() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("app.log");
        let manager = manager();

        manager
            .write(&log, "one\n".into(), WriteOption::Default)
            .unwrap()
            .await
            .unwrap();
        manager
            .write(&log, "two\n".into(), OpenMode::Append.into())
            .unwrap()
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "one\ntwo\n");

        // Text holding a JSON document is re-encoded by the JSON handler
        let json = temp_dir.path().join("doc.json");
        manager
            .write(&json, r#"{"a":1}"#.into(), WriteOption::Default)
            .unwrap()
            .await
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));

        let err = manager
            .write(temp_dir.path().join("x.unknown"), "x".into(), WriteOption::Default)
            .unwrap_err();
        assert!(matches!(err, FileError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_create_new_refuses_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("once.txt");
        std::fs::write(&path, "first").unwrap();

        let result = manager()
            .write_text(&path, "second", OpenMode::CreateNew)
            .unwrap()
            .await;

        assert!(matches!(result, Err(FileError::Encode { format: "TXT", .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_from_config_applies_batch_default() {
        let managed = crate::pool::ManagedPool::new(&Default::default()).unwrap();
        let mut config = Config::default();
        config.batch.tolerate_partial_failures = false;

        let manager = FileManager::from_config(&config, managed.pool()).unwrap();

        assert!(!manager.default_tolerance());
        assert_eq!(manager.registry().len(), 4);
        managed.shutdown(std::time::Duration::from_secs(1));
    }
}
