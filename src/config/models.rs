use crate::handlers::OptionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub handlers: HandlersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default = "default_max_blocking_threads")]
    pub max_blocking_threads: usize,
    /// Upper bound on file operations running at the same time
    #[serde(default = "default_max_concurrent_operations")]
    pub max_concurrent_operations: usize,
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            max_blocking_threads: default_max_blocking_threads(),
            max_concurrent_operations: default_max_concurrent_operations(),
            thread_name: default_thread_name(),
        }
    }
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

fn default_max_blocking_threads() -> usize {
    64
}

fn default_max_concurrent_operations() -> usize {
    16
}

fn default_thread_name() -> String {
    "unifile-worker".to_string()
}

/// Batch behaviour defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_tolerate_partial_failures")]
    pub tolerate_partial_failures: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            tolerate_partial_failures: default_tolerate_partial_failures(),
        }
    }
}

fn default_tolerate_partial_failures() -> bool {
    true
}

/// Built-in handlers; registration order is text, json, toml, binary
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HandlersConfig {
    #[serde(default)]
    pub text: TextHandlerConfig,
    #[serde(default)]
    pub json: JsonHandlerConfig,
    #[serde(default)]
    pub toml: TomlHandlerConfig,
    #[serde(default)]
    pub binary: BinaryHandlerConfig,
    /// Extra extension -> write option mappings (e.g. ".csv" = "open_mode")
    #[serde(default)]
    pub write_options: BTreeMap<String, OptionKind>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextHandlerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// First entry is the primary extension, the rest are aliases
    #[serde(default = "default_text_extensions")]
    pub extensions: Vec<String>,
}

impl Default for TextHandlerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: default_text_extensions(),
        }
    }
}

fn default_text_extensions() -> Vec<String> {
    vec![".txt".to_string(), ".md".to_string(), ".log".to_string()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonHandlerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_enabled")]
    pub pretty: bool,
}

impl Default for JsonHandlerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlHandlerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for TomlHandlerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BinaryHandlerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_binary_extensions")]
    pub extensions: Vec<String>,
}

impl Default for BinaryHandlerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: default_binary_extensions(),
        }
    }
}

fn default_binary_extensions() -> Vec<String> {
    vec![".bin".to_string(), ".dat".to_string()]
}

fn default_enabled() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "unifile=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.pool.worker_threads >= 1);
        assert_eq!(config.pool.max_concurrent_operations, 16);
        assert!(config.batch.tolerate_partial_failures);
        assert_eq!(config.handlers.text.extensions, vec![".txt", ".md", ".log"]);
        assert!(config.handlers.json.pretty);
        assert!(config.handlers.write_options.is_empty());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[handlers.binary]
extensions = [".png", ".jpg"]

[handlers.write_options]
".csv" = "open_mode"
            "#,
        )
        .unwrap();

        assert!(config.handlers.binary.enabled);
        assert_eq!(config.handlers.binary.extensions, vec![".png", ".jpg"]);
        assert_eq!(config.handlers.write_options[".csv"], OptionKind::OpenMode);
        assert_eq!(config.pool.thread_name, "unifile-worker");
    }
}
