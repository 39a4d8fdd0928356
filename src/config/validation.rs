use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No handlers enabled (at least one built-in handler is required)")]
    NoHandlersEnabled,

    #[error("Handler '{handler}' is enabled but declares no extensions")]
    EmptyExtensionList { handler: String },

    #[error("Handler '{handler}' declares invalid extension '{extension}'")]
    InvalidExtension { handler: String, extension: String },

    #[error("Pool setting must be positive: {field} = {value}")]
    InvalidPoolSize { field: String, value: usize },

    #[error("Pool thread name must not be empty")]
    EmptyThreadName,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_pool(config)?;
    validate_handlers(config)?;
    Ok(())
}

fn validate_pool(config: &Config) -> Result<(), ValidationError> {
    let pool = &config.pool;
    for (field, value) in [
        ("worker_threads", pool.worker_threads),
        ("max_blocking_threads", pool.max_blocking_threads),
        ("max_concurrent_operations", pool.max_concurrent_operations),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidPoolSize {
                field: field.to_string(),
                value,
            });
        }
    }

    if pool.thread_name.trim().is_empty() {
        return Err(ValidationError::EmptyThreadName);
    }

    Ok(())
}

/// Ensure at least one handler is enabled and every extension is well formed
fn validate_handlers(config: &Config) -> Result<(), ValidationError> {
    let handlers = &config.handlers;

    if !(handlers.text.enabled
        || handlers.json.enabled
        || handlers.toml.enabled
        || handlers.binary.enabled)
    {
        return Err(ValidationError::NoHandlersEnabled);
    }

    let lists = [
        ("text", handlers.text.enabled, &handlers.text.extensions),
        ("binary", handlers.binary.enabled, &handlers.binary.extensions),
    ];
    for (handler, enabled, extensions) in lists {
        if !enabled {
            continue;
        }
        if extensions.is_empty() {
            return Err(ValidationError::EmptyExtensionList {
                handler: handler.to_string(),
            });
        }
        for extension in extensions {
            check_extension(handler, extension)?;
        }
    }

    for extension in handlers.write_options.keys() {
        check_extension("write_options", extension)?;
    }

    Ok(())
}

fn check_extension(handler: &str, extension: &str) -> Result<(), ValidationError> {
    let body = extension.strip_prefix('.').unwrap_or(extension);
    let valid = !body.is_empty()
        && !body
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidExtension {
            handler: handler.to_string(),
            extension: extension.to_string(),
        })
    }
}
