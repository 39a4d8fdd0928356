//! Format handlers and the registry that dispatches to them
//!
//! ## Key Components
//!
//! - [`FileHandler`] - Base contract: format label, extensions, applicability
//! - [`TextHandler`], [`ObjectHandler`], [`BinaryHandler`] - Blocking codecs
//!   for each capability
//! - [`RegisteredHandler`] - A handler tagged with its capability, exposing
//!   the asynchronous typed face
//! - [`HandlerRegistry`] - Ordered list of handlers; first match wins
//!
//! ## Example
//!
//! ```rust,ignore
//! use unifile::handlers::{Capability, HandlerRegistry};
//!
//! let registry = HandlerRegistry::with_defaults();
//! let handler = registry.dispatch(Path::new("notes.md"), Capability::Text)?;
//! let text = handler.read_text(&executor, Path::new("notes.md"))?.await;
//! ```

mod binary;
mod registry;
mod structured;
mod text;
mod traits;
pub(crate) mod types;

pub use binary::RawFileHandler;
pub use registry::{HandlerRegistry, RegisteredHandler};
pub use structured::{JsonFileHandler, TomlFileHandler};
pub use text::TxtFileHandler;
pub use traits::{BinaryHandler, FileHandler, ObjectHandler, TextHandler};
pub use types::{Capability, Content, Extensions, OpenMode, OptionKind, TargetType, WriteOption};
