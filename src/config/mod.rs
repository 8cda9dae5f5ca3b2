//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (ERROR_FILES_PATH, DEBUG, TEMPLATE_* overlay)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → lookup tables built once and shared via Arc with every request
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    FormatTemplating, ListenerConfig, ObservabilityConfig, PagesConfig, ServiceConfig,
    TemplatingConfig, TimeoutConfig,
};
