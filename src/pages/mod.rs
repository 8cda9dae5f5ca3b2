//! Error page resolution.
//!
//! # Data Flow
//! ```text
//! request headers
//!     → format.rs (X-Format → FormatSpec, X-Code → status)
//!     → locator.rs (<code>.<ext>, then <class>xx.<ext>)
//!     → render.rs (verbatim or templated body)
//!     → responder.rs (response, debug echo, metrics)
//! ```

pub mod format;
pub mod locator;
pub mod render;
pub mod responder;

pub use format::{resolve_code, FormatSpec, FormatTable, DEFAULT_CODE};
pub use locator::{locate, ResolvedFile};
pub use render::{
    js_escape, EscapePolicy, Render, TemplateContext, TemplateRenderer, TemplatingTable,
    VerbatimRenderer,
};
pub use responder::{ErrorPage, ErrorPageResponder};
