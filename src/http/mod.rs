//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, /healthz, /metrics, fallback)
//!     → request.rs (context header names, protocol label)
//!     → pages::ErrorPageResponder (on a blocking thread)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{HEADER_TABLE, X_CODE, X_FORMAT, X_REQUEST_ID};
pub use server::HttpServer;
