//! Custom error pages for an ingress default backend.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pages;

pub use config::schema::ServiceConfig;
pub use error::PageError;
pub use http::HttpServer;
pub use pages::ErrorPageResponder;
