//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counter and histogram per protocol)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
