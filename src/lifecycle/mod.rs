//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Install logging and metrics → Start listener
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain in-flight requests → Exit
//!
//! Programmatic (shutdown.rs):
//!     Shutdown::trigger → every Shutdown::wait future completes
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
