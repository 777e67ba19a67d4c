//! Observability for aeroquery
//!
//! All diagnostics go through `tracing`. Library code only emits events;
//! binaries call `init_tracing` once at startup to install a subscriber.
//!
//! # Principles
//!
//! 1. Logging is read-only and never alters query results
//! 2. Events carry structured fields (`namespace`, `set`, `node`, `indexes`)
//! 3. `RUST_LOG` overrides the configured filter

mod logger;

pub use logger::{init_tracing, ObservabilityError};
