// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod debug;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;
pub mod scoring;

// ---- Re-exports for stable public API ----
pub use crate::api::{app, create_router};
pub use crate::config::{EngineConfig, Registry, ScoringPolicy, ServerConfig};
pub use crate::engine::ScoringEngine;
pub use crate::error::{ConfigurationError, EngineError, SchemaError};
pub use crate::report::Report;
