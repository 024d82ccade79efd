//! FlightGraph Common Library
//!
//! Shared code for the FlightGraph services including:
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability
//! - Graph store client abstraction
//! - Language model client abstraction

pub mod config;
pub mod errors;
pub mod graph;
pub mod llm;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use graph::{GraphStore, GraphValue};
pub use llm::LanguageModel;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
