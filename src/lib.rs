pub mod config;
pub mod engine;
pub mod kernel;
pub mod knowledge;
pub mod query;
pub mod services;
pub mod telemetry;

// Re-export specific items if needed for convenient access
pub use config::EngineConfig;
pub use engine::{AnswerSource, Engine, QueryResponse};
