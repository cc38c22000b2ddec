//! Wiring of the controller, its capabilities and configuration

pub mod config;
pub mod orchestrator;

pub use config::{AssistantConfig, CONFIG_PATH_ENV};
pub use orchestrator::{Orchestrator, OrchestratorCommand, OrchestratorHandle};
