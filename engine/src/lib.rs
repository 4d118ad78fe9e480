//! NutriPlan Engine Library
//!
//! This library provides the core functionality of the NutriPlan assistant.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Generation provider abstraction layer
pub mod llm;

/// Web search provider abstraction layer
pub mod search;

/// Built-in deterministic tools
pub mod tools;

/// Turn responders and their trigger policies
pub mod responders;

/// Turn routing and the nutrition pipeline
pub mod conductor;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
