//! Trimtab - a settings resolution and editing engine for editor hosts.
//!
//! This library provides the core functionality for the `tt` CLI tool:
//! schema-driven settings enumeration, scope resolution, nested value
//! patching, debounced writes, and undo/redo with recency ranking.

pub mod action_log;
pub mod cli;
pub mod commands;
pub mod history;
pub mod menu;
pub mod patch;
pub mod pointer;
pub mod queue;
pub mod recency;
pub mod resolve;
pub mod schema;
pub mod scope;
pub mod store;

use thiserror::Error;

/// Errors that can occur during trimtab operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for trimtab operations.
pub type Result<T> = std::result::Result<T, Error>;
