//! HTTP backend for the workflow editor
//!
//! Implements [`workflow_editor::WorkflowBackend`] against a REST service
//! exposing `/workflows` (GET list, POST create) and `/workflows/{id}`
//! (GET, PUT, PATCH, DELETE).

mod client;
mod config;

pub use client::HttpWorkflowBackend;
pub use config::{ClientConfig, ClientError};
