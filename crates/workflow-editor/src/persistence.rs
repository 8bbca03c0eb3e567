//! Persistence adapter between the editor and the workflow backend.
//!
//! Saving snapshots the graph up front, so the editor stays free to change
//! while a request is in flight, and never writes back into the graph.
//! Each save takes a ticket; only the newest ticket may move the save
//! status, so an older request that finishes late cannot overwrite the
//! outcome of a newer one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::events::{emit, EditorEvent, EventSink};
use crate::record::{WorkflowList, WorkflowPatch, WorkflowRecord, WorkflowStatus, WorkflowStep};
use crate::types::WorkflowGraph;

/// Minimum length of a workflow name
pub const MIN_NAME_LEN: usize = 3;

/// Minimum length of a workflow description
pub const MIN_DESCRIPTION_LEN: usize = 5;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Please check your connection.".to_string(),
            Self::Timeout => "Request timed out.".to_string(),
            Self::Parse(_) => "Failed to parse response.".to_string(),
            Self::Status { status, .. } => match status {
                401 => "Unauthorized. Please log in again.".to_string(),
                403 => "Access forbidden.".to_string(),
                404 => "Resource not found.".to_string(),
                500 => "Server error. Please try again later.".to_string(),
                other => format!("Request failed with status code {}", other),
            },
            Self::Other(message) if !message.is_empty() => message.clone(),
            Self::Other(_) => "An unknown error occurred".to_string(),
        }
    }
}

/// Backend that owns persisted workflow records
///
/// Create is POST, update is PUT, partial update is PATCH; see the
/// `workflow-http` crate for the HTTP implementation.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// List all workflows
    async fn list(&self) -> Result<WorkflowList, BackendError>;

    /// Fetch one workflow by id
    async fn get(&self, id: &str) -> Result<WorkflowRecord, BackendError>;

    /// Create a workflow
    async fn create(&self, record: &WorkflowRecord) -> Result<WorkflowRecord, BackendError>;

    /// Replace an existing workflow
    async fn update(&self, record: &WorkflowRecord) -> Result<WorkflowRecord, BackendError>;

    /// Change some fields of an existing workflow
    async fn patch(&self, id: &str, changes: &WorkflowPatch) -> Result<WorkflowRecord, BackendError>;

    /// Delete a workflow
    async fn delete(&self, id: &str) -> Result<(), BackendError>;
}

/// Progress of the most recent save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Success,
    Error,
}

/// Why a save did not complete
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SaveError {
    /// The name/description form was rejected before contacting the backend
    #[error("{0}")]
    Invalid(String),

    /// The backend rejected or failed the request
    #[error("Save failed: {0}")]
    Backend(#[from] BackendError),
}

impl SaveError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(message) => message.clone(),
            Self::Backend(e) => e.user_message(),
        }
    }
}

/// Everything a save needs, captured from the editor at request time
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub name: String,
    pub description: String,
    pub graph: WorkflowGraph,
}

/// Check the save form, returning the trimmed name and description
pub fn validate_save_form(name: &str, description: &str) -> Result<(String, String), SaveError> {
    let name = name.trim();
    let description = description.trim();

    if name.is_empty() {
        return Err(SaveError::Invalid("Workflow name is required".to_string()));
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(SaveError::Invalid(format!(
            "Name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    if description.is_empty() {
        return Err(SaveError::Invalid("Workflow description is required".to_string()));
    }
    if description.chars().count() < MIN_DESCRIPTION_LEN {
        return Err(SaveError::Invalid(format!(
            "Description must be at least {} characters",
            MIN_DESCRIPTION_LEN
        )));
    }

    Ok((name.to_string(), description.to_string()))
}

#[derive(Debug, Default)]
struct SaveState {
    status: SaveStatus,
    message: Option<String>,
    latest_ticket: u64,
    workflow_id: Option<String>,
    /// Id chosen for a workflow whose create has not succeeded yet
    pending_id: Option<String>,
}

/// Saves the edited graph through a [`WorkflowBackend`]
pub struct PersistenceAdapter {
    backend: Arc<dyn WorkflowBackend>,
    state: Mutex<SaveState>,
    event_sink: Arc<dyn EventSink>,
    editor_name: String,
    success_dismiss: Duration,
}

impl PersistenceAdapter {
    /// Create an adapter for a workflow with (or without) a persisted identity
    pub fn new(
        backend: Arc<dyn WorkflowBackend>,
        workflow_id: Option<String>,
        config: &EditorConfig,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            backend,
            state: Mutex::new(SaveState {
                workflow_id,
                ..Default::default()
            }),
            event_sink,
            editor_name: config.editor_name.clone(),
            success_dismiss: config.success_dismiss(),
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.state.lock().status
    }

    /// Human-readable message of the last failed save
    pub fn error_message(&self) -> Option<String> {
        self.state.lock().message.clone()
    }

    /// Persisted identity, once the workflow has been created
    pub fn workflow_id(&self) -> Option<String> {
        self.state.lock().workflow_id.clone()
    }

    /// Save a graph snapshot with the given metadata
    ///
    /// Creates the workflow when it has no persisted identity yet and
    /// updates it otherwise.
    pub async fn save(&self, request: SaveRequest) -> Result<WorkflowRecord, SaveError> {
        let (name, description) = validate_save_form(&request.name, &request.description)?;

        let (ticket, existing_id, id) = {
            let mut state = self.state.lock();
            state.latest_ticket += 1;
            state.status = SaveStatus::Saving;
            state.message = None;
            // Overlapping first saves share one id so they cannot create twice
            let id = match state.workflow_id.clone().or_else(|| state.pending_id.clone()) {
                Some(id) => id,
                None => {
                    let id = format!("workflow-{}", uuid::Uuid::new_v4());
                    state.pending_id = Some(id.clone());
                    id
                }
            };
            (state.latest_ticket, state.workflow_id.clone(), id)
        };
        self.emit_status(SaveStatus::Saving, None);

        let record = WorkflowRecord {
            id,
            name,
            description,
            nodes: request.graph.nodes.iter().map(WorkflowStep::from).collect(),
            edges: request.graph.edges.clone(),
            last_edited: chrono::Utc::now().to_rfc3339(),
            editor: self.editor_name.clone(),
            status: WorkflowStatus::Pending,
        };

        log::debug!(
            "Saving workflow '{}' ({} nodes, {} edges, ticket {})",
            record.id,
            record.nodes.len(),
            record.edges.len(),
            ticket
        );

        let result = if existing_id.is_some() {
            self.backend.update(&record).await
        } else {
            self.backend.create(&record).await
        };

        let (current, outcome) = {
            let mut state = self.state.lock();
            let current = state.latest_ticket == ticket;
            if let Ok(saved) = &result {
                if current || state.workflow_id.is_none() {
                    state.workflow_id = Some(saved.id.clone());
                }
                state.pending_id = None;
            }
            if current {
                match &result {
                    Ok(_) => {
                        state.status = SaveStatus::Success;
                        state.message = None;
                    }
                    Err(e) => {
                        state.status = SaveStatus::Error;
                        state.message = Some(e.user_message());
                    }
                }
            }
            (current, (state.status, state.message.clone()))
        };

        match &result {
            Ok(saved) => log::debug!("Saved workflow '{}'", saved.id),
            Err(e) => log::warn!("Failed to save workflow '{}': {}", record.id, e),
        }

        if current {
            self.emit_status(outcome.0, outcome.1);
        } else {
            log::debug!("Save ticket {} was superseded", ticket);
        }

        result.map_err(SaveError::from)
    }

    /// Return a successful save to `Idle` once the confirmation delay passes
    ///
    /// Returns false if another save started in the meantime or the status
    /// is no longer `Success`.
    pub async fn dismiss_after_delay(&self) -> bool {
        let ticket = {
            let state = self.state.lock();
            if state.status != SaveStatus::Success {
                return false;
            }
            state.latest_ticket
        };

        tokio::time::sleep(self.success_dismiss).await;

        let dismissed = {
            let mut state = self.state.lock();
            if state.latest_ticket == ticket && state.status == SaveStatus::Success {
                state.status = SaveStatus::Idle;
                true
            } else {
                false
            }
        };
        if dismissed {
            self.emit_status(SaveStatus::Idle, None);
        }
        dismissed
    }

    /// Clear the status and any error message
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.status = SaveStatus::Idle;
            state.message = None;
        }
        self.emit_status(SaveStatus::Idle, None);
    }

    fn emit_status(&self, status: SaveStatus, message: Option<String>) {
        emit(
            self.event_sink.as_ref(),
            EditorEvent::SaveStatusChanged { status, message },
        );
    }
}
