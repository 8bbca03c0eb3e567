//! Event types for observing editor state
//!
//! Events are sent from the editor to the renderer (or any consumer)
//! whenever the graph, the history cursor, the zoom or the save status
//! changes.

use serde::{Deserialize, Serialize};

use crate::persistence::SaveStatus;

/// Trait for sending editor events
///
/// This abstracts over the transport mechanism (UI channel, mpsc, etc.)
/// allowing the editor to be embedded in different front ends.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: EditorEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted while editing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// The node collection was replaced
    #[serde(rename_all = "camelCase")]
    NodesReplaced { revision: u64, node_count: usize },

    /// The edge collection was replaced
    #[serde(rename_all = "camelCase")]
    EdgesReplaced { revision: u64, edge_count: usize },

    /// Nodes and edges were replaced together as one transaction
    #[serde(rename_all = "camelCase")]
    GraphCommitted {
        revision: u64,
        node_count: usize,
        edge_count: usize,
    },

    /// History cursor or length changed
    #[serde(rename_all = "camelCase")]
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
        cursor: usize,
        len: usize,
    },

    /// Canvas zoom changed
    #[serde(rename_all = "camelCase")]
    ZoomChanged { zoom: f64 },

    /// Save status changed
    #[serde(rename_all = "camelCase")]
    SaveStatusChanged {
        status: SaveStatus,
        message: Option<String>,
    },
}

/// Send an event, logging instead of failing when the sink is gone
pub(crate) fn emit(sink: &dyn EventSink, event: EditorEvent) {
    if let Err(e) = sink.send(event) {
        log::trace!("Dropped editor event: {}", e);
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EditorEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: parking_lot::Mutex<Vec<EditorEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}
