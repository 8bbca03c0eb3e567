//! Workflow Editor - Graph-editing engine for the Flowdesk workflow designer
//!
//! This crate holds the editable state behind the visual workflow canvas: a
//! directed graph of step nodes between a fixed Start and End node. It
//! provides:
//!
//! - Topology operations (insert between, delete with reconnect, connect)
//! - Compressed snapshot-based undo/redo
//! - An interaction controller that turns gestures into checkpointed edits
//! - Save/create through a pluggable [`WorkflowBackend`]
//! - Generic event streaming (not tied to any UI toolkit)
//!
//! Rendering is left to the front end. The editor reports what changed
//! through an [`EventSink`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use workflow_editor::{EditorConfig, NodeKind, NullEventSink, WorkflowEditor};
//!
//! let mut editor = WorkflowEditor::open(None, backend, EditorConfig::default(), Arc::new(NullEventSink))?;
//! editor.insert_between("start", "end", NodeKind::Email, "start-end")?;
//! editor.undo()?;
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod history;
pub mod layout;
pub mod persistence;
pub mod record;
pub mod store;
pub mod topology;
pub mod types;
pub mod validation;

// Re-export key types
pub use config::{EditorConfig, ZoomConfig};
pub use editor::{DragPhase, EditorCommand, WorkflowEditor};
pub use error::{EditorError, Result};
pub use events::{EditorEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use history::History;
pub use layout::{BoundsLayout, Layout, Viewport};
pub use persistence::{
    BackendError, PersistenceAdapter, SaveError, SaveRequest, SaveStatus, WorkflowBackend,
};
pub use record::{WorkflowList, WorkflowPatch, WorkflowRecord, WorkflowStatus, WorkflowStep};
pub use store::GraphStore;
pub use types::{EdgeId, GraphEdge, GraphNode, NodeData, NodeId, NodeKind, Position, WorkflowGraph};
pub use validation::{validate_graph, ValidationError};
