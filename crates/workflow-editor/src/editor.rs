//! Interaction controller
//!
//! `WorkflowEditor` turns discrete user gestures into topology operations,
//! applies each result to the graph store in a single step and decides
//! which results become history checkpoints. Structural edits (insert,
//! delete, connect, edge removal, drag release) are checkpointed once,
//! after the store holds the settled state. Selection changes and
//! in-progress drag frames are not.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::events::{emit, EditorEvent, EventSink};
use crate::history::History;
use crate::layout::{BoundsLayout, Layout, Viewport};
use crate::persistence::{validate_save_form, PersistenceAdapter, SaveError, SaveRequest, WorkflowBackend};
use crate::record::{WorkflowRecord, WorkflowStatus};
use crate::store::GraphStore;
use crate::topology::{self, IdAllocator};
use crate::types::{EdgeId, GraphEdge, GraphNode, NodeId, NodeKind, Position, WorkflowGraph};
use crate::validation::{validate_graph, validate_structure, ValidationError};

/// Name given to workflows that have not been saved yet
pub const UNTITLED: &str = "Untitled";

/// Whether a node move is still in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    /// Intermediate frame while the pointer is down
    Dragging,
    /// Pointer released; the move is final
    Released,
}

/// A discrete user gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    /// "+" on an edge, then a step kind from the menu
    InsertBetween {
        source: NodeId,
        target: NodeId,
        kind: NodeKind,
        edge_id: EdgeId,
    },
    /// Delete button on a step node
    DeleteNode { node_id: NodeId },
    /// Connection dragged from one node to another
    Connect { source: NodeId, target: NodeId },
    /// Edge removed
    RemoveEdge { edge_id: EdgeId },
    /// Node dragged
    MoveNode {
        node_id: NodeId,
        position: Position,
        phase: DragPhase,
    },
    /// Node selected, or selection cleared
    Select { node_id: Option<NodeId> },
    Undo,
    Redo,
}

/// Editor for a single workflow
pub struct WorkflowEditor {
    config: EditorConfig,
    name: String,
    description: String,
    /// Server status of the opened workflow, carried through unchanged
    status: WorkflowStatus,
    store: GraphStore,
    history: History,
    ids: IdAllocator,
    selection: Option<NodeId>,
    zoom: f64,
    viewport: Option<Viewport>,
    layout: Box<dyn Layout>,
    persistence: Arc<PersistenceAdapter>,
    event_sink: Arc<dyn EventSink>,
}

impl WorkflowEditor {
    /// Open the editor on an existing workflow, or on a new one when `workflow` is None
    ///
    /// A workflow without nodes opens with the default Start/End graph. A
    /// workflow whose graph lacks its fixed endpoints, has dangling edges or
    /// clashing ids is rejected.
    pub fn open(
        workflow: Option<WorkflowRecord>,
        backend: Arc<dyn WorkflowBackend>,
        config: EditorConfig,
        event_sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;

        let (graph, name, description, status, workflow_id) = match workflow {
            Some(record) => {
                let graph = record
                    .graph()
                    .unwrap_or_else(|| WorkflowGraph::with_defaults(config.default_end_offset));
                (graph, record.name, record.description, record.status, Some(record.id))
            }
            None => (
                WorkflowGraph::with_defaults(config.default_end_offset),
                UNTITLED.to_string(),
                String::new(),
                WorkflowStatus::Pending,
                None,
            ),
        };

        let problems = validate_structure(&graph);
        if !problems.is_empty() {
            return Err(EditorError::InvalidGraph(problems));
        }

        log::debug!(
            "Opening workflow {:?} with {} nodes and {} edges",
            workflow_id,
            graph.nodes.len(),
            graph.edges.len()
        );

        let history = History::new(&graph, config.max_history)?;
        let persistence = Arc::new(PersistenceAdapter::new(
            backend,
            workflow_id,
            &config,
            event_sink.clone(),
        ));

        Ok(Self {
            name,
            description,
            status,
            store: GraphStore::new(graph, event_sink.clone()),
            history,
            ids: IdAllocator::new(),
            selection: None,
            zoom: config.zoom.initial,
            viewport: None,
            layout: Box::new(BoundsLayout::new(config.node_width, config.node_height)),
            persistence,
            event_sink,
            config,
        })
    }

    /// Replace the fit-to-view strategy
    pub fn with_layout(mut self, layout: impl Layout + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    // =========================================================================
    // State access
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Server status of the opened workflow
    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn nodes(&self) -> &[GraphNode] {
        self.store.nodes()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        self.store.edges()
    }

    pub fn graph(&self) -> &WorkflowGraph {
        self.store.graph()
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of checkpoints held
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Index of the checkpoint matching the current graph
    pub fn history_cursor(&self) -> usize {
        self.history.cursor()
    }

    /// Whether the node exists and offers a delete action
    ///
    /// Start and End never do.
    pub fn can_delete(&self, node_id: &str) -> bool {
        self.graph()
            .find_node(node_id)
            .is_some_and(GraphNode::is_deletable)
    }

    /// Step kinds that may currently be inserted, in menu order
    pub fn available_kinds(&self) -> Vec<NodeKind> {
        NodeKind::STEPS
            .into_iter()
            .filter(|kind| !self.config.single_use_kinds || !self.graph().contains_kind(*kind))
            .collect()
    }

    /// Report structural and connectivity problems of the current graph
    pub fn validate(&self) -> Vec<ValidationError> {
        validate_graph(self.graph())
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    /// Apply a gesture
    ///
    /// Returns whether the editor state changed. Gestures that refer to
    /// nodes or edges that no longer exist change nothing and are not
    /// errors.
    pub fn dispatch(&mut self, command: EditorCommand) -> Result<bool> {
        match command {
            EditorCommand::InsertBetween {
                source,
                target,
                kind,
                edge_id,
            } => self.insert_between(&source, &target, kind, &edge_id).map(|id| id.is_some()),
            EditorCommand::DeleteNode { node_id } => self.delete_node(&node_id),
            EditorCommand::Connect { source, target } => self.connect(&source, &target),
            EditorCommand::RemoveEdge { edge_id } => self.remove_edge(&edge_id),
            EditorCommand::MoveNode {
                node_id,
                position,
                phase,
            } => self.move_node(&node_id, position, phase),
            EditorCommand::Select { node_id } => Ok(self.select(node_id)),
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
        }
    }

    /// Insert a step of `kind` on the edge `edge_id`
    ///
    /// Returns the id of the new node, or None when the edge or its
    /// endpoints are gone or the kind is not available.
    pub fn insert_between(
        &mut self,
        source: &str,
        target: &str,
        kind: NodeKind,
        edge_id: &str,
    ) -> Result<Option<NodeId>> {
        if !kind.is_terminal() && !self.available_kinds().contains(&kind) {
            log::trace!("Step kind {} is already in the workflow", kind);
            return Ok(None);
        }

        let new_id = self.ids.node_id(kind, self.store.graph());
        let Some(next) = topology::insert_between(
            self.store.graph(),
            source,
            target,
            kind,
            edge_id,
            &new_id,
            self.config.spacing,
        ) else {
            return Ok(None);
        };

        log::debug!("Inserted {} between {} and {}", new_id, source, target);
        self.store.commit(next);
        self.checkpoint()?;
        self.refit();
        Ok(Some(new_id))
    }

    /// Delete a step node, reconnecting its neighbours
    pub fn delete_node(&mut self, node_id: &str) -> Result<bool> {
        let Some(next) = topology::delete_with_reconnect(self.store.graph(), node_id) else {
            return Ok(false);
        };

        log::debug!("Deleted {}", node_id);
        self.store.commit(next);
        if self.selection.as_deref() == Some(node_id) {
            self.selection = None;
        }
        self.checkpoint()?;
        Ok(true)
    }

    /// Add an edge from `source` to `target`
    pub fn connect(&mut self, source: &str, target: &str) -> Result<bool> {
        let Some(edges) = topology::connect(self.store.graph(), source, target) else {
            return Ok(false);
        };

        log::debug!("Connected {} -> {}", source, target);
        self.store.set_edges(edges);
        self.checkpoint()?;
        Ok(true)
    }

    /// Remove a single edge
    pub fn remove_edge(&mut self, edge_id: &str) -> Result<bool> {
        let Some(edges) = topology::remove_edge(self.store.graph(), edge_id) else {
            return Ok(false);
        };

        log::debug!("Removed edge {}", edge_id);
        self.store.set_edges(edges);
        self.checkpoint()?;
        Ok(true)
    }

    /// Move a node; only a released drag becomes a checkpoint
    pub fn move_node(&mut self, node_id: &str, position: Position, phase: DragPhase) -> Result<bool> {
        let Some(nodes) = topology::move_node(self.store.graph(), node_id, position) else {
            return Ok(false);
        };

        self.store.set_nodes(nodes);
        if phase == DragPhase::Released {
            self.checkpoint()?;
        }
        Ok(true)
    }

    /// Change the selection; never checkpointed
    pub fn select(&mut self, node_id: Option<NodeId>) -> bool {
        if let Some(id) = &node_id {
            if !self.graph().contains_node(id) {
                return false;
            }
        }
        let changed = self.selection != node_id;
        self.selection = node_id;
        changed
    }

    /// Restore the previous checkpoint
    pub fn undo(&mut self) -> Result<bool> {
        let Some(restored) = self.history.undo() else {
            return Ok(false);
        };
        self.replay(restored)
    }

    /// Restore the next checkpoint
    pub fn redo(&mut self) -> Result<bool> {
        let Some(restored) = self.history.redo() else {
            return Ok(false);
        };
        self.replay(restored)
    }

    fn replay(&mut self, restored: Result<WorkflowGraph>) -> Result<bool> {
        let graph = match restored {
            Ok(graph) => graph,
            Err(e) => {
                self.history.finish_replay();
                return Err(e);
            }
        };

        self.store.commit(graph);
        // Anything the store update triggers must not land in history
        self.checkpoint()?;
        self.history.finish_replay();

        if let Some(selected) = &self.selection {
            if !self.store.graph().contains_node(selected) {
                self.selection = None;
            }
        }
        self.emit_history();
        Ok(true)
    }

    fn checkpoint(&mut self) -> Result<()> {
        if self.history.push(self.store.graph())? {
            self.emit_history();
        }
        Ok(())
    }

    fn emit_history(&self) {
        emit(
            self.event_sink.as_ref(),
            EditorEvent::HistoryChanged {
                can_undo: self.history.can_undo(),
                can_redo: self.history.can_redo(),
                cursor: self.history.cursor(),
                len: self.history.len(),
            },
        );
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    pub fn set_zoom(&mut self, zoom: f64) {
        let zoom = self.config.zoom.clamp(zoom);
        if (zoom - self.zoom).abs() > f64::EPSILON {
            self.zoom = zoom;
            emit(self.event_sink.as_ref(), EditorEvent::ZoomChanged { zoom });
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.config.zoom.step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.config.zoom.step);
    }

    /// Remember the canvas size and fit all nodes into it
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
        self.fit_view(viewport);
    }

    /// Zoom so that every node is visible in `viewport`
    pub fn fit_view(&mut self, viewport: Viewport) {
        let zoom = self
            .layout
            .fit_zoom(self.store.nodes(), viewport, &self.config.zoom);
        self.set_zoom(zoom);
    }

    fn refit(&mut self) {
        if let Some(viewport) = self.viewport {
            self.fit_view(viewport);
        }
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Shared handle to the persistence adapter
    ///
    /// Lets callers run a save on another task while editing continues.
    pub fn persistence(&self) -> Arc<PersistenceAdapter> {
        self.persistence.clone()
    }

    /// Capture what a save should write
    ///
    /// Blank arguments fall back to the editor's current name and
    /// description. The result must pass the save form rules; only then do
    /// non-blank arguments become the editor's new name and description.
    pub fn save_request(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> std::result::Result<SaveRequest, SaveError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(self.name.as_str());
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(self.description.as_str());
        let (name, description) = validate_save_form(name, description)?;

        self.name.clone_from(&name);
        self.description.clone_from(&description);
        Ok(SaveRequest {
            name,
            description,
            graph: self.store.graph().clone(),
        })
    }

    /// Save and wait for the outcome
    pub async fn save(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> std::result::Result<WorkflowRecord, SaveError> {
        let request = self.save_request(name, description)?;
        let persistence = self.persistence.clone();
        persistence.save(request).await
    }
}
