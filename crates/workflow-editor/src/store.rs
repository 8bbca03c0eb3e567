//! Graph store holding the canonical nodes and edges being edited.
//!
//! The store performs no validation; it only replaces whole collections and
//! tells observers about it. Every replacement bumps a revision counter.

use std::sync::Arc;

use crate::events::{emit, EditorEvent, EventSink};
use crate::types::{GraphEdge, GraphNode, WorkflowGraph};

/// Canonical node/edge collections of the workflow in the editor.
pub struct GraphStore {
    graph: WorkflowGraph,
    revision: u64,
    event_sink: Arc<dyn EventSink>,
}

impl GraphStore {
    /// Create a store seeded with a graph.
    pub fn new(graph: WorkflowGraph, event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            graph,
            revision: 0,
            event_sink,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.graph.edges
    }

    /// Borrow the current graph.
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Number of replacements applied since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the whole node collection.
    pub fn set_nodes(&mut self, nodes: Vec<GraphNode>) {
        self.graph.nodes = nodes;
        self.revision += 1;
        emit(
            self.event_sink.as_ref(),
            EditorEvent::NodesReplaced {
                revision: self.revision,
                node_count: self.graph.nodes.len(),
            },
        );
    }

    /// Replace the whole edge collection.
    pub fn set_edges(&mut self, edges: Vec<GraphEdge>) {
        self.graph.edges = edges;
        self.revision += 1;
        emit(
            self.event_sink.as_ref(),
            EditorEvent::EdgesReplaced {
                revision: self.revision,
                edge_count: self.graph.edges.len(),
            },
        );
    }

    /// Replace nodes and edges in one step.
    ///
    /// Observers see a single `GraphCommitted` event and never an
    /// intermediate state where only one collection has changed.
    pub fn commit(&mut self, graph: WorkflowGraph) {
        self.graph = graph;
        self.revision += 1;
        emit(
            self.event_sink.as_ref(),
            EditorEvent::GraphCommitted {
                revision: self.revision,
                node_count: self.graph.nodes.len(),
                edge_count: self.graph.edges.len(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VecEventSink;

    #[test]
    fn test_setters_replace_and_notify() {
        let sink = Arc::new(VecEventSink::new());
        let mut store = GraphStore::new(WorkflowGraph::with_defaults(200.0), sink.clone());

        store.set_edges(Vec::new());
        assert!(store.edges().is_empty());
        assert_eq!(store.nodes().len(), 2);

        store.set_nodes(Vec::new());
        assert_eq!(store.revision(), 2);

        assert_eq!(
            sink.events(),
            vec![
                EditorEvent::EdgesReplaced {
                    revision: 1,
                    edge_count: 0
                },
                EditorEvent::NodesReplaced {
                    revision: 2,
                    node_count: 0
                },
            ]
        );
    }

    #[test]
    fn test_commit_emits_once() {
        let sink = Arc::new(VecEventSink::new());
        let mut store = GraphStore::new(WorkflowGraph::default(), sink.clone());

        store.commit(WorkflowGraph::with_defaults(200.0));

        assert_eq!(store.graph(), &WorkflowGraph::with_defaults(200.0));
        assert_eq!(sink.events().len(), 1);
    }
}
