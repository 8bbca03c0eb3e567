//! Topology operations over a workflow graph
//!
//! Each operation is a pure state transition: it reads the current graph and
//! returns the complete next collection(s), or `None` when the request refers
//! to something that no longer exists. `None` means "leave the graph alone";
//! callers apply a `Some` result in one step, so a structural edit is never
//! observable half-done.

use crate::types::{EdgeId, GraphEdge, GraphNode, NodeId, NodeKind, Position, WorkflowGraph};

/// Hands out node ids that never repeat within one editing session
///
/// Ids have the form `{kind}-{n}`. The counter only moves forward, and ids
/// already present in the graph (for example from a hydrated workflow) are
/// skipped.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node id that is not used by `graph`
    pub fn node_id(&mut self, kind: NodeKind, graph: &WorkflowGraph) -> NodeId {
        loop {
            self.next += 1;
            let id = format!("{}-{}", kind, self.next);
            if !graph.contains_node(&id) {
                return id;
            }
        }
    }
}

/// Build an edge id for `source -> target` that is unique within `edges`
///
/// The plain form is `{source}-{target}`; parallel edges get `-2`, `-3`, ...
pub fn unique_edge_id(edges: &[GraphEdge], source: &str, target: &str) -> EdgeId {
    let base = format!("{}-{}", source, target);
    if !edges.iter().any(|e| e.id == base) {
        return base;
    }
    (2u64..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !edges.iter().any(|e| &e.id == candidate))
        .unwrap_or(base)
}

/// Append an edge from `source` to `target`
///
/// Existing edges are untouched, so connecting two already-connected nodes
/// yields a parallel edge. Unknown endpoints and self-loops are ignored.
pub fn connect(graph: &WorkflowGraph, source: &str, target: &str) -> Option<Vec<GraphEdge>> {
    if source == target || !graph.contains_node(source) || !graph.contains_node(target) {
        log::trace!("Ignoring connect {} -> {}", source, target);
        return None;
    }

    let mut edges = graph.edges.clone();
    let id = unique_edge_id(&edges, source, target);
    edges.push(GraphEdge::new(id, source, target));
    Some(edges)
}

/// Insert a new step on the edge `edge_id` between `source` and `target`
///
/// The new node is placed at the midpoint of its neighbours; the target and
/// every node at or below it (except the source) moves down by `spacing`.
/// The replaced edge is removed and `source -> new -> target` added.
///
/// Returns `None` if either endpoint or the edge is gone, if the edge no
/// longer joins `source` to `target`, if `kind` is Start/End, or if
/// `new_id` is already taken.
pub fn insert_between(
    graph: &WorkflowGraph,
    source: &str,
    target: &str,
    kind: NodeKind,
    edge_id: &str,
    new_id: &str,
    spacing: f64,
) -> Option<WorkflowGraph> {
    if kind.is_terminal() {
        log::trace!("Refusing to insert a {} node", kind);
        return None;
    }
    let source_node = graph.find_node(source)?;
    let target_node = graph.find_node(target)?;
    let edge = graph.find_edge(edge_id)?;
    if edge.source != source || edge.target != target {
        log::trace!("Edge '{}' no longer joins {} -> {}", edge_id, source, target);
        return None;
    }
    debug_assert!(!graph.contains_node(new_id), "node id '{}' allocated twice", new_id);
    if graph.contains_node(new_id) {
        return None;
    }

    let position = source_node.position.midpoint(&target_node.position);
    let threshold = target_node.position.y;

    let mut nodes: Vec<GraphNode> = graph
        .nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if node.id == target || (node.position.y >= threshold && node.id != source) {
                node.position.y += spacing;
            }
            node
        })
        .collect();
    nodes.push(GraphNode::new(new_id, kind, position));

    let mut edges: Vec<GraphEdge> = graph
        .edges
        .iter()
        .filter(|e| e.id != edge_id)
        .cloned()
        .collect();
    let inbound = unique_edge_id(&edges, source, new_id);
    edges.push(GraphEdge::new(inbound, source, new_id));
    let outbound = unique_edge_id(&edges, new_id, target);
    edges.push(GraphEdge::new(outbound, new_id, target));

    let next = WorkflowGraph::new(nodes, edges);
    debug_assert!(!graph.has_terminals() || next.has_terminals());
    Some(next)
}

/// Remove a node and splice its neighbours together
///
/// Every edge touching the node is dropped. When the node had both an
/// incoming and an outgoing edge, the first of each is replaced by a single
/// edge from the incoming edge's source to the outgoing edge's target, so
/// deleting a middle step never breaks the path. No edge is added when
/// both neighbours are the same node.
///
/// Returns `None` for unknown nodes (including a second delete of the same
/// node) and for Start/End, which cannot be deleted.
pub fn delete_with_reconnect(graph: &WorkflowGraph, node_id: &str) -> Option<WorkflowGraph> {
    let node = graph.find_node(node_id)?;
    if !node.is_deletable() {
        log::trace!("Refusing to delete {} node '{}'", node.kind, node_id);
        return None;
    }

    let incoming = graph.incoming_edges(node_id).next();
    let outgoing = graph.outgoing_edges(node_id).next();

    let nodes: Vec<GraphNode> = graph
        .nodes
        .iter()
        .filter(|n| n.id != node_id)
        .cloned()
        .collect();
    let mut edges: Vec<GraphEdge> = graph
        .edges
        .iter()
        .filter(|e| e.source != node_id && e.target != node_id)
        .cloned()
        .collect();

    if let (Some(incoming), Some(outgoing)) = (incoming, outgoing) {
        // Never splice into a self-loop
        if incoming.source != outgoing.target {
            let id = unique_edge_id(&edges, &incoming.source, &outgoing.target);
            edges.push(GraphEdge::new(id, &incoming.source, &outgoing.target));
        }
    }

    let next = WorkflowGraph::new(nodes, edges);
    debug_assert!(!graph.has_terminals() || next.has_terminals());
    Some(next)
}

/// Remove a single edge
pub fn remove_edge(graph: &WorkflowGraph, edge_id: &str) -> Option<Vec<GraphEdge>> {
    graph.find_edge(edge_id)?;
    Some(
        graph
            .edges
            .iter()
            .filter(|e| e.id != edge_id)
            .cloned()
            .collect(),
    )
}

/// Move a node to a new position
pub fn move_node(graph: &WorkflowGraph, node_id: &str, position: Position) -> Option<Vec<GraphNode>> {
    graph.find_node(node_id)?;
    Some(
        graph
            .nodes
            .iter()
            .map(|n| {
                if n.id == node_id {
                    GraphNode {
                        position,
                        ..n.clone()
                    }
                } else {
                    n.clone()
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACING: f64 = 100.0;

    fn default_graph() -> WorkflowGraph {
        WorkflowGraph::with_defaults(200.0)
    }

    fn with_api_step() -> WorkflowGraph {
        insert_between(
            &default_graph(),
            "start",
            "end",
            NodeKind::ApiCall,
            "start-end",
            "apicall-1",
            SPACING,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_between_relinks_path() {
        let graph = with_api_step();

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.find_edge("start-end").is_none());
        assert_eq!(
            graph.edges,
            vec![
                GraphEdge::new("start-apicall-1", "start", "apicall-1"),
                GraphEdge::new("apicall-1-end", "apicall-1", "end"),
            ]
        );
    }

    #[test]
    fn test_insert_between_layout() {
        let graph = with_api_step();

        let inserted = graph.find_node("apicall-1").unwrap();
        assert_eq!(inserted.position, Position::new(0.0, 100.0));
        assert_eq!(inserted.data.label, "API Call");
        assert_eq!(graph.find_node("start").unwrap().position.y, 0.0);
        assert_eq!(graph.find_node("end").unwrap().position.y, 300.0);
    }

    #[test]
    fn test_insert_between_shifts_lower_nodes_only() {
        let graph = with_api_step();
        let graph = insert_between(
            &graph,
            "start",
            "apicall-1",
            NodeKind::Email,
            "start-apicall-1",
            "email-2",
            SPACING,
        )
        .unwrap();

        // apicall-1 was the target, end sits below it; start stays put.
        assert_eq!(graph.find_node("start").unwrap().position.y, 0.0);
        assert_eq!(graph.find_node("apicall-1").unwrap().position.y, 200.0);
        assert_eq!(graph.find_node("end").unwrap().position.y, 400.0);
        assert_eq!(graph.find_node("email-2").unwrap().position.y, 50.0);
    }

    #[test]
    fn test_insert_between_stale_references() {
        let graph = default_graph();
        let insert = |source: &str, target: &str, edge: &str| {
            insert_between(&graph, source, target, NodeKind::Email, edge, "email-1", SPACING)
        };

        assert!(insert("start", "end", "gone").is_none());
        assert!(insert("ghost", "end", "start-end").is_none());
        assert!(insert("start", "ghost", "start-end").is_none());
        assert!(insert("end", "start", "start-end").is_none());
    }

    #[test]
    fn test_insert_between_rejects_terminal_kinds() {
        let graph = default_graph();
        let result = insert_between(&graph, "start", "end", NodeKind::End, "start-end", "end-1", SPACING);
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_with_reconnect_restores_direct_edge() {
        let graph = delete_with_reconnect(&with_api_step(), "apicall-1").unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source, "start");
        assert_eq!(graph.edges[0].target, "end");
        assert!(graph.find_node("apicall-1").is_none());
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let graph = delete_with_reconnect(&with_api_step(), "apicall-1").unwrap();
        assert!(delete_with_reconnect(&graph, "apicall-1").is_none());
    }

    #[test]
    fn test_delete_terminals_refused() {
        let graph = with_api_step();
        assert!(delete_with_reconnect(&graph, "start").is_none());
        assert!(delete_with_reconnect(&graph, "end").is_none());
    }

    #[test]
    fn test_delete_with_single_neighbour_drops_edge() {
        let mut graph = with_api_step();
        graph.edges.retain(|e| e.id != "apicall-1-end");

        let graph = delete_with_reconnect(&graph, "apicall-1").unwrap();
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_delete_between_same_neighbour_leaves_no_self_loop() {
        let mut graph = with_api_step();
        graph.edges = remove_edge(&graph, "apicall-1-end").unwrap();
        graph.edges = connect(&graph, "apicall-1", "start").unwrap();

        let graph = delete_with_reconnect(&graph, "apicall-1").unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_connect_allows_parallel_edges() {
        let graph = default_graph();
        let edges = connect(&graph, "start", "end").unwrap();

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].id, "start-end-2");
        assert_eq!(edges[0], graph.edges[0]);
    }

    #[test]
    fn test_connect_unknown_or_self_loop() {
        let graph = default_graph();
        assert!(connect(&graph, "start", "ghost").is_none());
        assert!(connect(&graph, "start", "start").is_none());
    }

    #[test]
    fn test_remove_edge_and_move_node() {
        let graph = default_graph();
        assert!(remove_edge(&graph, "start-end").unwrap().is_empty());
        assert!(remove_edge(&graph, "missing").is_none());

        let nodes = move_node(&graph, "end", Position::new(40.0, 10.0)).unwrap();
        assert_eq!(nodes[1].position, Position::new(40.0, 10.0));
        assert!(move_node(&graph, "missing", Position::default()).is_none());
    }

    #[test]
    fn test_id_allocator_skips_taken_ids() {
        let mut graph = default_graph();
        graph.nodes.push(GraphNode::new("email-1", NodeKind::Email, Position::default()));

        let mut ids = IdAllocator::new();
        assert_eq!(ids.node_id(NodeKind::Email, &graph), "email-2");
        assert_eq!(ids.node_id(NodeKind::ApiCall, &graph), "apicall-3");
    }
}
