//! Core types for workflow graphs
//!
//! These types define the structure of the graph being edited: typed step
//! nodes, the edges between them, and the graph that owns both. All of them
//! are plain data; behavior that mutates a graph lives in `topology`.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Id of the Start node in a freshly created graph
pub const START_NODE_ID: &str = "start";

/// Id of the End node in a freshly created graph
pub const END_NODE_ID: &str = "end";

/// The kind of a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Entry point. Exactly one per graph.
    Start,
    /// Exit point. Exactly one per graph.
    End,
    /// Outbound API request
    #[serde(alias = "api")]
    ApiCall,
    /// Outbound email
    Email,
    /// Free-form text step
    TextBox,
    /// Branch step found in persisted workflows
    ///
    /// Kept so such workflows load and save unchanged. It is not offered
    /// for insertion.
    Condition,
}

impl NodeKind {
    /// Kinds a user can insert between two connected nodes, in menu order
    pub const STEPS: [NodeKind; 3] = [NodeKind::ApiCall, NodeKind::Email, NodeKind::TextBox];

    /// Whether this kind is one of the two fixed endpoints of a graph
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeKind::Start | NodeKind::End)
    }

    /// Get a human-readable label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::End => "End",
            NodeKind::ApiCall => "API Call",
            NodeKind::Email => "Email",
            NodeKind::TextBox => "Text Box",
            NodeKind::Condition => "Condition",
        }
    }

    /// Wire name, also used as the prefix of generated node ids
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::ApiCall => "apicall",
            NodeKind::Email => "email",
            NodeKind::TextBox => "textbox",
            NodeKind::Condition => "condition",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point halfway between two positions
    pub fn midpoint(&self, other: &Position) -> Position {
        Position {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// Display data carried by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier for this node; never changes once assigned
    pub id: NodeId,
    /// Step kind
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Position on the canvas
    pub position: Position,
    /// Display data
    pub data: NodeData,
}

impl GraphNode {
    /// Create a node labelled after its kind
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            data: NodeData {
                label: kind.label().to_string(),
            },
        }
    }

    /// Whether the user may delete this node
    ///
    /// Start and End never carry a delete affordance.
    pub fn is_deletable(&self) -> bool {
        !self.kind.is_terminal()
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
}

impl GraphEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// The editable node/edge structure of one workflow
///
/// Node order is render order only; it carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Nodes in the graph
    pub nodes: Vec<GraphNode>,
    /// Edges connecting nodes
    pub edges: Vec<GraphEdge>,
}

impl WorkflowGraph {
    /// Create a graph from existing collections
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    /// The two-node graph every new workflow starts from
    pub fn with_defaults(end_offset: f64) -> Self {
        Self {
            nodes: vec![
                GraphNode::new(START_NODE_ID, NodeKind::Start, Position::new(0.0, 0.0)),
                GraphNode::new(END_NODE_ID, NodeKind::End, Position::new(0.0, end_offset)),
            ],
            edges: vec![GraphEdge::new(
                format!("{}-{}", START_NODE_ID, END_NODE_ID),
                START_NODE_ID,
                END_NODE_ID,
            )],
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn find_edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Find the Start node
    pub fn start_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Start)
    }

    /// Find the End node
    pub fn end_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.kind == NodeKind::End)
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Check whether a node with this id exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.find_node(id).is_some()
    }

    /// Check whether any node already has the given kind
    pub fn contains_kind(&self, kind: NodeKind) -> bool {
        self.nodes.iter().any(|n| n.kind == kind)
    }

    /// Whether both fixed endpoints are present exactly once
    pub fn has_terminals(&self) -> bool {
        let count = |kind| self.nodes.iter().filter(|n| n.kind == kind).count();
        count(NodeKind::Start) == 1 && count(NodeKind::End) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_graph_shape() {
        let graph = WorkflowGraph::with_defaults(200.0);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "start-end");
        assert_eq!(graph.end_node().unwrap().position, Position::new(0.0, 200.0));
        assert!(graph.has_terminals());
    }

    #[test]
    fn test_kind_wire_names() {
        let node: GraphNode = serde_json::from_value(serde_json::json!({
            "id": "2",
            "type": "api",
            "position": {"x": 1.0, "y": 2.0},
            "data": {"label": "Call"}
        }))
        .unwrap();
        assert_eq!(node.kind, NodeKind::ApiCall);

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "apicall");
        assert_eq!(
            serde_json::to_value(NodeKind::TextBox).unwrap(),
            serde_json::json!("textbox")
        );
    }

    #[test]
    fn test_terminals_are_not_deletable() {
        let graph = WorkflowGraph::with_defaults(200.0);
        assert!(graph.nodes.iter().all(|n| !n.is_deletable()));
        assert!(GraphNode::new("email-1", NodeKind::Email, Position::default()).is_deletable());
    }

    #[test]
    fn test_graph_edges() {
        let graph = WorkflowGraph::with_defaults(200.0);
        assert_eq!(graph.outgoing_edges("start").count(), 1);
        assert_eq!(graph.incoming_edges("end").next().unwrap().source, "start");
        assert_eq!(graph.incoming_edges("start").count(), 0);
    }
}
