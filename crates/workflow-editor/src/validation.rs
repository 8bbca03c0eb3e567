//! Graph validation for workflow graphs
//!
//! Validates graph structure: edge references, id uniqueness, the fixed
//! Start/End endpoints and connectivity. The editor does not refuse to hold
//! a graph that fails these checks (arbitrary connects and edge removals can
//! disconnect it); validation reports the problems so the UI can surface
//! them.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{NodeKind, WorkflowGraph};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An edge references a non-existent node
    UnknownNode { edge_id: String, node_id: String },
    /// Two nodes share an id
    DuplicateNodeId { node_id: String },
    /// Two edges share an id
    DuplicateEdgeId { edge_id: String },
    /// Graph has no Start node
    MissingStartNode,
    /// Graph has more than one Start node
    MultipleStartNodes,
    /// Graph has no End node
    MissingEndNode,
    /// Graph has more than one End node
    MultipleEndNodes,
    /// A node has no connections (orphaned)
    OrphanedNode { node_id: String },
    /// No path leads from Start to End
    EndUnreachable,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge_id, node_id)
            }
            Self::DuplicateNodeId { node_id } => write!(f, "Node id '{}' is used more than once", node_id),
            Self::DuplicateEdgeId { edge_id } => write!(f, "Edge id '{}' is used more than once", edge_id),
            Self::MissingStartNode => write!(f, "Graph has no Start node"),
            Self::MultipleStartNodes => write!(f, "Graph has multiple Start nodes"),
            Self::MissingEndNode => write!(f, "Graph has no End node"),
            Self::MultipleEndNodes => write!(f, "Graph has multiple End nodes"),
            Self::OrphanedNode { node_id } => write!(f, "Node '{}' has no connections", node_id),
            Self::EndUnreachable => write!(f, "End cannot be reached from Start"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Whether this problem makes the graph unusable for editing
    ///
    /// Connectivity problems are tolerated; a graph without its fixed
    /// endpoints, with dangling edges or with clashing ids is not.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::OrphanedNode { .. } | Self::EndUnreachable)
    }
}

/// Validate a workflow graph
///
/// Returns all validation errors found (not just the first).
pub fn validate_graph(graph: &WorkflowGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_unique_ids(graph, &mut errors);
    validate_edge_references(graph, &mut errors);
    validate_start_end_presence(graph, &mut errors);
    detect_orphans(graph, &mut errors);
    validate_end_reachable(graph, &mut errors);

    errors
}

/// Validate only the problems that make a graph unusable for editing
pub fn validate_structure(graph: &WorkflowGraph) -> Vec<ValidationError> {
    validate_graph(graph)
        .into_iter()
        .filter(ValidationError::is_structural)
        .collect()
}

fn validate_unique_ids(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for edge in &graph.edges {
        if !seen.insert(edge.id.as_str()) {
            errors.push(ValidationError::DuplicateEdgeId {
                edge_id: edge.id.clone(),
            });
        }
    }
}

/// Check that all edge source/target nodes exist
fn validate_edge_references(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &graph.edges {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }
        if !node_ids.contains(edge.target.as_str()) {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            });
        }
    }
}

fn validate_start_end_presence(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let starts = graph.nodes.iter().filter(|n| n.kind == NodeKind::Start).count();
    let ends = graph.nodes.iter().filter(|n| n.kind == NodeKind::End).count();

    match starts {
        0 => errors.push(ValidationError::MissingStartNode),
        1 => {}
        _ => errors.push(ValidationError::MultipleStartNodes),
    }
    match ends {
        0 => errors.push(ValidationError::MissingEndNode),
        1 => {}
        _ => errors.push(ValidationError::MultipleEndNodes),
    }
}

fn detect_orphans(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let mut degree: HashMap<&str, usize> = graph.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    for edge in &graph.edges {
        if let Some(d) = degree.get_mut(edge.source.as_str()) {
            *d += 1;
        }
        if let Some(d) = degree.get_mut(edge.target.as_str()) {
            *d += 1;
        }
    }

    // Report in render order for stable output
    for node in &graph.nodes {
        if degree.get(node.id.as_str()) == Some(&0) {
            errors.push(ValidationError::OrphanedNode {
                node_id: node.id.clone(),
            });
        }
    }
}

/// Breadth-first search from Start along edge direction
fn validate_end_reachable(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let (Some(start), Some(end)) = (graph.start_node(), graph.end_node()) else {
        // Already reported as a missing endpoint
        return;
    };

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(&start.id);
    queue.push_back(&start.id);

    while let Some(node_id) = queue.pop_front() {
        if node_id == end.id {
            return;
        }
        for edge in graph.outgoing_edges(node_id) {
            if visited.insert(&edge.target) {
                queue.push_back(&edge.target);
            }
        }
    }

    errors.push(ValidationError::EndUnreachable);
}
