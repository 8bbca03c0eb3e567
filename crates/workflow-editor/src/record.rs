//! Persisted workflow records.
//!
//! The backend owns these; the editor only converts between a record and the
//! graph it edits.

use serde::{Deserialize, Serialize};

use crate::types::{GraphEdge, GraphNode, NodeData, NodeKind, Position, WorkflowGraph};

/// Last known execution outcome of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Passed,
    Failed,
    #[default]
    Pending,
}

/// A step as stored in a workflow record.
///
/// Older records may omit `data`; the label then comes from the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
}

impl From<WorkflowStep> for GraphNode {
    fn from(step: WorkflowStep) -> Self {
        let data = step.data.unwrap_or_else(|| NodeData {
            label: step.kind.label().to_string(),
        });
        GraphNode {
            id: step.id,
            kind: step.kind,
            position: step.position,
            data,
        }
    }
}

impl From<&GraphNode> for WorkflowStep {
    fn from(node: &GraphNode) -> Self {
        WorkflowStep {
            id: node.id.clone(),
            kind: node.kind,
            position: node.position,
            data: Some(node.data.clone()),
        }
    }
}

/// A complete persisted workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowStep>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub last_edited: String,
    #[serde(default)]
    pub editor: String,
    #[serde(default)]
    pub status: WorkflowStatus,
}

impl WorkflowRecord {
    /// The editable graph stored in this record, if it has one.
    ///
    /// Records without nodes yield `None` so callers can fall back to the
    /// default graph.
    pub fn graph(&self) -> Option<WorkflowGraph> {
        if self.nodes.is_empty() {
            return None;
        }
        Some(WorkflowGraph::new(
            self.nodes.iter().cloned().map(GraphNode::from).collect(),
            self.edges.clone(),
        ))
    }
}

/// Partial update sent with PATCH. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<String>,
}

/// Result of listing workflows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowList {
    pub workflows: Vec<WorkflowRecord>,
    pub total: usize,
}

impl From<Vec<WorkflowRecord>> for WorkflowList {
    fn from(workflows: Vec<WorkflowRecord>) -> Self {
        let total = workflows.len();
        Self { workflows, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_data_gets_labels() {
        let record: WorkflowRecord = serde_json::from_value(serde_json::json!({
            "id": "494",
            "name": "Customer Onboarding Process",
            "description": "Handles new customer registration",
            "lastEdited": "Zubin Khanna | 22:43 IST - 28/05",
            "editor": "Zubin Khanna",
            "status": "passed",
            "nodes": [
                {"id": "1", "type": "start", "position": {"x": 250, "y": 5}},
                {"id": "2", "type": "end", "position": {"x": 250, "y": 200}}
            ],
            "edges": [{"id": "e1-2", "source": "1", "target": "2", "type": "buttonedge"}]
        }))
        .unwrap();

        assert_eq!(record.status, WorkflowStatus::Passed);
        let graph = record.graph().unwrap();
        assert_eq!(graph.nodes[0].data.label, "Start");
        assert_eq!(graph.nodes[1].position, Position::new(250.0, 200.0));
        assert_eq!(graph.edges[0], GraphEdge::new("e1-2", "1", "2"));
    }

    #[test]
    fn test_condition_steps_survive_a_round_trip() {
        let value = serde_json::json!({
            "id": "12",
            "name": "Approval routing",
            "nodes": [
                {"id": "1", "type": "start", "position": {"x": 0, "y": 0}},
                {"id": "2", "type": "condition", "position": {"x": 0, "y": 100}},
                {"id": "3", "type": "end", "position": {"x": 0, "y": 200}}
            ],
            "edges": [
                {"id": "e1-2", "source": "1", "target": "2"},
                {"id": "e2-3", "source": "2", "target": "3"}
            ]
        });
        let record: WorkflowRecord = serde_json::from_value(value).unwrap();

        let graph = record.graph().unwrap();
        assert_eq!(graph.nodes[1].kind, NodeKind::Condition);
        assert_eq!(graph.nodes[1].data.label, "Condition");
        assert!(graph.nodes[1].is_deletable());

        let written = serde_json::to_value(&record).unwrap();
        assert_eq!(written["nodes"][1]["type"], "condition");
    }

    #[test]
    fn test_unknown_step_kind_is_rejected() {
        let result: Result<WorkflowRecord, _> = serde_json::from_value(serde_json::json!({
            "id": "13",
            "name": "Mystery",
            "nodes": [{"id": "1", "type": "webhook", "position": {"x": 0, "y": 0}}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_record_has_no_graph() {
        let record: WorkflowRecord =
            serde_json::from_value(serde_json::json!({"id": "7", "name": "Empty"})).unwrap();
        assert!(record.graph().is_none());
        assert_eq!(record.status, WorkflowStatus::Pending);
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = WorkflowPatch {
            status: Some(WorkflowStatus::Failed),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"status": "failed"})
        );
    }

    #[test]
    fn test_list_total() {
        let list = WorkflowList::from(Vec::new());
        assert_eq!(list.total, 0);
    }
}
