//! Undo/redo history using compressed snapshots
//!
//! Every checkpoint is a complete copy of the graph, serialized to JSON and
//! compressed with zstd. Restoring a checkpoint decodes a fresh graph, so
//! entries can never be aliased by later edits.
//!
//! The history always holds at least one entry (the state the editor was
//! opened with) and the cursor always points at an existing entry.

use std::collections::VecDeque;

use crate::error::{EditorError, Result};
use crate::types::WorkflowGraph;

/// Linear undo/redo history over graph checkpoints
pub struct History {
    /// Compressed graph states (zstd)
    snapshots: VecDeque<Vec<u8>>,
    /// Index of the checkpoint matching the current graph
    cursor: usize,
    /// Maximum number of snapshots to keep
    max_snapshots: usize,
    /// Set while an undo/redo result is being applied
    replaying: bool,
}

impl History {
    /// Create a history whose only checkpoint is `initial`
    pub fn new(initial: &WorkflowGraph, max_snapshots: usize) -> Result<Self> {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(compress(initial)?);
        Ok(Self {
            snapshots,
            cursor: 0,
            max_snapshots: max_snapshots.max(1), // At least 1 snapshot
            replaying: false,
        })
    }

    /// Offer a new checkpoint
    ///
    /// Does nothing (returns `Ok(false)`) while a replay is being applied or
    /// when `graph` equals the checkpoint at the cursor. Otherwise any redo
    /// entries are discarded, the checkpoint is appended and the cursor moves
    /// to it.
    pub fn push(&mut self, graph: &WorkflowGraph) -> Result<bool> {
        if self.replaying {
            log::trace!("Ignoring checkpoint pushed during replay");
            return Ok(false);
        }
        if self.decompress(self.cursor)? == *graph {
            log::trace!("Ignoring checkpoint identical to entry {}", self.cursor);
            return Ok(false);
        }

        let compressed = compress(graph)?;

        // Truncate any redo history
        self.snapshots.truncate(self.cursor + 1);

        self.snapshots.push_back(compressed);
        self.cursor = self.snapshots.len() - 1;

        // Trim old snapshots if over limit
        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }

        Ok(true)
    }

    /// Step back one checkpoint
    ///
    /// Returns the graph to restore, or None at the first entry. The history
    /// stays in replay mode until [`History::finish_replay`] is called.
    pub fn undo(&mut self) -> Option<Result<WorkflowGraph>> {
        if !self.can_undo() {
            return None;
        }
        Some(self.step_to(self.cursor - 1))
    }

    /// Step forward one checkpoint
    ///
    /// Returns the graph to restore, or None at the last entry. The history
    /// stays in replay mode until [`History::finish_replay`] is called.
    pub fn redo(&mut self) -> Option<Result<WorkflowGraph>> {
        if !self.can_redo() {
            return None;
        }
        Some(self.step_to(self.cursor + 1))
    }

    /// Leave replay mode after an undo/redo result has been applied
    pub fn finish_replay(&mut self) {
        self.replaying = false;
    }

    /// Whether an undo/redo result is currently being applied
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Get the checkpoint at the cursor
    pub fn current(&self) -> Result<WorkflowGraph> {
        self.decompress(self.cursor)
    }

    /// Discard every checkpoint and start over from `graph`
    pub fn reset(&mut self, graph: &WorkflowGraph) -> Result<()> {
        let compressed = compress(graph)?;
        self.snapshots.clear();
        self.snapshots.push_back(compressed);
        self.cursor = 0;
        self.replaying = false;
        Ok(())
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Index of the current checkpoint
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: the opening state is never dropped
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get the total compressed size of all snapshots
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(|s| s.len()).sum()
    }

    fn step_to(&mut self, index: usize) -> Result<WorkflowGraph> {
        let graph = self.decompress(index)?;
        self.cursor = index;
        self.replaying = true;
        Ok(graph)
    }

    /// Decompress a snapshot at the given index
    fn decompress(&self, index: usize) -> Result<WorkflowGraph> {
        let compressed = &self.snapshots[index];
        let json = zstd::decode_all(&compressed[..])
            .map_err(|e| EditorError::Compression(e.to_string()))?;
        let graph: WorkflowGraph = serde_json::from_slice(&json)?;
        Ok(graph)
    }
}

fn compress(graph: &WorkflowGraph) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(graph)?;
    zstd::encode_all(&json[..], 3).map_err(|e| EditorError::Compression(e.to_string()))
}
