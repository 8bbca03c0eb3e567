//! Fit-to-view support
//!
//! Drawing connectors is the renderer's job. The editor only needs to know
//! what zoom makes every node visible, and asks a [`Layout`] for it.

use crate::config::ZoomConfig;
use crate::types::GraphNode;

/// Size of the visible canvas area in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Computes the zoom at which all nodes fit into a viewport
pub trait Layout: Send + Sync {
    fn fit_zoom(&self, nodes: &[GraphNode], viewport: Viewport, zoom: &ZoomConfig) -> f64;
}

/// Fits the bounding box of all nodes, treating each node as a fixed-size box
#[derive(Debug, Clone)]
pub struct BoundsLayout {
    pub node_width: f64,
    pub node_height: f64,
}

impl BoundsLayout {
    pub fn new(node_width: f64, node_height: f64) -> Self {
        Self {
            node_width,
            node_height,
        }
    }
}

impl Layout for BoundsLayout {
    fn fit_zoom(&self, nodes: &[GraphNode], viewport: Viewport, zoom: &ZoomConfig) -> f64 {
        let Some(first) = nodes.first() else {
            return zoom.fit_max;
        };

        let (mut min_x, mut min_y) = (first.position.x, first.position.y);
        let (mut max_x, mut max_y) = (min_x, min_y);
        for node in nodes {
            min_x = min_x.min(node.position.x);
            min_y = min_y.min(node.position.y);
            max_x = max_x.max(node.position.x);
            max_y = max_y.max(node.position.y);
        }

        let width = (max_x - min_x + self.node_width) * (1.0 + zoom.fit_padding);
        let height = (max_y - min_y + self.node_height) * (1.0 + zoom.fit_padding);
        let fitted = (viewport.width / width).min(viewport.height / height);

        if fitted.is_finite() {
            fitted.clamp(zoom.fit_min, zoom.fit_max)
        } else {
            zoom.fit_max
        }
    }
}
