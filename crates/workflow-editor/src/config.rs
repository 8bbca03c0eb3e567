//! Configuration types for the workflow editor

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Default values for editor configuration
pub mod defaults {
    /// Vertical room made below an inserted node
    pub const SPACING: f64 = 100.0;
    /// Rendered width of a step node
    pub const NODE_WIDTH: f64 = 300.0;
    /// Rendered height of a step node
    pub const NODE_HEIGHT: f64 = 64.0;
    /// Y position of the End node in a new graph
    pub const END_OFFSET: f64 = 200.0;
    /// History entries kept before the oldest are dropped
    pub const MAX_HISTORY: usize = 100;
    /// Delay before a save confirmation is dismissed
    pub const SUCCESS_DISMISS_MS: u64 = 1500;
    /// Written to the `editor` field of saved workflows
    pub const EDITOR_NAME: &str = "Current User";

    pub const ZOOM_INITIAL: f64 = 0.25;
    pub const ZOOM_MIN: f64 = 0.1;
    pub const ZOOM_MAX: f64 = 2.0;
    pub const ZOOM_STEP: f64 = 0.1;
    pub const FIT_MIN_ZOOM: f64 = 0.25;
    pub const FIT_MAX_ZOOM: f64 = 1.0;
    pub const FIT_PADDING: f64 = 0.5;
}

/// Zoom behavior of the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoomConfig {
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Lower bound applied when fitting all nodes into view
    pub fit_min: f64,
    /// Upper bound applied when fitting all nodes into view
    pub fit_max: f64,
    /// Fraction of the viewport left empty around fitted nodes
    pub fit_padding: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            initial: defaults::ZOOM_INITIAL,
            min: defaults::ZOOM_MIN,
            max: defaults::ZOOM_MAX,
            step: defaults::ZOOM_STEP,
            fit_min: defaults::FIT_MIN_ZOOM,
            fit_max: defaults::FIT_MAX_ZOOM,
            fit_padding: defaults::FIT_PADDING,
        }
    }
}

impl ZoomConfig {
    /// Clamp a zoom value into the allowed range
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Vertical shift applied to nodes below an insertion point
    pub spacing: f64,
    pub node_width: f64,
    pub node_height: f64,
    /// Y position of the End node in the default graph
    pub default_end_offset: f64,
    /// Maximum number of history entries
    pub max_history: usize,
    /// Allow each step kind at most once per graph
    pub single_use_kinds: bool,
    pub zoom: ZoomConfig,
    pub success_dismiss_ms: u64,
    pub editor_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            spacing: defaults::SPACING,
            node_width: defaults::NODE_WIDTH,
            node_height: defaults::NODE_HEIGHT,
            default_end_offset: defaults::END_OFFSET,
            max_history: defaults::MAX_HISTORY,
            single_use_kinds: true,
            zoom: ZoomConfig::default(),
            success_dismiss_ms: defaults::SUCCESS_DISMISS_MS,
            editor_name: defaults::EDITOR_NAME.to_string(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: EditorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Reject values the editor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(EditorError::config("maxHistory must be at least 1"));
        }
        if self.zoom.min <= 0.0 || self.zoom.min > self.zoom.max {
            return Err(EditorError::config(format!(
                "zoom range [{}, {}] is empty",
                self.zoom.min, self.zoom.max
            )));
        }
        if self.zoom.fit_min > self.zoom.fit_max {
            return Err(EditorError::config("zoom.fitMin exceeds zoom.fitMax"));
        }
        if !self.spacing.is_finite() || self.spacing < 0.0 {
            return Err(EditorError::config("spacing must be a non-negative number"));
        }
        Ok(())
    }

    /// How long a save confirmation stays visible
    pub fn success_dismiss(&self) -> Duration {
        Duration::from_millis(self.success_dismiss_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.spacing, 100.0);
        assert_eq!(config.success_dismiss(), Duration::from_millis(1500));
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("editor.json");
        std::fs::write(&path, r#"{"spacing": 80, "zoom": {"max": 3.0}, "editorName": "Ada"}"#).unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.spacing, 80.0);
        assert_eq!(config.zoom.max, 3.0);
        assert_eq!(config.zoom.min, defaults::ZOOM_MIN);
        assert_eq!(config.editor_name, "Ada");
        assert_eq!(config.max_history, defaults::MAX_HISTORY);
    }

    #[test]
    fn test_load_rejects_zero_history() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("editor.json");
        std::fs::write(&path, r#"{"maxHistory": 0}"#).unwrap();

        let err = EditorConfig::load(&path).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EditorConfig::load("/nonexistent/editor.json").unwrap_err();
        assert!(matches!(err, EditorError::Io(_)));
    }

    #[test]
    fn test_zoom_clamp() {
        let zoom = ZoomConfig::default();
        assert_eq!(zoom.clamp(5.0), 2.0);
        assert_eq!(zoom.clamp(0.0), 0.1);
        assert_eq!(zoom.clamp(0.5), 0.5);
    }
}
