//! Layout Catalog: read-only registry of page templates and their frame geometry.
//!
//! Loaded once at startup (bundled JSON or `LAYOUT_CATALOG_PATH`) and shared as
//! `Arc<LayoutCatalog>`. Nothing mutates it after construction.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const BUNDLED_CATALOG: &str = include_str!("../../catalog/layouts.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Layout not found: {0}")]
    LayoutNotFound(String),

    #[error("Invalid layout catalog: {0}")]
    Invalid(String),

    #[error("Failed to read layout catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse layout catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// A single photo slot. `index` is 1-based and unique within its layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "id")]
    pub index: usize,
    #[serde(rename = "aspect_ratio")]
    pub target_aspect_ratio: f64,
    /// Fraction of the page covered by this frame (0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualImpact {
    Dramatic,
    Balanced,
    Subtle,
}

/// A named page template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub name: String,
    pub frame_count: usize,
    pub frames: Vec<Frame>,
    pub orientation: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<LayoutPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_impact: Option<VisualImpact>,
}

impl Layout {
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.iter().find(|f| f.index == index)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    fallback: String,
    layouts: Vec<LayoutRecord>,
}

#[derive(Debug, Deserialize)]
struct LayoutRecord {
    name: String,
    #[serde(default)]
    orientation: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<LayoutPriority>,
    #[serde(default)]
    visual_impact: Option<VisualImpact>,
    frames: Vec<Frame>,
}

impl From<LayoutRecord> for Layout {
    fn from(record: LayoutRecord) -> Self {
        Layout {
            name: record.name,
            frame_count: record.frames.len(),
            frames: record.frames,
            orientation: record.orientation.unwrap_or_else(|| "mixed".to_string()),
            description: record.description.unwrap_or_default(),
            priority: record.priority,
            visual_impact: record.visual_impact,
        }
    }
}

/// The catalog itself, plus the frame-count lookup table.
#[derive(Debug, Clone)]
pub struct LayoutCatalog {
    layouts: Vec<Layout>,
    fallback: String,
    /// frame count → layout names in catalog order (fallback first in its bucket).
    by_frame_count: BTreeMap<usize, Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Construction
// ────────────────────────────────────────────────────────────────────────────

impl LayoutCatalog {
    /// Builds a catalog after checking every structural rule. `fallback` must name
    /// a single-frame layout.
    pub fn new(layouts: Vec<Layout>, fallback: impl Into<String>) -> Result<Self, CatalogError> {
        let fallback = fallback.into();

        if layouts.is_empty() {
            return Err(CatalogError::Invalid("catalog has no layouts".to_string()));
        }

        let mut names = HashSet::new();
        for layout in &layouts {
            if !names.insert(layout.name.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate layout name '{}'",
                    layout.name
                )));
            }
            validate_frames(layout)?;
        }

        let fallback_layout = layouts
            .iter()
            .find(|l| l.name == fallback)
            .ok_or_else(|| {
                CatalogError::Invalid(format!("fallback layout '{fallback}' is not in the catalog"))
            })?;
        if fallback_layout.frame_count != 1 {
            return Err(CatalogError::Invalid(format!(
                "fallback layout '{fallback}' must have exactly 1 frame, has {}",
                fallback_layout.frame_count
            )));
        }

        let mut by_frame_count: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        by_frame_count
            .entry(1)
            .or_default()
            .push(fallback.clone());
        for layout in &layouts {
            if layout.name != fallback {
                by_frame_count
                    .entry(layout.frame_count)
                    .or_default()
                    .push(layout.name.clone());
            }
        }

        Ok(Self {
            layouts,
            fallback,
            by_frame_count,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let layouts = file.layouts.into_iter().map(Layout::from).collect();
        Self::new(layouts, file.fallback)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        info!(
            "Loaded {} layouts from {}",
            catalog.layouts.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json_str(BUNDLED_CATALOG)
    }
}

fn validate_frames(layout: &Layout) -> Result<(), CatalogError> {
    if layout.frames.is_empty() {
        return Err(CatalogError::Invalid(format!(
            "layout '{}' has no frames",
            layout.name
        )));
    }

    let mut indices: Vec<usize> = layout.frames.iter().map(|f| f.index).collect();
    indices.sort_unstable();
    if indices.iter().enumerate().any(|(i, &idx)| idx != i + 1) {
        return Err(CatalogError::Invalid(format!(
            "layout '{}' frames must be numbered 1..={}",
            layout.name,
            layout.frames.len()
        )));
    }

    for frame in &layout.frames {
        if !frame.target_aspect_ratio.is_finite() || frame.target_aspect_ratio <= 0.0 {
            return Err(CatalogError::Invalid(format!(
                "layout '{}' frame {} has invalid aspect ratio {}",
                layout.name, frame.index, frame.target_aspect_ratio
            )));
        }
        if let Some(area) = frame.area {
            if !(area > 0.0 && area <= 1.0) {
                return Err(CatalogError::Invalid(format!(
                    "layout '{}' frame {} has area {} outside (0, 1]",
                    layout.name, frame.index, area
                )));
            }
        }
    }

    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Lookups
// ────────────────────────────────────────────────────────────────────────────

impl LayoutCatalog {
    pub fn list_layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn get_layout(&self, name: &str) -> Result<&Layout, CatalogError> {
        self.layouts
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| CatalogError::LayoutNotFound(name.to_string()))
    }

    pub fn fallback_layout(&self) -> &Layout {
        // `new` guarantees the fallback is present.
        self.layouts
            .iter()
            .find(|l| l.name == self.fallback)
            .unwrap_or(&self.layouts[0])
    }

    /// Best-match layout for exactly `frame_count` frames.
    ///
    /// Exact matches win; otherwise the numerically closest frame count is used,
    /// ties going to the smaller count. Within a count the first table entry wins.
    pub fn find_layout_for_frame_count(&self, frame_count: usize) -> &str {
        if let Some(names) = self.by_frame_count.get(&frame_count) {
            if let Some(first) = names.first() {
                return first;
            }
        }

        self.by_frame_count
            .iter()
            .min_by_key(|(count, _)| (count.abs_diff(frame_count), **count))
            .and_then(|(_, names)| names.first())
            .map(String::as_str)
            .unwrap_or(self.fallback.as_str())
    }
}

#[cfg(test)]
impl Layout {
    /// Test helper: a layout whose frames have the given target ratios and no area.
    pub fn with_ratios(name: &str, ratios: &[f64]) -> Self {
        Layout {
            name: name.to_string(),
            frame_count: ratios.len(),
            frames: ratios
                .iter()
                .enumerate()
                .map(|(i, &r)| Frame {
                    index: i + 1,
                    target_aspect_ratio: r,
                    area: None,
                })
                .collect(),
            orientation: "mixed".to_string(),
            description: String::new(),
            priority: None,
            visual_impact: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
