//! Configuration type definitions.

use super::enums::ColorSpec;
use crate::tools::ToolKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canvas dimensions for the annotation view.
///
/// Every slice is letterboxed into a canvas of this size, and all pointer
/// coordinates arriving at the session are interpreted against it.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CanvasConfig {
    /// Canvas width in pixels (valid range: 64 - 4096)
    #[serde(default = "default_canvas_width")]
    pub width: u32,

    /// Canvas height in pixels (valid range: 64 - 4096)
    #[serde(default = "default_canvas_height")]
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

/// Tool defaults applied when a session starts.
///
/// The active tool and tag can be changed at runtime; these only pick the
/// starting values and the geometric thresholds the tools share.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ToolsConfig {
    /// Tool selected when the session opens (point, rectangle, chain, brush)
    #[serde(default = "default_tool")]
    pub default_tool: ToolKind,

    /// Tag assigned to new selections until changed at runtime
    #[serde(default = "default_tag")]
    pub default_tag: String,

    /// Hit-test radius in view pixels for grabbing points and chain vertices
    /// (valid range: 1.0 - 100.0)
    #[serde(default = "default_hit_radius")]
    pub hit_radius: f64,

    /// Brush stroke width in pixels (valid range: 1.0 - 200.0)
    #[serde(default = "default_brush_width")]
    pub brush_width: f32,

    /// Brush paint color - either a named color (red, green, blue, yellow,
    /// orange, pink, gray, white, black) or an RGB array like `[255, 0, 0]`
    #[serde(default = "default_brush_color")]
    pub brush_color: ColorSpec,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            default_tool: default_tool(),
            default_tag: default_tag(),
            hit_radius: default_hit_radius(),
            brush_width: default_brush_width(),
            brush_color: default_brush_color(),
        }
    }
}

/// Slice streaming options.
///
/// Controls how eagerly slice images are fetched from the volume source as
/// the user scrolls through it.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StreamingConfig {
    /// Number of slices requested per fetch batch (valid range: 1 - 64)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Slice index the session opens on; clamped to the volume extent
    #[serde(default)]
    pub initial_slice: u32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            initial_slice: 0,
        }
    }
}

/// Rendering style for committed and in-progress selections.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RenderConfig {
    /// Outline color for committed selections
    #[serde(default = "default_stroke_color")]
    pub stroke_color: ColorSpec,

    /// Outline color for drafts still being dragged out
    #[serde(default = "default_draft_color")]
    pub draft_color: ColorSpec,

    /// Outline color for archived (read-only) selections
    #[serde(default = "default_archive_color")]
    pub archive_color: ColorSpec,

    /// Canvas background color shown behind the slice image
    #[serde(default = "default_background")]
    pub background: ColorSpec,

    /// Opacity applied when compositing brush masks (valid range: 0.0 - 1.0)
    #[serde(default = "default_mask_opacity")]
    pub mask_opacity: f32,

    /// Outline stroke width in pixels (valid range: 0.5 - 20.0)
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    /// Radius of point markers and chain vertex handles in pixels
    /// (valid range: 1.0 - 20.0)
    #[serde(default = "default_vertex_radius")]
    pub vertex_radius: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            stroke_color: default_stroke_color(),
            draft_color: default_draft_color(),
            archive_color: default_archive_color(),
            background: default_background(),
            mask_opacity: default_mask_opacity(),
            stroke_width: default_stroke_width(),
            vertex_radius: default_vertex_radius(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_canvas_width() -> u32 {
    800
}

fn default_canvas_height() -> u32 {
    600
}

fn default_tool() -> ToolKind {
    ToolKind::Rectangle
}

fn default_tag() -> String {
    "region".to_string()
}

fn default_hit_radius() -> f64 {
    10.0
}

fn default_brush_width() -> f32 {
    16.0
}

fn default_brush_color() -> ColorSpec {
    ColorSpec::Name("red".to_string())
}

fn default_batch_size() -> u32 {
    10
}

fn default_stroke_color() -> ColorSpec {
    ColorSpec::Name("yellow".to_string())
}

fn default_draft_color() -> ColorSpec {
    ColorSpec::Name("orange".to_string())
}

fn default_archive_color() -> ColorSpec {
    ColorSpec::Name("gray".to_string())
}

fn default_background() -> ColorSpec {
    ColorSpec::Name("black".to_string())
}

fn default_mask_opacity() -> f32 {
    0.5
}

fn default_stroke_width() -> f32 {
    2.0
}

fn default_vertex_radius() -> f32 {
    3.5
}
