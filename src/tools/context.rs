//! Shared drawing context handed to tools per event.

use crate::notify::RedrawSignal;
use crate::raster::color::{self, Color};
use crate::raster::LayerCache;
use crate::selection::ViewSize;
use crate::store::SelectionStore;

/// Tunables shared by every tool, derived from configuration.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    /// Hit-test radius in canvas pixels.
    pub hit_radius: f64,
    /// Brush stroke width in canvas pixels.
    pub brush_width: f32,
    /// Brush paint color.
    pub brush_color: Color,
    /// Opacity for compositing mask layers, also used by the stroke preview.
    pub mask_opacity: f32,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            hit_radius: 10.0,
            brush_width: 16.0,
            brush_color: color::RED,
            mask_opacity: 0.5,
        }
    }
}

/// Everything a tool needs to service one pointer event.
///
/// Built fresh per event by the session orchestrator; borrows never outlive
/// the event.
pub struct ToolCtx<'a> {
    /// Current canvas dimensions.
    pub view: ViewSize,
    /// Slice the canvas currently shows.
    pub slice_index: u32,
    /// Active label tag for new selections.
    pub tag: &'a str,
    pub store: &'a mut SelectionStore,
    pub layers: &'a mut LayerCache,
    pub redraw: &'a mut RedrawSignal,
    pub options: &'a ToolOptions,
}

impl ToolCtx<'_> {
    /// Canvas pixels to normalized coordinates.
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        self.view.normalize_by_view(x, y)
    }
}
