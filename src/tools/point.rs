//! Point tool: drop or drag landmark points.
//!
//! A press that lands within the hit radius of an existing point picks that
//! point up for dragging; no new selection appears and nothing is announced.
//! A miss creates and commits a point at the click position in one step.
//! The fresh point is not picked up for dragging; grabbing it takes a second
//! press.

use crate::selection::Geometry;

use super::{MouseButton, Tool, ToolCtx, ToolKind};

pub struct PointTool {
    dragging: Option<u64>,
}

impl PointTool {
    pub fn new() -> Self {
        Self { dragging: None }
    }
}

impl Default for PointTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for PointTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Point
    }

    fn on_mouse_down(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64, button: MouseButton) {
        if button != MouseButton::Primary {
            return;
        }
        let hit = ctx
            .store
            .on_slice(ctx.slice_index)
            .iter()
            .filter(|selection| selection.is_interactive())
            .find(|selection| {
                selection
                    .geometry
                    .hits_point(ctx.view, x, y, ctx.options.hit_radius)
            })
            .map(|selection| selection.id);
        match hit {
            Some(id) => {
                self.dragging = Some(id);
            }
            None => {
                let (nx, ny) = ctx.normalize(x, y);
                ctx.store
                    .add(ctx.slice_index, ctx.tag, Geometry::Point { x: nx, y: ny });
                ctx.redraw.mark();
            }
        }
    }

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64) {
        let Some(id) = self.dragging else {
            return;
        };
        let (nx, ny) = ctx.normalize(x, y);
        ctx.store.update_geometry(id, Geometry::Point { x: nx, y: ny });
        ctx.redraw.mark();
    }

    fn on_mouse_up(&mut self, _ctx: &mut ToolCtx<'_>, _x: f64, _y: f64, _button: MouseButton) {
        self.dragging = None;
    }

    fn can_change_slice(&self) -> bool {
        self.dragging.is_none()
    }

    fn on_tool_change(&mut self, _ctx: &mut ToolCtx<'_>) {
        self.dragging = None;
    }
}
