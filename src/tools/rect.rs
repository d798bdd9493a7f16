//! Rectangle tool: drag out an axis-aligned region.
//!
//! Mouse-down stages a zero-sized draft immediately so the rectangle is
//! visible from the first frame. While dragging, width and height stay
//! signed relative to the anchor corner. Mouse-up commits, except when
//! either dimension is still zero: the draft then vanishes silently and the
//! net selection count is unchanged.

use crate::selection::Geometry;

use super::{MouseButton, Tool, ToolCtx, ToolKind};

#[derive(Debug, Clone, Copy)]
enum RectState {
    Idle,
    Dragging { id: u64, anchor: (f64, f64) },
}

pub struct RectangleTool {
    state: RectState,
}

impl RectangleTool {
    pub fn new() -> Self {
        Self {
            state: RectState::Idle,
        }
    }

    fn finalize(&mut self, ctx: &mut ToolCtx<'_>) {
        let RectState::Dragging { id, .. } = self.state else {
            return;
        };
        self.state = RectState::Idle;
        let dims = match ctx.store.get(id).map(|s| &s.geometry) {
            Some(Geometry::Rect { width, height, .. }) => Some((*width, *height)),
            _ => None,
        };
        match dims {
            Some((width, height)) if width != 0.0 && height != 0.0 => {
                ctx.store.commit(id);
            }
            Some(_) => {
                ctx.store.discard(id);
            }
            // the draft disappeared underneath us, e.g. a bulk clear
            None => {}
        }
        ctx.redraw.mark();
    }
}

impl Default for RectangleTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for RectangleTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Rectangle
    }

    fn on_mouse_down(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64, button: MouseButton) {
        if button != MouseButton::Primary || !matches!(self.state, RectState::Idle) {
            return;
        }
        let (nx, ny) = ctx.normalize(x, y);
        let id = ctx.store.stage(
            ctx.slice_index,
            ctx.tag,
            Geometry::Rect {
                x: nx,
                y: ny,
                width: 0.0,
                height: 0.0,
            },
        );
        self.state = RectState::Dragging {
            id,
            anchor: (nx, ny),
        };
        ctx.redraw.mark();
    }

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64) {
        let RectState::Dragging { id, anchor } = self.state else {
            return;
        };
        let (nx, ny) = ctx.normalize(x, y);
        ctx.store.update_geometry(
            id,
            Geometry::Rect {
                x: anchor.0,
                y: anchor.1,
                width: nx - anchor.0,
                height: ny - anchor.1,
            },
        );
        ctx.redraw.mark();
    }

    fn on_mouse_up(&mut self, ctx: &mut ToolCtx<'_>, _x: f64, _y: f64, button: MouseButton) {
        if button == MouseButton::Primary {
            self.finalize(ctx);
        }
    }

    fn can_change_slice(&self) -> bool {
        matches!(self.state, RectState::Idle)
    }

    fn on_tool_change(&mut self, ctx: &mut ToolCtx<'_>) {
        self.finalize(ctx);
    }
}
