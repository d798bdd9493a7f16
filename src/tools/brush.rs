//! Brush tool: paint and erase raster masks.
//!
//! At most one brush mask exists per (tag, slice) pair. When a cached layer
//! already covers the current pair, strokes edit its pixels in place and the
//! selection id never changes, so repainting announces nothing new. Without
//! a layer, strokes build up on a scratch canvas that becomes a selection at
//! mouse-up, unless nothing survived on it.
//!
//! The eraser composite mode carves pixels out of an existing layer. It is
//! only available while such a layer exists; moving to a slice or tag
//! without one reverts the mode to plain painting. A stroke that leaves the
//! layer indistinguishable from a blank canvas deletes the selection.

use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::raster::{self, CompositeOp};
use crate::selection::ViewSize;

use super::{MouseButton, Tool, ToolCtx, ToolKind};

enum StrokeTarget {
    /// Editing the cached layer of an existing mask selection.
    Existing(u64),
    /// Painting onto a scratch canvas that is not a selection yet.
    Fresh(Pixmap),
}

struct StrokeState {
    target: StrokeTarget,
    last: (f32, f32),
    preview_opacity: f32,
}

pub struct BrushTool {
    mode: CompositeOp,
    stroke: Option<StrokeState>,
}

impl BrushTool {
    pub fn new() -> Self {
        Self {
            mode: CompositeOp::Brush,
            stroke: None,
        }
    }

    pub fn mode(&self) -> CompositeOp {
        self.mode
    }

    /// Switches composite mode. The eraser needs a cached layer for the
    /// current (tag, slice) pair; without one the request is refused.
    pub fn set_mode(&mut self, ctx: &mut ToolCtx<'_>, mode: CompositeOp) -> bool {
        if mode == CompositeOp::Eraser && cached_mask(ctx).is_none() {
            log::debug!(
                "eraser refused: no cached layer for tag '{}' on slice {}",
                ctx.tag,
                ctx.slice_index
            );
            return false;
        }
        self.mode = mode;
        true
    }

    fn paint(&mut self, ctx: &mut ToolCtx<'_>, to: (f32, f32)) {
        let mode = self.mode;
        let width = ctx.options.brush_width;
        let color = ctx.options.brush_color;
        let Some(stroke) = &mut self.stroke else {
            return;
        };
        let from = stroke.last;
        stroke.last = to;
        match &mut stroke.target {
            StrokeTarget::Existing(id) => match ctx.layers.pixmap_mut(*id) {
                Ok(Some(pixmap)) => raster::stroke_segment(pixmap, from, to, width, color, mode),
                Ok(None) => {}
                Err(err) => log::warn!("brush stroke skipped: {err}"),
            },
            StrokeTarget::Fresh(pixmap) => {
                raster::stroke_segment(pixmap, from, to, width, color, mode);
            }
        }
        ctx.redraw.mark();
    }

    fn finalize(&mut self, ctx: &mut ToolCtx<'_>) {
        let Some(stroke) = self.stroke.take() else {
            return;
        };
        match stroke.target {
            StrokeTarget::Existing(id) => {
                let blank = match ctx.layers.pixmap(id) {
                    Ok(Some(pixmap)) => raster::is_blank(pixmap),
                    Ok(None) => true,
                    Err(err) => {
                        log::warn!("mask {id} unreadable at stroke end: {err}");
                        false
                    }
                };
                if blank {
                    ctx.store.remove(id);
                    ctx.layers.remove(id);
                    self.mode = CompositeOp::Brush;
                }
            }
            StrokeTarget::Fresh(pixmap) => {
                if !raster::is_blank(&pixmap) {
                    let id = ctx.store.add_mask(ctx.slice_index, ctx.tag);
                    ctx.layers.insert_pixmap(id, pixmap);
                }
            }
        }
        ctx.redraw.mark();
    }
}

impl Default for BrushTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for BrushTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Brush
    }

    fn on_mouse_down(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64, button: MouseButton) {
        if button != MouseButton::Primary || self.stroke.is_some() {
            return;
        }
        let target = match cached_mask(ctx) {
            Some(id) => StrokeTarget::Existing(id),
            None => {
                if self.mode == CompositeOp::Eraser {
                    log::debug!("eraser reverting to brush: nothing to erase");
                    self.mode = CompositeOp::Brush;
                }
                match raster::new_canvas(ctx.view.width as u32, ctx.view.height as u32) {
                    Ok(canvas) => StrokeTarget::Fresh(canvas),
                    Err(err) => {
                        log::warn!("brush stroke not started: {err}");
                        return;
                    }
                }
            }
        };
        let point = (x as f32, y as f32);
        self.stroke = Some(StrokeState {
            target,
            last: point,
            preview_opacity: ctx.options.mask_opacity,
        });
        self.paint(ctx, point);
    }

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64) {
        if self.stroke.is_some() {
            self.paint(ctx, (x as f32, y as f32));
        }
    }

    fn on_mouse_up(&mut self, ctx: &mut ToolCtx<'_>, _x: f64, _y: f64, button: MouseButton) {
        if button == MouseButton::Primary {
            self.finalize(ctx);
        }
    }

    fn draw_overlay(&self, frame: &mut Pixmap, _view: ViewSize) {
        let Some(StrokeState {
            target: StrokeTarget::Fresh(pixmap),
            preview_opacity,
            ..
        }) = &self.stroke
        else {
            return;
        };
        let paint = PixmapPaint {
            opacity: *preview_opacity,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Nearest,
        };
        frame.draw_pixmap(0, 0, pixmap.as_ref(), &paint, Transform::identity(), None);
    }

    fn can_change_slice(&self) -> bool {
        self.stroke.is_none()
    }

    /// Finalizes an open stroke, then drops the eraser mode if the new
    /// (tag, slice) pair has no cached layer to erase.
    fn on_tool_change(&mut self, ctx: &mut ToolCtx<'_>) {
        self.finalize(ctx);
        if self.mode == CompositeOp::Eraser && cached_mask(ctx).is_none() {
            log::debug!(
                "eraser reverting to brush: no cached layer for tag '{}' on slice {}",
                ctx.tag,
                ctx.slice_index
            );
            self.mode = CompositeOp::Brush;
        }
    }
}

fn cached_mask(ctx: &ToolCtx<'_>) -> Option<u64> {
    ctx.store
        .mask_on(ctx.slice_index, ctx.tag)
        .filter(|id| ctx.layers.contains(*id))
}
