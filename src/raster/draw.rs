//! Rendering of selections onto the composite frame.

use tiny_skia::{
    BlendMode, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Stroke, Transform,
};

use crate::selection::{Geometry, Selection, Status, ViewSize};
use crate::util;

use super::color::{self, Color};
use super::{LayerCache, RasterError};

/// Colors and stroke metrics for the composite frame.
#[derive(Debug, Clone)]
pub struct DrawStyle {
    /// Fill behind the slice image, visible until the slice arrives.
    pub background: Color,
    /// Stroke color of committed selections.
    pub stroke: Color,
    /// Stroke color of in-progress drafts.
    pub draft: Color,
    /// Fixed color of archived reference overlays, distinct from live work.
    pub archived: Color,
    /// Outline width in canvas pixels.
    pub stroke_width: f32,
    /// Radius of point markers and chain vertex handles.
    pub vertex_radius: f32,
    /// Opacity applied when compositing mask layers.
    pub mask_opacity: f32,
}

impl DrawStyle {
    pub fn color_for(&self, status: Status) -> Color {
        match status {
            Status::Normal => self.stroke,
            Status::Draft => self.draft,
            Status::Archived => self.archived,
        }
    }

    /// Pinned selections draw with a heavier outline.
    pub fn width_for(&self, pinned: bool) -> f32 {
        if pinned {
            self.stroke_width * 1.5
        } else {
            self.stroke_width
        }
    }
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            background: color::BLACK,
            stroke: color::YELLOW,
            draft: color::ORANGE,
            archived: color::GRAY,
            stroke_width: 2.0,
            vertex_radius: 3.5,
            mask_opacity: 0.5,
        }
    }
}

/// Paints the slice image scaled to fill the frame.
pub fn draw_slice(frame: &mut Pixmap, slice: &Pixmap) {
    let paint = PixmapPaint {
        opacity: 1.0,
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    frame.draw_pixmap(0, 0, slice.as_ref(), &paint, fit_transform(frame, slice), None);
}

/// Paints one selection onto the frame.
///
/// Hidden filtering happens at the call site. A mask layer that fails to
/// decode surfaces as a typed error so the caller can log and skip the
/// selection instead of tearing down the whole paint.
pub fn draw_selection(
    frame: &mut Pixmap,
    view: ViewSize,
    selection: &Selection,
    layers: &mut LayerCache,
    style: &DrawStyle,
) -> Result<(), RasterError> {
    let color = style.color_for(selection.status);
    match &selection.geometry {
        Geometry::Point { x, y } => {
            let (px, py) = view.scale_to_view(*x, *y);
            let radius = if selection.pinned {
                style.vertex_radius * 1.5 + 1.5
            } else {
                style.vertex_radius * 1.5
            };
            fill_circle(frame, px as f32, py as f32, radius, color);
        }
        Geometry::Rect {
            x,
            y,
            width,
            height,
        } => {
            let (nx, ny, nw, nh) = util::normalized_rect(*x, *y, *width, *height);
            if nw <= 0.0 || nh <= 0.0 {
                return Ok(());
            }
            let (px, py) = view.scale_to_view(nx, ny);
            let (pw, ph) = (nw * view.width, nh * view.height);
            let mut builder = PathBuilder::new();
            builder.move_to(px as f32, py as f32);
            builder.line_to((px + pw) as f32, py as f32);
            builder.line_to((px + pw) as f32, (py + ph) as f32);
            builder.line_to(px as f32, (py + ph) as f32);
            builder.close();
            if let Some(path) = builder.finish() {
                frame.stroke_path(
                    &path,
                    &solid_paint(color),
                    &stroke_of(style.width_for(selection.pinned)),
                    Transform::identity(),
                    None,
                );
            }
        }
        Geometry::Chain { points, closed } => {
            if points.is_empty() {
                return Ok(());
            }
            if points.len() > 1 {
                let mut builder = PathBuilder::new();
                let (sx, sy) = view.scale_to_view(points[0].0, points[0].1);
                builder.move_to(sx as f32, sy as f32);
                for &(x, y) in &points[1..] {
                    let (vx, vy) = view.scale_to_view(x, y);
                    builder.line_to(vx as f32, vy as f32);
                }
                if *closed {
                    builder.close();
                }
                if let Some(path) = builder.finish() {
                    frame.stroke_path(
                        &path,
                        &solid_paint(color),
                        &stroke_of(style.width_for(selection.pinned)),
                        Transform::identity(),
                        None,
                    );
                }
            }
            // vertex handles keep resumable chains discoverable
            for &(x, y) in points {
                let (vx, vy) = view.scale_to_view(x, y);
                fill_circle(frame, vx as f32, vy as f32, style.vertex_radius, color);
            }
        }
        Geometry::Mask { layer } => {
            let opacity = if selection.status == Status::Archived {
                style.mask_opacity * 0.5
            } else {
                style.mask_opacity
            };
            let Some(mask) = layers.pixmap(*layer)? else {
                return Ok(());
            };
            let paint = PixmapPaint {
                opacity,
                blend_mode: BlendMode::SourceOver,
                quality: FilterQuality::Nearest,
            };
            let transform = fit_transform(frame, mask);
            frame.draw_pixmap(0, 0, mask.as_ref(), &paint, transform, None);
        }
    }
    Ok(())
}

fn fit_transform(frame: &Pixmap, image: &Pixmap) -> Transform {
    if frame.width() == image.width() && frame.height() == image.height() {
        Transform::identity()
    } else {
        Transform::from_scale(
            frame.width() as f32 / image.width() as f32,
            frame.height() as f32 / image.height() as f32,
        )
    }
}

fn fill_circle(frame: &mut Pixmap, x: f32, y: f32, radius: f32, color: Color) {
    let mut builder = PathBuilder::new();
    builder.push_circle(x, y, radius);
    if let Some(path) = builder.finish() {
        frame.fill_path(
            &path,
            &solid_paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn stroke_of(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}
