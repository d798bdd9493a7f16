//! Selection definitions for slice annotations.

use crate::tools::ToolKind;
use crate::util;

use super::view::ViewSize;

/// Lifecycle state of a stored selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Committed and visible in the explorer list.
    Normal,
    /// Gesture in progress; rendered but not yet announced.
    Draft,
    /// Read-only reference overlay from an earlier session.
    Archived,
}

/// Geometry payload of a selection.
///
/// Each variant belongs to the tool that creates it. Positional fields are
/// normalized to `[0, 1]` relative to the canvas, so selections stay valid
/// when the canvas is resized.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Single landmark point.
    Point {
        /// Normalized horizontal position.
        x: f64,
        /// Normalized vertical position.
        y: f64,
    },
    /// Axis-aligned rectangle.
    ///
    /// Width and height stay signed while the drag gesture is in progress
    /// and are origin-corrected at serialization.
    Rect {
        /// Normalized anchor corner, horizontal.
        x: f64,
        /// Normalized anchor corner, vertical.
        y: f64,
        /// Signed normalized width; negative while dragging left of the anchor.
        width: f64,
        /// Signed normalized height; negative while dragging above the anchor.
        height: f64,
    },
    /// Ordered contour of normalized vertices.
    Chain {
        /// Vertices in click order.
        points: Vec<(f64, f64)>,
        /// True when the contour loops back to its first vertex.
        closed: bool,
    },
    /// Raster mask handle.
    ///
    /// The layer key equals the owning selection id and addresses pixel data
    /// in the layer cache; no pixels live in the selection itself.
    Mask {
        /// Layer cache key.
        layer: u64,
    },
}

impl Geometry {
    /// Tool that produces this geometry variant.
    pub fn tool(&self) -> ToolKind {
        match self {
            Geometry::Point { .. } => ToolKind::Point,
            Geometry::Rect { .. } => ToolKind::Rectangle,
            Geometry::Chain { .. } => ToolKind::Chain,
            Geometry::Mask { .. } => ToolKind::Brush,
        }
    }

    /// True when a canvas-space probe lands within `radius` pixels of the
    /// point. Non-point geometry never matches.
    pub fn hits_point(&self, view: ViewSize, px: f64, py: f64, radius: f64) -> bool {
        match self {
            Geometry::Point { x, y } => {
                let (vx, vy) = view.scale_to_view(*x, *y);
                util::distance(vx, vy, px, py) < radius
            }
            _ => false,
        }
    }

    /// Index of the first chain vertex within `radius` pixels of the
    /// canvas-space probe.
    pub fn vertex_near(&self, view: ViewSize, px: f64, py: f64, radius: f64) -> Option<usize> {
        match self {
            Geometry::Chain { points, .. } => points.iter().position(|&(x, y)| {
                let (vx, vy) = view.scale_to_view(x, y);
                util::distance(vx, vy, px, py) < radius
            }),
            _ => None,
        }
    }
}

/// One annotation bound to a slice and tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Session-unique id, allocated by the store.
    pub id: u64,
    /// Index of the slice this annotation belongs to.
    pub slice_index: u32,
    /// Label category, e.g. the structure being outlined.
    pub tag: String,
    /// Pinned rows sort to the top of the explorer list.
    pub pinned: bool,
    /// Hidden selections are skipped by rendering and hit tests.
    pub hidden: bool,
    /// Lifecycle state.
    pub status: Status,
    /// Shape payload.
    pub geometry: Geometry,
}

impl Selection {
    pub fn new(id: u64, slice_index: u32, tag: &str, status: Status, geometry: Geometry) -> Self {
        Self {
            id,
            slice_index,
            tag: tag.to_string(),
            pinned: false,
            hidden: false,
            status,
            geometry,
        }
    }

    /// Tool that owns this selection's geometry.
    pub fn tool(&self) -> ToolKind {
        self.geometry.tool()
    }

    /// True when hit tests may target this selection.
    pub fn is_interactive(&self) -> bool {
        !self.hidden && self.status != Status::Archived
    }
}
