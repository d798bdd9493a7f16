//! Wire serialization for selections.
//!
//! Selections cross the process boundary as flat JSON objects discriminated
//! by the `tool` field. Transient gesture state never serializes: rectangles
//! are origin-corrected to non-negative extents, and chains carry their
//! closure flag under the key `loop`. Brush selections ship only the raster
//! layer key; the pixel data travels out of band as encoded PNG bytes.

use serde::{Deserialize, Serialize};

use crate::util;

use super::shape::{Geometry, Selection};

/// Vertex of a serialized chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

/// Selection as shipped to and from the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum WireSelection {
    Point {
        slice_index: u32,
        tag: String,
        x: f64,
        y: f64,
    },
    Rectangle {
        slice_index: u32,
        tag: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Chain {
        slice_index: u32,
        tag: String,
        points: Vec<WirePoint>,
        #[serde(rename = "loop")]
        closed: bool,
    },
    Brush {
        slice_index: u32,
        tag: String,
        /// Key of the raster layer delivered out of band.
        image_key: u64,
    },
}

impl WireSelection {
    /// Serializable snapshot of a stored selection.
    pub fn from_selection(selection: &Selection) -> Self {
        let slice_index = selection.slice_index;
        let tag = selection.tag.clone();
        match &selection.geometry {
            Geometry::Point { x, y } => WireSelection::Point {
                slice_index,
                tag,
                x: *x,
                y: *y,
            },
            Geometry::Rect {
                x,
                y,
                width,
                height,
            } => {
                let (x, y, width, height) = util::normalized_rect(*x, *y, *width, *height);
                WireSelection::Rectangle {
                    slice_index,
                    tag,
                    x,
                    y,
                    width,
                    height,
                }
            }
            Geometry::Chain { points, closed } => WireSelection::Chain {
                slice_index,
                tag,
                points: points.iter().map(|&(x, y)| WirePoint { x, y }).collect(),
                closed: *closed,
            },
            Geometry::Mask { layer } => WireSelection::Brush {
                slice_index,
                tag,
                image_key: *layer,
            },
        }
    }

    /// Splits the envelope back into store-ready parts.
    ///
    /// A brush selection keeps its foreign image key as the mask layer; the
    /// importer re-keys it once the store has allocated a fresh id.
    pub fn into_parts(self) -> (u32, String, Geometry) {
        match self {
            WireSelection::Point {
                slice_index,
                tag,
                x,
                y,
            } => (slice_index, tag, Geometry::Point { x, y }),
            WireSelection::Rectangle {
                slice_index,
                tag,
                x,
                y,
                width,
                height,
            } => (
                slice_index,
                tag,
                Geometry::Rect {
                    x,
                    y,
                    width,
                    height,
                },
            ),
            WireSelection::Chain {
                slice_index,
                tag,
                points,
                closed,
            } => (
                slice_index,
                tag,
                Geometry::Chain {
                    points: points.into_iter().map(|p| (p.x, p.y)).collect(),
                    closed,
                },
            ),
            WireSelection::Brush {
                slice_index,
                tag,
                image_key,
            } => (slice_index, tag, Geometry::Mask { layer: image_key }),
        }
    }
}
