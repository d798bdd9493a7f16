//! Off-screen raster compositing for brush masks.
//!
//! Brush selections own no vector geometry; their pixels live in per-id
//! layers managed here. Layers hold either a decoded pixmap (fresh strokes)
//! or encoded PNG bytes (imported overlays) that decode lazily on first use.

pub mod color;
pub mod draw;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use self::color::Color;

/// Errors from mask decode/encode and canvas allocation.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("canvas dimensions {width}x{height} are unusable")]
    CanvasSize { width: u32, height: u32 },
    #[error("failed to decode mask layer: {0}")]
    Decode(String),
    #[error("failed to encode mask layer: {0}")]
    Encode(String),
}

/// Composite rule applied while stroking a brush segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeOp {
    /// Paint on top of existing pixels.
    Brush,
    /// Carve pixels out of the layer.
    Eraser,
}

impl CompositeOp {
    pub fn blend_mode(self) -> BlendMode {
        match self {
            CompositeOp::Brush => BlendMode::SourceOver,
            CompositeOp::Eraser => BlendMode::DestinationOut,
        }
    }
}

/// Allocates a transparent off-screen canvas.
pub fn new_canvas(width: u32, height: u32) -> Result<Pixmap, RasterError> {
    Pixmap::new(width, height).ok_or(RasterError::CanvasSize { width, height })
}

/// True when no stroke survives on the canvas.
///
/// Freshly allocated pixmaps are zeroed, so an all-zero byte run is exactly
/// the blank-canvas comparison.
pub fn is_blank(pixmap: &Pixmap) -> bool {
    pixmap.data().iter().all(|&byte| byte == 0)
}

/// Paints one stroke segment, including the degenerate zero-length dot.
///
/// Strokes are rasterized without anti-aliasing so an eraser pass over the
/// same path removes exactly the pixels the brush pass laid down.
pub fn stroke_segment(
    pixmap: &mut Pixmap,
    from: (f32, f32),
    to: (f32, f32),
    width: f32,
    color: Color,
    op: CompositeOp,
) {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = false;
    paint.blend_mode = op.blend_mode();

    let mut builder = PathBuilder::new();
    if from == to {
        builder.push_circle(from.0, from.1, width / 2.0);
        if let Some(path) = builder.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    builder.move_to(from.0, from.1);
    builder.line_to(to.0, to.1);
    if let Some(path) = builder.finish() {
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

enum LayerEntry {
    Encoded(Vec<u8>),
    Decoded(Pixmap),
}

/// Cache of brush mask layers keyed by selection id.
pub struct LayerCache {
    layers: HashMap<u64, LayerEntry>,
}

impl LayerCache {
    pub fn new() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }

    pub fn insert_pixmap(&mut self, key: u64, pixmap: Pixmap) {
        self.layers.insert(key, LayerEntry::Decoded(pixmap));
    }

    pub fn insert_png(&mut self, key: u64, bytes: Vec<u8>) {
        self.layers.insert(key, LayerEntry::Encoded(bytes));
    }

    pub fn contains(&self, key: u64) -> bool {
        self.layers.contains_key(&key)
    }

    pub fn remove(&mut self, key: u64) {
        self.layers.remove(&key);
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Decoded layer for drawing. Encoded entries decode on first access; a
    /// decode failure surfaces as a typed error and leaves the entry behind
    /// so the caller can drop or retry it.
    pub fn pixmap(&mut self, key: u64) -> Result<Option<&Pixmap>, RasterError> {
        self.decode_entry(key)?;
        match self.layers.get(&key) {
            Some(LayerEntry::Decoded(pixmap)) => Ok(Some(pixmap)),
            _ => Ok(None),
        }
    }

    /// Mutable decoded layer; brush strokes edit cached layers in place.
    pub fn pixmap_mut(&mut self, key: u64) -> Result<Option<&mut Pixmap>, RasterError> {
        self.decode_entry(key)?;
        match self.layers.get_mut(&key) {
            Some(LayerEntry::Decoded(pixmap)) => Ok(Some(pixmap)),
            _ => Ok(None),
        }
    }

    /// PNG export of a layer, encoding on demand.
    pub fn png_bytes(&self, key: u64) -> Result<Option<Vec<u8>>, RasterError> {
        match self.layers.get(&key) {
            None => Ok(None),
            Some(LayerEntry::Encoded(bytes)) => Ok(Some(bytes.clone())),
            Some(LayerEntry::Decoded(pixmap)) => pixmap
                .encode_png()
                .map(Some)
                .map_err(|err| RasterError::Encode(err.to_string())),
        }
    }

    fn decode_entry(&mut self, key: u64) -> Result<(), RasterError> {
        if let Some(LayerEntry::Encoded(bytes)) = self.layers.get(&key) {
            let pixmap =
                Pixmap::decode_png(bytes).map_err(|err| RasterError::Decode(err.to_string()))?;
            self.layers.insert(key, LayerEntry::Decoded(pixmap));
        }
        Ok(())
    }
}

impl Default for LayerCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_canvas_is_blank() {
        let canvas = new_canvas(32, 32).expect("canvas allocates");
        assert!(is_blank(&canvas));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            new_canvas(0, 32),
            Err(RasterError::CanvasSize { width: 0, .. })
        ));
    }

    #[test]
    fn stroke_then_exact_erase_is_blank() {
        let mut canvas = new_canvas(64, 64).expect("canvas allocates");
        stroke_segment(
            &mut canvas,
            (10.0, 10.0),
            (40.0, 30.0),
            8.0,
            color::RED,
            CompositeOp::Brush,
        );
        assert!(!is_blank(&canvas));
        stroke_segment(
            &mut canvas,
            (10.0, 10.0),
            (40.0, 30.0),
            8.0,
            color::RED,
            CompositeOp::Eraser,
        );
        assert!(is_blank(&canvas));
    }

    #[test]
    fn zero_length_stroke_paints_a_dot() {
        let mut canvas = new_canvas(32, 32).expect("canvas allocates");
        stroke_segment(
            &mut canvas,
            (16.0, 16.0),
            (16.0, 16.0),
            6.0,
            color::RED,
            CompositeOp::Brush,
        );
        assert!(!is_blank(&canvas));
    }

    #[test]
    fn layer_cache_decodes_png_lazily() {
        let mut cache = LayerCache::new();
        let mut source = new_canvas(16, 16).expect("canvas allocates");
        stroke_segment(
            &mut source,
            (4.0, 4.0),
            (12.0, 12.0),
            3.0,
            color::GREEN,
            CompositeOp::Brush,
        );
        let bytes = source.encode_png().expect("encodes");
        cache.insert_png(9, bytes);
        let decoded = cache.pixmap(9).expect("decode succeeds");
        let decoded = decoded.expect("layer present");
        assert_eq!(decoded.width(), 16);
        assert!(!is_blank(decoded));
    }

    #[test]
    fn layer_cache_surfaces_decode_failure() {
        let mut cache = LayerCache::new();
        cache.insert_png(3, vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(cache.pixmap(3), Err(RasterError::Decode(_))));
        // missing keys are not errors
        assert!(matches!(cache.pixmap(44), Ok(None)));
    }

    #[test]
    fn png_bytes_exports_decoded_layers() {
        let mut cache = LayerCache::new();
        cache.insert_pixmap(2, new_canvas(8, 8).expect("canvas allocates"));
        let bytes = cache.png_bytes(2).expect("encode succeeds");
        assert!(bytes.expect("layer present").len() > 8);
        assert!(cache.png_bytes(99).expect("missing is ok").is_none());
    }
}
