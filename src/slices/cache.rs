//! Decoded slice images ready for compositing.

use std::collections::HashMap;

use tiny_skia::Pixmap;

use super::types::SliceError;

/// Decodes delivered slice bytes into a render-ready pixmap.
///
/// The source format is whatever the volume ships (PNG in practice); pixels
/// are premultiplied on the way in because the compositor works in
/// premultiplied alpha.
pub fn decode_slice(bytes: &[u8]) -> Result<Pixmap, SliceError> {
    let image = image::load_from_memory(bytes).map_err(|err| SliceError::Image(err.to_string()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| SliceError::Image(format!("slice decodes to unusable {width}x{height}")))?;
    for (pixel, out) in rgba.as_raw().chunks_exact(4).zip(pixmap.pixels_mut()) {
        *out = tiny_skia::ColorU8::from_rgba(pixel[0], pixel[1], pixel[2], pixel[3]).premultiply();
    }
    Ok(pixmap)
}

/// Slice images by index. Deliveries are idempotent: a later arrival for an
/// index simply overwrites the earlier one.
pub struct SliceCache {
    images: HashMap<u32, Pixmap>,
}

impl SliceCache {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
        }
    }

    pub fn insert(&mut self, index: u32, pixmap: Pixmap) {
        self.images.insert(index, pixmap);
    }

    pub fn get(&self, index: u32) -> Option<&Pixmap> {
        self.images.get(&index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.images.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}

impl Default for SliceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::new_canvas;

    fn png_of_size(width: u32, height: u32) -> Vec<u8> {
        new_canvas(width, height)
            .expect("canvas allocates")
            .encode_png()
            .expect("encodes")
    }

    #[test]
    fn decode_slice_reads_png_dimensions() {
        let pixmap = decode_slice(&png_of_size(12, 7)).expect("decodes");
        assert_eq!(pixmap.width(), 12);
        assert_eq!(pixmap.height(), 7);
    }

    #[test]
    fn decode_slice_rejects_garbage() {
        assert!(matches!(
            decode_slice(&[0, 1, 2, 3]),
            Err(SliceError::Image(_))
        ));
    }

    #[test]
    fn later_arrival_overwrites_earlier() {
        let mut cache = SliceCache::new();
        cache.insert(4, decode_slice(&png_of_size(8, 8)).expect("decodes"));
        cache.insert(4, decode_slice(&png_of_size(16, 16)).expect("decodes"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(4).map(|p| p.width()), Some(16));
    }
}
