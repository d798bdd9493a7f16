//! Mapping between normalized selection space and canvas pixels.
//!
//! Selections store coordinates in `[0, 1]` relative to the canvas so they
//! survive canvas resizes and can be replayed onto any view. The two
//! projections here are exact inverses of each other up to floating point
//! tolerance and carry no state beyond the current canvas dimensions.

/// Current canvas dimensions used to project normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSize {
    pub width: f64,
    pub height: f64,
}

impl ViewSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Projects normalized `[0, 1]` coordinates into canvas pixels.
    pub fn scale_to_view(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.width, y * self.height)
    }

    /// Maps canvas pixels back into normalized `[0, 1]` coordinates.
    ///
    /// Exact inverse of [`ViewSize::scale_to_view`].
    pub fn normalize_by_view(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.width, y / self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_maps_unit_square_to_canvas() {
        let view = ViewSize::new(800.0, 600.0);
        assert_eq!(view.scale_to_view(0.0, 0.0), (0.0, 0.0));
        assert_eq!(view.scale_to_view(1.0, 1.0), (800.0, 600.0));
        assert_eq!(view.scale_to_view(0.5, 0.5), (400.0, 300.0));
    }

    #[test]
    fn projections_are_inverse() {
        let view = ViewSize::new(1024.0, 768.0);
        for &(x, y) in &[(0.0, 0.0), (0.25, 0.75), (0.33, 0.91), (1.0, 1.0)] {
            let (px, py) = view.scale_to_view(x, y);
            let (nx, ny) = view.normalize_by_view(px, py);
            assert!((nx - x).abs() < 1e-9, "x round trip drifted: {nx} vs {x}");
            assert!((ny - y).abs() < 1e-9, "y round trip drifted: {ny} vs {y}");
        }
    }
}
