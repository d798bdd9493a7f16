//! Small geometry helpers shared by hit tests and serialization.

/// Euclidean distance between two points.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Converts a signed drag rectangle into origin/size form.
///
/// Rectangle gestures keep width/height signed while the mouse moves so the
/// anchor corner stays put; serialization and hit tests want the top-left
/// origin with non-negative dimensions.
///
/// # Returns
/// Tuple `(x, y, width, height)` with `width >= 0` and `height >= 0`.
pub fn normalized_rect(x: f64, y: f64, width: f64, height: f64) -> (f64, f64, f64, f64) {
    let (x, width) = if width < 0.0 {
        (x + width, -width)
    } else {
        (x, width)
    };
    let (y, height) = if height < 0.0 {
        (y + height, -height)
    } else {
        (y, height)
    };
    (x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_matches_pythagoras() {
        assert!((distance(0.0, 0.0, 3.0, 4.0) - 5.0).abs() < f64::EPSILON);
        assert_eq!(distance(2.0, 2.0, 2.0, 2.0), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(distance(1.0, 2.0, 5.0, 7.0), distance(5.0, 7.0, 1.0, 2.0));
    }

    #[test]
    fn normalized_rect_corrects_negative_extents() {
        let (x, y, w, h) = normalized_rect(0.8, 0.7, -0.3, -0.2);
        assert!((x - 0.5).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
        assert!((w - 0.3).abs() < 1e-12);
        assert!((h - 0.2).abs() < 1e-12);
    }

    #[test]
    fn normalized_rect_keeps_positive_extents() {
        assert_eq!(
            normalized_rect(0.1, 0.2, 0.3, 0.4),
            (0.1, 0.2, 0.3, 0.4)
        );
    }
}
