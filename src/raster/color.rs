//! RGBA color type and predefined color constants.

/// Represents an RGBA color with floating-point components.
///
/// All components are in the range 0.0 (minimum) to 1.0 (maximum).
///
/// # Examples
///
/// ```
/// use slicemarker::raster::color::Color;
/// let red = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
/// let semi_transparent_blue = Color { r: 0.0, g: 0.0, b: 1.0, a: 0.5 };
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red component (0.0 = no red, 1.0 = full red)
    pub r: f64,
    /// Green component (0.0 = no green, 1.0 = full green)
    pub g: f64,
    /// Blue component (0.0 = no blue, 1.0 = full blue)
    pub b: f64,
    /// Alpha/transparency (0.0 = fully transparent, 1.0 = fully opaque)
    pub a: f64,
}

impl Color {
    /// Creates a new color from RGBA components.
    ///
    /// All values should be in the range 0.0 to 1.0.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Converts to the compositing backend's color type.
    ///
    /// Components are clamped to the valid range first, so a color that
    /// slipped past config validation still produces a usable paint.
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba(
            self.r.clamp(0.0, 1.0) as f32,
            self.g.clamp(0.0, 1.0) as f32,
            self.b.clamp(0.0, 1.0) as f32,
            self.a.clamp(0.0, 1.0) as f32,
        )
        .unwrap_or(tiny_skia::Color::WHITE)
    }
}

/// Maps color name strings to Color values.
///
/// Used by the configuration system to parse color names from the config
/// file. Matching is case-insensitive.
///
/// # Returns
/// - `Some(Color)` if the name matches a predefined color
/// - `None` if the name is not recognized
pub fn name_to_color(name: &str) -> Option<Color> {
    match name.to_lowercase().as_str() {
        "red" => Some(RED),
        "green" => Some(GREEN),
        "blue" => Some(BLUE),
        "yellow" => Some(YELLOW),
        "orange" => Some(ORANGE),
        "pink" => Some(PINK),
        "gray" | "grey" => Some(GRAY),
        "white" => Some(WHITE),
        "black" => Some(BLACK),
        _ => None,
    }
}

// ============================================================================
// Predefined Color Constants
// ============================================================================

/// Predefined red color (R=1.0, G=0.0, B=0.0)
pub const RED: Color = Color {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Predefined green color (R=0.0, G=1.0, B=0.0)
pub const GREEN: Color = Color {
    r: 0.0,
    g: 1.0,
    b: 0.0,
    a: 1.0,
};

/// Predefined blue color (R=0.0, G=0.0, B=1.0)
pub const BLUE: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};

/// Predefined yellow color (R=1.0, G=1.0, B=0.0)
pub const YELLOW: Color = Color {
    r: 1.0,
    g: 1.0,
    b: 0.0,
    a: 1.0,
};

/// Predefined orange color (R=1.0, G=0.5, B=0.0)
pub const ORANGE: Color = Color {
    r: 1.0,
    g: 0.5,
    b: 0.0,
    a: 1.0,
};

/// Predefined pink/magenta color (R=1.0, G=0.0, B=1.0)
pub const PINK: Color = Color {
    r: 1.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};

/// Predefined neutral gray (R=0.6, G=0.6, B=0.6)
pub const GRAY: Color = Color {
    r: 0.6,
    g: 0.6,
    b: 0.6,
    a: 1.0,
};

/// Predefined white color (R=1.0, G=1.0, B=1.0)
pub const WHITE: Color = Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
    a: 1.0,
};

/// Predefined black color (R=0.0, G=0.0, B=0.0)
pub const BLACK: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};
