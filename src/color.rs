//! Team colors
//!
//! A plain RGB triple that can live in the config file and be handed to both
//! render backends. The canvas path converts to SDL2 colors with an explicit alpha.

use serde::{Deserialize, Serialize};

/// Three-channel color chosen by match configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Channels scaled to 0.0-1.0, with the given alpha appended (for GL uniforms)
    pub fn to_rgba_f32(self, alpha: f32) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            alpha,
        ]
    }

    /// SDL2 color with an explicit alpha
    pub fn with_alpha(self, alpha: u8) -> sdl2::pixels::Color {
        sdl2::pixels::Color::RGBA(self.r, self.g, self.b, alpha)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Converts an overlay opacity (0.0-1.0) into an 8-bit alpha, rounding to nearest
pub fn opacity_to_alpha(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_to_alpha() {
        assert_eq!(opacity_to_alpha(0.0), 0);
        assert_eq!(opacity_to_alpha(1.0), 255);
        assert_eq!(opacity_to_alpha(0.5), 128);
        assert_eq!(opacity_to_alpha(0.65), 166);
        assert_eq!(opacity_to_alpha(3.0), 255);
    }

    #[test]
    fn test_rgba_f32() {
        let rgba = Color::new(255, 0, 51).to_rgba_f32(0.5);
        assert_eq!(rgba[0], 1.0);
        assert_eq!(rgba[1], 0.0);
        assert!((rgba[2] - 0.2).abs() < 1e-6);
        assert_eq!(rgba[3], 0.5);
    }

    #[test]
    fn test_color_json_shape() {
        let json = serde_json::to_string(&Color::new(1, 2, 3)).unwrap();
        assert_eq!(json, r#"{"r":1,"g":2,"b":3}"#);
    }
}
