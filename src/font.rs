//! Bitmap Font Layout
//!
//! The font is a set of 59 square glyph bitmaps (`gfx/font00.bmp` ..
//! `gfx/font58.bmp`). This module maps characters to glyph indices and measures
//! text; the backends do the actual blitting.

use bitflags::bitflags;

use crate::geometry::Vector2;

/// Number of glyph bitmaps shipped with the game
pub const FONT_GLYPHS: usize = 59;

/// Glyph edge length of the normal font in pixels
pub const FONT_WIDTH_NORMAL: u32 = 24;
/// Glyph edge length of the small font in pixels
pub const FONT_WIDTH_SMALL: u32 = 8;

pub const FONT_INDEX_QUESTION: usize = 47;
pub const FONT_INDEX_ASTERISK: usize = 55;

bitflags! {
    /// Text rendering options, combinable
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextFlags: u32 {
        const HIGHLIGHT = 0x01;
        const SMALL_FONT = 0x02;
        /// Draw every character as '*' (password fields)
        const OBFUSCATE = 0x04;
        const ALIGN_CENTER = 0x08;
        const ALIGN_RIGHT = 0x10;
    }
}

impl TextFlags {
    /// Alias for the empty set, reads better at call sites
    pub const NORMAL: TextFlags = TextFlags::empty();
}

/// Glyph edge length for the given flags
pub fn glyph_size(flags: TextFlags) -> u32 {
    if flags.contains(TextFlags::SMALL_FONT) {
        FONT_WIDTH_SMALL
    } else {
        FONT_WIDTH_NORMAL
    }
}

/// Glyph index for a character; unknown characters render as '?'
pub fn glyph_index(c: char) -> usize {
    match c {
        '0'..='9' => c as usize - '0' as usize,
        'a'..='z' => c as usize - 'a' as usize + 10,
        'A'..='Z' => c as usize - 'A' as usize + 10,
        '.' => 36,
        '!' => 37,
        '(' => 38,
        ')' => 39,
        'ß' => 40,
        'ä' | 'Ä' => 41,
        'ö' | 'Ö' => 42,
        'ü' | 'Ü' => 43,
        '\'' => 44,
        ':' => 45,
        ';' => 46,
        '?' => FONT_INDEX_QUESTION,
        ',' => 48,
        '/' => 49,
        '_' => 50,
        ' ' => 51,
        '-' => 52,
        '%' => 53,
        '+' => 54,
        '*' => FONT_INDEX_ASTERISK,
        '=' => 56,
        '<' => 57,
        '>' => 58,
        _ => FONT_INDEX_QUESTION,
    }
}

/// Glyph indices for a whole string, honoring [`TextFlags::OBFUSCATE`]
pub fn glyph_indices(text: &str, flags: TextFlags) -> impl Iterator<Item = usize> + '_ {
    let obfuscate = flags.contains(TextFlags::OBFUSCATE);
    text.chars().map(move |c| {
        if obfuscate {
            FONT_INDEX_ASTERISK
        } else {
            glyph_index(c)
        }
    })
}

/// Width of the text in pixels (monospace)
pub fn text_width(text: &str, flags: TextFlags) -> u32 {
    text.chars().count() as u32 * glyph_size(flags)
}

/// Top-left corner to draw from, after applying alignment flags
pub fn aligned_origin(text: &str, position: Vector2, flags: TextFlags) -> Vector2 {
    let width = text_width(text, flags) as f32;
    if flags.contains(TextFlags::ALIGN_CENTER) {
        Vector2::new(position.x - width / 2.0, position.y)
    } else if flags.contains(TextFlags::ALIGN_RIGHT) {
        Vector2::new(position.x - width, position.y)
    } else {
        position
    }
}
