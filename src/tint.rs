//! Sprite Recoloring
//!
//! Blobs, their shadows and the blood particles ship as neutral gray artwork.
//! Team colors are applied at runtime by scaling every pixel with the target
//! color, instead of storing one set of sprites per color.
//!
//! # Pixel Rules
//!
//! - Pure black (r = g = b = 0) is background and is never touched
//! - Every other channel becomes `(original * target) >> 8`
//! - Bright pixels get `r * 5 - 4 * 256 - 138` added back (when positive), so
//!   highlights stay bright even with dark team colors
//! - Results are clamped to `[1, 255]`; 0 is reserved for the color key
//!
//! The constants are tuned by eye against the original artwork and must stay
//! bit-exact; the tests below pin a handful of reference pixels.
//!
//! # Caching
//!
//! [`TintedSprite`] remembers the last color it was recolored with, so calling
//! it every frame only costs a comparison until the team color changes.

use crate::color::Color;

/// Luminance added to glyphs for the highlighted font variant
pub const FONT_HIGHLIGHT_LUMINANCE: u8 = 60;

/// An owned RGBA8 image (byte order R, G, B, A, rows tightly packed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelImage {
    /// Creates a fully transparent black image
    pub fn new(width: u32, height: u32) -> Self {
        PixelImage {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wraps an existing RGBA buffer, checking its length
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, String> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(format!(
                "RGBA buffer of {} bytes does not match {}x{} image ({} bytes)",
                data.len(),
                width,
                height,
                expected
            ));
        }
        Ok(PixelImage { width, height, data })
    }

    /// Creates an image of uniform color
    #[cfg(test)]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut image = PixelImage::new(width, height);
        for pixel in image.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
        image
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = self.offset(x, y);
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let offset = self.offset(x, y);
        self.data[offset..offset + 4].copy_from_slice(&rgba);
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn pixels_mut(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        self.data.chunks_exact_mut(4)
    }
}

fn is_color_key(pixel: &[u8]) -> bool {
    (pixel[0] | pixel[1] | pixel[2]) == 0
}

/// The alpha convention a recolorable asset is loaded with
///
/// The three kinds deliberately differ; shadows are half transparent, blood is
/// fully opaque and blob bodies keep whatever alpha the file had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Blob,
    BlobShadow,
    Blood,
}

impl SpriteKind {
    /// Alpha forced onto non-background pixels, if any
    pub fn body_alpha(self) -> Option<u8> {
        match self {
            SpriteKind::Blob => None,
            SpriteKind::BlobShadow => Some(127),
            SpriteKind::Blood => Some(255),
        }
    }
}

/// Makes black pixels fully transparent, the RGBA stand-in for a color key
pub fn key_out_black(image: &mut PixelImage) {
    for pixel in image.pixels_mut() {
        if is_color_key(pixel) {
            pixel[3] = 0;
        }
    }
}

/// Makes black pixels transparent and applies the kind's body alpha
pub fn apply_color_key(image: &mut PixelImage, kind: SpriteKind) {
    let body_alpha = kind.body_alpha();
    for pixel in image.pixels_mut() {
        if is_color_key(pixel) {
            pixel[3] = 0;
        } else if let Some(alpha) = body_alpha {
            pixel[3] = alpha;
        }
    }
}

/// Extra brightness a pixel keeps regardless of tint, derived from its red channel
pub fn highlight_bias(red: u8) -> i32 {
    i32::from(red) * 5 - 4 * 256 - 138
}

/// Tints a single channel: multiply-and-shift, add the highlight bias, clamp
pub fn tint_channel(original: u8, target: u8, bias: i32) -> u8 {
    let mut value = (i32::from(original) * i32::from(target)) >> 8;
    if bias > 0 {
        value += bias;
    }
    value.clamp(1, 255) as u8
}

/// Tints one RGBA pixel; background pixels come back unchanged
pub fn tint_pixel(pixel: [u8; 4], color: Color) -> [u8; 4] {
    if is_color_key(&pixel) {
        return pixel;
    }
    let bias = highlight_bias(pixel[0]);
    [
        tint_channel(pixel[0], color.r, bias),
        tint_channel(pixel[1], color.g, bias),
        tint_channel(pixel[2], color.b, bias),
        pixel[3],
    ]
}

/// Produces a recolored copy of `reference`
pub fn recolor(reference: &PixelImage, color: Color) -> PixelImage {
    let mut result = reference.clone();
    for pixel in result.pixels_mut() {
        let tinted = tint_pixel([pixel[0], pixel[1], pixel[2], pixel[3]], color);
        pixel.copy_from_slice(&tinted);
    }
    result
}

/// Brightens every non-background pixel by `luminance` (saturating)
pub fn highlight(reference: &PixelImage, luminance: u8) -> PixelImage {
    let mut result = reference.clone();
    for pixel in result.pixels_mut() {
        if is_color_key(pixel) {
            continue;
        }
        for channel in &mut pixel[..3] {
            *channel = channel.saturating_add(luminance);
        }
    }
    result
}

/// Grayscale map of the highlight bias, for additive blending on the GPU
pub fn specular_map(reference: &PixelImage) -> PixelImage {
    let mut result = reference.clone();
    for pixel in result.pixels_mut() {
        let luminance = highlight_bias(pixel[0]).clamp(0, 255) as u8;
        pixel[0] = luminance;
        pixel[1] = luminance;
        pixel[2] = luminance;
    }
    result
}

/// Smallest power of two that is >= `value`
pub fn next_power_of_two(value: u32) -> u32 {
    value.max(1).next_power_of_two()
}

/// Copies the image into the center of a power-of-two sized transparent canvas
pub fn pad_to_power_of_two(image: &PixelImage) -> PixelImage {
    let padded_width = next_power_of_two(image.width);
    let padded_height = next_power_of_two(image.height);
    if padded_width == image.width && padded_height == image.height {
        return image.clone();
    }

    let mut padded = PixelImage::new(padded_width, padded_height);
    let offset_x = (padded_width - image.width) / 2;
    let offset_y = (padded_height - image.height) / 2;
    let row_bytes = image.pitch();
    for y in 0..image.height {
        let src = y as usize * row_bytes;
        let dst = padded.offset(offset_x, y + offset_y);
        padded.data[dst..dst + row_bytes].copy_from_slice(&image.data[src..src + row_bytes]);
    }
    padded
}

/// A team-colored copy of a neutral reference sprite, refreshed lazily
///
/// The backend texture itself is owned by the renderer; this struct only decides
/// *when* it needs new pixels and hands them over through the upload callback.
#[derive(Debug, Clone)]
pub struct TintedSprite {
    reference: PixelImage,
    applied: Option<Color>,
    recolor_count: u32,
}

impl TintedSprite {
    pub fn new(reference: PixelImage) -> Self {
        TintedSprite {
            reference,
            applied: None,
            recolor_count: 0,
        }
    }

    pub fn applied_color(&self) -> Option<Color> {
        self.applied
    }

    /// How many times the pixels were actually recomputed
    pub fn recolor_count(&self) -> u32 {
        self.recolor_count
    }

    /// Recolors and uploads if `color` differs from the last applied color
    ///
    /// Returns `Ok(true)` when new pixels were produced. If the upload fails the
    /// applied color is left unchanged so the next call retries.
    pub fn refresh<F>(&mut self, color: Color, upload: F) -> Result<bool, String>
    where
        F: FnOnce(&PixelImage) -> Result<(), String>,
    {
        if self.applied == Some(color) {
            return Ok(false);
        }

        let tinted = recolor(&self.reference, color);
        self.recolor_count += 1;
        upload(&tinted)?;
        self.applied = Some(color);
        Ok(true)
    }
}

/// Which half of a blob animation frame a pixel buffer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobPart {
    Body,
    Shadow,
}

/// Body and shadow of one blob frame, kept in the same team color
///
/// Each part tracks its own applied color. A part whose upload failed is
/// retried on the next refresh even if the other part is already current.
pub struct BlobSprites {
    body: TintedSprite,
    shadow: TintedSprite,
}

impl BlobSprites {
    pub fn new(body: PixelImage, shadow: PixelImage) -> Self {
        BlobSprites {
            body: TintedSprite::new(body),
            shadow: TintedSprite::new(shadow),
        }
    }

    pub fn body(&self) -> &TintedSprite {
        &self.body
    }

    pub fn shadow(&self) -> &TintedSprite {
        &self.shadow
    }

    /// Brings both parts to `color`, returning `Ok(true)` if either was recolored
    pub fn refresh<F>(&mut self, color: Color, mut upload: F) -> Result<bool, String>
    where
        F: FnMut(BlobPart, &PixelImage) -> Result<(), String>,
    {
        let body = self.body.refresh(color, |tinted| upload(BlobPart::Body, tinted))?;
        let shadow = self.shadow.refresh(color, |tinted| upload(BlobPart::Shadow, tinted))?;
        Ok(body || shadow)
    }
}
