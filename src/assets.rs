//! Asset Loading
//!
//! Sprite sheets are numbered bitmap files found by naming convention under the
//! data directory. Everything the renderers need is loaded once at startup into
//! a [`SpriteSet`] of CPU-side RGBA images; each backend then uploads them its
//! own way.
//!
//! Missing core sprites (ball, blobs, shadows, font, blood) are fatal. The
//! background is replaceable at runtime and only logged when it fails.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use sdl2::image::LoadSurface;
use sdl2::pixels::PixelFormatEnum;
use sdl2::surface::Surface;

use crate::font::FONT_GLYPHS;
use crate::geometry::{BALL_FRAMES, BLOB_FRAMES};
use crate::tint::{self, FONT_HIGHLIGHT_LUMINANCE, PixelImage, SpriteKind};

pub const DEFAULT_BACKGROUND: &str = "backgrounds/strand2.bmp";
pub const BALL_SHADOW_FILE: &str = "gfx/schball.bmp";
pub const BLOOD_FILE: &str = "gfx/blood.bmp";
pub const CURSOR_FILE: &str = "gfx/cursor.bmp";
pub const SCROLLBAR_FILE: &str = "gfx/scrollbar.bmp";
pub const ARROW_UP_FILE: &str = "gfx/pfeil_oben.bmp";
pub const ARROW_DOWN_FILE: &str = "gfx/pfeil_unten.bmp";
pub const ICON_FILE: &str = "Icon.bmp";

/// Ball rotation frame file, `index` is 0-based
pub fn ball_file(index: usize) -> String {
    format!("gfx/ball{:02}.bmp", index + 1)
}

/// Blob animation frame file, `index` is 0-based
pub fn blob_file(index: usize) -> String {
    format!("gfx/blobbym{}.bmp", index + 1)
}

/// Blob shadow frame file, `index` is 0-based
pub fn blob_shadow_file(index: usize) -> String {
    format!("gfx/sch1{}.bmp", index + 1)
}

pub fn font_file(index: usize) -> String {
    format!("gfx/font{:02}.bmp", index)
}

/// Errors that can occur while loading image assets
#[derive(Debug)]
pub enum AssetError {
    /// File does not exist under the data directory
    Missing(PathBuf),

    /// File exists but could not be decoded
    Decode { path: PathBuf, reason: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssetError::Missing(path) => write!(f, "Missing asset: {}", path.display()),
            AssetError::Decode { path, reason } => {
                write!(f, "Failed to decode {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for AssetError {}

impl From<AssetError> for String {
    fn from(error: AssetError) -> Self {
        error.to_string()
    }
}

/// Copies surface rows into a tightly packed image, dropping row padding
pub fn strip_pitch(width: u32, height: u32, pitch: usize, bytes: &[u8]) -> Result<PixelImage, String> {
    let row_bytes = width as usize * 4;
    if pitch < row_bytes {
        return Err(format!("pitch {} shorter than row of {} bytes", pitch, row_bytes));
    }
    if height > 0 && bytes.len() < pitch * (height as usize - 1) + row_bytes {
        return Err(format!("pixel buffer too short: {} bytes", bytes.len()));
    }

    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * pitch;
        data.extend_from_slice(&bytes[start..start + row_bytes]);
    }
    PixelImage::from_rgba(width, height, data)
}

/// Converts an SDL surface of any format into an RGBA image
pub fn image_from_surface(surface: &Surface) -> Result<PixelImage, String> {
    let converted = surface.convert_format(PixelFormatEnum::RGBA32)?;
    let (width, height, pitch) = (converted.width(), converted.height(), converted.pitch() as usize);
    converted.with_lock(|bytes| strip_pitch(width, height, pitch, bytes))
}

/// Resolves asset names against the data directory and decodes them
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        AssetLoader {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Loads an image (BMP, or PNG through SDL2_image) as RGBA
    pub fn load_image(&self, name: &str) -> Result<PixelImage, AssetError> {
        let path = self.resolve(name);
        if !path.exists() {
            return Err(AssetError::Missing(path));
        }

        let surface = Surface::from_file(&path).map_err(|reason| AssetError::Decode {
            path: path.clone(),
            reason,
        })?;
        let image = image_from_surface(&surface).map_err(|reason| AssetError::Decode {
            path: path.clone(),
            reason,
        })?;
        debug!("Loaded {} ({}x{})", name, image.width(), image.height());
        Ok(image)
    }

    /// Loads an image and makes black pixels transparent
    pub fn load_keyed(&self, name: &str) -> Result<PixelImage, AssetError> {
        let mut image = self.load_image(name)?;
        tint::key_out_black(&mut image);
        Ok(image)
    }

    /// Loads a recolorable sprite with its kind's alpha convention
    pub fn load_sprite(&self, name: &str, kind: SpriteKind) -> Result<PixelImage, AssetError> {
        let mut image = self.load_image(name)?;
        tint::apply_color_key(&mut image, kind);
        Ok(image)
    }

    /// Loads the background, logging instead of failing
    pub fn load_background(&self, name: &str) -> Option<PixelImage> {
        match self.load_image(name) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Unable to load background image: {}", e);
                None
            }
        }
    }
}

/// Every image the game renderer needs, decoded and alpha-prepared
pub struct SpriteSet {
    pub ball: Vec<PixelImage>,
    pub ball_shadow: PixelImage,
    pub blobs: Vec<PixelImage>,
    pub blob_shadows: Vec<PixelImage>,
    pub font: Vec<PixelImage>,
    pub font_highlight: Vec<PixelImage>,
    pub blood: PixelImage,
    pub background: Option<PixelImage>,
}

impl SpriteSet {
    pub fn load(loader: &AssetLoader) -> Result<Self, AssetError> {
        let ball = (0..BALL_FRAMES)
            .map(|i| loader.load_keyed(&ball_file(i)))
            .collect::<Result<Vec<_>, _>>()?;

        let ball_shadow = loader.load_keyed(BALL_SHADOW_FILE)?;

        let blobs = (0..BLOB_FRAMES)
            .map(|i| loader.load_sprite(&blob_file(i), SpriteKind::Blob))
            .collect::<Result<Vec<_>, _>>()?;

        let blob_shadows = (0..BLOB_FRAMES)
            .map(|i| loader.load_sprite(&blob_shadow_file(i), SpriteKind::BlobShadow))
            .collect::<Result<Vec<_>, _>>()?;

        let font = (0..FONT_GLYPHS)
            .map(|i| loader.load_keyed(&font_file(i)))
            .collect::<Result<Vec<_>, _>>()?;
        let font_highlight = font
            .iter()
            .map(|glyph| tint::highlight(glyph, FONT_HIGHLIGHT_LUMINANCE))
            .collect();

        let blood = loader.load_sprite(BLOOD_FILE, SpriteKind::Blood)?;
        let background = loader.load_background(DEFAULT_BACKGROUND);

        Ok(SpriteSet {
            ball,
            ball_shadow,
            blobs,
            blob_shadows,
            font,
            font_highlight,
            blood,
            background,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_naming() {
        assert_eq!(ball_file(0), "gfx/ball01.bmp");
        assert_eq!(ball_file(BALL_FRAMES - 1), "gfx/ball16.bmp");
        assert_eq!(blob_file(0), "gfx/blobbym1.bmp");
        assert_eq!(blob_shadow_file(4), "gfx/sch15.bmp");
        assert_eq!(font_file(0), "gfx/font00.bmp");
        assert_eq!(font_file(FONT_GLYPHS - 1), "gfx/font58.bmp");
    }

    #[test]
    fn test_strip_pitch_drops_padding() {
        // 2x2 image with 4 bytes of padding per row
        let bytes: Vec<u8> = vec![
            1, 1, 1, 1, 2, 2, 2, 2, 0xEE, 0xEE, 0xEE, 0xEE,
            3, 3, 3, 3, 4, 4, 4, 4, 0xEE, 0xEE, 0xEE, 0xEE,
        ];
        let image = strip_pitch(2, 2, 12, &bytes).unwrap();
        assert_eq!(image.pixel(1, 0), [2, 2, 2, 2]);
        assert_eq!(image.pixel(0, 1), [3, 3, 3, 3]);
        assert_eq!(image.as_bytes().len(), 16);
    }

    #[test]
    fn test_strip_pitch_rejects_short_buffers() {
        assert!(strip_pitch(2, 2, 4, &[0; 16]).is_err());
        assert!(strip_pitch(2, 2, 8, &[0; 12]).is_err());
    }

    #[test]
    fn test_missing_asset_is_reported() {
        let loader = AssetLoader::new("/nonexistent/blobby-data");
        match loader.load_image("gfx/ball01.bmp") {
            Err(AssetError::Missing(path)) => {
                assert!(path.ends_with("gfx/ball01.bmp"));
            }
            other => panic!("expected missing asset, got {:?}", other.map(|_| ())),
        }
        assert!(loader.load_background(DEFAULT_BACKGROUND).is_none());
    }

    #[test]
    fn test_sprite_set_fails_without_data() {
        let loader = AssetLoader::new("/nonexistent/blobby-data");
        let error = SpriteSet::load(&loader).err().map(String::from);
        assert!(error.unwrap().contains("ball01"));
    }
}
