//! SDL2 canvas backend
//!
//! Draws with the SDL2 renderer at a logical size of 800x600, so SDL scales the
//! frame to whatever the window is. Team colored sprites are recolored on the
//! CPU and pushed into streaming textures, one texture per side and frame.

use std::time::Instant;

use log::{debug, info, warn};
use sdl2::VideoSubsystem;
use sdl2::pixels::{Color as SdlColor, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{BlendMode, Canvas, Texture, TextureCreator};
use sdl2::surface::Surface;
use sdl2::video::{Window, WindowContext};

use super::{BACKGROUND_IMAGE, BackendKind, BlobSlotToggle, ImageCache, RenderBackend, centered_placement};
use crate::assets::{AssetLoader, DEFAULT_BACKGROUND, ICON_FILE, SpriteSet};
use crate::color::{Color, opacity_to_alpha};
use crate::config::RenderConfig;
use crate::font::{TextFlags, aligned_origin, glyph_indices, glyph_size};
use crate::geometry::{
    PARTICLE_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH, ScreenRect, Vector2, ball_frame, ball_rect,
    ball_shadow_position, ball_shadow_rect, blob_frame, blob_rect, blob_shadow_position, blob_shadow_rect,
    marker_is_dark, marker_rect,
};
use crate::match_state::{MatchSnapshot, PlayerSide};
use crate::tint::{BlobPart, BlobSprites, PixelImage, TintedSprite};

pub const WINDOW_TITLE: &str = "Blobby Volley 2";

const BALL_SHADOW_ALPHA: u8 = 127;
const BALL_MARKER_Y: i32 = 5;
const MOUSE_MARKER_Y: i32 = 590;

/// Background columns under the net, redrawn over shadows so the net stays in front
const ROD_RECT: ScreenRect = ScreenRect::new(400 - 7, 300, 14, 300);

/// Uploads tightly packed RGBA pixels into a texture of the same size
fn upload(texture: &mut Texture, image: &PixelImage) -> Result<(), String> {
    texture
        .update(None, image.as_bytes(), image.pitch())
        .map_err(|e| e.to_string())
}

/// Creates a blended texture holding `image`
///
/// Streaming textures can be refilled later, which the team colored sprites need.
fn create_texture(
    creator: &TextureCreator<WindowContext>,
    image: &PixelImage,
) -> Result<Texture, String> {
    let mut texture = creator
        .create_texture_streaming(PixelFormatEnum::RGBA32, image.width(), image.height())
        .map_err(|e| e.to_string())?;
    upload(&mut texture, image)?;
    texture.set_blend_mode(BlendMode::Blend);
    Ok(texture)
}

fn create_textures(
    creator: &TextureCreator<WindowContext>,
    images: &[PixelImage],
) -> Result<Vec<Texture>, String> {
    images.iter().map(|image| create_texture(creator, image)).collect()
}

/// A streaming texture paired with the neutral pixels it is recolored from
struct TintedTexture {
    sprite: TintedSprite,
    texture: Texture,
}

impl TintedTexture {
    fn new(creator: &TextureCreator<WindowContext>, reference: &PixelImage) -> Result<Self, String> {
        Ok(TintedTexture {
            texture: create_texture(creator, reference)?,
            sprite: TintedSprite::new(reference.clone()),
        })
    }

    /// Recolors the texture if `color` is not already applied
    fn colorize(&mut self, color: Color) -> Result<bool, String> {
        let texture = &mut self.texture;
        let recolored = self.sprite.refresh(color, |tinted| upload(texture, tinted))?;
        if recolored {
            debug!(
                "Recolored sprite to {:?} ({} recolors so far)",
                self.sprite.applied_color(),
                self.sprite.recolor_count()
            );
        }
        Ok(recolored)
    }
}

/// Body and shadow of one blob animation frame for one side
struct BlobFrame {
    sprites: BlobSprites,
    body: Texture,
    shadow: Texture,
}

impl BlobFrame {
    fn new(creator: &TextureCreator<WindowContext>, body: &PixelImage, shadow: &PixelImage) -> Result<Self, String> {
        Ok(BlobFrame {
            sprites: BlobSprites::new(body.clone(), shadow.clone()),
            body: create_texture(creator, body)?,
            shadow: create_texture(creator, shadow)?,
        })
    }

    fn colorize(&mut self, color: Color) -> Result<(), String> {
        let (body, shadow) = (&mut self.body, &mut self.shadow);
        let recolored = self.sprites.refresh(color, |part, tinted| match part {
            BlobPart::Body => upload(body, tinted),
            BlobPart::Shadow => upload(shadow, tinted),
        })?;
        if recolored {
            debug!(
                "Recolored blob frame to {:?} ({} body, {} shadow recolors)",
                color,
                self.sprites.body().recolor_count(),
                self.sprites.shadow().recolor_count()
            );
        }
        Ok(())
    }
}

pub struct SdlBackend {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    loader: AssetLoader,
    started: Instant,

    background: Option<Texture>,
    ball: Vec<Texture>,
    ball_shadow: Texture,
    font: Vec<Texture>,
    font_highlight: Vec<Texture>,
    /// Indexed by side, then animation frame
    blobs: [Vec<BlobFrame>; 2],
    blood: [TintedTexture; 2],
    images: ImageCache<Texture>,

    blob_colors: [Color; 2],
    show_shadow: bool,
    mouse_marker: f32,
    gui_blob_slots: BlobSlotToggle,
}

impl SdlBackend {
    pub fn new(video: &VideoSubsystem, config: &RenderConfig, loader: &AssetLoader) -> Result<Self, String> {
        sdl2::hint::set("SDL_RENDER_SCALE_QUALITY", "1");

        let mut window_builder = video.window(WINDOW_TITLE, config.width, config.height);
        window_builder.position_centered();
        if config.fullscreen {
            window_builder.fullscreen();
        } else {
            window_builder.resizable();
        }
        let mut window = window_builder.build().map_err(|e| e.to_string())?;
        set_window_icon(&mut window, loader);

        let mut canvas_builder = window.into_canvas().accelerated();
        if config.vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let mut canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        // Set logical size so SDL scales the 800x600 frame to the window
        canvas
            .set_logical_size(SCREEN_WIDTH, SCREEN_HEIGHT)
            .map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let sprites = SpriteSet::load(loader)?;

        let background = match &sprites.background {
            Some(image) => Some(create_texture(&texture_creator, image)?),
            None => None,
        };

        let mut ball_shadow = create_texture(&texture_creator, &sprites.ball_shadow)?;
        ball_shadow.set_alpha_mod(BALL_SHADOW_ALPHA);

        let mut blobs: [Vec<BlobFrame>; 2] = [Vec::new(), Vec::new()];
        for frames in &mut blobs {
            for (body, shadow) in sprites.blobs.iter().zip(&sprites.blob_shadows) {
                frames.push(BlobFrame::new(&texture_creator, body, shadow)?);
            }
        }

        let blood = [
            TintedTexture::new(&texture_creator, &sprites.blood)?,
            TintedTexture::new(&texture_creator, &sprites.blood)?,
        ];

        let mut backend = SdlBackend {
            ball: create_textures(&texture_creator, &sprites.ball)?,
            font: create_textures(&texture_creator, &sprites.font)?,
            font_highlight: create_textures(&texture_creator, &sprites.font_highlight)?,
            ball_shadow,
            background,
            blobs,
            blood,
            images: ImageCache::new(),
            canvas,
            texture_creator,
            loader: loader.clone(),
            started: Instant::now(),
            blob_colors: [config.left_color, config.right_color],
            show_shadow: config.show_shadow,
            mouse_marker: 0.0,
            gui_blob_slots: BlobSlotToggle::new(),
        };

        for side in PlayerSide::BOTH {
            let color = backend.blob_colors[side.index()];
            backend.blood[side.index()].colorize(color)?;
        }
        if config.background != DEFAULT_BACKGROUND {
            backend.set_background(&config.background);
        }

        info!("SDL2 renderer initialized ({}x{})", config.width, config.height);
        Ok(backend)
    }

    fn ticks(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Makes sure the given side's frame carries the current team color
    fn colorize_blob(&mut self, side: PlayerSide, frame: usize) -> Result<(), String> {
        let color = self.blob_colors[side.index()];
        self.blobs[side.index()][frame].colorize(color)
    }

    fn draw_marker(&mut self, x: f32, y: i32, dark: bool) -> Result<(), String> {
        let color = if dark { SdlColor::BLACK } else { SdlColor::WHITE };
        self.canvas.set_draw_color(color);
        self.canvas.fill_rect(marker_rect(x, y).to_sdl())
    }
}

impl RenderBackend for SdlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sdl
    }

    fn refresh(&mut self) -> Result<(), String> {
        self.canvas.present();
        self.canvas.set_draw_color(SdlColor::BLACK);
        self.canvas.clear();
        self.gui_blob_slots.reset();
        Ok(())
    }

    fn set_background(&mut self, name: &str) -> bool {
        let Some(image) = self.loader.load_background(name) else {
            return false;
        };
        match create_texture(&self.texture_creator, &image) {
            Ok(texture) => {
                self.background = Some(texture);
                debug!("Background set to {}", name);
                true
            }
            Err(e) => {
                warn!("Error loading background {}: {}", name, e);
                false
            }
        }
    }

    fn set_blob_color(&mut self, side: PlayerSide, color: Color) -> Result<(), String> {
        if self.blob_colors[side.index()] == color {
            return Ok(());
        }
        self.blob_colors[side.index()] = color;
        self.blood[side.index()].colorize(color)?;
        Ok(())
    }

    fn show_shadow(&mut self, show: bool) {
        self.show_shadow = show;
    }

    fn set_mouse_marker(&mut self, x: f32) {
        self.mouse_marker = x;
    }

    fn draw_text(&mut self, text: &str, position: Vector2, flags: TextFlags) -> Result<(), String> {
        let size = glyph_size(flags);
        let origin = aligned_origin(text, position, flags);
        let glyphs = if flags.contains(TextFlags::HIGHLIGHT) {
            &self.font_highlight
        } else {
            &self.font
        };

        let mut x = origin.x.round() as i32;
        let y = origin.y.round() as i32;
        for index in glyph_indices(text, flags) {
            if let Some(glyph) = glyphs.get(index) {
                self.canvas.copy(glyph, None, Rect::new(x, y, size, size))?;
            }
            x += size as i32;
        }
        Ok(())
    }

    fn draw_image(&mut self, name: &str, position: Vector2, size: Vector2) -> Result<(), String> {
        if name == BACKGROUND_IMAGE {
            let Some(background) = &self.background else {
                return Ok(());
            };
            let query = background.query();
            let (x, y, w, h) = centered_placement(position, (query.width, query.height), size);
            return self.canvas.copy(background, None, Rect::new(x, y, w, h));
        }

        let loader = &self.loader;
        let creator = &self.texture_creator;
        let Some(texture) = self.images.get_or_load(name, |name| {
            let image = loader.load_keyed(name)?;
            create_texture(creator, &image)
        }) else {
            return Ok(());
        };
        let query = texture.query();
        let (x, y, w, h) = centered_placement(position, (query.width, query.height), size);
        self.canvas.copy(texture, None, Rect::new(x, y, w, h))
    }

    fn draw_overlay(
        &mut self,
        opacity: f32,
        top_left: Vector2,
        bottom_right: Vector2,
        color: Color,
    ) -> Result<(), String> {
        let rect = ScreenRect::spanning(top_left, bottom_right);
        if rect.width == 0 || rect.height == 0 {
            return Ok(());
        }
        self.canvas.set_blend_mode(BlendMode::Blend);
        self.canvas.set_draw_color(color.with_alpha(opacity_to_alpha(opacity)));
        let result = self.canvas.fill_rect(rect.to_sdl());
        self.canvas.set_blend_mode(BlendMode::None);
        result
    }

    fn draw_blob(&mut self, position: Vector2, color: Color) -> Result<(), String> {
        let slot = self.gui_blob_slots.take();
        self.set_blob_color(slot, color)?;
        self.colorize_blob(slot, 0)?;

        let texture = &self.blobs[slot.index()][0].body;
        self.canvas.copy(texture, None, blob_rect(position).to_sdl())
    }

    fn start_draw_particles(&mut self) {}

    fn draw_particle(&mut self, position: Vector2, side: PlayerSide) -> Result<(), String> {
        let rect = ScreenRect::centered(position, PARTICLE_SIZE, PARTICLE_SIZE);
        self.canvas
            .copy(&self.blood[side.index()].texture, None, rect.to_sdl())
    }

    fn end_draw_particles(&mut self) {}

    fn draw_game(&mut self, snapshot: &MatchSnapshot) -> Result<(), String> {
        if let Some(background) = &self.background {
            self.canvas.copy(background, None, None)?;
        }

        let dark = marker_is_dark(self.ticks());
        self.draw_marker(snapshot.ball_position.x, BALL_MARKER_Y, dark)?;
        self.draw_marker(self.mouse_marker, MOUSE_MARKER_Y, dark)?;

        let frames = [
            blob_frame(snapshot.blob_state(PlayerSide::Left)),
            blob_frame(snapshot.blob_state(PlayerSide::Right)),
        ];

        // Recolor before the shadows are drawn, they share the frame's color
        for side in PlayerSide::BOTH {
            self.colorize_blob(side, frames[side.index()])?;
        }

        if self.show_shadow {
            let shadow = ball_shadow_rect(ball_shadow_position(snapshot.ball_position));
            self.canvas.copy(&self.ball_shadow, None, shadow.to_sdl())?;

            for side in PlayerSide::BOTH {
                let rect = blob_shadow_rect(blob_shadow_position(snapshot.blob_position(side)));
                let texture = &self.blobs[side.index()][frames[side.index()]].shadow;
                self.canvas.copy(texture, None, rect.to_sdl())?;
            }
        }

        if let Some(background) = &self.background {
            let rod = ROD_RECT.to_sdl();
            self.canvas.copy(background, rod, rod)?;
        }

        let ball = &self.ball[ball_frame(snapshot.ball_rotation)];
        self.canvas.copy(ball, None, ball_rect(snapshot.ball_position).to_sdl())?;

        for side in PlayerSide::BOTH {
            let rect = blob_rect(snapshot.blob_position(side));
            let texture = &self.blobs[side.index()][frames[side.index()]].body;
            self.canvas.copy(texture, None, rect.to_sdl())?;
        }

        Ok(())
    }
}

/// Sets the window icon, black keyed out; a missing icon is only logged
fn set_window_icon(window: &mut Window, loader: &AssetLoader) {
    let path = loader.resolve(ICON_FILE);
    match Surface::load_bmp(&path) {
        Ok(mut icon) => {
            if let Err(e) = icon.set_color_key(true, SdlColor::BLACK) {
                warn!("Could not key window icon: {}", e);
            }
            window.set_icon(icon);
        }
        Err(e) => warn!("Could not load window icon {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rod_covers_net() {
        assert!(ROD_RECT.contains(Vector2::new(400.0, 450.0)));
        assert!(!ROD_RECT.contains(Vector2::new(400.0, 299.0)));
        assert_eq!(ROD_RECT.x + ROD_RECT.width as i32, 407);
    }
}
