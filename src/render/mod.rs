//! Render backends
//!
//! Everything that draws goes through the [`RenderBackend`] trait. Two
//! implementations exist and one is picked at startup from the config:
//!
//! - [`sdl::SdlBackend`]: SDL2 canvas with streaming textures, recoloring on the CPU
//! - [`gl::GlBackend`]: OpenGL 3.3 through `glow`, recoloring with a tint uniform
//!   plus an additive specular pass
//!
//! Both take their sprites from the same [`SpriteSet`], so asset loading and
//! pixel math live outside this module.
//!
//! # Frame Protocol
//!
//! ```text
//! draw_game(&snapshot)      // or GUI drawing only
//! start_draw_particles()
//! draw_particle(..) x N
//! end_draw_particles()
//! draw_text / draw_image / draw_overlay / draw_blob   (GUI on top)
//! refresh()                 // present and clear
//! ```

pub mod gl;
mod gl_pipeline;
pub mod sdl;

use std::collections::{HashMap, VecDeque};

use log::warn;
use serde::{Deserialize, Serialize};
use sdl2::VideoSubsystem;

use crate::assets::AssetLoader;
use crate::color::Color;
use crate::config::RenderConfig;
use crate::font::TextFlags;
use crate::geometry::Vector2;
use crate::match_state::{MatchSnapshot, PlayerSide};

/// Name under which the current background can be drawn with `draw_image`
pub const BACKGROUND_IMAGE: &str = "background";

/// Number of past ball positions the GL backend draws as a fading trail
pub const BALL_TRAIL_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    #[default]
    Sdl,
    OpenGl,
}

/// Drawing interface shared by the game screen and the GUI
///
/// Positions are in the 800x600 logical screen. Draw calls return
/// `Result<(), String>` in the same way as the SDL2 canvas API.
pub trait RenderBackend {
    fn kind(&self) -> BackendKind;

    /// Presents the finished frame and clears for the next one
    fn refresh(&mut self) -> Result<(), String>;

    /// Replaces the background image; on failure the old one stays and `false` is returned
    fn set_background(&mut self, name: &str) -> bool;

    /// Sets a team color; sprites are re-tinted lazily when next drawn
    fn set_blob_color(&mut self, side: PlayerSide, color: Color) -> Result<(), String>;

    fn show_shadow(&mut self, show: bool);

    /// Horizontal position of the mouse marker at the bottom of the field
    fn set_mouse_marker(&mut self, x: f32);

    fn draw_text(&mut self, text: &str, position: Vector2, flags: TextFlags) -> Result<(), String>;

    /// Draws an image centered at `position`; a zero `size` keeps its natural size
    fn draw_image(&mut self, name: &str, position: Vector2, size: Vector2) -> Result<(), String>;

    /// Fills the rectangle between `top_left` and `bottom_right` with a translucent color
    fn draw_overlay(
        &mut self,
        opacity: f32,
        top_left: Vector2,
        bottom_right: Vector2,
        color: Color,
    ) -> Result<(), String>;

    /// Draws a standing blob for menus, centered at `position`
    fn draw_blob(&mut self, position: Vector2, color: Color) -> Result<(), String>;

    fn start_draw_particles(&mut self);
    fn draw_particle(&mut self, position: Vector2, side: PlayerSide) -> Result<(), String>;
    fn end_draw_particles(&mut self);

    /// Draws background, markers, shadows, ball and blobs for one match frame
    fn draw_game(&mut self, snapshot: &MatchSnapshot) -> Result<(), String>;
}

/// Opens a window and creates the backend selected in `config`
pub fn create_backend(
    video: &VideoSubsystem,
    config: &RenderConfig,
    loader: &AssetLoader,
) -> Result<Box<dyn RenderBackend>, String> {
    match config.backend {
        BackendKind::Sdl => Ok(Box::new(sdl::SdlBackend::new(video, config, loader)?)),
        BackendKind::OpenGl => Ok(Box::new(gl::GlBackend::new(video, config, loader)?)),
    }
}

/// Hands out the left and right blob slots in turn
///
/// Two GUI blob previews drawn in the same frame each get their own texture
/// slot, so both colors survive until the frame is presented. The toggle is
/// reset on every refresh so the first preview always lands in the left slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobSlotToggle {
    next: PlayerSide,
}

impl BlobSlotToggle {
    pub fn new() -> Self {
        BlobSlotToggle {
            next: PlayerSide::Left,
        }
    }

    pub fn take(&mut self) -> PlayerSide {
        let slot = self.next;
        self.next = slot.other();
        slot
    }

    pub fn reset(&mut self) {
        self.next = PlayerSide::Left;
    }
}

impl Default for BlobSlotToggle {
    fn default() -> Self {
        Self::new()
    }
}

/// Last few ball positions, oldest first
#[derive(Debug, Clone, Default)]
pub struct BallTrail {
    positions: VecDeque<Vector2>,
}

impl BallTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, position: Vector2) {
        if self.positions.len() == BALL_TRAIL_LENGTH {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    /// Positions with their opacity; each newer position is 0.1 more opaque
    pub fn faded(&self) -> impl Iterator<Item = (Vector2, f32)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| (position, 0.1 * (i + 1) as f32))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

/// Images loaded on first use and kept by name
///
/// A failed load is remembered too, so a missing file is reported once
/// instead of every frame.
pub struct ImageCache<T> {
    entries: HashMap<String, Option<T>>,
    load_attempts: u32,
}

impl<T> ImageCache<T> {
    pub fn new() -> Self {
        ImageCache {
            entries: HashMap::new(),
            load_attempts: 0,
        }
    }

    pub fn get_or_load<F>(&mut self, name: &str, load: F) -> Option<&T>
    where
        F: FnOnce(&str) -> Result<T, String>,
    {
        if !self.entries.contains_key(name) {
            self.load_attempts += 1;
            let loaded = match load(name) {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("Could not load image {} (load attempt {}): {}", name, self.load_attempts, e);
                    None
                }
            };
            self.entries.insert(name.to_string(), loaded);
        }
        self.entries.get(name).and_then(Option::as_ref)
    }

    /// Every successfully loaded image
    pub fn loaded(&self) -> impl Iterator<Item = &T> {
        self.entries.values().filter_map(Option::as_ref)
    }

    #[cfg(test)]
    pub fn load_attempts(&self) -> u32 {
        self.load_attempts
    }
}

impl<T> Default for ImageCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-left corner and size of an image drawn centered at `position`
pub fn centered_placement(position: Vector2, natural: (u32, u32), size: Vector2) -> (i32, i32, u32, u32) {
    let (width, height) = if size.is_zero() {
        (natural.0 as f32, natural.1 as f32)
    } else {
        (size.x, size.y)
    };
    (
        (position.x - width / 2.0).round() as i32,
        (position.y - height / 2.0).round() as i32,
        width.max(0.0) as u32,
        height.max(0.0) as u32,
    )
}
