//! OpenGL backend
//!
//! Renders through `glow` on an SDL2 OpenGL 3.3 core context. Sprites are
//! uploaded once; team colors are applied by multiplying with a color uniform
//! and adding a precomputed specular map on top, which reproduces the bright
//! highlights the CPU recolor keeps. The ball leaves a short fading trail.

use std::time::Instant;

use glow::HasContext;
use log::{debug, info, warn};
use sdl2::VideoSubsystem;
use sdl2::video::{GLContext, GLProfile, SwapInterval, Window};

use super::gl_pipeline::{AtlasLayout, GlTexture, Quad, QuadPipeline, build_atlas, upload_texture, upload_textures};
use super::sdl::WINDOW_TITLE;
use super::{BACKGROUND_IMAGE, BackendKind, BallTrail, ImageCache, RenderBackend};
use crate::assets::{AssetLoader, DEFAULT_BACKGROUND, SpriteSet};
use crate::color::Color;
use crate::config::RenderConfig;
use crate::font::{TextFlags, aligned_origin, glyph_indices, glyph_size};
use crate::geometry::{
    BALL_SIZE, PARTICLE_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH, ScreenRect, Vector2, ball_frame, ball_shadow_position,
    ball_shadow_rect, blob_frame, blob_shadow_position, blob_shadow_rect, marker_is_dark, marker_rect,
};
use crate::match_state::{MatchSnapshot, PlayerSide};
use crate::tint::{self, PixelImage};

/// Shadow alpha used on the GPU path
pub const GL_SHADOW_ALPHA: u8 = 128;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const BALL_SHADOW_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.5];
const BALL_MARKER_Y: i32 = 5;
const MOUSE_MARKER_Y: i32 = 590;

/// Replaces the alpha of every visible pixel
fn with_body_alpha(image: &PixelImage, alpha: u8) -> PixelImage {
    let mut result = image.clone();
    for y in 0..result.height() {
        for x in 0..result.width() {
            let mut pixel = result.pixel(x, y);
            if pixel[3] != 0 {
                pixel[3] = alpha;
                result.set_pixel(x, y, pixel);
            }
        }
    }
    result
}

/// Center of a screen rectangle, used to place padded textures
fn rect_center(rect: ScreenRect) -> Vector2 {
    Vector2::new(
        rect.x as f32 + rect.width as f32 / 2.0,
        rect.y as f32 + rect.height as f32 / 2.0,
    )
}

/// Normal and highlighted font atlases
struct FontAtlas {
    normal: GlTexture,
    highlight: GlTexture,
    layout: AtlasLayout,
}

impl FontAtlas {
    fn new(gl: &glow::Context, sprites: &SpriteSet) -> Result<Self, String> {
        let (normal, layout) = build_atlas(&sprites.font)?;
        let (highlight, _) = build_atlas(&sprites.font_highlight)?;
        Ok(FontAtlas {
            normal: upload_texture(gl, &normal)?,
            highlight: upload_texture(gl, &highlight)?,
            layout,
        })
    }
}

pub struct GlBackend {
    gl: glow::Context,
    pipeline: QuadPipeline,
    window: Window,
    _gl_context: GLContext,
    loader: AssetLoader,
    started: Instant,

    background: Option<GlTexture>,
    ball: Vec<GlTexture>,
    ball_shadow: GlTexture,
    blobs: Vec<GlTexture>,
    blob_specular: Vec<GlTexture>,
    blob_shadows: Vec<GlTexture>,
    blood: GlTexture,
    font: FontAtlas,
    images: ImageCache<GlTexture>,

    ball_trail: BallTrail,
    blob_colors: [Color; 2],
    show_shadow: bool,
    mouse_marker: f32,
}

impl GlBackend {
    pub fn new(video: &VideoSubsystem, config: &RenderConfig, loader: &AssetLoader) -> Result<Self, String> {
        // Set OpenGL attributes
        let gl_attr = video.gl_attr();
        gl_attr.set_context_profile(GLProfile::Core);
        gl_attr.set_context_version(3, 3);

        let mut window_builder = video.window(WINDOW_TITLE, config.width, config.height);
        window_builder.opengl().position_centered();
        if config.fullscreen {
            window_builder.fullscreen();
        } else {
            window_builder.resizable();
        }
        let window = window_builder.build().map_err(|e| e.to_string())?;

        let gl_context = window.gl_create_context()?;
        let interval = if config.vsync {
            SwapInterval::VSync
        } else {
            SwapInterval::Immediate
        };
        if let Err(e) = video.gl_set_swap_interval(interval) {
            warn!("Could not set swap interval: {}", e);
        }

        let gl = unsafe { glow::Context::from_loader_function(|s| video.gl_get_proc_address(s) as *const _) };
        let pipeline = QuadPipeline::new(&gl)?;

        let sprites = SpriteSet::load(loader)?;
        let background = match &sprites.background {
            Some(image) => Some(upload_texture(&gl, image)?),
            None => None,
        };
        let blob_specular: Vec<PixelImage> = sprites.blobs.iter().map(tint::specular_map).collect();
        let blob_shadows: Vec<PixelImage> = sprites
            .blob_shadows
            .iter()
            .map(|shadow| with_body_alpha(shadow, GL_SHADOW_ALPHA))
            .collect();

        let mut backend = GlBackend {
            ball: upload_textures(&gl, &sprites.ball)?,
            ball_shadow: upload_texture(&gl, &sprites.ball_shadow)?,
            blobs: upload_textures(&gl, &sprites.blobs)?,
            blob_specular: upload_textures(&gl, &blob_specular)?,
            blob_shadows: upload_textures(&gl, &blob_shadows)?,
            blood: upload_texture(&gl, &sprites.blood)?,
            font: FontAtlas::new(&gl, &sprites)?,
            background,
            images: ImageCache::new(),
            pipeline,
            gl,
            window,
            _gl_context: gl_context,
            loader: loader.clone(),
            started: Instant::now(),
            ball_trail: BallTrail::new(),
            blob_colors: [config.left_color, config.right_color],
            show_shadow: config.show_shadow,
            mouse_marker: 0.0,
        };

        if config.background != DEFAULT_BACKGROUND {
            backend.set_background(&config.background);
        }
        backend.begin_frame();

        info!("OpenGL renderer initialized ({}x{})", config.width, config.height);
        Ok(backend)
    }

    fn ticks(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Resets viewport, blending and pipeline state and clears the frame
    fn begin_frame(&self) {
        let (width, height) = self.window.drawable_size();
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
            self.gl.enable(glow::BLEND);
            self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
        self.pipeline.bind(&self.gl);
    }

    fn draw_texture(&self, texture: &GlTexture, center: Vector2, color: [f32; 4]) {
        let quad = Quad::centered(center, texture.width as f32, texture.height as f32);
        self.pipeline.draw(&self.gl, &quad, Some(texture.texture), color);
    }

    fn fill(&self, rect: ScreenRect, color: [f32; 4]) {
        let quad = Quad::new(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32);
        self.pipeline.draw(&self.gl, &quad, None, color);
    }

    fn set_additive(&self, additive: bool) {
        unsafe {
            if additive {
                self.gl.blend_func(glow::ONE, glow::ONE);
            } else {
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            }
        }
    }

    /// Team colored blob: multiplied body, then the additive specular pass
    fn draw_blob_frame(&self, frame: usize, center: Vector2, color: Color) {
        self.draw_texture(&self.blobs[frame], center, color.to_rgba_f32(1.0));
        self.set_additive(true);
        self.draw_texture(&self.blob_specular[frame], center, WHITE);
        self.set_additive(false);
    }

    fn draw_ball_trail(&self) {
        unsafe {
            self.gl.blend_func(glow::SRC_ALPHA, glow::ONE);
        }
        for (position, opacity) in self.ball_trail.faded() {
            self.draw_texture(&self.ball[0], position, [1.0, 1.0, 1.0, opacity]);
        }
        self.set_additive(false);
    }
}

impl RenderBackend for GlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenGl
    }

    fn refresh(&mut self) -> Result<(), String> {
        self.window.gl_swap_window();
        self.begin_frame();
        Ok(())
    }

    fn set_background(&mut self, name: &str) -> bool {
        let Some(image) = self.loader.load_background(name) else {
            return false;
        };
        match upload_texture(&self.gl, &image) {
            Ok(texture) => {
                if let Some(old) = self.background.replace(texture) {
                    unsafe { self.gl.delete_texture(old.texture) };
                }
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
        self.blob_colors[side.index()] = color;
        Ok(())
    }

    fn show_shadow(&mut self, show: bool) {
        self.show_shadow = show;
    }

    fn set_mouse_marker(&mut self, x: f32) {
        self.mouse_marker = x;
    }

    fn draw_text(&mut self, text: &str, position: Vector2, flags: TextFlags) -> Result<(), String> {
        let size = glyph_size(flags) as f32;
        let origin = aligned_origin(text, position, flags);
        let atlas = if flags.contains(TextFlags::HIGHLIGHT) {
            &self.font.highlight
        } else {
            &self.font.normal
        };

        let mut x = origin.x.round();
        let y = origin.y.round();
        for index in glyph_indices(text, flags) {
            let quad = Quad::new(x, y, size, size).with_uv(self.font.layout.uv(index as u32));
            self.pipeline.draw(&self.gl, &quad, Some(atlas.texture), WHITE);
            x += size;
        }
        Ok(())
    }

    fn draw_image(&mut self, name: &str, position: Vector2, size: Vector2) -> Result<(), String> {
        let texture = if name == BACKGROUND_IMAGE {
            self.background.as_ref()
        } else {
            let gl = &self.gl;
            let loader = &self.loader;
            self.images.get_or_load(name, |name| {
                let image = loader.load_keyed(name)?;
                upload_texture(gl, &image)
            })
        };
        let Some(texture) = texture else {
            return Ok(());
        };

        let (width, height) = texture.quad_size(size);
        let quad = Quad::centered(position, width, height);
        self.pipeline.draw(&self.gl, &quad, Some(texture.texture), WHITE);
        Ok(())
    }

    fn draw_overlay(
        &mut self,
        opacity: f32,
        top_left: Vector2,
        bottom_right: Vector2,
        color: Color,
    ) -> Result<(), String> {
        let rect = ScreenRect::spanning(top_left, bottom_right);
        self.fill(rect, color.to_rgba_f32(opacity.clamp(0.0, 1.0)));
        Ok(())
    }

    fn draw_blob(&mut self, position: Vector2, color: Color) -> Result<(), String> {
        self.draw_blob_frame(0, position, color);
        Ok(())
    }

    fn start_draw_particles(&mut self) {}

    fn draw_particle(&mut self, position: Vector2, side: PlayerSide) -> Result<(), String> {
        let color = self.blob_colors[side.index()].to_rgba_f32(1.0);
        let (width, height) = self
            .blood
            .quad_size(Vector2::new(PARTICLE_SIZE as f32, PARTICLE_SIZE as f32));
        let quad = Quad::centered(position, width, height);
        self.pipeline.draw(&self.gl, &quad, Some(self.blood.texture), color);
        Ok(())
    }

    fn end_draw_particles(&mut self) {}

    fn draw_game(&mut self, snapshot: &MatchSnapshot) -> Result<(), String> {
        if let Some(background) = &self.background {
            self.draw_texture(
                background,
                Vector2::new(SCREEN_WIDTH as f32 / 2.0, SCREEN_HEIGHT as f32 / 2.0),
                WHITE,
            );
        }

        let marker = if marker_is_dark(self.ticks()) { BLACK } else { WHITE };
        self.fill(marker_rect(snapshot.ball_position.x, BALL_MARKER_Y), marker);
        self.fill(marker_rect(self.mouse_marker, MOUSE_MARKER_Y), marker);

        let frames = [
            blob_frame(snapshot.blob_state(PlayerSide::Left)),
            blob_frame(snapshot.blob_state(PlayerSide::Right)),
        ];

        if self.show_shadow {
            let shadow = ball_shadow_rect(ball_shadow_position(snapshot.ball_position));
            let (width, height) = self
                .ball_shadow
                .quad_size(Vector2::new(shadow.width as f32, shadow.height as f32));
            let quad = Quad::centered(rect_center(shadow), width, height);
            self.pipeline
                .draw(&self.gl, &quad, Some(self.ball_shadow.texture), BALL_SHADOW_COLOR);

            for side in PlayerSide::BOTH {
                let rect = blob_shadow_rect(blob_shadow_position(snapshot.blob_position(side)));
                let color = self.blob_colors[side.index()].to_rgba_f32(1.0);
                self.draw_texture(&self.blob_shadows[frames[side.index()]], rect_center(rect), color);
            }
        }

        self.ball_trail.push(snapshot.ball_position);
        self.draw_ball_trail();

        let ball = &self.ball[ball_frame(snapshot.ball_rotation)];
        let (width, height) = ball.quad_size(Vector2::new(BALL_SIZE as f32, BALL_SIZE as f32));
        let quad = Quad::centered(snapshot.ball_position, width, height);
        self.pipeline.draw(&self.gl, &quad, Some(ball.texture), WHITE);

        for side in PlayerSide::BOTH {
            let color = self.blob_colors[side.index()];
            self.draw_blob_frame(frames[side.index()], snapshot.blob_position(side), color);
        }

        Ok(())
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        let mut textures: Vec<glow::Texture> = Vec::new();
        textures.extend(self.background.iter().map(|t| t.texture));
        textures.extend(self.ball.iter().map(|t| t.texture));
        textures.push(self.ball_shadow.texture);
        textures.extend(self.blobs.iter().map(|t| t.texture));
        textures.extend(self.blob_specular.iter().map(|t| t.texture));
        textures.extend(self.blob_shadows.iter().map(|t| t.texture));
        textures.push(self.blood.texture);
        textures.push(self.font.normal.texture);
        textures.push(self.font.highlight.texture);
        textures.extend(self.images.loaded().map(|t| t.texture));

        unsafe {
            for texture in textures {
                self.gl.delete_texture(texture);
            }
        }
        self.pipeline.destroy(&self.gl);
        debug!("OpenGL resources released");
    }
}
