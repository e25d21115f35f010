//! Textured quad pipeline for the OpenGL backend
//!
//! One shader program draws every sprite, overlay and glyph as a quad in
//! logical screen coordinates. The fragment color is the texel multiplied by
//! a color uniform, which is how team colors are applied on the GPU.

use glow::{HasContext, PixelUnpackData};

use crate::geometry::{SCREEN_HEIGHT, SCREEN_WIDTH, Vector2};
use crate::tint::{self, PixelImage};

const VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_uv;
uniform vec2 u_screen;
out vec2 v_uv;
void main() {
    vec2 ndc = vec2(a_position.x / u_screen.x * 2.0 - 1.0, 1.0 - a_position.y / u_screen.y * 2.0);
    gl_Position = vec4(ndc, 0.0, 1.0);
    v_uv = a_uv;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_uv;
uniform sampler2D u_texture;
uniform vec4 u_color;
uniform int u_textured;
out vec4 frag_color;
void main() {
    vec4 texel = u_textured != 0 ? texture(u_texture, v_uv) : vec4(1.0);
    frag_color = texel * u_color;
}
"#;

/// Floats per vertex: position xy, uv
const VERTEX_FLOATS: usize = 4;
const QUAD_VERTICES: usize = 6;

/// Axis-aligned quad in screen coordinates with its texture coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Texture coordinates: left, top, right, bottom
    pub uv: [f32; 4],
}

impl Quad {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Quad {
            x,
            y,
            width,
            height,
            uv: [0.0, 0.0, 1.0, 1.0],
        }
    }

    pub fn centered(center: Vector2, width: f32, height: f32) -> Self {
        Quad::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn with_uv(mut self, uv: [f32; 4]) -> Self {
        self.uv = uv;
        self
    }

    /// Two triangles, counter-clockwise on screen
    pub fn vertices(&self) -> [f32; VERTEX_FLOATS * QUAD_VERTICES] {
        let (left, top) = (self.x, self.y);
        let (right, bottom) = (self.x + self.width, self.y + self.height);
        let [u0, v0, u1, v1] = self.uv;
        [
            left, top, u0, v0, //
            left, bottom, u0, v1, //
            right, bottom, u1, v1, //
            left, top, u0, v0, //
            right, bottom, u1, v1, //
            right, top, u1, v0,
        ]
    }
}

/// A texture on the GPU, padded to power-of-two dimensions
pub struct GlTexture {
    pub texture: glow::Texture,
    /// Padded size
    pub width: u32,
    pub height: u32,
    /// Size of the image before padding
    pub natural_width: u32,
    pub natural_height: u32,
}

impl GlTexture {
    pub fn quad_size(&self, size: Vector2) -> (f32, f32) {
        padded_quad_size(
            (self.natural_width, self.natural_height),
            (self.width, self.height),
            size,
        )
    }
}

/// Quad size that shows an unpadded image at `size` (zero keeps the natural size)
pub fn padded_quad_size(natural: (u32, u32), padded: (u32, u32), size: Vector2) -> (f32, f32) {
    if size.is_zero() || natural.0 == 0 || natural.1 == 0 {
        return (padded.0 as f32, padded.1 as f32);
    }
    (
        size.x * padded.0 as f32 / natural.0 as f32,
        size.y * padded.1 as f32 / natural.1 as f32,
    )
}

/// Uploads an image, padding it so the source sits centered in a power-of-two texture
pub fn upload_texture(gl: &glow::Context, image: &PixelImage) -> Result<GlTexture, String> {
    let padded = tint::pad_to_power_of_two(image);
    unsafe {
        let texture = gl.create_texture()?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            padded.width() as i32,
            padded.height() as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            PixelUnpackData::Slice(Some(padded.as_bytes())),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);

        Ok(GlTexture {
            texture,
            width: padded.width(),
            height: padded.height(),
            natural_width: image.width(),
            natural_height: image.height(),
        })
    }
}

pub fn upload_textures(gl: &glow::Context, images: &[PixelImage]) -> Result<Vec<GlTexture>, String> {
    images.iter().map(|image| upload_texture(gl, image)).collect()
}

unsafe fn compile_shader(gl: &glow::Context, kind: u32, source: &str) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl.create_shader(kind)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(format!("Shader compilation error: {}", log));
        }
        Ok(shader)
    }
}

pub struct QuadPipeline {
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    u_screen: Option<glow::UniformLocation>,
    u_color: Option<glow::UniformLocation>,
    u_textured: Option<glow::UniformLocation>,
    u_texture: Option<glow::UniformLocation>,
}

impl QuadPipeline {
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        unsafe {
            let vertex = compile_shader(gl, glow::VERTEX_SHADER, VERTEX_SHADER)?;
            let fragment = compile_shader(gl, glow::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

            let program = gl.create_program()?;
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(format!("Program linking error: {}", log));
            }

            let vao = gl.create_vertex_array()?;
            let vbo = gl.create_buffer()?;
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            let stride = (VERTEX_FLOATS * std::mem::size_of::<f32>()) as i32;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(
                1,
                2,
                glow::FLOAT,
                false,
                stride,
                (2 * std::mem::size_of::<f32>()) as i32,
            );
            gl.bind_vertex_array(None);

            Ok(QuadPipeline {
                u_screen: gl.get_uniform_location(program, "u_screen"),
                u_color: gl.get_uniform_location(program, "u_color"),
                u_textured: gl.get_uniform_location(program, "u_textured"),
                u_texture: gl.get_uniform_location(program, "u_texture"),
                program,
                vao,
                vbo,
            })
        }
    }

    /// Binds the program and sets per-frame state; call once before drawing
    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(Some(self.program));
            gl.uniform_2_f32(self.u_screen.as_ref(), SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32);
            gl.uniform_1_i32(self.u_texture.as_ref(), 0);
            gl.active_texture(glow::TEXTURE0);
            gl.bind_vertex_array(Some(self.vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        }
    }

    /// Draws one quad, textured or flat, multiplied by `color`
    pub fn draw(&self, gl: &glow::Context, quad: &Quad, texture: Option<glow::Texture>, color: [f32; 4]) {
        let vertices = quad.vertices();
        unsafe {
            gl.uniform_4_f32(self.u_color.as_ref(), color[0], color[1], color[2], color[3]);
            gl.uniform_1_i32(self.u_textured.as_ref(), i32::from(texture.is_some()));
            gl.bind_texture(glow::TEXTURE_2D, texture);
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&vertices),
                glow::STREAM_DRAW,
            );
            gl.draw_arrays(glow::TRIANGLES, 0, QUAD_VERTICES as i32);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_buffer(self.vbo);
            gl.delete_vertex_array(self.vao);
            gl.delete_program(self.program);
        }
    }
}

/// Where each glyph of a fixed-size bitmap font sits inside one atlas texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub columns: u32,
    pub glyph_width: u32,
    pub glyph_height: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasLayout {
    /// Packs `count` glyphs in rows into a power-of-two sized atlas
    pub fn new(count: u32, glyph_width: u32, glyph_height: u32) -> Self {
        let side = (count as f32).sqrt().ceil().max(1.0) as u32;
        let width = tint::next_power_of_two(side * glyph_width);
        let columns = (width / glyph_width.max(1)).max(1);
        let rows = count.div_ceil(columns).max(1);
        let height = tint::next_power_of_two(rows * glyph_height);
        AtlasLayout {
            columns,
            glyph_width,
            glyph_height,
            width,
            height,
        }
    }

    /// Top-left pixel of glyph `index`
    pub fn origin(&self, index: u32) -> (u32, u32) {
        (
            (index % self.columns) * self.glyph_width,
            (index / self.columns) * self.glyph_height,
        )
    }

    /// Texture coordinates of glyph `index`: left, top, right, bottom
    pub fn uv(&self, index: u32) -> [f32; 4] {
        let (x, y) = self.origin(index);
        [
            x as f32 / self.width as f32,
            y as f32 / self.height as f32,
            (x + self.glyph_width) as f32 / self.width as f32,
            (y + self.glyph_height) as f32 / self.height as f32,
        ]
    }
}

/// Copies equally sized glyph images into one atlas image
pub fn build_atlas(glyphs: &[PixelImage]) -> Result<(PixelImage, AtlasLayout), String> {
    let first = glyphs.first().ok_or("font has no glyphs")?;
    let (glyph_width, glyph_height) = (first.width(), first.height());
    let layout = AtlasLayout::new(glyphs.len() as u32, glyph_width, glyph_height);

    let mut atlas = PixelImage::new(layout.width, layout.height);
    for (index, glyph) in glyphs.iter().enumerate() {
        if glyph.width() != glyph_width || glyph.height() != glyph_height {
            return Err(format!(
                "glyph {} is {}x{}, expected {}x{}",
                index,
                glyph.width(),
                glyph.height(),
                glyph_width,
                glyph_height
            ));
        }
        let (ox, oy) = layout.origin(index as u32);
        for y in 0..glyph_height {
            for x in 0..glyph_width {
                atlas.set_pixel(ox + x, oy + y, glyph.pixel(x, y));
            }
        }
    }
    Ok((atlas, layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_vertices() {
        let quad = Quad::new(10.0, 20.0, 30.0, 40.0);
        let v = quad.vertices();
        // first vertex: top-left
        assert_eq!(&v[0..4], &[10.0, 20.0, 0.0, 0.0]);
        // third vertex: bottom-right
        assert_eq!(&v[8..12], &[40.0, 60.0, 1.0, 1.0]);
        // last vertex: top-right
        assert_eq!(&v[20..24], &[40.0, 20.0, 1.0, 0.0]);
    }

    #[test]
    fn test_centered_quad() {
        let quad = Quad::centered(Vector2::new(400.0, 300.0), 1024.0, 1024.0);
        assert_eq!(quad.x, -112.0);
        assert_eq!(quad.y, -212.0);
    }

    #[test]
    fn test_atlas_layout_for_font() {
        let layout = AtlasLayout::new(59, 24, 24);
        // 8 glyphs per side -> 192 px -> 256 wide, 10 per row, 6 rows -> 144 -> 256 high
        assert_eq!(layout.width, 256);
        assert_eq!(layout.columns, 10);
        assert_eq!(layout.height, 256);
        assert_eq!(layout.origin(0), (0, 0));
        assert_eq!(layout.origin(10), (0, 24));
        assert_eq!(layout.origin(58), (8 * 24, 5 * 24));

        let uv = layout.uv(1);
        assert_eq!(uv, [24.0 / 256.0, 0.0, 48.0 / 256.0, 24.0 / 256.0]);
    }

    #[test]
    fn test_build_atlas_copies_glyphs() {
        let glyphs = vec![
            PixelImage::filled(2, 2, [1, 1, 1, 255]),
            PixelImage::filled(2, 2, [2, 2, 2, 255]),
            PixelImage::filled(2, 2, [3, 3, 3, 255]),
        ];
        let (atlas, layout) = build_atlas(&glyphs).unwrap();
        assert_eq!((layout.width, layout.height), (4, 4));
        assert_eq!(atlas.pixel(0, 0), [1, 1, 1, 255]);
        assert_eq!(atlas.pixel(3, 1), [2, 2, 2, 255]);
        assert_eq!(atlas.pixel(1, 3), [3, 3, 3, 255]);
        assert_eq!(atlas.pixel(3, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn test_build_atlas_rejects_mixed_sizes() {
        let glyphs = vec![PixelImage::new(2, 2), PixelImage::new(3, 2)];
        assert!(build_atlas(&glyphs).is_err());
        assert!(build_atlas(&[]).is_err());
    }

    #[test]
    fn test_quad_size_scales_padding() {
        assert_eq!(padded_quad_size((75, 89), (128, 128), Vector2::ZERO), (128.0, 128.0));
        assert_eq!(padded_quad_size((75, 89), (128, 128), Vector2::new(150.0, 89.0)), (256.0, 128.0));
        assert_eq!(padded_quad_size((800, 600), (1024, 1024), Vector2::new(800.0, 600.0)), (1024.0, 1024.0));
    }
}
