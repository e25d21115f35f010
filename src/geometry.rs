//! Screen geometry and sprite layout
//!
//! All game coordinates live on a fixed 800x600 logical screen. Positions are
//! sprite centers; the functions here turn them into blit rectangles the same
//! way for both backends, so the canvas and GL renderers line up pixel for pixel.

use std::f32::consts::PI;
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

pub const SCREEN_WIDTH: u32 = 800;
pub const SCREEN_HEIGHT: u32 = 600;

pub const BLOB_WIDTH: u32 = 75;
pub const BLOB_HEIGHT: u32 = 89;
pub const BALL_SIZE: u32 = 64;
pub const PARTICLE_SIZE: u32 = 9;
pub const MARKER_SIZE: u32 = 5;

/// Number of rotation frames in the ball sprite sheet
pub const BALL_FRAMES: usize = 16;
/// Number of animation frames in the blob sprite sheet
pub const BLOB_FRAMES: usize = 5;

/// Ground line used to project shadows
const GROUND_Y: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f32> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f32) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

/// Integer blit rectangle in logical screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        ScreenRect { x, y, width, height }
    }

    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Vector2, width: u32, height: u32) -> Self {
        ScreenRect::new(
            (center.x - width as f32 / 2.0).round() as i32,
            (center.y - height as f32 / 2.0).round() as i32,
            width,
            height,
        )
    }

    /// Rectangle spanning two corners (top-left, bottom-right)
    pub fn spanning(top_left: Vector2, bottom_right: Vector2) -> Self {
        let x = top_left.x.round() as i32;
        let y = top_left.y.round() as i32;
        let w = (bottom_right.x - top_left.x).round().max(0.0) as u32;
        let h = (bottom_right.y - top_left.y).round().max(0.0) as u32;
        ScreenRect::new(x, y, w, h)
    }

    pub fn contains(&self, point: Vector2) -> bool {
        point.x >= self.x as f32
            && point.y >= self.y as f32
            && point.x < (self.x + self.width as i32) as f32
            && point.y < (self.y + self.height as i32) as f32
    }

    pub fn to_sdl(self) -> sdl2::rect::Rect {
        sdl2::rect::Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Blit rectangle of a blob centered on its position
pub fn blob_rect(position: Vector2) -> ScreenRect {
    ScreenRect::new(
        position.x.round() as i32 - 37,
        position.y.round() as i32 - 44,
        BLOB_WIDTH,
        BLOB_HEIGHT,
    )
}

pub fn ball_rect(position: Vector2) -> ScreenRect {
    ScreenRect::new(
        position.x.round() as i32 - 32,
        position.y.round() as i32 - 32,
        BALL_SIZE,
        BALL_SIZE,
    )
}

/// Shadow anchor for the ball, projected onto the ground line
pub fn ball_shadow_position(ball: Vector2) -> Vector2 {
    shadow_position(ball)
}

/// Shadow anchor for a blob, projected onto the ground line
pub fn blob_shadow_position(blob: Vector2) -> Vector2 {
    shadow_position(blob)
}

fn shadow_position(position: Vector2) -> Vector2 {
    Vector2::new(
        position.x + (GROUND_Y - position.y) / 4.0 + 16.0,
        GROUND_Y - (GROUND_Y - position.y) / 16.0 - 10.0,
    )
}

pub fn ball_shadow_rect(shadow: Vector2) -> ScreenRect {
    ScreenRect::new(
        shadow.x.round() as i32 - 32,
        shadow.y.round() as i32 - 8,
        69,
        17,
    )
}

pub fn blob_shadow_rect(shadow: Vector2) -> ScreenRect {
    ScreenRect::new(
        shadow.x.round() as i32 - 32,
        shadow.y.round() as i32 - 8,
        128,
        32,
    )
}

/// Marker strip rectangle: a 5x5 square centered horizontally on `x`
pub fn marker_rect(x: f32, y: i32) -> ScreenRect {
    ScreenRect::new((x - 2.5).round() as i32, y, MARKER_SIZE, MARKER_SIZE)
}

/// Sprite frame for a ball rotation given in radians
///
/// Negative rotations wrap around instead of indexing out of range.
pub fn ball_frame(rotation: f32) -> usize {
    let frame = (rotation / PI / 2.0 * BALL_FRAMES as f32).floor() as i64;
    frame.rem_euclid(BALL_FRAMES as i64) as usize
}

/// Sprite frame for a blob animation state
pub fn blob_frame(state: f32) -> usize {
    (state.floor() as i64).rem_euclid(BLOB_FRAMES as i64) as usize
}

/// Markers blink between white and black every half second
pub fn marker_is_dark(ticks_ms: u64) -> bool {
    ticks_ms % 1000 >= 500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_rect_centers_sprite() {
        let rect = blob_rect(Vector2::new(200.0, 450.0));
        assert_eq!(rect, ScreenRect::new(163, 406, 75, 89));
    }

    #[test]
    fn test_ball_rect() {
        let rect = ball_rect(Vector2::new(400.4, 100.6));
        assert_eq!(rect, ScreenRect::new(368, 69, 64, 64));
    }

    #[test]
    fn test_shadow_on_ground_is_below_object() {
        // An object resting on the ground line casts its shadow slightly offset
        let shadow = ball_shadow_position(Vector2::new(100.0, 500.0));
        assert_eq!(shadow, Vector2::new(116.0, 490.0));

        // Higher objects push the shadow to the right
        let high = ball_shadow_position(Vector2::new(100.0, 100.0));
        assert_eq!(high, Vector2::new(216.0, 465.0));
        assert_eq!(blob_shadow_position(Vector2::new(100.0, 100.0)), high);
    }

    #[test]
    fn test_shadow_rects() {
        let shadow = Vector2::new(216.0, 465.0);
        assert_eq!(ball_shadow_rect(shadow), ScreenRect::new(184, 457, 69, 17));
        assert_eq!(blob_shadow_rect(shadow), ScreenRect::new(184, 457, 128, 32));
    }

    #[test]
    fn test_ball_frame_wraps() {
        assert_eq!(ball_frame(0.0), 0);
        assert_eq!(ball_frame(PI), 8);
        assert_eq!(ball_frame(2.0 * PI + 0.01), 0);
        // -0.5 rad is 1.27 frames before zero, which floors to frame 14
        assert_eq!(ball_frame(-0.5), 14);
        assert_eq!(ball_frame(-0.1), 15);
        assert!(ball_frame(-123.0) < BALL_FRAMES);
    }

    #[test]
    fn test_blob_frame() {
        assert_eq!(blob_frame(0.0), 0);
        assert_eq!(blob_frame(4.9), 4);
        assert_eq!(blob_frame(-0.5), 4);
        assert_eq!(blob_frame(5.0), 0);
        assert_eq!(blob_frame(7.2), 2);
    }

    #[test]
    fn test_marker_blink() {
        assert!(!marker_is_dark(0));
        assert!(!marker_is_dark(499));
        assert!(marker_is_dark(500));
        assert!(marker_is_dark(1999));
        assert!(!marker_is_dark(2000));
    }

    #[test]
    fn test_screen_rect_contains() {
        let rect = ScreenRect::spanning(Vector2::new(10.0, 10.0), Vector2::new(20.0, 30.0));
        assert_eq!(rect, ScreenRect::new(10, 10, 10, 20));
        assert!(rect.contains(Vector2::new(10.0, 10.0)));
        assert!(rect.contains(Vector2::new(19.9, 29.9)));
        assert!(!rect.contains(Vector2::new(20.0, 15.0)));
        assert!(!rect.contains(Vector2::new(5.0, 15.0)));
    }

    #[test]
    fn test_centered_rect() {
        let rect = ScreenRect::centered(Vector2::new(100.0, 100.0), 9, 9);
        assert_eq!(rect, ScreenRect::new(96, 96, 9, 9));
    }
}
