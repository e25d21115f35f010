//! Match state snapshot consumed by the renderers
//!
//! The simulation lives elsewhere; each frame it hands over a read-only
//! snapshot with just what drawing needs.

use serde::{Deserialize, Serialize};

use crate::geometry::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSide {
    Left,
    Right,
}

impl PlayerSide {
    pub const BOTH: [PlayerSide; 2] = [PlayerSide::Left, PlayerSide::Right];

    pub fn index(self) -> usize {
        match self {
            PlayerSide::Left => 0,
            PlayerSide::Right => 1,
        }
    }

    pub fn other(self) -> PlayerSide {
        match self {
            PlayerSide::Left => PlayerSide::Right,
            PlayerSide::Right => PlayerSide::Left,
        }
    }
}

/// Per-frame view of a running match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub ball_position: Vector2,
    /// Ball rotation in radians
    pub ball_rotation: f32,
    pub blob_positions: [Vector2; 2],
    /// Animation state per blob; the integer part selects the frame
    pub blob_states: [f32; 2],
}

impl MatchSnapshot {
    pub fn blob_position(&self, side: PlayerSide) -> Vector2 {
        self.blob_positions[side.index()]
    }

    pub fn blob_state(&self, side: PlayerSide) -> f32 {
        self.blob_states[side.index()]
    }
}

impl Default for MatchSnapshot {
    fn default() -> Self {
        MatchSnapshot {
            ball_position: Vector2::new(200.0, 250.0),
            ball_rotation: 0.0,
            blob_positions: [Vector2::new(200.0, 455.5), Vector2::new(600.0, 455.5)],
            blob_states: [0.0, 0.0],
        }
    }
}
