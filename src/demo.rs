//! Scripted rally for the match screen
//!
//! There is no physics here: the ball flies along fixed parabolas between
//! the two blobs and the receiving blob walks to where the ball comes down.
//! It exists to drive `draw_game` with believable snapshots.

use crate::geometry::Vector2;
use crate::match_state::{MatchSnapshot, PlayerSide};

/// Frames one flight from blob to blob takes
pub const FLIGHT_FRAMES: u32 = 90;

const GROUND_Y: f32 = 455.5;
/// Ball height when touching a blob's head
const CONTACT_Y: f32 = 360.0;
const APEX_HEIGHT: f32 = 220.0;
const SPIN_PER_FRAME: f32 = 0.15;
const WALK_ANIMATION_SPEED: f32 = 0.2;

const LEFT_SPOTS: [f32; 3] = [200.0, 150.0, 260.0];
const RIGHT_SPOTS: [f32; 3] = [600.0, 650.0, 540.0];

/// One frame of the rally
#[derive(Debug, Clone, PartialEq)]
pub struct DemoFrame {
    pub snapshot: MatchSnapshot,
    /// Blob that touched the ball this frame, and where
    pub hit: Option<(PlayerSide, Vector2)>,
}

#[derive(Debug, Default)]
pub struct DemoRally {
    frame: u32,
    flight: u32,
    rotation: f32,
}

impl DemoRally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Side hitting the ball in the current flight
    pub fn hitter(&self) -> PlayerSide {
        if self.flight % 2 == 0 {
            PlayerSide::Left
        } else {
            PlayerSide::Right
        }
    }

    /// Produces the current frame and advances the script
    pub fn step(&mut self) -> DemoFrame {
        let snapshot = self.snapshot();
        let hit = (self.frame == 0).then(|| (self.hitter(), snapshot.ball_position));

        let direction = match self.hitter() {
            PlayerSide::Left => 1.0,
            PlayerSide::Right => -1.0,
        };
        self.rotation = (self.rotation + direction * SPIN_PER_FRAME).rem_euclid(std::f32::consts::TAU);

        self.frame += 1;
        if self.frame >= FLIGHT_FRAMES {
            self.frame = 0;
            self.flight += 1;
        }

        DemoFrame { snapshot, hit }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let t = self.frame as f32 / FLIGHT_FRAMES as f32;
        let hitter = self.hitter();
        let receiver = hitter.other();

        let start = spot(hitter, self.flight);
        let landing = spot(receiver, self.flight + 1);
        let ball_x = start + (landing - start) * t;
        let ball_y = CONTACT_Y - 4.0 * APEX_HEIGHT * t * (1.0 - t);

        // The receiver was the hitter of the previous flight
        let receiver_from = spot(receiver, self.flight.wrapping_sub(1));
        let receiver_x = receiver_from + (landing - receiver_from) * t;

        let mut blob_positions = [Vector2::ZERO; 2];
        blob_positions[hitter.index()] = Vector2::new(start, GROUND_Y);
        blob_positions[receiver.index()] = Vector2::new(receiver_x, GROUND_Y);

        let mut blob_states = [0.0; 2];
        if receiver_from != landing {
            blob_states[receiver.index()] = self.frame as f32 * WALK_ANIMATION_SPEED;
        }

        MatchSnapshot {
            ball_position: Vector2::new(ball_x, ball_y),
            ball_rotation: self.rotation,
            blob_positions,
            blob_states,
        }
    }
}

fn spot(side: PlayerSide, flight: u32) -> f32 {
    let spots = match side {
        PlayerSide::Left => &LEFT_SPOTS,
        PlayerSide::Right => &RIGHT_SPOTS,
    };
    spots[(flight % spots.len() as u32) as usize]
}
