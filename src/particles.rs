//! Blood splatter particles
//!
//! A hit spawns a burst of small blood drops in the hit blob's color. Drops
//! fly outwards, fall under gravity and disappear once they leave the screen.

use rand::Rng;

use crate::geometry::{SCREEN_HEIGHT, SCREEN_WIDTH, Vector2};
use crate::match_state::PlayerSide;
use crate::render::RenderBackend;

const GRAVITY: f32 = 0.5;
const MIN_SPEED: f32 = 2.0;
const MAX_SPEED: f32 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BloodParticle {
    pub position: Vector2,
    pub velocity: Vector2,
    pub side: PlayerSide,
}

impl BloodParticle {
    fn on_screen(&self) -> bool {
        self.position.x >= 0.0
            && self.position.x <= SCREEN_WIDTH as f32
            && self.position.y <= SCREEN_HEIGHT as f32
    }
}

#[derive(Debug, Default)]
pub struct BloodSplatter {
    particles: Vec<BloodParticle>,
}

impl BloodSplatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `count` drops at `position`, spraying mostly upwards
    pub fn spawn<R: Rng>(&mut self, rng: &mut R, position: Vector2, side: PlayerSide, count: usize) {
        for _ in 0..count {
            // Upper half circle, in radians from the positive x axis
            let angle = rng.random_range(std::f32::consts::PI..std::f32::consts::TAU);
            let speed = rng.random_range(MIN_SPEED..MAX_SPEED);
            self.particles.push(BloodParticle {
                position,
                velocity: Vector2::new(angle.cos() * speed, angle.sin() * speed),
                side,
            });
        }
    }

    /// Advances all drops by one frame and drops the ones that left the screen
    pub fn step(&mut self) {
        for particle in &mut self.particles {
            particle.velocity.y += GRAVITY;
            particle.position = particle.position + particle.velocity;
        }
        self.particles.retain(BloodParticle::on_screen);
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[BloodParticle] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend) -> Result<(), String> {
        if self.is_empty() {
            return Ok(());
        }
        backend.start_draw_particles();
        for particle in &self.particles {
            backend.draw_particle(particle.position, particle.side)?;
        }
        backend.end_draw_particles();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::render::recording::{Call, RecordingBackend};

    #[test]
    fn test_spawn_sprays_upwards() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut splatter = BloodSplatter::new();
        splatter.spawn(&mut rng, Vector2::new(400.0, 300.0), PlayerSide::Left, 20);

        assert_eq!(splatter.particles().len(), 20);
        for particle in splatter.particles() {
            assert!(particle.velocity.y <= 0.0);
            let speed = (particle.velocity.x.powi(2) + particle.velocity.y.powi(2)).sqrt();
            assert!(speed >= MIN_SPEED - 0.001 && speed <= MAX_SPEED + 0.001);
            assert_eq!(particle.side, PlayerSide::Left);
        }
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut splatter = BloodSplatter::new();
        splatter.particles.push(BloodParticle {
            position: Vector2::new(100.0, 100.0),
            velocity: Vector2::new(1.0, -2.0),
            side: PlayerSide::Right,
        });
        splatter.step();
        let particle = &splatter.particles()[0];
        assert_eq!(particle.velocity, Vector2::new(1.0, -1.5));
        assert_eq!(particle.position, Vector2::new(101.0, 98.5));
    }

    #[test]
    fn test_particles_leave_screen() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut splatter = BloodSplatter::new();
        splatter.spawn(&mut rng, Vector2::new(400.0, 590.0), PlayerSide::Left, 10);
        for _ in 0..200 {
            splatter.step();
        }
        assert!(splatter.is_empty());

        let mut backend = RecordingBackend::default();
        splatter.draw(&mut backend).unwrap();
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_draw_emits_one_call_per_drop() {
        let mut splatter = BloodSplatter::new();
        splatter.particles.push(BloodParticle {
            position: Vector2::new(10.0, 20.0),
            velocity: Vector2::ZERO,
            side: PlayerSide::Right,
        });
        let mut backend = RecordingBackend::default();
        splatter.draw(&mut backend).unwrap();
        assert_eq!(backend.calls, vec![Call::Particle(Vector2::new(10.0, 20.0), PlayerSide::Right)]);
    }
}
