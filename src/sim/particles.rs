//! Particle bursts for death and victory effects
//!
//! Particles are purely cosmetic: they have no hitbox and never touch the
//! player. An emitter is removed from the level once every particle has died.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound on particles in a single emitter
pub const MAX_PARTICLES_PER_EMITTER: usize = 64;

/// Gravity applied to particles (units/tick²)
const PARTICLE_GRAVITY: f32 = 0.1;

/// A single particle, positioned relative to its emitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub speed: Vec2,
    pub angle: f32,
    pub angle_speed: f32,
    /// Remaining life in ticks
    pub life: f32,
}

/// An object that generates particles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleEmitter {
    pub color: [f32; 4],
    pub particles: Vec<Particle>,
}

impl ParticleEmitter {
    /// Spawn `count` particles with life around `life` ticks
    pub fn burst<R: Rng>(rng: &mut R, count: usize, life: f32, color: [f32; 4]) -> Self {
        let count = count.min(MAX_PARTICLES_PER_EMITTER);
        let particles = (0..count)
            .map(|_| Particle {
                x: 0.0,
                y: 0.0,
                speed: Vec2::new(
                    3.0 * (rng.random::<f32>() - 0.5),
                    2.0 * (rng.random::<f32>() / 2.0 + 0.5),
                ),
                angle: 0.0,
                angle_speed: (rng.random::<f32>() - 0.5) / 20.0,
                life: life * (rng.random::<f32>() / 2.0 + 0.5),
            })
            .collect();
        Self { color, particles }
    }

    /// Advance all particles. Returns false once the emitter is spent.
    pub fn tick(&mut self, delta: f32) -> bool {
        for p in &mut self.particles {
            p.speed.y -= PARTICLE_GRAVITY * delta;
            p.x += p.speed.x * delta;
            p.y += p.speed.y * delta;
            p.angle += p.angle_speed * delta;
            p.life -= delta;
        }
        self.particles.retain(|p| p.life > 0.0);
        !self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_burst_is_bounded() {
        let mut rng = Pcg32::seed_from_u64(7);
        let emitter = ParticleEmitter::burst(&mut rng, 1000, 60.0, [1.0; 4]);
        assert_eq!(emitter.particles.len(), MAX_PARTICLES_PER_EMITTER);
    }

    #[test]
    fn test_burst_life_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        let emitter = ParticleEmitter::burst(&mut rng, 15, 60.0, [1.0; 4]);
        assert_eq!(emitter.particles.len(), 15);
        for p in &emitter.particles {
            assert!(p.life >= 30.0 && p.life <= 60.0);
            assert!(p.speed.y >= 1.0);
        }
    }

    #[test]
    fn test_emitter_expires() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut emitter = ParticleEmitter::burst(&mut rng, 10, 20.0, [1.0; 4]);
        let mut ticks = 0;
        while emitter.tick(1.0) {
            ticks += 1;
            assert!(ticks <= 20, "emitter outlived its longest particle");
        }
        assert!(emitter.particles.is_empty());
    }
}
