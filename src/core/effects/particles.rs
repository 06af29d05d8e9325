//=========================================================================
// Particle Burst Effect
//=========================================================================
//
// Radial burst of particles launched from the effect origin, falling
// under gravity until a cleanup task clears them.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::f32::consts::TAU;

use log::trace;
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{Effect, EffectKind};
use crate::core::math::Vec3;
use crate::core::schedule::TaskQueue;

//=== Options =============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BurstOptions {
    pub count: usize,
    pub speed: f32,
    /// Seconds before the burst is cleared.
    pub lifetime: f32,
    pub gravity: f32,
    pub seed: Option<u64>,
}

impl Default for BurstOptions {
    fn default() -> Self {
        Self {
            count: 24,
            speed: 120.0,
            lifetime: 1.2,
            gravity: 200.0,
            seed: None,
        }
    }
}

//=== Particle ============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub age: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BurstTask {
    Cleanup,
}

//=== ParticleBurst =======================================================

pub struct ParticleBurst {
    id: String,
    options: BurstOptions,
    rng: fastrand::Rng,
    particles: Vec<Particle>,
    tasks: TaskQueue<BurstTask>,
    plays: u32,
}

impl ParticleBurst {
    pub fn new(id: impl Into<String>, options: BurstOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            id: id.into(),
            options,
            rng,
            particles: Vec::new(),
            tasks: TaskQueue::new(),
            plays: 0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

impl Effect for ParticleBurst {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EffectKind {
        EffectKind::Burst
    }

    fn play(&mut self, origin: Vec3) {
        self.plays += 1;
        self.tasks.cancel_all();

        let rng = &mut self.rng;
        let speed = self.options.speed;
        self.particles = (0..self.options.count)
            .map(|_| {
                let angle = rng.f32() * TAU;
                let magnitude = speed * (0.5 + 0.5 * rng.f32());
                Particle {
                    position: origin,
                    velocity: Vec3::new(angle.cos() * magnitude, angle.sin() * magnitude, rng.f32() * magnitude * 0.25),
                    age: 0.0,
                }
            })
            .collect();

        self.tasks.schedule(self.options.lifetime, BurstTask::Cleanup);
        trace!("Burst '{}' spawned {} particle(s)", self.id, self.particles.len());
    }

    fn stop(&mut self) {
        self.tasks.cancel_all();
        self.particles.clear();
    }

    fn update(&mut self, dt: f32) {
        let gravity = self.options.gravity;
        for particle in &mut self.particles {
            particle.velocity.y -= gravity * dt;
            particle.position = particle.position + particle.velocity * dt;
            particle.age += dt;
        }

        for task in self.tasks.advance(dt) {
            match task {
                BurstTask::Cleanup => self.particles.clear(),
            }
        }
    }

    fn is_playing(&self) -> bool {
        !self.particles.is_empty()
    }

    fn play_count(&self) -> u32 {
        self.plays
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn burst() -> ParticleBurst {
        ParticleBurst::new(
            "sparks",
            BurstOptions {
                seed: Some(7),
                ..BurstOptions::default()
            },
        )
    }

    #[test]
    fn play_spawns_and_cleanup_clears() {
        let mut b = burst();
        b.play(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(b.particles().len(), 24);
        assert!(b.is_playing());

        b.update(0.1);
        assert!(b.particles().iter().all(|p| p.position != Vec3::new(10.0, 0.0, 0.0)));

        for _ in 0..20 {
            b.update(0.1);
        }
        assert!(!b.is_playing());
        assert_eq!(b.play_count(), 1);
    }

    #[test]
    fn replay_restarts_cleanup_timer() {
        let mut b = burst();
        b.play(Vec3::ZERO);
        for _ in 0..10 {
            b.update(0.1);
        }
        b.play(Vec3::ZERO);
        for _ in 0..5 {
            b.update(0.1);
        }
        assert!(b.is_playing(), "Earlier cleanup must not clear the new burst");
        assert_eq!(b.play_count(), 2);
    }

    #[test]
    fn stop_cancels_everything() {
        let mut b = burst();
        b.play(Vec3::ZERO);
        b.stop();
        assert!(!b.is_playing());
        b.update(5.0);
        assert!(!b.is_playing());
    }
}
