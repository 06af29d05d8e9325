//=========================================================================
// Effects Services
//=========================================================================
//
// Supporting services consumed by mechanics and the scene manager:
// tweened animation, visual effects and sound cues.
//
//=========================================================================

//=== Module Declarations =================================================

mod animation;
mod effect;
mod generator;
mod glow;
mod particles;
mod sound;

//=== Public API ==========================================================

pub use animation::{AnimationFrame, Animator, Easing, Tween};
pub use effect::{Effect, EffectKind};
pub use generator::EffectGenerator;
pub use glow::{ConnectionEffect, ConnectionOptions, GlowEffect, GlowOptions};
pub use particles::{BurstOptions, Particle, ParticleBurst};
pub use sound::{AudioBackend, NullAudio, SoundController, SoundCue, SoundError};
