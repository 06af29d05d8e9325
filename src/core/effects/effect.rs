//=========================================================================
// Effect Contract
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::math::Vec3;

//=== EffectKind ==========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Burst,
    Glow,
    Connection,
}

impl EffectKind {
    /// Parses the `type` field of an effect entry (`particles` is accepted
    /// as an alias of `burst`).
    pub fn from_config(name: &str) -> Option<Self> {
        match name {
            "burst" | "particles" => Some(Self::Burst),
            "glow" => Some(Self::Glow),
            "connection" => Some(Self::Connection),
            _ => None,
        }
    }
}

//=== Effect Trait ========================================================

/// A transient visual effect driven by the frame tick.
///
/// `play` may be called again while the effect is still running; it
/// restarts from the new origin.
pub trait Effect {
    fn id(&self) -> &str;

    fn kind(&self) -> EffectKind;

    fn play(&mut self, origin: Vec3);

    /// Stops immediately and cancels any pending cleanup.
    fn stop(&mut self);

    fn update(&mut self, dt: f32);

    fn is_playing(&self) -> bool;

    /// Number of times `play` has been called.
    fn play_count(&self) -> u32;
}
