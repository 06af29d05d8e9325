//=========================================================================
// Mechanic Animation Controller
//=========================================================================
//
// Tweened scalar property animation owned by a mechanic or effect.
//
// Architecture:
//   animate(key, from, to, duration, easing) → Vec<(K, Tween)>
//   update(dt) → AnimationFrame { key, value, finished } per running tween
//
// Each mechanic keys tweens by its own property enum and applies the
// produced values to its visual state. `stop_all()` interrupts every
// tween instantly, which is what `reset()` relies on mid-animation.
//
//=========================================================================

//=== Easing ==============================================================

/// Easing curves for normalized time `t` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicOut,
    /// Slight overshoot before settling, used for pop-up reveals.
    BackOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicOut => {
                let p = t - 1.0;
                p * p * p + 1.0
            }
            Easing::BackOut => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                let p = t - 1.0;
                1.0 + C3 * p * p * p + C1 * p * p
            }
        }
    }
}

//=== Tween ===============================================================

/// Interpolates one scalar from `from` to `to` over `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub elapsed: f32,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }

    pub fn value(&self) -> f32 {
        self.from + (self.to - self.from) * self.easing.apply(self.progress())
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

//=== AnimationFrame ======================================================

/// Value produced by one tween during [`Animator::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame<K> {
    pub key: K,
    pub value: f32,
    pub finished: bool,
}

//=== Animator ============================================================

/// Set of running tweens keyed by property.
///
/// Starting a tween on a key that is already animating replaces it.
pub struct Animator<K> {
    tweens: Vec<(K, Tween)>,
}

impl<K: Copy + PartialEq> Animator<K> {
    pub fn new() -> Self {
        Self { tweens: Vec::new() }
    }

    /// Starts (or restarts) the tween for `key`.
    pub fn animate(&mut self, key: K, from: f32, to: f32, duration: f32, easing: Easing) {
        self.stop(key);
        self.tweens.push((key, Tween::new(from, to, duration, easing)));
    }

    /// Advances every tween; finished tweens are reported once and dropped.
    pub fn update(&mut self, dt: f32) -> Vec<AnimationFrame<K>> {
        let mut frames = Vec::with_capacity(self.tweens.len());

        for (key, tween) in &mut self.tweens {
            tween.advance(dt);
            frames.push(AnimationFrame {
                key: *key,
                value: tween.value(),
                finished: tween.is_finished(),
            });
        }

        self.tweens.retain(|(_, tween)| !tween.is_finished());
        frames
    }

    pub fn stop(&mut self, key: K) {
        self.tweens.retain(|(k, _)| *k != key);
    }

    pub fn stop_all(&mut self) {
        self.tweens.clear();
    }

    pub fn is_animating(&self, key: K) -> bool {
        self.tweens.iter().any(|(k, _)| *k == key)
    }

    pub fn is_idle(&self) -> bool {
        self.tweens.is_empty()
    }
}

impl<K: Copy + PartialEq> Default for Animator<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Prop {
        Offset,
        Scale,
    }

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [
            Easing::Linear,
            Easing::QuadIn,
            Easing::QuadOut,
            Easing::QuadInOut,
            Easing::CubicOut,
            Easing::BackOut,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-5, "{:?} must start at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{:?} must end at 1", easing);
        }
    }

    #[test]
    fn tween_reaches_target() {
        let mut tween = Tween::new(0.0, 50.0, 0.5, Easing::QuadOut);
        tween.advance(0.25);
        assert!(tween.value() > 25.0, "QuadOut should be past halfway at half time");
        tween.advance(0.5);
        assert_eq!(tween.value(), 50.0);
        assert!(tween.is_finished());
    }

    #[test]
    fn zero_duration_tween_is_immediately_finished() {
        let tween = Tween::new(1.0, 2.0, 0.0, Easing::Linear);
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 2.0);
    }

    #[test]
    fn animator_reports_finish_once() {
        let mut animator = Animator::new();
        animator.animate(Prop::Offset, 0.0, 1.0, 0.1, Easing::Linear);

        let frames = animator.update(0.2);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].finished);
        assert!(animator.update(0.2).is_empty());
        assert!(animator.is_idle());
    }

    #[test]
    fn restarting_a_key_replaces_tween() {
        let mut animator = Animator::new();
        animator.animate(Prop::Scale, 0.0, 1.0, 1.0, Easing::Linear);
        animator.animate(Prop::Scale, 1.0, 0.0, 1.0, Easing::Linear);

        let frames = animator.update(0.5);
        assert_eq!(frames.len(), 1);
        assert!((frames[0].value - 0.5).abs() < 1e-5);
    }

    #[test]
    fn stop_all_interrupts_everything() {
        let mut animator = Animator::new();
        animator.animate(Prop::Offset, 0.0, 1.0, 1.0, Easing::Linear);
        animator.animate(Prop::Scale, 0.0, 1.0, 1.0, Easing::Linear);

        animator.stop_all();
        assert!(animator.is_idle());
        assert!(!animator.is_animating(Prop::Offset));
    }
}
