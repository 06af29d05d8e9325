//=========================================================================
// Glow and Connection Effects
//=========================================================================
//
// GlowEffect:       intensity rises and falls, `pulses` times.
// ConnectionEffect: a line drawn through the anchors of the mechanics
//                   that completed a combination, held, then faded out.
//
//=========================================================================

//=== External Dependencies ===============================================

use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{Animator, Easing, Effect, EffectKind};
use crate::core::math::Vec3;
use crate::core::schedule::TaskQueue;

//=== GlowEffect ==========================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlowOptions {
    pub peak: f32,
    /// Seconds per pulse (rise + fall).
    pub duration: f32,
    pub pulses: u32,
}

impl Default for GlowOptions {
    fn default() -> Self {
        Self {
            peak: 1.0,
            duration: 1.0,
            pulses: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlowPhase {
    Rise,
    Fall,
}

pub struct GlowEffect {
    id: String,
    options: GlowOptions,
    origin: Vec3,
    intensity: f32,
    pulses_left: u32,
    animator: Animator<GlowPhase>,
    plays: u32,
}

impl GlowEffect {
    pub fn new(id: impl Into<String>, options: GlowOptions) -> Self {
        Self {
            id: id.into(),
            options,
            origin: Vec3::ZERO,
            intensity: 0.0,
            pulses_left: 0,
            animator: Animator::new(),
            plays: 0,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    fn rise(&mut self) {
        let half = self.options.duration / 2.0;
        self.animator
            .animate(GlowPhase::Rise, self.intensity, self.options.peak, half, Easing::QuadOut);
    }
}

impl Effect for GlowEffect {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EffectKind {
        EffectKind::Glow
    }

    fn play(&mut self, origin: Vec3) {
        self.plays += 1;
        self.origin = origin;
        self.animator.stop_all();
        self.pulses_left = self.options.pulses.max(1);
        self.rise();
    }

    fn stop(&mut self) {
        self.animator.stop_all();
        self.pulses_left = 0;
        self.intensity = 0.0;
    }

    fn update(&mut self, dt: f32) {
        let half = self.options.duration / 2.0;
        for frame in self.animator.update(dt) {
            self.intensity = frame.value;
            if !frame.finished {
                continue;
            }
            match frame.key {
                GlowPhase::Rise => {
                    self.animator
                        .animate(GlowPhase::Fall, self.intensity, 0.0, half, Easing::QuadIn);
                }
                GlowPhase::Fall => {
                    self.pulses_left = self.pulses_left.saturating_sub(1);
                    if self.pulses_left > 0 {
                        self.rise();
                    }
                }
            }
        }
    }

    fn is_playing(&self) -> bool {
        !self.animator.is_idle()
    }

    fn play_count(&self) -> u32 {
        self.plays
    }
}

//=== ConnectionEffect ====================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionOptions {
    pub draw_duration: f32,
    pub hold: f32,
    pub fade_duration: f32,
    /// Fixed anchors, used when configured from a scene file.
    pub points: Vec<Vec3>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            draw_duration: 0.8,
            hold: 1.5,
            fade_duration: 0.5,
            points: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionProp {
    Draw,
    Opacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionTask {
    Fade,
}

pub struct ConnectionEffect {
    id: String,
    options: ConnectionOptions,
    points: Vec<Vec3>,
    drawn: f32,
    opacity: f32,
    animator: Animator<ConnectionProp>,
    tasks: TaskQueue<ConnectionTask>,
    plays: u32,
}

impl ConnectionEffect {
    pub fn new(id: impl Into<String>, points: Vec<Vec3>, options: ConnectionOptions) -> Self {
        let points = if points.is_empty() { options.points.clone() } else { points };
        Self {
            id: id.into(),
            options,
            points,
            drawn: 0.0,
            opacity: 0.0,
            animator: Animator::new(),
            tasks: TaskQueue::new(),
            plays: 0,
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Fraction of the polyline currently drawn.
    pub fn drawn(&self) -> f32 {
        self.drawn
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

impl Effect for ConnectionEffect {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EffectKind {
        EffectKind::Connection
    }

    /// The line runs through its anchors; `origin` is ignored.
    fn play(&mut self, _origin: Vec3) {
        self.plays += 1;
        self.tasks.cancel_all();
        self.opacity = 1.0;
        self.drawn = 0.0;
        self.animator
            .animate(ConnectionProp::Draw, 0.0, 1.0, self.options.draw_duration, Easing::QuadInOut);
        self.tasks
            .schedule(self.options.draw_duration + self.options.hold, ConnectionTask::Fade);
    }

    fn stop(&mut self) {
        self.animator.stop_all();
        self.tasks.cancel_all();
        self.opacity = 0.0;
    }

    fn update(&mut self, dt: f32) {
        for frame in self.animator.update(dt) {
            match frame.key {
                ConnectionProp::Draw => self.drawn = frame.value,
                ConnectionProp::Opacity => self.opacity = frame.value,
            }
        }

        for task in self.tasks.advance(dt) {
            match task {
                ConnectionTask::Fade => self.animator.animate(
                    ConnectionProp::Opacity,
                    self.opacity,
                    0.0,
                    self.options.fade_duration,
                    Easing::Linear,
                ),
            }
        }
    }

    fn is_playing(&self) -> bool {
        !self.animator.is_idle() || !self.tasks.is_empty()
    }

    fn play_count(&self) -> u32 {
        self.plays
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
