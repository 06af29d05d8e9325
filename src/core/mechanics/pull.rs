//=========================================================================
// Pull Mechanic
//=========================================================================
//
// A handle pulled down in one or more strokes. Once fully pulled the
// wire extends and the reveal fires after a short delay.
//
// Stages:
//   pull() → handle tween → (fully pulled) wire tween + Reveal task
//   Reveal task → trigger(Pulled)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::rc::Rc;

use log::debug;
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{HitTarget, Mechanic, MechanicCore, MechanicId, MechanicKind, PartId};
use crate::core::effects::{Animator, Easing};
use crate::core::event_bus::{EventBus, TriggerDetail};
use crate::core::math::{BoundingSphere, Vec3};
use crate::core::scene::{NodeFlags, NodeId, Transform, VisualNode};
use crate::core::schedule::TaskQueue;

//=== Options =============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PullOptions {
    pub position: Vec3,
    /// Total travel of the handle.
    pub distance: f32,
    pub pulls_required: u32,
    /// Seconds per pull stroke.
    pub duration: f32,
    pub wire_length: f32,
    pub reveal_delay: f32,
    pub handle_radius: f32,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            distance: 50.0,
            pulls_required: 1,
            duration: 0.5,
            wire_length: 100.0,
            reveal_delay: 0.5,
            handle_radius: 12.0,
        }
    }
}

//=== Internal Keys =======================================================

const HANDLE: PartId = PartId(0);
const WIRE: PartId = PartId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullProp {
    Handle,
    Wire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullTask {
    Reveal,
}

//=== PullMechanic ========================================================

pub struct PullMechanic {
    core: MechanicCore,
    options: PullOptions,
    strokes: u32,
    pulled: f32,
    handle_offset: f32,
    wire_extension: f32,
    animator: Animator<PullProp>,
    tasks: TaskQueue<PullTask>,
}

impl PullMechanic {
    pub fn new(id: MechanicId, name: impl Into<String>, options: PullOptions, bus: Rc<EventBus>) -> Self {
        let options = PullOptions {
            pulls_required: options.pulls_required.max(1),
            ..options
        };
        Self {
            core: MechanicCore::new(id, name, MechanicKind::Pull, options.position, bus),
            options,
            strokes: 0,
            pulled: 0.0,
            handle_offset: 0.0,
            wire_extension: 0.0,
            animator: Animator::new(),
            tasks: TaskQueue::new(),
        }
    }

    /// Advances the handle by one stroke.
    pub fn pull(&mut self) -> bool {
        if self.core.is_triggered() || self.is_busy() || self.is_fully_pulled() {
            return false;
        }

        self.strokes += 1;
        let target = self.options.distance * self.strokes as f32 / self.options.pulls_required as f32;

        debug!("Pull '{}' {} -> {}", self.core.name(), self.pulled, target);
        self.animator
            .animate(PullProp::Handle, self.pulled, target, self.options.duration, Easing::QuadOut);
        self.pulled = target;
        true
    }

    pub fn pulled_distance(&self) -> f32 {
        self.pulled
    }

    pub fn is_fully_pulled(&self) -> bool {
        self.strokes >= self.options.pulls_required
    }

    pub fn handle_offset(&self) -> f32 {
        self.handle_offset
    }

    fn handle_position(&self) -> Vec3 {
        self.options.position - Vec3::new(0.0, self.handle_offset, 0.0)
    }
}

impl Mechanic for PullMechanic {
    fn core(&self) -> &MechanicCore {
        &self.core
    }

    fn reset(&mut self) {
        self.tasks.cancel_all();
        self.animator.stop_all();
        self.strokes = 0;
        self.pulled = 0.0;
        self.handle_offset = 0.0;
        self.wire_extension = 0.0;
        self.core.clear_trigger();
    }

    fn update(&mut self, dt: f32) {
        for frame in self.animator.update(dt) {
            match frame.key {
                PullProp::Handle => {
                    self.handle_offset = frame.value;
                    if frame.finished && self.is_fully_pulled() {
                        self.animator.animate(
                            PullProp::Wire,
                            0.0,
                            self.options.wire_length,
                            self.options.duration * 0.5,
                            Easing::Linear,
                        );
                        self.tasks.schedule(self.options.reveal_delay, PullTask::Reveal);
                    }
                }
                PullProp::Wire => self.wire_extension = frame.value,
            }
        }

        for task in self.tasks.advance(dt) {
            match task {
                PullTask::Reveal => {
                    self.core.trigger(TriggerDetail::Pulled {
                        distance: self.pulled,
                    });
                }
            }
        }
    }

    fn is_busy(&self) -> bool {
        !self.animator.is_idle() || !self.tasks.is_empty()
    }

    fn primary_action(&mut self, part: PartId) -> bool {
        part == HANDLE && self.pull()
    }

    fn hit_targets(&self) -> Vec<HitTarget> {
        vec![HitTarget {
            part: HANDLE,
            bounds: BoundingSphere::new(self.handle_position(), self.options.handle_radius),
            flags: NodeFlags::CLICKABLE,
        }]
    }

    fn nodes(&self) -> Vec<VisualNode> {
        let id = self.core.id();
        let wire_scale = if self.options.wire_length > 0.0 {
            self.wire_extension / self.options.wire_length
        } else {
            0.0
        };

        vec![
            VisualNode {
                id: NodeId { mechanic: id, part: HANDLE.0 as u32 },
                transform: Transform::at(self.handle_position()),
                flags: NodeFlags::CLICKABLE,
                visible: true,
            },
            VisualNode {
                id: NodeId { mechanic: id, part: WIRE.0 as u32 },
                transform: Transform {
                    scale: Vec3::new(1.0, wire_scale, 1.0),
                    ..Transform::at(self.handle_position())
                },
                flags: NodeFlags::NONE,
                visible: self.wire_extension > 0.0,
            },
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::MECHANIC_TRIGGER;
    use std::cell::Cell;

    fn counting_bus() -> (Rc<EventBus>, Rc<Cell<u32>>) {
        let bus = EventBus::shared();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.subscribe(MECHANIC_TRIGGER, move |_| c.set(c.get() + 1));
        (bus, count)
    }

    fn run(mechanic: &mut PullMechanic, seconds: f32) {
        let steps = (seconds / 0.05).ceil() as usize;
        for _ in 0..steps {
            mechanic.update(0.05);
        }
    }

    #[test]
    fn single_pull_triggers_after_reveal_delay() {
        let (bus, count) = counting_bus();
        let mut pull = PullMechanic::new(MechanicId(1), "heart", PullOptions::default(), bus);

        assert!(pull.pull());
        run(&mut pull, 0.5);
        assert_eq!(count.get(), 0, "Reveal is deferred");
        assert!(pull.is_busy());

        run(&mut pull, 0.6);
        assert_eq!(count.get(), 1);
        assert!(pull.is_triggered());
        assert_eq!(pull.handle_offset(), 50.0);
    }

    #[test]
    fn pull_is_ignored_while_animating() {
        let (bus, _) = counting_bus();
        let options = PullOptions {
            pulls_required: 2,
            ..PullOptions::default()
        };
        let mut pull = PullMechanic::new(MechanicId(1), "lever", options, bus);

        assert!(pull.pull());
        assert!(!pull.pull());
        assert_eq!(pull.pulled_distance(), 25.0);
    }

    #[test]
    fn multi_stroke_pull_needs_every_stroke() {
        let (bus, count) = counting_bus();
        let options = PullOptions {
            pulls_required: 3,
            ..PullOptions::default()
        };
        let mut pull = PullMechanic::new(MechanicId(1), "lever", options, bus);

        for _ in 0..2 {
            assert!(pull.pull());
            run(&mut pull, 1.5);
        }
        assert_eq!(count.get(), 0);

        assert!(pull.pull());
        run(&mut pull, 1.5);
        assert_eq!(count.get(), 1);
        assert!(!pull.pull(), "Triggered pull ignores input");
    }

    #[test]
    fn reset_cancels_pending_reveal() {
        let (bus, count) = counting_bus();
        let mut pull = PullMechanic::new(MechanicId(1), "heart", PullOptions::default(), bus);

        pull.pull();
        run(&mut pull, 0.6);
        pull.reset();
        run(&mut pull, 2.0);

        assert_eq!(count.get(), 0, "Reset must cancel the deferred reveal");
        assert!(!pull.is_triggered());
        assert_eq!(pull.pulled_distance(), 0.0);
        assert!(!pull.is_busy());
    }

    #[test]
    fn only_the_handle_is_clickable() {
        let (bus, _) = counting_bus();
        let mut pull = PullMechanic::new(MechanicId(1), "heart", PullOptions::default(), bus);
        assert!(!pull.primary_action(WIRE));
        assert!(pull.primary_action(HANDLE));
    }
}
