//=========================================================================
// Pressure Mechanic
//=========================================================================
//
// A push button that reveals a pop-up when pressed.
//
// Stage machine:
//   Idle ──press()──→ Depressing ──Reveal──→ Revealing ──Open──→ Open
//    ↑                                                             │
//    └──────────── Collapsed ←── Closing ←── hide_popup()/release()┘
//
// Each arrow labelled with a task name is a deferred step in the
// mechanic's own queue, so `reset()` interrupts any stage cleanly.
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
pub struct PressureOptions {
    pub position: Vec3,
    pub radius: f32,
    /// How far the button sinks into the page.
    pub depth: f32,
    pub press_duration: f32,
    pub popup_duration: f32,
    pub popup_height: f32,
    /// Seconds after opening before the pop-up closes on its own.
    pub auto_close: Option<f32>,
}

impl Default for PressureOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 30.0,
            depth: 10.0,
            press_duration: 0.15,
            popup_duration: 0.4,
            popup_height: 80.0,
            auto_close: None,
        }
    }
}

//=== Stages ==============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureStage {
    Idle,
    Depressing,
    Revealing,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressureTask {
    Reveal,
    Open,
    AutoClose,
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressureProp {
    Button,
    Popup,
}

const BUTTON: PartId = PartId(0);
const POPUP: PartId = PartId(1);

//=== PressureMechanic ====================================================

pub struct PressureMechanic {
    core: MechanicCore,
    options: PressureOptions,
    stage: PressureStage,
    button_depth: f32,
    popup_scale: f32,
    animator: Animator<PressureProp>,
    tasks: TaskQueue<PressureTask>,
}

impl PressureMechanic {
    pub fn new(id: MechanicId, name: impl Into<String>, options: PressureOptions, bus: Rc<EventBus>) -> Self {
        Self {
            core: MechanicCore::new(id, name, MechanicKind::Pressure, options.position, bus),
            options,
            stage: PressureStage::Idle,
            button_depth: 0.0,
            popup_scale: 0.0,
            animator: Animator::new(),
            tasks: TaskQueue::new(),
        }
    }

    /// Starts the depress → reveal → trigger chain.
    pub fn press(&mut self) -> bool {
        if self.core.is_triggered() || self.stage != PressureStage::Idle {
            return false;
        }

        debug!("Pressure '{}' pressed", self.core.name());
        self.stage = PressureStage::Depressing;
        self.animator.animate(
            PressureProp::Button,
            0.0,
            self.options.depth,
            self.options.press_duration,
            Easing::QuadOut,
        );
        self.tasks.schedule(self.options.press_duration, PressureTask::Reveal);
        true
    }

    /// Collapses the pop-up; the mechanic is back to idle once it closes.
    pub fn hide_popup(&mut self) -> bool {
        match self.stage {
            PressureStage::Idle | PressureStage::Closing => return false,
            PressureStage::Depressing | PressureStage::Revealing | PressureStage::Open => {}
        }

        self.tasks.cancel_all();
        self.stage = PressureStage::Closing;

        let duration = self.options.popup_duration * 0.5;
        self.animator
            .animate(PressureProp::Popup, self.popup_scale, 0.0, duration, Easing::QuadIn);
        self.animator
            .animate(PressureProp::Button, self.button_depth, 0.0, duration, Easing::QuadOut);
        self.tasks.schedule(duration, PressureTask::Collapsed);
        true
    }

    pub fn release(&mut self) -> bool {
        self.hide_popup()
    }

    pub fn stage(&self) -> PressureStage {
        self.stage
    }

    pub fn is_popup_visible(&self) -> bool {
        self.popup_scale > 0.0 || matches!(self.stage, PressureStage::Revealing | PressureStage::Open)
    }

    fn run_task(&mut self, task: PressureTask) {
        match task {
            PressureTask::Reveal => {
                self.stage = PressureStage::Revealing;
                self.animator.animate(
                    PressureProp::Popup,
                    0.0,
                    1.0,
                    self.options.popup_duration,
                    Easing::BackOut,
                );
                self.tasks.schedule(self.options.popup_duration, PressureTask::Open);
            }
            PressureTask::Open => {
                self.stage = PressureStage::Open;
                self.core.trigger(TriggerDetail::Pressed);
                if let Some(delay) = self.options.auto_close {
                    self.tasks.schedule(delay, PressureTask::AutoClose);
                }
            }
            PressureTask::AutoClose => {
                self.hide_popup();
            }
            PressureTask::Collapsed => self.reset(),
        }
    }
}

impl Mechanic for PressureMechanic {
    fn core(&self) -> &MechanicCore {
        &self.core
    }

    fn reset(&mut self) {
        self.tasks.cancel_all();
        self.animator.stop_all();
        self.stage = PressureStage::Idle;
        self.button_depth = 0.0;
        self.popup_scale = 0.0;
        self.core.clear_trigger();
    }

    fn update(&mut self, dt: f32) {
        for frame in self.animator.update(dt) {
            match frame.key {
                PressureProp::Button => self.button_depth = frame.value,
                PressureProp::Popup => self.popup_scale = frame.value.max(0.0),
            }
        }

        for task in self.tasks.advance(dt) {
            self.run_task(task);
        }
    }

    fn is_busy(&self) -> bool {
        matches!(
            self.stage,
            PressureStage::Depressing | PressureStage::Revealing | PressureStage::Closing
        )
    }

    fn primary_action(&mut self, part: PartId) -> bool {
        match part {
            BUTTON => self.press(),
            POPUP if self.stage == PressureStage::Open => self.hide_popup(),
            _ => false,
        }
    }

    fn hit_targets(&self) -> Vec<HitTarget> {
        let mut targets = vec![HitTarget {
            part: BUTTON,
            bounds: BoundingSphere::new(self.options.position, self.options.radius),
            flags: NodeFlags::CLICKABLE,
        }];

        if self.stage == PressureStage::Open {
            targets.push(HitTarget {
                part: POPUP,
                bounds: BoundingSphere::new(self.popup_position(), self.options.popup_height * 0.5),
                flags: NodeFlags::CLICKABLE,
            });
        }
        targets
    }

    fn nodes(&self) -> Vec<VisualNode> {
        let id = self.core.id();
        vec![
            VisualNode {
                id: NodeId { mechanic: id, part: BUTTON.0 as u32 },
                transform: Transform::at(self.options.position - Vec3::Z * self.button_depth),
                flags: NodeFlags::CLICKABLE,
                visible: true,
            },
            VisualNode {
                id: NodeId { mechanic: id, part: POPUP.0 as u32 },
                transform: Transform {
                    scale: Vec3::ONE * self.popup_scale,
                    ..Transform::at(self.popup_position())
                },
                flags: NodeFlags::CLICKABLE,
                visible: self.is_popup_visible(),
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

impl PressureMechanic {
    fn popup_position(&self) -> Vec3 {
        self.options.position + Vec3::new(0.0, self.options.popup_height * 0.5, self.options.popup_height * 0.5)
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

    fn button(options: PressureOptions) -> (PressureMechanic, Rc<Cell<u32>>) {
        let bus = EventBus::shared();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.subscribe(MECHANIC_TRIGGER, move |_| c.set(c.get() + 1));
        (PressureMechanic::new(MechanicId(8), "button", options, bus), count)
    }

    fn run(mechanic: &mut PressureMechanic, seconds: f32) {
        let steps = (seconds / 0.05).ceil() as usize;
        for _ in 0..steps {
            mechanic.update(0.05);
        }
    }

    #[test]
    fn press_reveals_then_triggers() {
        let (mut pressure, count) = button(PressureOptions::default());

        assert!(pressure.press());
        assert_eq!(pressure.stage(), PressureStage::Depressing);
        assert_eq!(count.get(), 0, "Trigger waits for the reveal");

        run(&mut pressure, 1.0);
        assert_eq!(pressure.stage(), PressureStage::Open);
        assert!(pressure.is_popup_visible());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn press_while_busy_or_triggered_is_noop() {
        let (mut pressure, count) = button(PressureOptions::default());

        assert!(pressure.press());
        assert!(!pressure.press(), "Mid-animation press is ignored");
        run(&mut pressure, 1.0);
        assert!(!pressure.press(), "Triggered press is ignored");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn hide_popup_collapses_and_resets() {
        let (mut pressure, count) = button(PressureOptions::default());

        pressure.press();
        run(&mut pressure, 1.0);
        assert!(pressure.hide_popup());
        assert_eq!(pressure.stage(), PressureStage::Closing);

        run(&mut pressure, 1.0);
        assert_eq!(pressure.stage(), PressureStage::Idle);
        assert!(!pressure.is_triggered());
        assert!(!pressure.is_popup_visible());

        assert!(pressure.press(), "Button is usable again");
        run(&mut pressure, 1.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn release_when_idle_is_noop() {
        let (mut pressure, _) = button(PressureOptions::default());
        assert!(!pressure.release());
    }

    #[test]
    fn auto_close_returns_to_idle() {
        let options = PressureOptions {
            auto_close: Some(0.5),
            ..PressureOptions::default()
        };
        let (mut pressure, count) = button(options);

        pressure.press();
        run(&mut pressure, 3.0);
        assert_eq!(count.get(), 1);
        assert_eq!(pressure.stage(), PressureStage::Idle);
    }

    #[test]
    fn reset_mid_press_cancels_trigger() {
        let (mut pressure, count) = button(PressureOptions::default());

        pressure.press();
        run(&mut pressure, 0.2);
        pressure.reset();
        run(&mut pressure, 2.0);

        assert_eq!(count.get(), 0, "Stale reveal must not resurrect the trigger");
        assert_eq!(pressure.stage(), PressureStage::Idle);
    }

    #[test]
    fn popup_is_clickable_only_when_open() {
        let (mut pressure, _) = button(PressureOptions::default());
        assert_eq!(pressure.hit_targets().len(), 1);
        assert!(!pressure.primary_action(POPUP));

        pressure.primary_action(BUTTON);
        run(&mut pressure, 1.0);
        assert_eq!(pressure.hit_targets().len(), 2);
        assert!(pressure.primary_action(POPUP));
    }
}
