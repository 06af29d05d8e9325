//=========================================================================
// Rotate Mechanic (combination lock)
//=========================================================================
//
// A ring of dials, each advanced one step per click. The lock opens when
// every dial shows the matching digit of the solution.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::rc::Rc;

use log::debug;
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{HitTarget, Mechanic, MechanicCore, MechanicId, MechanicKind, PartId};
use crate::core::effects::{Animator, Easing};
use crate::core::event_bus::{EventBus, TriggerDetail};
use crate::core::math::{BoundingSphere, Vec3};
use crate::core::scene::{NodeFlags, NodeId, Transform, VisualNode};

//=== Options =============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RotateOptions {
    pub position: Vec3,
    pub digits: usize,
    /// Digits of the opening combination, most significant dial first.
    pub solution: String,
    pub base: u8,
    /// Distance of the dials from the lock centre.
    pub ring_radius: f32,
    pub dial_radius: f32,
    pub turn_duration: f32,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            digits: 4,
            solution: "1314".to_string(),
            base: 10,
            ring_radius: 60.0,
            dial_radius: 20.0,
            turn_duration: 0.2,
        }
    }
}

impl RotateOptions {
    /// Parses `solution` into dial values.
    ///
    /// Fails when the length differs from `digits` or a character is not a
    /// digit below `base`.
    pub fn parse_solution(&self) -> Result<Vec<u8>, String> {
        if self.base < 2 || self.base > 10 {
            return Err(format!("base {} outside 2..=10", self.base));
        }

        let values = self
            .solution
            .chars()
            .map(|c| {
                c.to_digit(10)
                    .map(|d| d as u8)
                    .filter(|d| *d < self.base)
                    .ok_or_else(|| format!("invalid digit '{}' for base {}", c, self.base))
            })
            .collect::<Result<Vec<u8>, String>>()?;

        if values.len() != self.digits {
            return Err(format!(
                "solution '{}' has {} digits, expected {}",
                self.solution,
                values.len(),
                self.digits
            ));
        }
        Ok(values)
    }
}

//=== RotateMechanic ======================================================

const BODY_PART: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DialAngle(usize);

pub struct RotateMechanic {
    core: MechanicCore,
    options: RotateOptions,
    solution: Vec<u8>,
    values: Vec<u8>,
    angles: Vec<f32>,
    animator: Animator<DialAngle>,
}

impl RotateMechanic {
    pub fn new(
        id: MechanicId,
        name: impl Into<String>,
        options: RotateOptions,
        bus: Rc<EventBus>,
    ) -> Result<Self, String> {
        let solution = options.parse_solution()?;
        let digits = options.digits;
        Ok(Self {
            core: MechanicCore::new(id, name, MechanicKind::Rotate, options.position, bus),
            options,
            solution,
            values: vec![0; digits],
            angles: vec![0.0; digits],
            animator: Animator::new(),
        })
    }

    /// Advances dial `index` by one step. Out-of-range indices are ignored,
    /// as is a dial still turning from the previous click.
    pub fn rotate_dial(&mut self, index: usize) -> bool {
        if self.core.is_triggered() || index >= self.values.len() {
            return false;
        }
        if self.animator.is_animating(DialAngle(index)) {
            return false;
        }

        self.values[index] = (self.values[index] + 1) % self.options.base;

        let step = TAU / self.options.base as f32;
        let from = self.angles[index];
        self.animator
            .animate(DialAngle(index), from, from + step, self.options.turn_duration, Easing::QuadOut);

        debug!("Dial {} of '{}' now shows {}", index, self.core.name(), self.values[index]);

        if self.values == self.solution {
            self.core.trigger(TriggerDetail::Combination {
                values: self.values.clone(),
            });
        }
        true
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn solution(&self) -> &[u8] {
        &self.solution
    }

    fn dial_position(&self, index: usize) -> Vec3 {
        let angle = index as f32 / self.options.digits as f32 * TAU - FRAC_PI_2;
        self.options.position
            + Vec3::new(
                angle.cos() * self.options.ring_radius,
                -angle.sin() * self.options.ring_radius,
                0.0,
            )
    }
}

impl Mechanic for RotateMechanic {
    fn core(&self) -> &MechanicCore {
        &self.core
    }

    fn reset(&mut self) {
        self.animator.stop_all();
        self.values.iter_mut().for_each(|v| *v = 0);
        self.angles.iter_mut().for_each(|a| *a = 0.0);
        self.core.clear_trigger();
    }

    fn update(&mut self, dt: f32) {
        for frame in self.animator.update(dt) {
            let DialAngle(index) = frame.key;
            // Keep the angle bounded across many full turns.
            self.angles[index] = if frame.finished { frame.value % TAU } else { frame.value };
        }
    }

    fn is_busy(&self) -> bool {
        !self.animator.is_idle()
    }

    fn primary_action(&mut self, part: PartId) -> bool {
        self.rotate_dial(part.0)
    }

    fn hit_targets(&self) -> Vec<HitTarget> {
        (0..self.values.len())
            .map(|i| HitTarget {
                part: PartId(i),
                bounds: BoundingSphere::new(self.dial_position(i), self.options.dial_radius),
                flags: NodeFlags::CLICKABLE,
            })
            .collect()
    }

    fn nodes(&self) -> Vec<VisualNode> {
        let id = self.core.id();
        let mut nodes: Vec<VisualNode> = self
            .angles
            .iter()
            .enumerate()
            .map(|(i, angle)| VisualNode {
                id: NodeId { mechanic: id, part: i as u32 },
                transform: Transform {
                    rotation: Vec3::new(0.0, 0.0, *angle),
                    ..Transform::at(self.dial_position(i))
                },
                flags: NodeFlags::CLICKABLE,
                visible: true,
            })
            .collect();

        nodes.push(VisualNode {
            id: NodeId { mechanic: id, part: BODY_PART },
            transform: Transform::at(self.options.position),
            flags: NodeFlags::NONE,
            visible: true,
        });
        nodes
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
