//=========================================================================
// Magnetic Mechanic
//=========================================================================
//
// A magnet that, while its field is on, pulls nearby props toward itself.
// Props inside the snap distance join the attracted set; once every
// required prop is attracted the mechanic triggers.
//
// Ownership:
//   PageScene ──owns──→ Rc<RefCell<Attractable>>
//   MagneticMechanic ──Weak──→ Attractable (association only)
//
// A prop dropped by its owner is simply skipped.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use log::{debug, trace};
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use super::{HitTarget, Mechanic, MechanicCore, MechanicId, MechanicKind, PartId};
use crate::core::effects::{Animator, Easing};
use crate::core::event_bus::{EventBus, TriggerDetail};
use crate::core::math::{BoundingSphere, Vec3};
use crate::core::scene::{NodeFlags, NodeId, Transform, VisualNode};

//=== Attractable =========================================================

/// A prop the magnet can pull.
#[derive(Debug, Clone, PartialEq)]
pub struct Attractable {
    pub id: String,
    pub position: Vec3,
    pub home: Vec3,
}

impl Attractable {
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            home: position,
        }
    }
}

pub type SharedAttractable = Rc<RefCell<Attractable>>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttractableConfig {
    pub id: String,
    pub position: Vec3,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

//=== Options =============================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MagneticOptions {
    pub position: Vec3,
    pub size: f32,
    pub attraction_radius: f32,
    pub force: f32,
    pub objects: Vec<AttractableConfig>,
}

impl Default for MagneticOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: 1.0,
            attraction_radius: 5.0,
            force: 0.1,
            objects: Vec::new(),
        }
    }
}

impl MagneticOptions {
    /// Distance under which a prop counts as attracted.
    pub fn snap_distance(&self) -> f32 {
        self.size * 0.6
    }
}

//=== MagneticMechanic ====================================================

const MAGNET: PartId = PartId(0);
const GLOW_DURATION: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldGlow;

struct Candidate {
    id: String,
    object: Weak<RefCell<Attractable>>,
}

pub struct MagneticMechanic {
    core: MechanicCore,
    options: MagneticOptions,
    candidates: Vec<Candidate>,
    required: Vec<String>,
    attracted: HashSet<String>,
    field_active: bool,
    glow: f32,
    animator: Animator<FieldGlow>,
}

impl MagneticMechanic {
    pub fn new(
        id: MechanicId,
        name: impl Into<String>,
        options: MagneticOptions,
        objects: &[SharedAttractable],
        bus: Rc<EventBus>,
    ) -> Self {
        let candidates = objects
            .iter()
            .map(|object| Candidate {
                id: object.borrow().id.clone(),
                object: Rc::downgrade(object),
            })
            .collect();
        let required = options
            .objects
            .iter()
            .filter(|o| o.required)
            .map(|o| o.id.clone())
            .collect();

        Self {
            core: MechanicCore::new(id, name, MechanicKind::Magnetic, options.position, bus),
            options,
            candidates,
            required,
            attracted: HashSet::new(),
            field_active: false,
            glow: 0.0,
            animator: Animator::new(),
        }
    }

    /// Builds the props described by `options.objects`.
    pub fn spawn_props(options: &MagneticOptions) -> Vec<SharedAttractable> {
        options
            .objects
            .iter()
            .map(|o| Rc::new(RefCell::new(Attractable::new(o.id.clone(), o.position))))
            .collect()
    }

    /// Turns the attraction field on or off.
    pub fn toggle_field(&mut self) -> bool {
        if self.core.is_triggered() {
            return false;
        }

        self.field_active = !self.field_active;
        let target = if self.field_active { 1.0 } else { 0.0 };
        self.animator
            .animate(FieldGlow, self.glow, target, GLOW_DURATION, Easing::QuadOut);

        debug!("Magnet '{}' field {}", self.core.name(), if self.field_active { "on" } else { "off" });
        true
    }

    pub fn is_field_active(&self) -> bool {
        self.field_active
    }

    pub fn is_attracted(&self, id: &str) -> bool {
        self.attracted.contains(id)
    }

    pub fn attracted_count(&self) -> usize {
        self.attracted.len()
    }

    fn attract(&mut self) {
        let magnet = self.options.position;
        let radius = self.options.attraction_radius;
        let snap = self.options.snap_distance();
        let mut newly_attracted = false;

        for candidate in &self.candidates {
            if self.attracted.contains(&candidate.id) {
                continue;
            }
            let Some(object) = candidate.object.upgrade() else {
                continue;
            };
            let mut object = object.borrow_mut();

            let distance = object.position.distance(magnet);
            if distance > radius {
                continue;
            }

            let strength = (1.0 - distance / radius) * self.options.force;
            let step = strength.min(distance);
            let direction = (magnet - object.position).normalized();
            object.position = object.position + direction * step;

            if object.position.distance(magnet) < snap && self.attracted.insert(candidate.id.clone()) {
                trace!("Magnet '{}' attracted '{}'", self.core.name(), candidate.id);
                newly_attracted = true;
            }
        }

        // A magnet with nothing required never completes.
        let complete = !self.required.is_empty() && self.required.iter().all(|id| self.attracted.contains(id));
        if newly_attracted && complete {
            self.core.trigger(TriggerDetail::Attracted {
                count: self.attracted.len(),
            });
        }
    }
}

impl Mechanic for MagneticMechanic {
    fn core(&self) -> &MechanicCore {
        &self.core
    }

    /// Switches the field off and sends surviving props home.
    fn reset(&mut self) {
        self.animator.stop_all();
        self.field_active = false;
        self.glow = 0.0;
        self.attracted.clear();
        for candidate in &self.candidates {
            if let Some(object) = candidate.object.upgrade() {
                let mut object = object.borrow_mut();
                object.position = object.home;
            }
        }
        self.core.clear_trigger();
    }

    fn update(&mut self, dt: f32) {
        for frame in self.animator.update(dt) {
            self.glow = frame.value;
        }

        if self.field_active && !self.core.is_triggered() {
            self.attract();
        }
    }

    fn is_busy(&self) -> bool {
        !self.animator.is_idle()
    }

    fn primary_action(&mut self, part: PartId) -> bool {
        part == MAGNET && self.toggle_field()
    }

    fn hit_targets(&self) -> Vec<HitTarget> {
        vec![HitTarget {
            part: MAGNET,
            bounds: BoundingSphere::new(self.options.position, self.options.size),
            flags: NodeFlags::CLICKABLE,
        }]
    }

    fn nodes(&self) -> Vec<VisualNode> {
        let id = self.core.id();
        let mut nodes = vec![VisualNode {
            id: NodeId { mechanic: id, part: MAGNET.0 as u32 },
            transform: Transform {
                scale: Vec3::ONE * (1.0 + 0.2 * self.glow),
                ..Transform::at(self.options.position)
            },
            flags: NodeFlags::CLICKABLE,
            visible: true,
        }];

        for (i, candidate) in self.candidates.iter().enumerate() {
            if let Some(object) = candidate.object.upgrade() {
                nodes.push(VisualNode {
                    id: NodeId { mechanic: id, part: i as u32 + 1 },
                    transform: Transform::at(object.borrow().position),
                    flags: NodeFlags::NONE,
                    visible: true,
                });
            }
        }
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
