//=========================================================================
// Mechanics
//=========================================================================
//
// Interactive page mechanics and the combinators that aggregate them.
//
// Architecture:
//   MechanicFactory ──create()──→ Rc<RefCell<dyn Mechanic>>
//        │                              │
//        └─ tracks Weak refs            ├─ MechanicCore (id, latch, bus)
//           (bulk update/reset)         └─ variant state machine
//
//   Mechanic::primary_action / drag_to  ← InteractionController
//   MechanicCore::trigger → mechanic_trigger → MechanicCombinator
//
// Every operation on a triggered or mid-transition mechanic is a silent
// no-op; callers learn whether anything happened from the returned bool.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::info;

//=== Internal Dependencies ===============================================

use crate::core::event_bus::{EventBus, EventPayload, MechanicTrigger, TriggerDetail};
use crate::core::math::{BoundingSphere, Vec3};
use crate::core::scene::{NodeFlags, VisualNode};

//=== Module Declarations =================================================

mod combinator;
mod factory;
mod light_reveal;
mod magnetic;
mod pressure;
mod pull;
mod puzzle;
mod rotate;

//=== Public API ==========================================================

pub use combinator::{CombinatorPolicy, MechanicCombinator};
pub use factory::{BuiltMechanic, MechanicFactory};
pub use light_reveal::{LightRevealMechanic, LightRevealOptions};
pub use magnetic::{Attractable, AttractableConfig, MagneticMechanic, MagneticOptions, SharedAttractable};
pub use pressure::{PressureMechanic, PressureOptions, PressureStage};
pub use pull::{PullMechanic, PullOptions};
pub use puzzle::{PuzzleMechanic, PuzzleOptions};
pub use rotate::{RotateMechanic, RotateOptions};

//=== Identifiers =========================================================

/// Process-unique mechanic identifier, allocated by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MechanicId(pub u64);

/// Process-unique combinator identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombinatorId(pub u64);

/// Sub-part of a mechanic (dial index, grid cell, handle, popup...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub usize);

//=== MechanicKind ========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MechanicKind {
    Pull,
    Rotate,
    Puzzle,
    Pressure,
    Magnetic,
    LightReveal,
}

impl MechanicKind {
    /// Parses the `type` field of a mechanic configuration entry.
    pub fn from_config(name: &str) -> Option<Self> {
        match name {
            "pull" => Some(Self::Pull),
            "rotate" => Some(Self::Rotate),
            "puzzle" => Some(Self::Puzzle),
            "pressure" => Some(Self::Pressure),
            "magnetic" => Some(Self::Magnetic),
            "light" | "light_reveal" => Some(Self::LightReveal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Rotate => "rotate",
            Self::Puzzle => "puzzle",
            Self::Pressure => "pressure",
            Self::Magnetic => "magnetic",
            Self::LightReveal => "light",
        }
    }
}

impl fmt::Display for MechanicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=== HitTarget ===========================================================

/// Hit volume of one interactive part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTarget {
    pub part: PartId,
    pub bounds: BoundingSphere,
    pub flags: NodeFlags,
}

//=== MechanicCore ========================================================

/// State shared by every mechanic variant: identity, anchor position,
/// the trigger latch, and the bus it publishes on.
pub struct MechanicCore {
    id: MechanicId,
    name: String,
    kind: MechanicKind,
    position: Vec3,
    triggered: bool,
    bus: Rc<EventBus>,
}

impl MechanicCore {
    pub fn new(
        id: MechanicId,
        name: impl Into<String>,
        kind: MechanicKind,
        position: Vec3,
        bus: Rc<EventBus>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position,
            triggered: false,
            bus,
        }
    }

    pub fn id(&self) -> MechanicId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MechanicKind {
        self.kind
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Latches the trigger and publishes `mechanic_trigger`.
    ///
    /// Returns `false` without publishing if already triggered.
    pub fn trigger(&mut self, detail: TriggerDetail) -> bool {
        if self.triggered {
            return false;
        }
        self.triggered = true;

        info!("Mechanic '{}' ({}) triggered: {:?}", self.name, self.kind, detail);

        self.bus.emit(&EventPayload::MechanicTrigger(MechanicTrigger {
            mechanic: self.id,
            name: self.name.clone(),
            kind: self.kind,
            detail,
        }));
        true
    }

    /// Clears the latch. Only variants' `reset()` call this.
    pub fn clear_trigger(&mut self) {
        self.triggered = false;
    }
}

//=== Mechanic Trait ======================================================

/// Capability contract every mechanic variant implements.
///
/// The interaction controller talks to mechanics exclusively through
/// `primary_action`, `drag_to` and `drag_end`, never through the variant.
pub trait Mechanic {
    fn core(&self) -> &MechanicCore;

    fn id(&self) -> MechanicId {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn kind(&self) -> MechanicKind {
        self.core().kind()
    }

    fn is_triggered(&self) -> bool {
        self.core().is_triggered()
    }

    /// World position used as the origin of effects and connections.
    fn anchor(&self) -> Vec3 {
        self.core().position()
    }

    /// Returns to the initial untriggered configuration, cancelling any
    /// pending task or animation. Safe to call at any time.
    fn reset(&mut self);

    /// Advances animations, deferred tasks and continuous simulation.
    fn update(&mut self, _dt: f32) {}

    /// True while an animation or deferred step is in flight.
    fn is_busy(&self) -> bool {
        false
    }

    /// Click on `part`. Returns whether the mechanic changed.
    fn primary_action(&mut self, part: PartId) -> bool;

    /// Drag of `part` to a world position. Returns whether it was consumed.
    fn drag_to(&mut self, _part: PartId, _position: Vec3) -> bool {
        false
    }

    /// Release after a drag of `part`.
    fn drag_end(&mut self, _part: PartId) {}

    /// Current hit volumes of the interactive parts.
    fn hit_targets(&self) -> Vec<HitTarget>;

    /// Current visual nodes for the rendering collaborator.
    fn nodes(&self) -> Vec<VisualNode>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared handle to a mechanic, owned by its page scene.
pub type SharedMechanic = Rc<RefCell<dyn Mechanic>>;

/// Non-owning back-reference to a mechanic.
pub type WeakMechanic = Weak<RefCell<dyn Mechanic>>;

/// Runs `f` on the concrete variant behind a shared mechanic.
///
/// Returns `None` if the mechanic is of another variant or is currently
/// borrowed.
pub fn with_variant<T: 'static, R>(mechanic: &SharedMechanic, f: impl FnOnce(&mut T) -> R) -> Option<R> {
    let mut guard = mechanic.try_borrow_mut().ok()?;
    guard.as_any_mut().downcast_mut::<T>().map(f)
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::MECHANIC_TRIGGER;
    use std::cell::Cell;

    #[test]
    fn kind_round_trips_config_names() {
        for kind in [
            MechanicKind::Pull,
            MechanicKind::Rotate,
            MechanicKind::Puzzle,
            MechanicKind::Pressure,
            MechanicKind::Magnetic,
            MechanicKind::LightReveal,
        ] {
            assert_eq!(MechanicKind::from_config(kind.as_str()), Some(kind));
        }
        assert_eq!(MechanicKind::from_config("light_reveal"), Some(MechanicKind::LightReveal));
        assert_eq!(MechanicKind::from_config("catapult"), None);
    }

    #[test]
    fn core_trigger_latches_once() {
        let bus = EventBus::shared();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        bus.subscribe(MECHANIC_TRIGGER, move |_| c.set(c.get() + 1));

        let mut core = MechanicCore::new(MechanicId(1), "heart", MechanicKind::Pull, Vec3::ZERO, bus);
        assert!(core.trigger(TriggerDetail::Pressed));
        assert!(!core.trigger(TriggerDetail::Pressed));
        assert!(core.is_triggered());
        assert_eq!(count.get(), 1);

        core.clear_trigger();
        assert!(core.trigger(TriggerDetail::Pressed));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn trigger_payload_identifies_mechanic() {
        let bus = EventBus::shared();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        bus.subscribe(MECHANIC_TRIGGER, move |p| *s.borrow_mut() = Some(p.clone()));

        let mut core = MechanicCore::new(MechanicId(42), "lock", MechanicKind::Rotate, Vec3::ZERO, bus);
        core.trigger(TriggerDetail::Combination { values: vec![1, 3, 1, 4] });

        match seen.borrow().as_ref() {
            Some(EventPayload::MechanicTrigger(t)) => {
                assert_eq!(t.mechanic, MechanicId(42));
                assert_eq!(t.name, "lock");
                assert_eq!(t.kind, MechanicKind::Rotate);
            }
            other => panic!("Expected MechanicTrigger, got {:?}", other),
        };
    }
}
