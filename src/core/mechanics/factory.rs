//=========================================================================
// Mechanic Factory
//=========================================================================
//
// Builds mechanics from configuration entries and keeps a weak registry
// of everything it built for bulk update and reset.
//
// Architecture:
//   MechanicConfig { id, type, options }
//        ↓ MechanicKind::from_config + decode_options
//   variant::new(MechanicId, name, options, bus)
//        ↓
//   BuiltMechanic { mechanic: Rc<RefCell<dyn Mechanic>>, props }
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::{
    LightRevealMechanic, MagneticMechanic, MechanicId, MechanicKind, PressureMechanic,
    PullMechanic, PuzzleMechanic, RotateMechanic, SharedAttractable, SharedMechanic, WeakMechanic,
};
use crate::core::event_bus::EventBus;
use crate::core::scene::{decode_options, ConfigError, MechanicConfig};

//=== BuiltMechanic =======================================================

/// A freshly built mechanic and the props it needs the scene to own.
pub struct BuiltMechanic {
    pub mechanic: SharedMechanic,
    pub props: Vec<SharedAttractable>,
}

//=== MechanicFactory =====================================================

pub struct MechanicFactory {
    bus: Rc<EventBus>,
    next_id: u64,
    instances: Vec<WeakMechanic>,
}

impl MechanicFactory {
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self {
            bus,
            next_id: 1,
            instances: Vec::new(),
        }
    }

    /// Builds the mechanic described by `config`.
    ///
    /// # Errors
    ///
    /// Unknown `type` values and undecodable options are reported as
    /// [`ConfigError`]; the caller logs and skips the entry.
    pub fn create(&mut self, config: &MechanicConfig) -> Result<BuiltMechanic, ConfigError> {
        let kind = MechanicKind::from_config(&config.kind).ok_or_else(|| ConfigError::UnknownMechanicType {
            id: config.id.clone(),
            kind: config.kind.clone(),
        })?;

        let id = self.allocate_id();
        let name = config.id.clone();
        let bus = Rc::clone(&self.bus);
        let mut props = Vec::new();

        let mechanic: SharedMechanic = match kind {
            MechanicKind::Pull => Rc::new(RefCell::new(PullMechanic::new(
                id,
                name,
                decode_options(&config.id, &config.options)?,
                bus,
            ))),
            MechanicKind::Rotate => {
                let lock = RotateMechanic::new(id, name, decode_options(&config.id, &config.options)?, bus)
                    .map_err(|reason| ConfigError::InvalidOptions {
                        id: config.id.clone(),
                        reason,
                    })?;
                Rc::new(RefCell::new(lock))
            }
            MechanicKind::Puzzle => Rc::new(RefCell::new(PuzzleMechanic::new(
                id,
                name,
                decode_options(&config.id, &config.options)?,
                bus,
            ))),
            MechanicKind::Pressure => Rc::new(RefCell::new(PressureMechanic::new(
                id,
                name,
                decode_options(&config.id, &config.options)?,
                bus,
            ))),
            MechanicKind::Magnetic => {
                let options = decode_options(&config.id, &config.options)?;
                props = MagneticMechanic::spawn_props(&options);
                Rc::new(RefCell::new(MagneticMechanic::new(id, name, options, &props, bus)))
            }
            MechanicKind::LightReveal => {
                let light = LightRevealMechanic::new(id, name, decode_options(&config.id, &config.options)?, bus)
                    .map_err(|reason| ConfigError::InvalidOptions {
                        id: config.id.clone(),
                        reason,
                    })?;
                Rc::new(RefCell::new(light))
            }
        };

        debug!("Built {} mechanic '{}' as {:?}", kind, config.id, id);
        Ok(self.track(mechanic, props))
    }

    fn allocate_id(&mut self) -> MechanicId {
        let id = MechanicId(self.next_id);
        self.next_id += 1;
        id
    }

    fn track(&mut self, mechanic: SharedMechanic, props: Vec<SharedAttractable>) -> BuiltMechanic {
        self.instances.push(Rc::downgrade(&mechanic));
        BuiltMechanic { mechanic, props }
    }

    //--- Bulk Operations --------------------------------------------------

    /// Advances every live mechanic. Mechanics already borrowed elsewhere
    /// are skipped for this tick.
    pub fn update_all(&mut self, dt: f32) {
        self.prune();
        for weak in &self.instances {
            if let Some(mechanic) = weak.upgrade() {
                if let Ok(mut m) = mechanic.try_borrow_mut() {
                    m.update(dt);
                }
            }
        }
    }

    /// Resets every live mechanic.
    pub fn reset_all(&mut self) {
        self.prune();
        for weak in &self.instances {
            if let Some(mechanic) = weak.upgrade() {
                if let Ok(mut m) = mechanic.try_borrow_mut() {
                    m.reset();
                }
            }
        }
    }

    /// Number of built mechanics that are still alive.
    pub fn live_count(&self) -> usize {
        self.instances.iter().filter(|w| w.strong_count() > 0).count()
    }

    fn prune(&mut self) {
        let before = self.instances.len();
        self.instances.retain(|w| w.strong_count() > 0);
        if before != self.instances.len() {
            trace!("Pruned {} dropped mechanic(s)", before - self.instances.len());
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
