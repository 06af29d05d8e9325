//=========================================================================
// Mechanic Combinator
//=========================================================================
//
// Aggregates the triggers of a set of mechanics into one completion.
//
// Policies:
//   All      - every target has triggered, in any order
//   Any      - the first target trigger completes
//   Sequence - targets trigger in the configured order
//
// Sequence matching: a trigger equal to the expected step advances the
// cursor; a repeat of the step just matched is ignored; any other target
// trigger clears progress and rewinds the cursor to the start.
//
// Completion is a one-way latch until `reset()`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::{CombinatorId, MechanicId};
use crate::core::event_bus::{EventBus, EventPayload, SubscriptionId, MECHANIC_TRIGGER};

//=== CombinatorPolicy ====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorPolicy {
    All,
    Any,
    Sequence,
}

impl CombinatorPolicy {
    pub fn from_config(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Self::All),
            "any" => Some(Self::Any),
            "sequence" => Some(Self::Sequence),
            _ => None,
        }
    }
}

//=== MechanicCombinator ==================================================

type CompletionCallback = Box<dyn FnMut(CombinatorId, &[MechanicId])>;

pub struct MechanicCombinator {
    id: CombinatorId,
    name: String,
    policy: CombinatorPolicy,
    /// Target mechanics; also the expected order for `Sequence`.
    mechanics: Vec<MechanicId>,
    required: usize,
    triggered: HashSet<MechanicId>,
    cursor: usize,
    last_matched: Option<MechanicId>,
    completed: bool,
    on_complete: Option<CompletionCallback>,
    bus: Rc<EventBus>,
    subscription: Option<SubscriptionId>,
}

impl MechanicCombinator {
    pub fn new(
        id: CombinatorId,
        name: impl Into<String>,
        policy: CombinatorPolicy,
        mechanics: Vec<MechanicId>,
        bus: Rc<EventBus>,
    ) -> Self {
        let required = mechanics.iter().collect::<HashSet<_>>().len();
        Self {
            id,
            name: name.into(),
            policy,
            mechanics,
            required,
            triggered: HashSet::new(),
            cursor: 0,
            last_matched: None,
            completed: false,
            on_complete: None,
            bus,
            subscription: None,
        }
    }

    /// Installs a callback run once per completion, before the bus event.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(CombinatorId, &[MechanicId]) + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    //--- Bus Wiring -------------------------------------------------------

    /// Subscribes `this` to `mechanic_trigger`. The subscription holds only
    /// a weak reference, so a dropped combinator simply stops reacting.
    pub fn attach(this: &Rc<RefCell<Self>>) {
        let mut combinator = this.borrow_mut();
        if combinator.subscription.is_some() {
            return;
        }

        let weak = Rc::downgrade(this);
        let name = combinator.name.clone();
        let id = combinator.bus.subscribe(MECHANIC_TRIGGER, move |payload| {
            let EventPayload::MechanicTrigger(trigger) = payload else {
                return;
            };
            let Some(target) = weak.upgrade() else {
                return;
            };
            match target.try_borrow_mut() {
                Ok(mut target) => {
                    target.on_mechanic_triggered(trigger.mechanic);
                }
                Err(_) => warn!("Combinator '{}' busy; dropped trigger from {:?}", name, trigger.mechanic),
            };
        });

        combinator.subscription = Some(id);
        debug!("Combinator '{}' attached", combinator.name);
    }

    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.bus.unsubscribe(MECHANIC_TRIGGER, id);
            debug!("Combinator '{}' detached", self.name);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    //--- Evaluation -------------------------------------------------------

    /// Feeds one mechanic trigger into the policy. Returns `true` if this
    /// trigger completed the combinator.
    pub fn on_mechanic_triggered(&mut self, mechanic: MechanicId) -> bool {
        if self.completed || !self.mechanics.contains(&mechanic) {
            return false;
        }

        let done = match self.policy {
            CombinatorPolicy::All => {
                self.triggered.insert(mechanic);
                self.triggered.len() == self.required
            }
            CombinatorPolicy::Any => {
                self.triggered.insert(mechanic);
                true
            }
            CombinatorPolicy::Sequence => self.advance_sequence(mechanic),
        };

        done && self.complete()
    }

    fn advance_sequence(&mut self, mechanic: MechanicId) -> bool {
        if self.mechanics.get(self.cursor) == Some(&mechanic) {
            self.triggered.insert(mechanic);
            self.last_matched = Some(mechanic);
            self.cursor += 1;
            return self.cursor == self.mechanics.len();
        }

        if self.last_matched == Some(mechanic) {
            return false;
        }

        debug!(
            "Combinator '{}' expected {:?}, got {:?}; sequence restarts",
            self.name,
            self.mechanics.get(self.cursor),
            mechanic
        );
        self.triggered.clear();
        self.cursor = 0;
        self.last_matched = None;
        false
    }

    /// Latches completion, runs the callback and publishes
    /// `combinator_complete`. Returns `false` if already completed.
    pub fn complete(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;

        info!("Combinator '{}' ({:?}) complete", self.name, self.policy);

        if let Some(mut callback) = self.on_complete.take() {
            callback(self.id, &self.mechanics);
            self.on_complete = Some(callback);
        }

        self.bus.emit(&EventPayload::CombinatorComplete {
            combinator: self.id,
            name: self.name.clone(),
            mechanics: self.mechanics.clone(),
        });
        true
    }

    pub fn reset(&mut self) {
        self.triggered.clear();
        self.cursor = 0;
        self.last_matched = None;
        self.completed = false;
    }

    //--- Query API --------------------------------------------------------

    pub fn id(&self) -> CombinatorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> CombinatorPolicy {
        self.policy
    }

    pub fn mechanics(&self) -> &[MechanicId] {
        &self.mechanics
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn triggered_count(&self) -> usize {
        self.triggered.len()
    }
}

impl Drop for MechanicCombinator {
    fn drop(&mut self) {
        self.detach();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
