//=========================================================================
// Event Bus
//=========================================================================
//
// Synchronous publish/subscribe channel shared by mechanics, combinators
// and the scene manager.
//
// Architecture:
//   subscribe(name, handler) → HashMap<name, Vec<(SubscriptionId, Handler)>>
//                                   ↓
//   publish(name, &payload) → snapshot handlers → call in order (isolated)
//
// Pattern: one bus per application, constructed at startup, passed down
// as `Rc<EventBus>`, torn down with `unsubscribe_all()`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use log::{error, trace};

//=== Internal Dependencies ===============================================

use super::payload::EventPayload;

//=== Public API ==========================================================

/// Handle identifying a single subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&EventPayload)>;

//=========================================================================

/// Publish/subscribe channel keyed by event name.
///
/// Handlers run synchronously inside `publish`, in subscription order. A
/// handler that panics is logged and skipped; the remaining handlers still
/// run. Handlers may subscribe, unsubscribe or publish re-entrantly: the
/// dispatch list is snapshotted before the first handler is invoked.
pub struct EventBus {
    handlers: RefCell<HashMap<String, Vec<(SubscriptionId, Handler)>>>,
    next_id: Cell<u64>,
}

impl EventBus {
    /// Creates a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// Convenience constructor for the shared form used across the engine.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    //--- Subscription -----------------------------------------------------

    /// Registers `handler` for `name` and returns its subscription handle.
    pub fn subscribe<F>(&self, name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&EventPayload) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.handlers
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push((id, Rc::new(handler)));

        trace!("Subscribed {:?} to '{}'", id, name);
        id
    }

    /// Removes a subscription. No-op if it is not registered.
    pub fn unsubscribe(&self, name: &str, id: SubscriptionId) {
        let mut handlers = self.handlers.borrow_mut();
        if let Some(list) = handlers.get_mut(name) {
            list.retain(|(existing, _)| *existing != id);
            if list.is_empty() {
                handlers.remove(name);
            }
        }
    }

    /// Drops every subscription on every event name.
    pub fn unsubscribe_all(&self) {
        self.handlers.borrow_mut().clear();
    }

    //--- Publishing -------------------------------------------------------

    /// Invokes every handler currently registered for `name` with `payload`.
    pub fn publish(&self, name: &str, payload: &EventPayload) {
        let snapshot: Vec<(SubscriptionId, Handler)> = match self.handlers.borrow().get(name) {
            Some(list) => list.clone(),
            None => return,
        };

        trace!("Publishing '{}' to {} handler(s)", name, snapshot.len());

        for (id, handler) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(payload)));
            if outcome.is_err() {
                error!("Handler {:?} for '{}' panicked; continuing with remaining handlers", id, name);
            }
        }
    }

    /// Publishes `payload` under its canonical event name.
    pub fn emit(&self, payload: &EventPayload) {
        self.publish(payload.name(), payload);
    }

    //--- Query API --------------------------------------------------------

    /// Returns the number of handlers registered for `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.handlers.borrow().get(name).map_or(0, Vec::len)
    }

    /// Returns true if no handler is registered on any event name.
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
