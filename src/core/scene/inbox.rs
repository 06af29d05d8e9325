//=========================================================================
// Event Inbox
//=========================================================================
//
// Queue of bus payloads waiting for the scene manager.
//
// Bus handlers only push here; the manager drains the inbox at tick
// boundaries and after input, so a handler never re-enters the manager
// while it is mutating its own scenes.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::event_bus::EventPayload;

//=== EventInbox ==========================================================

/// Shared FIFO of payloads. Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub(crate) struct EventInbox {
    queue: Rc<RefCell<VecDeque<EventPayload>>>,
}

impl EventInbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, payload: EventPayload) {
        self.queue.borrow_mut().push_back(payload);
    }

    /// Removes and returns the oldest payload.
    pub(crate) fn pop(&self) -> Option<EventPayload> {
        self.queue.borrow_mut().pop_front()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub(crate) fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
