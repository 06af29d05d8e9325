//=========================================================================
// Event Collector
//=========================================================================
//
// Logic-thread side of the platform channel.
//
// Architecture:
//   Receiver<PlatformEvent> → collect_frame(budget) → input batches → TickControl
//
// Polling is bounded per frame so a flood of pointer motion cannot
// starve the tick. With nothing queued the collector blocks on the
// channel for the remaining frame budget instead of spinning.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use log::{trace, warn};

//=== Internal Dependencies ===============================================

use super::PlatformEvent;
use crate::core::input::InputEvent;

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

pub(crate) struct EventCollector {
    receiver: Receiver<PlatformEvent>,
    input_batches: Vec<Vec<InputEvent>>,
}

impl EventCollector {
    const MAX_EVENTS_PER_FRAME: usize = 100;

    pub(crate) fn new(receiver: Receiver<PlatformEvent>) -> Self {
        Self {
            receiver,
            input_batches: Vec::with_capacity(4),
        }
    }

    /// Gathers everything queued for this frame. Waits up to `budget` for
    /// the first event when the channel is empty.
    pub(crate) fn collect_frame(&mut self, budget: Duration) -> TickControl {
        self.input_batches.clear();

        let first = match self.receiver.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Disconnected) => return TickControl::Exit,
            Err(TryRecvError::Empty) => match self.receiver.recv_timeout(budget) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => return TickControl::Continue,
                Err(RecvTimeoutError::Disconnected) => return TickControl::Exit,
            },
        };
        if self.handle_event(first) == TickControl::Exit {
            return TickControl::Exit;
        }

        let mut drained = 1;
        while drained < Self::MAX_EVENTS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.handle_event(event) == TickControl::Exit {
                        return TickControl::Exit;
                    }
                    drained += 1;
                }
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= Self::MAX_EVENTS_PER_FRAME {
            warn!("Platform backlog: {} batches drained this frame", drained);
        }

        TickControl::Continue
    }

    pub(crate) fn batches(&self) -> &[Vec<InputEvent>] {
        &self.input_batches
    }

    fn handle_event(&mut self, event: PlatformEvent) -> TickControl {
        match event {
            PlatformEvent::Inputs { discrete, continuous } => {
                trace!("Batch: {} discrete, {} continuous", discrete.len(), continuous.len());
                if !discrete.is_empty() {
                    self.input_batches.push(discrete);
                }
                if !continuous.is_empty() {
                    self.input_batches.push(continuous);
                }
                TickControl::Continue
            }
            PlatformEvent::WindowClosed => TickControl::Exit,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
