//=========================================================================
// Event Payloads
//=========================================================================
//
// Wire contract of the event bus: canonical event names and the typed
// payloads published under them.
//
//   page_flip             ← page renderer
//   mechanic_trigger      ← mechanics
//   combinator_complete   ← combinators
//   mechanic_completed    ← scene manager (downstream)
//   combination_completed ← scene manager (downstream)
//   scene_changed         ← scene manager (downstream)
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::mechanics::{CombinatorId, MechanicId, MechanicKind};

//=== Event Names =========================================================

pub const PAGE_FLIP: &str = "page_flip";
pub const MECHANIC_TRIGGER: &str = "mechanic_trigger";
pub const COMBINATOR_COMPLETE: &str = "combinator_complete";
pub const MECHANIC_COMPLETED: &str = "mechanic_completed";
pub const COMBINATION_COMPLETED: &str = "combination_completed";
pub const SCENE_CHANGED: &str = "scene_changed";

//=== TriggerDetail =======================================================

/// Variant-specific data attached to a mechanic trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerDetail {
    /// Pull lever reached its full travel.
    Pulled { distance: f32 },

    /// Combination lock opened with these dial values.
    Combination { values: Vec<u8> },

    /// Sliding puzzle solved after this many player moves.
    Solved { moves: u32 },

    /// Pressure button pressed and popup revealed.
    Pressed,

    /// Every required object snapped onto the magnet.
    Attracted { count: usize },

    /// Light revealed enough of the surface (`forced` for `reveal_all`).
    Revealed { progress: f32, forced: bool },
}

//=== MechanicTrigger =====================================================

/// Payload of `mechanic_trigger`.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanicTrigger {
    pub mechanic: MechanicId,
    /// Configuration id of the mechanic within its page.
    pub name: String,
    pub kind: MechanicKind,
    pub detail: TriggerDetail,
}

//=== EventPayload ========================================================

/// Every payload that travels over the bus.
///
/// Subscribers receive payloads by shared reference and must treat them
/// as read-only.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    PageFlip {
        from_page: usize,
        to_page: usize,
    },

    MechanicTrigger(MechanicTrigger),

    CombinatorComplete {
        combinator: CombinatorId,
        name: String,
        mechanics: Vec<MechanicId>,
    },

    MechanicCompleted {
        page: usize,
        mechanic: MechanicId,
        name: String,
    },

    CombinationCompleted {
        page: usize,
        combinator: CombinatorId,
        name: String,
    },

    SceneChanged {
        from_page: Option<usize>,
        to_page: usize,
    },
}

impl EventPayload {
    /// Canonical event name this payload is published under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PageFlip { .. } => PAGE_FLIP,
            Self::MechanicTrigger(_) => MECHANIC_TRIGGER,
            Self::CombinatorComplete { .. } => COMBINATOR_COMPLETE,
            Self::MechanicCompleted { .. } => MECHANIC_COMPLETED,
            Self::CombinationCompleted { .. } => COMBINATION_COMPLETED,
            Self::SceneChanged { .. } => SCENE_CHANGED,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
