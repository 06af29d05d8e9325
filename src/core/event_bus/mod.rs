//=========================================================================
// Event Bus System
//=========================================================================
//
// Cross-component signaling for the storybook core.
//
// Architecture:
//   Mechanic ──publish──┐
//   Combinator ─────────┼──→ EventBus ──→ handlers (subscription order)
//   Page renderer ──────┘
//
//=========================================================================

//=== Module Declarations =================================================

mod bus;
mod payload;

//=== Public API ==========================================================

pub use bus::{EventBus, SubscriptionId};
pub use payload::{
    EventPayload, MechanicTrigger, TriggerDetail, COMBINATION_COMPLETED, COMBINATOR_COMPLETE,
    MECHANIC_COMPLETED, MECHANIC_TRIGGER, PAGE_FLIP, SCENE_CHANGED,
};
