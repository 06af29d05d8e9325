//=========================================================================
// Platform Bridge
//=========================================================================
//
// Contract between the window thread (winit) and the storybook logic
// thread. Only `PlatformEvent` values cross the channel; nothing in the
// core depends on the windowing backend.
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub(crate) mod interface;

//=== Internal API ========================================================

pub(crate) use event_collector::{EventCollector, TickControl};
pub use interface::PlatformError;
pub(crate) use interface::PlatformEvent;
