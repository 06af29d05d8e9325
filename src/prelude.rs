//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use storybook_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine
pub use crate::engine::{Engine, EngineBuilder};

// Runtime and scenes
pub use crate::core::runtime::CardRuntime;
pub use crate::core::scene::{SceneConfig, SceneGraph, SceneManager};

// Events
pub use crate::core::event_bus::{EventBus, EventPayload};

// Mechanics
pub use crate::core::mechanics::{
    CombinatorPolicy, Mechanic, MechanicCombinator, MechanicFactory, MechanicId, SharedMechanic,
};

// Input
pub use crate::core::input::{InputEvent, KeyCode, MouseButton};
pub use crate::core::interaction::{Camera, InteractionController, Viewport};

// Math
pub use crate::core::math::Vec3;
