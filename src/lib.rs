//=========================================================================
// Storybook Engine — Library Root
//
// Mechanics and scene orchestration for an interactive pop-up storybook.
//
// Responsibilities:
// - Expose the storybook core (`core`): mechanics, combinators, event bus,
//   interaction, effects and the page scene manager
// - Expose the windowed runtime (`Engine`, `EngineBuilder`)
// - Keep the Winit integration (`platform`) out of the public API
//
// Typical usage:
// ```no_run
// use storybook_engine::EngineBuilder;
// use storybook_engine::core::scene::SceneConfig;
//
// let config = SceneConfig::from_path("assets/scenes.json").unwrap();
// EngineBuilder::new(config).build().run().unwrap();
// ```
//
// The core runs without a window too: `core::CardRuntime` takes input
// events and frame ticks directly.
//
//=========================================================================

//--- Public Modules ------------------------------------------------------

pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` owns the window and the Winit event loop.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use crate::core::platform_bridge::PlatformError;
pub use engine::{Engine, EngineBuilder};
