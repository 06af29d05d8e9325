//=========================================================================
// Scene System
//=========================================================================
//
// Page scenes, their configuration, and the bridge to the renderer.
//
// Architecture:
//   SceneConfig ──build──→ PageScene (mechanics, props, combinators, effects)
//                               ↑
//   SceneManager ──owns── BTreeMap<page, PageScene>, active page
//        ├─ InteractionController (registered mechanics)
//        └─ SceneGraph (mounted visual nodes)
//
//=========================================================================

//=== Module Declarations =================================================

mod config;
mod inbox;
mod page_scene;
mod scene_graph;
mod scene_manager;

//=== Public API ==========================================================

pub use config::{
    decode_options, CombinatorConfig, ConfigError, EffectConfig, MechanicConfig, PageConfig, SceneConfig,
};
pub use page_scene::{PageScene, SceneMechanic};
pub use scene_graph::{MemorySceneGraph, NodeFlags, NodeId, NullSceneGraph, SceneGraph, Transform, VisualNode};
pub use scene_manager::SceneManager;
