//=========================================================================
// Scene Graph Bridge
//=========================================================================
//
// Contract with the rendering collaborator.
//
// Mechanics own their visual node data (transform, flags, visibility);
// the scene manager mirrors it into whatever renderer implements
// `SceneGraph`. The core never reads anything back from the renderer.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::math::Vec3;
use crate::core::mechanics::MechanicId;

//=== NodeId ==============================================================

/// Identifies one visual node: a mechanic and one of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub mechanic: MechanicId,
    pub part: u32,
}

//=== Transform ===========================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

//=== NodeFlags ===========================================================

/// Interaction tags carried by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags {
    pub clickable: bool,
    pub draggable: bool,
}

impl NodeFlags {
    pub const NONE: Self = Self { clickable: false, draggable: false };
    pub const CLICKABLE: Self = Self { clickable: true, draggable: false };
    pub const DRAGGABLE: Self = Self { clickable: false, draggable: true };
    pub const BOTH: Self = Self { clickable: true, draggable: true };

    pub fn is_interactive(self) -> bool {
        self.clickable || self.draggable
    }
}

//=== VisualNode ==========================================================

/// Snapshot of one node as the renderer should display it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualNode {
    pub id: NodeId,
    pub transform: Transform,
    pub flags: NodeFlags,
    pub visible: bool,
}

//=== SceneGraph Trait ====================================================

/// Rendering collaborator: a scene graph the core can add nodes to,
/// remove them from, and move.
pub trait SceneGraph {
    fn add_node(&mut self, node: &VisualNode);
    fn remove_node(&mut self, id: NodeId);
    fn update_node(&mut self, node: &VisualNode);
}

/// Shared renderer handle: the caller keeps its own `Rc` to inspect or
/// render the graph while the scene manager drives it.
impl<G: SceneGraph> SceneGraph for Rc<RefCell<G>> {
    fn add_node(&mut self, node: &VisualNode) {
        self.borrow_mut().add_node(node);
    }

    fn remove_node(&mut self, id: NodeId) {
        self.borrow_mut().remove_node(id);
    }

    fn update_node(&mut self, node: &VisualNode) {
        self.borrow_mut().update_node(node);
    }
}

//=== NullSceneGraph ======================================================

/// Scene graph that only traces calls. Used when no renderer is attached.
#[derive(Debug, Default)]
pub struct NullSceneGraph;

impl SceneGraph for NullSceneGraph {
    fn add_node(&mut self, node: &VisualNode) {
        trace!("add_node {:?}", node.id);
    }

    fn remove_node(&mut self, id: NodeId) {
        trace!("remove_node {:?}", id);
    }

    fn update_node(&mut self, _node: &VisualNode) {}
}

//=== MemorySceneGraph ====================================================

/// In-memory scene graph keeping the latest snapshot of every node.
///
/// Useful for headless runs and for asserting what a renderer would see.
#[derive(Debug, Default)]
pub struct MemorySceneGraph {
    nodes: HashMap<NodeId, VisualNode>,
}

impl MemorySceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&VisualNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_mechanic(&self, mechanic: MechanicId) -> bool {
        self.nodes.keys().any(|id| id.mechanic == mechanic)
    }
}

impl SceneGraph for MemorySceneGraph {
    fn add_node(&mut self, node: &VisualNode) {
        self.nodes.insert(node.id, *node);
    }

    fn remove_node(&mut self, id: NodeId) {
        self.nodes.remove(&id);
    }

    fn update_node(&mut self, node: &VisualNode) {
        if let Some(existing) = self.nodes.get_mut(&node.id) {
            *existing = *node;
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
