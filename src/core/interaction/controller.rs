//=========================================================================
// Interaction Controller
//=========================================================================
//
// Turns pointer and touch input into mechanic clicks and drags.
//
// Architecture:
//   pointer_down → Camera::screen_ray → nearest HitTarget of registered
//                  mechanics → Selection
//   pointer_move → ray ∩ drag plane (normal +Z through the hit point)
//                  → Mechanic::drag_to(part, position)
//   pointer_up   → Mechanic::primary_action / drag_end → Idle
//
// State machine:
//   Idle ──down on clickable──→ primary_action, Idle
//   Idle ──down on draggable──→ Dragging
//   Idle ──down on both───────→ Pressed ──moved past threshold──→ Dragging
//   Pressed ──up──→ primary_action, Idle
//   Dragging ──up──→ drag_end, Idle
//
// Mechanics are held weakly and borrowed with `try_borrow_mut`; a
// selection whose owner is gone or busy is dropped quietly.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::camera::{Camera, Viewport};
use crate::core::input::{InputEvent, MouseButton};
use crate::core::math::{Plane, Vec3};
use crate::core::mechanics::{MechanicId, PartId, SharedMechanic, WeakMechanic};
use crate::core::scene::NodeFlags;

//=== Selection ===========================================================

#[derive(Clone)]
struct Selection {
    mechanic: MechanicId,
    owner: WeakMechanic,
    part: PartId,
    plane: Plane,
    /// Hit point minus the part centre at press time.
    offset: Vec3,
}

enum PointerState {
    Idle,
    Pressed { selection: Selection, x: f32, y: f32 },
    Dragging { selection: Selection },
}

//=== InteractionController ===============================================

pub struct InteractionController {
    camera: Box<dyn Camera>,
    drag_threshold: f32,
    registered: Vec<(MechanicId, WeakMechanic)>,
    state: PointerState,
    active_touch: Option<u64>,
}

impl InteractionController {
    pub const DEFAULT_DRAG_THRESHOLD: f32 = 4.0;

    pub fn new(camera: Box<dyn Camera>) -> Self {
        Self {
            camera,
            drag_threshold: Self::DEFAULT_DRAG_THRESHOLD,
            registered: Vec::new(),
            state: PointerState::Idle,
            active_touch: None,
        }
    }

    /// Pixels a press may travel before it turns into a drag.
    pub fn with_drag_threshold(mut self, pixels: f32) -> Self {
        assert!(pixels >= 0.0, "Drag threshold must be non-negative");
        self.drag_threshold = pixels;
        self
    }

    //--- Registration -----------------------------------------------------

    pub fn register(&mut self, mechanic: &SharedMechanic) {
        let id = match mechanic.try_borrow() {
            Ok(m) => m.id(),
            Err(_) => {
                debug!("Cannot register a mechanic that is mutably borrowed");
                return;
            }
        };
        if self.is_registered(id) {
            return;
        }
        self.registered.push((id, Rc::downgrade(mechanic)));
        trace!("Registered {:?} for interaction", id);
    }

    /// Removes a mechanic. Drops the current selection if it belongs to it.
    pub fn unregister(&mut self, id: MechanicId) {
        self.registered.retain(|(existing, _)| *existing != id);
        if self.selected_mechanic() == Some(id) {
            debug!("Selection on {:?} dropped: mechanic unregistered", id);
            self.state = PointerState::Idle;
            self.active_touch = None;
        }
    }

    pub fn clear(&mut self) {
        self.registered.clear();
        self.state = PointerState::Idle;
        self.active_touch = None;
    }

    pub fn is_registered(&self, id: MechanicId) -> bool {
        self.registered.iter().any(|(existing, _)| *existing == id)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    //--- Queries ----------------------------------------------------------

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, PointerState::Dragging { .. })
    }

    /// Mechanic and part under the active press or drag.
    pub fn selection(&self) -> Option<(MechanicId, PartId)> {
        self.current().map(|s| (s.mechanic, s.part))
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.camera.set_viewport(viewport);
    }

    //--- Pointer ----------------------------------------------------------

    /// Press at window pixel (`x`, `y`). Returns whether a part was hit.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.release();

        let Some(hit) = self.pick(x, y) else {
            return false;
        };

        let Hit { selection, flags } = hit;
        if flags.draggable && flags.clickable {
            self.state = PointerState::Pressed { selection, x, y };
        } else if flags.draggable {
            debug!("Drag started on {:?} part {}", selection.mechanic, selection.part.0);
            self.state = PointerState::Dragging { selection };
        } else {
            Self::click(&selection);
        }
        true
    }

    /// Pointer motion. Returns whether a drag step was delivered.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        if let PointerState::Pressed { selection, x: px, y: py } = &self.state {
            let travelled = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
            if travelled <= self.drag_threshold {
                return false;
            }
            debug!("Press on {:?} became a drag", selection.mechanic);
            self.state = PointerState::Dragging {
                selection: selection.clone(),
            };
        }

        let PointerState::Dragging { selection } = &self.state else {
            return false;
        };

        let ray = self.camera.screen_ray(x, y);
        let Some(point) = selection.plane.intersect(&ray) else {
            return false;
        };

        let Some(owner) = selection.owner.upgrade() else {
            debug!("Drag target {:?} is gone", selection.mechanic);
            self.state = PointerState::Idle;
            return false;
        };

        let delivered = match owner.try_borrow_mut() {
            Ok(mut mechanic) => mechanic.drag_to(selection.part, point - selection.offset),
            Err(_) => false,
        };
        delivered
    }

    /// Release. Clears selection and drag state unconditionally.
    pub fn pointer_up(&mut self, _x: f32, _y: f32) {
        self.release();
        self.active_touch = None;
    }

    /// Abandons the current gesture without clicking.
    pub fn cancel(&mut self) {
        if let PointerState::Dragging { selection } = std::mem::replace(&mut self.state, PointerState::Idle) {
            Self::end_drag(&selection);
        }
        self.active_touch = None;
    }

    //--- Touch ------------------------------------------------------------

    /// Only the first active touch drives interaction.
    pub fn touch_start(&mut self, id: u64, x: f32, y: f32) -> bool {
        if self.active_touch.is_some() {
            return false;
        }
        self.active_touch = Some(id);
        self.pointer_down(x, y)
    }

    pub fn touch_move(&mut self, id: u64, x: f32, y: f32) -> bool {
        self.active_touch == Some(id) && self.pointer_move(x, y)
    }

    pub fn touch_end(&mut self, id: u64, x: f32, y: f32) {
        if self.active_touch == Some(id) {
            self.pointer_up(x, y);
        }
    }

    pub fn touch_cancel(&mut self, id: u64) {
        if self.active_touch == Some(id) {
            self.cancel();
        }
    }

    //--- Event Routing ----------------------------------------------------

    /// Routes one input event. Returns whether it was pointer input.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerDown { button: MouseButton::Left, x, y } => {
                self.pointer_down(x, y);
            }
            InputEvent::PointerUp { button: MouseButton::Left, x, y } => self.pointer_up(x, y),
            InputEvent::PointerMoved { x, y } => {
                self.pointer_move(x, y);
            }
            InputEvent::TouchStart { id, x, y } => {
                self.touch_start(id, x, y);
            }
            InputEvent::TouchMoved { id, x, y } => {
                self.touch_move(id, x, y);
            }
            InputEvent::TouchEnd { id, x, y } => self.touch_end(id, x, y),
            InputEvent::TouchCancel { id } => self.touch_cancel(id),
            InputEvent::Resized { width, height } => {
                self.set_viewport(Viewport::new(width as f32, height as f32));
            }
            _ => return false,
        }
        true
    }

    //--- Internal Helpers -------------------------------------------------

    fn current(&self) -> Option<&Selection> {
        match &self.state {
            PointerState::Idle => None,
            PointerState::Pressed { selection, .. } | PointerState::Dragging { selection } => Some(selection),
        }
    }

    fn selected_mechanic(&self) -> Option<MechanicId> {
        self.current().map(|s| s.mechanic)
    }

    /// Completes whatever gesture is in flight and returns to Idle.
    fn release(&mut self) {
        match std::mem::replace(&mut self.state, PointerState::Idle) {
            PointerState::Idle => {}
            PointerState::Pressed { selection, .. } => Self::click(&selection),
            PointerState::Dragging { selection } => Self::end_drag(&selection),
        }
    }

    fn click(selection: &Selection) {
        let Some(owner) = selection.owner.upgrade() else {
            return;
        };
        let Ok(mut mechanic) = owner.try_borrow_mut() else {
            return;
        };
        let changed = mechanic.primary_action(selection.part);
        trace!(
            "Click on {:?} part {} ({})",
            selection.mechanic,
            selection.part.0,
            if changed { "applied" } else { "ignored" }
        );
    }

    fn end_drag(selection: &Selection) {
        if let Some(owner) = selection.owner.upgrade() {
            if let Ok(mut mechanic) = owner.try_borrow_mut() {
                mechanic.drag_end(selection.part);
            }
        }
    }

    /// Nearest interactive part under the pixel, across every registered
    /// mechanic.
    fn pick(&self, x: f32, y: f32) -> Option<Hit> {
        let ray = self.camera.screen_ray(x, y);
        let mut best: Option<(f32, Hit)> = None;

        for (id, weak) in &self.registered {
            let Some(owner) = weak.upgrade() else {
                continue;
            };
            let Ok(mechanic) = owner.try_borrow() else {
                continue;
            };

            for target in mechanic.hit_targets() {
                if !target.flags.is_interactive() {
                    continue;
                }
                let Some(t) = target.bounds.intersect(&ray) else {
                    continue;
                };
                if best.as_ref().is_some_and(|(nearest, _)| *nearest <= t) {
                    continue;
                }

                let point = ray.at(t);
                best = Some((
                    t,
                    Hit {
                        selection: Selection {
                            mechanic: *id,
                            owner: weak.clone(),
                            part: target.part,
                            plane: Plane::from_point_normal(point, Vec3::Z),
                            offset: point - target.bounds.center,
                        },
                        flags: target.flags,
                    },
                ));
            }
        }

        best.map(|(_, hit)| hit)
    }
}

struct Hit {
    selection: Selection,
    flags: NodeFlags,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::EventBus;
    use crate::core::interaction::OrthographicCamera;
    use crate::core::math::BoundingSphere;
    use crate::core::mechanics::{HitTarget, Mechanic, MechanicCore, MechanicKind};
    use crate::core::scene::VisualNode;
    use std::any::Any;
    use std::cell::RefCell;

    //--- Probe Mechanic ---------------------------------------------------

    struct Probe {
        core: MechanicCore,
        center: Vec3,
        radius: f32,
        flags: NodeFlags,
        clicks: u32,
        drags: Vec<Vec3>,
        drag_ends: u32,
    }

    impl Probe {
        fn shared(id: u64, center: Vec3, radius: f32, flags: NodeFlags) -> Rc<RefCell<Probe>> {
            let core = MechanicCore::new(MechanicId(id), "probe", MechanicKind::Pull, center, EventBus::shared());
            Rc::new(RefCell::new(Probe {
                core,
                center,
                radius,
                flags,
                clicks: 0,
                drags: Vec::new(),
                drag_ends: 0,
            }))
        }
    }

    impl Mechanic for Probe {
        fn core(&self) -> &MechanicCore {
            &self.core
        }

        fn reset(&mut self) {}

        fn primary_action(&mut self, _part: PartId) -> bool {
            self.clicks += 1;
            true
        }

        fn drag_to(&mut self, _part: PartId, position: Vec3) -> bool {
            self.drags.push(position);
            true
        }

        fn drag_end(&mut self, _part: PartId) {
            self.drag_ends += 1;
        }

        fn hit_targets(&self) -> Vec<HitTarget> {
            vec![HitTarget {
                part: PartId(0),
                bounds: BoundingSphere::new(self.center, self.radius),
                flags: self.flags,
            }]
        }

        fn nodes(&self) -> Vec<VisualNode> {
            Vec::new()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// 200x200 window, one unit per pixel: pixel (100, 100) is the origin.
    fn controller() -> InteractionController {
        InteractionController::new(Box::new(OrthographicCamera::pixel_aligned(
            Viewport::new(200.0, 200.0),
            1000.0,
        )))
    }

    fn as_shared(probe: &Rc<RefCell<Probe>>) -> SharedMechanic {
        probe.clone()
    }

    //--- Tests ------------------------------------------------------------

    #[test]
    fn clickable_part_clicks_on_press() {
        let probe = Probe::shared(1, Vec3::ZERO, 10.0, NodeFlags::CLICKABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        assert!(ctl.pointer_down(100.0, 100.0));
        assert_eq!(probe.borrow().clicks, 1);
        ctl.pointer_up(100.0, 100.0);
        assert_eq!(probe.borrow().clicks, 1);
    }

    #[test]
    fn miss_selects_nothing() {
        let probe = Probe::shared(1, Vec3::ZERO, 10.0, NodeFlags::CLICKABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        assert!(!ctl.pointer_down(10.0, 10.0));
        assert_eq!(probe.borrow().clicks, 0);
        assert!(ctl.selection().is_none());
    }

    #[test]
    fn nearest_part_wins() {
        let far = Probe::shared(1, Vec3::new(0.0, 0.0, 0.0), 10.0, NodeFlags::CLICKABLE);
        let near = Probe::shared(2, Vec3::new(0.0, 0.0, 50.0), 10.0, NodeFlags::CLICKABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&far));
        ctl.register(&as_shared(&near));

        ctl.pointer_down(100.0, 100.0);
        assert_eq!(near.borrow().clicks, 1);
        assert_eq!(far.borrow().clicks, 0);
    }

    #[test]
    fn draggable_part_follows_pointer_with_offset() {
        let probe = Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::DRAGGABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        // Grab 5 units right of centre, move 30 right and 10 up.
        ctl.pointer_down(105.0, 100.0);
        assert!(ctl.is_dragging());
        assert!(ctl.pointer_move(135.0, 90.0));

        let drags = probe.borrow().drags.clone();
        assert_eq!(drags.len(), 1);
        assert!((drags[0].x - 30.0).abs() < 1e-3);
        assert!((drags[0].y - 10.0).abs() < 1e-3);

        ctl.pointer_up(135.0, 90.0);
        assert_eq!(probe.borrow().drag_ends, 1);
        assert_eq!(probe.borrow().clicks, 0);
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn press_on_dual_part_clicks_unless_moved() {
        let probe = Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::BOTH);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        ctl.pointer_down(100.0, 100.0);
        assert!(!ctl.pointer_move(102.0, 100.0), "Within threshold stays a press");
        ctl.pointer_up(102.0, 100.0);
        assert_eq!(probe.borrow().clicks, 1);
        assert!(probe.borrow().drags.is_empty());

        ctl.pointer_down(100.0, 100.0);
        assert!(ctl.pointer_move(130.0, 100.0));
        ctl.pointer_up(130.0, 100.0);
        assert_eq!(probe.borrow().clicks, 1);
        assert_eq!(probe.borrow().drag_ends, 1);
    }

    #[test]
    fn unregister_drops_selection_and_release_is_safe() {
        let probe = Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::DRAGGABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        ctl.pointer_down(100.0, 100.0);
        ctl.unregister(MechanicId(1));
        assert!(ctl.selection().is_none());

        assert!(!ctl.pointer_move(150.0, 100.0));
        ctl.pointer_up(150.0, 100.0);
        assert!(probe.borrow().drags.is_empty());
        assert_eq!(probe.borrow().drag_ends, 0);
    }

    #[test]
    fn dropped_owner_is_tolerated() {
        let probe = Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::DRAGGABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        ctl.pointer_down(100.0, 100.0);
        drop(probe);
        assert!(!ctl.pointer_move(120.0, 100.0));
        ctl.pointer_up(120.0, 100.0);
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn only_first_touch_interacts() {
        let probe = Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::DRAGGABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        assert!(ctl.touch_start(7, 100.0, 100.0));
        assert!(!ctl.touch_start(8, 100.0, 100.0));
        assert!(!ctl.touch_move(8, 150.0, 100.0));
        assert!(ctl.touch_move(7, 110.0, 100.0));

        ctl.touch_end(8, 150.0, 100.0);
        assert!(ctl.is_dragging());
        ctl.touch_end(7, 110.0, 100.0);
        assert!(!ctl.is_dragging());
        assert_eq!(probe.borrow().drag_ends, 1);
    }

    #[test]
    fn touch_cancel_ends_drag_without_click() {
        let probe = Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::BOTH);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        ctl.touch_start(1, 100.0, 100.0);
        ctl.touch_cancel(1);
        assert_eq!(probe.borrow().clicks, 0);
        assert!(ctl.selection().is_none());
    }

    #[test]
    fn handle_input_routes_left_button_only() {
        let probe = Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::CLICKABLE);
        let mut ctl = controller();
        ctl.register(&as_shared(&probe));

        ctl.handle_input(&InputEvent::PointerDown { button: MouseButton::Right, x: 100.0, y: 100.0 });
        assert_eq!(probe.borrow().clicks, 0);

        assert!(ctl.handle_input(&InputEvent::PointerDown { button: MouseButton::Left, x: 100.0, y: 100.0 }));
        assert_eq!(probe.borrow().clicks, 1);
    }

    #[test]
    fn register_is_idempotent() {
        let probe = as_shared(&Probe::shared(1, Vec3::ZERO, 20.0, NodeFlags::CLICKABLE));
        let mut ctl = controller();
        ctl.register(&probe);
        ctl.register(&probe);
        assert_eq!(ctl.registered_count(), 1);

        ctl.clear();
        assert_eq!(ctl.registered_count(), 0);
    }
}
