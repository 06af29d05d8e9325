//=========================================================================
// Scene Manager
//=========================================================================
//
// Owns one page scene per book page and drives the page lifecycle.
//
// Architecture:
//   EventBus ──page_flip / mechanic_trigger / combinator_complete──→ inbox
//   pump() ──drain inbox──→ flip_page / on_mechanic_trigger / on_combinator_complete
//
//   load(page):   build scene if missing → active → register mechanics
//                 with the interaction controller → mount nodes →
//                 attach combinators → page-enter sound
//   unload(page): inactive → unregister → unmount nodes → detach
//                 combinators → reset mechanics, combinators, effects
//
// At most one scene is active. A page flip always unloads the old page
// before loading the new one, so no stale node stays registered.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use log::{debug, info, trace, warn};

//=== Internal Dependencies ===============================================

use super::inbox::EventInbox;
use super::{NodeId, NullSceneGraph, PageConfig, PageScene, SceneConfig, SceneGraph};
use crate::core::effects::{EffectGenerator, SoundController, SoundCue};
use crate::core::event_bus::{
    EventBus, EventPayload, MechanicTrigger, SubscriptionId, COMBINATOR_COMPLETE, MECHANIC_TRIGGER, PAGE_FLIP,
};
use crate::core::interaction::InteractionController;
use crate::core::math::Vec3;
use crate::core::mechanics::{CombinatorId, MechanicFactory, MechanicId, SharedMechanic};

//=== SceneManager ========================================================

pub struct SceneManager {
    bus: Rc<EventBus>,
    config: SceneConfig,
    factory: MechanicFactory,
    effects: EffectGenerator,
    sound: SoundController,
    interaction: InteractionController,
    graph: Box<dyn SceneGraph>,
    scenes: BTreeMap<usize, PageScene>,
    active: Option<usize>,
    next_combinator: u64,
    mounted: HashSet<NodeId>,
    inbox: EventInbox,
    subscriptions: Vec<(&'static str, SubscriptionId)>,
}

impl SceneManager {
    //--- Construction -----------------------------------------------------

    /// Creates the manager and subscribes it to the bus. No page is
    /// loaded until `load` or a `page_flip` arrives.
    pub fn new(bus: Rc<EventBus>, config: SceneConfig, interaction: InteractionController) -> Self {
        let inbox = EventInbox::new();
        let subscriptions = [PAGE_FLIP, MECHANIC_TRIGGER, COMBINATOR_COMPLETE]
            .into_iter()
            .map(|name| {
                let inbox = inbox.clone();
                (name, bus.subscribe(name, move |payload| inbox.push(payload.clone())))
            })
            .collect();

        Self {
            factory: MechanicFactory::new(Rc::clone(&bus)),
            bus,
            config,
            effects: EffectGenerator::new(),
            sound: SoundController::silent(),
            interaction,
            graph: Box::new(NullSceneGraph),
            scenes: BTreeMap::new(),
            active: None,
            next_combinator: 1,
            mounted: HashSet::new(),
            inbox,
            subscriptions,
        }
    }

    pub fn with_sound(mut self, sound: SoundController) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_scene_graph(mut self, graph: Box<dyn SceneGraph>) -> Self {
        self.graph = graph;
        self
    }

    //--- Page Lifecycle ---------------------------------------------------

    /// Activates `page`, building its scene on first use. Any other
    /// active page is unloaded first. No-op if `page` is already active.
    pub fn load(&mut self, page: usize) {
        if self.active == Some(page) {
            debug!("Page {} already active", page);
            return;
        }
        if let Some(previous) = self.active {
            self.unload(previous);
        }

        if !self.scenes.contains_key(&page) {
            let scene = self.build_scene(page);
            self.scenes.insert(page, scene);
        }
        let Some(scene) = self.scenes.get_mut(&page) else {
            return;
        };

        scene.set_active(true);
        for entry in scene.mechanics() {
            self.interaction.register(&entry.mechanic);
        }
        for node in scene.nodes() {
            self.graph.add_node(&node);
            self.mounted.insert(node.id);
        }
        scene.attach_combinators();

        self.active = Some(page);
        self.sound.play(SoundCue::PageEnter);
        info!("Page {} loaded ({} mechanic(s))", page, scene.mechanics().len());
    }

    /// Deactivates `page` and returns its scene to the initial state.
    pub fn unload(&mut self, page: usize) {
        let Some(scene) = self.scenes.get_mut(&page) else {
            trace!("Unload of page {} without a scene", page);
            return;
        };

        scene.set_active(false);
        for entry in scene.mechanics() {
            self.interaction.unregister(entry.id);
        }

        let mechanics: HashSet<MechanicId> = scene.mechanics().iter().map(|m| m.id).collect();
        let graph = &mut self.graph;
        self.mounted.retain(|id| {
            if mechanics.contains(&id.mechanic) {
                graph.remove_node(*id);
                false
            } else {
                true
            }
        });

        scene.detach_combinators();
        scene.reset();

        if self.active == Some(page) {
            self.active = None;
        }
        debug!("Page {} unloaded", page);
    }

    /// Unloads `from`, loads `to`, then announces `scene_changed`.
    pub fn flip_page(&mut self, from: usize, to: usize) {
        info!("Page flip {} → {}", from, to);
        self.unload(from);
        self.load(to);
        self.bus.emit(&EventPayload::SceneChanged {
            from_page: Some(from),
            to_page: to,
        });
    }

    /// Loads the first page and announces it.
    pub fn start(&mut self, page: usize) {
        self.load(page);
        self.bus.emit(&EventPayload::SceneChanged {
            from_page: None,
            to_page: page,
        });
    }

    fn build_scene(&mut self, page: usize) -> PageScene {
        let empty = PageConfig::default();
        let config = match self.config.page(page) {
            Some(config) => config,
            None => {
                debug!("Page {} has no configuration; using an empty scene", page);
                &empty
            }
        };
        PageScene::build(
            page,
            config,
            &mut self.factory,
            &mut self.effects,
            &self.bus,
            &mut self.next_combinator,
        )
    }

    //--- Frame Tick -------------------------------------------------------

    /// Advances every built mechanic and the active scene's effects,
    /// mirrors the active nodes into the scene graph and processes queued
    /// events.
    pub fn update(&mut self, dt: f32) {
        self.factory.update_all(dt);
        if let Some(page) = self.active {
            if let Some(scene) = self.scenes.get_mut(&page) {
                scene.update(dt);
                for node in scene.nodes() {
                    if self.mounted.insert(node.id) {
                        self.graph.add_node(&node);
                    } else {
                        self.graph.update_node(&node);
                    }
                }
            }
        }
        self.pump();
    }

    /// Handles every queued bus event in arrival order. Returns how many
    /// were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Some(payload) = self.inbox.pop() {
            processed += 1;
            match payload {
                EventPayload::PageFlip { from_page, to_page } => self.flip_page(from_page, to_page),
                EventPayload::MechanicTrigger(trigger) => self.on_mechanic_trigger(&trigger),
                EventPayload::CombinatorComplete { combinator, mechanics, .. } => {
                    self.on_combinator_complete(combinator, &mechanics)
                }
                other => trace!("Ignoring {}", other.name()),
            }
        }
        processed
    }

    //--- Event Handlers ---------------------------------------------------

    fn on_mechanic_trigger(&mut self, trigger: &MechanicTrigger) {
        let Some(page) = self.active else {
            return;
        };
        let Some(scene) = self.scenes.get_mut(&page) else {
            return;
        };
        let Some(entry) = scene.mechanic_by_id(trigger.mechanic) else {
            trace!("Trigger from {:?} is not on the active page", trigger.mechanic);
            return;
        };
        let name = entry.name.clone();
        let origin = entry.anchor();

        self.sound.play(SoundCue::Success);
        let started = scene.play_effects_for(&name, origin);
        debug!("Mechanic '{}' completed on page {}; {} effect(s) started", name, page, started);

        self.bus.emit(&EventPayload::MechanicCompleted {
            page,
            mechanic: trigger.mechanic,
            name,
        });
    }

    fn on_combinator_complete(&mut self, combinator: CombinatorId, mechanics: &[MechanicId]) {
        let Some(page) = self.active else {
            return;
        };
        let Some(scene) = self.scenes.get_mut(&page) else {
            return;
        };
        let Some(name) = scene
            .combinator_by_id(combinator)
            .and_then(|c| c.try_borrow().ok().map(|c| c.name().to_string()))
        else {
            trace!("Completion of {:?} is not on the active page", combinator);
            return;
        };

        self.sound.play(SoundCue::Success);

        let points: Vec<Vec3> = mechanics
            .iter()
            .filter_map(|id| scene.mechanic_by_id(*id))
            .map(|entry| entry.anchor())
            .collect();
        let mut line = self.effects.connection(points);
        line.play(Vec3::ZERO);
        scene.spawn_transient(line);

        info!("Combination '{}' completed on page {}", name, page);
        self.bus.emit(&EventPayload::CombinationCompleted {
            page,
            combinator,
            name,
        });
    }

    //--- Bulk Operations --------------------------------------------------

    /// Returns every mechanic on every page to its initial state and
    /// abandons any gesture in flight.
    pub fn reset_all(&mut self) {
        self.interaction.cancel();
        self.factory.reset_all();
        for scene in self.scenes.values_mut() {
            scene.reset_combinators();
            scene.stop_effects();
        }
        info!("All mechanics reset");
    }

    /// Unloads the active page and unsubscribes from the bus.
    pub fn teardown(&mut self) {
        if let Some(page) = self.active {
            self.unload(page);
        }
        for (name, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(name, id);
        }
        self.interaction.clear();
        self.inbox.clear();
    }

    //--- Query API --------------------------------------------------------

    pub fn active_page(&self) -> Option<usize> {
        self.active
    }

    pub fn active_scene(&self) -> Option<&PageScene> {
        self.active.and_then(|page| self.scenes.get(&page))
    }

    pub fn scene(&self, page: usize) -> Option<&PageScene> {
        self.scenes.get(&page)
    }

    /// Mechanic `name` of `page`, if that page has been built.
    pub fn mechanic(&self, page: usize, name: &str) -> Option<SharedMechanic> {
        self.scenes.get(&page)?.mechanic(name).cloned()
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionController {
        &mut self.interaction
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn live_mechanics(&self) -> usize {
        self.factory.live_count()
    }
}

impl Drop for SceneManager {
    fn drop(&mut self) {
        if !self.subscriptions.is_empty() {
            warn!("SceneManager dropped without teardown; tearing down now");
            self.teardown();
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
