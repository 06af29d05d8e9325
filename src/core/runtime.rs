//=========================================================================
// Card Runtime
//=========================================================================
//
// The whole storybook core behind one object: event bus, scene manager
// and interaction controller, fed with engine input events and a frame
// tick.
//
// Per tick (driven by the logic thread):
//   handle_input(events) → pointer/touch → InteractionController
//                        → keys → page_flip / reset
//                        → SceneManager::pump()
//   tick(dt)             → SceneManager::update(dt)
//
// Keyboard stands in for the page renderer: arrows publish `page_flip`
// on the bus exactly as a page-turn widget would.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use log::{debug, info};

//=== Internal Dependencies ===============================================

use crate::core::effects::SoundController;
use crate::core::event_bus::{EventBus, EventPayload};
use crate::core::input::{InputEvent, KeyCode};
use crate::core::interaction::{InteractionController, OrthographicCamera, Viewport};
use crate::core::scene::{SceneConfig, SceneGraph, SceneManager};

//=== CardRuntime =========================================================

pub struct CardRuntime {
    bus: Rc<EventBus>,
    scenes: SceneManager,
    page_count: usize,
}

impl CardRuntime {
    /// Depth the orthographic camera looks down from.
    const CAMERA_HEIGHT: f32 = 1000.0;

    /// Runtime with a pixel-aligned orthographic camera, silent audio and
    /// no renderer attached.
    pub fn new(config: SceneConfig, page_count: usize, viewport: Viewport) -> Self {
        let bus = EventBus::shared();
        let camera = OrthographicCamera::pixel_aligned(viewport, Self::CAMERA_HEIGHT);
        let scenes = SceneManager::new(Rc::clone(&bus), config, InteractionController::new(Box::new(camera)));
        Self::from_parts(bus, scenes, page_count)
    }

    /// Runtime around an already configured scene manager.
    pub fn from_parts(bus: Rc<EventBus>, scenes: SceneManager, page_count: usize) -> Self {
        Self {
            bus,
            scenes,
            page_count: page_count.max(1),
        }
    }

    pub fn with_sound(mut self, sound: SoundController) -> Self {
        self.scenes = self.scenes.with_sound(sound);
        self
    }

    pub fn with_scene_graph(mut self, graph: Box<dyn SceneGraph>) -> Self {
        self.scenes = self.scenes.with_scene_graph(graph);
        self
    }

    //--- Lifecycle --------------------------------------------------------

    pub fn start(&mut self, page: usize) {
        let page = page.min(self.page_count - 1);
        info!("Storybook opening at page {} of {}", page, self.page_count);
        self.scenes.start(page);
    }

    /// Unloads everything and drops every bus subscription.
    pub fn shutdown(&mut self) {
        self.scenes.teardown();
        self.bus.unsubscribe_all();
        info!("Storybook closed");
    }

    //--- Input ------------------------------------------------------------

    pub fn handle_input(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown { key } => self.handle_key(key),
            _ => {
                self.scenes.interaction_mut().handle_input(event);
            }
        }
        self.scenes.pump();
    }

    pub fn handle_batch(&mut self, events: &[InputEvent]) {
        for event in events {
            self.handle_input(event);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let Some(current) = self.scenes.active_page() else {
            return;
        };
        let last = self.page_count - 1;
        let target = match key {
            KeyCode::ArrowRight | KeyCode::PageDown | KeyCode::Space => (current < last).then(|| current + 1),
            KeyCode::ArrowLeft | KeyCode::PageUp => current.checked_sub(1),
            KeyCode::Home => (current != 0).then_some(0),
            KeyCode::End => (current != last).then_some(last),
            KeyCode::Escape => {
                self.scenes.reset_all();
                None
            }
            _ => None,
        };

        if let Some(to_page) = target {
            debug!("Key {:?} turns page {} → {}", key, current, to_page);
            self.flip_to(to_page);
        }
    }

    /// Publishes `page_flip` from the current page to `page`.
    pub fn flip_to(&mut self, page: usize) {
        let Some(from_page) = self.scenes.active_page() else {
            return;
        };
        self.bus.emit(&EventPayload::PageFlip {
            from_page,
            to_page: page.min(self.page_count - 1),
        });
        self.scenes.pump();
    }

    //--- Frame Tick -------------------------------------------------------

    pub fn tick(&mut self, dt: f32) {
        self.scenes.update(dt);
    }

    //--- Query API --------------------------------------------------------

    pub fn current_page(&self) -> Option<usize> {
        self.scenes.active_page()
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
