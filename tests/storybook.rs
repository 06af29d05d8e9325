//=========================================================================
// Storybook Integration Tests
//=========================================================================
//
// Drives a whole `CardRuntime` with input events and frame ticks, the
// same way the logic thread does.
//
//=========================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use storybook_engine::core::event_bus::{EventPayload, COMBINATION_COMPLETED, MECHANIC_COMPLETED};
use storybook_engine::core::input::{InputEvent, KeyCode, MouseButton};
use storybook_engine::core::interaction::Viewport;
use storybook_engine::core::mechanics::{
    with_variant, LightRevealMechanic, Mechanic, PressureMechanic, PullMechanic,
};
use storybook_engine::core::scene::{MemorySceneGraph, SceneConfig};
use storybook_engine::core::CardRuntime;

//--- Helpers -------------------------------------------------------------

const BOOK: &str = r#"{
    "0": {
        "mechanics": [
            { "id": "button", "type": "pressure" },
            { "id": "lever", "type": "pull", "options": { "position": { "x": 100.0, "y": 0.0, "z": 0.0 } } }
        ],
        "combinators": [{ "id": "both", "type": "all", "mechanicIds": ["button", "lever"] }],
        "effects": [{ "id": "sparks", "type": "burst", "triggerMechanicId": "button" }]
    },
    "1": {
        "mechanics": [{ "id": "map", "type": "light" }]
    },
    "2": {
        "mechanics": [{ "id": "cord", "type": "pull" }]
    }
}"#;

/// 400x400 window; page point (x, y) sits at pixel (200 + x, 200 - y).
fn runtime(start: usize) -> CardRuntime {
    let config = SceneConfig::from_json(BOOK).expect("valid book");
    let mut runtime = CardRuntime::new(config, 3, Viewport::new(400.0, 400.0));
    runtime.start(start);
    runtime
}

fn run(runtime: &mut CardRuntime, seconds: f32) {
    let steps = (seconds / 0.05).ceil() as usize;
    for _ in 0..steps {
        runtime.tick(0.05);
    }
}

fn click(runtime: &mut CardRuntime, x: f32, y: f32) {
    runtime.handle_batch(&[
        InputEvent::PointerDown { button: MouseButton::Left, x, y },
        InputEvent::PointerUp { button: MouseButton::Left, x, y },
    ]);
}

fn count_events(runtime: &CardRuntime, name: &str) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    runtime.bus().subscribe(name, move |_| c.set(c.get() + 1));
    count
}

//--- Scenarios -----------------------------------------------------------

#[test]
fn pressing_button_plays_its_effect_once() {
    let mut rt = runtime(0);
    let completed = count_events(&rt, MECHANIC_COMPLETED);

    click(&mut rt, 200.0, 200.0);
    run(&mut rt, 2.0);

    let button = rt.scenes().mechanic(0, "button").expect("button");
    assert!(button.borrow().is_triggered());
    assert_eq!(completed.get(), 1);

    let scene = rt.scenes().scene(0).expect("scene");
    assert_eq!(scene.effect_play_count("sparks"), Some(1));

    // A second press on a latched button does nothing.
    click(&mut rt, 200.0, 200.0);
    run(&mut rt, 1.0);
    assert_eq!(rt.scenes().scene(0).and_then(|s| s.effect_play_count("sparks")), Some(1));
}

#[test]
fn all_combinator_completes_once_with_connection() {
    let mut rt = runtime(0);
    let combos = Rc::new(RefCell::new(Vec::new()));
    let c = Rc::clone(&combos);
    rt.bus()
        .subscribe(COMBINATION_COMPLETED, move |p| c.borrow_mut().push(p.clone()));

    let button = rt.scenes().mechanic(0, "button").expect("button");
    let lever = rt.scenes().mechanic(0, "lever").expect("lever");

    with_variant(&button, |b: &mut PressureMechanic| b.press());
    run(&mut rt, 1.0);
    assert!(combos.borrow().is_empty());

    with_variant(&lever, |l: &mut PullMechanic| l.pull());
    run(&mut rt, 2.0);

    let combos = combos.borrow();
    assert_eq!(combos.len(), 1);
    match &combos[0] {
        EventPayload::CombinationCompleted { page, name, .. } => {
            assert_eq!(*page, 0);
            assert_eq!(name, "both");
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn page_flip_mid_drag_drops_the_drag() {
    let mut rt = runtime(1);
    let map = rt.scenes().mechanic(1, "map").expect("map");

    // The light rests over the page centre; drag it to the right.
    rt.handle_input(&InputEvent::PointerDown { button: MouseButton::Left, x: 200.0, y: 200.0 });
    rt.handle_input(&InputEvent::PointerMoved { x: 260.0, y: 200.0 });
    assert!(rt.scenes().interaction().is_dragging());
    let progress = with_variant(&map, |l: &mut LightRevealMechanic| l.reveal_progress());
    assert!(progress.is_some_and(|p| p > 0.0));

    rt.handle_input(&InputEvent::KeyDown { key: KeyCode::ArrowRight });
    assert_eq!(rt.current_page(), Some(2));
    assert!(!rt.scenes().interaction().is_dragging());
    assert!(rt.scenes().interaction().selection().is_none());

    rt.handle_input(&InputEvent::PointerMoved { x: 100.0, y: 100.0 });
    rt.handle_input(&InputEvent::PointerUp { button: MouseButton::Left, x: 100.0, y: 100.0 });
    run(&mut rt, 0.5);

    let progress = with_variant(&map, |l: &mut LightRevealMechanic| l.reveal_progress());
    assert_eq!(progress, Some(0.0));
}

#[test]
fn nodes_follow_the_active_page() {
    let graph = Rc::new(RefCell::new(MemorySceneGraph::new()));
    let config = SceneConfig::from_json(BOOK).expect("valid book");
    let mut rt = CardRuntime::new(config, 3, Viewport::new(400.0, 400.0)).with_scene_graph(Box::new(Rc::clone(&graph)));
    rt.start(0);

    let button_id = rt.scenes().mechanic(0, "button").expect("button").borrow().id();
    assert!(graph.borrow().contains_mechanic(button_id));

    rt.handle_input(&InputEvent::KeyDown { key: KeyCode::End });
    rt.tick(0.05);

    let cord_id = rt.scenes().mechanic(2, "cord").expect("cord").borrow().id();
    assert!(!graph.borrow().contains_mechanic(button_id));
    assert!(graph.borrow().contains_mechanic(cord_id));
}

#[test]
fn escape_resets_the_book() {
    let mut rt = runtime(0);
    let lever = rt.scenes().mechanic(0, "lever").expect("lever");
    click(&mut rt, 300.0, 200.0);
    run(&mut rt, 2.0);
    assert!(lever.borrow().is_triggered());

    rt.handle_input(&InputEvent::KeyDown { key: KeyCode::Escape });
    assert!(!lever.borrow().is_triggered());
    assert_eq!(rt.current_page(), Some(0));
}

#[test]
fn touch_drives_the_same_interactions() {
    let mut rt = runtime(0);
    rt.handle_batch(&[
        InputEvent::TouchStart { id: 7, x: 200.0, y: 200.0 },
        InputEvent::TouchEnd { id: 7, x: 200.0, y: 200.0 },
    ]);
    run(&mut rt, 2.0);

    let button = rt.scenes().mechanic(0, "button").expect("button");
    assert!(button.borrow().is_triggered());
}

#[test]
fn shutdown_releases_everything() {
    let mut rt = runtime(0);
    rt.shutdown();
    assert!(rt.bus().is_empty());
    assert_eq!(rt.scenes().interaction().registered_count(), 0);
}
