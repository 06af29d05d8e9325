//=========================================================================
// Page Scene
//=========================================================================
//
// Everything configured for one page of the book: its mechanics, the
// props they manipulate, its combinators and its effects.
//
// Lifecycle (driven by the scene manager):
//   build ──→ inactive ──load──→ active ──unload──→ inactive ...
//
// A scene keeps its instances across activations; `reset()` brings them
// back to their initial state instead of rebuilding them.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};
use serde::Deserialize;

//=== Internal Dependencies ===============================================

use crate::core::effects::{Effect, EffectGenerator};
use crate::core::event_bus::EventBus;
use crate::core::math::Vec3;
use crate::core::mechanics::{
    CombinatorId, CombinatorPolicy, MechanicCombinator, MechanicFactory, MechanicId, SharedAttractable,
    SharedMechanic,
};
use crate::core::scene::{decode_options, CombinatorConfig, ConfigError, PageConfig, VisualNode};

//=== Entries =============================================================

/// A mechanic together with its configuration id.
pub struct SceneMechanic {
    pub name: String,
    pub id: MechanicId,
    pub mechanic: SharedMechanic,
}

impl SceneMechanic {
    /// Anchor of the mechanic, or the origin while it is borrowed.
    pub fn anchor(&self) -> Vec3 {
        self.mechanic.try_borrow().map(|m| m.anchor()).unwrap_or(Vec3::ZERO)
    }
}

struct SceneEffect {
    effect: Box<dyn Effect>,
    trigger: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CombinatorOptions {
    /// Expected order for `sequence`, overriding `mechanicIds`.
    sequence: Vec<String>,
}

//=== PageScene ===========================================================

pub struct PageScene {
    page: usize,
    active: bool,
    mechanics: Vec<SceneMechanic>,
    props: Vec<SharedAttractable>,
    combinators: Vec<Rc<RefCell<MechanicCombinator>>>,
    effects: Vec<SceneEffect>,
    transient: Vec<Box<dyn Effect>>,
}

impl PageScene {
    /// A page with nothing on it.
    pub fn empty(page: usize) -> Self {
        Self {
            page,
            active: false,
            mechanics: Vec::new(),
            props: Vec::new(),
            combinators: Vec::new(),
            effects: Vec::new(),
            transient: Vec::new(),
        }
    }

    /// Builds the scene for `page`. Entries that fail to build are logged
    /// and skipped; the rest of the page still loads.
    pub fn build(
        page: usize,
        config: &PageConfig,
        factory: &mut MechanicFactory,
        generator: &mut EffectGenerator,
        bus: &Rc<EventBus>,
        next_combinator: &mut u64,
    ) -> Self {
        let mut scene = Self::empty(page);

        for entry in &config.mechanics {
            match factory.create(entry) {
                Ok(built) => {
                    let id = built.mechanic.borrow().id();
                    scene.mechanics.push(SceneMechanic {
                        name: entry.id.clone(),
                        id,
                        mechanic: built.mechanic,
                    });
                    scene.props.extend(built.props);
                }
                Err(e) => warn!("Page {}: skipping mechanic: {}", page, e),
            }
        }

        let ids: HashMap<&str, MechanicId> = scene.mechanics.iter().map(|m| (m.name.as_str(), m.id)).collect();

        for (n, entry) in config.combinators.iter().enumerate() {
            let name = if entry.id.is_empty() {
                format!("combinator_{}_{}", page, n)
            } else {
                entry.id.clone()
            };
            let id = CombinatorId(*next_combinator);
            match Self::build_combinator(id, &name, entry, &ids, bus) {
                Ok(combinator) => {
                    *next_combinator += 1;
                    scene.combinators.push(Rc::new(RefCell::new(combinator)));
                }
                Err(e) => warn!("Page {}: skipping combinator: {}", page, e),
            }
        }

        for (n, entry) in config.effects.iter().enumerate() {
            let mut entry = entry.clone();
            if entry.id.is_empty() {
                entry.id = format!("effect_{}_{}", page, n);
            }
            match generator.create(&entry) {
                Ok(effect) => scene.effects.push(SceneEffect {
                    effect,
                    trigger: entry.trigger_mechanic_id.clone(),
                }),
                Err(e) => warn!("Page {}: skipping effect: {}", page, e),
            }
        }

        debug!(
            "Built page {}: {} mechanic(s), {} combinator(s), {} effect(s)",
            page,
            scene.mechanics.len(),
            scene.combinators.len(),
            scene.effects.len()
        );
        scene
    }

    fn build_combinator(
        id: CombinatorId,
        name: &str,
        entry: &CombinatorConfig,
        ids: &HashMap<&str, MechanicId>,
        bus: &Rc<EventBus>,
    ) -> Result<MechanicCombinator, ConfigError> {
        let policy = CombinatorPolicy::from_config(&entry.policy).ok_or_else(|| {
            ConfigError::UnknownCombinatorPolicy {
                id: name.to_string(),
                policy: entry.policy.clone(),
            }
        })?;
        let options: CombinatorOptions = decode_options(name, &entry.options)?;

        let order = if policy == CombinatorPolicy::Sequence && !options.sequence.is_empty() {
            &options.sequence
        } else {
            &entry.mechanic_ids
        };

        let mechanics: Vec<MechanicId> = order
            .iter()
            .filter_map(|key| {
                let found = ids.get(key.as_str()).copied();
                if found.is_none() {
                    warn!("Combinator '{}' references unknown mechanic '{}'; ignoring it", name, key);
                }
                found
            })
            .collect();

        Ok(MechanicCombinator::new(id, name, policy, mechanics, Rc::clone(bus)))
    }

    //--- Lifecycle --------------------------------------------------------

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn attach_combinators(&self) {
        for combinator in &self.combinators {
            MechanicCombinator::attach(combinator);
        }
    }

    pub(crate) fn detach_combinators(&self) {
        for combinator in &self.combinators {
            if let Ok(mut c) = combinator.try_borrow_mut() {
                c.detach();
            }
        }
    }

    /// Advances every effect still playing. Mechanics are ticked by the
    /// factory that built them.
    pub fn update(&mut self, dt: f32) {
        for entry in &mut self.effects {
            if entry.effect.is_playing() {
                entry.effect.update(dt);
            }
        }

        for effect in &mut self.transient {
            effect.update(dt);
        }
        self.transient.retain(|effect| effect.is_playing());
    }

    /// Resets mechanics and combinators and stops all effects.
    pub fn reset(&mut self) {
        for entry in &self.mechanics {
            if let Ok(mut mechanic) = entry.mechanic.try_borrow_mut() {
                mechanic.reset();
            }
        }
        self.reset_combinators();
        self.stop_effects();
    }

    pub fn reset_combinators(&self) {
        for combinator in &self.combinators {
            if let Ok(mut c) = combinator.try_borrow_mut() {
                c.reset();
            }
        }
    }

    pub fn stop_effects(&mut self) {
        for entry in &mut self.effects {
            entry.effect.stop();
        }
        self.transient.clear();
    }

    //--- Effects ----------------------------------------------------------

    /// Plays every effect wired to the mechanic named `name` at `origin`.
    /// Returns how many were started.
    pub fn play_effects_for(&mut self, name: &str, origin: Vec3) -> usize {
        let mut started = 0;
        for entry in &mut self.effects {
            if entry.trigger.as_deref() == Some(name) {
                entry.effect.play(origin);
                started += 1;
            }
        }
        started
    }

    /// Takes ownership of a one-shot effect until it stops playing.
    pub fn spawn_transient(&mut self, effect: Box<dyn Effect>) {
        self.transient.push(effect);
    }

    pub fn transient_count(&self) -> usize {
        self.transient.len()
    }

    /// Plays so far of the configured effect with this id.
    pub fn effect_play_count(&self, id: &str) -> Option<u32> {
        self.effects
            .iter()
            .find(|entry| entry.effect.id() == id)
            .map(|entry| entry.effect.play_count())
    }

    pub fn is_effect_playing(&self, id: &str) -> bool {
        self.effects
            .iter()
            .any(|entry| entry.effect.id() == id && entry.effect.is_playing())
    }

    //--- Query API --------------------------------------------------------

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mechanics(&self) -> &[SceneMechanic] {
        &self.mechanics
    }

    /// Mechanic with the configuration id `name`.
    pub fn mechanic(&self, name: &str) -> Option<&SharedMechanic> {
        self.mechanics.iter().find(|m| m.name == name).map(|m| &m.mechanic)
    }

    pub fn mechanic_by_id(&self, id: MechanicId) -> Option<&SceneMechanic> {
        self.mechanics.iter().find(|m| m.id == id)
    }

    pub fn props(&self) -> &[SharedAttractable] {
        &self.props
    }

    pub fn combinators(&self) -> &[Rc<RefCell<MechanicCombinator>>] {
        &self.combinators
    }

    pub fn combinator(&self, name: &str) -> Option<&Rc<RefCell<MechanicCombinator>>> {
        self.combinators
            .iter()
            .find(|c| c.try_borrow().is_ok_and(|c| c.name() == name))
    }

    pub fn combinator_by_id(&self, id: CombinatorId) -> Option<&Rc<RefCell<MechanicCombinator>>> {
        self.combinators
            .iter()
            .find(|c| c.try_borrow().is_ok_and(|c| c.id() == id))
    }

    /// Visual nodes of every mechanic on the page.
    pub fn nodes(&self) -> Vec<VisualNode> {
        self.mechanics
            .iter()
            .filter_map(|entry| entry.mechanic.try_borrow().ok().map(|m| m.nodes()))
            .flatten()
            .collect()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneConfig;

    fn build(json: &str) -> PageScene {
        let config = SceneConfig::from_json(json).expect("valid json");
        let bus = EventBus::shared();
        let mut factory = MechanicFactory::new(Rc::clone(&bus));
        let mut generator = EffectGenerator::new();
        let mut next = 1;
        let page = config.page(0).cloned().unwrap_or_default();
        PageScene::build(0, &page, &mut factory, &mut generator, &bus, &mut next)
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let scene = build(
            r#"{ "0": {
                "mechanics": [
                    { "id": "a", "type": "pull" },
                    { "id": "b", "type": "trebuchet" },
                    { "id": "c", "type": "pressure" }
                ],
                "effects": [
                    { "id": "x", "type": "fireworks" },
                    { "id": "y", "type": "glow", "triggerMechanicId": "a" }
                ]
            } }"#,
        );
        assert_eq!(scene.mechanics().len(), 2);
        assert!(scene.mechanic("a").is_some());
        assert!(scene.mechanic("b").is_none());
        assert_eq!(scene.effect_play_count("y"), Some(0));
        assert_eq!(scene.effect_play_count("x"), None);
    }

    #[test]
    fn combinator_ids_are_filtered() {
        let scene = build(
            r#"{ "0": {
                "mechanics": [{ "id": "a", "type": "pull" }],
                "combinators": [
                    { "id": "c", "type": "all", "mechanicIds": ["a", "ghost"] },
                    { "id": "bad", "type": "majority", "mechanicIds": ["a"] }
                ]
            } }"#,
        );
        assert_eq!(scene.combinators().len(), 1);
        let combinator = scene.combinator("c").expect("built");
        assert_eq!(combinator.borrow().mechanics().len(), 1);
    }

    #[test]
    fn missing_ids_are_generated() {
        let scene = build(
            r#"{ "0": {
                "mechanics": [{ "id": "a", "type": "pull" }],
                "combinators": [{ "mechanicIds": ["a"] }],
                "effects": [{ "type": "burst", "triggerMechanicId": "a" }]
            } }"#,
        );
        assert!(scene.combinator("combinator_0_0").is_some());
        assert_eq!(scene.effect_play_count("effect_0_0"), Some(0));
    }

    #[test]
    fn sequence_option_overrides_order() {
        let scene = build(
            r#"{ "0": {
                "mechanics": [{ "id": "a", "type": "pull" }, { "id": "b", "type": "pull" }],
                "combinators": [{
                    "id": "s", "type": "sequence", "mechanicIds": ["a", "b"],
                    "options": { "sequence": ["b", "a"] }
                }]
            } }"#,
        );
        let a = scene.mechanics()[0].id;
        let b = scene.mechanics()[1].id;
        let combinator = scene.combinator("s").expect("built");
        assert_eq!(combinator.borrow().mechanics(), &[b, a]);
    }

    #[test]
    fn effects_play_only_for_their_mechanic() {
        let mut scene = build(
            r#"{ "0": {
                "mechanics": [{ "id": "a", "type": "pull" }, { "id": "b", "type": "pull" }],
                "effects": [
                    { "id": "fa", "type": "glow", "triggerMechanicId": "a" },
                    { "id": "fb", "type": "glow", "triggerMechanicId": "b" }
                ]
            } }"#,
        );
        assert_eq!(scene.play_effects_for("a", Vec3::ZERO), 1);
        assert_eq!(scene.effect_play_count("fa"), Some(1));
        assert_eq!(scene.effect_play_count("fb"), Some(0));
        assert!(scene.is_effect_playing("fa"));

        scene.reset();
        assert!(!scene.is_effect_playing("fa"));
    }

    #[test]
    fn finished_transients_are_dropped() {
        let mut scene = PageScene::empty(3);
        let mut generator = EffectGenerator::new();
        let mut line = generator.connection(vec![Vec3::ZERO, Vec3::ONE]);
        line.play(Vec3::ZERO);
        scene.spawn_transient(line);
        assert_eq!(scene.transient_count(), 1);

        for _ in 0..100 {
            scene.update(0.05);
        }
        assert_eq!(scene.transient_count(), 0);
    }
}
