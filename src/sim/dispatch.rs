//! Tap dispatcher
//!
//! Turns a screen tap into an effect on the entity under it. Plain
//! interactive entities score right away and are destroyed once their sound
//! finishes. Entities carrying a questionnaire open it and hold the
//! interaction lock until the answer is submitted. Hits on a spawned
//! collectible are handed back to the session for the spawner.

use std::collections::BTreeMap;

use glam::Vec2;

use super::clock::FrameClock;
use super::questionnaire::{Questionnaire, QuestionnaireFlow};
use super::state::GameEvent;
use super::tasks::{TaskQueue, Wait};
use super::world::{EntityId, LayerMask, World};
use crate::consts::TAP_RAY_DISTANCE;
use crate::platform::{AudioOut, ClipId, Raycaster, Viewpoint};

/// Lifecycle of an interactive entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    /// Questionnaire open, waiting for submit
    AwaitingAnswer,
    /// Scored; destroy pending
    Consumed,
}

/// An author-placed tappable object
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveEntity {
    pub entity: EntityId,
    pub name: String,
    pub sound: Option<ClipId>,
    pub questionnaire: Option<Questionnaire>,
    pub state: InteractionState,
    /// Length reported when the sound was played at tap time
    sound_length: f32,
}

/// What a raycast hit resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapTarget {
    Interactive(EntityId),
    /// Root of a spawned collectible
    Collectible(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    QuestionnaireOpen,
    EntityBusy,
    GameOver,
}

/// Result of one tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Ignored(IgnoreReason),
    /// Nothing tappable under the finger
    Missed,
    /// Plain interactive entity consumed; the caller adds the point
    Scored { entity: EntityId },
    /// Questionnaire opened; the caller freezes game time
    QuestionnaireOpened { entity: EntityId },
    /// Collectible hit; the caller forwards it to the spawner
    Collectible { entity: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DispatchTask {
    DestroyAfterSound,
}

/// Per-tap collaborators
pub struct TapCtx<'a> {
    pub clock: &'a FrameClock,
    pub world: &'a World,
    pub raycaster: &'a dyn Raycaster,
    pub viewpoint: &'a Viewpoint,
    pub audio: &'a mut dyn AudioOut,
    pub flow: &'a mut QuestionnaireFlow,
    pub events: &'a mut Vec<GameEvent>,
    pub game_over: bool,
}

#[derive(Debug, Default)]
pub struct TapDispatcher {
    entities: BTreeMap<EntityId, InteractiveEntity>,
    /// Entity whose questionnaire is open
    active: Option<EntityId>,
    tasks: TaskQueue<DispatchTask>,
}

impl TapDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        entity: EntityId,
        name: impl Into<String>,
        sound: Option<ClipId>,
        questionnaire: Option<Questionnaire>,
    ) {
        let name = name.into();
        log::debug!("Registered interactive '{}' {}", name, entity);
        self.entities.insert(
            entity,
            InteractiveEntity {
                entity,
                name,
                sound,
                questionnaire,
                state: InteractionState::Idle,
                sound_length: 0.0,
            },
        );
    }

    pub fn get(&self, entity: EntityId) -> Option<&InteractiveEntity> {
        self.entities.get(&entity)
    }

    pub fn state(&self, entity: EntityId) -> Option<InteractionState> {
        self.entities.get(&entity).map(|e| e.state)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractiveEntity> {
        self.entities.values()
    }

    /// Entity holding the interaction lock
    pub fn active_entity(&self) -> Option<EntityId> {
        self.active
    }

    /// Map a hit to something tappable: the nearest entity in the hit's
    /// ancestry that is either registered interactive or carries a
    /// collectible marker. Part colliders count for their root.
    pub fn resolve(&self, world: &World, hit: EntityId) -> Option<TapTarget> {
        world.ancestry(hit).into_iter().find_map(|id| {
            if self.entities.contains_key(&id) {
                Some(TapTarget::Interactive(id))
            } else if world.get(id).is_some_and(|o| o.collectible.is_some()) {
                Some(TapTarget::Collectible(id))
            } else {
                None
            }
        })
    }

    pub fn on_tap(&mut self, screen_point: Vec2, ctx: &mut TapCtx<'_>) -> TapOutcome {
        if ctx.game_over {
            return TapOutcome::Ignored(IgnoreReason::GameOver);
        }
        if ctx.flow.is_open() {
            log::debug!("Tap ignored: questionnaire is open");
            return TapOutcome::Ignored(IgnoreReason::QuestionnaireOpen);
        }
        if let Some(active) = self.active {
            log::debug!("Tap ignored: {} is still active", active);
            return TapOutcome::Ignored(IgnoreReason::EntityBusy);
        }

        let Some(hit) = ctx
            .raycaster
            .raycast(ctx.world, ctx.viewpoint, screen_point, TAP_RAY_DISTANCE, LayerMask::ALL)
        else {
            return TapOutcome::Missed;
        };

        match self.resolve(ctx.world, hit.entity) {
            Some(TapTarget::Interactive(entity)) => self.interact(entity, ctx),
            Some(TapTarget::Collectible(entity)) => TapOutcome::Collectible { entity },
            None => {
                log::debug!("Tap hit {} which is not interactive", hit.entity);
                TapOutcome::Missed
            }
        }
    }

    fn interact(&mut self, entity: EntityId, ctx: &mut TapCtx<'_>) -> TapOutcome {
        let Some(target) = self.entities.get_mut(&entity) else {
            return TapOutcome::Missed;
        };
        if target.state != InteractionState::Idle {
            log::debug!("Tap on '{}' ignored, state {:?}", target.name, target.state);
            return TapOutcome::Missed;
        }

        ctx.events.push(GameEvent::EntityTapped { entity });
        target.sound_length = match &target.sound {
            Some(clip) => ctx.audio.play(clip),
            None => 0.0,
        };

        if let Some(questionnaire) = target.questionnaire.clone() {
            if let Err(err) = ctx.flow.open(entity, questionnaire) {
                log::warn!("Could not open questionnaire for '{}': {}", target.name, err);
                return TapOutcome::Ignored(IgnoreReason::QuestionnaireOpen);
            }
            target.state = InteractionState::AwaitingAnswer;
            self.active = Some(entity);
            log::info!("Opened questionnaire for '{}'", target.name);
            ctx.events.push(GameEvent::QuestionnaireOpened { entity });
            return TapOutcome::QuestionnaireOpened { entity };
        }

        target.state = InteractionState::Consumed;
        let wait = destroy_wait(target.sound_length);
        log::info!("Consumed '{}'", target.name);
        self.tasks.schedule(ctx.clock, wait, Some(entity), DispatchTask::DestroyAfterSound);
        TapOutcome::Scored { entity }
    }

    /// Finish the entity whose questionnaire was answered: release the lock
    /// and destroy it once its sound has played out.
    pub fn complete(&mut self, entity: EntityId, clock: &FrameClock) {
        if let Some(target) = self.entities.get_mut(&entity) {
            target.state = InteractionState::Consumed;
            let wait = destroy_wait(target.sound_length);
            self.tasks.schedule(clock, wait, Some(entity), DispatchTask::DestroyAfterSound);
        } else {
            log::warn!("Completed questionnaire for unknown entity {}", entity);
        }
        if self.active == Some(entity) {
            self.active = None;
        }
    }

    /// Run due destroys
    pub fn update(&mut self, clock: &FrameClock, world: &mut World, events: &mut Vec<GameEvent>) {
        for resumed in self.tasks.drain_due(clock) {
            let Some(entity) = resumed.owner else { continue };
            match resumed.task {
                DispatchTask::DestroyAfterSound => {
                    self.entities.remove(&entity);
                    if world.destroy(entity) {
                        log::debug!("Destroyed interactive {}", entity);
                        events.push(GameEvent::EntityDestroyed { entity });
                    }
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.tasks.clear();
        self.active = None;
    }
}

/// Real-time wait for a sound, or the next frame when silent
fn destroy_wait(sound_length: f32) -> Wait {
    if sound_length > 0.0 {
        Wait::Realtime(sound_length)
    } else {
        Wait::Frames(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{BoxRaycaster, RecordingAudio};
    use crate::sim::bounds::Aabb;
    use crate::sim::world::{CollectibleMarker, Collider};
    use glam::Vec3;

    struct Scene {
        world: World,
        clock: FrameClock,
        viewpoint: Viewpoint,
        dispatcher: TapDispatcher,
        flow: QuestionnaireFlow,
        audio: RecordingAudio,
        events: Vec<GameEvent>,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                world: World::new(),
                clock: FrameClock::new(),
                viewpoint: Viewpoint::default(),
                dispatcher: TapDispatcher::new(),
                flow: QuestionnaireFlow::new(),
                audio: RecordingAudio::new(1.0).with_length("silence", 0.0),
                events: Vec::new(),
            }
        }

        fn place(&mut self, name: &str, offset: Vec3) -> EntityId {
            let id = self.world.spawn(name);
            let obj = self.world.get_mut(id).unwrap();
            obj.transform.position = self.viewpoint.position + offset;
            obj.collider = Some(Collider {
                bounds: Aabb::unit(),
                enabled: true,
            });
            id
        }

        fn tap_on(&mut self, entity: EntityId) -> TapOutcome {
            let pos = self.world.world_transform(entity).unwrap().position;
            let screen = self.viewpoint.world_to_screen(pos).unwrap();
            self.tap(screen)
        }

        fn tap(&mut self, screen: Vec2) -> TapOutcome {
            let mut ctx = TapCtx {
                clock: &self.clock,
                world: &self.world,
                raycaster: &BoxRaycaster,
                viewpoint: &self.viewpoint,
                audio: &mut self.audio,
                flow: &mut self.flow,
                events: &mut self.events,
                game_over: false,
            };
            self.dispatcher.on_tap(screen, &mut ctx)
        }

        fn step(&mut self, dt: f32) {
            self.clock.advance(dt);
            self.dispatcher.update(&self.clock, &mut self.world, &mut self.events);
        }
    }

    fn question() -> Questionnaire {
        Questionnaire {
            question_text: "What color is the door?".to_string(),
            submission_key: "entry.1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_entity_scores_and_is_destroyed_after_sound() {
        let mut s = Scene::new();
        let chest = s.place("chest", Vec3::new(0.0, 0.0, -3.0));
        s.dispatcher.register(chest, "chest", Some(ClipId::new("open")), None);

        assert_eq!(s.tap_on(chest), TapOutcome::Scored { entity: chest });
        assert_eq!(s.audio.play_count("open"), 1);
        assert_eq!(s.dispatcher.state(chest), Some(InteractionState::Consumed));

        // Consumed entities no longer respond
        assert_eq!(s.tap_on(chest), TapOutcome::Missed);

        s.step(0.5);
        assert!(s.world.contains(chest));
        s.step(0.6);
        assert!(!s.world.contains(chest));
        assert!(s.events.contains(&GameEvent::EntityDestroyed { entity: chest }));
    }

    #[test]
    fn test_silent_entity_is_destroyed_next_frame() {
        let mut s = Scene::new();
        let rock = s.place("rock", Vec3::new(0.0, 0.0, -3.0));
        s.dispatcher.register(rock, "rock", None, None);

        assert_eq!(s.tap_on(rock), TapOutcome::Scored { entity: rock });
        assert!(s.world.contains(rock));
        s.step(0.016);
        assert!(!s.world.contains(rock));
    }

    #[test]
    fn test_questionnaire_entity_locks_until_complete() {
        let mut s = Scene::new();
        let totem = s.place("totem", Vec3::new(0.0, 0.0, -3.0));
        let chest = s.place("chest", Vec3::new(1.0, 0.0, -6.0));
        s.dispatcher.register(totem, "totem", Some(ClipId::new("hum")), Some(question()));
        s.dispatcher.register(chest, "chest", None, None);

        assert_eq!(s.tap_on(totem), TapOutcome::QuestionnaireOpened { entity: totem });
        assert!(s.flow.is_open());
        assert_eq!(s.dispatcher.active_entity(), Some(totem));
        assert_eq!(s.dispatcher.state(totem), Some(InteractionState::AwaitingAnswer));

        assert_eq!(s.tap_on(chest), TapOutcome::Ignored(IgnoreReason::QuestionnaireOpen));

        s.flow.submit("blue").unwrap();
        s.dispatcher.complete(totem, &s.clock);
        assert_eq!(s.dispatcher.active_entity(), None);

        s.step(1.1);
        assert!(!s.world.contains(totem));
        assert_eq!(s.audio.play_count("hum"), 1);
    }

    #[test]
    fn test_busy_lock_ignores_taps_without_open_flow() {
        let mut s = Scene::new();
        let totem = s.place("totem", Vec3::new(0.0, 0.0, -3.0));
        s.dispatcher.register(totem, "totem", None, Some(question()));
        s.tap_on(totem);

        // Panel dismissed without completing the entity
        s.flow = QuestionnaireFlow::new();
        assert_eq!(s.tap_on(totem), TapOutcome::Ignored(IgnoreReason::EntityBusy));
    }

    #[test]
    fn test_collectible_resolved_through_parent() {
        let mut s = Scene::new();
        let egg = s.world.spawn("egg");
        s.world.get_mut(egg).unwrap().transform.position = s.viewpoint.position + Vec3::new(0.0, 0.0, -2.0);
        s.world.get_mut(egg).unwrap().collectible = Some(CollectibleMarker { sound: None });
        let shell = s.world.spawn("egg/shell");
        let obj = s.world.get_mut(shell).unwrap();
        obj.parent = Some(egg);
        obj.collider = Some(Collider {
            bounds: Aabb::unit(),
            enabled: true,
        });

        assert_eq!(s.dispatcher.resolve(&s.world, shell), Some(TapTarget::Collectible(egg)));
        assert_eq!(s.tap_on(egg), TapOutcome::Collectible { entity: egg });
    }

    #[test]
    fn test_miss_and_unknown_hit() {
        let mut s = Scene::new();
        assert_eq!(s.tap(s.viewpoint.screen_size * 0.5), TapOutcome::Missed);

        let wall = s.place("wall", Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(s.tap_on(wall), TapOutcome::Missed);
        assert!(s.audio.played().is_empty());
    }

    #[test]
    fn test_game_over_ignores_taps() {
        let mut s = Scene::new();
        let chest = s.place("chest", Vec3::new(0.0, 0.0, -3.0));
        s.dispatcher.register(chest, "chest", None, None);
        let screen = s.viewpoint.world_to_screen(s.viewpoint.position + Vec3::new(0.0, 0.0, -3.0)).unwrap();
        let mut ctx = TapCtx {
            clock: &s.clock,
            world: &s.world,
            raycaster: &BoxRaycaster,
            viewpoint: &s.viewpoint,
            audio: &mut s.audio,
            flow: &mut s.flow,
            events: &mut s.events,
            game_over: true,
        };
        assert_eq!(
            s.dispatcher.on_tap(screen, &mut ctx),
            TapOutcome::Ignored(IgnoreReason::GameOver)
        );
    }

    #[test]
    fn test_interactive_tapped_through_part_collider() {
        let mut s = Scene::new();
        let chest = s.world.spawn("chest");
        s.world.get_mut(chest).unwrap().transform.position = s.viewpoint.position + Vec3::new(0.0, 0.0, -3.0);
        let lid = s.world.spawn("chest/lid");
        let obj = s.world.get_mut(lid).unwrap();
        obj.parent = Some(chest);
        obj.collider = Some(Collider {
            bounds: Aabb::unit(),
            enabled: true,
        });
        s.dispatcher.register(chest, "chest", None, None);

        assert_eq!(s.dispatcher.resolve(&s.world, lid), Some(TapTarget::Interactive(chest)));
        assert_eq!(s.tap_on(chest), TapOutcome::Scored { entity: chest });
        assert!(s.events.contains(&GameEvent::EntityTapped { entity: chest }));

        s.step(0.016);
        assert!(!s.world.contains(lid));
        assert!(!s.world.contains(chest));
    }
}
