//! Game session state
//!
//! `GameState` owns every component and wires them together: taps flow from
//! the dispatcher into the questionnaire flow or the score ledger, score
//! changes reach the end arbiter, and collectible hits go to the spawner.
//! Everything observable is reported as a `GameEvent`.

use glam::Vec2;

use super::arbiter::{EndCtx, EndState, GameEndArbiter};
use super::clock::FrameClock;
use super::companion::{Companion, Gesture};
use super::dispatch::{TapCtx, TapDispatcher, TapOutcome};
use super::questionnaire::{AnswerRecord, QuestionnaireFlow, SubmitError};
use super::rng::GameRng;
use super::score::ScoreLedger;
use super::spawner::{CollectOutcome, EasterEggSpawner};
use super::world::{EntityId, World};
use crate::config::GameConfig;
use crate::persistence::KeyValueStore;
use crate::platform::{ClipId, Services, Viewpoint};
use crate::results::{self, Outcome};

/// Something that happened this frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScoreChanged { score: u32 },
    EntityTapped { entity: EntityId },
    EntityDestroyed { entity: EntityId },
    QuestionnaireOpened { entity: EntityId },
    /// Empty answer; the panel stays open
    AnswerRejected { entity: EntityId },
    QuestionnaireCompleted { entity: EntityId, answer: String },
    EggSpawned { entity: EntityId, kind: String, fallback: bool },
    EggCollected { entity: EntityId, kind: String },
    EggExpired { entity: EntityId, kind: String },
    /// Target reached with a questionnaire open
    WinDeferred { score: u32 },
    GameEnded { outcome: Outcome, score: u32 },
    SceneRequested { name: String },
    CompanionSpoke { clip: ClipId, gesture: Gesture },
    HintPlayed { clip: ClipId },
}

/// One play session
#[derive(Debug)]
pub struct GameState {
    pub config: GameConfig,
    pub challenge_mode: bool,
    pub clock: FrameClock,
    pub rng: GameRng,
    pub world: World,
    /// Latest camera pose supplied by the host
    pub viewpoint: Viewpoint,
    pub score: ScoreLedger,
    pub flow: QuestionnaireFlow,
    pub dispatcher: TapDispatcher,
    pub spawner: EasterEggSpawner,
    pub arbiter: GameEndArbiter,
    pub companion: Companion,
    pub(crate) greeted: bool,
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    /// New session; challenge mode comes from the flag the menu persisted
    pub fn new(config: GameConfig, store: &dyn KeyValueStore) -> Self {
        let challenge_mode = results::challenge_mode_enabled(store);
        Self::with_mode(config, challenge_mode)
    }

    pub fn with_mode(config: GameConfig, challenge_mode: bool) -> Self {
        for issue in config.validate() {
            log::error!("Config: {}", issue);
        }

        let mut state = Self {
            challenge_mode,
            clock: FrameClock::new(),
            rng: GameRng::new(config.seed),
            world: World::new(),
            viewpoint: Viewpoint::default(),
            score: ScoreLedger::new(),
            flow: QuestionnaireFlow::new(),
            dispatcher: TapDispatcher::new(),
            spawner: EasterEggSpawner::new(&config),
            arbiter: GameEndArbiter::new(&config, challenge_mode),
            companion: Companion::new(&config.companion),
            greeted: false,
            events: Vec::new(),
            config,
        };
        state.populate();
        state
    }

    /// Place scenery and register interactive entities
    fn populate(&mut self) {
        for placement in &self.config.scenery {
            match self.config.prefab(&placement.prefab) {
                Some(prefab) => {
                    self.world.instantiate(prefab, placement.position, placement.yaw);
                }
                None => log::error!("Skipping scenery with unknown prefab '{}'", placement.prefab),
            }
        }

        for spec in &self.config.interactives {
            let Some(prefab) = self.config.prefab(&spec.prefab) else {
                log::error!("Skipping interactive with unknown prefab '{}'", spec.prefab);
                continue;
            };
            if !prefab.has_collider() {
                log::error!("Interactive '{}' has no collider and cannot be tapped", prefab.name);
            }

            let questionnaire = spec
                .questionnaire
                .clone()
                .filter(|q| !q.question_text.trim().is_empty());
            if spec.questionnaire.is_some() && questionnaire.is_none() {
                log::error!("Dropping questionnaire without question text on '{}'", prefab.name);
            }

            let entity = self.world.instantiate(prefab, spec.position, spec.yaw);
            self.dispatcher
                .register(entity, prefab.name.clone(), spec.sound.clone(), questionnaire);
        }

        log::info!(
            "Session ready: {} entities, {} interactive, {} easter egg kinds, target {}",
            self.world.len(),
            self.dispatcher.len(),
            self.spawner.kinds().len(),
            self.arbiter.target_score()
        );
    }

    /// Start over with the same config and mode. Score observers are kept.
    pub fn reset(&mut self) {
        log::info!("Resetting game session");
        self.clock = FrameClock::new();
        self.rng = GameRng::new(self.config.seed);
        self.world = World::new();
        self.flow = QuestionnaireFlow::new();
        self.dispatcher.clear();
        self.spawner = EasterEggSpawner::new(&self.config);
        self.arbiter = GameEndArbiter::new(&self.config, self.challenge_mode);
        self.companion = Companion::new(&self.config.companion);
        self.greeted = false;
        self.events.clear();
        self.score.reset();
        self.populate();
    }

    #[inline]
    pub fn current_score(&self) -> u32 {
        self.score.score()
    }

    pub fn end_state(&self) -> EndState {
        self.arbiter.state()
    }

    pub fn is_ended(&self) -> bool {
        self.arbiter.is_ended()
    }

    /// Events since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add points and let the arbiter react. Refused once the game has ended.
    pub fn increment_score(&mut self, points: u32, services: &mut Services<'_>) -> u32 {
        if self.arbiter.is_ended() {
            log::debug!("Game over, ignoring {} points", points);
            return self.score.score();
        }

        let score = self.score.add(points);
        log::info!("Score: {}", score);
        self.events.push(GameEvent::ScoreChanged { score });

        let questionnaire_open = self.flow.is_open();
        let mut ctx = EndCtx {
            clock: &self.clock,
            audio: &mut *services.audio,
            scenes: &mut *services.scenes,
            store: &mut *services.store,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        self.arbiter.on_score_changed(score, questionnaire_open, &mut ctx);
        score
    }

    /// Handle one screen tap
    pub fn tap(&mut self, screen_point: Vec2, services: &mut Services<'_>) -> TapOutcome {
        let mut ctx = TapCtx {
            clock: &self.clock,
            world: &self.world,
            raycaster: services.raycaster,
            viewpoint: &self.viewpoint,
            audio: &mut *services.audio,
            flow: &mut self.flow,
            events: &mut self.events,
            game_over: self.arbiter.is_ended(),
        };
        let outcome = self.dispatcher.on_tap(screen_point, &mut ctx);

        match outcome {
            TapOutcome::Scored { .. } => {
                self.increment_score(1, services);
            }
            TapOutcome::QuestionnaireOpened { .. } => self.clock.pause(),
            TapOutcome::Collectible { entity } => {
                let collected = self.spawner.collect(
                    entity,
                    &self.clock,
                    &self.world,
                    &mut *services.audio,
                    &mut self.events,
                );
                if let CollectOutcome::Collected { reward } = collected {
                    if reward > 0 {
                        self.increment_score(reward, services);
                    }
                }
            }
            TapOutcome::Ignored(_) | TapOutcome::Missed => {}
        }

        outcome
    }

    /// Submit the open questionnaire's answer
    pub fn submit_answer(&mut self, raw_answer: &str, services: &mut Services<'_>) -> Result<AnswerRecord, SubmitError> {
        let open_entity = self.flow.open_entity();
        let record = match self.flow.submit(raw_answer) {
            Ok(record) => record,
            Err(err) => {
                if let (SubmitError::EmptyAnswer, Some(entity)) = (&err, open_entity) {
                    self.events.push(GameEvent::AnswerRejected { entity });
                }
                return Err(err);
            }
        };

        self.clock.resume();
        self.events.push(GameEvent::QuestionnaireCompleted {
            entity: record.entity,
            answer: record.answer.clone(),
        });
        // The arbiter hears about completion before the point lands
        self.arbiter.on_questionnaire_completed(&self.clock);
        self.companion
            .cheer(&self.clock, &mut *services.audio, &mut self.events);
        self.increment_score(1, services);
        self.dispatcher.complete(record.entity, &self.clock);

        Ok(record)
    }

    /// Hint button
    pub fn request_hint(&mut self, services: &mut Services<'_>) -> Option<ClipId> {
        self.companion
            .hint(&mut *services.audio, &mut self.rng, &mut self.events)
    }

    /// Speech recognizer produced final text; a hint keyword plays a hint
    pub fn hear(&mut self, recognized: &str, services: &mut Services<'_>) -> Option<ClipId> {
        if !self.companion.wants_hint(recognized) {
            log::debug!("Heard '{}', no hint keyword", recognized);
            return None;
        }
        log::info!("Hint requested by voice");
        self.request_hint(services)
    }

    /// Host noticed the player wandering without progress
    pub fn player_looks_lost(&mut self, services: &mut Services<'_>) {
        self.companion
            .help(&self.clock, &mut *services.audio, &mut self.events);
    }
}
