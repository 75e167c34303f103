//! Game end arbiter
//!
//! `Active -> AwaitingQuestionnaire -> Ended(Win)` or `Active -> Ended(Lose)`.
//! Reaching the target while a questionnaire is open defers the win until
//! the answer is in and a short real-time settle delay has passed. In
//! challenge mode a countdown running out first ends the game as a loss.
//! `Ended` is terminal.

use super::clock::FrameClock;
use super::rng::GameRng;
use super::state::GameEvent;
use super::tasks::{TaskQueue, Wait};
use crate::config::GameConfig;
use crate::consts::QUESTIONNAIRE_SETTLE_DELAY;
use crate::persistence::KeyValueStore;
use crate::platform::{AudioOut, ClipId, SceneLoader};
use crate::results::{GameResult, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndState {
    Active,
    /// Target reached while a questionnaire was open
    AwaitingQuestionnaire,
    Ended(Outcome),
}

#[derive(Debug, Clone, PartialEq)]
enum EndTask {
    /// Re-evaluate a deferred win after the settle delay
    Settle,
    LoadScene(String),
}

/// Challenge countdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChallengeTimer {
    pub limit: f32,
    pub remaining: f32,
}

/// Collaborators for arbiter decisions
pub struct EndCtx<'a> {
    pub clock: &'a FrameClock,
    pub audio: &'a mut dyn AudioOut,
    pub scenes: &'a mut dyn SceneLoader,
    pub store: &'a mut dyn KeyValueStore,
    pub rng: &'a mut GameRng,
    pub events: &'a mut Vec<GameEvent>,
}

#[derive(Debug)]
pub struct GameEndArbiter {
    state: EndState,
    target_score: u32,
    timer: Option<ChallengeTimer>,
    end_scene_delay: f32,
    win_scene: String,
    lose_scene: String,
    end_sounds: Vec<ClipId>,
    lose_sound: Option<ClipId>,
    lose_audio_delay: f32,
    tasks: TaskQueue<EndTask>,
}

impl GameEndArbiter {
    pub fn new(config: &GameConfig, challenge_mode: bool) -> Self {
        let (target_score, timer) = if challenge_mode {
            let limit = config.challenge.time_limit_seconds.max(0.0);
            (
                config.challenge.target_score,
                Some(ChallengeTimer {
                    limit,
                    remaining: limit,
                }),
            )
        } else {
            (config.target_score, None)
        };
        log::info!(
            "Game end arbiter ready: target {} ({})",
            target_score,
            if challenge_mode { "challenge" } else { "normal" }
        );

        Self {
            state: EndState::Active,
            target_score,
            timer,
            end_scene_delay: config.end_scene_delay.max(0.0),
            win_scene: config.win_scene_name.clone(),
            lose_scene: config.lose_scene_name.clone(),
            end_sounds: config.end_sounds.clone(),
            lose_sound: config.challenge.lose_sound.clone(),
            lose_audio_delay: config.challenge.lose_audio_delay.max(0.0),
            tasks: TaskQueue::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> EndState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, EndState::Ended(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            EndState::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn target_score(&self) -> u32 {
        self.target_score
    }

    pub fn is_challenge(&self) -> bool {
        self.timer.is_some()
    }

    pub fn timer(&self) -> Option<ChallengeTimer> {
        self.timer
    }

    /// Seconds left on the challenge clock
    pub fn remaining_time(&self) -> Option<f32> {
        self.timer.map(|t| t.remaining)
    }

    /// React to a new score
    pub fn on_score_changed(&mut self, score: u32, questionnaire_open: bool, ctx: &mut EndCtx<'_>) {
        match self.state {
            EndState::Active if score >= self.target_score => {
                if questionnaire_open {
                    log::info!("Target score reached, waiting for questionnaire to finish");
                    self.state = EndState::AwaitingQuestionnaire;
                    ctx.events.push(GameEvent::WinDeferred { score });
                } else {
                    self.end(Outcome::Win, score, ctx);
                }
            }
            EndState::AwaitingQuestionnaire => {
                log::debug!("Score {} while waiting for questionnaire", score);
            }
            _ => {}
        }
    }

    /// A questionnaire was answered
    pub fn on_questionnaire_completed(&mut self, clock: &FrameClock) {
        match self.state {
            EndState::AwaitingQuestionnaire => {
                self.tasks
                    .schedule(clock, Wait::Realtime(QUESTIONNAIRE_SETTLE_DELAY), None, EndTask::Settle);
            }
            EndState::Active => log::debug!("Questionnaire completed, game still active"),
            EndState::Ended(_) => {}
        }
    }

    /// Per-frame: deferred decisions, scene loads and the challenge clock
    pub fn update(&mut self, score: u32, questionnaire_open: bool, ctx: &mut EndCtx<'_>) {
        for resumed in self.tasks.drain_due(ctx.clock) {
            match resumed.task {
                EndTask::Settle => self.settle(score, questionnaire_open, ctx),
                EndTask::LoadScene(name) => {
                    ctx.scenes.load_scene(&name);
                    ctx.events.push(GameEvent::SceneRequested { name });
                }
            }
        }

        // A reached target outranks the clock while the win is deferred
        if self.state != EndState::Active {
            return;
        }
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        timer.remaining = (timer.remaining - ctx.clock.game_dt).max(0.0);
        if timer.remaining <= 0.0 {
            log::info!("Challenge time is up");
            self.end(Outcome::Lose, score, ctx);
        }
    }

    fn settle(&mut self, score: u32, questionnaire_open: bool, ctx: &mut EndCtx<'_>) {
        if self.state != EndState::AwaitingQuestionnaire {
            return;
        }
        if questionnaire_open {
            // Another panel opened during the settle delay; wait for it too
            log::debug!("Questionnaire open again, still deferring the win");
        } else if score >= self.target_score {
            self.end(Outcome::Win, score, ctx);
        } else {
            self.state = EndState::Active;
        }
    }

    fn end(&mut self, outcome: Outcome, score: u32, ctx: &mut EndCtx<'_>) {
        if self.is_ended() {
            return;
        }
        self.state = EndState::Ended(outcome);
        self.tasks.clear();
        log::info!("Game over: {} with score {}", outcome, score);

        GameResult {
            outcome,
            final_score: score,
        }
        .persist(ctx.store);
        ctx.events.push(GameEvent::GameEnded { outcome, score });

        match outcome {
            Outcome::Win => {
                if let Some(clip) = ctx.rng.pick(&self.end_sounds) {
                    ctx.audio.play(clip);
                }
                self.tasks.schedule(
                    ctx.clock,
                    Wait::Seconds(self.end_scene_delay),
                    None,
                    EndTask::LoadScene(self.win_scene.clone()),
                );
            }
            Outcome::Lose => match &self.lose_sound {
                Some(clip) => {
                    let length = ctx.audio.play(clip);
                    self.tasks.schedule(
                        ctx.clock,
                        Wait::Realtime(length + self.lose_audio_delay),
                        None,
                        EndTask::LoadScene(self.lose_scene.clone()),
                    );
                }
                None => {
                    ctx.scenes.load_scene(&self.lose_scene);
                    ctx.events.push(GameEvent::SceneRequested {
                        name: self.lose_scene.clone(),
                    });
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChallengeConfig;
    use crate::persistence::MemoryStore;
    use crate::platform::headless::{RecordingAudio, RecordingScenes};
    use crate::results::{FINAL_SCORE_KEY, RESULT_KEY};

    struct Rig {
        arbiter: GameEndArbiter,
        clock: FrameClock,
        audio: RecordingAudio,
        scenes: RecordingScenes,
        store: MemoryStore,
        rng: GameRng,
        events: Vec<GameEvent>,
    }

    impl Rig {
        fn new(config: &GameConfig, challenge: bool) -> Self {
            Self {
                arbiter: GameEndArbiter::new(config, challenge),
                clock: FrameClock::new(),
                audio: RecordingAudio::new(2.0),
                scenes: RecordingScenes::default(),
                store: MemoryStore::new(),
                rng: GameRng::new(1),
                events: Vec::new(),
            }
        }

        fn score(&mut self, score: u32, open: bool) {
            let mut ctx = EndCtx {
                clock: &self.clock,
                audio: &mut self.audio,
                scenes: &mut self.scenes,
                store: &mut self.store,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            self.arbiter.on_score_changed(score, open, &mut ctx);
        }

        fn step(&mut self, dt: f32, score: u32, open: bool) {
            self.clock.advance(dt);
            let mut ctx = EndCtx {
                clock: &self.clock,
                audio: &mut self.audio,
                scenes: &mut self.scenes,
                store: &mut self.store,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            self.arbiter.update(score, open, &mut ctx);
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            target_score: 2,
            end_sounds: vec![ClipId::new("fanfare")],
            challenge: ChallengeConfig {
                lose_sound: Some(ClipId::new("sad")),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_win_when_target_reached() {
        let mut rig = Rig::new(&config(), false);
        rig.score(1, false);
        assert_eq!(rig.arbiter.state(), EndState::Active);

        rig.score(2, false);
        assert_eq!(rig.arbiter.state(), EndState::Ended(Outcome::Win));
        assert_eq!(rig.audio.play_count("fanfare"), 1);
        assert_eq!(rig.store.get_string(RESULT_KEY, ""), "Win");
        assert_eq!(rig.store.get_int(FINAL_SCORE_KEY, 0), 2);

        rig.step(0.5, 2, false);
        assert!(rig.scenes.requested().is_empty());
        rig.step(0.6, 2, false);
        assert_eq!(rig.scenes.last(), Some("EndGame"));
    }

    #[test]
    fn test_win_deferred_until_questionnaire_settles() {
        let mut rig = Rig::new(&config(), false);
        rig.score(2, true);
        assert_eq!(rig.arbiter.state(), EndState::AwaitingQuestionnaire);
        assert!(rig.events.contains(&GameEvent::WinDeferred { score: 2 }));

        // Later points are absorbed while waiting
        rig.score(3, true);
        assert_eq!(rig.arbiter.state(), EndState::AwaitingQuestionnaire);

        rig.arbiter.on_questionnaire_completed(&rig.clock);
        rig.step(0.3, 3, false);
        assert_eq!(rig.arbiter.state(), EndState::AwaitingQuestionnaire);
        rig.step(0.3, 3, false);
        assert_eq!(rig.arbiter.state(), EndState::Ended(Outcome::Win));
        assert_eq!(rig.store.get_int(FINAL_SCORE_KEY, 0), 3);
    }

    #[test]
    fn test_completion_while_active_is_noop() {
        let mut rig = Rig::new(&config(), false);
        rig.arbiter.on_questionnaire_completed(&rig.clock);
        rig.step(1.0, 0, false);
        assert_eq!(rig.arbiter.state(), EndState::Active);
    }

    #[test]
    fn test_challenge_timeout_loses() {
        let mut rig = Rig::new(&config(), true);
        assert_eq!(rig.arbiter.target_score(), 7);
        assert_eq!(rig.arbiter.remaining_time(), Some(300.0));

        for _ in 0..299 {
            rig.step(1.0, 3, false);
        }
        assert_eq!(rig.arbiter.state(), EndState::Active);
        rig.step(1.0, 3, false);
        assert_eq!(rig.arbiter.state(), EndState::Ended(Outcome::Lose));
        assert_eq!(rig.arbiter.remaining_time(), Some(0.0));
        assert_eq!(rig.audio.play_count("sad"), 1);
        assert_eq!(rig.store.get_string(RESULT_KEY, ""), "Lose");

        // Lose cue (2s) plus the extra delay
        rig.step(2.0, 3, false);
        assert!(rig.scenes.requested().is_empty());
        rig.step(0.6, 3, false);
        assert_eq!(rig.scenes.requested(), &["LostScene".to_string()]);

        // Terminal
        rig.score(10, false);
        rig.step(5.0, 10, false);
        assert_eq!(rig.arbiter.state(), EndState::Ended(Outcome::Lose));
        assert_eq!(rig.audio.play_count("sad"), 1);
        assert_eq!(rig.scenes.requested().len(), 1);
    }

    #[test]
    fn test_timer_frozen_while_paused() {
        let mut rig = Rig::new(&config(), true);
        rig.clock.pause();
        rig.step(400.0, 0, true);
        assert_eq!(rig.arbiter.state(), EndState::Active);
        assert_eq!(rig.arbiter.remaining_time(), Some(300.0));
    }

    #[test]
    fn test_deferred_win_beats_challenge_timeout() {
        let mut cfg = config();
        cfg.challenge.target_score = 1;
        cfg.challenge.time_limit_seconds = 1.0;
        let mut rig = Rig::new(&cfg, true);

        rig.step(0.8, 0, false);
        rig.score(1, true);
        assert_eq!(rig.arbiter.state(), EndState::AwaitingQuestionnaire);

        rig.arbiter.on_questionnaire_completed(&rig.clock);
        rig.step(0.3, 2, false);
        assert_eq!(rig.arbiter.state(), EndState::AwaitingQuestionnaire);
        assert!((rig.arbiter.remaining_time().unwrap() - 0.2).abs() < 1e-4);
        rig.step(0.3, 2, false);
        assert_eq!(rig.arbiter.state(), EndState::Ended(Outcome::Win));
        assert_eq!(rig.store.get_string(RESULT_KEY, ""), "Win");
        assert_eq!(rig.audio.play_count("sad"), 0);
    }

    #[test]
    fn test_lose_without_cue_loads_immediately() {
        let mut cfg = config();
        cfg.challenge.lose_sound = None;
        cfg.challenge.time_limit_seconds = 1.0;
        let mut rig = Rig::new(&cfg, true);
        rig.step(1.5, 0, false);
        assert_eq!(rig.scenes.last(), Some("LostScene"));
    }
}
