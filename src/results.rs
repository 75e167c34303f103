//! Game result handoff
//!
//! The menu, game and end scenes only share a handful of persistent keys:
//! the challenge-mode flag written by the menu, and the outcome plus final
//! score written when a game ends.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;
use crate::platform::SceneLoader;

/// 1 when the menu started a timed challenge
pub const CHALLENGE_MODE_KEY: &str = "ChallengeModeEnabled";
/// "Win" or "Lose"
pub const RESULT_KEY: &str = "ChallengeResult";
pub const FINAL_SCORE_KEY: &str = "FinalScore";

/// Scene the main menu starts
pub const GAME_SCENE: &str = "game";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Lose => "Lose",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Win" => Some(Outcome::Win),
            "Lose" => Some(Outcome::Lose),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished game, as read by the end scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub outcome: Outcome,
    pub final_score: u32,
}

impl GameResult {
    pub fn persist(&self, store: &mut dyn KeyValueStore) {
        store.set_string(RESULT_KEY, self.outcome.as_str());
        store.set_int(FINAL_SCORE_KEY, i64::from(self.final_score));
        log::info!("Saved result {} with score {}", self.outcome, self.final_score);
    }

    /// Last persisted result, if any
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        let outcome = Outcome::parse(&store.get_string(RESULT_KEY, ""))?;
        let final_score = store.get_int(FINAL_SCORE_KEY, 0).clamp(0, i64::from(u32::MAX)) as u32;
        Some(Self {
            outcome,
            final_score,
        })
    }
}

pub fn challenge_mode_enabled(store: &dyn KeyValueStore) -> bool {
    store.get_int(CHALLENGE_MODE_KEY, 0) == 1
}

pub fn set_challenge_mode(store: &mut dyn KeyValueStore, enabled: bool) {
    store.set_int(CHALLENGE_MODE_KEY, i64::from(enabled));
}

/// Main menu "play": record the mode and load the game scene
pub fn start_game(scenes: &mut dyn SceneLoader, store: &mut dyn KeyValueStore, challenge: bool) {
    set_challenge_mode(store, challenge);
    log::info!("Starting game (challenge mode: {})", challenge);
    scenes.load_scene(GAME_SCENE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::platform::headless::RecordingScenes;

    #[test]
    fn test_result_roundtrip_through_store() {
        let mut store = MemoryStore::new();
        assert_eq!(GameResult::load(&store), None);

        GameResult {
            outcome: Outcome::Lose,
            final_score: 4,
        }
        .persist(&mut store);
        assert_eq!(store.get_string(RESULT_KEY, ""), "Lose");
        assert_eq!(store.get_int(FINAL_SCORE_KEY, -1), 4);
        assert_eq!(
            GameResult::load(&store),
            Some(GameResult {
                outcome: Outcome::Lose,
                final_score: 4
            })
        );
    }

    #[test]
    fn test_start_game_writes_flag_and_loads_scene() {
        let mut store = MemoryStore::new();
        let mut scenes = RecordingScenes::default();
        assert!(!challenge_mode_enabled(&store));

        start_game(&mut scenes, &mut store, true);
        assert!(challenge_mode_enabled(&store));
        assert_eq!(scenes.last(), Some(GAME_SCENE));

        start_game(&mut scenes, &mut store, false);
        assert!(!challenge_mode_enabled(&store));
    }

    #[test]
    fn test_unknown_result_text_is_ignored() {
        let mut store = MemoryStore::new();
        store.set_string(RESULT_KEY, "Draw");
        assert_eq!(GameResult::load(&store), None);
    }
}
