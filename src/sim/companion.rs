//! Companion voice lines and hints
//!
//! The companion greets the player, cheers after an answered questionnaire,
//! offers help on request and chatters when left idle. Hints are a separate
//! button (or a spoken keyword) that plays a random hint clip regardless of
//! the companion.

use super::clock::FrameClock;
use super::rng::GameRng;
use super::state::GameEvent;
use crate::config::CompanionConfig;
use crate::platform::{AudioOut, ClipId};

/// Animation trigger sent with a voice line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Wave,
    Cheer,
    Talk,
}

impl Gesture {
    pub fn trigger(self) -> &'static str {
        match self {
            Gesture::Wave => "Wave",
            Gesture::Cheer => "Cheer",
            Gesture::Talk => "Talk",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Companion {
    config: CompanionConfig,
    /// Game seconds since the last line
    idle_timer: f32,
    /// Game time the current line finishes
    talking_until: Option<f64>,
}

impl Companion {
    pub fn new(config: &CompanionConfig) -> Self {
        Self {
            config: config.clone(),
            idle_timer: 0.0,
            talking_until: None,
        }
    }

    pub fn is_talking(&self) -> bool {
        self.talking_until.is_some()
    }

    pub fn update(&mut self, clock: &FrameClock, audio: &mut dyn AudioOut, rng: &mut GameRng, events: &mut Vec<GameEvent>) {
        if self.talking_until.is_some_and(|end| clock.game_time >= end) {
            self.talking_until = None;
        }

        self.idle_timer += clock.game_dt;
        if self.idle_timer >= self.config.idle_talk_interval && !self.is_talking() {
            if let Some(clip) = rng.pick(&self.config.idle_comments).cloned() {
                self.speak(&clip, Gesture::Talk, clock, audio, events);
            }
        }
    }

    pub fn greet(&mut self, clock: &FrameClock, audio: &mut dyn AudioOut, events: &mut Vec<GameEvent>) {
        if let Some(clip) = self.config.greeting.clone() {
            self.speak(&clip, Gesture::Wave, clock, audio, events);
        }
    }

    pub fn cheer(&mut self, clock: &FrameClock, audio: &mut dyn AudioOut, events: &mut Vec<GameEvent>) {
        if let Some(clip) = self.config.cheer.clone() {
            self.speak(&clip, Gesture::Cheer, clock, audio, events);
        }
    }

    pub fn help(&mut self, clock: &FrameClock, audio: &mut dyn AudioOut, events: &mut Vec<GameEvent>) {
        if let Some(clip) = self.config.help.clone() {
            self.speak(&clip, Gesture::Talk, clock, audio, events);
        }
    }

    /// Whether recognized speech asks for a hint. Case-insensitive substring
    /// match against the configured keywords.
    pub fn wants_hint(&self, recognized: &str) -> bool {
        let text = recognized.to_lowercase();
        self.config
            .hint_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && text.contains(&k))
    }

    /// Hint button
    pub fn hint(&self, audio: &mut dyn AudioOut, rng: &mut GameRng, events: &mut Vec<GameEvent>) -> Option<ClipId> {
        let clip = rng.pick(&self.config.hints)?.clone();
        audio.play(&clip);
        events.push(GameEvent::HintPlayed { clip: clip.clone() });
        Some(clip)
    }

    fn speak(
        &mut self,
        clip: &ClipId,
        gesture: Gesture,
        clock: &FrameClock,
        audio: &mut dyn AudioOut,
        events: &mut Vec<GameEvent>,
    ) {
        let length = audio.play(clip);
        self.talking_until = Some(clock.game_time + length.max(0.0) as f64);
        self.idle_timer = 0.0;
        log::debug!("Companion says {} ({})", clip, gesture.trigger());
        events.push(GameEvent::CompanionSpoke {
            clip: clip.clone(),
            gesture,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::RecordingAudio;

    fn config() -> CompanionConfig {
        CompanionConfig {
            idle_talk_interval: 10.0,
            idle_comments: vec![ClipId::new("idle_a"), ClipId::new("idle_b")],
            greeting: Some(ClipId::new("hello")),
            cheer: Some(ClipId::new("yay")),
            help: None,
            hints: vec![ClipId::new("hint_1")],
            ..Default::default()
        }
    }

    #[test]
    fn test_idle_chatter_after_interval() {
        let mut companion = Companion::new(&config());
        let mut clock = FrameClock::new();
        let mut audio = RecordingAudio::new(3.0);
        let mut rng = GameRng::new(4);
        let mut events = Vec::new();

        for _ in 0..9 {
            clock.advance(1.0);
            companion.update(&clock, &mut audio, &mut rng, &mut events);
        }
        assert!(events.is_empty());

        clock.advance(1.0);
        companion.update(&clock, &mut audio, &mut rng, &mut events);
        assert_eq!(events.len(), 1);
        assert!(companion.is_talking());

        clock.advance(3.0);
        companion.update(&clock, &mut audio, &mut rng, &mut events);
        assert!(!companion.is_talking());
    }

    #[test]
    fn test_no_idle_while_paused() {
        let mut companion = Companion::new(&config());
        let mut clock = FrameClock::new();
        clock.pause();
        let mut audio = RecordingAudio::default();
        let mut rng = GameRng::new(4);
        let mut events = Vec::new();
        clock.advance(60.0);
        companion.update(&clock, &mut audio, &mut rng, &mut events);
        assert!(audio.played().is_empty());
    }

    #[test]
    fn test_cues_and_missing_clips() {
        let mut companion = Companion::new(&config());
        let clock = FrameClock::new();
        let mut audio = RecordingAudio::default();
        let mut rng = GameRng::new(4);
        let mut events = Vec::new();

        companion.greet(&clock, &mut audio, &mut events);
        companion.cheer(&clock, &mut audio, &mut events);
        companion.help(&clock, &mut audio, &mut events);
        assert_eq!(audio.play_count("hello"), 1);
        assert_eq!(audio.play_count("yay"), 1);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            GameEvent::CompanionSpoke {
                clip: ClipId::new("yay"),
                gesture: Gesture::Cheer
            }
        );

        assert_eq!(companion.hint(&mut audio, &mut rng, &mut events), Some(ClipId::new("hint_1")));
    }

    #[test]
    fn test_hint_keywords_match_inside_speech() {
        let companion = Companion::new(&config());
        assert!(companion.wants_hint("Can I get a HINT please"));
        assert!(companion.wants_hint("helpme"));
        assert!(!companion.wants_hint("where is the treasure"));
        assert!(!companion.wants_hint(""));

        let mut quiet = config();
        quiet.hint_keywords = vec!["  ".to_string()];
        assert!(!Companion::new(&quiet).wants_hint("anything at all"));
    }
}
