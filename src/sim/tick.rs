//! Per-frame update
//!
//! The host calls `tick` once per rendered frame with the frame's real delta,
//! the current camera pose and whatever the player did this frame.

use glam::Vec2;

use super::arbiter::EndCtx;
use super::spawner::SpawnCtx;
use super::state::GameState;
use crate::platform::{Services, Viewpoint};

/// Player input gathered for one frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Camera pose this frame
    pub viewpoint: Viewpoint,
    /// Screen-space taps, in the order they happened
    pub taps: Vec<Vec2>,
    /// Answer submitted from the questionnaire panel
    pub answer: Option<String>,
    /// Hint button pressed
    pub request_hint: bool,
    /// Final text from the speech recognizer
    pub speech: Option<String>,
    /// Host thinks the player is stuck
    pub player_lost: bool,
}

/// Advance the session by one frame
pub fn tick(state: &mut GameState, input: &TickInput, services: &mut Services<'_>, real_dt: f32) {
    state.clock.advance(real_dt);
    state.viewpoint = input.viewpoint;

    if !state.greeted {
        state.greeted = true;
        state
            .companion
            .greet(&state.clock, &mut *services.audio, &mut state.events);
    }

    if let Some(answer) = &input.answer {
        if let Err(err) = state.submit_answer(answer, services) {
            log::warn!("Answer not accepted: {}", err);
        }
    }

    for &point in &input.taps {
        state.tap(point, services);
    }

    if input.request_hint {
        state.request_hint(services);
    }
    if let Some(text) = &input.speech {
        state.hear(text, services);
    }
    if input.player_lost {
        state.player_looks_lost(services);
    }

    state
        .dispatcher
        .update(&state.clock, &mut state.world, &mut state.events);

    state.spawner.set_enabled(!state.arbiter.is_ended());
    let mut spawn_ctx = SpawnCtx {
        clock: &state.clock,
        world: &mut state.world,
        rng: &mut state.rng,
        raycaster: services.raycaster,
        viewpoint: &state.viewpoint,
        events: &mut state.events,
    };
    state.spawner.update(&mut spawn_ctx);

    let score = state.score.score();
    let questionnaire_open = state.flow.is_open();
    let mut end_ctx = EndCtx {
        clock: &state.clock,
        audio: &mut *services.audio,
        scenes: &mut *services.scenes,
        store: &mut *services.store,
        rng: &mut state.rng,
        events: &mut state.events,
    };
    state.arbiter.update(score, questionnaire_open, &mut end_ctx);

    if !state.arbiter.is_ended() {
        state
            .companion
            .update(&state.clock, &mut *services.audio, &mut state.rng, &mut state.events);
    }
}
