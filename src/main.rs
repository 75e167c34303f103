//! Treasure Hunt headless runner
//!
//! Plays a scripted session against the headless host and logs every game
//! event. Usage: `treasure-hunt [config.json] [--challenge]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::{Quat, Vec2};
    use treasure_hunt::GameConfig;
    use treasure_hunt::persistence::MemoryStore;
    use treasure_hunt::platform::headless::{BoxRaycaster, RecordingAudio, RecordingScenes};
    use treasure_hunt::platform::{Services, Viewpoint};
    use treasure_hunt::results::{self, GameResult};
    use treasure_hunt::sim::{GameState, InteractionState, TickInput, tick};

    env_logger::init();
    log::info!("Treasure Hunt (headless) starting...");

    let mut config_path = None;
    let mut challenge = false;
    for arg in std::env::args().skip(1) {
        if arg == "--challenge" {
            challenge = true;
        } else {
            config_path = Some(arg);
        }
    }

    let config = match config_path {
        Some(path) => match GameConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => GameConfig::demo(),
    };
    let end_scenes = [config.win_scene_name.clone(), config.lose_scene_name.clone()];

    let raycaster = BoxRaycaster;
    let mut audio = RecordingAudio::new(1.2);
    let mut scenes = RecordingScenes::default();
    let mut store = MemoryStore::new();

    // Main menu
    results::start_game(&mut scenes, &mut store, challenge);
    let mut state = GameState::new(config, &store);

    const FRAME_DT: f32 = 1.0 / 60.0;
    const ACTION_EVERY: u64 = 90;
    const MAX_FRAMES: u64 = 60 * 60 * 6;

    let mut input = TickInput {
        viewpoint: Viewpoint {
            rotation: Quat::from_rotation_x(-0.35),
            ..Default::default()
        },
        ..Default::default()
    };

    for frame in 0..MAX_FRAMES {
        input.taps.clear();
        input.answer = None;
        input.speech = None;

        if frame > 0 && frame % ACTION_EVERY == 0 && !state.is_ended() {
            if state.flow.is_open() {
                input.answer = Some("treasure".to_string());
            } else {
                let egg = state.spawner.active_ids().into_iter().next();
                let idle = state
                    .dispatcher
                    .iter()
                    .find(|e| e.state == InteractionState::Idle)
                    .map(|e| e.entity);
                let target = egg.or(idle);
                let screen: Option<Vec2> = target
                    .and_then(|id| state.world.world_transform(id))
                    .and_then(|t| input.viewpoint.world_to_screen(t.position));
                match screen {
                    Some(point) => input.taps.push(point),
                    None => input.speech = Some("can I have a hint".to_string()),
                }
            }
        }

        let mut services = Services {
            raycaster: &raycaster,
            audio: &mut audio,
            scenes: &mut scenes,
            store: &mut store,
        };
        tick(&mut state, &input, &mut services, FRAME_DT);

        for event in state.drain_events() {
            log::info!("[{:>6.2}s] {:?}", state.clock.real_time, event);
        }

        if scenes.last().is_some_and(|s| end_scenes.iter().any(|e| e == s)) {
            break;
        }
    }

    println!("Final score: {}", state.current_score());
    match GameResult::load(&store) {
        Some(result) => println!("Result: {} ({} points)", result.outcome, result.final_score),
        None => println!("Result: unfinished"),
    }
    println!("Scenes requested: {:?}", scenes.requested());
    println!("Clips played: {}", audio.played().len());
    for answer in state.flow.answers() {
        println!("Answer {} = {:?}", answer.submission_key, answer.answer);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives the library directly
}
