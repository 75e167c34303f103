//! Game core
//!
//! All gameplay logic lives here. The core is single-threaded and driven by
//! `tick` once per frame:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies; collaborators come in through
//!   `platform::Services`

pub mod arbiter;
pub mod bounds;
pub mod clock;
pub mod companion;
pub mod dispatch;
pub mod questionnaire;
pub mod rng;
pub mod score;
pub mod spawner;
pub mod state;
pub mod surface;
pub mod tasks;
pub mod tick;
pub mod world;

pub use arbiter::{EndState, GameEndArbiter};
pub use bounds::Aabb;
pub use clock::FrameClock;
pub use companion::{Companion, Gesture};
pub use dispatch::{InteractionState, TapDispatcher, TapOutcome};
pub use questionnaire::{AnswerRecord, Questionnaire, QuestionnaireFlow, SubmitError};
pub use rng::GameRng;
pub use score::ScoreLedger;
pub use spawner::{CollectOutcome, EasterEggSpawner};
pub use state::{GameEvent, GameState};
pub use surface::SurfaceLocator;
pub use tasks::{TaskQueue, Wait};
pub use tick::{TickInput, tick};
pub use world::{EntityId, LayerMask, World};
