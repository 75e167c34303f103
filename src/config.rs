//! Game configuration
//!
//! Authored once per scene and loaded from JSON. Every section has defaults so
//! partial files are valid. `validate()` reports authoring problems; the game
//! logs them and degrades the affected feature instead of refusing to start.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::ClipId;
use crate::sim::bounds::Aabb;
use crate::sim::questionnaire::Questionnaire;
use crate::sim::world::LayerMask;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {path} is invalid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A non-fatal authoring problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("{owner} references unknown prefab '{prefab}'")]
    UnknownPrefab { owner: String, prefab: String },
    #[error("easter egg '{egg}' spawn probability {value} is outside [0, 100]")]
    ProbabilityOutOfRange { egg: String, value: f32 },
    #[error("easter egg '{egg}' lifetime {value} must be positive")]
    NonPositiveLifetime { egg: String, value: f32 },
    #[error("easter egg '{egg}' cooldown {value} must not be negative")]
    NegativeCooldown { egg: String, value: f32 },
    #[error("spawn distance range [{min}, {max}] is inverted")]
    SpawnDistanceInverted { min: f32, max: f32 },
    #[error("spawn check interval {value} must be positive")]
    NonPositiveCheckInterval { value: f32 },
    #[error("prefab '{prefab}' used by an interactive entity has no collider")]
    MissingCollider { prefab: String },
    #[error("questionnaire on '{entity}' has no question text")]
    EmptyQuestionText { entity: String },
    #[error("challenge time limit {value} must be positive")]
    NonPositiveTimeLimit { value: f32 },
}

/// A child part of a prefab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartSpec {
    pub name: String,
    /// Offset from the prefab root (root-local space)
    pub offset: Vec3,
    pub visual: Option<Aabb>,
    pub collider: Option<Aabb>,
}

impl Default for PartSpec {
    fn default() -> Self {
        Self {
            name: "part".to_string(),
            offset: Vec3::ZERO,
            visual: None,
            collider: None,
        }
    }
}

/// Something that can be instantiated into the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabSpec {
    pub name: String,
    pub scale: Vec3,
    pub layer: LayerMask,
    pub collider: Option<Aabb>,
    pub visual: Option<Aabb>,
    pub parts: Vec<PartSpec>,
}

impl Default for PrefabSpec {
    fn default() -> Self {
        Self {
            name: "prefab".to_string(),
            scale: Vec3::ONE,
            layer: LayerMask::DEFAULT,
            collider: None,
            visual: None,
            parts: Vec::new(),
        }
    }
}

impl PrefabSpec {
    /// Whether the root or any part carries a collider
    pub fn has_collider(&self) -> bool {
        self.collider.is_some() || self.parts.iter().any(|p| p.collider.is_some())
    }
}

/// Static, non-interactive scenery (e.g. a detected floor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub prefab: String,
    pub position: Vec3,
    pub yaw: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            prefab: String::new(),
            position: Vec3::ZERO,
            yaw: 0.0,
        }
    }
}

/// An author-placed tappable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveSpec {
    pub prefab: String,
    pub position: Vec3,
    pub yaw: f32,
    pub sound: Option<ClipId>,
    pub questionnaire: Option<Questionnaire>,
}

impl Default for InteractiveSpec {
    fn default() -> Self {
        Self {
            prefab: String::new(),
            position: Vec3::ZERO,
            yaw: 0.0,
            sound: None,
            questionnaire: None,
        }
    }
}

/// An easter egg kind (authoring order matters: first match wins)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EasterEggSpec {
    pub name: String,
    pub prefab: String,
    /// Chance per check, in percent [0, 100]
    pub spawn_probability: f32,
    /// Seconds before an uncollected egg disappears
    pub lifetime_seconds: f32,
    pub sound: Option<ClipId>,
    /// Seconds this kind is skipped after it spawns
    pub cooldown_seconds: f32,
    /// Points awarded on collection
    pub score_reward: u32,
}

impl Default for EasterEggSpec {
    fn default() -> Self {
        Self {
            name: "egg".to_string(),
            prefab: String::new(),
            spawn_probability: 5.0,
            lifetime_seconds: 60.0,
            sound: None,
            cooldown_seconds: 0.0,
            score_reward: 0,
        }
    }
}

/// Easter egg spawner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Seconds between spawn checks
    pub check_interval: f32,
    /// Seconds before the first check
    pub first_check_delay: f32,
    pub min_spawn_distance: f32,
    pub max_spawn_distance: f32,
    pub max_concurrent: usize,
    /// Applied to the prefab scale so eggs read well in AR
    pub scale_multiplier: f32,
    /// Keep eggs turned toward the camera (yaw only)
    pub face_camera: bool,
    /// Layers that count as placement surfaces
    pub ground_mask: LayerMask,
    pub eggs: Vec<EasterEggSpec>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            check_interval: 10.0,
            first_check_delay: 10.0,
            min_spawn_distance: 1.0,
            max_spawn_distance: 3.0,
            max_concurrent: 3,
            scale_multiplier: 1.0,
            face_camera: false,
            ground_mask: LayerMask::GROUND,
            eggs: Vec::new(),
        }
    }
}

/// Timed ruleset, enabled through the persistent challenge flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub target_score: u32,
    pub time_limit_seconds: f32,
    pub lose_sound: Option<ClipId>,
    /// Extra seconds after the lose cue before the scene change
    pub lose_audio_delay: f32,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            target_score: 7,
            time_limit_seconds: 300.0,
            lose_sound: None,
            lose_audio_delay: 0.5,
        }
    }
}

/// Voice companion lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Seconds of silence before an idle comment
    pub idle_talk_interval: f32,
    pub idle_comments: Vec<ClipId>,
    pub greeting: Option<ClipId>,
    pub cheer: Option<ClipId>,
    pub help: Option<ClipId>,
    pub hints: Vec<ClipId>,
    /// Recognized speech containing any of these asks for a hint
    pub hint_keywords: Vec<String>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            idle_talk_interval: 10.0,
            idle_comments: Vec::new(),
            greeting: None,
            cheer: None,
            help: None,
            hints: Vec::new(),
            hint_keywords: vec!["hint".to_string(), "help".to_string()],
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// RNG seed for spawn rolls and voice line picks
    pub seed: u64,
    /// Score that wins a normal game
    pub target_score: u32,
    /// Seconds between the win and the scene change
    pub end_scene_delay: f32,
    pub win_scene_name: String,
    pub lose_scene_name: String,
    /// One is picked at random when the game is won
    pub end_sounds: Vec<ClipId>,
    pub challenge: ChallengeConfig,
    pub spawner: SpawnerConfig,
    pub companion: CompanionConfig,
    pub prefabs: Vec<PrefabSpec>,
    pub scenery: Vec<Placement>,
    pub interactives: Vec<InteractiveSpec>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            target_score: 2,
            end_scene_delay: 1.0,
            win_scene_name: "EndGame".to_string(),
            lose_scene_name: "LostScene".to_string(),
            end_sounds: Vec::new(),
            challenge: ChallengeConfig::default(),
            spawner: SpawnerConfig::default(),
            companion: CompanionConfig::default(),
            prefabs: Vec::new(),
            scenery: Vec::new(),
            interactives: Vec::new(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Loaded config from {} ({} interactives, {} easter eggs)",
            path.display(),
            config.interactives.len(),
            config.spawner.eggs.len()
        );
        Ok(config)
    }

    pub fn prefab(&self, name: &str) -> Option<&PrefabSpec> {
        self.prefabs.iter().find(|p| p.name == name)
    }

    /// Collect authoring problems
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for placement in &self.scenery {
            if self.prefab(&placement.prefab).is_none() {
                issues.push(ConfigIssue::UnknownPrefab {
                    owner: "scenery".to_string(),
                    prefab: placement.prefab.clone(),
                });
            }
        }

        for spec in &self.interactives {
            match self.prefab(&spec.prefab) {
                None => issues.push(ConfigIssue::UnknownPrefab {
                    owner: "interactive".to_string(),
                    prefab: spec.prefab.clone(),
                }),
                Some(prefab) if !prefab.has_collider() => {
                    issues.push(ConfigIssue::MissingCollider {
                        prefab: prefab.name.clone(),
                    })
                }
                Some(_) => {}
            }
            if let Some(q) = &spec.questionnaire {
                if q.question_text.trim().is_empty() {
                    issues.push(ConfigIssue::EmptyQuestionText {
                        entity: spec.prefab.clone(),
                    });
                }
            }
        }

        let spawner = &self.spawner;
        if spawner.check_interval <= 0.0 {
            issues.push(ConfigIssue::NonPositiveCheckInterval {
                value: spawner.check_interval,
            });
        }
        if spawner.min_spawn_distance > spawner.max_spawn_distance {
            issues.push(ConfigIssue::SpawnDistanceInverted {
                min: spawner.min_spawn_distance,
                max: spawner.max_spawn_distance,
            });
        }
        for egg in &spawner.eggs {
            if self.prefab(&egg.prefab).is_none() {
                issues.push(ConfigIssue::UnknownPrefab {
                    owner: format!("easter egg '{}'", egg.name),
                    prefab: egg.prefab.clone(),
                });
            }
            if !(0.0..=100.0).contains(&egg.spawn_probability) {
                issues.push(ConfigIssue::ProbabilityOutOfRange {
                    egg: egg.name.clone(),
                    value: egg.spawn_probability,
                });
            }
            if egg.lifetime_seconds <= 0.0 {
                issues.push(ConfigIssue::NonPositiveLifetime {
                    egg: egg.name.clone(),
                    value: egg.lifetime_seconds,
                });
            }
            if egg.cooldown_seconds < 0.0 {
                issues.push(ConfigIssue::NegativeCooldown {
                    egg: egg.name.clone(),
                    value: egg.cooldown_seconds,
                });
            }
        }

        if self.challenge.time_limit_seconds <= 0.0 {
            issues.push(ConfigIssue::NonPositiveTimeLimit {
                value: self.challenge.time_limit_seconds,
            });
        }

        issues
    }

    /// Small playable scene used by the native demo
    pub fn demo() -> Self {
        let ground = PrefabSpec {
            name: "ground".to_string(),
            layer: LayerMask::GROUND,
            collider: Some(Aabb::new(Vec3::new(-20.0, -0.05, -20.0), Vec3::new(20.0, 0.0, 20.0))),
            ..Default::default()
        };
        let chest = PrefabSpec {
            name: "chest".to_string(),
            collider: Some(Aabb::from_center_size(Vec3::ZERO, Vec3::splat(0.6))),
            visual: Some(Aabb::from_center_size(Vec3::ZERO, Vec3::splat(0.6))),
            ..Default::default()
        };
        let totem = PrefabSpec {
            name: "totem".to_string(),
            collider: Some(Aabb::from_center_size(Vec3::ZERO, Vec3::new(0.5, 1.0, 0.5))),
            ..Default::default()
        };
        let golden_egg = PrefabSpec {
            name: "golden_egg".to_string(),
            scale: Vec3::splat(0.3),
            visual: Some(Aabb::unit()),
            ..Default::default()
        };
        let sparkle_egg = PrefabSpec {
            name: "sparkle_egg".to_string(),
            scale: Vec3::splat(0.25),
            parts: vec![PartSpec {
                name: "shell".to_string(),
                offset: Vec3::new(0.0, 0.5, 0.0),
                visual: Some(Aabb::unit()),
                collider: Some(Aabb::unit()),
            }],
            ..Default::default()
        };

        Self {
            target_score: 3,
            end_sounds: vec![ClipId::new("fanfare")],
            challenge: ChallengeConfig {
                lose_sound: Some(ClipId::new("sad_trombone")),
                ..Default::default()
            },
            spawner: SpawnerConfig {
                check_interval: 4.0,
                first_check_delay: 2.0,
                face_camera: true,
                eggs: vec![
                    EasterEggSpec {
                        name: "golden".to_string(),
                        prefab: "golden_egg".to_string(),
                        spawn_probability: 40.0,
                        lifetime_seconds: 12.0,
                        sound: Some(ClipId::new("egg_chime")),
                        cooldown_seconds: 8.0,
                        score_reward: 0,
                    },
                    EasterEggSpec {
                        name: "sparkle".to_string(),
                        prefab: "sparkle_egg".to_string(),
                        spawn_probability: 60.0,
                        lifetime_seconds: 8.0,
                        sound: Some(ClipId::new("sparkle")),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            companion: CompanionConfig {
                idle_comments: vec![ClipId::new("companion_hmm"), ClipId::new("companion_look")],
                greeting: Some(ClipId::new("companion_hello")),
                cheer: Some(ClipId::new("companion_cheer")),
                hints: vec![ClipId::new("hint_chest"), ClipId::new("hint_totem")],
                ..Default::default()
            },
            prefabs: vec![ground, chest, totem, golden_egg, sparkle_egg],
            scenery: vec![Placement {
                prefab: "ground".to_string(),
                ..Default::default()
            }],
            interactives: vec![
                InteractiveSpec {
                    prefab: "chest".to_string(),
                    position: Vec3::new(0.0, 0.3, -3.0),
                    sound: Some(ClipId::new("chest_open")),
                    ..Default::default()
                },
                InteractiveSpec {
                    prefab: "totem".to_string(),
                    position: Vec3::new(1.2, 0.5, -4.0),
                    sound: Some(ClipId::new("totem_hum")),
                    questionnaire: Some(Questionnaire {
                        question_text: "What did the totem whisper?".to_string(),
                        correct_answer: "patience".to_string(),
                        options: vec!["patience".to_string(), "speed".to_string()],
                        submission_key: "entry.1001".to_string(),
                    }),
                    ..Default::default()
                },
                InteractiveSpec {
                    prefab: "chest".to_string(),
                    position: Vec3::new(-1.5, 0.3, -5.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }
}
