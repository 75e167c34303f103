//! Easter egg spawner
//!
//! Owns every live easter egg. Once per check interval it rolls the
//! configured kinds in authoring order and spawns the first that passes,
//! unless the concurrency cap is reached. Each egg leaves exactly once:
//! either collected by a tap (shrink-out, then destroy) or expired by its
//! lifetime timer (destroy, no animation).

use std::collections::BTreeMap;

use glam::Vec3;

use super::bounds::Aabb;
use super::clock::FrameClock;
use super::rng::GameRng;
use super::state::GameEvent;
use super::surface::{SurfaceLocator, position_in_view};
use super::tasks::{TaskId, TaskQueue, Wait};
use super::world::{CollectibleMarker, Collider, EntityId, World};
use crate::config::{EasterEggSpec, GameConfig, PrefabSpec, SpawnerConfig};
use crate::consts::*;
use crate::platform::{AudioOut, Raycaster, Viewpoint};
use crate::{wrap_yaw, yaw_towards};

/// A spawnable kind with its prefab resolved
#[derive(Debug, Clone)]
pub struct EggKind {
    pub spec: EasterEggSpec,
    pub prefab: PrefabSpec,
}

/// A live egg
#[derive(Debug, Clone, PartialEq)]
pub struct EasterEggInstance {
    pub entity: EntityId,
    /// Index into the spawner's kinds
    pub kind: usize,
    /// Game time at spawn
    pub spawned_at: f64,
    pub expiry: TaskId,
}

#[derive(Debug, Clone, Copy)]
struct Collecting {
    kind: usize,
    started: f64,
    duration: f32,
    start_scale: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SpawnerTask {
    /// Try to place an egg of `kind` on a surface
    Place { kind: usize, attempt: u32 },
    /// Lifetime elapsed for the owning egg
    Expire,
}

/// Result of a tap on an egg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    Collected { reward: u32 },
    /// Already shrinking out from an earlier tap
    AlreadyCollecting,
    /// Not a live egg (expired or never spawned here)
    NotActive,
}

/// Counters for logs and the debug HUD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnStats {
    pub checks: u32,
    pub spawns: u32,
    pub fallback_spawns: u32,
    pub collected: u32,
    pub expired: u32,
}

/// Per-frame collaborators
pub struct SpawnCtx<'a> {
    pub clock: &'a FrameClock,
    pub world: &'a mut World,
    pub rng: &'a mut GameRng,
    pub raycaster: &'a dyn Raycaster,
    pub viewpoint: &'a Viewpoint,
    pub events: &'a mut Vec<GameEvent>,
}

#[derive(Debug)]
pub struct EasterEggSpawner {
    settings: SpawnerConfig,
    kinds: Vec<EggKind>,
    locator: SurfaceLocator,
    next_check: f64,
    spawning: bool,
    /// Cleared once the game ends; live eggs still expire or finish collecting
    enabled: bool,
    active: BTreeMap<EntityId, EasterEggInstance>,
    collecting: BTreeMap<EntityId, Collecting>,
    /// Kind index -> remaining cooldown seconds
    cooldowns: BTreeMap<usize, f32>,
    tasks: TaskQueue<SpawnerTask>,
    stats: SpawnStats,
}

impl EasterEggSpawner {
    /// Build from config. Kinds with an unknown prefab or a non-positive
    /// lifetime are dropped; probabilities are clamped to [0, 100].
    pub fn new(config: &GameConfig) -> Self {
        let mut kinds = Vec::new();
        for spec in &config.spawner.eggs {
            let Some(prefab) = config.prefab(&spec.prefab) else {
                log::error!("Easter egg '{}' references unknown prefab '{}', skipping", spec.name, spec.prefab);
                continue;
            };
            if spec.lifetime_seconds <= 0.0 {
                log::error!("Easter egg '{}' has lifetime {}, skipping", spec.name, spec.lifetime_seconds);
                continue;
            }
            let mut spec = spec.clone();
            spec.spawn_probability = spec.spawn_probability.clamp(0.0, 100.0);
            spec.cooldown_seconds = spec.cooldown_seconds.max(0.0);
            kinds.push(EggKind {
                spec,
                prefab: prefab.clone(),
            });
        }

        let mut settings = config.spawner.clone();
        settings.eggs.clear();
        if settings.min_spawn_distance > settings.max_spawn_distance {
            std::mem::swap(&mut settings.min_spawn_distance, &mut settings.max_spawn_distance);
        }
        settings.check_interval = settings.check_interval.max(0.0);

        Self {
            locator: SurfaceLocator::new(settings.ground_mask),
            next_check: settings.first_check_delay.max(0.0) as f64,
            settings,
            kinds,
            spawning: false,
            enabled: true,
            active: BTreeMap::new(),
            collecting: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            tasks: TaskQueue::new(),
            stats: SpawnStats::default(),
        }
    }

    pub fn kinds(&self) -> &[EggKind] {
        &self.kinds
    }

    pub fn stats(&self) -> SpawnStats {
        self.stats
    }

    pub fn max_concurrent(&self) -> usize {
        self.settings.max_concurrent
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_ids(&self) -> Vec<EntityId> {
        self.active.keys().copied().collect()
    }

    pub fn instance(&self, entity: EntityId) -> Option<&EasterEggInstance> {
        self.active.get(&entity)
    }

    pub fn is_active(&self, entity: EntityId) -> bool {
        self.active.contains_key(&entity)
    }

    pub fn is_collecting(&self, entity: EntityId) -> bool {
        self.collecting.contains_key(&entity)
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stop or resume spawn checks
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            log::debug!("Easter egg spawning {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    pub fn next_check_time(&self) -> f64 {
        self.next_check
    }

    /// Remaining cooldown for a kind, if any
    pub fn cooldown(&self, kind: usize) -> Option<f32> {
        self.cooldowns.get(&kind).copied()
    }

    /// Advance one frame
    pub fn update(&mut self, ctx: &mut SpawnCtx<'_>) {
        self.tick_cooldowns(ctx.clock.game_dt);

        for resumed in self.tasks.drain_due(ctx.clock) {
            match resumed.task {
                SpawnerTask::Place { kind, attempt } => {
                    if self.enabled {
                        self.attempt_placement(kind, attempt, ctx);
                    } else {
                        self.spawning = false;
                    }
                }
                SpawnerTask::Expire => {
                    if let Some(entity) = resumed.owner {
                        self.expire(entity, ctx.world, ctx.events);
                    }
                }
            }
        }

        if self.enabled && ctx.clock.game_time >= self.next_check && !self.spawning {
            self.check_for_spawn(ctx);
            self.next_check = ctx.clock.game_time + self.settings.check_interval as f64;
        }

        self.animate_collections(ctx.clock, ctx.world, ctx.events);

        if self.settings.face_camera {
            self.face_viewpoint(ctx.world, ctx.viewpoint);
        }
    }

    fn tick_cooldowns(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for remaining in self.cooldowns.values_mut() {
            *remaining -= dt;
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0.0);
    }

    /// One spawn evaluation: first kind whose roll passes wins
    fn check_for_spawn(&mut self, ctx: &mut SpawnCtx<'_>) {
        if self.active.len() >= self.settings.max_concurrent {
            log::debug!("Not spawning: already have {} easter eggs active", self.active.len());
            return;
        }

        self.stats.checks += 1;
        log::debug!("Checking for easter egg spawn, check #{}", self.stats.checks);

        let mut chosen = None;
        for (index, kind) in self.kinds.iter().enumerate() {
            if self.cooldowns.contains_key(&index) {
                continue;
            }
            let roll = ctx.rng.percent();
            let chance = kind.spec.spawn_probability;
            if chance > 0.0 && roll <= chance {
                log::info!("Easter egg '{}' will spawn (roll {:.1} <= {:.1})", kind.spec.name, roll, chance);
                chosen = Some(index);
                break;
            }
        }

        match chosen {
            Some(index) => {
                self.spawning = true;
                self.attempt_placement(index, 1, ctx);
            }
            None => log::debug!("No easter eggs spawned this check"),
        }
    }

    fn kind_name(&self, kind: usize) -> String {
        self.kinds
            .get(kind)
            .map(|k| k.spec.name.clone())
            .unwrap_or_default()
    }

    fn attempt_placement(&mut self, kind: usize, attempt: u32, ctx: &mut SpawnCtx<'_>) {
        if kind >= self.kinds.len() || self.active.len() >= self.settings.max_concurrent {
            log::warn!("Abandoning easter egg placement (cap reached or kind missing)");
            self.spawning = false;
            return;
        }

        if attempt <= SPAWN_PLACEMENT_ATTEMPTS {
            match self.locator.locate(ctx.world, ctx.raycaster, ctx.viewpoint, ctx.rng) {
                Some(position) => self.place(kind, position, false, ctx),
                None => {
                    log::debug!("No surface found on attempt {}, trying again", attempt);
                    self.tasks.schedule(
                        ctx.clock,
                        Wait::Seconds(SPAWN_RETRY_PAUSE),
                        None,
                        SpawnerTask::Place {
                            kind,
                            attempt: attempt + 1,
                        },
                    );
                }
            }
        } else {
            log::info!("Falling back to camera-relative placement");
            let position = position_in_view(
                ctx.viewpoint,
                self.settings.min_spawn_distance,
                self.settings.max_spawn_distance,
                ctx.rng,
            );
            self.place(kind, position, true, ctx);
        }
    }

    fn place(&mut self, kind: usize, position: Vec3, fallback: bool, ctx: &mut SpawnCtx<'_>) {
        let egg = &self.kinds[kind];
        let yaw = if self.settings.face_camera {
            yaw_towards(position, ctx.viewpoint.position).unwrap_or(0.0)
        } else {
            wrap_yaw(ctx.rng.range_f32(0.0, 360.0).to_radians())
        };

        let entity = ctx.world.instantiate(&egg.prefab, position, yaw);
        if let Some(obj) = ctx.world.get_mut(entity) {
            obj.transform.scale *= self.settings.scale_multiplier;
            obj.collectible = Some(CollectibleMarker {
                sound: egg.spec.sound.clone(),
            });
        }
        ensure_collider(ctx.world, entity);

        let expiry = self.tasks.schedule(
            ctx.clock,
            Wait::Seconds(egg.spec.lifetime_seconds),
            Some(entity),
            SpawnerTask::Expire,
        );
        self.active.insert(
            entity,
            EasterEggInstance {
                entity,
                kind,
                spawned_at: ctx.clock.game_time,
                expiry,
            },
        );
        if egg.spec.cooldown_seconds > 0.0 {
            self.cooldowns.insert(kind, egg.spec.cooldown_seconds);
        }

        self.spawning = false;
        self.stats.spawns += 1;
        if fallback {
            self.stats.fallback_spawns += 1;
        }
        log::info!(
            "Easter egg '{}' placed at {:?}{} ({} total)",
            egg.spec.name,
            position,
            if fallback { " using fallback" } else { "" },
            self.stats.spawns
        );
        ctx.events.push(GameEvent::EggSpawned {
            entity,
            kind: egg.spec.name.clone(),
            fallback,
        });
    }

    /// Tap-triggered collection
    pub fn collect(
        &mut self,
        entity: EntityId,
        clock: &FrameClock,
        world: &World,
        audio: &mut dyn AudioOut,
        events: &mut Vec<GameEvent>,
    ) -> CollectOutcome {
        if self.collecting.contains_key(&entity) {
            log::debug!("Already collecting {}, ignoring additional tap", entity);
            return CollectOutcome::AlreadyCollecting;
        }
        let Some(instance) = self.active.remove(&entity) else {
            return CollectOutcome::NotActive;
        };
        self.tasks.cancel(instance.expiry);

        let Some(obj) = world.get(entity) else {
            log::warn!("Easter egg {} vanished before collection", entity);
            return CollectOutcome::NotActive;
        };

        let sound = obj
            .collectible
            .as_ref()
            .and_then(|m| m.sound.clone());
        let sound_length = match &sound {
            Some(clip) => audio.play(clip),
            None => {
                log::debug!("Easter egg {} has no sound effect", entity);
                0.0
            }
        };

        let name = self.kind_name(instance.kind);
        let reward = self.kinds.get(instance.kind).map_or(0, |k| k.spec.score_reward);
        self.collecting.insert(
            entity,
            Collecting {
                kind: instance.kind,
                started: clock.game_time,
                duration: sound_length.max(MIN_COLLECT_DURATION),
                start_scale: obj.transform.scale,
            },
        );
        self.stats.collected += 1;
        log::info!("Collected easter egg '{}' ({})", name, entity);
        events.push(GameEvent::EggCollected { entity, kind: name });

        CollectOutcome::Collected { reward }
    }

    fn expire(&mut self, entity: EntityId, world: &mut World, events: &mut Vec<GameEvent>) {
        if self.collecting.contains_key(&entity) {
            return;
        }
        let Some(instance) = self.active.remove(&entity) else {
            return;
        };
        if world.destroy(entity) {
            self.stats.expired += 1;
            let kind = self.kind_name(instance.kind);
            log::info!("Auto-destroying uncollected easter egg '{}' ({})", kind, entity);
            events.push(GameEvent::EggExpired { entity, kind });
        }
    }

    /// Shrink collected eggs, destroying those whose animation finished
    fn animate_collections(&mut self, clock: &FrameClock, world: &mut World, events: &mut Vec<GameEvent>) {
        let mut finished = Vec::new();

        for (&entity, c) in &self.collecting {
            let Some(obj) = world.get_mut(entity) else {
                finished.push(entity);
                continue;
            };
            let t = if c.duration > 0.0 {
                ((clock.game_time - c.started) as f32 / c.duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            obj.transform.scale = c.start_scale.lerp(Vec3::ZERO, t);
            if t >= 1.0 {
                finished.push(entity);
            }
        }

        for entity in finished {
            if let Some(c) = self.collecting.remove(&entity) {
                if world.destroy(entity) {
                    log::debug!("Destroying collected easter egg {} ({})", entity, self.kind_name(c.kind));
                    events.push(GameEvent::EntityDestroyed { entity });
                }
            }
        }
    }

    fn face_viewpoint(&self, world: &mut World, viewpoint: &Viewpoint) {
        for entity in self.active.keys().copied().collect::<Vec<_>>() {
            let Some(obj) = world.get_mut(entity) else {
                continue;
            };
            if let Some(yaw) = yaw_towards(obj.transform.position, viewpoint.position) {
                obj.transform.yaw = yaw;
            }
        }
    }
}

/// Make sure a spawned object can be hit: enable existing colliders, or fit a
/// box to its visual bounds (unit box if it has none).
pub fn ensure_collider(world: &mut World, root: EntityId) {
    let colliders = world.colliders_in_hierarchy(root);
    if colliders.is_empty() {
        let bounds = world.local_visual_bounds(root).unwrap_or_else(Aabb::unit);
        if let Some(obj) = world.get_mut(root) {
            obj.collider = Some(Collider { bounds, enabled: true });
        }
        log::debug!("Added box collider to {}", root);
    } else {
        for id in &colliders {
            if let Some(collider) = world.get_mut(*id).and_then(|o| o.collider.as_mut()) {
                collider.enabled = true;
            }
        }
        log::debug!("{} already has {} colliders", root, colliders.len());
    }
}
