//! Headless host: collaborators without an engine behind them
//!
//! Used by the native demo and by tests. The raycaster intersects the
//! world's enabled box colliders; audio and scene requests are recorded.

use std::collections::BTreeMap;

use glam::Vec2;

use super::{AudioOut, ClipId, RayHit, Raycaster, SceneLoader, Viewpoint};
use crate::sim::world::{LayerMask, World};

/// Ray-vs-box raycaster over the world model
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxRaycaster;

impl Raycaster for BoxRaycaster {
    fn raycast(
        &self,
        world: &World,
        viewpoint: &Viewpoint,
        screen_point: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let ray = viewpoint.screen_point_to_ray(screen_point);
        let mut best: Option<RayHit> = None;

        for obj in world.iter() {
            if !mask.contains(obj.layer) {
                continue;
            }
            let Some(bounds) = world.collider_bounds(obj.id) else {
                continue;
            };
            let Some(t) = bounds.ray_intersection(ray.origin, ray.dir, max_distance) else {
                continue;
            };
            // Strictly closer wins; ties keep the lower id
            if best.is_none_or(|b| t < b.distance) {
                best = Some(RayHit {
                    point: ray.at(t),
                    entity: obj.id,
                    distance: t,
                });
            }
        }

        best
    }
}

/// Audio sink that records every clip and reports configured lengths
#[derive(Debug, Clone)]
pub struct RecordingAudio {
    lengths: BTreeMap<ClipId, f32>,
    default_length: f32,
    played: Vec<ClipId>,
}

impl Default for RecordingAudio {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RecordingAudio {
    pub fn new(default_length: f32) -> Self {
        Self {
            lengths: BTreeMap::new(),
            default_length,
            played: Vec::new(),
        }
    }

    pub fn with_length(mut self, clip: &str, seconds: f32) -> Self {
        self.lengths.insert(ClipId::new(clip), seconds);
        self
    }

    pub fn played(&self) -> &[ClipId] {
        &self.played
    }

    pub fn play_count(&self, clip: &str) -> usize {
        self.played.iter().filter(|c| c.as_str() == clip).count()
    }
}

impl AudioOut for RecordingAudio {
    fn play(&mut self, clip: &ClipId) -> f32 {
        log::debug!("Playing clip {}", clip);
        self.played.push(clip.clone());
        self.lengths.get(clip).copied().unwrap_or(self.default_length)
    }
}

/// Scene loader that records requests
#[derive(Debug, Clone, Default)]
pub struct RecordingScenes {
    requested: Vec<String>,
}

impl RecordingScenes {
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    pub fn last(&self) -> Option<&str> {
        self.requested.last().map(String::as_str)
    }
}

impl SceneLoader for RecordingScenes {
    fn load_scene(&mut self, name: &str) {
        log::info!("Scene requested: {}", name);
        self.requested.push(name.to_string());
    }
}
