//! Platform abstraction layer
//!
//! The game core never renders, plays audio, loads scenes or owns physics. It
//! talks to the host through these collaborator interfaces:
//! - `Raycaster`: screen point to first hit (entity + world point)
//! - `AudioOut`: play one clip, report its duration
//! - `SceneLoader`: request a named scene
//! - `KeyValueStore` (see `persistence`): named persistent values

pub mod headless;

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;
use crate::sim::world::{EntityId, LayerMask, World};

/// Name of an audio clip known to the host
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ray in world space (direction normalized)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// First hit of a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub entity: EntityId,
    pub distance: f32,
}

/// The player's camera for this frame
///
/// Screen coordinates are pixels with the origin at the bottom-left.
/// Camera looks down its local -Z with +Y up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub position: Vec3,
    pub rotation: Quat,
    pub screen_size: Vec2,
    /// Vertical field of view (radians)
    pub fov_y: f32,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 0.0),
            rotation: Quat::IDENTITY,
            screen_size: Vec2::new(1080.0, 1920.0),
            fov_y: 60f32.to_radians(),
        }
    }
}

impl Viewpoint {
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    fn aspect(&self) -> f32 {
        if self.screen_size.y > 0.0 {
            self.screen_size.x / self.screen_size.y
        } else {
            1.0
        }
    }

    /// Ray through a viewport point ((0,0) bottom-left, (1,1) top-right)
    pub fn viewport_point_to_ray(&self, viewport: Vec2) -> Ray {
        let ndc = viewport * 2.0 - Vec2::ONE;
        let tan_half = (self.fov_y * 0.5).tan();
        let dir = self.forward()
            + self.right() * (ndc.x * tan_half * self.aspect())
            + self.up() * (ndc.y * tan_half);
        Ray {
            origin: self.position,
            dir: dir.normalize_or_zero(),
        }
    }

    /// Ray through a screen pixel
    pub fn screen_point_to_ray(&self, screen: Vec2) -> Ray {
        let viewport = if self.screen_size.x > 0.0 && self.screen_size.y > 0.0 {
            screen / self.screen_size
        } else {
            Vec2::splat(0.5)
        };
        self.viewport_point_to_ray(viewport)
    }

    /// Project a world point to screen pixels (None if behind the camera)
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let local = self.rotation.inverse() * (point - self.position);
        let depth = -local.z;
        if depth <= 1e-4 {
            return None;
        }
        let tan_half = (self.fov_y * 0.5).tan();
        let ndc = Vec2::new(
            local.x / (depth * tan_half * self.aspect()),
            local.y / (depth * tan_half),
        );
        Some((ndc * 0.5 + Vec2::splat(0.5)) * self.screen_size)
    }
}

/// Screen-to-world raycast provider
pub trait Raycaster {
    fn raycast(
        &self,
        world: &World,
        viewpoint: &Viewpoint,
        screen_point: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

/// One-shot audio playback
pub trait AudioOut {
    /// Play a clip and return its length in seconds
    fn play(&mut self, clip: &ClipId) -> f32;
}

/// Scene transitions
pub trait SceneLoader {
    fn load_scene(&mut self, name: &str);
}

/// Collaborators handed to the core for one call
pub struct Services<'a> {
    pub raycaster: &'a dyn Raycaster,
    pub audio: &'a mut dyn AudioOut,
    pub scenes: &'a mut dyn SceneLoader,
    pub store: &'a mut dyn KeyValueStore,
}
