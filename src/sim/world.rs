//! World model: the placed entities the game core reasons about
//!
//! The host renders these and owns the real physics; the core only needs
//! identity, hierarchy, transforms, layers and collision boxes. Every entity
//! is destroyed at most once and each root destroy is recorded.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use crate::config::PrefabSpec;
use crate::platform::ClipId;

/// Stable entity identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bitmask of physics layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const DEFAULT: LayerMask = LayerMask(1 << 0);
    pub const GROUND: LayerMask = LayerMask(1 << 1);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    #[inline]
    pub fn contains(self, layer: LayerMask) -> bool {
        self.0 & layer.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::DEFAULT
    }
}

/// Position, yaw-only rotation and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation about +Y (radians); objects stay upright
    pub yaw: f32,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            scale: Vec3::ONE,
        }
    }
}

/// Box collider in local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub bounds: Aabb,
    pub enabled: bool,
}

/// Marks the root of a spawned collectible
#[derive(Debug, Clone, PartialEq)]
pub struct CollectibleMarker {
    pub sound: Option<ClipId>,
}

/// A placed entity
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub id: EntityId,
    pub name: String,
    pub parent: Option<EntityId>,
    /// Transform; children use it as a local offset from their parent
    pub transform: Transform,
    pub layer: LayerMask,
    pub collider: Option<Collider>,
    /// Visual geometry bounds in local space
    pub visual: Option<Aabb>,
    pub collectible: Option<CollectibleMarker>,
}

impl WorldObject {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            transform: Transform::default(),
            layer: LayerMask::DEFAULT,
            collider: None,
            visual: None,
            collectible: None,
        }
    }
}

/// Registry of placed entities (sorted by id for deterministic iteration)
#[derive(Debug, Default)]
pub struct World {
    objects: BTreeMap<EntityId, WorldObject>,
    next_id: u32,
    /// Root ids in destroy order
    destroyed: Vec<EntityId>,
}

impl World {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 1,
            destroyed: Vec::new(),
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a bare object and return its id
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.next_entity_id();
        self.objects.insert(id, WorldObject::new(id, name));
        id
    }

    /// Instantiate a prefab (root plus parts) at a position and yaw
    pub fn instantiate(&mut self, prefab: &PrefabSpec, position: Vec3, yaw: f32) -> EntityId {
        let root = self.spawn(prefab.name.clone());
        if let Some(obj) = self.objects.get_mut(&root) {
            obj.transform = Transform {
                position,
                yaw,
                scale: prefab.scale,
            };
            obj.layer = prefab.layer;
            obj.collider = prefab.collider.map(|bounds| Collider {
                bounds,
                enabled: true,
            });
            obj.visual = prefab.visual;
        }

        for part in &prefab.parts {
            let child = self.spawn(format!("{}/{}", prefab.name, part.name));
            if let Some(obj) = self.objects.get_mut(&child) {
                obj.parent = Some(root);
                obj.transform.position = part.offset;
                obj.layer = prefab.layer;
                obj.collider = part.collider.map(|bounds| Collider {
                    bounds,
                    enabled: true,
                });
                obj.visual = part.visual;
            }
        }

        root
    }

    pub fn get(&self, id: EntityId) -> Option<&WorldObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut WorldObject> {
        self.objects.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Direct children of an entity
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.objects
            .values()
            .filter(|o| o.parent == Some(id))
            .map(|o| o.id)
            .collect()
    }

    /// The entity itself followed by each ancestor up to its root
    pub fn ancestry(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(obj) = self.objects.get(&current) else {
                break;
            };
            if chain.contains(&current) {
                log::error!("Parent cycle detected at entity {}", current);
                break;
            }
            chain.push(current);
            cursor = obj.parent;
        }
        chain
    }

    /// World-space transform, composing parent offsets
    pub fn world_transform(&self, id: EntityId) -> Option<Transform> {
        let chain = self.ancestry(id);
        let mut iter = chain.iter().rev();
        let root = self.objects.get(iter.next()?)?;
        let mut acc = root.transform;
        for child_id in iter {
            let child = self.objects.get(child_id)?;
            let rot = glam::Quat::from_rotation_y(acc.yaw);
            acc = Transform {
                position: acc.position + rot * (child.transform.position * acc.scale),
                yaw: acc.yaw + child.transform.yaw,
                scale: acc.scale * child.transform.scale,
            };
        }
        Some(acc)
    }

    /// World-space bounds of an entity's enabled collider
    pub fn collider_bounds(&self, id: EntityId) -> Option<Aabb> {
        let obj = self.objects.get(&id)?;
        let collider = obj.collider.filter(|c| c.enabled)?;
        let t = self.world_transform(id)?;
        Some(collider.bounds.transformed(t.position, t.yaw, t.scale))
    }

    /// Entities with a collider (enabled or not) at or below `root`
    pub fn colliders_in_hierarchy(&self, root: EntityId) -> Vec<EntityId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(obj) = self.objects.get(&id) {
                if obj.collider.is_some() {
                    found.push(id);
                }
                stack.extend(self.children(id));
            }
        }
        found.sort();
        found
    }

    /// Union of visual bounds at or below `root`, in the root's local space
    pub fn local_visual_bounds(&self, root: EntityId) -> Option<Aabb> {
        let obj = self.objects.get(&root)?;
        let mut bounds = obj.visual;
        for child in self.children(root) {
            let Some(c) = self.objects.get(&child) else {
                continue;
            };
            let Some(v) = c.visual else { continue };
            let local = v.transformed(c.transform.position, c.transform.yaw, c.transform.scale);
            match bounds.as_mut() {
                Some(b) => b.encapsulate(&local),
                None => bounds = Some(local),
            }
        }
        bounds
    }

    /// Remove an entity and its descendants. Returns false if it was already gone.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.objects.contains_key(&id) {
            return false;
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            self.objects.remove(&current);
        }
        self.destroyed.push(id);
        true
    }

    /// Number of times `id` has been destroyed (0 or 1)
    pub fn destroy_count(&self, id: EntityId) -> usize {
        self.destroyed.iter().filter(|d| **d == id).count()
    }
}
