//! Spawn surface locator
//!
//! Probes a few random screen points near the middle of the view for a
//! detected surface, then the exact center. When nothing is found the
//! spawner falls back to `position_in_view`.

use glam::{Vec2, Vec3};

use super::rng::GameRng;
use super::world::{LayerMask, World};
use crate::consts::*;
use crate::platform::{Raycaster, Viewpoint};

#[derive(Debug, Clone, Copy)]
pub struct SurfaceLocator {
    pub mask: LayerMask,
    pub max_distance: f32,
}

impl SurfaceLocator {
    pub fn new(mask: LayerMask) -> Self {
        Self {
            mask,
            max_distance: SURFACE_RAY_DISTANCE,
        }
    }

    /// Find a point on a surface in view, lifted slightly off it
    pub fn locate(
        &self,
        world: &World,
        raycaster: &dyn Raycaster,
        viewpoint: &Viewpoint,
        rng: &mut GameRng,
    ) -> Option<Vec3> {
        let size = viewpoint.screen_size;

        for _ in 0..SURFACE_PROBE_RAYS {
            let screen = Vec2::new(
                rng.range_f32(size.x * SURFACE_PROBE_MIN, size.x * SURFACE_PROBE_MAX),
                rng.range_f32(size.y * SURFACE_PROBE_MIN, size.y * SURFACE_PROBE_MAX),
            );
            if let Some(hit) = raycaster.raycast(world, viewpoint, screen, self.max_distance, self.mask) {
                return Some(hit.point + Vec3::Y * SURFACE_LIFT);
            }
        }

        raycaster
            .raycast(world, viewpoint, size * 0.5, self.max_distance, self.mask)
            .map(|hit| hit.point + Vec3::Y * SURFACE_LIFT)
    }
}

/// Random point in a narrowed cone in front of the viewpoint
pub fn position_in_view(viewpoint: &Viewpoint, min_distance: f32, max_distance: f32, rng: &mut GameRng) -> Vec3 {
    let distance = rng.range_f32(min_distance, max_distance);
    let horizontal = rng.range_f32(-FALLBACK_HORIZONTAL_SPREAD, FALLBACK_HORIZONTAL_SPREAD);
    let vertical = rng.range_f32(-FALLBACK_VERTICAL_SPREAD, FALLBACK_VERTICAL_SPREAD);

    let dir = (viewpoint.forward() + viewpoint.right() * horizontal + viewpoint.up() * vertical).normalize_or_zero();
    viewpoint.position + dir * distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::BoxRaycaster;
    use crate::sim::bounds::Aabb;
    use crate::sim::world::Collider;
    use glam::Quat;

    fn floor(world: &mut World) {
        let id = world.spawn("floor");
        let obj = world.get_mut(id).unwrap();
        obj.layer = LayerMask::GROUND;
        obj.collider = Some(Collider {
            bounds: Aabb::new(Vec3::new(-20.0, -0.05, -20.0), Vec3::new(20.0, 0.0, 20.0)),
            enabled: true,
        });
    }

    fn looking_down() -> Viewpoint {
        Viewpoint {
            rotation: Quat::from_rotation_x(-0.6),
            ..Default::default()
        }
    }

    #[test]
    fn test_locate_finds_floor() {
        let mut world = World::new();
        floor(&mut world);
        let mut rng = GameRng::new(3);
        let p = SurfaceLocator::new(LayerMask::GROUND)
            .locate(&world, &BoxRaycaster, &looking_down(), &mut rng)
            .unwrap();
        assert!((p.y - SURFACE_LIFT).abs() < 0.001);
        assert!(p.z < 0.0);
    }

    #[test]
    fn test_locate_without_surface() {
        let world = World::new();
        let mut rng = GameRng::new(3);
        assert!(SurfaceLocator::new(LayerMask::GROUND)
            .locate(&world, &BoxRaycaster, &looking_down(), &mut rng)
            .is_none());
    }

    #[test]
    fn test_fallback_stays_in_distance_band() {
        let vp = Viewpoint::default();
        let mut rng = GameRng::new(11);
        for _ in 0..200 {
            let p = position_in_view(&vp, 1.0, 3.0, &mut rng);
            let d = (p - vp.position).length();
            assert!((1.0 - 1e-4..=3.0 + 1e-4).contains(&d));
            // In front of the camera
            assert!((p - vp.position).dot(vp.forward()) > 0.0);
        }
    }
}
