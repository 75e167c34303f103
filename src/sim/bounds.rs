//! Box geometry for colliders and visual bounds
//!
//! Colliders are axis-aligned boxes in an entity's local space. World-space
//! bounds are recomputed from the entity transform (yaw + scale + position).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Unit box centered on the origin (default box collider)
    pub fn unit() -> Self {
        Self::from_center_size(Vec3::ZERO, Vec3::ONE)
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow to include another box
    pub fn encapsulate(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// World-space box enclosing this local box after scale, yaw and translation
    pub fn transformed(&self, position: Vec3, yaw: f32, scale: Vec3) -> Self {
        let rot = Quat::from_rotation_y(yaw);
        let mut corners = self.corners().into_iter().map(|c| position + rot * (c * scale));
        // corners() always yields 8 points
        let first = corners.next().unwrap_or(position);
        let mut out = Aabb { min: first, max: first };
        for c in corners {
            out.min = out.min.min(c);
            out.max = out.max.max(c);
        }
        out
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test. Returns the entry distance along `dir` (normalized), or
    /// `None` if the ray misses or the hit is beyond `max_distance`.
    pub fn ray_intersection(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < 1e-8 {
                // Parallel to this slab
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_encapsulate() {
        let mut a = Aabb::unit();
        a.encapsulate(&Aabb::from_center_size(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE));
        assert_eq!(a.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(a.max, Vec3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_transformed_yaw_swaps_extents() {
        let b = Aabb::new(Vec3::new(-2.0, 0.0, -0.5), Vec3::new(2.0, 1.0, 0.5));
        let w = b.transformed(Vec3::new(0.0, 0.0, -5.0), FRAC_PI_2, Vec3::ONE);
        assert!((w.size().x - 1.0).abs() < 0.001);
        assert!((w.size().z - 4.0).abs() < 0.001);
        assert!((w.center().z + 5.0).abs() < 0.001);
    }

    #[test]
    fn test_ray_hits_box_in_front() {
        let b = Aabb::from_center_size(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE);
        let t = b.ray_intersection(Vec3::ZERO, Vec3::NEG_Z, 100.0).unwrap();
        assert!((t - 4.5).abs() < 0.001);
    }

    #[test]
    fn test_ray_misses_box_behind_or_far() {
        let b = Aabb::from_center_size(Vec3::new(0.0, 0.0, 5.0), Vec3::ONE);
        assert!(b.ray_intersection(Vec3::ZERO, Vec3::NEG_Z, 100.0).is_none());

        let b = Aabb::from_center_size(Vec3::new(0.0, 0.0, -50.0), Vec3::ONE);
        assert!(b.ray_intersection(Vec3::ZERO, Vec3::NEG_Z, 10.0).is_none());
    }

    #[test]
    fn test_ray_origin_inside_box() {
        let b = Aabb::unit();
        assert_eq!(b.ray_intersection(Vec3::ZERO, Vec3::X, 10.0), Some(0.0));
    }
}
