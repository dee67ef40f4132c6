//! Collision detection and response
//!
//! Every hit test in the game goes through one axis-aligned box type. Enemy
//! pairs that get too close are pushed apart with an elastic-like kick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Enemy, Projectile};
use crate::consts::*;
use crate::distance_and_angle;

/// Axis-aligned bounding box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn square(center: Vec2, half_size: f32) -> Self {
        Self::new(center, Vec2::splat(half_size))
    }

    /// Box from its top-left corner and size (screen coordinates, y down)
    pub fn from_corner(min: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self::new(min + half, half)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Strict overlap: boxes that only share an edge do not collide
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_max.x > b_min.x && a_min.x < b_max.x && a_max.y > b_min.y && a_min.y < b_max.y
    }

    /// Strict containment: points on the edge are outside
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x > min.x && point.x < max.x && point.y > min.y && point.y < max.y
    }
}

/// Push apart a pair of enemies whose centers are closer than the separation distance.
///
/// Both velocities are reflected; the second enemy gets the stronger kick.
/// Each enemy then moves half the overlap along the line between centers.
/// Returns true if the pair was touching.
pub fn separate_pair(first: &mut Enemy, second: &mut Enemy) -> bool {
    let (distance, angle) = distance_and_angle(first.pos, second.pos);
    if distance >= SEPARATION_DISTANCE {
        return false;
    }

    first.vel = -first.vel * FIRST_COLLIDER_KICK;
    second.vel = -second.vel * SECOND_COLLIDER_KICK;

    let push = (SEPARATION_DISTANCE - distance) / 2.0;
    let dir = Vec2::new(angle.cos(), angle.sin());
    first.pos -= dir * push;
    second.pos += dir * push;
    true
}

/// Resolve every unordered pair once, in iteration order.
///
/// No relaxation: clusters of three or more settle over several ticks.
/// Returns the number of pairs that were touching.
pub fn resolve_enemy_separation(enemies: &mut [Enemy]) -> usize {
    let mut touching = 0;
    for i in 0..enemies.len() {
        let (head, tail) = enemies.split_at_mut(i + 1);
        let first = &mut head[i];
        for second in tail.iter_mut() {
            if separate_pair(first, second) {
                touching += 1;
            }
        }
    }
    touching
}

/// Indices of projectiles currently inside `enemy`
pub fn projectiles_hitting(enemy: &Enemy, projectiles: &[Projectile]) -> Vec<usize> {
    projectiles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.hits(enemy))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Arena;
    use proptest::prelude::*;

    fn arena() -> Arena {
        Arena::new(1000.0, 2000.0).unwrap()
    }

    #[test]
    fn test_aabb_overlap_by_one_unit() {
        let a = Aabb::square(Vec2::new(0.0, 0.0), 50.0);
        let b = Aabb::square(Vec2::new(99.0, 99.0), 50.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_aabb_touching_edges_do_not_overlap() {
        let a = Aabb::square(Vec2::new(0.0, 0.0), 50.0);
        let b = Aabb::square(Vec2::new(100.0, 0.0), 50.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_aabb_from_corner() {
        let b = Aabb::from_corner(Vec2::new(900.0, 0.0), Vec2::splat(100.0));
        assert_eq!(b.min(), Vec2::new(900.0, 0.0));
        assert_eq!(b.max(), Vec2::new(1000.0, 100.0));
        assert!(b.contains_point(Vec2::new(950.0, 50.0)));
        assert!(!b.contains_point(Vec2::new(850.0, 50.0)));
    }

    #[test]
    fn test_separate_pair_reflects_and_pushes() {
        let arena = arena();
        let mut a = Enemy::new(Vec2::new(500.0, 500.0), Vec2::new(2.0, 1.0), &arena);
        let mut b = Enemy::new(Vec2::new(560.0, 500.0), Vec2::new(-2.0, 1.0), &arena);

        assert!(separate_pair(&mut a, &mut b));
        assert!((a.vel - Vec2::new(-2.1, -1.05)).length() < 1e-5);
        assert!((b.vel - Vec2::new(2.2, -1.1)).length() < 1e-5);
        // Overlap 40 → each moves 20 along x
        assert!((a.pos.x - 480.0).abs() < 1e-4);
        assert!((b.pos.x - 580.0).abs() < 1e-4);
    }

    #[test]
    fn test_separate_pair_far_apart_untouched() {
        let arena = arena();
        let mut a = Enemy::new(Vec2::new(100.0, 500.0), Vec2::new(2.0, 1.0), &arena);
        let mut b = Enemy::new(Vec2::new(300.0, 500.0), Vec2::new(-2.0, 1.0), &arena);
        let (a0, b0) = (a, b);
        assert!(!separate_pair(&mut a, &mut b));
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }

    #[test]
    fn test_separate_coincident_centers() {
        let arena = arena();
        let mut a = Enemy::new(Vec2::new(500.0, 500.0), Vec2::new(1.5, 1.5), &arena);
        let mut b = Enemy::new(Vec2::new(500.0, 500.0), Vec2::new(-1.5, 2.0), &arena);
        assert!(separate_pair(&mut a, &mut b));
        assert!((b.pos - a.pos).length() > 99.0);
    }

    #[test]
    fn test_resolve_counts_pairs() {
        let arena = arena();
        let mut enemies = vec![
            Enemy::new(Vec2::new(100.0, 500.0), Vec2::new(2.0, 2.0), &arena),
            Enemy::new(Vec2::new(150.0, 500.0), Vec2::new(2.0, 2.0), &arena),
            Enemy::new(Vec2::new(800.0, 500.0), Vec2::new(2.0, 2.0), &arena),
        ];
        assert_eq!(resolve_enemy_separation(&mut enemies), 1);
        assert_eq!(enemies[2].vel, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_projectiles_hitting() {
        let arena = arena();
        let enemy = Enemy::new(Vec2::new(500.0, 500.0), Vec2::ZERO, &arena);
        let shots = [
            Projectile {
                pos: Vec2::new(500.0, 520.0),
            },
            Projectile {
                pos: Vec2::new(700.0, 520.0),
            },
            Projectile {
                pos: Vec2::new(510.0, 480.0),
            },
        ];
        assert_eq!(projectiles_hitting(&enemy, &shots), vec![0, 2]);
    }

    proptest! {
        #[test]
        fn prop_separation_increases_distance(
            ax in 200.0f32..800.0,
            ay in 200.0f32..800.0,
            dist in 0.5f32..99.0,
            angle in 0.0f32..std::f32::consts::TAU,
            vax in prop_oneof![-5.0f32..-0.1, 0.1f32..5.0],
            vay in prop_oneof![-5.0f32..-0.1, 0.1f32..5.0],
            vbx in prop_oneof![-5.0f32..-0.1, 0.1f32..5.0],
            vby in prop_oneof![-5.0f32..-0.1, 0.1f32..5.0],
        ) {
            let arena = arena();
            let a_pos = Vec2::new(ax, ay);
            let b_pos = a_pos + Vec2::new(angle.cos(), angle.sin()) * dist;
            let mut a = Enemy::new(a_pos, Vec2::new(vax, vay), &arena);
            let mut b = Enemy::new(b_pos, Vec2::new(vbx, vby), &arena);
            let before = (b.pos - a.pos).length();

            prop_assert!(separate_pair(&mut a, &mut b));

            let after = (b.pos - a.pos).length();
            prop_assert!(after > before);
            prop_assert!(a.vel != Vec2::ZERO);
            prop_assert!(b.vel != Vec2::ZERO);
        }
    }
}
