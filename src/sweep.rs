//! Horizontal and vertical raycast sweeps that clamp a displacement against the level.

use crate::{
    collisions::CollisionState,
    probe::{Bounds, RayOrigins, RaySpacing},
    query::{RayCaster, RayHit},
    prelude::*,
};

pub(crate) const ANGLE_EPSILON: f32 = 1.0e-4;

/// The parts of [`CharacterController`] the sweep reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepSettings {
    pub skin_width: f32,
    /// Steepest surface, in radians from world up, that is still treated as a slope.
    pub max_slope_angle: f32,
    pub slopes: bool,
}

impl From<&CharacterController> for SweepSettings {
    fn from(cfg: &CharacterController) -> Self {
        Self {
            skin_width: cfg.skin_width,
            max_slope_angle: cfg.max_slope_angle,
            slopes: cfg.slopes,
        }
    }
}

/// One sweep of a character's box through the level.
///
/// Built fresh every tick, since the ray origins follow the character.
pub struct Sweep<'a, Q: RayCaster + ?Sized> {
    pub(crate) query: &'a Q,
    pub(crate) filter: &'a SpatialQueryFilter,
    pub(crate) settings: SweepSettings,
    pub(crate) spacing: RaySpacing,
    pub(crate) origins: RayOrigins,
}

impl<'a, Q: RayCaster + ?Sized> Sweep<'a, Q> {
    pub fn new(
        query: &'a Q,
        filter: &'a SpatialQueryFilter,
        settings: SweepSettings,
        spacing: RaySpacing,
        bounds: Bounds,
    ) -> Self {
        Self {
            query,
            filter,
            settings,
            spacing,
            origins: RayOrigins::new(bounds, settings.skin_width),
        }
    }

    pub fn origins(&self) -> &RayOrigins {
        &self.origins
    }

    /// Clamps `displacement` so the box does not penetrate the level, sliding it up and
    /// down slopes, and records what it touched in `collisions`.
    pub fn resolve(&self, displacement: Vec2, collisions: &mut CollisionState) -> Vec2 {
        collisions.reset();
        let intended = displacement;
        let mut displacement = displacement;

        if self.settings.slopes && displacement.y < 0.0 && displacement.x != 0.0 {
            self.descend_slope(&mut displacement, collisions);
        }
        if displacement.x != 0.0 {
            self.horizontal(&mut displacement, intended, collisions);
        }
        if displacement.y != 0.0 {
            self.vertical(&mut displacement, collisions);
        }
        displacement
    }

    fn horizontal(
        &self,
        displacement: &mut Vec2,
        intended: Vec2,
        collisions: &mut CollisionState,
    ) {
        let skin = self.settings.skin_width;
        let direction = displacement.x.signum();
        let mut ray_length = displacement.x.abs() + skin;
        if displacement.x.abs() < skin {
            // still find walls we are pressed against
            ray_length = 2.0 * skin;
        }

        for i in 0..self.spacing.horizontal_count {
            let origin = self.origins.bottom(direction)
                + Vec2::Y * (self.spacing.horizontal_spacing * i as f32);
            let Some(hit) = self.cast(origin, horizontal(direction), ray_length) else {
                continue;
            };

            let slope_angle = surface_angle(hit.normal);
            let walkable = slope_angle <= self.settings.max_slope_angle;
            if i == 0 && walkable && self.settings.slopes {
                self.climb_from_hit(displacement, intended, hit, slope_angle, collisions);
            }

            if !collisions.climbing_slope || !walkable {
                displacement.x = (hit.distance - skin) * direction;
                ray_length = hit.distance;
                if collisions.climbing_slope {
                    displacement.y = collisions.slope_angle.tan() * displacement.x.abs();
                }
                collisions.set_horizontal(direction);
            }
        }
    }

    fn vertical(&self, displacement: &mut Vec2, collisions: &mut CollisionState) {
        let skin = self.settings.skin_width;
        let direction = displacement.y.signum();
        let mut ray_length = displacement.y.abs() + skin;

        for i in 0..self.spacing.vertical_count {
            let corner = if direction < 0.0 {
                self.origins.bottom_left
            } else {
                self.origins.top_left
            };
            let origin = corner
                + Vec2::X * (self.spacing.vertical_spacing * i as f32 + displacement.x);
            let Some(hit) = self.cast(origin, vertical(direction), ray_length) else {
                continue;
            };

            displacement.y = (hit.distance - skin) * direction;
            ray_length = hit.distance;
            if collisions.climbing_slope && collisions.slope_angle > ANGLE_EPSILON {
                displacement.x = displacement.y / collisions.slope_angle.tan()
                    * displacement.x.signum();
            }
            collisions.set_vertical(direction);
        }

        if collisions.climbing_slope {
            self.detect_slope_change(displacement, collisions);
        }
    }

    /// Looks for a wall right beside the box, on the `direction` side, without moving it.
    ///
    /// [`Self::resolve`] casts no horizontal rays on ticks without horizontal travel, such as while
    /// wall stick holds the character in place. This keeps `left`/`right` up to date on those
    /// ticks. `offset` is the displacement already resolved this tick.
    pub fn touch_wall(
        &self,
        direction: f32,
        offset: Vec2,
        collisions: &mut CollisionState,
    ) -> bool {
        let ray_length = 2.0 * self.settings.skin_width;
        for i in 0..self.spacing.horizontal_count {
            let origin = self.origins.bottom(direction)
                + offset
                + Vec2::Y * (self.spacing.horizontal_spacing * i as f32);
            let Some(hit) = self.cast(origin, horizontal(direction), ray_length) else {
                continue;
            };
            let walkable = self.settings.slopes
                && surface_angle(hit.normal) <= self.settings.max_slope_angle;
            if !walkable {
                collisions.set_horizontal(direction);
                return true;
            }
        }
        false
    }

    pub(crate) fn cast(&self, origin: Vec2, direction: Dir2, max_distance: f32) -> Option<RayHit> {
        self.query.cast(origin, direction, max_distance, self.filter)
    }
}

/// Angle between `normal` and world up, in radians.
pub fn surface_angle(normal: Vec2) -> f32 {
    normal
        .normalize_or_zero()
        .dot(Vec2::Y)
        .clamp(-1.0, 1.0)
        .acos()
}

pub(crate) fn same_angle(a: f32, b: f32) -> bool {
    (a - b).abs() <= ANGLE_EPSILON
}

pub(crate) fn horizontal(direction: f32) -> Dir2 {
    if direction < 0.0 { Dir2::NEG_X } else { Dir2::X }
}

fn vertical(direction: f32) -> Dir2 {
    if direction < 0.0 { Dir2::NEG_Y } else { Dir2::Y }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::query::SegmentWorld;

    pub(crate) const SKIN: f32 = 0.015;

    pub(crate) fn settings() -> SweepSettings {
        SweepSettings {
            skin_width: SKIN,
            max_slope_angle: 60f32.to_radians(),
            slopes: true,
        }
    }

    /// A 1x2 box standing with its bottom left corner on the origin.
    pub(crate) fn bounds() -> Bounds {
        Bounds::new(Vec2::ZERO, vec2(1.0, 2.0))
    }

    pub(crate) fn resolve(world: &SegmentWorld, displacement: Vec2) -> (Vec2, CollisionState) {
        let filter = SpatialQueryFilter::default();
        let spacing = RaySpacing::for_bounds(bounds(), SKIN, 0.25).unwrap();
        let sweep = Sweep::new(world, &filter, settings(), spacing, bounds());
        let mut collisions = CollisionState::default();
        let out = sweep.resolve(displacement, &mut collisions);
        (out, collisions)
    }

    #[test]
    fn no_horizontal_intent_leaves_x_alone() {
        // wall touching the right side
        let world = SegmentWorld::new().with_segment(vec2(1.0, -1.0), vec2(1.0, 5.0));
        let (out, collisions) = resolve(&world, vec2(0.0, 0.5));
        assert_eq!(out.x, 0.0);
        assert!(!collisions.left && !collisions.right);
    }

    #[test]
    fn touch_wall_finds_an_adjacent_wall_without_moving() {
        let world = SegmentWorld::new().with_segment(vec2(0.0, -5.0), vec2(0.0, 5.0));
        let filter = SpatialQueryFilter::default();
        let spacing = RaySpacing::for_bounds(bounds(), SKIN, 0.25).unwrap();
        let sweep = Sweep::new(&world, &filter, settings(), spacing, bounds());

        // sliding straight down, flush against the wall on the left
        let mut collisions = CollisionState::default();
        let out = sweep.resolve(vec2(0.0, -0.1), &mut collisions);
        assert_eq!(out, vec2(0.0, -0.1));
        assert!(!collisions.left);

        assert!(sweep.touch_wall(-1.0, out, &mut collisions));
        assert!(collisions.left && !collisions.right);

        // nothing on the right
        let mut collisions = CollisionState::default();
        assert!(!sweep.touch_wall(1.0, out, &mut collisions));
        assert!(!collisions.touching_wall());
    }

    #[test]
    fn touch_wall_ignores_walkable_slopes() {
        let dir = Vec2::from_angle(150f32.to_radians());
        // rising to the left from the bottom left ray origin
        let foot = vec2(0.0, SKIN);
        let world = SegmentWorld::new().with_segment(foot - dir * 0.1, foot + dir * 5.0);
        let filter = SpatialQueryFilter::default();
        let spacing = RaySpacing::for_bounds(bounds(), SKIN, 0.25).unwrap();
        let sweep = Sweep::new(&world, &filter, settings(), spacing, bounds());
        let mut collisions = CollisionState::default();
        assert!(!sweep.touch_wall(-1.0, Vec2::ZERO, &mut collisions));
        assert!(!collisions.left);
    }

    #[test]
    fn falling_onto_flat_floor_stops_at_skin() {
        let world = SegmentWorld::new().with_segment(vec2(-5.0, -0.5), vec2(5.0, -0.5));
        let (out, collisions) = resolve(&world, vec2(0.0, -1.0));
        // origin is 0.515 above the floor
        assert!((out.y + (0.515 - SKIN)).abs() < 1e-5);
        assert_eq!(out.x, 0.0);
        assert!(collisions.below);
        assert!(!collisions.above);
    }

    #[test]
    fn open_air_keeps_full_displacement() {
        let world = SegmentWorld::new().with_segment(vec2(-5.0, -5.0), vec2(5.0, -5.0));
        let (out, collisions) = resolve(&world, vec2(0.3, -0.4));
        assert_eq!(out, vec2(0.3, -0.4));
        assert_eq!(collisions, CollisionState::default());
    }

    #[test]
    fn wall_clamps_horizontal_motion() {
        let world = SegmentWorld::new().with_segment(vec2(1.3, -1.0), vec2(1.3, 5.0));
        let (out, collisions) = resolve(&world, vec2(0.5, 0.0));
        assert!((out.x - 0.3).abs() < 1e-5);
        assert!(collisions.right);
        assert!(!collisions.left);
        assert!(!collisions.climbing_slope);

        let world = SegmentWorld::new().with_segment(vec2(-0.2, -1.0), vec2(-0.2, 5.0));
        let (out, collisions) = resolve(&world, vec2(-0.5, 0.0));
        assert!((out.x + 0.2).abs() < 1e-5);
        assert!(collisions.left);
    }

    #[test]
    fn ceiling_clamps_upward_motion() {
        let world = SegmentWorld::new().with_segment(vec2(-5.0, 2.5), vec2(5.0, 2.5));
        let (out, collisions) = resolve(&world, vec2(0.0, 1.0));
        assert!((out.y - 0.5).abs() < 1e-5);
        assert!(collisions.above);
        assert!(!collisions.below);
    }

    #[test]
    fn nearest_hit_across_the_fan_wins() {
        // a knee-high block in front of a taller, farther wall
        let world = SegmentWorld::new()
            .with_segment(vec2(1.5, -1.0), vec2(1.5, 5.0))
            .with_box(vec2(1.2, -1.0), vec2(1.4, 0.4));
        let (out, collisions) = resolve(&world, vec2(0.8, 0.0));
        assert!((out.x - 0.2).abs() < 1e-5);
        assert!(collisions.right);
    }

    #[test]
    fn wall_contact_found_when_barely_moving() {
        let world = SegmentWorld::new().with_segment(vec2(1.01, -1.0), vec2(1.01, 5.0));
        let (_, collisions) = resolve(&world, vec2(0.001, 0.0));
        assert!(collisions.right);
    }

    #[test]
    fn horizontal_offset_shifts_vertical_rays() {
        // floor only exists to the right of the box
        let world = SegmentWorld::new().with_segment(vec2(1.2, -0.5), vec2(5.0, -0.5));
        let (out, collisions) = resolve(&world, vec2(0.0, -1.0));
        assert_eq!(out.y, -1.0);
        assert!(!collisions.below);

        let (out, collisions) = resolve(&world, vec2(0.5, -1.0));
        assert!(collisions.below);
        assert!((out.y + (0.515 - SKIN)).abs() < 1e-5);
    }

    #[test]
    fn masked_out_geometry_is_ignored() {
        let mut world = SegmentWorld::new();
        world.add_segment(vec2(-5.0, -0.5), vec2(5.0, -0.5), LayerMask(0b100));
        let filter = SpatialQueryFilter::from_mask(LayerMask(0b001));
        let spacing = RaySpacing::for_bounds(bounds(), SKIN, 0.25).unwrap();
        let sweep = Sweep::new(&world, &filter, settings(), spacing, bounds());
        let mut collisions = CollisionState::default();
        let out = sweep.resolve(vec2(0.0, -1.0), &mut collisions);
        assert_eq!(out, vec2(0.0, -1.0));
        assert!(!collisions.below);
    }

    #[test]
    fn surface_angles() {
        assert!(surface_angle(Vec2::Y).abs() < 1e-6);
        assert!((surface_angle(Vec2::X) - core::f32::consts::FRAC_PI_2).abs() < 1e-6);
        let thirty = Vec2::from_angle(120f32.to_radians());
        assert!((surface_angle(thirty) - 30f32.to_radians()).abs() < 1e-5);
    }
}
