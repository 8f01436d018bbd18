//! Rewrites a sweep's displacement so the character walks along slopes instead of stopping
//! at them or hopping down them.

use crate::{
    collisions::CollisionState,
    query::{RayCaster, RayHit},
    sweep::{ANGLE_EPSILON, Sweep, horizontal, same_angle, surface_angle},
    prelude::*,
};

/// Turns horizontal travel into travel up a slope of `slope_angle` radians.
///
/// Does nothing and returns `false` when the character is already rising faster than the
/// slope would lift it, e.g. when jumping.
pub fn climb_slope(
    displacement: &mut Vec2,
    slope_angle: f32,
    slope_normal: Vec2,
    collisions: &mut CollisionState,
) -> bool {
    let distance = displacement.x.abs();
    let climb_y = slope_angle.sin() * distance;
    if displacement.y > climb_y {
        return false;
    }
    displacement.y = climb_y;
    displacement.x = slope_angle.cos() * distance * displacement.x.signum();
    collisions.below = true;
    collisions.climbing_slope = true;
    collisions.slope_angle = slope_angle;
    collisions.slope_normal = slope_normal;
    true
}

impl<Q: RayCaster + ?Sized> Sweep<'_, Q> {
    /// Climb step for the first horizontal ray hitting a walkable slope.
    pub(crate) fn climb_from_hit(
        &self,
        displacement: &mut Vec2,
        intended: Vec2,
        hit: RayHit,
        slope_angle: f32,
        collisions: &mut CollisionState,
    ) {
        if collisions.descending_slope {
            collisions.descending_slope = false;
            *displacement = intended;
        }
        let direction = displacement.x.signum();

        // Walk flat up to the foot of a new slope, only climb the rest.
        let mut distance_to_slope_start = 0.0;
        if !same_angle(slope_angle, collisions.slope_angle_prev) {
            distance_to_slope_start = hit.distance - self.settings.skin_width;
            displacement.x -= distance_to_slope_start * direction;
        }
        climb_slope(displacement, slope_angle, hit.normal, collisions);
        displacement.x += distance_to_slope_start * direction;
    }

    /// Keeps the character glued to a slope it walks down, rather than stepping off into the air.
    ///
    /// Only called for downward displacements with horizontal travel. The ray starts at the
    /// trailing (uphill) bottom corner, not the leading one, since only that corner is within
    /// `tan(angle) * |x|` of a slope falling away in the travel direction.
    pub(crate) fn descend_slope(&self, displacement: &mut Vec2, collisions: &mut CollisionState) {
        let direction = displacement.x.signum();
        let origin = self.origins.bottom(-direction);
        let Some(hit) = self.cast(origin, Dir2::NEG_Y, f32::MAX) else {
            return;
        };

        let slope_angle = surface_angle(hit.normal);
        if slope_angle <= ANGLE_EPSILON || slope_angle > self.settings.max_slope_angle {
            return;
        }
        if hit.normal.x.signum() != direction {
            return;
        }
        let distance = displacement.x.abs();
        if hit.distance - self.settings.skin_width > slope_angle.tan() * distance {
            // too far above the slope, we fall instead
            return;
        }

        displacement.x = slope_angle.cos() * distance * direction;
        displacement.y -= slope_angle.sin() * distance;
        collisions.slope_angle = slope_angle;
        collisions.slope_normal = hit.normal;
        collisions.descending_slope = true;
        collisions.below = true;
    }

    /// After climbing, looks ahead from the new height for a slope of a different angle and
    /// stops at its foot.
    pub(crate) fn detect_slope_change(
        &self,
        displacement: &mut Vec2,
        collisions: &mut CollisionState,
    ) {
        let skin = self.settings.skin_width;
        let direction = displacement.x.signum();
        let ray_length = displacement.x.abs() + skin;
        let origin = self.origins.bottom(direction) + Vec2::Y * displacement.y;
        let Some(hit) = self.cast(origin, horizontal(direction), ray_length) else {
            return;
        };
        let slope_angle = surface_angle(hit.normal);
        if !same_angle(slope_angle, collisions.slope_angle) {
            displacement.x = (hit.distance - skin) * direction;
            collisions.slope_angle = slope_angle;
            collisions.slope_normal = hit.normal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::SegmentWorld,
        sweep::tests::{SKIN, resolve},
    };
    use core::f32::consts::FRAC_PI_4;

    /// A straight slope of `degrees` that passes through `through`, running `back` units
    /// behind that point and `ahead` units past it.
    fn ramp(through: Vec2, degrees: f32, back: f32, ahead: f32) -> SegmentWorld {
        let dir = Vec2::from_angle(degrees.to_radians());
        SegmentWorld::new().with_segment(through - dir * back, through + dir * ahead)
    }

    #[test]
    fn climb_converts_travel_along_the_slope() {
        let mut collisions = CollisionState::default();
        let mut displacement = vec2(-0.2, 0.0);
        let normal = vec2(FRAC_PI_4.sin(), FRAC_PI_4.cos());
        assert!(climb_slope(&mut displacement, FRAC_PI_4, normal, &mut collisions));
        let leg = FRAC_PI_4.sin() * 0.2;
        assert!((displacement.x + leg).abs() < 1e-6);
        assert!((displacement.y - leg).abs() < 1e-6);
        assert!(collisions.below && collisions.climbing_slope);
        assert_eq!(collisions.slope_angle, FRAC_PI_4);
    }

    #[test]
    fn climb_yields_to_a_jump() {
        let mut collisions = CollisionState::default();
        let mut displacement = vec2(0.2, 0.5);
        assert!(!climb_slope(&mut displacement, FRAC_PI_4, Vec2::Y, &mut collisions));
        assert_eq!(displacement, vec2(0.2, 0.5));
        assert!(!collisions.climbing_slope);
    }

    #[test]
    fn walks_up_a_gentle_slope() {
        // rising to the right, touching the bottom right ray origin
        let world = ramp(vec2(1.0, SKIN), 30.0, 0.1, 10.0);
        let theta = 30f32.to_radians();
        for intent_y in [0.0, -0.01] {
            let (out, collisions) = resolve(&world, vec2(0.1, intent_y));
            assert!((out.x - theta.cos() * 0.1).abs() < 1e-5, "{out}");
            assert!((out.y - theta.sin() * 0.1).abs() < 1e-5, "{out}");
            assert!(collisions.below);
            assert!(collisions.climbing_slope);
            assert!(!collisions.right);
            assert!((collisions.slope_angle - theta).abs() < 1e-4);
        }
    }

    #[test]
    fn climb_stops_where_the_slope_steepens() {
        // 30 degrees from the bottom right ray origin, kinking to 45 degrees just ahead
        let theta = 30f32.to_radians();
        let foot = vec2(1.0, SKIN);
        let kink = foot + vec2(0.04, 0.04 * theta.tan());
        let world = SegmentWorld::new()
            .with_segment(foot - Vec2::from_angle(theta) * 0.1, kink)
            .with_segment(kink, kink + vec2(2.0, 2.0));

        let (out, collisions) = resolve(&world, vec2(0.1, 0.0));
        // climbed 0.05 up the first slope, then the look-ahead from that height meets
        // the steeper one and stops there
        let climb = theta.sin() * 0.1;
        let steeper_x = kink.x + (foot.y + climb - kink.y);
        let origin_x = 1.0 - SKIN;
        assert!((out.y - climb).abs() < 1e-5, "{out}");
        assert!((out.x - (steeper_x - origin_x - SKIN)).abs() < 1e-4, "{out}");
        assert!(out.x < theta.cos() * 0.1);
        assert!((collisions.slope_angle - 45f32.to_radians()).abs() < 1e-4);
        assert!(collisions.climbing_slope);
        assert!(collisions.below);
    }

    #[test]
    fn steep_slope_is_a_wall() {
        let world = ramp(vec2(1.2, SKIN), 70.0, 0.1, 10.0);
        let (out, collisions) = resolve(&world, vec2(0.5, 0.0));
        assert!(!collisions.climbing_slope);
        assert!(collisions.right);
        assert!((out.x - 0.2).abs() < 1e-5);
        assert_eq!(out.y, 0.0);
    }

    #[test]
    fn jumping_into_a_slope_does_not_climb() {
        let world = ramp(vec2(1.0, SKIN), 30.0, 0.1, 10.0);
        let (out, collisions) = resolve(&world, vec2(0.1, 0.5));
        assert!(!collisions.climbing_slope);
        assert!(collisions.right);
        assert!(out.x.abs() < 1e-5);
    }

    #[test]
    fn walks_down_a_slope_without_leaving_it() {
        // falling to the right, touching the bottom left ray origin
        let world = ramp(vec2(SKIN, 0.0), -30.0, 1.0, 10.0);
        let theta = 30f32.to_radians();
        let (out, collisions) = resolve(&world, vec2(0.1, -0.01));
        assert!((out.x - theta.cos() * 0.1).abs() < 1e-5, "{out}");
        assert!((out.y + theta.sin() * 0.1).abs() < 1e-4, "{out}");
        assert!(collisions.descending_slope);
        assert!(collisions.below);
        assert!(!collisions.climbing_slope);
    }

    #[test]
    fn slope_far_below_is_not_descended() {
        let world = ramp(vec2(SKIN, -2.0), -30.0, 1.0, 10.0);
        let (out, collisions) = resolve(&world, vec2(0.1, -0.01));
        assert_eq!(out, vec2(0.1, -0.01));
        assert!(!collisions.descending_slope);
        assert!(!collisions.below);
    }

    #[test]
    fn slopes_can_be_disabled() {
        let world = ramp(vec2(1.0, SKIN), 30.0, 0.1, 10.0);
        let filter = SpatialQueryFilter::default();
        let bounds = crate::sweep::tests::bounds();
        let spacing = crate::probe::RaySpacing::for_bounds(bounds, SKIN, 0.25).unwrap();
        let settings = crate::sweep::SweepSettings {
            slopes: false,
            ..crate::sweep::tests::settings()
        };
        let sweep = Sweep::new(&world, &filter, settings, spacing, bounds);
        let mut collisions = CollisionState::default();
        let out = sweep.resolve(vec2(0.1, 0.0), &mut collisions);
        assert!(!collisions.climbing_slope);
        assert!(collisions.right);
        assert!(out.x.abs() < 1e-5);
    }
}
