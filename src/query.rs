//! The ray query the collision sweep runs against the level.
//!
//! [`SpatialQuery`] is what the plugin uses at runtime. [`SegmentWorld`] is a static
//! list of line segments for headless simulation, e.g. on a server or in tests.

use crate::prelude::*;

/// Nearest surface hit by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Outward normal of the surface that was hit.
    pub normal: Vec2,
}

/// Casts rays against static geometry.
///
/// Must be side-effect free: the sweep calls it once per ray, many times per tick.
pub trait RayCaster {
    fn cast(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        filter: &SpatialQueryFilter,
    ) -> Option<RayHit>;
}

impl RayCaster for SpatialQuery<'_, '_> {
    fn cast(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        filter: &SpatialQueryFilter,
    ) -> Option<RayHit> {
        // Solid, so a ray starting inside level geometry reports a hit at distance 0.
        self.cast_ray(origin, direction, max_distance, true, filter)
            .map(|hit| RayHit {
                distance: hit.distance,
                normal: hit.normal,
            })
    }
}

impl<T: RayCaster + ?Sized> RayCaster for &T {
    fn cast(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        filter: &SpatialQueryFilter,
    ) -> Option<RayHit> {
        (**self).cast(origin, direction, max_distance, filter)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
    pub layers: LayerMask,
}

/// Level geometry made of line segments.
#[derive(Clone, Debug, Default)]
pub struct SegmentWorld {
    segments: Vec<Segment>,
}

impl SegmentWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn add_segment(&mut self, a: Vec2, b: Vec2, layers: impl Into<LayerMask>) -> &mut Self {
        self.segments.push(Segment {
            a,
            b,
            layers: layers.into(),
        });
        self
    }

    #[must_use]
    pub fn with_segment(mut self, a: Vec2, b: Vec2) -> Self {
        self.add_segment(a, b, LayerMask::DEFAULT);
        self
    }

    /// Adds the four sides of an axis-aligned box.
    #[must_use]
    pub fn with_box(mut self, min: Vec2, max: Vec2) -> Self {
        let corners = [min, vec2(max.x, min.y), max, vec2(min.x, max.y)];
        for i in 0..corners.len() {
            self.add_segment(
                corners[i],
                corners[(i + 1) % corners.len()],
                LayerMask::DEFAULT,
            );
        }
        self
    }
}

impl RayCaster for SegmentWorld {
    fn cast(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        filter: &SpatialQueryFilter,
    ) -> Option<RayHit> {
        self.segments
            .iter()
            .filter(|segment| filter.mask.0 & segment.layers.0 != 0)
            .filter_map(|segment| intersect(origin, *direction, segment))
            .filter(|hit| hit.distance <= max_distance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

fn intersect(origin: Vec2, direction: Vec2, segment: &Segment) -> Option<RayHit> {
    let edge = segment.b - segment.a;
    let denom = direction.perp_dot(edge);
    if denom.abs() <= f32::EPSILON {
        // parallel
        return None;
    }
    let to_start = segment.a - origin;
    let distance = to_start.perp_dot(edge) / denom;
    let along = to_start.perp_dot(direction) / denom;
    if distance < 0.0 || !(0.0..=1.0).contains(&along) {
        return None;
    }
    let mut normal = edge.perp().normalize();
    if normal.dot(direction) > 0.0 {
        normal = -normal;
    }
    Some(RayHit { distance, normal })
}
