//! Ray origins and ray spacing derived from the character's bounding box.

use crate::{
    error::{ConfigError, positive},
    prelude::*,
};

/// Axis-aligned bounds of the character's collider in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Moves every side inward by `amount`.
    #[must_use]
    pub fn shrink(self, amount: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(amount),
            max: self.max - Vec2::splat(amount),
        }
    }

    #[must_use]
    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

impl From<ColliderAabb> for Bounds {
    fn from(aabb: ColliderAabb) -> Self {
        Self::new(aabb.min, aabb.max)
    }
}

/// The four corners rays are cast from. Recomputed before every sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayOrigins {
    pub bottom_left: Vec2,
    pub bottom_right: Vec2,
    pub top_left: Vec2,
    pub top_right: Vec2,
}

impl RayOrigins {
    /// Corners of `bounds` after moving each side inward by `skin_width`.
    pub fn new(bounds: Bounds, skin_width: f32) -> Self {
        let Bounds { min, max } = bounds.shrink(skin_width);
        Self {
            bottom_left: min,
            bottom_right: vec2(max.x, min.y),
            top_left: vec2(min.x, max.y),
            top_right: max,
        }
    }

    /// The bottom corner on the side `direction` points to.
    pub fn bottom(&self, direction: f32) -> Vec2 {
        if direction < 0.0 {
            self.bottom_left
        } else {
            self.bottom_right
        }
    }
}

/// How many parallel rays each pass casts, and how far apart they are.
///
/// Horizontal rays are stacked along the box height, vertical rays along its width.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct RaySpacing {
    pub horizontal_count: usize,
    pub vertical_count: usize,
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
}

impl RaySpacing {
    /// Fits rays roughly `target_spacing` apart into a box of `size`.
    ///
    /// Each count is `round(dimension / target_spacing)`, but never less than 2 so
    /// both edges of the box are always covered.
    pub fn new(size: Vec2, target_spacing: f32) -> Result<Self, ConfigError> {
        let target_spacing = positive("ray_spacing", target_spacing)?;
        if !(size.x > 0.0 && size.y > 0.0) || !size.is_finite() {
            return Err(ConfigError::DegenerateBounds {
                size,
                skin_width: 0.0,
            });
        }
        let horizontal_count = ray_count(size.y, target_spacing);
        let vertical_count = ray_count(size.x, target_spacing);
        Ok(Self {
            horizontal_count,
            vertical_count,
            horizontal_spacing: size.y / (horizontal_count - 1) as f32,
            vertical_spacing: size.x / (vertical_count - 1) as f32,
        })
    }

    /// Spacing for the rays cast from the corners of `bounds` shrunk by `skin_width`.
    pub fn for_bounds(
        bounds: Bounds,
        skin_width: f32,
        target_spacing: f32,
    ) -> Result<Self, ConfigError> {
        let skin_width = positive("skin_width", skin_width)?;
        let size = bounds.shrink(skin_width).size();
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(ConfigError::DegenerateBounds {
                size: bounds.size(),
                skin_width,
            });
        }
        Self::new(size, target_spacing)
    }
}

fn ray_count(dimension: f32, target_spacing: f32) -> usize {
    ((dimension / target_spacing).round() as usize).max(2)
}
