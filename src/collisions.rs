use crate::prelude::*;

/// Contacts found by the most recent sweep.
///
/// Only written while a character is being moved. Everything else should treat it as a snapshot
/// of the last tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct CollisionState {
    pub above: bool,
    pub below: bool,
    pub left: bool,
    pub right: bool,
    /// Angle between the slope under the character and world up, in radians.
    pub slope_angle: f32,
    /// [`Self::slope_angle`] of the previous tick.
    pub slope_angle_prev: f32,
    pub slope_normal: Vec2,
    pub climbing_slope: bool,
    pub descending_slope: bool,
}

impl CollisionState {
    /// Clears everything for a new sweep, remembering the last slope angle.
    pub fn reset(&mut self) {
        *self = Self {
            slope_angle_prev: self.slope_angle,
            ..Self::default()
        };
    }

    pub fn touching_wall(&self) -> bool {
        self.left || self.right
    }

    /// -1 for a wall on the left, 1 otherwise.
    pub fn wall_direction(&self) -> f32 {
        if self.left { -1.0 } else { 1.0 }
    }

    pub(crate) fn set_horizontal(&mut self, direction: f32) {
        self.left = direction < 0.0;
        self.right = direction > 0.0;
    }

    pub(crate) fn set_vertical(&mut self, direction: f32) {
        self.below = direction < 0.0;
        self.above = direction > 0.0;
    }
}

/// High level movement state for animation, audio and gameplay code.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct CharacterState {
    pub is_grounded: bool,
    pub is_jumping: bool,
    pub is_running: bool,
    pub is_falling: bool,
    pub is_climbing_slope: bool,
    pub is_descending_slope: bool,
    /// Sign of the last non-zero horizontal movement. Either -1 or 1.
    pub dir_facing: f32,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            is_grounded: false,
            is_jumping: false,
            is_running: false,
            is_falling: false,
            is_climbing_slope: false,
            is_descending_slope: false,
            dir_facing: 1.0,
        }
    }
}

impl CharacterState {
    /// Refreshes the flags from a finished sweep and the corrected velocity.
    pub fn update(&mut self, collisions: &CollisionState, velocity: Vec2, running: bool) {
        self.is_grounded = collisions.below;
        self.is_running = running;
        self.is_climbing_slope = collisions.climbing_slope;
        self.is_descending_slope = collisions.descending_slope;
        self.is_falling = !collisions.below && velocity.y < 0.0;
        if collisions.below {
            self.is_jumping = false;
        }
    }
}
