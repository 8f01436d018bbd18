//! Turns input and gravity into the velocity the sweep consumes.

use tracing::{debug, warn};

use crate::{
    collisions::{CharacterState, CollisionState},
    error::{ConfigError, non_negative, positive},
    prelude::*,
};

/// Jump values derived from the jump heights and the time to reach the apex.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct JumpKinematics {
    /// Downward acceleration. Always negative.
    pub gravity: f32,
    pub max_jump_velocity: f32,
    pub min_jump_velocity: f32,
}

impl JumpKinematics {
    pub fn new(
        max_jump_height: f32,
        min_jump_height: f32,
        time_to_jump_apex: f32,
    ) -> Result<Self, ConfigError> {
        let max_jump_height = positive("max_jump_height", max_jump_height)?;
        let min_jump_height = non_negative("min_jump_height", min_jump_height)?;
        let time_to_jump_apex = positive("time_to_jump_apex", time_to_jump_apex)?;
        if min_jump_height > max_jump_height {
            return Err(ConfigError::MinJumpAboveMax {
                min: min_jump_height,
                max: max_jump_height,
            });
        }

        // h = g * t^2 / 2  =>  g = 2h / t^2
        let gravity = -(2.0 * max_jump_height) / (time_to_jump_apex * time_to_jump_apex);
        Ok(Self {
            gravity,
            max_jump_velocity: gravity.abs() * time_to_jump_apex,
            min_jump_velocity: (2.0 * gravity.abs() * min_jump_height).sqrt(),
        })
    }
}

/// Input for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickInput {
    /// Raw directional input, each axis in `[-1, 1]`.
    pub movement: Vec2,
    pub running: bool,
    pub jump_pressed: bool,
    pub jump_released: bool,
}

impl TickInput {
    /// -1, 0 or 1 depending on the horizontal input.
    pub fn horizontal(&self) -> f32 {
        if self.movement.x.abs() <= f32::EPSILON {
            0.0
        } else {
            self.movement.x.signum()
        }
    }
}

/// The timers and smoothing state carried between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct VelocityIntegrator {
    /// Rate of change of the horizontal velocity, owned by [`smooth_damp`].
    pub velocity_smoothing: f32,
    pub coyote_timer: f32,
    pub jump_buffer_timer: f32,
    pub wall_stick_timer: f32,
    pub wall_sliding: bool,
    /// Side of the wall being slid along, -1 or 1.
    pub wall_direction: f32,
}

impl VelocityIntegrator {
    /// A jump press. Jumps straight away when allowed and arms the jump buffer.
    ///
    /// A wall jump uses its configured vector as is and consumes the press, so neither coyote
    /// time nor the buffer can turn it into a ground jump.
    pub fn press_jump(
        &mut self,
        velocity: &mut Vec2,
        cfg: &CharacterController,
        jump: &JumpKinematics,
        input: &TickInput,
        character: &mut CharacterState,
    ) {
        if self.wall_sliding {
            let push = input.horizontal();
            let kick = if push == self.wall_direction {
                cfg.wall_jump_climb
            } else if push == 0.0 {
                cfg.wall_jump_off
            } else {
                cfg.wall_jump_leap
            };
            velocity.x = -self.wall_direction * kick.x;
            velocity.y = kick.y;
            self.velocity_smoothing = 0.0;
            character.is_jumping = true;
            self.coyote_timer = 0.0;
            self.jump_buffer_timer = 0.0;
            debug!("wall jump off the {} wall with {velocity}", side(self.wall_direction));
            return;
        }

        if self.coyote_timer > 0.0 {
            velocity.y = jump.max_jump_velocity;
            character.is_jumping = true;
        }
        self.jump_buffer_timer = cfg.jump_buffer;
    }

    /// A jump release. Cuts the jump short and rules out a late coyote jump.
    pub fn release_jump(&mut self, velocity: &mut Vec2, jump: &JumpKinematics) {
        if velocity.y > jump.min_jump_velocity {
            velocity.y = jump.min_jump_velocity;
        }
        self.coyote_timer = 0.0;
    }

    /// Advances velocity and timers by `dt`.
    ///
    /// `collisions` is the result of the previous tick's sweep.
    pub fn integrate(
        &mut self,
        velocity: &mut Vec2,
        cfg: &CharacterController,
        jump: &JumpKinematics,
        input: &TickInput,
        collisions: &CollisionState,
        character: &mut CharacterState,
        dt: f32,
    ) {
        let speed = if input.running {
            cfg.run_speed
        } else {
            cfg.walk_speed
        };
        let target = input.movement.x.clamp(-1.0, 1.0) * speed;
        let smooth_time = if collisions.below {
            cfg.acceleration_time_grounded
        } else {
            cfg.acceleration_time_airborne
        };
        velocity.x = smooth_damp(velocity.x, target, &mut self.velocity_smoothing, smooth_time, dt);

        let gravity_scale = if velocity.y <= -cfg.fall_threshold_speed {
            cfg.fall_multiplier
        } else {
            1.0
        };
        velocity.y += jump.gravity * gravity_scale * dt;

        if cfg.wall_jump {
            self.wall_slide(velocity, cfg, input, collisions, dt);
        }

        if collisions.below {
            self.coyote_timer = cfg.coyote_time;
        } else {
            self.coyote_timer -= dt;
        }

        if self.jump_buffer_timer > 0.0 {
            self.jump_buffer_timer -= dt;
        }
        if self.coyote_timer > 0.0 && self.jump_buffer_timer > 0.0 {
            self.jump_buffer_timer = 0.0;
            velocity.y = jump.max_jump_velocity;
            character.is_jumping = true;
        }

        validate_velocity(velocity);
    }

    fn wall_slide(
        &mut self,
        velocity: &mut Vec2,
        cfg: &CharacterController,
        input: &TickInput,
        collisions: &CollisionState,
        dt: f32,
    ) {
        self.wall_direction = collisions.wall_direction();
        self.wall_sliding = false;
        if !collisions.touching_wall() || collisions.below || velocity.y >= 0.0 {
            return;
        }
        self.wall_sliding = true;
        velocity.y = velocity.y.max(-cfg.max_wall_slide_speed);

        if self.wall_stick_timer <= 0.0 {
            self.wall_stick_timer = cfg.wall_stick_time;
            return;
        }
        // Hold on to the wall for a moment so a leap away can be timed.
        self.velocity_smoothing = 0.0;
        velocity.x = 0.0;
        let push = input.horizontal();
        if push != 0.0 && push != self.wall_direction {
            self.wall_stick_timer -= dt;
        } else {
            self.wall_stick_timer = cfg.wall_stick_time;
        }
    }

    /// Resting contact above or below removes vertical speed.
    pub fn apply_contacts(&self, velocity: &mut Vec2, collisions: &CollisionState) {
        if collisions.above || collisions.below {
            velocity.y = 0.0;
        }
    }
}

/// Critically damped spring towards `target`, reaching it in roughly `smooth_time` seconds.
///
/// `current_velocity` is the spring's rate of change and must be kept between calls.
pub fn smooth_damp(
    current: f32,
    target: f32,
    current_velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let smooth_time = smooth_time.max(1.0e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (*current_velocity + omega * change) * dt;
    *current_velocity = (*current_velocity - omega * temp) * decay;
    let output = target + (change + temp) * decay;

    // never overshoot
    if (target - current > 0.0) == (output > target) {
        *current_velocity = 0.0;
        return target;
    }
    output
}

fn validate_velocity(velocity: &mut Vec2) {
    for i in 0..2 {
        if !velocity[i].is_finite() {
            warn!("velocity[{i}] is not finite: {}, setting to 0", velocity[i]);
            velocity[i] = 0.0;
        }
    }
}

fn side(direction: f32) -> &'static str {
    if direction < 0.0 { "left" } else { "right" }
}
