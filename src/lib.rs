#![doc = include_str!("../readme.md")]

/// Everything you need to get started with `bevy_ledge`
pub mod prelude {
    pub(crate) use {
        avian2d::prelude::*,
        bevy_app::prelude::*,
        bevy_derive::{Deref, DerefMut},
        bevy_ecs::prelude::*,
        bevy_enhanced_input::prelude::*,
        bevy_math::prelude::*,
        bevy_reflect::prelude::*,
        bevy_time::prelude::*,
        bevy_transform::prelude::*,
        bevy_utils::prelude::*,
    };

    pub use crate::{
        CharacterController, CharacterControllerState, ControllerSetup, LedgePlugin,
        LedgeSystems,
        collisions::{CharacterState, CollisionState},
        error::ConfigError,
        input::{AccumulatedInput, Jump, Movement, Run},
        kcc::step_character,
        probe::{Bounds, RaySpacing},
        query::{RayCaster, RayHit, SegmentWorld},
        velocity::{JumpKinematics, TickInput},
    };
}

use crate::{
    error::{non_negative, positive},
    input::AccumulatedInput,
    prelude::*,
    velocity::VelocityIntegrator,
};
use bevy_ecs::{
    intern::Interned, lifecycle::HookContext, schedule::ScheduleLabel, world::DeferredWorld,
};
use core::f32::consts::{FRAC_PI_2, FRAC_PI_3};

pub mod collisions;
pub mod error;
pub mod input;
mod kcc;
pub mod probe;
pub mod query;
pub mod slope;
pub mod sweep;
pub mod velocity;

/// Also requires you to add [`PhysicsPlugins`] and [`EnhancedInputPlugin`] to work properly.
pub struct LedgePlugin {
    schedule: Interned<dyn ScheduleLabel>,
}

impl LedgePlugin {
    /// Create a new plugin in the given schedule. The default is [`FixedPostUpdate`].
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Default for LedgePlugin {
    fn default() -> Self {
        Self {
            schedule: FixedPostUpdate.intern(),
        }
    }
}

impl Plugin for LedgePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            self.schedule,
            LedgeSystems::MoveCharacters.in_set(PhysicsSystems::First),
        )
        .add_plugins((input::plugin, kcc::plugin(self.schedule)));
    }
}

/// System set used by all systems of `bevy_ledge`.
#[derive(SystemSet, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum LedgeSystems {
    MoveCharacters,
}

/// Tunables of a 2D platformer character.
///
/// Distances are in world units, times in seconds and angles in radians.
#[derive(Component, Clone, Reflect, Debug)]
#[reflect(Component)]
#[require(
    AccumulatedInput,
    CharacterControllerState,
    TranslationInterpolation,
    RigidBody = RigidBody::Kinematic,
    Collider = Collider::rectangle(1.0, 2.0),
    CustomPositionIntegration,
    Transform,
    SpeculativeMargin::ZERO,
)]
#[component(on_add=CharacterController::on_add)]
pub struct CharacterController {
    /// Which level geometry blocks the character. The character's own entity is always excluded.
    pub filter: SpatialQueryFilter,
    /// Inset of the ray origins from the collider's edges.
    pub skin_width: f32,
    /// Desired distance between parallel rays.
    pub ray_spacing: f32,
    /// Steepest surface, measured from world up, that can be walked up or down.
    pub max_slope_angle: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub acceleration_time_grounded: f32,
    pub acceleration_time_airborne: f32,
    /// Height of a jump held until the apex.
    pub max_jump_height: f32,
    /// Height of a jump released immediately.
    pub min_jump_height: f32,
    pub time_to_jump_apex: f32,
    /// Gravity scale applied while falling.
    pub fall_multiplier: f32,
    /// Downward speed from which [`Self::fall_multiplier`] kicks in.
    pub fall_threshold_speed: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub wall_stick_time: f32,
    pub max_wall_slide_speed: f32,
    /// Jump off a wall while pushing towards it.
    pub wall_jump_climb: Vec2,
    /// Jump off a wall without horizontal input.
    pub wall_jump_off: Vec2,
    /// Jump off a wall while pushing away from it.
    pub wall_jump_leap: Vec2,
    pub slopes: bool,
    pub wall_jump: bool,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            filter: SpatialQueryFilter::default(),
            skin_width: 0.015,
            ray_spacing: 0.25,
            max_slope_angle: FRAC_PI_3,
            walk_speed: 8.0,
            run_speed: 16.0,
            acceleration_time_grounded: 0.1,
            acceleration_time_airborne: 0.2,
            max_jump_height: 3.5,
            min_jump_height: 1.25,
            time_to_jump_apex: 0.4,
            fall_multiplier: 2.0,
            fall_threshold_speed: 0.5,
            coyote_time: 0.1,
            jump_buffer: 0.05,
            wall_stick_time: 0.25,
            max_wall_slide_speed: 3.0,
            wall_jump_climb: vec2(7.5, 16.0),
            wall_jump_off: vec2(8.5, 7.0),
            wall_jump_leap: vec2(18.0, 17.0),
            slopes: true,
            wall_jump: true,
        }
    }
}

impl CharacterController {
    pub fn on_add(mut world: DeferredWorld, ctx: HookContext) {
        let Some(mut kcc) = world.get_mut::<Self>(ctx.entity) else {
            return;
        };
        kcc.filter.excluded_entities.add(ctx.entity);
    }

    /// Checks every tunable and derives the values that only depend on them.
    pub fn jump_kinematics(&self) -> Result<JumpKinematics, ConfigError> {
        positive("skin_width", self.skin_width)?;
        positive("ray_spacing", self.ray_spacing)?;
        positive("walk_speed", self.walk_speed)?;
        positive("run_speed", self.run_speed)?;
        non_negative("acceleration_time_grounded", self.acceleration_time_grounded)?;
        non_negative("acceleration_time_airborne", self.acceleration_time_airborne)?;
        non_negative("fall_threshold_speed", self.fall_threshold_speed)?;
        non_negative("coyote_time", self.coyote_time)?;
        non_negative("jump_buffer", self.jump_buffer)?;
        non_negative("wall_stick_time", self.wall_stick_time)?;
        non_negative("max_wall_slide_speed", self.max_wall_slide_speed)?;
        for (name, kick) in [
            ("wall_jump_climb", self.wall_jump_climb),
            ("wall_jump_off", self.wall_jump_off),
            ("wall_jump_leap", self.wall_jump_leap),
        ] {
            if !kick.is_finite() {
                return Err(ConfigError::NotFinite { name });
            }
        }
        if !(0.0..FRAC_PI_2).contains(&self.max_slope_angle) {
            return Err(ConfigError::InvalidSlopeAngle(self.max_slope_angle));
        }
        if !(self.fall_multiplier >= 1.0 && self.fall_multiplier.is_finite()) {
            return Err(ConfigError::FallMultiplierBelowOne(self.fall_multiplier));
        }
        JumpKinematics::new(
            self.max_jump_height,
            self.min_jump_height,
            self.time_to_jump_apex,
        )
    }

    /// Everything a character with a collider of `bounds` needs before it can move.
    pub fn setup(&self, bounds: Bounds) -> Result<ControllerSetup, ConfigError> {
        let jump = self.jump_kinematics()?;
        let spacing = RaySpacing::for_bounds(bounds, self.skin_width, self.ray_spacing)?;
        Ok(ControllerSetup { spacing, jump })
    }
}

/// Values derived once from the [`CharacterController`] and its collider size.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct ControllerSetup {
    pub spacing: RaySpacing,
    pub jump: JumpKinematics,
}

/// Per-character movement state. Read [`Self::collisions`] and [`Self::character`] to drive
/// animation and audio.
#[derive(Component, Clone, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct CharacterControllerState {
    pub collisions: CollisionState,
    pub character: CharacterState,
    pub integrator: VelocityIntegrator,
    /// `None` until set up, or if the [`CharacterController`] is invalid. Such characters do not move.
    pub setup: Option<ControllerSetup>,
}

impl CharacterControllerState {
    /// Derives the setup right away instead of waiting for the plugin.
    pub fn new(cfg: &CharacterController, bounds: Bounds) -> Result<Self, ConfigError> {
        Ok(Self {
            setup: Some(cfg.setup(bounds)?),
            ..default()
        })
    }
}
