use bevy_ecs::{intern::Interned, schedule::ScheduleLabel};
use tracing::{error, trace};

use crate::{
    CharacterControllerState,
    input::AccumulatedInput,
    prelude::*,
    sweep::{Sweep, SweepSettings},
};

pub(super) fn plugin(schedule: Interned<dyn ScheduleLabel>) -> impl Fn(&mut App) {
    move |app: &mut App| {
        app.add_systems(
            schedule,
            (prepare_characters, run_kcc)
                .chain()
                .in_set(LedgeSystems::MoveCharacters),
        );
    }
}

fn prepare_characters(
    mut kccs: Query<
        (
            Entity,
            &CharacterController,
            &Collider,
            &mut CharacterControllerState,
        ),
        Or<(Changed<CharacterController>, Changed<Collider>)>,
    >,
) {
    for (entity, cfg, collider, mut state) in &mut kccs {
        let bounds = Bounds::from(collider.aabb(Vec2::ZERO, Rotation::default()));
        match cfg.setup(bounds) {
            Ok(setup) => state.setup = Some(setup),
            Err(err) => {
                error!("character controller on {entity} will not move: {err}");
                state.setup = None;
            }
        }
    }
}

fn run_kcc(
    mut kccs: Query<(
        &CharacterController,
        &mut CharacterControllerState,
        &mut AccumulatedInput,
        &mut Transform,
        &mut LinearVelocity,
        &Collider,
    )>,
    time: Res<Time>,
    spatial_query: SpatialQuery,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    for (cfg, mut state, mut input, mut transform, mut velocity, collider) in &mut kccs {
        let input = input.take_tick();
        let position = transform.translation.truncate();
        let bounds = Bounds::from(collider.aabb(position, Rotation::default()));

        let Some(displacement) = step_character(
            &spatial_query,
            cfg,
            &mut state,
            bounds,
            &mut velocity.0,
            &input,
            dt,
        ) else {
            continue;
        };
        transform.translation += displacement.extend(0.0);
    }
}

/// Advances one character by one tick and returns how far it moved.
///
/// Returns `None` without touching anything when `dt` is not positive or the character has no
/// valid [`ControllerSetup`].
pub fn step_character<Q: RayCaster + ?Sized>(
    query: &Q,
    cfg: &CharacterController,
    state: &mut CharacterControllerState,
    bounds: Bounds,
    velocity: &mut Vec2,
    input: &TickInput,
    dt: f32,
) -> Option<Vec2> {
    if dt <= 0.0 {
        return None;
    }
    let setup = state.setup?;
    let CharacterControllerState {
        collisions,
        character,
        integrator,
        ..
    } = state;

    if input.jump_pressed {
        integrator.press_jump(velocity, cfg, &setup.jump, input, character);
    }
    if input.jump_released {
        integrator.release_jump(velocity, &setup.jump);
    }
    integrator.integrate(velocity, cfg, &setup.jump, input, collisions, character, dt);

    let desired = *velocity * dt;
    if desired.x != 0.0 {
        character.dir_facing = desired.x.signum();
    }
    let sweep = Sweep::new(
        query,
        &cfg.filter,
        SweepSettings::from(cfg),
        setup.spacing,
        bounds,
    );
    let displacement = sweep.resolve(desired, collisions);
    if integrator.wall_sliding && displacement.x == 0.0 && !collisions.touching_wall() {
        // wall stick holds us still, so no horizontal ray saw the wall
        sweep.touch_wall(integrator.wall_direction, displacement, collisions);
    }

    integrator.apply_contacts(velocity, collisions);
    character.update(collisions, *velocity, input.running);
    trace!("desired {desired}, moved {displacement}");
    Some(displacement)
}
