use crate::{prelude::*, velocity::TickInput};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<FixedLoopRan>()
        .add_observer(apply_movement)
        .add_observer(apply_run)
        .add_observer(apply_jump_press)
        .add_observer(apply_jump_release)
        .add_systems(PreUpdate, clear_fixed_loop_flag)
        .add_systems(FixedPreUpdate, set_fixed_loop_flag)
        .add_systems(
            RunFixedMainLoop,
            clear_accumulated_input
                .run_if(fixed_loop_ran)
                .in_set(RunFixedMainLoopSystems::AfterFixedMainLoop),
        );
}

#[derive(Debug, InputAction)]
#[action_output(Vec2)]
pub struct Movement;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct Jump;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct Run;

/// Input accumulated since the last fixed update loop.
///
/// Movement and running are cleared after every frame the fixed loop ran in. Jump presses and
/// releases are kept until a tick consumes them.
#[derive(Component, Clone, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct AccumulatedInput {
    // The last non-zero move that was input since the last fixed update loop
    pub last_movement: Option<Vec2>,
    pub running: bool,
    pub jump_pressed: bool,
    pub jump_released: bool,
}

impl AccumulatedInput {
    /// Input for the next tick. Consumes the jump edges.
    pub fn take_tick(&mut self) -> TickInput {
        TickInput {
            movement: self.last_movement.unwrap_or_default(),
            running: self.running,
            jump_pressed: core::mem::take(&mut self.jump_pressed),
            jump_released: core::mem::take(&mut self.jump_released),
        }
    }
}

fn apply_movement(
    movement: On<Fire<Movement>>,
    mut accumulated_inputs: Query<&mut AccumulatedInput>,
) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(movement.context) {
        accumulated_inputs.last_movement = Some(movement.value);
    }
}

fn apply_run(run: On<Fire<Run>>, mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(run.context) {
        accumulated_inputs.running = true;
    }
}

fn apply_jump_press(jump: On<Start<Jump>>, mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(jump.context) {
        accumulated_inputs.jump_pressed = true;
    }
}

fn apply_jump_release(
    jump: On<Complete<Jump>>,
    mut accumulated_inputs: Query<&mut AccumulatedInput>,
) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(jump.context) {
        accumulated_inputs.jump_released = true;
    }
}

fn clear_accumulated_input(mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    for mut accumulated_input in &mut accumulated_inputs {
        accumulated_input.last_movement = None;
        accumulated_input.running = false;
    }
}

/// Whether the fixed timestep ran during the current frame.
#[derive(Resource, Debug, Deref, DerefMut, Default)]
struct FixedLoopRan(bool);

fn clear_fixed_loop_flag(mut ran: ResMut<FixedLoopRan>) {
    **ran = false;
}

fn set_fixed_loop_flag(mut ran: ResMut<FixedLoopRan>) {
    **ran = true;
}

fn fixed_loop_ran(ran: Res<FixedLoopRan>) -> bool {
    **ran
}
