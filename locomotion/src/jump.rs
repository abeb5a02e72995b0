//! Jump budget, coyote window and airborne steering.

use log::debug;

use crate::{
    math::{Vec3, lerp, normalize_or_zero, project_on_plane},
    settings::ControllerSettings,
    state::{GroundingInfo, MovementState},
};

/// Which kind of jump a request turned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpKind {
    /// Jump off the ground (or within the coyote window after leaving it).
    First,
    /// Additional mid-air jump from the remaining budget.
    Extra,
}

/// Whether the first jump may start this step.
///
/// Needs a pending request and either ground under the feet (walkable, unless
/// `jump_requires_walkable_slope` is off) or less than `jump_time_buffer`
/// seconds since the body last left the ground.
pub fn first_jump_allowed(
    state: &MovementState,
    grounding: &GroundingInfo,
    settings: &ControllerSettings,
    above_max_angle: bool,
) -> bool {
    if !state.pending_jump || state.jumps_made != 0 {
        return false;
    }
    let ground_ok = grounding.grounded && (!above_max_angle || !settings.jump_requires_walkable_slope);
    ground_ok || state.time_since_grounded < settings.jump_time_buffer
}

/// Turn a pending jump request into a velocity change, if the budget allows it.
///
/// A first jump keeps the velocity's component along the ground plane that
/// points up (so running up a slope jumps higher), drops everything along
/// gravity, then adds `jump_strength` along `up`. It also pushes the coyote
/// timer past its window so the same take-off cannot trigger twice. Extra jumps
/// simply add `jump_strength` along `up` on top of the current velocity.
pub fn apply_jump(
    state: &mut MovementState,
    grounding: &GroundingInfo,
    settings: &ControllerSettings,
    up: Vec3,
    gravity: Vec3,
    above_max_angle: bool,
) -> Option<JumpKind> {
    if state.jumps_made == 0 {
        if !first_jump_allowed(state, grounding, settings, above_max_angle) {
            return None;
        }
        state.jumps_made += 1;
        state.air_movement_timer = 0.0;

        let up_offset = if grounding.grounded {
            project_on_plane(state.velocity, grounding.ground_normal).dot(&up)
        } else {
            0.0
        };

        state.velocity = project_on_plane(state.velocity, normalize_or_zero(gravity));
        state.velocity += up * (settings.jump_strength + up_offset);
        state.time_since_grounded += settings.jump_time_buffer;

        debug!("jump 1/{} (slope offset {up_offset:.3} m/s)", settings.max_jumps);
        Some(JumpKind::First)
    } else if state.pending_jump && state.jumps_made < settings.max_jumps {
        state.velocity += up * settings.jump_strength;
        state.jumps_made += 1;

        debug!("jump {}/{}", state.jumps_made, settings.max_jumps);
        Some(JumpKind::Extra)
    } else {
        None
    }
}

/// Steering authority left after `timer` seconds in the air, in `[0, 1]`.
pub fn air_control_scale(timer: f32, air_control_time: f32) -> f32 {
    let t = if air_control_time > 0.0 {
        (timer / air_control_time).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (1.0 - t).sqrt()
}

/// Blend `input_force` into the horizontal part of `velocity` while airborne or sliding.
///
/// The push decays with air time. Above `movement_speed` a push along the
/// current heading is throttled (down to nothing when aligned) so input can
/// only steer or slow the body, never accelerate it further. The result is
/// lerped toward by `air_control`.
pub fn air_steer(
    velocity: Vec3,
    input_force: Vec3,
    up: Vec3,
    dt: f32,
    air_timer: f32,
    current_speed: f32,
    settings: &ControllerSettings,
) -> Vec3 {
    let vertical = velocity.dot(&up);
    let mut horizontal = project_on_plane(velocity, up);

    let air_force = input_force * air_control_scale(air_timer, settings.air_control_time);

    let move_dot = if current_speed > settings.movement_speed {
        (1.0 - normalize_or_zero(horizontal).dot(&normalize_or_zero(air_force))) * 0.5
    } else {
        1.0
    };

    horizontal += air_force * dt * move_dot;
    horizontal += up * vertical;

    lerp(velocity, horizontal, settings.air_control)
}
