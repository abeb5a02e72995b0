use crate::{
    math::{Vec3, world_up},
    query::SurfaceId,
};

/// Per-controller movement state, mutated once per fixed step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementState {
    /// World-space velocity (m/s).
    pub velocity: Vec3,
    /// Externally injected acceleration (wind, knockback); changed only through the API.
    pub persistent_force: Vec3,
    /// Acceleration from movement input, set per frame and cleared every fixed step.
    pub input_force: Vec3,
    /// Net acceleration applied during the last fixed step.
    pub final_force: Vec3,
    /// Ground drag acceleration computed at the end of the last grounded step.
    pub ground_drag: Vec3,
    /// Velocity of the surface the body was glued to, folded back into `velocity` on take-off.
    pub anchor_velocity: Vec3,
    /// Measured speed over the last fixed step (m/s).
    pub current_speed: f32,
    pub jumps_made: u32,
    pub time_since_grounded: f32,
    pub air_movement_timer: f32,
    /// Edge-triggered jump request, cleared at the end of every fixed step.
    pub pending_jump: bool,
    /// Whether the last resolver pass found any overlap.
    pub is_colliding: bool,
    /// Position before the last position integration.
    pub last_position: Vec3,
}

impl MovementState {
    pub fn new(position: Vec3) -> Self {
        Self {
            velocity: Vec3::zeros(),
            persistent_force: Vec3::zeros(),
            input_force: Vec3::zeros(),
            final_force: Vec3::zeros(),
            ground_drag: Vec3::zeros(),
            anchor_velocity: Vec3::zeros(),
            current_speed: 0.0,
            jumps_made: 0,
            time_since_grounded: 0.0,
            air_movement_timer: 0.0,
            pending_jump: false,
            is_colliding: false,
            last_position: position,
        }
    }
}

/// Result of the latest ground query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundingInfo {
    pub grounded: bool,
    /// Unit normal of the supporting surface (world up when airborne at start).
    pub ground_normal: Vec3,
    /// Angle in degrees between `ground_normal` and the body's up axis.
    pub ground_angle: f32,
    /// The hit is steeper than `max_slope_angle`; force routing takes the slide branch.
    pub above_max_angle: bool,
    /// Signed distance the body was snapped along its up axis.
    pub snap_distance: f32,
    /// Surface under the feet, used to re-parent the anchor point.
    pub contact_surface: Option<SurfaceId>,
}

impl Default for GroundingInfo {
    fn default() -> Self {
        Self {
            grounded: false,
            ground_normal: world_up(),
            ground_angle: 0.0,
            above_max_angle: false,
            snap_distance: 0.0,
            contact_surface: None,
        }
    }
}
