//! Force model: input drive, quadratic drag and braking.
//!
//! Forces here are accelerations (m/s²); there is no mass in the model.

use crate::{
    math::{Quat, Vec3, clamp_magnitude, normalize_or_zero},
    state::GroundingInfo,
};

/// Input acceleration for a body-local `direction`.
///
/// The local y component is discarded, the rest is rotated into world space,
/// clamped to unit length and scaled by `movement_acceleration`.
pub fn input_force(direction: Vec3, body_rotation: Quat, movement_acceleration: f32) -> Vec3 {
    let planar = Vec3::new(direction.x, 0.0, direction.z);
    let world = clamp_magnitude(body_rotation * planar, 1.0);
    world * movement_acceleration
}

/// Attenuation of the input drive on slopes: `dot(normal, up)` when grounded, 1 in the air.
#[inline]
pub fn slope_factor(grounding: &GroundingInfo, up: Vec3) -> f32 {
    if grounding.grounded {
        grounding.ground_normal.dot(&up)
    } else {
        1.0
    }
}

/// Sum of every acceleration acting on the body this step.
#[inline]
pub fn applied_forces(gravity: Vec3, persistent_force: Vec3, input_force: Vec3) -> Vec3 {
    gravity + persistent_force + input_force
}

/// Quadratic drag opposing `velocity`; zero for a body at rest.
pub fn drag_force(velocity: Vec3, drag_coeff: f32) -> Vec3 {
    let magnitude = velocity.norm_squared() * drag_coeff;
    -normalize_or_zero(velocity) * magnitude
}

/// Decelerate `velocity` by `braking_force * dt`, stopping at zero instead of reversing.
pub fn apply_brakes(velocity: Vec3, braking_force: f32, dt: f32) -> Vec3 {
    let braked = velocity - normalize_or_zero(velocity) * braking_force * dt;
    if velocity.dot(&braked) < 0.0 {
        Vec3::zeros()
    } else {
        braked
    }
}

/// Add the stored ground drag; zero the velocity if drag would reverse it.
pub fn apply_ground_drag(velocity: Vec3, ground_drag: Vec3, dt: f32) -> Vec3 {
    let dragged = velocity + ground_drag * dt;
    if dragged.dot(&velocity) < 0.0 {
        Vec3::zeros()
    } else {
        dragged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra as na;

    const DT: f32 = 0.02;

    #[test]
    fn input_is_planar_clamped_and_scaled() {
        let diagonal = Vec3::new(1.0, 1.0, -1.0);
        let f = input_force(diagonal, Quat::identity(), 10.0);
        assert!(f.y.abs() < 1.0e-6);
        assert!((f.norm() - 10.0).abs() < 1.0e-4);
    }

    #[test]
    fn input_follows_body_yaw() {
        // A quarter turn to the right maps forward (-Z) onto +X.
        let yaw = Quat::from_axis_angle(&na::Vector3::y_axis(), -std::f32::consts::FRAC_PI_2);
        let f = input_force(Vec3::new(0.0, 0.0, -1.0), yaw, 1.0);
        assert!((f - Vec3::x()).norm() < 1.0e-5);
    }

    #[test]
    fn slope_factor_only_applies_when_grounded() {
        let mut grounding = GroundingInfo {
            grounded: true,
            ground_normal: Vec3::new(0.0, 0.5f32.sqrt(), 0.5f32.sqrt()),
            ..GroundingInfo::default()
        };
        assert!((slope_factor(&grounding, Vec3::y()) - 0.5f32.sqrt()).abs() < 1.0e-6);
        grounding.grounded = false;
        assert_eq!(slope_factor(&grounding, Vec3::y()), 1.0);
    }

    #[test]
    fn drag_opposes_motion_quadratically() {
        let d = drag_force(Vec3::new(2.0, 0.0, 0.0), 0.5);
        assert!((d - Vec3::new(-2.0, 0.0, 0.0)).norm() < 1.0e-6);
        assert_eq!(drag_force(Vec3::zeros(), 0.5), Vec3::zeros());
    }

    #[test]
    fn terminal_speed_approaches_movement_speed() {
        let speed = 6.0;
        let coeff = 0.95;
        let accel = speed * speed * coeff;
        let drag = drag_force(Vec3::new(speed, 0.0, 0.0), coeff);
        assert!((drag.x + accel).abs() < 1.0e-3);
    }

    #[test]
    fn brakes_stop_without_reversing() {
        let v = Vec3::new(0.05, 0.0, 0.0);
        assert_eq!(apply_brakes(v, 10.0, DT), Vec3::zeros());

        let fast = apply_brakes(Vec3::new(5.0, 0.0, 0.0), 10.0, DT);
        assert!((fast.x - 4.8).abs() < 1.0e-5);
    }

    #[test]
    fn braking_a_stopped_body_is_idempotent() {
        let mut v = Vec3::zeros();
        for _ in 0..10 {
            v = apply_brakes(v, 10.0, DT);
        }
        assert_eq!(v, Vec3::zeros());
        assert!(v.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn ground_drag_never_reverses_velocity() {
        let v = Vec3::new(0.1, 0.0, 0.0);
        let out = apply_ground_drag(v, Vec3::new(-100.0, 0.0, 0.0), DT);
        assert_eq!(out, Vec3::zeros());
    }
}
