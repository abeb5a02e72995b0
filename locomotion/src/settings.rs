/*!
Controller settings and their validation.

Everything a host tunes lives in [`ControllerSettings`]. Defaults mirror a
responsive first-person setup; distances are meters, time is seconds, angles
are degrees unless noted otherwise.

Settings are validated once when a controller is created and again whenever
the host re-applies them. An invalid capsule or a nonsensical scalar is a fatal
configuration error; nothing at runtime is.
*/

use serde::{Deserialize, Serialize};

use crate::{
    bitmask_flags::{LayerMask, default_collision_mask},
    error::ConfigError,
    math::Vec3,
    shape::CapsuleShape,
};

/// Default gravity magnitude in meters per second squared.
pub const DEFAULT_GRAVITY_MPS2: f32 = 9.81;

/// Default radius of the overlap sphere used by the penetration resolver (meters).
pub const DEFAULT_COLLISION_QUERY_RADIUS: f32 = 10.0;

/// Default resolver iterations for the post-integration pass.
pub const DEFAULT_COLLISION_ITERATIONS: u32 = 8;

/// Default walking speed (m/s).
pub const DEFAULT_MOVEMENT_SPEED: f32 = 15.0;

/// Default angular speed (rad/s) at which gravity and the gravity frame re-orient.
pub const DEFAULT_GRAVITY_TURN_RATE: f32 = 15.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Geometry layers that participate in every query.
    pub collision_mask: LayerMask,
    /// Gravity acceleration (m/s²), world space.
    pub gravity: Vec3,
    /// Collision volume.
    pub capsule: CapsuleShape,
    /// Radius of the overlap sphere gathering resolver candidates.
    pub collision_query_radius: f32,
    /// Resolver iterations after position integration.
    pub collision_iterations: u32,
    /// Run a one-iteration resolver pass on the predicted position before ground snapping.
    pub predictive_collision: bool,
    /// 0 = no steering while airborne, 1 = instantaneous steering.
    pub air_control: f32,
    /// Seconds of airtime over which steering authority decays to zero.
    pub air_control_time: f32,
    /// Degrees of rotation per unit of look input.
    pub camera_sensitivity: f32,
    /// Target (drag-limited) ground speed (m/s).
    pub movement_speed: f32,
    /// Upward speed added by a jump (m/s).
    pub jump_strength: f32,
    /// Quadratic drag coefficient.
    pub drag_coeff: f32,
    /// Deceleration (m/s²) applied when grounded without input.
    pub braking_force: f32,
    /// Deceleration (m/s²) applied while sliding on a walkable slope.
    pub slipping_braking_force: f32,
    /// Coyote window (s) after leaving the ground during which a first jump is still allowed.
    pub jump_time_buffer: f32,
    /// Steepest walkable slope (degrees).
    pub max_slope_angle: f32,
    /// Tallest ledge the ground snap will climb (meters).
    pub max_step_height: f32,
    /// Jumps available before landing again.
    pub max_jumps: u32,
    /// Whether the first jump from the ground requires a walkable slope.
    pub jump_requires_walkable_slope: bool,
    /// Angular speed (rad/s) for gravity re-orientation.
    pub gravity_turn_rate: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            collision_mask: default_collision_mask(),
            gravity: Vec3::new(0.0, -DEFAULT_GRAVITY_MPS2, 0.0),
            capsule: CapsuleShape::default(),
            collision_query_radius: DEFAULT_COLLISION_QUERY_RADIUS,
            collision_iterations: DEFAULT_COLLISION_ITERATIONS,
            predictive_collision: true,
            air_control: 0.25,
            air_control_time: 1.0,
            camera_sensitivity: 15.0,
            movement_speed: DEFAULT_MOVEMENT_SPEED,
            jump_strength: 5.0,
            drag_coeff: 0.95,
            braking_force: 10.0,
            slipping_braking_force: 25.0,
            jump_time_buffer: 0.25,
            max_slope_angle: 70.0,
            max_step_height: 0.25,
            max_jumps: 1,
            jump_requires_walkable_slope: true,
            gravity_turn_rate: DEFAULT_GRAVITY_TURN_RATE,
        }
    }
}

impl ControllerSettings {
    /// Acceleration whose drag-limited terminal speed approaches `movement_speed`.
    #[inline]
    pub fn movement_acceleration(&self) -> f32 {
        self.movement_speed * self.movement_speed * self.drag_coeff
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capsule.validate()?;

        if !self.gravity.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::NonFinite { field: "gravity" });
        }

        let non_negative = [
            ("collision_query_radius", self.collision_query_radius),
            ("air_control_time", self.air_control_time),
            ("camera_sensitivity", self.camera_sensitivity),
            ("movement_speed", self.movement_speed),
            ("jump_strength", self.jump_strength),
            ("drag_coeff", self.drag_coeff),
            ("braking_force", self.braking_force),
            ("slipping_braking_force", self.slipping_braking_force),
            ("jump_time_buffer", self.jump_time_buffer),
            ("max_step_height", self.max_step_height),
            ("gravity_turn_rate", self.gravity_turn_rate),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.air_control) {
            return Err(ConfigError::OutOfRange {
                field: "air_control",
                value: self.air_control,
                min: 0.0,
                max: 1.0,
            });
        }
        if !(self.max_slope_angle > 0.0 && self.max_slope_angle <= 180.0) {
            return Err(ConfigError::OutOfRange {
                field: "max_slope_angle",
                value: self.max_slope_angle,
                min: 0.0,
                max: 180.0,
            });
        }
        if self.max_jumps == 0 {
            return Err(ConfigError::NoJumps);
        }
        if self.collision_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = ControllerSettings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.movement_acceleration() - 15.0 * 15.0 * 0.95).abs() < 1.0e-4);
    }

    #[test]
    fn air_control_must_be_a_fraction() {
        let settings = ControllerSettings {
            air_control: 1.5,
            ..ControllerSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OutOfRange {
                field: "air_control",
                ..
            })
        ));
    }

    #[test]
    fn zero_jumps_is_rejected() {
        let settings = ControllerSettings {
            max_jumps: 0,
            ..ControllerSettings::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::NoJumps));
    }

    #[test]
    fn negative_scalars_name_their_field() {
        let settings = ControllerSettings {
            braking_force: -1.0,
            ..ControllerSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::Negative {
                field: "braking_force",
                value: -1.0
            })
        );
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let settings: ControllerSettings = toml::from_str(
            r#"
            movement_speed = 8.0
            max_jumps = 2
            gravity = [0.0, -20.0, 0.0]
            "#,
        )
        .expect("valid toml");

        assert_eq!(settings.max_jumps, 2);
        assert!((settings.movement_speed - 8.0).abs() < 1.0e-6);
        assert!((settings.gravity.y + 20.0).abs() < 1.0e-6);
        assert!((settings.jump_strength - 5.0).abs() < 1.0e-6);
        assert!(settings.validate().is_ok());
    }
}
