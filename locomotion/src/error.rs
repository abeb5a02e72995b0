use thiserror::Error;

/// Fatal configuration problems detected when a controller is created or re-tuned.
///
/// Runtime movement never produces errors; only invalid setup does.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("capsule radius must be positive, got {radius}")]
    NonPositiveRadius { radius: f32 },

    #[error("capsule height {height} is shorter than its two end caps (radius {radius})")]
    CapsuleTooShort { height: f32, radius: f32 },

    #[error("`{field}` must be finite")]
    NonFinite { field: &'static str },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("`{field}` must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("max_jumps must be at least 1")]
    NoJumps,

    #[error("collision_iterations must be at least 1")]
    NoIterations,

    #[error("fixed delta time must be positive, got {dt}")]
    NonPositiveFixedDt { dt: f32 },
}
