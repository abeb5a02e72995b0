/// Extra distance (meters) the ground cast reaches below the feet.
///
/// Lets a body resting exactly on a surface keep detecting it despite float drift.
pub const GROUND_PADDING: f32 = 0.0125;

/// Radius (meters) of the probe used to recover from side collisions while airborne.
pub const SIDE_PROBE_RADIUS: f32 = 0.25;

/// Factor over `movement_speed` above which grounded movement routes through the slide branch.
pub const MAX_SPEED_FACTOR: f32 = 1.2;

/// Camera pitch limit (degrees), symmetric around the horizon.
pub const PITCH_LIMIT_DEG: f32 = 80.0;

/// Squared length below which a vector is treated as zero when normalising.
pub const NORMALIZE_EPS_SQ: f32 = 1.0e-12;

/// Iterations used by the predictive resolver pass that runs before ground snapping.
pub const PREDICTIVE_ITERATIONS: u32 = 1;

/// Radius of the foot/head markers emitted by the selected-object gizmos (meters).
pub const MARKER_RADIUS: f32 = 0.1;

/// Length of the diagnostic normal/velocity rays (meters).
pub const DEBUG_RAY_LENGTH: f32 = 10.0;

/// Overlap (meters) still tolerated after the resolver has used all its iterations.
pub const PENETRATION_TOLERANCE: f32 = 1.0e-4;

/// Cast distance (meters) at or below which a hit counts as touching at the start.
pub const CAST_CONTACT_EPS: f32 = 1.0e-4;
