use log::trace;

use crate::{
    bitmask_flags::LayerMask,
    constants::GROUND_PADDING,
    debug_draw::{DebugDraw, GROUND_PROBE_COLOR},
    math::{Quat, Vec3, angle_deg, iso, normalize_or_zero, project},
    query::{CastShape, GeometryQuery},
    shape::CapsuleShape,
    state::GroundingInfo,
};

/// Parameters for a single ground probe.
#[derive(Clone, Copy, Debug)]
pub struct GroundRequest {
    /// Body position before snapping.
    pub position: Vec3,
    pub rotation: Quat,
    /// Body up axis (the gravity frame's up).
    pub up: Vec3,
    /// Velocity after this step's forces, used for the downward lookahead.
    pub velocity: Vec3,
    pub dt: f32,
    pub capsule: CapsuleShape,
    pub mask: LayerMask,
    pub max_step_height: f32,
    pub max_slope_angle: f32,
}

/// Probe for ground under the capsule and snap onto it.
///
/// A cube with the capsule's radius as half extent is swept along `-up` from
/// one radius below the head, so its top face starts flush with the head. The
/// sweep covers the body height, a small padding and this step's downward
/// travel. A hit whose implied ledge height exceeds `max_step_height` is a wall,
/// not ground. An accepted hit moves the body along `up` so the feet rest on it,
/// minus any downward motion the velocity will already cover along the normal.
///
/// Returns the (possibly snapped) position and the new grounding snapshot.
/// Slopes steeper than `max_slope_angle` still ground the body but are flagged.
pub fn detect_ground<Q: GeometryQuery + ?Sized>(
    query: &Q,
    req: &GroundRequest,
    debug: &mut DebugDraw,
) -> (Vec3, GroundingInfo) {
    let up = req.up;
    let radius = req.capsule.radius;
    let foot = req.capsule.foot_world(req.position, req.rotation);
    let origin = req.capsule.head_world(req.position, req.rotation) - up * radius;

    let player_height = (origin - foot).norm();
    let down_speed_time = req.velocity.dot(&-up) * req.dt;
    let max_distance = player_height + GROUND_PADDING + down_speed_time - radius;

    debug.cube(
        origin + up * radius * 0.5 - up * player_height * 0.5,
        Vec3::new(radius * 2.0, max_distance.max(0.0) * 2.0, radius * 2.0),
        GROUND_PROBE_COLOR,
    );

    let airborne = GroundingInfo {
        ground_normal: up,
        ..GroundingInfo::default()
    };
    if max_distance <= 0.0 {
        return (req.position, airborne);
    }

    let Some(hit) = query.shape_cast(
        &iso(origin, Quat::identity()),
        CastShape::Cube {
            half_extent: radius,
        },
        -up,
        max_distance,
        req.mask,
    ) else {
        return (req.position, airborne);
    };

    let mut diff = player_height - (hit.distance - down_speed_time + radius);
    if diff > req.max_step_height {
        trace!(
            "ground hit on {:?} rejected: ledge {diff:.3} m above max step {:.3} m",
            hit.surface, req.max_step_height
        );
        return (req.position, airborne);
    }

    // Motion along the contact normal this step already closes part of the gap.
    let projected_height = (project(req.velocity, hit.normal) * req.dt).dot(&up);
    diff += projected_height.min(0.0);

    let normal = match normalize_or_zero(hit.normal) {
        n if n == Vec3::zeros() => up,
        n => n,
    };
    let ground_angle = angle_deg(normal, up);

    let info = GroundingInfo {
        grounded: true,
        ground_normal: normal,
        ground_angle,
        above_max_angle: ground_angle >= req.max_slope_angle,
        snap_distance: diff,
        contact_surface: Some(hit.surface),
    };
    (req.position + up * diff, info)
}

/// Distance from the feet to the nearest surface straight below, if within `max_distance`.
pub fn ground_distance<Q: GeometryQuery + ?Sized>(
    query: &Q,
    foot: Vec3,
    up: Vec3,
    max_distance: f32,
    mask: LayerMask,
) -> Option<f32> {
    query
        .ray_cast(foot + up * GROUND_PADDING, -up, max_distance + GROUND_PADDING, mask)
        .map(|hit| (hit.distance - GROUND_PADDING).max(0.0))
}
