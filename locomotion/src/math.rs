/*!
Math aliases and vector helpers shared by every controller component.

All helpers that normalise are zero-safe: a zero (or near-zero) input yields a
zero output instead of NaN. Braking, drag and the air-control blend all rely on
that.
*/

use nalgebra as na;

use crate::constants::NORMALIZE_EPS_SQ;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World up when no gravity frame is involved (+Y).
#[inline]
pub fn world_up() -> Vec3 {
    Vec3::y()
}

/// Build an isometry from a position and rotation.
#[inline]
pub fn iso(position: Vec3, rotation: Quat) -> Iso {
    Iso::from_parts(na::Translation3::from(position), rotation)
}

/// Normalise `v`, returning zero for zero-length input.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq > NORMALIZE_EPS_SQ {
        v / len_sq.sqrt()
    } else {
        Vec3::zeros()
    }
}

/// Component of `v` along `onto` (which need not be unit length).
#[inline]
pub fn project(v: Vec3, onto: Vec3) -> Vec3 {
    let len_sq = onto.norm_squared();
    if len_sq <= NORMALIZE_EPS_SQ {
        return Vec3::zeros();
    }
    onto * (v.dot(&onto) / len_sq)
}

/// `v` with its component along `normal` removed.
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - project(v, normal)
}

/// Clamp the length of `v` to at most `max_len`.
#[inline]
pub fn clamp_magnitude(v: Vec3, max_len: f32) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq > max_len * max_len {
        v * (max_len / len_sq.sqrt())
    } else {
        v
    }
}

/// Unsigned angle between two vectors in degrees, in `[0, 180]`.
///
/// Returns 0 when either vector is zero.
#[inline]
pub fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.norm_squared() * b.norm_squared()).sqrt();
    if denom <= NORMALIZE_EPS_SQ {
        return 0.0;
    }
    (a.dot(&b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Rotate `current` toward `target` by at most `max_radians`, keeping the length of `current`.
///
/// Opposite vectors rotate around any axis perpendicular to `current`.
pub fn rotate_towards(current: Vec3, target: Vec3, max_radians: f32) -> Vec3 {
    let len = current.norm();
    let from = normalize_or_zero(current);
    let to = normalize_or_zero(target);
    if len <= 0.0 || to == Vec3::zeros() {
        return current;
    }

    let angle = from.dot(&to).clamp(-1.0, 1.0).acos();
    if angle <= max_radians.max(0.0) {
        return to * len;
    }

    let axis = match na::Unit::try_new(from.cross(&to), NORMALIZE_EPS_SQ) {
        Some(axis) => axis,
        None => perpendicular_axis(from),
    };
    let step = Quat::from_axis_angle(&axis, max_radians.max(0.0));
    (step * from) * len
}

/// Any unit axis perpendicular to `v` (assumed non-zero).
fn perpendicular_axis(v: Vec3) -> na::Unit<Vec3> {
    let helper = if v.x.abs() < 0.9 { Vec3::x() } else { Vec3::z() };
    na::Unit::new_normalize(v.cross(&helper))
}

/// Linear interpolation between two vectors, `t` unclamped.
#[inline]
pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Rotation taking `from_up` onto `to_up` via the shortest arc, applied on top of `rotation`.
///
/// Used to re-orient a reference frame so its up axis becomes `to_up` without
/// introducing any twist about the axis.
pub fn align_up(rotation: Quat, to_up: Vec3) -> Quat {
    let from_up = rotation * Vec3::y();
    let to_up = normalize_or_zero(to_up);
    if to_up == Vec3::zeros() {
        return rotation;
    }
    match Quat::rotation_between(&from_up, &to_up) {
        Some(delta) => delta * rotation,
        // Antiparallel: flip about any horizontal axis of the frame.
        None => Quat::from_axis_angle(&perpendicular_axis(from_up), std::f32::consts::PI) * rotation,
    }
}
