use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    math::{Quat, Vec3},
};

/// Capsule collision volume described by two body-local points and a radius.
///
/// `foot_local` and `head_local` are the extreme points of the capsule (the
/// bottom of the lower cap and the top of the upper cap), so the total height
/// `|head - foot|` includes both caps. The inner segment the caps are swept
/// along runs from `foot + axis * radius` to `head - axis * radius`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    pub foot_local: Vec3,
    pub head_local: Vec3,
    pub radius: f32,
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self {
            foot_local: -Vec3::y(),
            head_local: Vec3::y(),
            radius: 0.5,
        }
    }
}

/// A capsule placed in world space, ready for narrow-phase queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PosedCapsule {
    /// Lower end of the inner segment.
    pub a: Vec3,
    /// Upper end of the inner segment.
    pub b: Vec3,
    pub radius: f32,
}

impl CapsuleShape {
    /// Reject capsules the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = |v: &Vec3| v.iter().all(|c| c.is_finite());
        if !finite(&self.foot_local) {
            return Err(ConfigError::NonFinite { field: "foot_local" });
        }
        if !finite(&self.head_local) {
            return Err(ConfigError::NonFinite { field: "head_local" });
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ConfigError::NonPositiveRadius {
                radius: self.radius,
            });
        }
        let height = self.height();
        if height < 2.0 * self.radius {
            return Err(ConfigError::CapsuleTooShort {
                height,
                radius: self.radius,
            });
        }
        Ok(())
    }

    /// Total height, caps included.
    #[inline]
    pub fn height(&self) -> f32 {
        (self.head_local - self.foot_local).norm()
    }

    /// Local-space midpoint between foot and head.
    #[inline]
    pub fn center_local(&self) -> Vec3 {
        (self.foot_local + self.head_local) * 0.5
    }

    /// Unit axis from foot to head in local space.
    #[inline]
    pub fn axis_local(&self) -> Vec3 {
        let d = self.head_local - self.foot_local;
        let len = d.norm();
        if len > 0.0 { d / len } else { Vec3::y() }
    }

    #[inline]
    pub fn foot_world(&self, position: Vec3, rotation: Quat) -> Vec3 {
        position + rotation * self.foot_local
    }

    #[inline]
    pub fn head_world(&self, position: Vec3, rotation: Quat) -> Vec3 {
        position + rotation * self.head_local
    }

    /// World-space capsule for a body at `position`/`rotation`.
    pub fn posed(&self, position: Vec3, rotation: Quat) -> PosedCapsule {
        let axis = rotation * self.axis_local();
        PosedCapsule {
            a: self.foot_world(position, rotation) + axis * self.radius,
            b: self.head_world(position, rotation) - axis * self.radius,
            radius: self.radius,
        }
    }
}

impl PosedCapsule {
    /// Closest point on the inner segment to `p`.
    pub fn closest_on_segment(&self, p: Vec3) -> Vec3 {
        let ab = self.b - self.a;
        let len_sq = ab.norm_squared();
        if len_sq <= 0.0 {
            return self.a;
        }
        let t = ((p - self.a).dot(&ab) / len_sq).clamp(0.0, 1.0);
        self.a + ab * t
    }
}
