//! Per-frame input signals the host feeds the controller.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Directional movement flags, body-relative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementInput {
    /// Body-local direction: forward is -Z, right is +X. Opposite flags cancel.
    ///
    /// Not normalised; the force model clamps the length.
    pub fn direction(&self) -> Vec3 {
        let mut dir = Vec3::zeros();
        if self.forward {
            dir.z -= 1.0;
        }
        if self.back {
            dir.z += 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        dir
    }

    pub fn is_moving(&self) -> bool {
        self.direction() != Vec3::zeros()
    }
}

/// Everything the host samples once per rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub movement: MovementInput,
    /// Jump pressed this frame (edge, not level).
    pub jump: bool,
    /// Look delta: `.0` turns right, `.1` looks up.
    pub look_delta: (f32, f32),
}
