/*!
The geometry query surface the controller consumes.

The controller never owns world geometry. Everything it knows about the world
arrives through [`GeometryQuery`], implemented by the host (see
[`crate::rapier_world::RapierQueryWorld`] for a rapier3d-backed implementation).

Conventions
- All positions, directions and normals are world space.
- Cast directions are unit length; distances are meters along that direction.
- Normals returned by casts point away from the hit surface, toward the caster.
- Penetration directions point the way the capsule must move to separate.
*/

use crate::{
    bitmask_flags::LayerMask,
    math::{Iso, Vec3},
    shape::PosedCapsule,
};

/// Stable host-side identifier of a collider/transform.
///
/// Used for anchor re-parenting only; the controller never owns surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// Shapes the controller sweeps through the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CastShape {
    Sphere { radius: f32 },
    /// Cube with the given half extent on every axis.
    Cube { half_extent: f32 },
}

/// Result of a shape or ray cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastHit {
    pub surface: SurfaceId,
    /// Distance travelled along the cast direction before contact.
    pub distance: f32,
    /// Surface normal at the contact.
    pub normal: Vec3,
}

/// Separation needed to stop overlapping a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Penetration {
    /// Unit direction to move the capsule along.
    pub direction: Vec3,
    /// Distance to move (positive when overlapping).
    pub depth: f32,
}

/// World geometry as seen by the controller.
///
/// Queries are synchronous and idempotent; implementations must not keep
/// state between calls that changes their answers.
pub trait GeometryQuery {
    /// Surfaces on a layer in `mask` whose bounds overlap the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<SurfaceId>;

    /// How to separate `capsule` from `surface`, if they overlap.
    fn penetration(&self, capsule: &PosedCapsule, surface: SurfaceId) -> Option<Penetration>;

    /// Sweep `shape` from `origin` along `direction` up to `max_distance`.
    fn shape_cast(
        &self,
        origin: &Iso,
        shape: CastShape,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CastHit>;

    /// Cast a ray from `origin` along `direction` up to `max_distance`.
    fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CastHit>;

    /// Current world pose of a surface, or `None` if it no longer exists.
    fn surface_pose(&self, surface: SurfaceId) -> Option<Iso>;
}
