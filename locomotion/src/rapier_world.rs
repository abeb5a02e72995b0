//! Rapier-backed [`GeometryQuery`] over a set of world surfaces.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-only: nothing here steps dynamics. Surfaces are parentless colliders
//!   positioned directly, so hosts can move platforms with [`RapierQueryWorld::set_surface_pose`].
//! - Layer filtering rides on collider `user_data` (see [`pack_user_data`]).

use std::collections::HashMap;

use log::{debug, warn};
use rapier3d::{
    parry::{
        query::{self as parry_query, ShapeCastOptions},
        shape::{Ball, Capsule, Cuboid, Shape},
    },
    prelude::*,
};

use crate::{
    bitmask_flags::LayerMask,
    constants::CAST_CONTACT_EPS,
    math::{Iso, Quat, Vec3, iso, normalize_or_zero},
    query::{CastHit, CastShape, GeometryQuery, Penetration, SurfaceId},
    shape::PosedCapsule,
};

/// Canonical definition of a world surface.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - Planes use a pose-derived normal: `normal = rotation * +Y`.
#[derive(Clone, Debug)]
pub struct WorldSurfaceDef {
    /// Stable unique identifier, reported back as [`SurfaceId`].
    pub id: u32,
    /// Layers the surface belongs to.
    pub layers: LayerMask,
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
}

/// Supported surface shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), solid below.
    ///
    /// The surface sits `offset_along_normal` meters from the pose translation along `rotation * +Y`.
    Plane { offset_along_normal: f32 },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },
}

/// Pack a surface id and its layer bits into a collider's `user_data`.
///
/// # Bit layout
/// - bits 0..=31  : surface id (u32)
/// - bits 32..=63 : layer mask bits (u32)
/// - bits 64..=127: reserved (zero)
pub fn pack_user_data(id: u32, layers: LayerMask) -> u128 {
    (id as u128) | ((layers.bits as u128) << u32::BITS)
}

/// Surface id stored in `user_data`.
pub fn unpack_surface_id(user_data: u128) -> SurfaceId {
    SurfaceId((user_data & u32::MAX as u128) as u32)
}

/// Layer mask stored in `user_data`.
pub fn unpack_layers(user_data: u128) -> LayerMask {
    LayerMask::new(((user_data >> u32::BITS) & u32::MAX as u128) as u32)
}

/// In-memory Rapier structures needed for scene queries.
pub struct RapierQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    handles: HashMap<SurfaceId, ColliderHandle>,
}

impl RapierQueryWorld {
    /// Build a query world from surface definitions.
    ///
    /// Duplicate ids keep the first definition.
    pub fn build(mut defs: Vec<WorldSurfaceDef>) -> Self {
        // Ensure deterministic insertion order.
        defs.sort_by_key(|d| d.id);

        let mut colliders = ColliderSet::new();
        let mut handles = HashMap::new();

        for def in &defs {
            let id = SurfaceId(def.id);
            if handles.contains_key(&id) {
                warn!("duplicate surface id {}, keeping the first definition", def.id);
                continue;
            }
            let handle = colliders.insert(collider_from_def(def));
            handles.insert(id, handle);
        }

        let mut world = Self {
            bodies: RigidBodySet::new(),
            colliders,
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::default(),
            handles,
        };
        world.refresh_broad_phase();
        debug!("query world built with {} surfaces", world.handles.len());
        world
    }

    /// Move a surface. Returns `false` for unknown ids.
    pub fn set_surface_pose(&mut self, surface: SurfaceId, translation: Vec3, rotation: Quat) -> bool {
        let Some(collider) = self
            .handles
            .get(&surface)
            .and_then(|&handle| self.colliders.get_mut(handle))
        else {
            return false;
        };
        collider.set_position(iso(translation, rotation));
        self.refresh_broad_phase();
        true
    }

    pub fn surface_count(&self) -> usize {
        self.handles.len()
    }

    /// Rebuild the BVH from every collider's current pose.
    fn refresh_broad_phase(&mut self) {
        let all: Vec<ColliderHandle> = self.colliders.iter().map(|(handle, _)| handle).collect();
        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &self.colliders,
            &self.bodies,
            &all,
            &[],
            &mut events,
        );
        self.broad_phase = broad_phase;
    }

    /// Borrowed `QueryPipeline` view restricted to surfaces on `mask`.
    fn with_pipeline<R>(&self, mask: LayerMask, f: impl FnOnce(&QueryPipeline<'_>) -> R) -> R {
        let on_mask = |_: ColliderHandle, collider: &Collider| unpack_layers(collider.user_data).intersects(mask);
        self.with_filter(&on_mask, f)
    }

    /// Borrowed `QueryPipeline` view over the colliders `predicate` accepts.
    fn with_filter<R>(
        &self,
        predicate: &dyn Fn(ColliderHandle, &Collider) -> bool,
        f: impl FnOnce(&QueryPipeline<'_>) -> R,
    ) -> R {
        let filter = QueryFilter::default().predicate(&predicate);
        let pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );
        f(&pipeline)
    }

    fn surface_of(&self, handle: ColliderHandle) -> Option<SurfaceId> {
        self.colliders
            .get(handle)
            .map(|collider| unpack_surface_id(collider.user_data))
    }
}

impl GeometryQuery for RapierQueryWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<SurfaceId> {
        let ball = Ball::new(radius);
        let mut hits: Vec<SurfaceId> = self.with_pipeline(mask, |pipeline| {
            pipeline
                .intersect_shape(iso(center, Quat::identity()), &ball)
                .map(|(_, collider)| unpack_surface_id(collider.user_data))
                .collect()
        });
        hits.sort();
        hits
    }

    fn penetration(&self, capsule: &PosedCapsule, surface: SurfaceId) -> Option<Penetration> {
        let collider = self.colliders.get(*self.handles.get(&surface)?)?;
        let shape = Capsule::new(capsule.a.into(), capsule.b.into(), capsule.radius);

        let contact = parry_query::contact(&Iso::identity(), &shape, collider.position(), collider.shape(), 0.0)
            .ok()
            .flatten()?;
        if contact.dist >= 0.0 {
            return None;
        }
        Some(Penetration {
            direction: -contact.normal1.into_inner(),
            depth: -contact.dist,
        })
    }

    fn shape_cast(
        &self,
        origin: &Iso,
        shape: CastShape,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CastHit> {
        let dir = normalize_or_zero(direction);
        if dir == Vec3::zeros() || max_distance < 0.0 {
            return None;
        }
        let ball;
        let cube;
        let cast: &dyn Shape = match shape {
            CastShape::Sphere { radius } => {
                ball = Ball::new(radius);
                &ball
            }
            CastShape::Cube { half_extent } => {
                cube = Cuboid::new(Vec3::repeat(half_extent));
                &cube
            }
        };

        // Surfaces the shape already overlaps at `origin` are not hits, so a
        // cube pressed against a wall still finds the floor below it.
        let mut skipped: Vec<ColliderHandle> = self.with_pipeline(mask, |pipeline| {
            pipeline
                .intersect_shape(*origin, cast)
                .map(|(handle, _)| handle)
                .collect()
        });

        loop {
            let ahead = |handle: ColliderHandle, collider: &Collider| {
                !skipped.contains(&handle) && unpack_layers(collider.user_data).intersects(mask)
            };
            let options = ShapeCastOptions::with_max_time_of_impact(max_distance);
            let (handle, hit) = self.with_filter(&ahead, |pipeline| pipeline.cast_shape(origin, &dir, cast, options))?;

            // normal1 is on the cast shape, in its local frame.
            let normal = origin.rotation * -hit.normal1.into_inner();

            // Touching at the start and sliding along the surface: same as starting inside.
            if hit.time_of_impact <= CAST_CONTACT_EPS && normal.dot(&-dir) <= CAST_CONTACT_EPS {
                skipped.push(handle);
                continue;
            }

            return Some(CastHit {
                surface: self.surface_of(handle)?,
                distance: hit.time_of_impact,
                normal,
            });
        }
    }

    fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Option<CastHit> {
        let dir = normalize_or_zero(direction);
        if dir == Vec3::zeros() || max_distance < 0.0 {
            return None;
        }
        let ray = Ray::new(origin.into(), dir);
        let (handle, hit) = self.with_pipeline(mask, |pipeline| pipeline.cast_ray_and_get_normal(&ray, max_distance, true))?;

        Some(CastHit {
            surface: self.surface_of(handle)?,
            distance: hit.time_of_impact,
            normal: hit.normal,
        })
    }

    fn surface_pose(&self, surface: SurfaceId) -> Option<Iso> {
        self.colliders
            .get(*self.handles.get(&surface)?)
            .map(|collider| *collider.position())
    }
}

/// Build a parentless Rapier collider from a `WorldSurfaceDef`.
fn collider_from_def(def: &WorldSurfaceDef) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Plane { .. } => ColliderBuilder::halfspace(Vector::y_axis()),
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),
    };

    // Planes carry their offset in the pose so `surface_pose` stays on the surface.
    let translation = match def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => def.translation + def.rotation * Vec3::y() * offset_along_normal,
        _ => def.translation,
    };

    builder
        .position(iso(translation, def.rotation))
        .user_data(pack_user_data(def.id, def.layers))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bitmask_flags::CollisionLayer, shape::CapsuleShape};

    const EPS: f32 = 1.0e-3;

    fn statics() -> LayerMask {
        LayerMask::from_flags(&[CollisionLayer::Static])
    }

    fn floor_and_box() -> RapierQueryWorld {
        RapierQueryWorld::build(vec![
            WorldSurfaceDef {
                id: 2,
                layers: LayerMask::from_flags(&[CollisionLayer::Platform]),
                translation: Vec3::new(3.0, 0.5, 0.0),
                rotation: Quat::identity(),
                shape: ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(0.5, 0.5, 0.5),
                },
            },
            WorldSurfaceDef {
                id: 1,
                layers: statics(),
                translation: Vec3::zeros(),
                rotation: Quat::identity(),
                shape: ColliderShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
            },
        ])
    }

    #[test]
    fn user_data_round_trips_id_and_layers() {
        let packed = pack_user_data(7, statics());
        assert_eq!(unpack_surface_id(packed), SurfaceId(7));
        assert_eq!(unpack_layers(packed), statics());
    }

    #[test]
    fn ray_hits_floor_from_above() {
        let world = floor_and_box();
        let hit = world
            .ray_cast(Vec3::new(0.0, 2.0, 0.0), -Vec3::y(), 5.0, LayerMask::all())
            .expect("floor below");
        assert_eq!(hit.surface, SurfaceId(1));
        assert!((hit.distance - 2.0).abs() < EPS);
        assert!((hit.normal - Vec3::y()).norm() < EPS);
    }

    #[test]
    fn cube_cast_reports_surface_normal() {
        let world = floor_and_box();
        let origin = iso(Vec3::new(3.0, 3.0, 0.0), Quat::identity());
        let hit = world
            .shape_cast(&origin, CastShape::Cube { half_extent: 0.5 }, -Vec3::y(), 5.0, LayerMask::all())
            .expect("box below");
        assert_eq!(hit.surface, SurfaceId(2));
        assert!((hit.distance - 1.5).abs() < EPS);
        assert!((hit.normal - Vec3::y()).norm() < EPS);
    }

    #[test]
    fn mask_filters_layers() {
        let world = floor_and_box();
        let origin = iso(Vec3::new(3.0, 3.0, 0.0), Quat::identity());
        let hit = world
            .shape_cast(&origin, CastShape::Sphere { radius: 0.25 }, -Vec3::y(), 5.0, statics())
            .expect("floor below");
        assert_eq!(hit.surface, SurfaceId(1));

        assert_eq!(world.overlap_sphere(Vec3::new(0.0, 1.0, 0.0), 10.0, statics()), vec![SurfaceId(1)]);
        assert_eq!(world.overlap_sphere(Vec3::new(0.0, 1.0, 0.0), 10.0, LayerMask::all()).len(), 2);
    }

    #[test]
    fn sunk_capsule_is_pushed_up() {
        let world = floor_and_box();
        let capsule = CapsuleShape::default().posed(Vec3::new(0.0, 0.9, 0.0), Quat::identity());
        let pen = world.penetration(&capsule, SurfaceId(1)).expect("overlapping floor");
        assert!((pen.depth - 0.1).abs() < EPS);
        assert!((pen.direction - Vec3::y()).norm() < EPS);

        let clear = CapsuleShape::default().posed(Vec3::new(0.0, 1.1, 0.0), Quat::identity());
        assert!(world.penetration(&clear, SurfaceId(1)).is_none());
    }

    #[test]
    fn moved_surface_is_seen_by_queries() {
        let mut world = floor_and_box();
        assert!(world.set_surface_pose(SurfaceId(2), Vec3::new(0.0, 0.5, 0.0), Quat::identity()));
        assert!(!world.set_surface_pose(SurfaceId(9), Vec3::zeros(), Quat::identity()));

        let hit = world
            .ray_cast(Vec3::new(0.0, 3.0, 0.0), -Vec3::y(), 5.0, LayerMask::all())
            .expect("box below");
        assert_eq!(hit.surface, SurfaceId(2));
        assert!((hit.distance - 2.0).abs() < EPS);

        let pose = world.surface_pose(SurfaceId(2)).expect("known surface");
        assert!((pose.translation.vector - Vec3::new(0.0, 0.5, 0.0)).norm() < EPS);
    }

    fn floor_and_wall() -> RapierQueryWorld {
        RapierQueryWorld::build(vec![
            WorldSurfaceDef {
                id: 1,
                layers: statics(),
                translation: Vec3::zeros(),
                rotation: Quat::identity(),
                shape: ColliderShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
            },
            // Face at z = -1.5.
            WorldSurfaceDef {
                id: 2,
                layers: statics(),
                translation: Vec3::new(0.0, 2.0, -2.0),
                rotation: Quat::identity(),
                shape: ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(2.0, 2.0, 0.5),
                },
            },
        ])
    }

    #[test]
    fn cast_ignores_surfaces_it_starts_inside() {
        let world = floor_and_wall();
        let origin = iso(Vec3::new(0.0, 1.5, -1.02), Quat::identity());
        let hit = world
            .shape_cast(&origin, CastShape::Cube { half_extent: 0.5 }, -Vec3::y(), 5.0, LayerMask::all())
            .expect("floor below");
        assert_eq!(hit.surface, SurfaceId(1));
        assert!((hit.distance - 1.0).abs() < EPS);
        assert!((hit.normal - Vec3::y()).norm() < EPS);
    }

    #[test]
    fn walking_into_a_wall_stays_grounded() {
        use crate::{
            controller::PlayerController,
            input::{FrameInput, MovementInput},
            settings::ControllerSettings,
        };

        const DT: f32 = 0.02;
        let world = floor_and_wall();
        let mut pc = PlayerController::new(ControllerSettings::default(), Vec3::new(0.0, 1.0, 0.0))
            .expect("valid settings");
        let input = FrameInput {
            movement: MovementInput {
                forward: true,
                ..MovementInput::default()
            },
            ..FrameInput::default()
        };

        let mut ungrounded = 0;
        for _ in 0..120 {
            pc.tick(DT, &input);
            pc.fixed_tick(&world, DT);
            if !pc.grounding().grounded {
                ungrounded += 1;
            }
        }
        assert_eq!(ungrounded, 0);
        assert!((pc.position().y - 1.0).abs() < 1.0e-2);
        // Pressed against the face, not through it.
        assert!(pc.position().z > -1.05);
        assert!(pc.position().z < -0.9);
    }
}
