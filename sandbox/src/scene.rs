//! Demo level: a floor, a step, a steep ramp and a moving platform.

use std::f32::consts::TAU;

use locomotion::{
    CollisionLayer, ColliderShapeDef, LayerMask, Quat, RapierQueryWorld, SurfaceId, Vec3, WorldSurfaceDef,
};
use log::warn;

pub const PLATFORM_ID: u32 = 10;

fn statics() -> LayerMask {
    LayerMask::from_flags(&[CollisionLayer::Static])
}

pub fn build() -> RapierQueryWorld {
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
        // 0.2 m step, within the default step height.
        WorldSurfaceDef {
            id: 2,
            layers: statics(),
            translation: Vec3::new(0.0, 0.1, -8.0),
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 0.1, 2.0),
            },
        },
        // Tilted past the walkable slope limit.
        WorldSurfaceDef {
            id: 3,
            layers: statics(),
            translation: Vec3::new(8.0, 0.0, 0.0),
            rotation: Quat::from_axis_angle(&Vec3::z_axis(), 75f32.to_radians()),
            shape: ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(3.0, 0.25, 3.0),
            },
        },
        WorldSurfaceDef {
            id: 4,
            layers: statics(),
            translation: Vec3::new(-4.0, 1.0, -4.0),
            rotation: Quat::identity(),
            shape: ColliderShapeDef::CylinderY {
                radius: 0.5,
                half_height: 1.0,
            },
        },
        WorldSurfaceDef {
            id: PLATFORM_ID,
            layers: LayerMask::from_flags(&[CollisionLayer::Platform]),
            translation: Vec3::new(-8.0, 0.25, 0.0),
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 0.25, 2.0),
            },
        },
    ])
}

/// Platform sliding back and forth while spinning about +Y.
#[derive(Clone, Copy, Debug)]
pub struct MovingPlatform {
    surface: SurfaceId,
    origin: Vec3,
    amplitude: Vec3,
    period_s: f32,
    spin_rad_per_s: f32,
    time_s: f32,
}

impl MovingPlatform {
    pub fn new(surface: SurfaceId, origin: Vec3) -> Self {
        Self {
            surface,
            origin,
            amplitude: Vec3::new(0.0, 0.0, 3.0),
            period_s: 6.0,
            spin_rad_per_s: 0.5,
            time_s: 0.0,
        }
    }

    pub fn pose_at(&self, time_s: f32) -> (Vec3, Quat) {
        let translation = self.origin + self.amplitude * (TAU * time_s / self.period_s).sin();
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), self.spin_rad_per_s * time_s);
        (translation, rotation)
    }

    pub fn advance(&mut self, world: &mut RapierQueryWorld, dt: f32) {
        self.time_s += dt;
        let (translation, rotation) = self.pose_at(self.time_s);
        if !world.set_surface_pose(self.surface, translation, rotation) {
            warn!("platform {:?} is not in the scene", self.surface);
        }
    }
}
