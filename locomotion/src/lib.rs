pub mod bitmask_flags;
pub mod body;
pub mod clock;
pub mod constants;
pub mod controller;
pub mod debug_draw;
pub mod error;
pub mod forces;
pub mod frame;
pub mod ground;
pub mod input;
pub mod jump;
pub mod math;
pub mod query;
pub mod rapier_world;
pub mod resolver;
pub mod settings;
pub mod shape;
pub mod state;

#[cfg(test)]
pub(crate) mod test_world;

pub use rapier3d;

pub use bitmask_flags::{CollisionLayer, LayerMask, default_collision_mask};
pub use body::{BodyMotion, DynamicBody, KinematicBody};
pub use clock::FixedTimestep;
pub use controller::PlayerController;
pub use debug_draw::{DebugDraw, DrawCommand, GizmoRenderer};
pub use error::ConfigError;
pub use input::{FrameInput, MovementInput};
pub use math::{Iso, Quat, Vec3};
pub use query::{CastHit, CastShape, GeometryQuery, Penetration, SurfaceId};
pub use rapier_world::{ColliderShapeDef, RapierQueryWorld, WorldSurfaceDef};
pub use settings::ControllerSettings;
pub use shape::CapsuleShape;
pub use state::{GroundingInfo, MovementState};
