//! Analytic geometry used by unit tests.
//!
//! Casts treat every cast shape as world-axis aligned. Platforms only expose
//! their top face to casts (downward casts); their sides only matter for
//! penetration, which is approximated by sampling the capsule segment.

use crate::{
    bitmask_flags::{CollisionLayer, LayerMask},
    math::{Iso, Quat, Vec3, iso, normalize_or_zero},
    query::{CastHit, CastShape, GeometryQuery, Penetration, SurfaceId},
    shape::PosedCapsule,
};

#[derive(Clone, Copy, Debug)]
pub(crate) enum TestSurface {
    /// Solid half-space below `normal · x = offset`.
    Plane { normal: Vec3, offset: f32 },
    /// Axis-aligned box.
    Platform { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

#[derive(Default)]
pub(crate) struct TestWorld {
    surfaces: Vec<(SurfaceId, TestSurface, LayerMask)>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, surface: TestSurface) -> Self {
        self.add(surface, LayerMask::from_flags(&[CollisionLayer::Static]));
        self
    }

    pub fn add(&mut self, surface: TestSurface, layers: LayerMask) -> SurfaceId {
        let id = SurfaceId(self.surfaces.len() as u32 + 1);
        self.surfaces.push((id, surface, layers));
        id
    }

    pub fn floor(height: f32) -> Self {
        Self::new().with(TestSurface::Plane {
            normal: Vec3::y(),
            offset: height,
        })
    }

    /// Move a surface by `delta`.
    pub fn translate(&mut self, id: SurfaceId, delta: Vec3) {
        if let Some((_, surface, _)) = self.surfaces.iter_mut().find(|(sid, _, _)| *sid == id) {
            match surface {
                TestSurface::Plane { normal, offset } => *offset += normal.dot(&delta),
                TestSurface::Platform { min, max } => {
                    *min += delta;
                    *max += delta;
                }
                TestSurface::Sphere { center, .. } => *center += delta,
            }
        }
    }

    fn candidates(&self, mask: LayerMask) -> impl Iterator<Item = &(SurfaceId, TestSurface, LayerMask)> {
        self.surfaces
            .iter()
            .filter(move |(_, _, layers)| layers.intersects(mask))
    }

    fn surface(&self, id: SurfaceId) -> Option<TestSurface> {
        self.surfaces
            .iter()
            .find(|(sid, _, _)| *sid == id)
            .map(|(_, s, _)| *s)
    }
}

fn cast_against(
    surface: &TestSurface,
    origin: Vec3,
    radius: f32,
    cube: bool,
    dir: Vec3,
    max_distance: f32,
) -> Option<(f32, Vec3)> {
    match *surface {
        TestSurface::Plane { normal, offset } => {
            let n = normalize_or_zero(normal);
            let support = if cube {
                let sign = |c: f32| if c == 0.0 { 0.0 } else { c.signum() };
                origin - Vec3::new(sign(n.x), sign(n.y), sign(n.z)) * radius
            } else {
                origin - n * radius
            };
            let denom = n.dot(&dir);
            if denom >= 0.0 {
                return None;
            }
            let t = (offset - n.dot(&support)) / denom;
            (t >= 0.0 && t <= max_distance).then_some((t, n))
        }
        TestSurface::Platform { min, max } => {
            if dir.y > -0.99 {
                return None;
            }
            let overlaps_xz = origin.x + radius > min.x
                && origin.x - radius < max.x
                && origin.z + radius > min.z
                && origin.z - radius < max.z;
            if !overlaps_xz {
                return None;
            }
            let t = (origin.y - radius) - max.y;
            (t >= 0.0 && t <= max_distance).then_some((t, Vec3::y()))
        }
        TestSurface::Sphere {
            center,
            radius: sphere_radius,
        } => {
            let r = sphere_radius + radius;
            let m = origin - center;
            let b = m.dot(&dir);
            let c = m.norm_squared() - r * r;
            if c > 0.0 && b > 0.0 {
                return None;
            }
            let disc = b * b - c;
            if disc < 0.0 {
                return None;
            }
            let t = (-b - disc.sqrt()).max(0.0);
            if t > max_distance {
                return None;
            }
            let normal = normalize_or_zero(origin + dir * t - center);
            Some((t, normal))
        }
    }
}

fn closest_point_in_box(p: Vec3, min: Vec3, max: Vec3) -> Vec3 {
    Vec3::new(
        p.x.clamp(min.x, max.x),
        p.y.clamp(min.y, max.y),
        p.z.clamp(min.z, max.z),
    )
}

impl GeometryQuery for TestWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<SurfaceId> {
        self.candidates(mask)
            .filter(|(_, surface, _)| match *surface {
                TestSurface::Plane { normal, offset } => {
                    normalize_or_zero(normal).dot(&center) - offset <= radius
                }
                TestSurface::Platform { min, max } => {
                    (closest_point_in_box(center, min, max) - center).norm() <= radius
                }
                TestSurface::Sphere {
                    center: c,
                    radius: r,
                } => (c - center).norm() <= r + radius,
            })
            .map(|(id, _, _)| *id)
            .collect()
    }

    fn penetration(&self, capsule: &PosedCapsule, surface: SurfaceId) -> Option<Penetration> {
        match self.surface(surface)? {
            TestSurface::Plane { normal, offset } => {
                let n = normalize_or_zero(normal);
                let d = n.dot(&capsule.a).min(n.dot(&capsule.b)) - offset - capsule.radius;
                (d < 0.0).then_some(Penetration {
                    direction: n,
                    depth: -d,
                })
            }
            TestSurface::Sphere { center, radius } => {
                let closest = capsule.closest_on_segment(center);
                let offset = closest - center;
                let dist = offset.norm();
                let depth = capsule.radius + radius - dist;
                if depth <= 0.0 {
                    return None;
                }
                let direction = if dist > 0.0 { offset / dist } else { Vec3::y() };
                Some(Penetration { direction, depth })
            }
            TestSurface::Platform { min, max } => {
                const SAMPLES: usize = 16;
                let mut best: Option<(f32, Vec3)> = None;
                for i in 0..=SAMPLES {
                    let p = capsule.a + (capsule.b - capsule.a) * (i as f32 / SAMPLES as f32);
                    let q = closest_point_in_box(p, min, max);
                    let dist = (p - q).norm();
                    if best.is_none_or(|(d, _)| dist < d) {
                        best = Some((dist, p - q));
                    }
                }
                let (dist, offset) = best?;
                if dist >= capsule.radius {
                    return None;
                }
                if dist > 0.0 {
                    Some(Penetration {
                        direction: offset / dist,
                        depth: capsule.radius - dist,
                    })
                } else {
                    // Segment inside the box: push out through the top.
                    let lowest = capsule.a.y.min(capsule.b.y);
                    Some(Penetration {
                        direction: Vec3::y(),
                        depth: max.y - lowest + capsule.radius,
                    })
                }
            }
        }
    }

    fn shape_cast(
        &self,
        origin: &Iso,
        shape: CastShape,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CastHit> {
        let (radius, cube) = match shape {
            CastShape::Sphere { radius } => (radius, false),
            CastShape::Cube { half_extent } => (half_extent, true),
        };
        let o = origin.translation.vector;
        let dir = normalize_or_zero(direction);
        self.candidates(mask)
            .filter_map(|(id, surface, _)| {
                cast_against(surface, o, radius, cube, dir, max_distance).map(|(distance, normal)| {
                    CastHit {
                        surface: *id,
                        distance,
                        normal,
                    }
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn ray_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<CastHit> {
        self.shape_cast(
            &iso(origin, Quat::identity()),
            CastShape::Sphere { radius: 0.0 },
            direction,
            max_distance,
            mask,
        )
    }

    fn surface_pose(&self, surface: SurfaceId) -> Option<Iso> {
        let position = match self.surface(surface)? {
            TestSurface::Plane { normal, offset } => normalize_or_zero(normal) * offset,
            TestSurface::Platform { min, max } => (min + max) * 0.5,
            TestSurface::Sphere { center, .. } => center,
        };
        Some(iso(position, Quat::identity()))
    }
}
