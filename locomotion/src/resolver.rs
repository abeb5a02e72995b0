use log::{trace, warn};

use crate::{
    bitmask_flags::LayerMask,
    constants::PENETRATION_TOLERANCE,
    math::{Quat, Vec3},
    query::GeometryQuery,
    shape::CapsuleShape,
};

/// Parameters for one penetration-resolution pass.
#[derive(Clone, Copy, Debug)]
pub struct ResolveRequest {
    /// Candidate body position.
    pub position: Vec3,
    pub rotation: Quat,
    pub capsule: CapsuleShape,
    /// Radius of the overlap sphere gathering candidate surfaces.
    pub query_radius: f32,
    pub mask: LayerMask,
    /// Fixed-point iterations; each re-gathers candidates at the corrected position.
    pub iterations: u32,
}

/// Result of a resolution pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolveOutcome {
    /// Corrected body position.
    pub position: Vec3,
    /// Whether any overlap was found.
    pub colliding: bool,
    /// Number of individual corrections applied.
    pub corrections: u32,
}

/// Push the capsule out of everything it overlaps.
///
/// For each overlapping surface the component of `velocity` (and of every
/// vector in `forces`) along the separation direction is removed, giving a
/// sliding contact rather than a bounce, and the position moves out by the
/// penetration depth. The loop stops early once an iteration finds nothing.
/// Leftover overlap after the last iteration is left for the next step.
pub fn resolve_penetrations<Q: GeometryQuery + ?Sized>(
    query: &Q,
    req: &ResolveRequest,
    velocity: &mut Vec3,
    forces: &mut [Vec3],
) -> ResolveOutcome {
    let mut position = req.position;
    let mut colliding = false;
    let mut corrections = 0;
    let mut exhausted = false;

    for iteration in 0..req.iterations {
        let candidates = query.overlap_sphere(position, req.query_radius, req.mask);
        let mut found = false;

        for surface in candidates {
            let capsule = req.capsule.posed(position, req.rotation);
            let Some(pen) = query.penetration(&capsule, surface) else {
                continue;
            };

            let dir = pen.direction;
            *velocity -= dir * velocity.dot(&dir);
            for force in forces.iter_mut() {
                *force -= dir * force.dot(&dir);
            }
            position += dir * pen.depth;

            found = true;
            corrections += 1;
        }

        if !found {
            break;
        }
        colliding = true;
        exhausted = iteration + 1 == req.iterations;
    }

    if exhausted {
        let residual = deepest_overlap(query, req, position);
        if residual > PENETRATION_TOLERANCE {
            warn!(
                "still overlapping by {residual:.4} m after {} resolver iterations",
                req.iterations
            );
        }
    }

    if colliding {
        trace!("resolver applied {corrections} corrections, moved {:.4} m", (position - req.position).norm());
    }

    ResolveOutcome {
        position,
        colliding,
        corrections,
    }
}

fn deepest_overlap<Q: GeometryQuery + ?Sized>(query: &Q, req: &ResolveRequest, position: Vec3) -> f32 {
    let capsule = req.capsule.posed(position, req.rotation);
    query
        .overlap_sphere(position, req.query_radius, req.mask)
        .into_iter()
        .filter_map(|surface| query.penetration(&capsule, surface))
        .map(|pen| pen.depth)
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_world::{TestSurface, TestWorld};

    fn request(position: Vec3, iterations: u32) -> ResolveRequest {
        ResolveRequest {
            position,
            rotation: Quat::identity(),
            capsule: CapsuleShape::default(),
            query_radius: 10.0,
            mask: LayerMask::all(),
            iterations,
        }
    }

    fn total_depth(world: &TestWorld, position: Vec3) -> f32 {
        let capsule = CapsuleShape::default().posed(position, Quat::identity());
        world
            .overlap_sphere(position, 10.0, LayerMask::all())
            .into_iter()
            .filter_map(|id| world.penetration(&capsule, id))
            .map(|p| p.depth)
            .sum()
    }

    #[test]
    fn nothing_to_resolve() {
        let world = TestWorld::floor(0.0);
        let mut v = Vec3::new(1.0, 0.0, 0.0);
        let out = resolve_penetrations(&world, &request(Vec3::new(0.0, 1.0, 0.0), 8), &mut v, &mut []);
        assert!(!out.colliding);
        assert_eq!(out.corrections, 0);
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn sphere_overlap_is_pushed_out_and_velocity_slides() {
        let world = TestWorld::new().with(TestSurface::Sphere {
            center: Vec3::new(0.8, 0.0, 0.0),
            radius: 0.5,
        });
        let mut v = Vec3::new(2.0, 0.0, 1.0);
        let out = resolve_penetrations(&world, &request(Vec3::zeros(), 8), &mut v, &mut []);

        assert!(out.colliding);
        assert!((out.position - Vec3::new(-0.2, 0.0, 0.0)).norm() < 1.0e-5);
        // Only the tangential component survives.
        assert!((v - Vec3::new(0.0, 0.0, 1.0)).norm() < 1.0e-5);
        assert!(total_depth(&world, out.position) < 1.0e-4);
    }

    #[test]
    fn auxiliary_forces_lose_their_component_into_the_surface() {
        let world = TestWorld::floor(0.0);
        let mut v = Vec3::new(0.0, -3.0, 0.0);
        let mut forces = [Vec3::new(0.0, -9.81, 0.0), Vec3::new(4.0, -1.0, 0.0)];
        let out = resolve_penetrations(&world, &request(Vec3::new(0.0, 0.9, 0.0), 1), &mut v, &mut forces);

        assert!(out.colliding);
        assert!((out.position.y - 1.0).abs() < 1.0e-5);
        assert!(v.norm() < 1.0e-6);
        assert!(forces[0].norm() < 1.0e-6);
        assert!((forces[1] - Vec3::new(4.0, 0.0, 0.0)).norm() < 1.0e-6);
    }

    #[test]
    fn repeated_passes_converge_monotonically() {
        // Wedged between the floor and a sphere hanging over one shoulder.
        let world = TestWorld::floor(0.0).with(TestSurface::Sphere {
            center: Vec3::new(0.7, 1.6, 0.0),
            radius: 0.5,
        });
        let mut position = Vec3::new(0.0, 0.85, 0.0);
        let mut v = Vec3::zeros();
        let mut depth = total_depth(&world, position);
        assert!(depth > 0.0);

        for _ in 0..8 {
            let out = resolve_penetrations(&world, &request(position, 1), &mut v, &mut []);
            position = out.position;
            let next = total_depth(&world, position);
            assert!(next <= depth + 1.0e-6, "depth grew from {depth} to {next}");
            depth = next;
        }
        assert!(depth < 1.0e-3, "still overlapping by {depth}");
    }

    #[test]
    fn configured_iterations_reach_separation_in_one_call() {
        let world = TestWorld::floor(0.0).with(TestSurface::Sphere {
            center: Vec3::new(0.7, 1.6, 0.0),
            radius: 0.5,
        });
        let mut v = Vec3::zeros();
        let out = resolve_penetrations(&world, &request(Vec3::new(0.0, 0.85, 0.0), 8), &mut v, &mut []);
        assert!(total_depth(&world, out.position) < 1.0e-3);
    }
}
