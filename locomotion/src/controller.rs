/*!
The player controller: per-frame input handling and the fixed-step integrator.

The host owns the clock. Once per rendered frame it calls
[`PlayerController::tick`] with the frame's input; once per physics step it
calls [`PlayerController::fixed_tick`] with its [`GeometryQuery`]. Input force
and the jump request are latched by `tick` and consumed (then cleared) by the
next `fixed_tick`.

Fixed step order:
1. ride the anchor point (kinematic bodies only)
2. classify speed and the previous ground's slope
3. jump
4. predictive overlap pass on the extrapolated position
5. integrate forces, then stored ground drag
6. ground probe and snap
7. ground response on this step's probe (brake and drag, or slide)
8. airborne or sliding: side-collision recovery and air steering
9. integrate position
10. overlap pass
11. re-parent or detach the anchor
12. measure speed, clear per-step input
*/

use log::{debug, info, trace};

use crate::{
    body::{BodyMotion, KinematicBody},
    constants::{DEBUG_RAY_LENGTH, MARKER_RADIUS, MAX_SPEED_FACTOR, PREDICTIVE_ITERATIONS, SIDE_PROBE_RADIUS},
    debug_draw::{
        CONTACT_COLOR, DebugDraw, GizmoRenderer, MARKER_COLOR, NORMAL_COLOR, QUERY_RADIUS_COLOR, VELOCITY_COLOR,
    },
    error::ConfigError,
    forces::{applied_forces, apply_brakes, apply_ground_drag, drag_force, input_force, slope_factor},
    frame::{AnchorPoint, GravityFrame, LookState},
    ground::{GroundRequest, detect_ground, ground_distance},
    input::FrameInput,
    jump::{air_steer, apply_jump},
    math::{Quat, Vec3, angle_deg, iso, normalize_or_zero, project_on_plane, rotate_towards},
    query::{CastShape, GeometryQuery},
    resolver::{ResolveRequest, resolve_penetrations},
    settings::ControllerSettings,
    state::{GroundingInfo, MovementState},
};

#[derive(Debug)]
pub struct PlayerController {
    settings: ControllerSettings,
    state: MovementState,
    grounding: GroundingInfo,
    body: Box<dyn BodyMotion>,
    frame: GravityFrame,
    look: LookState,
    anchor: AnchorPoint,
    target_gravity: Option<Vec3>,
    debug: DebugDraw,
}

impl PlayerController {
    /// Kinematic controller at `position`.
    pub fn new(settings: ControllerSettings, position: Vec3) -> Result<Self, ConfigError> {
        Self::with_body(settings, Box::new(KinematicBody::new(position)))
    }

    /// Controller driving a caller-supplied body (e.g. [`crate::body::DynamicBody`]).
    pub fn with_body(settings: ControllerSettings, body: Box<dyn BodyMotion>) -> Result<Self, ConfigError> {
        settings.validate()?;

        let position = body.position();
        info!(
            "player controller at {:?}: capsule height {:.2} m, radius {:.2} m, {}",
            position,
            settings.capsule.height(),
            settings.capsule.radius,
            if body.rides_anchor() { "kinematic" } else { "dynamic" },
        );

        Ok(Self {
            frame: GravityFrame::aligned_with(settings.gravity),
            state: MovementState::new(position),
            grounding: GroundingInfo::default(),
            body,
            look: LookState::default(),
            anchor: AnchorPoint::new(position),
            target_gravity: None,
            debug: DebugDraw::default(),
            settings,
        })
    }

    // ------------------------------------------------------------------
    // Per-frame
    // ------------------------------------------------------------------

    /// Variable-rate update: gravity and frame orientation, look, and input latching.
    pub fn tick(&mut self, dt: f32, input: &FrameInput) {
        let max_turn = self.settings.gravity_turn_rate * dt.max(0.0);

        if let Some(target) = self.target_gravity {
            let gravity = self.settings.gravity;
            let remaining = angle_deg(gravity, target).to_radians();
            self.settings.gravity = rotate_towards(gravity, target, max_turn);
            if remaining <= max_turn {
                trace!("gravity reached target {target:?}");
                self.target_gravity = None;
            }
        }
        self.frame.update(self.settings.gravity, max_turn);

        self.look.apply(input.look_delta, self.settings.camera_sensitivity);

        if input.jump {
            self.jump();
        }
        self.set_input_force(input.movement.direction(), self.settings.movement_speed);
    }

    // ------------------------------------------------------------------
    // Fixed step
    // ------------------------------------------------------------------

    pub fn fixed_tick<Q: GeometryQuery + ?Sized>(&mut self, query: &Q, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            trace!("skipping fixed step with dt {dt}");
            return;
        }

        let up = self.frame.up();
        let rotation = self.body_rotation();
        let capsule = self.settings.capsule;
        let mask = self.settings.collision_mask;

        self.body.begin_step();
        if self.body.rides_anchor() {
            let anchored = self.anchor.follow(query);
            self.state.anchor_velocity = (anchored - self.body.position()) / dt;
            self.body.set_position(anchored);
        }

        self.debug.clear();

        // The jump gate reads the ground the body stood on last step.
        let was_steep = self.grounding.ground_angle >= self.settings.max_slope_angle;
        let above_max_speed = self.state.current_speed >= self.settings.movement_speed * MAX_SPEED_FACTOR;

        let mut gravity = self.settings.gravity;

        apply_jump(
            &mut self.state,
            &self.grounding,
            &self.settings,
            up,
            gravity,
            was_steep,
        );

        if self.settings.predictive_collision {
            let mut forces = [gravity, self.state.input_force];
            let mut predicted_velocity = self.state.velocity + (forces[0] + forces[1]) * dt;
            let req = ResolveRequest {
                position: self.body.position() + predicted_velocity * dt,
                rotation,
                capsule,
                query_radius: self.settings.collision_query_radius,
                mask,
                iterations: PREDICTIVE_ITERATIONS,
            };
            resolve_penetrations(query, &req, &mut predicted_velocity, &mut forces);
            gravity = forces[0];
            self.state.input_force = forces[1];
        }

        // Forces.
        self.state.input_force *= slope_factor(&self.grounding, up);
        let applied = applied_forces(gravity, self.state.persistent_force, self.state.input_force);
        self.state.final_force = applied;
        self.state.velocity += applied * dt;

        if self.grounding.grounded {
            self.state.velocity = apply_ground_drag(self.state.velocity, self.state.ground_drag, dt);
        }

        // Ground.
        let was_grounded = self.grounding.grounded;
        let (snapped, grounding) = detect_ground(
            query,
            &GroundRequest {
                position: self.body.position(),
                rotation,
                up,
                velocity: self.state.velocity,
                dt,
                capsule,
                mask,
                max_step_height: self.settings.max_step_height,
                max_slope_angle: self.settings.max_slope_angle,
            },
            &mut self.debug,
        );
        self.grounding = grounding;
        if grounding.grounded {
            self.body.set_position(snapped);
        } else {
            self.state.time_since_grounded += dt;
        }

        if grounding.grounded != was_grounded {
            if grounding.grounded {
                debug!(
                    "landed on {:?} ({:.1} deg) at {:.2} m/s",
                    grounding.contact_surface, grounding.ground_angle, self.state.current_speed
                );
            } else {
                debug!("left the ground at {:.2} m/s", self.state.current_speed);
            }
        }

        // Routing uses this step's probe, so landing on a steep slope slides right away.
        let above_max_angle = grounding.grounded && grounding.above_max_angle;
        let apply_normal = !above_max_speed && !above_max_angle;

        if grounding.grounded {
            self.ground_response(grounding.ground_normal, apply_normal, above_max_angle, dt);
        }

        if !grounding.grounded || !apply_normal {
            self.airborne_response(query, up, above_max_angle, dt);
        }

        // Position.
        let foot = capsule.foot_world(self.body.position(), rotation);
        self.debug.ray(foot, grounding.ground_normal * DEBUG_RAY_LENGTH, NORMAL_COLOR);
        self.debug.ray(
            self.body.position(),
            normalize_or_zero(self.state.velocity) * DEBUG_RAY_LENGTH,
            VELOCITY_COLOR,
        );

        self.state.last_position = self.body.position();
        self.body.set_position(self.state.last_position + self.state.velocity * dt);

        let outcome = resolve_penetrations(
            query,
            &ResolveRequest {
                position: self.body.position(),
                rotation,
                capsule,
                query_radius: self.settings.collision_query_radius,
                mask,
                iterations: self.settings.collision_iterations,
            },
            &mut self.state.velocity,
            &mut [],
        );
        self.body.set_position(outcome.position);
        self.state.is_colliding = outcome.colliding;
        if outcome.colliding {
            self.debug.wire_sphere(outcome.position, capsule.radius, CONTACT_COLOR);
        }

        // Anchor.
        if grounding.grounded {
            self.anchor.set_parent(grounding.contact_surface, query);
        } else {
            self.state.velocity += self.state.anchor_velocity;
            self.state.anchor_velocity = Vec3::zeros();
            self.anchor.detach();
        }
        self.anchor.place(self.body.position(), query);

        self.state.current_speed = self.body.end_step(self.state.last_position, dt);

        self.state.pending_jump = false;
        self.state.input_force = Vec3::zeros();
    }

    /// Velocity response while standing on something.
    fn ground_response(&mut self, normal: Vec3, apply_normal: bool, above_max_angle: bool, dt: f32) {
        let s = &mut self.state;
        s.velocity = project_on_plane(s.velocity, normal);

        if apply_normal {
            if s.input_force == Vec3::zeros() && !s.pending_jump {
                s.velocity = apply_brakes(s.velocity, self.settings.braking_force, dt);
            }
            s.ground_drag = drag_force(s.velocity, self.settings.drag_coeff);
            s.jumps_made = 0;
            s.air_movement_timer = 0.0;
            s.time_since_grounded = 0.0;
        } else {
            // Sliding: input does not drive the body and steep slopes do not brake it.
            s.velocity -= s.input_force * dt;
            let braking = if above_max_angle {
                0.0
            } else {
                self.settings.slipping_braking_force
            };
            s.velocity = apply_brakes(s.velocity, braking, dt);
            s.ground_drag = Vec3::zeros();
            s.time_since_grounded += dt;
        }

        s.velocity = project_on_plane(s.velocity, normal);
    }

    /// Velocity response in the air or while sliding.
    fn airborne_response<Q: GeometryQuery + ?Sized>(&mut self, query: &Q, up: Vec3, above_max_angle: bool, dt: f32) {
        let grounded = self.grounding.grounded;

        // The ground probe can miss while the body is pressed against a wall; steer along it.
        if !grounded && self.state.is_colliding {
            let direction = normalize_or_zero(self.state.input_force);
            if direction != Vec3::zeros() {
                let hit = query.shape_cast(
                    &iso(self.body.position(), Quat::identity()),
                    CastShape::Sphere {
                        radius: SIDE_PROBE_RADIUS,
                    },
                    direction,
                    self.settings.collision_query_radius - SIDE_PROBE_RADIUS,
                    self.settings.collision_mask,
                );
                if let Some(hit) = hit {
                    let s = &mut self.state;
                    s.velocity -= s.input_force * dt;
                    s.input_force = project_on_plane(project_on_plane(s.input_force, hit.normal), up);
                    s.velocity += s.input_force * dt;
                }
            }
        }

        let s = &mut self.state;
        s.ground_drag = Vec3::zeros();
        s.air_movement_timer += dt;

        if !grounded {
            s.velocity -= s.input_force * dt;
        }

        if above_max_angle
            && grounded
            && normalize_or_zero(s.input_force).dot(&self.grounding.ground_normal) < 0.0
        {
            s.input_force = Vec3::zeros();
        }

        s.velocity = air_steer(
            s.velocity,
            s.input_force,
            up,
            dt,
            s.air_movement_timer,
            s.current_speed,
            &self.settings,
        );
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Request a jump on the next fixed step.
    pub fn jump(&mut self) {
        self.state.pending_jump = true;
    }

    /// Set the input drive from a body-local `direction`; `speed` becomes the new movement speed.
    pub fn set_input_force(&mut self, direction: Vec3, speed: f32) {
        self.settings.movement_speed = speed;
        self.state.input_force = input_force(direction, self.body_rotation(), self.settings.movement_acceleration());
    }

    pub fn add_velocity(&mut self, velocity: Vec3) {
        self.state.velocity += velocity;
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.state.velocity = velocity;
    }

    pub fn add_persistent_force(&mut self, force: Vec3) {
        self.state.persistent_force += force;
    }

    pub fn set_persistent_force(&mut self, force: Vec3) {
        self.state.persistent_force = force;
    }

    /// Replace gravity. The gravity frame turns toward it over the following frames.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.settings.gravity = gravity;
        self.target_gravity = None;
    }

    /// Turn gravity toward `target` at `gravity_turn_rate`, keeping its magnitude. `None` stops turning.
    pub fn set_target_gravity(&mut self, target: Option<Vec3>) {
        self.target_gravity = target;
    }

    /// Replace the settings after validating them; the old ones stay on error.
    pub fn apply_settings(&mut self, settings: ControllerSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Move the body without integrating (spawn, respawn). Velocity is kept.
    pub fn teleport(&mut self, position: Vec3) {
        self.body.sync_from_host(position);
        self.anchor = AnchorPoint::new(position);
        self.state.last_position = position;
        self.state.anchor_velocity = Vec3::zeros();
    }

    /// Report where the host's physics left a dynamic body.
    pub fn sync_from_host(&mut self, position: Vec3) {
        self.body.sync_from_host(position);
    }

    pub fn set_debug_draw(&mut self, enabled: bool) {
        self.debug.set_enabled(enabled);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    pub fn persistent_force(&self) -> Vec3 {
        self.state.persistent_force
    }

    pub fn final_force(&self) -> Vec3 {
        self.state.final_force
    }

    pub fn input_force(&self) -> Vec3 {
        self.state.input_force
    }

    pub fn current_speed(&self) -> f32 {
        self.state.current_speed
    }

    pub fn grounding(&self) -> &GroundingInfo {
        &self.grounding
    }

    pub fn gravity(&self) -> Vec3 {
        self.settings.gravity
    }

    pub fn position(&self) -> Vec3 {
        self.body.position()
    }

    /// Velocity to hand to the host rigid body, for dynamic bodies.
    pub fn velocity_command(&self) -> Option<Vec3> {
        self.body.velocity_command()
    }

    pub fn gravity_frame(&self) -> &GravityFrame {
        &self.frame
    }

    pub fn up(&self) -> Vec3 {
        self.frame.up()
    }

    pub fn look(&self) -> &LookState {
        &self.look
    }

    pub fn anchor(&self) -> &AnchorPoint {
        &self.anchor
    }

    /// World rotation of the body: the gravity frame plus yaw.
    pub fn body_rotation(&self) -> Quat {
        self.frame.rotation() * self.look.yaw_rotation()
    }

    /// World rotation of the camera: body rotation plus pitch.
    pub fn camera_rotation(&self) -> Quat {
        self.body_rotation() * self.look.pitch_rotation()
    }

    pub fn foot_position(&self) -> Vec3 {
        self.settings.capsule.foot_world(self.body.position(), self.body_rotation())
    }

    pub fn head_position(&self) -> Vec3 {
        self.settings.capsule.head_world(self.body.position(), self.body_rotation())
    }

    /// Gap between the feet and whatever lies straight below, up to `max_distance`.
    pub fn ground_distance<Q: GeometryQuery + ?Sized>(&self, query: &Q, max_distance: f32) -> Option<f32> {
        ground_distance(
            query,
            self.foot_position(),
            self.up(),
            max_distance,
            self.settings.collision_mask,
        )
    }

    /// Draw commands recorded during the last fixed step.
    pub fn debug_draw(&self) -> &DebugDraw {
        &self.debug
    }

    /// Foot and head markers, the overlap query radius, then the last step's probes.
    pub fn debug_draw_selected(&self, renderer: &mut dyn GizmoRenderer) {
        let mut markers = DebugDraw::new(true);
        markers.wire_sphere(self.foot_position(), MARKER_RADIUS, MARKER_COLOR);
        markers.wire_sphere(self.head_position(), MARKER_RADIUS, MARKER_COLOR);
        markers.wire_sphere(
            self.body.position(),
            self.settings.collision_query_radius,
            QUERY_RADIUS_COLOR,
        );
        markers.flush(renderer);
        self.debug.flush(renderer);
    }
}
