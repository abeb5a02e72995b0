/*!
Typed diagnostic draw commands.

The controller records what it probed during the last fixed step into an
instance-owned [`DebugDraw`] buffer. Hosts that want to visualise it hand a
[`GizmoRenderer`] to [`DebugDraw::flush`]; hosts that do not simply ignore the
buffer. Nothing here is global.
*/

use crate::math::Vec3;

/// Linear RGBA color.
pub type Rgba = [f32; 4];

pub const GROUND_PROBE_COLOR: Rgba = [1.0, 1.0, 0.0, 0.25];
pub const QUERY_RADIUS_COLOR: Rgba = [0.0, 0.0, 1.0, 0.25];
pub const NORMAL_COLOR: Rgba = [0.0, 0.0, 1.0, 1.0];
pub const VELOCITY_COLOR: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const MARKER_COLOR: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const CONTACT_COLOR: Rgba = [1.0, 0.0, 1.0, 0.5];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    WireSphere {
        center: Vec3,
        radius: f32,
        color: Rgba,
    },
    Cube {
        center: Vec3,
        size: Vec3,
        color: Rgba,
    },
    Ray {
        origin: Vec3,
        direction: Vec3,
        color: Rgba,
    },
}

/// Host-side sink for draw commands.
pub trait GizmoRenderer {
    fn draw(&mut self, command: &DrawCommand);
}

/// Per-controller queue of draw commands, reset at the start of every fixed step.
#[derive(Clone, Debug, Default)]
pub struct DebugDraw {
    enabled: bool,
    commands: Vec<DrawCommand>,
}

impl DebugDraw {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            commands: Vec::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.commands.clear();
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        if self.enabled {
            self.commands.push(command);
        }
    }

    pub fn wire_sphere(&mut self, center: Vec3, radius: f32, color: Rgba) {
        self.push(DrawCommand::WireSphere {
            center,
            radius,
            color,
        });
    }

    pub fn cube(&mut self, center: Vec3, size: Vec3, color: Rgba) {
        self.push(DrawCommand::Cube {
            center,
            size,
            color,
        });
    }

    pub fn ray(&mut self, origin: Vec3, direction: Vec3, color: Rgba) {
        self.push(DrawCommand::Ray {
            origin,
            direction,
            color,
        });
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Replay every queued command into `renderer`, oldest first.
    pub fn flush(&self, renderer: &mut dyn GizmoRenderer) {
        for command in &self.commands {
            renderer.draw(command);
        }
    }
}
