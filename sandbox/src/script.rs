//! Scripted input timeline standing in for a keyboard and mouse.

use locomotion::{FrameInput, MovementInput};
use serde::{Deserialize, Serialize};

/// Input held from `start_s` until the next segment starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSegment {
    pub start_s: f32,
    pub movement: MovementInput,
    /// Press jump once, on the first frame of the segment.
    pub jump: bool,
    /// Look delta applied every frame of the segment.
    pub look_delta: (f32, f32),
}

/// Walk forward, hop the step, turn, double-jump and stop.
pub fn default_timeline() -> Vec<InputSegment> {
    let forward = MovementInput {
        forward: true,
        ..MovementInput::default()
    };
    vec![
        InputSegment::default(),
        InputSegment {
            start_s: 0.5,
            movement: forward,
            ..InputSegment::default()
        },
        InputSegment {
            start_s: 1.5,
            movement: forward,
            jump: true,
            ..InputSegment::default()
        },
        InputSegment {
            start_s: 2.5,
            movement: forward,
            look_delta: (0.2, 0.0),
            ..InputSegment::default()
        },
        InputSegment {
            start_s: 3.5,
            jump: true,
            ..InputSegment::default()
        },
        InputSegment {
            start_s: 3.7,
            jump: true,
            ..InputSegment::default()
        },
        InputSegment {
            start_s: 4.0,
            ..InputSegment::default()
        },
    ]
}

/// Replays a timeline frame by frame.
#[derive(Debug)]
pub struct ScriptPlayer {
    segments: Vec<InputSegment>,
    current: Option<usize>,
}

impl ScriptPlayer {
    pub fn new(mut segments: Vec<InputSegment>) -> Self {
        segments.sort_by(|a, b| a.start_s.total_cmp(&b.start_s));
        Self {
            segments,
            current: None,
        }
    }

    /// Input for the frame starting at `time_s`. Times must not go backwards.
    pub fn sample(&mut self, time_s: f32) -> FrameInput {
        let active = self.segments.iter().rposition(|s| s.start_s <= time_s);
        let Some(index) = active else {
            return FrameInput::default();
        };
        let entered = self.current != Some(index);
        self.current = Some(index);

        let segment = &self.segments[index];
        FrameInput {
            movement: segment.movement,
            jump: segment.jump && entered,
            look_delta: segment.look_delta,
        }
    }
}
