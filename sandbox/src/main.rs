//! Headless driver: runs a controller through the demo scene with scripted input.
//!
//! Usage: `sandbox [config.toml]`. Logging follows `RUST_LOG` (default `info`).

mod scene;
mod script;

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use locomotion::{ControllerSettings, FixedTimestep, PlayerController, SurfaceId, Vec3};
use log::info;
use serde::Deserialize;

use crate::{
    scene::{MovingPlatform, PLATFORM_ID},
    script::{InputSegment, ScriptPlayer, default_timeline},
};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct SandboxConfig {
    /// Physics step (seconds).
    fixed_dt: f32,
    /// Simulated render frame (seconds).
    frame_dt: f32,
    duration_s: f32,
    /// Log a state line every this many frames.
    log_every: u32,
    spawn: Vec3,
    settings: ControllerSettings,
    script: Vec<InputSegment>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 0.02,
            frame_dt: 1.0 / 60.0,
            duration_s: 6.0,
            log_every: 15,
            spawn: Vec3::new(0.0, 1.05, 0.0),
            settings: ControllerSettings {
                max_jumps: 2,
                ..ControllerSettings::default()
            },
            script: default_timeline(),
        }
    }
}

impl SandboxConfig {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => SandboxConfig::load(Path::new(&path))?,
        None => SandboxConfig::default(),
    };
    if config.frame_dt.is_nan() || config.frame_dt <= 0.0 {
        bail!("frame_dt must be positive, got {}", config.frame_dt);
    }

    let mut world = scene::build();
    let mut platform = MovingPlatform::new(SurfaceId(PLATFORM_ID), Vec3::new(-8.0, 0.25, 0.0));
    let mut controller = PlayerController::new(config.settings.clone(), config.spawn)?;
    let mut clock = FixedTimestep::new(config.fixed_dt)?;
    let mut script = ScriptPlayer::new(config.script.clone());

    let frames = (config.duration_s / config.frame_dt).ceil() as u32;
    let log_every = config.log_every.max(1);
    let mut time_s = 0.0f32;

    for frame in 0..frames {
        let input = script.sample(time_s);
        controller.tick(config.frame_dt, &input);

        for _ in 0..clock.advance(config.frame_dt) {
            platform.advance(&mut world, clock.fixed_dt());
            controller.fixed_tick(&world, clock.fixed_dt());
        }
        time_s += config.frame_dt;

        if frame % log_every == 0 {
            let p = controller.position();
            let g = controller.grounding();
            info!(
                "t={time_s:5.2}s pos=({:6.2}, {:6.2}, {:6.2}) speed={:5.2} grounded={} angle={:4.1} jumps={}",
                p.x,
                p.y,
                p.z,
                controller.current_speed(),
                g.grounded,
                g.ground_angle,
                controller.state().jumps_made,
            );
        }
    }

    let p = controller.position();
    info!(
        "done after {time_s:.2}s at ({:.2}, {:.2}, {:.2}), ground distance {:?}",
        p.x,
        p.y,
        p.z,
        controller.ground_distance(&world, 5.0)
    );
    Ok(())
}
