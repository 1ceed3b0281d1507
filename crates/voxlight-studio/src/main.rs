mod app;
mod args;
mod phantom;
mod presets;

use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use voxlight_engine::animation::AnimationConfig;
use voxlight_engine::device::GpuInit;
use voxlight_engine::logging::{init_logging, LoggingConfig};
use voxlight_engine::render::volume::MapperConfig;
use voxlight_engine::scene::VolumeNode;
use voxlight_engine::window::{Runtime, RuntimeConfig};
use voxlight_engine::Session;

use crate::app::Studio;
use crate::args::{get_command, StudioArgs};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let matches = get_command().get_matches();
    let args = StudioArgs::from_matches(&matches).map_err(anyhow::Error::msg)?;
    log::debug!("{args:?}");

    let mut mapper = MapperConfig::default();
    if let Some(dir) = args.shader_dir.clone() {
        mapper.shader_dir = Some(dir);
    }

    let mut session = Session::new(mapper, AnimationConfig::default());

    let volume = phantom::ct_phantom(args.size).context("failed to generate phantom volume")?;
    session.set_volume(VolumeNode::new(volume));

    for name in &args.presets {
        if let Some(tf) = presets::preset(name) {
            session.add_transfer_function(&tf);
        }
    }

    if let Some(path) = &args.load {
        let bytes = fs::read(path).with_context(|| format!("couldn't load {}", path.display()))?;
        session
            .load_transfer_functions(&bytes, Instant::now())
            .with_context(|| format!("couldn't load {}", path.display()))?;
    } else if !session.bank().is_empty() {
        session.start_animation(Instant::now());
    }

    let studio = Studio::new(session, args.rotation, args.transition, args.save, args.thumbnails);

    Runtime::run(
        RuntimeConfig {
            title: "voxlight".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        studio,
    )
}
