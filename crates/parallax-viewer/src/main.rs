mod app;
mod args;
mod builder;
mod demo;
mod headless;
mod manifest;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use parallax_engine::logging::{LoggingConfig, init_logging};

use crate::app::Viewer;
use crate::args::Args;
use crate::builder::SceneSource;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(LoggingConfig { env_filter: args.log.clone(), ..Default::default() });

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let source = SceneSource::from_arg(args.scene.as_deref())?;
    let stereo = source.stereo_config(args.mono);

    if args.headless {
        headless::run(
            &source,
            source.renderer_config(),
            stereo,
            (args.width, args.height),
            args.max_frames,
        )?;
        return Ok(());
    }

    Viewer::new(source)
        .title(args.title)
        .size(args.width, args.height)
        .vsync(!args.no_vsync)
        .stereo(stereo)
        .launch()
}
