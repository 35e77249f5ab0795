use std::path::PathBuf;

use clap::Parser;

/// Stereo viewer for point clouds and meshes.
///
/// Without `--scene` a built-in animated demo is shown.
#[derive(Debug, Parser)]
#[command(name = "parallax-viewer", version, about)]
pub struct Args {
    /// JSON scene manifest. Relative paths inside it resolve against its directory.
    #[arg(long, value_name = "PATH")]
    pub scene: Option<PathBuf>,

    #[arg(long, default_value = "parallax")]
    pub title: String,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Present the left eye only, full window.
    #[arg(long)]
    pub mono: bool,

    #[arg(long)]
    pub no_vsync: bool,

    /// Record frames without a window or GPU.
    #[arg(long)]
    pub headless: bool,

    /// Frames to record in headless mode.
    #[arg(long, default_value_t = 120, value_name = "N")]
    pub max_frames: u64,

    /// Log filter (`env_logger` syntax); overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}
