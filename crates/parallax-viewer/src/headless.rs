//! Frame loop without a window: buffers live in host memory and frames are
//! recorded but never submitted.

use anyhow::Result;

use parallax_engine::device::HostAllocator;
use parallax_engine::render::{RendererConfig, SceneRenderer, StereoConfig};
use parallax_engine::tracking::{DesktopStereoRig, StereoTracker};

use crate::builder::SceneSource;

/// Simulated frame time.
const DT: f32 = 1.0 / 60.0;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct HeadlessReport {
    pub frames: u64,
    /// Draws over both eyes of every frame.
    pub draws: u64,
    pub elements: u64,
    /// Largest single-frame draw count.
    pub peak_draws: usize,
}

pub fn run(
    source: &SceneSource,
    renderer_config: RendererConfig,
    stereo: StereoConfig,
    size: (u32, u32),
    frames: u64,
) -> Result<HeadlessReport> {
    let built = source.build(&HostAllocator::new())?;
    let mut renderer = SceneRenderer::new(renderer_config);
    renderer.configure(built.shaders, built.scene, built.root)?;

    let mut rig = DesktopStereoRig::new(stereo);
    rig.resize(size.0, size.1);

    let mut report = HeadlessReport::default();
    for _ in 0..frames {
        let frame = renderer.record_frame(&mut rig, DT)?;
        report.frames += 1;
        report.draws += frame.draw_count() as u64;
        report.elements += frame.element_total();
        report.peak_draws = report.peak_draws.max(frame.draw_count());
        if frame.frame_index() % 60 == 0 {
            log::debug!(
                "frame {}: {} draw(s), {} element(s), phase {:.2}",
                frame.frame_index(),
                frame.draw_count(),
                frame.element_total(),
                frame.time()
            );
        }
    }
    renderer.shutdown();

    log::info!(
        "headless: {} frame(s), {} draw(s), {} element(s), peak {} draw(s) per frame",
        report.frames,
        report.draws,
        report.elements,
        report.peak_draws
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::POINTS_PER_FRAME;

    #[test]
    fn demo_records_both_eyes() {
        let source = SceneSource::Demo;
        let report = run(
            &source,
            source.renderer_config(),
            source.stereo_config(false),
            (800, 600),
            3,
        )
        .unwrap();

        assert_eq!(report.frames, 3);
        // The crossfade draws at least its current cloud in each eye.
        assert!(report.peak_draws >= 2);
        assert!(report.elements >= 3 * 2 * POINTS_PER_FRAME as u64);
    }

    #[test]
    fn zero_frames_is_empty_report() {
        let source = SceneSource::Demo;
        let report =
            run(&source, RendererConfig::default(), StereoConfig::default(), (64, 64), 0).unwrap();
        assert_eq!(report, HeadlessReport::default());
    }
}
