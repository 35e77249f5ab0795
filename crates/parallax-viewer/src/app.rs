use anyhow::Result;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::window::WindowId;

use parallax_engine::core::{App as EngineApp, AppControl, FrameCtx, WindowCtx};
use parallax_engine::device::{Gpu, GpuInit};
use parallax_engine::input::Key;
use parallax_engine::render::{FrameExecutor, RendererConfig, SceneRenderer, StereoConfig};
use parallax_engine::tracking::{DesktopStereoRig, StereoTracker};
use parallax_engine::window::{Runtime, RuntimeConfig};

use crate::builder::SceneSource;

// ── Viewer ────────────────────────────────────────────────────────────────

/// Windowed viewer: builds the scene once the GPU exists and presents both
/// eyes every frame.
///
/// | Key | Action |
/// |-----|--------|
/// | Escape | close |
/// | S | next shader |
/// | N | advance animated groups |
///
/// Camera keys are handled by [`DesktopStereoRig`].
pub struct Viewer {
    source: SceneSource,
    title: String,
    size: (u32, u32),
    vsync: bool,
    renderer_config: RendererConfig,
    stereo: StereoConfig,
}

impl Viewer {
    pub fn new(source: SceneSource) -> Self {
        let renderer_config = source.renderer_config();
        let stereo = source.stereo_config(false);
        Self {
            source,
            title: "parallax".to_string(),
            size: (1280, 720),
            vsync: true,
            renderer_config,
            stereo,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn stereo(mut self, stereo: StereoConfig) -> Self {
        self.stereo = stereo;
        self
    }

    /// Blocks until the window closes.
    pub fn launch(self) -> Result<()> {
        let config = RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.size.0 as f64, self.size.1 as f64),
            exit_on_escape: true,
        };
        let gpu_init = GpuInit::default().with_vsync(self.vsync);
        let state = ViewerState {
            renderer: SceneRenderer::new(self.renderer_config),
            executor: FrameExecutor::new(),
            rig: DesktopStereoRig::new(self.stereo),
            source: self.source,
            title: self.title,
        };
        Runtime::run(config, gpu_init, state)
    }
}

// ── ViewerState ───────────────────────────────────────────────────────────

struct ViewerState {
    source: SceneSource,
    renderer: SceneRenderer,
    executor: FrameExecutor,
    rig: DesktopStereoRig,
    title: String,
}

impl ViewerState {
    fn window_title(&self) -> String {
        match self.renderer.active_shader() {
            Some(shader) => format!("{} [{}]", self.title, shader.label()),
            None => self.title.clone(),
        }
    }
}

impl EngineApp for ViewerState {
    fn on_init(&mut self, window: &WindowCtx<'_>, gpu: &mut Gpu<'_>) -> Result<()> {
        let built = self.source.build(gpu.device())?;
        self.renderer.configure(built.shaders, built.scene, built.root)?;

        let (width, height) = window.physical_size();
        self.rig.resize(width, height);
        window.window.set_title(&self.window_title());
        Ok(())
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if matches!(event, WindowEvent::CloseRequested) {
            self.renderer.shutdown();
        }
        AppControl::Continue
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.rig.resize(width, height);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        let dt = ctx.time.dt;

        if ctx.input_frame.pressed(Key::S) {
            self.renderer.cycle_shader();
            ctx.runtime.set_title(self.window_title());
        }
        if ctx.input_frame.pressed(Key::N) {
            self.renderer.advance_animations();
        }
        self.rig.apply_input(ctx.input, ctx.input_frame, dt);

        let mode = self.rig.config().mode;
        let clear_color = self.renderer.config().clear_color;
        let frame = self.renderer.record_frame(&mut self.rig, dt)?;

        let executor = &mut self.executor;
        ctx.present(|rctx, target| {
            let stats = executor.execute(rctx, target, frame, mode, clear_color);
            log::trace!("{} draw(s), {} skipped, {} element(s)", stats.draws, stats.skipped, stats.elements);
        })
    }
}
