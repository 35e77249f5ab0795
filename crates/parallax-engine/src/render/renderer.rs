use glam::{Mat3, Mat4, Vec3};
use thiserror::Error;

use crate::scene::{DrawList, FrameContext, NodeId, Scene, SceneError};
use crate::shader::{names, LinkError, ShaderCollection, ShaderError, ShaderProgram};
use crate::time::{AnimationClock, DEFAULT_ANIMATION_RATE};
use crate::tracking::{capture, Eye, StereoTracker, TrackingSample, TOP_BUTTON};

/// Renderer settings that do not belong to the stereo frustum.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RendererConfig {
    pub clear_color: wgpu::Color,
    /// Animation phase advance per second.
    pub animation_rate: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            animation_rate: DEFAULT_ANIMATION_RATE,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RenderState {
    Uninitialized,
    Configured,
    Rendering,
    ShutDown,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("`{op}` is not allowed while the renderer is {state:?}")]
    InvalidState { op: &'static str, state: RenderState },

    #[error("no shader programs were supplied")]
    NoShaders,

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("shader `{label}` failed to link")]
    Link {
        label: String,
        #[source]
        source: LinkError,
    },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Eye of the no-head view, on the (1, 1, 1) diagonal and well inside the
/// default far plane.
const FALLBACK_EYE: Vec3 = Vec3::splat(0.5);

/// View used by both eyes when the tracker reports no head pose.
pub fn fallback_view() -> Mat4 {
    Mat4::look_at_rh(FALLBACK_EYE, Vec3::ZERO, Vec3::Y)
}

/// The draws recorded for one frame, one list per eye.
#[derive(Debug, Default)]
pub struct StereoFrame {
    lists: [DrawList; 2],
    frame_index: u64,
    time: f32,
    sample: Option<TrackingSample>,
}

impl StereoFrame {
    #[inline]
    pub fn eye(&self, eye: Eye) -> &DrawList {
        &self.lists[eye.index()]
    }

    /// Number of frames recorded before this one.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Animation phase pushed as `time`.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// The tracking sample both eyes were recorded from.
    #[inline]
    pub fn sample(&self) -> Option<&TrackingSample> {
        self.sample.as_ref()
    }

    pub fn element_total(&self) -> u64 {
        self.lists.iter().map(DrawList::element_total).sum()
    }

    pub fn draw_count(&self) -> usize {
        self.lists.iter().map(DrawList::len).sum()
    }
}

/// Drives the scene once per frame: samples the tracker, pushes the frame
/// uniforms and records the scene for each eye.
///
/// Lifecycle: `Uninitialized -> configure -> Configured -> record_frame ->
/// Rendering -> shutdown -> ShutDown`. Recording never touches the GPU; a
/// [`FrameExecutor`](super::FrameExecutor) replays the resulting
/// [`StereoFrame`].
#[derive(Debug)]
pub struct SceneRenderer {
    config: RendererConfig,
    state: RenderState,
    shaders: ShaderCollection,
    scene: Scene,
    root: Option<NodeId>,
    clock: AnimationClock,
    frame: StereoFrame,
    frames_recorded: u64,
}

impl SceneRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            clock: AnimationClock::new(config.animation_rate),
            config,
            state: RenderState::Uninitialized,
            shaders: ShaderCollection::new(),
            scene: Scene::new(),
            root: None,
            frame: StereoFrame::default(),
            frames_recorded: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> RenderState {
        self.state
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[inline]
    pub fn shaders(&self) -> &ShaderCollection {
        &self.shaders
    }

    pub fn active_shader(&self) -> Option<&ShaderProgram> {
        self.shaders.active()
    }

    /// The most recently recorded frame.
    #[inline]
    pub fn last_frame(&self) -> &StereoFrame {
        &self.frame
    }

    /// Links every program and binds the scene's runtime layouts to the
    /// active one. Any link failure is returned and leaves the renderer
    /// uninitialized.
    pub fn configure(
        &mut self,
        mut shaders: ShaderCollection,
        scene: Scene,
        root: NodeId,
    ) -> Result<(), RenderError> {
        if self.state != RenderState::Uninitialized {
            return Err(RenderError::InvalidState { op: "configure", state: self.state });
        }
        if shaders.is_empty() {
            return Err(RenderError::NoShaders);
        }
        shaders
            .link_all()
            .map_err(|(label, source)| RenderError::Link { label, source })?;
        if scene.get(root).is_none() {
            return Err(SceneError::UnknownNode(root).into());
        }

        let mut scene = scene;
        if let Some(active) = shaders.active() {
            scene.resolve_shader_locations(active);
        }

        log::info!(
            "renderer configured: {} shader(s), {} scene node(s)",
            shaders.len(),
            scene.len()
        );

        self.shaders = shaders;
        self.scene = scene;
        self.root = Some(root);
        self.state = RenderState::Configured;
        Ok(())
    }

    /// Records both eyes of one frame.
    ///
    /// The tracker is sampled exactly once, before either eye is recorded.
    pub fn record_frame(
        &mut self,
        tracker: &mut dyn StereoTracker,
        dt: f32,
    ) -> Result<&StereoFrame, RenderError> {
        let root = match (self.state, self.root) {
            (RenderState::Configured | RenderState::Rendering, Some(root)) => root,
            (state, _) => return Err(RenderError::InvalidState { op: "record_frame", state }),
        };

        if self.clock.advance(dt) {
            self.scene.advance_animations();
        }
        let time = self.clock.phase();
        let sample = capture(tracker);

        let shader = self.shaders.active_mut().ok_or(RenderError::NoShaders)?;
        let projection_loc = shader.lookup_uniform(names::PROJECTION_MATRIX);
        let modelview_loc = shader.lookup_uniform(names::MODELVIEW_MATRIX);
        let normal_loc = shader.lookup_uniform(names::NORMAL_MATRIX);
        let time_loc = shader.lookup_uniform(names::TIME);
        let opacity_loc = shader.lookup_uniform(names::OPACITY);

        for eye in Eye::BOTH {
            let pose = sample.eye(eye);
            let view = if sample.head.is_some() { pose.view } else { fallback_view() };
            let modelview = model_view(view, &sample);

            shader.begin()?;
            shader.set_uniform(projection_loc, pose.projection);
            shader.set_uniform(modelview_loc, modelview);
            shader.set_uniform(normal_loc, Mat3::from_mat4(modelview).inverse().transpose());
            shader.set_uniform(time_loc, time);
            shader.set_uniform(opacity_loc, 1.0f32);

            let ctx = FrameContext { projection: pose.projection, view: modelview, time };
            let list = &mut self.frame.lists[eye.index()];
            list.clear();
            self.scene.render(root, &ctx, shader, list);

            shader.end();
        }

        self.frame.frame_index = self.frames_recorded;
        self.frame.time = time;
        self.frame.sample = Some(sample);
        self.frames_recorded += 1;
        self.state = RenderState::Rendering;
        Ok(&self.frame)
    }

    /// Activates the next shader program and rebinds runtime layouts to it.
    pub fn cycle_shader(&mut self) {
        self.shaders.cycle();
        if let Some(active) = self.shaders.active() {
            self.scene.resolve_shader_locations(active);
            log::info!("active shader: `{}`", active.label());
        }
    }

    /// Advances every animated switch group by one child.
    pub fn advance_animations(&mut self) {
        self.scene.advance_animations();
    }

    /// Releases the scene and all recorded draws. Further frames are refused.
    pub fn shutdown(&mut self) {
        if self.state == RenderState::ShutDown {
            return;
        }
        self.frame = StereoFrame::default();
        self.scene = Scene::new();
        self.root = None;
        self.state = RenderState::ShutDown;
        log::info!("renderer shut down after {} frame(s)", self.frames_recorded);
    }
}

/// `view * pointer * scale` while the top pointer button is held.
fn model_view(view: Mat4, sample: &TrackingSample) -> Mat4 {
    match sample.pointer {
        Some(p) if p.pressed(TOP_BUTTON) => {
            view * p.pose * Mat4::from_scale(Vec3::splat(sample.world_scale))
        }
        _ => view,
    }
}
