//! Stereo rendering.
//!
//! [`SceneRenderer`] records a [`StereoFrame`] (one draw list per eye) from
//! the scene and a tracker; [`FrameExecutor`] replays it into a single wgpu
//! render pass, one viewport per presented eye.
//!
//! Convention:
//! - right-handed world space, +Y up, camera looking down -Z
//! - depth in `[0, 1]`, cleared to 1.0 and tested with `Less`

mod builtin;
mod ctx;
mod executor;
mod renderer;
mod stereo;

pub use builtin::{mesh_program, points_program, MESH_WGSL, POINTS_WGSL};
pub use ctx::{RenderCtx, RenderTarget};
pub use executor::{
    check_layout, DrawRejection, ExecuteStats, FrameExecutor, LayoutLimits, DEPTH_FORMAT,
};
pub use renderer::{
    fallback_view, RenderError, RenderState, RendererConfig, SceneRenderer, StereoFrame,
};
pub use stereo::{eye_viewport, EyeViewport, StereoConfig, StereoMode};
