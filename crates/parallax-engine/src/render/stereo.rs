use crate::tracking::Eye;

/// How the two eye images share the surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum StereoMode {
    /// Left eye on the left half, right eye on the right half.
    #[default]
    SideBySide,
    /// Left eye only, full surface.
    Mono,
}

/// Stereo frustum parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StereoConfig {
    /// Inter-pupillary distance in world units.
    pub ipd: f32,
    pub near: f32,
    pub far: f32,
    pub world_scale: f32,
    /// Multiplier on the eye separation; 0 collapses both eyes to the head.
    pub stereo_level: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub mode: StereoMode,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            ipd: 0.04,
            near: 0.01,
            far: 1.5,
            world_scale: 4.0,
            stereo_level: 1.0,
            fov_y: 45f32.to_radians(),
            mode: StereoMode::SideBySide,
        }
    }
}

/// Pixel rectangle of the surface an eye renders into.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EyeViewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl EyeViewport {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Viewport of `eye` on a `width x height` surface, or `None` when the eye
/// is not presented in `mode`.
pub fn eye_viewport(mode: StereoMode, eye: Eye, width: u32, height: u32) -> Option<EyeViewport> {
    match (mode, eye) {
        (StereoMode::Mono, Eye::Left) => Some(EyeViewport { x: 0, y: 0, width, height }),
        (StereoMode::Mono, Eye::Right) => None,
        (StereoMode::SideBySide, eye) => {
            let half = width / 2;
            let x = if eye == Eye::Left { 0 } else { half };
            let w = if eye == Eye::Left { half } else { width - half };
            Some(EyeViewport { x, y: 0, width: w, height })
        }
    }
}
