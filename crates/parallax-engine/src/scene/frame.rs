use glam::Mat4;

/// Per-eye values a drawable may need while recording.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameContext {
    pub projection: Mat4,
    pub view: Mat4,
    /// Animation phase in `[0, 1)`.
    pub time: f32,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self { projection: Mat4::IDENTITY, view: Mat4::IDENTITY, time: 0.0 }
    }
}
