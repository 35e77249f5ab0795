use thiserror::Error;

/// GPU object creation failure.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("buffer `{label}` needs {size} bytes but the device allows at most {max}")]
    BufferTooLarge { label: String, size: u64, max: u64 },
}

/// What the frame loop does after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering resumes next frame.
    Reconfigured,
    /// Transient; drop this frame.
    SkipFrame,
    /// Out of memory or similar; stop the loop.
    Fatal,
}
