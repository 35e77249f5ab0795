//! Head and pointer tracking.
//!
//! The renderer only sees the [`StereoTracker`] trait: per-eye view and
//! projection matrices, an optional head pose, and a tracked pointer with
//! buttons. [`capture`] samples everything once per frame so both eyes of a
//! frame observe the same poses.

mod desktop;

pub use desktop::DesktopStereoRig;

use glam::Mat4;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

/// Pointer button ids.
pub const TOP_BUTTON: usize = 0;
pub const LEFT_BUTTON: usize = 1;
pub const RIGHT_BUTTON: usize = 2;

pub const BUTTON_COUNT: usize = 3;

/// The source of stereo poses. Implemented by hardware backends and by
/// [`DesktopStereoRig`].
pub trait StereoTracker {
    /// Refreshes tracked targets. Called once per frame before any query.
    fn capture_targets(&mut self);

    fn head_pose(&self) -> Option<Mat4>;

    /// Pose of the tracked pointer (stylus) in world space.
    fn primary_pose(&self) -> Option<Mat4>;

    fn button_state(&self, id: usize) -> bool;

    /// Moves the stereo frustum to follow a head pose.
    fn set_head_pose(&mut self, pose: Mat4);

    fn eye_view_matrix(&self, eye: Eye) -> Mat4;

    fn eye_projection_matrix(&self, eye: Eye) -> Mat4;

    fn world_scale(&self) -> f32;

    /// Drawable surface size in physical pixels.
    fn resize(&mut self, width: u32, height: u32);
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerSample {
    pub pose: Mat4,
    pub buttons: [bool; BUTTON_COUNT],
}

impl PointerSample {
    #[inline]
    pub fn pressed(&self, id: usize) -> bool {
        self.buttons.get(id).copied().unwrap_or(false)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EyePose {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Everything the renderer reads from the tracker during one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackingSample {
    pub head: Option<Mat4>,
    pub pointer: Option<PointerSample>,
    pub world_scale: f32,
    eyes: [EyePose; 2],
}

impl TrackingSample {
    #[inline]
    pub fn eye(&self, eye: Eye) -> &EyePose {
        &self.eyes[eye.index()]
    }
}

/// Samples `tracker` once. The head pose, when present, is pushed into the
/// frustum before the eye matrices are read.
pub fn capture(tracker: &mut dyn StereoTracker) -> TrackingSample {
    tracker.capture_targets();

    let head = tracker.head_pose();
    if let Some(pose) = head {
        tracker.set_head_pose(pose);
    }

    let pointer = tracker.primary_pose().map(|pose| PointerSample {
        pose,
        buttons: std::array::from_fn(|id| tracker.button_state(id)),
    });

    let eyes = Eye::BOTH.map(|eye| EyePose {
        view: tracker.eye_view_matrix(eye),
        projection: tracker.eye_projection_matrix(eye),
    });

    TrackingSample { head, pointer, world_scale: tracker.world_scale(), eyes }
}
