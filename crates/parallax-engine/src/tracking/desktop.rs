use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use crate::input::{InputFrame, InputState, Key};
use crate::render::{eye_viewport, StereoConfig};

use super::{Eye, StereoTracker, BUTTON_COUNT, LEFT_BUTTON, RIGHT_BUTTON, TOP_BUTTON};

const ORBIT_SPEED: f32 = 1.0; // rad/s
const ZOOM_SPEED: f32 = 1.5; // distance factor per second
const POINTER_SPEED: f32 = 1.5; // rad/s
const MIN_DISTANCE: f32 = 0.05;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Keyboard-driven stand-in for a stereo tracking system.
///
/// A simulated head orbits the origin looking at it; a simulated pointer sits
/// at the origin and turns about +Y.
///
/// | Key | Action |
/// |-----|--------|
/// | Arrows | orbit the head |
/// | PageUp / PageDown | move the head closer / further |
/// | A / D | turn the pointer |
/// | Space / Q / E | hold pointer buttons 0 / 1 / 2 |
/// | H | toggle head tracking |
#[derive(Debug, Clone)]
pub struct DesktopStereoRig {
    config: StereoConfig,
    yaw: f32,
    pitch: f32,
    distance: f32,
    pointer_yaw: f32,
    held: [bool; BUTTON_COUNT],
    head_tracking: bool,
    eye_aspect: f32,

    captured_head: Mat4,
    captured_pointer: Mat4,
    captured_buttons: [bool; BUTTON_COUNT],
    frustum_head: Mat4,
}

impl DesktopStereoRig {
    pub fn new(config: StereoConfig) -> Self {
        // Start on the (1, 1, 1) diagonal.
        let dir = Vec3::ONE.normalize();
        let mut rig = Self {
            config,
            yaw: dir.x.atan2(dir.z),
            pitch: dir.y.asin(),
            distance: 0.8,
            pointer_yaw: 0.0,
            held: [false; BUTTON_COUNT],
            head_tracking: true,
            eye_aspect: 1.0,
            captured_head: Mat4::IDENTITY,
            captured_pointer: Mat4::IDENTITY,
            captured_buttons: [false; BUTTON_COUNT],
            frustum_head: Mat4::IDENTITY,
        };
        rig.captured_head = rig.simulated_head();
        rig.frustum_head = rig.captured_head;
        rig
    }

    #[inline]
    pub fn config(&self) -> &StereoConfig {
        &self.config
    }

    #[inline]
    pub fn head_tracking(&self) -> bool {
        self.head_tracking
    }

    pub fn set_head_tracking(&mut self, on: bool) {
        self.head_tracking = on;
    }

    /// Moves the simulated targets from the keyboard state.
    pub fn apply_input(&mut self, keys: &InputState, frame: &InputFrame, dt: f32) {
        let axis = |neg: Key, pos: Key| keys.key_down(pos) as i32 as f32 - keys.key_down(neg) as i32 as f32;

        self.yaw += axis(Key::ArrowLeft, Key::ArrowRight) * ORBIT_SPEED * dt;
        self.pitch = (self.pitch + axis(Key::ArrowDown, Key::ArrowUp) * ORBIT_SPEED * dt)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let zoom = axis(Key::PageUp, Key::PageDown);
        self.distance = (self.distance * ZOOM_SPEED.powf(zoom * dt)).max(MIN_DISTANCE);
        self.pointer_yaw += axis(Key::A, Key::D) * POINTER_SPEED * dt;

        self.held[TOP_BUTTON] = keys.key_down(Key::Space);
        self.held[LEFT_BUTTON] = keys.key_down(Key::Q);
        self.held[RIGHT_BUTTON] = keys.key_down(Key::E);

        if frame.pressed(Key::H) {
            self.head_tracking = !self.head_tracking;
            log::info!("head tracking {}", if self.head_tracking { "on" } else { "off" });
        }
    }

    /// World position of the simulated head.
    pub fn head_position(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    fn simulated_head(&self) -> Mat4 {
        Mat4::look_at_rh(self.head_position(), Vec3::ZERO, Vec3::Y).inverse()
    }

    fn eye_offset(&self, eye: Eye) -> f32 {
        let half = 0.5 * self.config.ipd * self.config.stereo_level;
        match eye {
            Eye::Left => -half,
            Eye::Right => half,
        }
    }
}

impl Default for DesktopStereoRig {
    fn default() -> Self {
        Self::new(StereoConfig::default())
    }
}

impl StereoTracker for DesktopStereoRig {
    fn capture_targets(&mut self) {
        self.captured_head = self.simulated_head();
        self.captured_pointer = Mat4::from_rotation_y(self.pointer_yaw);
        self.captured_buttons = self.held;
    }

    fn head_pose(&self) -> Option<Mat4> {
        self.head_tracking.then_some(self.captured_head)
    }

    fn primary_pose(&self) -> Option<Mat4> {
        Some(self.captured_pointer)
    }

    fn button_state(&self, id: usize) -> bool {
        self.captured_buttons.get(id).copied().unwrap_or(false)
    }

    fn set_head_pose(&mut self, pose: Mat4) {
        self.frustum_head = pose;
    }

    fn eye_view_matrix(&self, eye: Eye) -> Mat4 {
        let eye_pose = self.frustum_head * Mat4::from_translation(Vec3::X * self.eye_offset(eye));
        eye_pose.inverse()
    }

    fn eye_projection_matrix(&self, _eye: Eye) -> Mat4 {
        Mat4::perspective_rh(self.config.fov_y, self.eye_aspect, self.config.near, self.config.far)
    }

    fn world_scale(&self) -> f32 {
        self.config.world_scale
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(vp) = eye_viewport(self.config.mode, Eye::Left, width, height) {
            self.eye_aspect = vp.aspect();
        }
    }
}
