//! Frame timing and the animation phase.
//!
//! - one `FrameClock` per window; `tick()` once per presented frame
//! - one `AnimationClock` per renderer, advanced with the frame's `dt`

mod animation;
mod frame_clock;

pub use animation::{AnimationClock, DEFAULT_ANIMATION_RATE};
pub use frame_clock::{FrameClock, FrameTime};
