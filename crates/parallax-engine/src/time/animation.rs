/// Default phase advance per second; 0.1 per frame at 60 Hz.
pub const DEFAULT_ANIMATION_RATE: f32 = 6.0;

/// Repeating animation phase in `[0, 1)`, pushed to shaders as `time`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationClock {
    phase: f32,
    rate: f32,
}

impl AnimationClock {
    pub fn new(rate: f32) -> Self {
        Self { phase: 0.0, rate }
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    #[inline]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Advances by `rate * dt`. Returns `true` when the phase wrapped to 0.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.phase += self.rate * dt;
        if self.phase >= 1.0 {
            self.phase = 0.0;
            true
        } else {
            false
        }
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_RATE)
    }
}
