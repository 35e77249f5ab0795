//! Grouping nodes. Groups hold [`NodeId`]s; the [`Scene`](super::Scene)
//! owns the children and dispatches rendering.

use super::NodeId;

/// Renders every child in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CompositeGroup {
    children: Vec<NodeId>,
}

impl CompositeGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, child: NodeId) {
        self.children.push(child);
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Renders one child at a time.
#[derive(Debug, Clone, Default)]
pub struct SwitchGroup {
    children: Vec<NodeId>,
    current: usize,
}

impl SwitchGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first child added becomes current.
    pub fn add(&mut self, child: NodeId) {
        self.children.push(child);
        if self.children.len() == 1 {
            self.current = 0;
        }
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<NodeId> {
        self.children.get(self.current).copied()
    }

    /// Indices past the end select the first child, not the last.
    pub fn switch_to(&mut self, index: usize) {
        self.current = if index < self.children.len() { index } else { 0 };
    }

    /// Steps to the next child, wrapping to the first.
    pub fn advance(&mut self) {
        if !self.children.is_empty() {
            self.current = (self.current + 1) % self.children.len();
        }
    }
}

/// Fade applied per step of the trail when none is configured.
pub const DEFAULT_FADE_STEP: f32 = 0.005;

/// A switch group that also draws the children before the current one with
/// decreasing opacity, producing a motion trail.
#[derive(Debug, Clone)]
pub struct CrossfadeSwitchGroup {
    pub switch: SwitchGroup,
    fade_step: f32,
}

impl Default for CrossfadeSwitchGroup {
    fn default() -> Self {
        Self { switch: SwitchGroup::new(), fade_step: DEFAULT_FADE_STEP }
    }
}

impl CrossfadeSwitchGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fade_step(fade_step: f32) -> Self {
        Self { switch: SwitchGroup::new(), fade_step }
    }

    #[inline]
    pub fn fade_step(&self) -> f32 {
        self.fade_step
    }

    pub fn set_fade_step(&mut self, fade_step: f32) {
        self.fade_step = fade_step;
    }

    /// Children to draw and their opacity, in draw order.
    ///
    /// The current child comes first at 1.0. The walk then goes backwards
    /// (wrapping) and stops when opacity reaches zero or it is back at the
    /// current child.
    pub fn fade_trail(&self) -> Vec<(NodeId, f32)> {
        let children = self.switch.children();
        let n = children.len();
        let current = self.switch.current_index();
        let Some(&first) = children.get(current) else {
            return Vec::new();
        };

        let prev = |i: usize| if i == 0 { n - 1 } else { i - 1 };
        let mut trail = vec![(first, 1.0)];
        let mut idx = prev(current);
        let mut opacity = 1.0 - self.fade_step;
        while idx != current && opacity > 0.0 {
            trail.push((children[idx], opacity));
            idx = prev(idx);
            opacity -= self.fade_step;
        }
        trail
    }
}
