use std::sync::Arc;

use crate::device::GpuBuffer;
use crate::shader::{ShaderProgram, UniformSnapshot};

use super::VertexLayout;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Triangles,
}

impl Topology {
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Points => wgpu::PrimitiveTopology::PointList,
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

/// `u32` indices drawn from the start of `buffer`.
#[derive(Debug, Clone)]
pub struct IndexRange {
    pub buffer: Arc<GpuBuffer>,
    pub count: u32,
}

/// What a drawable asks to be drawn.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub label: &'static str,
    pub topology: Topology,
    pub vertex_buffer: Arc<GpuBuffer>,
    pub layout: Arc<VertexLayout>,
    pub vertex_count: u32,
    pub indices: Option<IndexRange>,
}

impl DrawCall {
    /// Elements the call will emit: indices when indexed, vertices otherwise.
    pub fn element_count(&self) -> u32 {
        self.indices.as_ref().map_or(self.vertex_count, |i| i.count)
    }
}

/// A recorded draw: the call plus the shader state at the time it was pushed.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub call: DrawCall,
    pub uniforms: UniformSnapshot,
}

/// Draws recorded for one eye, in submission order.
///
/// `push()` is O(1) plus a copy of the program's uniform blocks. Capacity is
/// kept across [`clear`](Self::clear) so steady-state frames do not allocate
/// the item vector.
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records `call` with the current uniforms of `shader`.
    ///
    /// Empty calls are dropped. A shader that is not bound is a caller bug:
    /// the draw is logged and dropped.
    pub fn push(&mut self, shader: &ShaderProgram, call: DrawCall) {
        if call.element_count() == 0 {
            return;
        }
        let Some(uniforms) = shader.snapshot() else {
            log::error!(
                "draw `{}` submitted while shader `{}` is not bound",
                call.label,
                shader.label()
            );
            return;
        };
        self.items.push(DrawItem { call, uniforms });
    }

    /// Sum of elements over all items.
    pub fn element_total(&self) -> u64 {
        self.items.iter().map(|i| i.call.element_count() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BufferAllocator, BufferUsage, HostAllocator};
    use crate::shader::test_support::BASIC_WGSL;

    fn call(count: u32) -> DrawCall {
        let buffer = HostAllocator::new()
            .create_static_buffer("test", &[0u8; 12], BufferUsage::Vertex)
            .unwrap();
        DrawCall {
            label: "test",
            topology: Topology::Points,
            vertex_buffer: buffer,
            layout: Arc::new(VertexLayout::new(12, Vec::new())),
            vertex_count: count,
            indices: None,
        }
    }

    fn bound_shader() -> ShaderProgram {
        let mut p = ShaderProgram::from_wgsl("test", BASIC_WGSL).unwrap();
        p.link().unwrap();
        p.begin().unwrap();
        p
    }

    #[test]
    fn push_records_in_order() {
        let shader = bound_shader();
        let mut list = DrawList::new();
        list.push(&shader, call(3));
        list.push(&shader, call(5));
        assert_eq!(list.len(), 2);
        assert_eq!(list.items()[1].call.vertex_count, 5);
        assert_eq!(list.element_total(), 8);
    }

    #[test]
    fn empty_call_is_dropped() {
        let shader = bound_shader();
        let mut list = DrawList::new();
        list.push(&shader, call(0));
        assert!(list.is_empty());
    }

    #[test]
    fn unbound_shader_is_dropped() {
        let mut shader = bound_shader();
        shader.end();
        let mut list = DrawList::new();
        list.push(&shader, call(3));
        assert!(list.is_empty());
    }

    #[test]
    fn clear_keeps_nothing() {
        let shader = bound_shader();
        let mut list = DrawList::new();
        list.push(&shader, call(1));
        list.clear();
        assert_eq!(list.element_total(), 0);
    }
}
