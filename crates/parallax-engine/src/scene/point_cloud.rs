//! Point clouds with a layout fixed at compile time.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::asset::ByteBuffer;
use crate::device::{BufferAllocator, BufferUsage, GpuBuffer, GpuError};
use crate::shader::ShaderProgram;

use super::{DrawCall, DrawList, FrameContext, Topology, VertexLayout};

// ── records ───────────────────────────────────────────────────────────────

/// On-disk `{x, y, z, mass}` record.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MassRecord {
    pub position: [f32; 3],
    pub mass: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl PositionVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
}

/// `{x, y, z, mass, type}`; uploaded unchanged.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TypedMassRecord {
    pub position: [f32; 3],
    pub mass: f32,
    pub kind: i32,
}

impl TypedMassRecord {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        3 => Float32,   // mass
        4 => Sint32     // type
    ];
}

/// Three consecutive snapshots of one particle.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VelocityVertex {
    pub previous: [f32; 3],
    pub current: [f32; 3],
    pub next: [f32; 3],
    /// Masses of `previous`, `current`, `next`.
    pub masses: [f32; 3],
}

impl VelocityVertex {
    const ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        4 => Float32x3, // previous
        0 => Float32x3, // current
        6 => Float32x3, // next
        5 => Float32,   // previous mass
        3 => Float32,   // current mass
        7 => Float32    // next mass
    ];
}

/// Decodes `data` as packed `T` records. Trailing bytes that do not fill a
/// whole record are ignored with a warning.
pub fn read_records<T: Pod>(label: &str, data: &ByteBuffer) -> Vec<T> {
    let size = std::mem::size_of::<T>();
    let chunks = data.as_slice().chunks_exact(size);
    let remainder = chunks.remainder().len();
    if remainder != 0 {
        log::warn!(
            "`{label}`: {} bytes is not a multiple of the {size}-byte record; ignoring {remainder} trailing bytes",
            data.len()
        );
    }
    chunks.map(bytemuck::pod_read_unaligned).collect()
}

// ── drawable ──────────────────────────────────────────────────────────────

/// A static buffer of points drawn with a hardcoded attribute layout.
#[derive(Debug, Clone)]
pub struct FixedLayoutPointCloud {
    buffer: Arc<GpuBuffer>,
    layout: Arc<VertexLayout>,
    count: u32,
}

impl FixedLayoutPointCloud {
    /// `{x, y, z, mass}` records; only the position is uploaded (slot 0).
    pub fn positions(alloc: &dyn BufferAllocator, data: &ByteBuffer) -> Result<Self, GpuError> {
        let vertices: Vec<PositionVertex> = read_records::<MassRecord>("positions", data)
            .into_iter()
            .map(|r| PositionVertex { position: r.position })
            .collect();
        Self::upload(alloc, "position points", &vertices, &PositionVertex::ATTRS)
    }

    /// `{x, y, z, mass, type}` records.
    pub fn typed_masses(alloc: &dyn BufferAllocator, data: &ByteBuffer) -> Result<Self, GpuError> {
        let records = read_records::<TypedMassRecord>("typed masses", data);
        Self::upload(alloc, "typed mass points", &records, &TypedMassRecord::ATTRS)
    }

    /// Interleaves three `{x, y, z, mass}` snapshots. Inputs of different
    /// lengths are truncated to the shortest.
    pub fn velocity(
        alloc: &dyn BufferAllocator,
        previous: &ByteBuffer,
        current: &ByteBuffer,
        next: &ByteBuffer,
    ) -> Result<Self, GpuError> {
        let prev = read_records::<MassRecord>("previous", previous);
        let cur = read_records::<MassRecord>("current", current);
        let nxt = read_records::<MassRecord>("next", next);

        let n = prev.len().min(cur.len()).min(nxt.len());
        if prev.len() != n || cur.len() != n || nxt.len() != n {
            log::warn!(
                "velocity snapshots differ in length ({}, {}, {}); using {n}",
                prev.len(),
                cur.len(),
                nxt.len()
            );
        }

        let vertices: Vec<VelocityVertex> = (0..n)
            .map(|i| VelocityVertex {
                previous: prev[i].position,
                current: cur[i].position,
                next: nxt[i].position,
                masses: [prev[i].mass, cur[i].mass, nxt[i].mass],
            })
            .collect();
        Self::upload(alloc, "velocity points", &vertices, &VelocityVertex::ATTRS)
    }

    fn upload<T: Pod>(
        alloc: &dyn BufferAllocator,
        label: &str,
        vertices: &[T],
        attrs: &[wgpu::VertexAttribute],
    ) -> Result<Self, GpuError> {
        let buffer = alloc.create_static_buffer(label, bytemuck::cast_slice(vertices), BufferUsage::Vertex)?;
        Ok(Self {
            buffer,
            layout: Arc::new(VertexLayout::new(std::mem::size_of::<T>() as u64, attrs.to_vec())),
            count: vertices.len() as u32,
        })
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn buffer(&self) -> &Arc<GpuBuffer> {
        &self.buffer
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn render(&self, _frame: &FrameContext, shader: &ShaderProgram, list: &mut DrawList) {
        list.push(
            shader,
            DrawCall {
                label: "points",
                topology: Topology::Points,
                vertex_buffer: self.buffer.clone(),
                layout: self.layout.clone(),
                vertex_count: self.count,
                indices: None,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostAllocator;

    fn mass_bytes(records: &[MassRecord]) -> ByteBuffer {
        ByteBuffer::from_bytes(bytemuck::cast_slice(records))
    }

    fn ramp(n: usize, base: f32) -> Vec<MassRecord> {
        (0..n)
            .map(|i| MassRecord { position: [base + i as f32, 0.0, 0.0], mass: i as f32 })
            .collect()
    }

    fn uploaded<T: Pod>(cloud: &FixedLayoutPointCloud) -> Vec<T> {
        let bytes = cloud.buffer().host_bytes().unwrap();
        bytes.chunks_exact(std::mem::size_of::<T>()).map(bytemuck::pod_read_unaligned).collect()
    }

    // ── record sizes ──────────────────────────────────────────────────────

    #[test]
    fn record_sizes() {
        assert_eq!(std::mem::size_of::<MassRecord>(), 16);
        assert_eq!(std::mem::size_of::<PositionVertex>(), 12);
        assert_eq!(std::mem::size_of::<TypedMassRecord>(), 20);
        assert_eq!(std::mem::size_of::<VelocityVertex>(), 48);
    }

    #[test]
    fn remainder_bytes_are_ignored() {
        let data = ByteBuffer::from_bytes(&[0u8; 37]);
        assert_eq!(read_records::<MassRecord>("t", &data).len(), 2);
    }

    // ── variants ──────────────────────────────────────────────────────────

    #[test]
    fn positions_drop_mass() {
        let cloud = FixedLayoutPointCloud::positions(&HostAllocator::new(), &mass_bytes(&ramp(3, 1.0))).unwrap();
        assert_eq!(cloud.count(), 3);
        assert_eq!(cloud.layout().stride, 12);
        assert_eq!(uploaded::<PositionVertex>(&cloud)[2].position, [3.0, 0.0, 0.0]);
    }

    #[test]
    fn typed_masses_upload_as_is() {
        let records = [TypedMassRecord { position: [1.0, 2.0, 3.0], mass: 0.5, kind: 7 }];
        let data = ByteBuffer::from_bytes(bytemuck::cast_slice(&records));
        let cloud = FixedLayoutPointCloud::typed_masses(&HostAllocator::new(), &data).unwrap();
        assert_eq!(cloud.buffer().host_bytes().unwrap(), data.as_slice());
        let kind = cloud.layout().attribute_at(4).unwrap();
        assert_eq!((kind.offset, kind.format), (16, wgpu::VertexFormat::Sint32));
    }

    #[test]
    fn velocity_truncates_to_shortest() {
        let cur = ramp(8, 100.0);
        let cloud = FixedLayoutPointCloud::velocity(
            &HostAllocator::new(),
            &mass_bytes(&ramp(10, 0.0)),
            &mass_bytes(&cur),
            &mass_bytes(&ramp(12, 200.0)),
        )
        .unwrap();

        assert_eq!(cloud.count(), 8);
        let vertices = uploaded::<VelocityVertex>(&cloud);
        for (v, c) in vertices.iter().zip(&cur) {
            assert_eq!(v.current, c.position);
        }
        assert_eq!(vertices[1].masses, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn velocity_slots() {
        let one = mass_bytes(&ramp(1, 0.0));
        let cloud = FixedLayoutPointCloud::velocity(&HostAllocator::new(), &one, &one, &one).unwrap();
        let slot_offsets: Vec<_> = cloud.layout().attributes.iter().map(|a| (a.shader_location, a.offset)).collect();
        assert_eq!(slot_offsets, vec![(4, 0), (0, 12), (6, 24), (5, 36), (3, 40), (7, 44)]);
    }

    #[test]
    fn oversized_upload_fails() {
        let err = FixedLayoutPointCloud::positions(&HostAllocator::with_limit(11), &mass_bytes(&ramp(1, 0.0)));
        assert!(err.is_err());
    }
}
