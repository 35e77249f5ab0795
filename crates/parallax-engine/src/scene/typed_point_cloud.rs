use std::sync::Arc;

use crate::asset::ByteBuffer;
use crate::device::{BufferAllocator, BufferUsage, GpuBuffer, GpuError};
use crate::shader::{AttributeLocation, ShaderProgram};

use super::layout::{field_attributes, record_layout};
use super::{DrawCall, DrawList, FrameContext, Topology, VertexField, VertexLayout};

/// Points whose record layout is described at runtime by a field list.
///
/// The bytes are uploaded unchanged. Each field is bound to the shader input
/// of the same name once [`resolve_shader_locations`](Self::resolve_shader_locations)
/// has run; fields the shader does not declare are left unbound.
#[derive(Debug, Clone)]
pub struct TypedPointCloud {
    fields: Vec<VertexField>,
    offsets: Vec<u64>,
    stride: u64,
    count: u32,
    buffer: Arc<GpuBuffer>,
    locations: Vec<AttributeLocation>,
    layout: Arc<VertexLayout>,
}

impl TypedPointCloud {
    pub fn new(
        alloc: &dyn BufferAllocator,
        data: &ByteBuffer,
        fields: Vec<VertexField>,
    ) -> Result<Self, GpuError> {
        let (offsets, stride) = record_layout(&fields);

        let count = if stride == 0 {
            log::warn!("typed point cloud declares no fields; nothing will be drawn");
            0
        } else {
            let len = data.len() as u64;
            if len % stride != 0 {
                log::warn!(
                    "typed point cloud: {len} bytes is not a multiple of the {stride}-byte stride; ignoring {} trailing bytes",
                    len % stride
                );
            }
            len / stride
        };

        let used = (count * stride) as usize;
        let buffer = alloc.create_static_buffer("typed points", &data.as_slice()[..used], BufferUsage::Vertex)?;

        Ok(Self {
            locations: vec![AttributeLocation::NOT_FOUND; fields.len()],
            layout: Arc::new(VertexLayout::new(stride, Vec::new())),
            fields,
            offsets,
            stride,
            count: count as u32,
            buffer,
        })
    }

    /// Binds each field to the shader input of the same name.
    pub fn resolve_shader_locations(&mut self, shader: &ShaderProgram) {
        let mut attributes: Vec<wgpu::VertexAttribute> = Vec::new();

        for (i, field) in self.fields.iter().enumerate() {
            let loc = shader.lookup_attribute(&field.name);
            self.locations[i] = loc;
            let Some(slot) = loc.slot() else { continue };

            let Some(attrs) = field_attributes(field, self.offsets[i], slot) else {
                log::warn!(
                    "field `{}` ({}{}) has no vertex format; not bound",
                    field.name,
                    field.ty,
                    if field.normalize { ", normalized" } else { "" }
                );
                continue;
            };
            if attrs.iter().any(|a| attributes.iter().any(|b| b.shader_location == a.shader_location)) {
                log::warn!("field `{}` overlaps an already bound location {slot}; not bound", field.name);
                continue;
            }
            attributes.extend(attrs);
        }

        self.layout = Arc::new(VertexLayout::new(self.stride, attributes));
    }

    #[inline]
    pub fn fields(&self) -> &[VertexField] {
        &self.fields
    }

    #[inline]
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    #[inline]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Resolved location per field, `NOT_FOUND` when unbound.
    #[inline]
    pub fn locations(&self) -> &[AttributeLocation] {
        &self.locations
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn render(&self, _frame: &FrameContext, shader: &ShaderProgram, list: &mut DrawList) {
        list.push(
            shader,
            DrawCall {
                label: "typed points",
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
    use crate::scene::GlslType;

    const WGSL: &str = r#"
        struct Out {
            @builtin(position) clip: vec4<f32>,
            @location(0) weight: f32,
        }
        @vertex
        fn vs_main(@location(2) vertexPosition: vec3<f32>, @location(5) mass: f32) -> Out {
            return Out(vec4<f32>(vertexPosition, 1.0), mass);
        }
        @fragment
        fn fs_main(v: Out) -> @location(0) vec4<f32> {
            return vec4<f32>(v.weight);
        }
    "#;

    fn shader() -> ShaderProgram {
        let mut p = ShaderProgram::from_wgsl("typed", WGSL).unwrap();
        p.link().unwrap();
        p
    }

    fn fields() -> Vec<VertexField> {
        vec![
            VertexField::new("vertexPosition", GlslType::Vec3),
            VertexField::new("mass", GlslType::Float),
            VertexField::new("kind", GlslType::Int),
        ]
    }

    #[test]
    fn count_truncates() {
        let data = ByteBuffer::from_bytes(&[0u8; 45]);
        let cloud = TypedPointCloud::new(&HostAllocator::new(), &data, fields()).unwrap();
        assert_eq!(cloud.stride(), 20);
        assert_eq!(cloud.offsets(), &[0, 12, 16]);
        assert_eq!(cloud.count(), 2);
        assert_eq!(cloud.buffer.size(), 40);
    }

    #[test]
    fn no_fields_draws_nothing() {
        let data = ByteBuffer::from_bytes(&[0u8; 16]);
        let cloud = TypedPointCloud::new(&HostAllocator::new(), &data, Vec::new()).unwrap();
        assert_eq!(cloud.count(), 0);
    }

    #[test]
    fn resolves_by_name_and_skips_unknown() {
        let data = ByteBuffer::from_bytes(&[0u8; 40]);
        let mut cloud = TypedPointCloud::new(&HostAllocator::new(), &data, fields()).unwrap();
        cloud.resolve_shader_locations(&shader());

        let slots: Vec<_> = cloud.locations().iter().map(|l| l.slot()).collect();
        assert_eq!(slots, vec![Some(2), Some(5), None]);

        let mass = cloud.layout().attribute_at(5).unwrap();
        assert_eq!((mass.offset, mass.format), (12, wgpu::VertexFormat::Float32));
        assert_eq!(cloud.layout().attributes.len(), 2);
    }

    #[test]
    fn unsupported_format_is_left_unbound() {
        let data = ByteBuffer::from_bytes(&[0u8; 16]);
        let fields = vec![
            VertexField::new("vertexPosition", GlslType::BVec3),
            VertexField::new("mass", GlslType::Float),
        ];
        let mut cloud = TypedPointCloud::new(&HostAllocator::new(), &data, fields).unwrap();
        cloud.resolve_shader_locations(&shader());
        assert!(cloud.layout().attribute_at(2).is_none());
        assert_eq!(cloud.layout().attribute_at(5).unwrap().offset, 3);
    }
}
