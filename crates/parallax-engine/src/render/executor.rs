use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::NonZeroU64;

use crate::scene::{DrawItem, Topology, VertexLayout};
use crate::shader::{LinkedProgram, ProgramId, ScalarClass, UniformSnapshot};
use crate::tracking::Eye;

use super::{eye_viewport, EyeViewport, RenderCtx, RenderTarget, StereoFrame, StereoMode};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_STRIDE_ALIGNMENT: u64 = 4;
const MIN_ARENA_SIZE: u64 = 16 * 1024;

/// Why a recorded draw cannot become a wgpu pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawRejection {
    /// Buffer was uploaded with a host allocator.
    HostBuffer,
    UnalignedStride(u64),
    UnalignedOffset { location: u32, offset: u64 },
    /// A vertex input of the shader has no attribute in the layout.
    MissingInput { name: String, location: u32 },
    /// The attribute format does not produce the scalar kind the shader reads.
    KindMismatch { name: String, location: u32 },
    /// `f64` attributes need `VERTEX_ATTRIBUTE_64BIT`.
    DoublePrecisionUnsupported { location: u32 },
    StrideTooLarge { stride: u64, max: u64 },
    /// A location past `max_vertex_attributes`, e.g. a matrix column spilling over.
    LocationOutOfRange { location: u32, max: u32 },
    TooManyAttributes { count: usize, max: u32 },
}

impl fmt::Display for DrawRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawRejection::HostBuffer => write!(f, "buffer lives in host memory"),
            DrawRejection::UnalignedStride(s) => write!(f, "stride {s} is not a multiple of 4"),
            DrawRejection::UnalignedOffset { location, offset } => {
                write!(f, "attribute @location({location}) has unaligned offset {offset}")
            }
            DrawRejection::MissingInput { name, location } => {
                write!(f, "shader input `{name}` @location({location}) is not provided")
            }
            DrawRejection::KindMismatch { name, location } => {
                write!(f, "attribute @location({location}) does not match the type of `{name}`")
            }
            DrawRejection::DoublePrecisionUnsupported { location } => {
                write!(f, "attribute @location({location}) needs 64-bit vertex attributes")
            }
            DrawRejection::StrideTooLarge { stride, max } => {
                write!(f, "stride {stride} exceeds the device limit of {max}")
            }
            DrawRejection::LocationOutOfRange { location, max } => {
                write!(f, "attribute @location({location}) is past the device limit of {max} locations")
            }
            DrawRejection::TooManyAttributes { count, max } => {
                write!(f, "{count} attributes exceed the device limit of {max}")
            }
        }
    }
}

/// Scalar kind the shader observes for `format`.
fn format_class(format: wgpu::VertexFormat) -> ScalarClass {
    use wgpu::VertexFormat as F;
    match format {
        F::Float64 | F::Float64x2 | F::Float64x3 | F::Float64x4 => ScalarClass::F64,
        F::Sint8x2 | F::Sint8x4 | F::Sint16x2 | F::Sint16x4 => ScalarClass::I32,
        F::Sint32 | F::Sint32x2 | F::Sint32x3 | F::Sint32x4 => ScalarClass::I32,
        F::Uint8x2 | F::Uint8x4 | F::Uint16x2 | F::Uint16x4 => ScalarClass::U32,
        F::Uint32 | F::Uint32x2 | F::Uint32x3 | F::Uint32x4 => ScalarClass::U32,
        _ => ScalarClass::F32,
    }
}

/// Device capabilities a vertex layout is checked against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayoutLimits {
    pub f64_supported: bool,
    pub max_stride: u64,
    pub max_attributes: u32,
}

impl LayoutLimits {
    pub fn from_device(device: &wgpu::Device) -> Self {
        Self::from_wgpu(&device.limits(), device.features())
    }

    fn from_wgpu(limits: &wgpu::Limits, features: wgpu::Features) -> Self {
        Self {
            f64_supported: features.contains(wgpu::Features::VERTEX_ATTRIBUTE_64BIT),
            max_stride: limits.max_vertex_buffer_array_stride as u64,
            max_attributes: limits.max_vertex_attributes,
        }
    }
}

impl Default for LayoutLimits {
    /// wgpu's default limits, without 64-bit attributes.
    fn default() -> Self {
        Self::from_wgpu(&wgpu::Limits::default(), wgpu::Features::empty())
    }
}

/// Checks that `layout` can feed every vertex input of `program` within
/// the device `limits`.
///
/// Attributes the shader does not read are allowed.
pub fn check_layout(
    program: &LinkedProgram,
    layout: &VertexLayout,
    limits: &LayoutLimits,
) -> Result<(), DrawRejection> {
    if layout.stride % VERTEX_STRIDE_ALIGNMENT != 0 {
        return Err(DrawRejection::UnalignedStride(layout.stride));
    }
    if layout.stride > limits.max_stride {
        return Err(DrawRejection::StrideTooLarge { stride: layout.stride, max: limits.max_stride });
    }
    if layout.attributes.len() > limits.max_attributes as usize {
        return Err(DrawRejection::TooManyAttributes {
            count: layout.attributes.len(),
            max: limits.max_attributes,
        });
    }

    for attr in &layout.attributes {
        if attr.shader_location >= limits.max_attributes {
            return Err(DrawRejection::LocationOutOfRange {
                location: attr.shader_location,
                max: limits.max_attributes,
            });
        }
        let align = attr.format.size().min(4);
        if attr.offset % align != 0 {
            return Err(DrawRejection::UnalignedOffset {
                location: attr.shader_location,
                offset: attr.offset,
            });
        }
        if format_class(attr.format) == ScalarClass::F64 && !limits.f64_supported {
            return Err(DrawRejection::DoublePrecisionUnsupported {
                location: attr.shader_location,
            });
        }
    }

    for input in program.attributes() {
        let Some(attr) = layout.attribute_at(input.location) else {
            return Err(DrawRejection::MissingInput {
                name: input.name.clone(),
                location: input.location,
            });
        };
        if format_class(attr.format) != input.class {
            return Err(DrawRejection::KindMismatch {
                name: input.name.clone(),
                location: input.location,
            });
        }
    }
    Ok(())
}

#[inline]
fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Uniform blocks of a frame laid out for dynamic-offset binding.
#[derive(Debug, Default)]
pub(crate) struct PackedUniforms {
    pub bytes: Vec<u8>,
    /// Per draw, one offset per block in binding order.
    pub offsets: Vec<Vec<u32>>,
}

pub(crate) fn pack_uniforms<'a>(
    snapshots: impl IntoIterator<Item = &'a UniformSnapshot>,
    alignment: u64,
) -> PackedUniforms {
    let alignment = alignment.max(1);
    let mut packed = PackedUniforms::default();

    for snapshot in snapshots {
        let mut offsets = Vec::with_capacity(snapshot.blocks().len());
        for block in snapshot.blocks() {
            let offset = align_up(packed.bytes.len() as u64, alignment);
            packed.bytes.resize(offset as usize, 0);
            packed.bytes.extend_from_slice(block);
            offsets.push(offset as u32);
        }
        packed.offsets.push(offsets);
    }

    let end = align_up(packed.bytes.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);
    packed.bytes.resize(end as usize, 0);
    packed
}

/// Counters for one executed frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ExecuteStats {
    pub draws: usize,
    pub skipped: usize,
    pub elements: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    layout: VertexLayout,
    topology: Topology,
    format: wgpu::TextureFormat,
}

struct ProgramResources {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    /// `(binding, size)` of each uniform block.
    blocks: Vec<(u32, u64)>,
    bind_group: Option<wgpu::BindGroup>,
    arena_generation: u64,
}

struct EyePass<'f> {
    viewport: EyeViewport,
    draws: Vec<(&'f DrawItem, PipelineKey)>,
}

/// Replays a [`StereoFrame`] into one wgpu render pass.
///
/// Owns the depth buffer, a per-frame uniform arena bound with dynamic
/// offsets, and a cache of pipelines keyed by program, vertex layout,
/// topology and target format. Draws that wgpu would reject are skipped with
/// one warning per cause.
#[derive(Default)]
pub struct FrameExecutor {
    depth_size: (u32, u32),
    depth_view: Option<wgpu::TextureView>,

    arena: Option<wgpu::Buffer>,
    arena_capacity: u64,
    arena_generation: u64,

    programs: HashMap<ProgramId, ProgramResources>,
    pipelines: HashMap<PipelineKey, Option<wgpu::RenderPipeline>>,

    warned: HashSet<String>,
}

impl FrameExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears `target`, then draws each presented eye into its viewport.
    pub fn execute(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        frame: &StereoFrame,
        mode: StereoMode,
        clear_color: wgpu::Color,
    ) -> ExecuteStats {
        self.ensure_depth(ctx);

        let limits = LayoutLimits::from_device(ctx.device);

        let mut stats = ExecuteStats::default();
        let mut passes = Vec::with_capacity(2);
        for eye in Eye::BOTH {
            let Some(viewport) = eye_viewport(mode, eye, ctx.width, ctx.height) else { continue };
            if viewport.width == 0 || viewport.height == 0 {
                continue;
            }
            let mut draws = Vec::with_capacity(frame.eye(eye).len());
            for item in frame.eye(eye).items() {
                match self.prepare(ctx, item, &limits) {
                    Some(key) => draws.push((item, key)),
                    None => stats.skipped += 1,
                }
            }
            passes.push(EyePass { viewport, draws });
        }

        let alignment = ctx.device.limits().min_uniform_buffer_offset_alignment as u64;
        let packed = pack_uniforms(
            passes.iter().flat_map(|p| p.draws.iter().map(|(item, _)| &item.uniforms)),
            alignment,
        );
        self.ensure_arena(ctx, packed.bytes.len() as u64);
        if let Some(arena) = self.arena.as_ref() {
            if !packed.bytes.is_empty() {
                ctx.queue.write_buffer(arena, 0, &packed.bytes);
            }
        }
        for pass in &passes {
            for (_, key) in &pass.draws {
                self.ensure_bind_group(ctx, key.program);
            }
        }

        let Some(depth_view) = self.depth_view.as_ref() else { return stats };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("parallax stereo pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut offsets = packed.offsets.iter();
        for pass in &passes {
            let vp = pass.viewport;
            rpass.set_viewport(
                vp.x as f32,
                vp.y as f32,
                vp.width as f32,
                vp.height as f32,
                0.0,
                1.0,
            );
            rpass.set_scissor_rect(vp.x, vp.y, vp.width, vp.height);

            for (item, key) in &pass.draws {
                // Advance first so offsets stay paired with their draw.
                let Some(dynamic_offsets) = offsets.next() else { break };
                let Some(Some(pipeline)) = self.pipelines.get(key) else { continue };
                let Some(res) = self.programs.get(&key.program) else { continue };
                let Some(vertex_buffer) = item.call.vertex_buffer.device_buffer() else { continue };

                rpass.set_pipeline(pipeline);
                if let Some(bind_group) = res.bind_group.as_ref() {
                    rpass.set_bind_group(0, bind_group, dynamic_offsets);
                }
                rpass.set_vertex_buffer(0, vertex_buffer.slice(..));

                match &item.call.indices {
                    Some(indices) => {
                        let Some(index_buffer) = indices.buffer.device_buffer() else { continue };
                        rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..indices.count, 0, 0..1);
                    }
                    None => rpass.draw(0..item.call.vertex_count, 0..1),
                }

                stats.draws += 1;
                stats.elements += item.call.element_count() as u64;
            }
        }

        stats
    }

    /// Resolves the pipeline of `item`, creating it on first use. `None` when
    /// the draw has to be skipped.
    fn prepare(
        &mut self,
        ctx: &RenderCtx<'_>,
        item: &DrawItem,
        limits: &LayoutLimits,
    ) -> Option<PipelineKey> {
        let call = &item.call;
        let host_index = call.indices.as_ref().is_some_and(|i| i.buffer.device_buffer().is_none());
        if call.vertex_buffer.device_buffer().is_none() || host_index {
            self.warn_once(call.label, &DrawRejection::HostBuffer);
            return None;
        }

        let program = item.uniforms.program();
        let key = PipelineKey {
            program: program.id(),
            layout: VertexLayout::clone(&call.layout),
            topology: call.topology,
            format: ctx.surface_format,
        };

        if !self.pipelines.contains_key(&key) {
            let pipeline = match check_layout(program, &key.layout, limits) {
                Ok(()) => {
                    self.ensure_program(ctx, program);
                    self.programs
                        .get(&key.program)
                        .map(|res| create_pipeline(ctx, res, program, &key))
                }
                Err(reason) => {
                    self.warn_once(call.label, &reason);
                    None
                }
            };
            self.pipelines.insert(key.clone(), pipeline);
        }

        matches!(self.pipelines.get(&key), Some(Some(_))).then_some(key)
    }

    fn warn_once(&mut self, label: &str, reason: &DrawRejection) {
        let message = format!("skipping draw `{label}`: {reason}");
        if !self.warned.contains(&message) {
            log::warn!("{message}");
            self.warned.insert(message);
        }
    }

    fn ensure_program(&mut self, ctx: &RenderCtx<'_>, program: &LinkedProgram) {
        if self.programs.contains_key(&program.id()) {
            return;
        }

        let vertex = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(program.label()),
            source: wgpu::ShaderSource::Wgsl(program.vertex().source().into()),
        });
        let fragment = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(program.label()),
            source: wgpu::ShaderSource::Wgsl(program.fragment().source().into()),
        });

        let blocks: Vec<(u32, u64)> =
            program.blocks().iter().map(|b| (b.binding, b.size as u64)).collect();
        let entries: Vec<wgpu::BindGroupLayoutEntry> = blocks
            .iter()
            .map(|&(binding, size)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(size),
                },
                count: None,
            })
            .collect();

        let bind_group_layout = (!entries.is_empty()).then(|| {
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("parallax uniform bgl"),
                entries: &entries,
            })
        });
        let layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("parallax pipeline layout"),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        log::debug!(
            "created GPU resources for program `{}` ({} uniform block(s))",
            program.label(),
            blocks.len()
        );

        self.programs.insert(
            program.id(),
            ProgramResources {
                vertex,
                fragment,
                bind_group_layout,
                pipeline_layout,
                blocks,
                bind_group: None,
                arena_generation: 0,
            },
        );
    }

    fn ensure_arena(&mut self, ctx: &RenderCtx<'_>, required: u64) {
        if self.arena.is_some() && required <= self.arena_capacity {
            return;
        }

        let capacity = required.next_power_of_two().max(MIN_ARENA_SIZE);
        self.arena = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("parallax uniform arena"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.arena_capacity = capacity;
        self.arena_generation += 1;
        log::debug!("uniform arena resized to {capacity} bytes");
    }

    fn ensure_bind_group(&mut self, ctx: &RenderCtx<'_>, program: ProgramId) {
        let Some(arena) = self.arena.as_ref() else { return };
        let Some(res) = self.programs.get_mut(&program) else { return };
        if res.bind_group.is_some() && res.arena_generation == self.arena_generation {
            return;
        }
        let Some(layout) = res.bind_group_layout.as_ref() else { return };

        let entries: Vec<wgpu::BindGroupEntry> = res
            .blocks
            .iter()
            .map(|&(binding, size)| wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: arena,
                    offset: 0,
                    size: NonZeroU64::new(size),
                }),
            })
            .collect();

        res.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("parallax uniform bind group"),
            layout,
            entries: &entries,
        }));
        res.arena_generation = self.arena_generation;
    }

    fn ensure_depth(&mut self, ctx: &RenderCtx<'_>) {
        let size = (ctx.width.max(1), ctx.height.max(1));
        if self.depth_view.is_some() && self.depth_size == size {
            return;
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("parallax depth"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        self.depth_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.depth_size = size;
    }
}

fn create_pipeline(
    ctx: &RenderCtx<'_>,
    res: &ProgramResources,
    program: &LinkedProgram,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    log::debug!(
        "creating pipeline for `{}` ({:?}, stride {})",
        program.label(),
        key.topology,
        key.layout.stride
    );

    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.label()),
        layout: Some(&res.pipeline_layout),

        vertex: wgpu::VertexState {
            module: &res.vertex,
            entry_point: Some(program.vertex().entry_point()),
            compilation_options: Default::default(),
            buffers: &[key.layout.buffer_layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &res.fragment,
            entry_point: Some(program.fragment().entry_point()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: key.topology.to_wgpu(),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::device::{BufferAllocator, BufferUsage, HostAllocator};
    use crate::scene::{DrawCall, DrawList};
    use crate::shader::test_support::BASIC_WGSL;
    use crate::shader::ShaderProgram;

    fn linked() -> ShaderProgram {
        let mut p = ShaderProgram::from_wgsl("exec", BASIC_WGSL).unwrap();
        p.link().unwrap();
        p
    }

    fn layout(stride: u64, attrs: &[(u32, u64, wgpu::VertexFormat)]) -> VertexLayout {
        VertexLayout::new(
            stride,
            attrs
                .iter()
                .map(|&(shader_location, offset, format)| wgpu::VertexAttribute {
                    format,
                    offset,
                    shader_location,
                })
                .collect(),
        )
    }

    // ── layout checks ─────────────────────────────────────────────────────

    #[test]
    fn position_layout_is_accepted() {
        let p = linked();
        let l = layout(16, &[(0, 0, wgpu::VertexFormat::Float32x3), (3, 12, wgpu::VertexFormat::Float32)]);
        assert_eq!(check_layout(p.linked().unwrap(), &l, &LayoutLimits::default()), Ok(()));
    }

    #[test]
    fn uncovered_input_is_rejected() {
        let p = linked();
        let l = layout(4, &[(3, 0, wgpu::VertexFormat::Float32)]);
        assert_eq!(
            check_layout(p.linked().unwrap(), &l, &LayoutLimits::default()),
            Err(DrawRejection::MissingInput { name: "vertexPosition".into(), location: 0 })
        );
    }

    #[test]
    fn integer_attribute_cannot_feed_float_input() {
        let p = linked();
        let l = layout(12, &[(0, 0, wgpu::VertexFormat::Sint32x3)]);
        assert!(matches!(
            check_layout(p.linked().unwrap(), &l, &LayoutLimits::default()),
            Err(DrawRejection::KindMismatch { location: 0, .. })
        ));
    }

    #[test]
    fn odd_stride_is_rejected() {
        let p = linked();
        let l = layout(14, &[(0, 0, wgpu::VertexFormat::Float32x3)]);
        assert_eq!(
            check_layout(p.linked().unwrap(), &l, &LayoutLimits::default()),
            Err(DrawRejection::UnalignedStride(14))
        );
    }

    #[test]
    fn doubles_need_the_device_feature() {
        let p = linked();
        let l = layout(
            40,
            &[(0, 0, wgpu::VertexFormat::Float32x3), (1, 16, wgpu::VertexFormat::Float64x3)],
        );
        assert_eq!(
            check_layout(p.linked().unwrap(), &l, &LayoutLimits::default()),
            Err(DrawRejection::DoublePrecisionUnsupported { location: 1 })
        );
        let with_f64 = LayoutLimits { f64_supported: true, ..LayoutLimits::default() };
        assert_eq!(check_layout(p.linked().unwrap(), &l, &with_f64), Ok(()));
    }

    #[test]
    fn wide_record_with_unused_fields_exceeds_stride_limit() {
        // vec3 position followed by 600 floats the shader never reads.
        let p = linked();
        let l = layout(12 + 600 * 4, &[(0, 0, wgpu::VertexFormat::Float32x3)]);
        assert_eq!(
            check_layout(p.linked().unwrap(), &l, &LayoutLimits::default()),
            Err(DrawRejection::StrideTooLarge { stride: 2412, max: 2048 })
        );
    }

    #[test]
    fn matrix_columns_past_last_location_are_rejected() {
        let p = linked();
        let mut attrs = vec![(0, 0, wgpu::VertexFormat::Float32x3)];
        // mat4 bound at 13 occupies locations 13..=16.
        attrs.extend((0..4).map(|c| (13 + c, 12 + c as u64 * 16, wgpu::VertexFormat::Float32x4)));
        let l = layout(76, &attrs);
        assert_eq!(
            check_layout(p.linked().unwrap(), &l, &LayoutLimits::default()),
            Err(DrawRejection::LocationOutOfRange { location: 16, max: 16 })
        );
    }

    #[test]
    fn attribute_count_is_limited() {
        let p = linked();
        let limits = LayoutLimits { max_attributes: 2, ..LayoutLimits::default() };
        let l = layout(
            20,
            &[
                (0, 0, wgpu::VertexFormat::Float32x3),
                (1, 12, wgpu::VertexFormat::Float32),
                (2, 16, wgpu::VertexFormat::Float32),
            ],
        );
        assert_eq!(
            check_layout(p.linked().unwrap(), &l, &limits),
            Err(DrawRejection::TooManyAttributes { count: 3, max: 2 })
        );
    }

    // ── uniform packing ───────────────────────────────────────────────────

    #[test]
    fn snapshots_are_packed_at_aligned_offsets() {
        let mut p = linked();
        p.begin().unwrap();
        let buffer = HostAllocator::new()
            .create_static_buffer("v", &[0; 12], BufferUsage::Vertex)
            .unwrap();
        let call = DrawCall {
            label: "points",
            topology: Topology::Points,
            vertex_buffer: buffer,
            layout: Arc::new(layout(12, &[(0, 0, wgpu::VertexFormat::Float32x3)])),
            vertex_count: 1,
            indices: None,
        };

        let mut list = DrawList::new();
        let time = p.lookup_uniform("time");
        p.set_uniform(time, 0.25f32);
        list.push(&p, call.clone());
        p.set_uniform(time, 0.5f32);
        list.push(&p, call);

        let packed = pack_uniforms(list.items().iter().map(|i| &i.uniforms), 256);
        assert_eq!(packed.offsets, vec![vec![0], vec![256]]);
        assert_eq!(packed.bytes.len(), 256 + 144);

        let time_at = |base: usize| f32::from_le_bytes(packed.bytes[base + 128..base + 132].try_into().unwrap());
        assert_eq!(time_at(0), 0.25);
        assert_eq!(time_at(256), 0.5);
    }

    #[test]
    fn empty_frame_packs_nothing() {
        let packed = pack_uniforms(std::iter::empty(), 256);
        assert!(packed.bytes.is_empty());
        assert!(packed.offsets.is_empty());
    }
}
