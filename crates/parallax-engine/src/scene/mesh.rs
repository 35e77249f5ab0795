//! Indexed triangle meshes loaded from OBJ sources, with smoothed normals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use parallax_obj::{parse_mtl, parse_obj, Material, ObjDocument, ParseError};
use thiserror::Error;

use crate::asset::{ByteBuffer, LoadError};
use crate::device::{BufferAllocator, BufferUsage, GpuBuffer, GpuError};
use crate::shader::ShaderProgram;

use super::{DrawCall, DrawList, FrameContext, IndexRange, Topology, VertexLayout};

#[derive(Debug, Error)]
pub enum MeshError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{}: not valid UTF-8", path.display())]
    Utf8 { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// CPU-side mesh ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    /// Three per triangle.
    pub indices: Vec<u32>,
    /// Per triangle, an index into [`materials`](Self::materials).
    pub triangle_materials: Vec<Option<usize>>,
    /// One per `usemtl` name of the source, in first-use order.
    pub materials: Vec<Material>,
}

impl MeshData {
    /// Builds vertices and indices from a parsed document.
    ///
    /// The n-th `vn` becomes the input normal of the n-th vertex. Every vertex
    /// used by at least one face then gets the mean of its faces' unnormalized
    /// normals `(v1 - v2) x (v3 - v2)`; unused vertices keep their input normal.
    /// Materials are named placeholders until [`with_materials`](Self::with_materials).
    pub fn from_obj(doc: &ObjDocument, position_scale: f32) -> Self {
        let mut vertices: Vec<MeshVertex> = doc
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| MeshVertex {
                position: (Vec3::from_array(*p) * position_scale).to_array(),
                normal: doc.normals.get(i).copied().unwrap_or([0.0; 3]),
            })
            .collect();

        let mut sums = vec![Vec3::ZERO; vertices.len()];
        let mut counts = vec![0u32; vertices.len()];
        let mut indices = Vec::with_capacity(doc.triangles.len() * 3);

        for tri in &doc.triangles {
            let [a, b, c] = tri.vertices.map(|i| i as usize);
            let p = |i: usize| Vec3::from_array(vertices[i].position);
            let face_normal = (p(a) - p(b)).cross(p(c) - p(b));
            for i in [a, b, c] {
                sums[i] += face_normal;
                counts[i] += 1;
            }
            indices.extend_from_slice(&tri.vertices);
        }

        for (v, (sum, n)) in vertices.iter_mut().zip(sums.into_iter().zip(counts)) {
            if n > 0 {
                v.normal = (sum / n as f32).to_array();
            }
        }

        Self {
            vertices,
            indices,
            triangle_materials: doc.triangles.iter().map(|t| t.material).collect(),
            materials: doc.material_names.iter().map(Material::named).collect(),
        }
    }

    /// Replaces placeholder materials with same-named entries of `library`.
    pub fn with_materials(mut self, library: &[Material]) -> Self {
        for slot in &mut self.materials {
            match library.iter().find(|m| m.name == slot.name) {
                Some(m) => *slot = m.clone(),
                None => log::warn!("material `{}` is used but not defined", slot.name),
            }
        }
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Reads an OBJ file and the MTL libraries it names (relative to the OBJ).
pub fn load_obj_file(path: &Path, position_scale: f32) -> Result<MeshData, MeshError> {
    let doc = parse_obj(&read_text(path)?).map_err(|source| MeshError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if doc.texcoord_count > 0 {
        log::warn!("{}: `vt` texture coordinates are not supported and were ignored", path.display());
    }

    let dir = path.parent().unwrap_or(Path::new(""));
    let mut library = Vec::new();
    for lib in &doc.material_libraries {
        let lib_path = dir.join(lib);
        let parsed = parse_mtl(&read_text(&lib_path)?).map_err(|source| MeshError::Parse {
            path: lib_path.clone(),
            source,
        })?;
        library.extend(parsed);
    }

    let data = MeshData::from_obj(&doc, position_scale).with_materials(&library);
    log::info!(
        "loaded {}: {} vertices, {} triangles, {} materials",
        path.display(),
        data.vertices.len(),
        data.triangle_count(),
        data.materials.len()
    );
    Ok(data)
}

fn read_text(path: &Path) -> Result<String, MeshError> {
    let bytes = ByteBuffer::from_file(path)?;
    String::from_utf8(bytes.copy_out()).map_err(|_| MeshError::Utf8 { path: path.to_path_buf() })
}

/// A static indexed mesh drawn with the shader's `vertexPosition` and
/// `vertexNormal` inputs.
#[derive(Debug, Clone)]
pub struct MeshWithNormals {
    vertex_buffer: Arc<GpuBuffer>,
    indices: IndexRange,
    vertex_count: u32,
    materials: Vec<Material>,
}

impl MeshWithNormals {
    pub fn new(alloc: &dyn BufferAllocator, data: &MeshData) -> Result<Self, GpuError> {
        let vertex_buffer = alloc.create_static_buffer(
            "mesh vertices",
            bytemuck::cast_slice(&data.vertices),
            BufferUsage::Vertex,
        )?;
        let index_buffer = alloc.create_static_buffer(
            "mesh indices",
            bytemuck::cast_slice(&data.indices),
            BufferUsage::Index,
        )?;

        Ok(Self {
            vertex_buffer,
            indices: IndexRange { buffer: index_buffer, count: data.indices.len() as u32 },
            vertex_count: data.vertices.len() as u32,
            materials: data.materials.clone(),
        })
    }

    pub fn from_obj_file(
        alloc: &dyn BufferAllocator,
        path: impl AsRef<Path>,
        position_scale: f32,
    ) -> Result<Self, MeshError> {
        let data = load_obj_file(path.as_ref(), position_scale)?;
        Ok(Self::new(alloc, &data)?)
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.count
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Parsed but never bound for drawing.
    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Vertex layout matching the inputs `shader` declares.
    pub fn layout_for(shader: &ShaderProgram) -> VertexLayout {
        let mut attributes = Vec::with_capacity(2);
        if let Some(slot) = shader.position_location().slot() {
            attributes.push(wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: slot,
            });
        }
        if let Some(slot) = shader.normal_location().slot() {
            attributes.push(wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: slot,
            });
        }
        VertexLayout::new(std::mem::size_of::<MeshVertex>() as u64, attributes)
    }

    pub fn render(&self, _frame: &FrameContext, shader: &ShaderProgram, list: &mut DrawList) {
        list.push(
            shader,
            DrawCall {
                label: "mesh",
                topology: Topology::Triangles,
                vertex_buffer: self.vertex_buffer.clone(),
                layout: Arc::new(Self::layout_for(shader)),
                vertex_count: self.vertex_count,
                indices: Some(self.indices.clone()),
            },
        );
    }
}
