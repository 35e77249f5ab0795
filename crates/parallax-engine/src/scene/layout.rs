//! Runtime-described vertex record layouts.

use std::fmt;
use std::str::FromStr;

/// Storage type of one component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BaseType {
    Float,
    Double,
    Bool,
    Int,
    UInt,
}

impl BaseType {
    /// Bytes per component.
    pub const fn size(self) -> u64 {
        match self {
            BaseType::Double => 8,
            BaseType::Bool => 1,
            BaseType::Float | BaseType::Int | BaseType::UInt => 4,
        }
    }
}

/// GLSL-style scalar, vector and matrix types a record field can declare.
///
/// Matrices are `MatCxR`: `C` columns of `R` rows, stored column-major.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GlslType {
    Float,
    Double,
    Bool,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    DVec2,
    DVec3,
    DVec4,
    BVec2,
    BVec3,
    BVec4,
    IVec2,
    IVec3,
    IVec4,
    UVec2,
    UVec3,
    UVec4,
    Mat2,
    DMat2,
    Mat3,
    DMat3,
    Mat4,
    DMat4,
    Mat2x3,
    Mat2x4,
    Mat3x2,
    Mat3x4,
    Mat4x2,
    Mat4x3,
}

impl GlslType {
    pub const ALL: [GlslType; 32] = {
        use GlslType::*;
        [
            Float, Double, Bool, Int, UInt, Vec2, Vec3, Vec4, DVec2, DVec3, DVec4, BVec2, BVec3,
            BVec4, IVec2, IVec3, IVec4, UVec2, UVec3, UVec4, Mat2, DMat2, Mat3, DMat3, Mat4, DMat4,
            Mat2x3, Mat2x4, Mat3x2, Mat3x4, Mat4x2, Mat4x3,
        ]
    };

    pub const fn base(self) -> BaseType {
        use GlslType::*;
        match self {
            Float | Vec2 | Vec3 | Vec4 => BaseType::Float,
            Mat2 | Mat3 | Mat4 | Mat2x3 | Mat2x4 | Mat3x2 | Mat3x4 | Mat4x2 | Mat4x3 => {
                BaseType::Float
            }
            Double | DVec2 | DVec3 | DVec4 | DMat2 | DMat3 | DMat4 => BaseType::Double,
            Bool | BVec2 | BVec3 | BVec4 => BaseType::Bool,
            Int | IVec2 | IVec3 | IVec4 => BaseType::Int,
            UInt | UVec2 | UVec3 | UVec4 => BaseType::UInt,
        }
    }

    /// Number of attribute slots the type occupies (1 for non-matrices).
    pub const fn columns(self) -> u32 {
        use GlslType::*;
        match self {
            Mat2 | DMat2 | Mat2x3 | Mat2x4 => 2,
            Mat3 | DMat3 | Mat3x2 | Mat3x4 => 3,
            Mat4 | DMat4 | Mat4x2 | Mat4x3 => 4,
            _ => 1,
        }
    }

    /// Components per column.
    pub const fn rows(self) -> u32 {
        use GlslType::*;
        match self {
            Float | Double | Bool | Int | UInt => 1,
            Vec2 | DVec2 | BVec2 | IVec2 | UVec2 | Mat2 | DMat2 | Mat3x2 | Mat4x2 => 2,
            Vec3 | DVec3 | BVec3 | IVec3 | UVec3 | Mat3 | DMat3 | Mat2x3 | Mat4x3 => 3,
            Vec4 | DVec4 | BVec4 | IVec4 | UVec4 | Mat4 | DMat4 | Mat2x4 | Mat3x4 => 4,
        }
    }

    pub const fn components(self) -> u32 {
        self.columns() * self.rows()
    }

    /// Tightly packed size in a record.
    pub const fn byte_size(self) -> u64 {
        self.components() as u64 * self.base().size()
    }

    pub const fn keyword(self) -> &'static str {
        use GlslType::*;
        match self {
            Float => "float",
            Double => "double",
            Bool => "bool",
            Int => "int",
            UInt => "uint",
            Vec2 => "vec2",
            Vec3 => "vec3",
            Vec4 => "vec4",
            DVec2 => "dvec2",
            DVec3 => "dvec3",
            DVec4 => "dvec4",
            BVec2 => "bvec2",
            BVec3 => "bvec3",
            BVec4 => "bvec4",
            IVec2 => "ivec2",
            IVec3 => "ivec3",
            IVec4 => "ivec4",
            UVec2 => "uvec2",
            UVec3 => "uvec3",
            UVec4 => "uvec4",
            Mat2 => "mat2",
            DMat2 => "dmat2",
            Mat3 => "mat3",
            DMat3 => "dmat3",
            Mat4 => "mat4",
            DMat4 => "dmat4",
            Mat2x3 => "mat2x3",
            Mat2x4 => "mat2x4",
            Mat3x2 => "mat3x2",
            Mat3x4 => "mat3x4",
            Mat4x2 => "mat4x2",
            Mat4x3 => "mat4x3",
        }
    }
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vertex field type `{}`", self.0)
    }
}

impl std::error::Error for UnknownType {}

impl FromStr for GlslType {
    type Err = UnknownType;

    /// Case-insensitive; `mat2x2` and friends alias the square names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let canonical = match lower.as_str() {
            "mat2x2" => "mat2",
            "mat3x3" => "mat3",
            "mat4x4" => "mat4",
            other => other,
        };
        GlslType::ALL
            .into_iter()
            .find(|t| t.keyword() == canonical)
            .ok_or_else(|| UnknownType(s.to_owned()))
    }
}

/// One named field of a vertex record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexField {
    pub name: String,
    pub ty: GlslType,
    /// Integer data is mapped to `[0, 1]` / `[-1, 1]` floats.
    pub normalize: bool,
}

impl VertexField {
    pub fn new(name: impl Into<String>, ty: GlslType) -> Self {
        Self { name: name.into(), ty, normalize: false }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }
}

/// Byte offsets of each field (declaration order) and the record stride.
pub fn record_layout(fields: &[VertexField]) -> (Vec<u64>, u64) {
    let mut offsets = Vec::with_capacity(fields.len());
    let mut stride = 0;
    for f in fields {
        offsets.push(stride);
        stride += f.ty.byte_size();
    }
    (offsets, stride)
}

/// The wgpu format for `components` values of `base`, if one exists.
pub fn vertex_format(base: BaseType, components: u32, normalize: bool) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    let format = match (base, components, normalize) {
        (BaseType::Float, 1, _) => F::Float32,
        (BaseType::Float, 2, _) => F::Float32x2,
        (BaseType::Float, 3, _) => F::Float32x3,
        (BaseType::Float, 4, _) => F::Float32x4,
        (BaseType::Double, 1, _) => F::Float64,
        (BaseType::Double, 2, _) => F::Float64x2,
        (BaseType::Double, 3, _) => F::Float64x3,
        (BaseType::Double, 4, _) => F::Float64x4,
        (BaseType::Bool, 2, false) => F::Uint8x2,
        (BaseType::Bool, 4, false) => F::Uint8x4,
        (BaseType::Bool, 2, true) => F::Unorm8x2,
        (BaseType::Bool, 4, true) => F::Unorm8x4,
        (BaseType::Int, 1, false) => F::Sint32,
        (BaseType::Int, 2, false) => F::Sint32x2,
        (BaseType::Int, 3, false) => F::Sint32x3,
        (BaseType::Int, 4, false) => F::Sint32x4,
        (BaseType::UInt, 1, false) => F::Uint32,
        (BaseType::UInt, 2, false) => F::Uint32x2,
        (BaseType::UInt, 3, false) => F::Uint32x3,
        (BaseType::UInt, 4, false) => F::Uint32x4,
        _ => return None,
    };
    Some(format)
}

/// Attributes for one field bound at `location`. Matrix columns occupy
/// consecutive locations.
pub fn field_attributes(
    field: &VertexField,
    offset: u64,
    location: u32,
) -> Option<Vec<wgpu::VertexAttribute>> {
    let ty = field.ty;
    let format = vertex_format(ty.base(), ty.rows(), field.normalize)?;
    let column_bytes = ty.rows() as u64 * ty.base().size();
    Some(
        (0..ty.columns())
            .map(|c| wgpu::VertexAttribute {
                format,
                offset: offset + c as u64 * column_bytes,
                shader_location: location + c,
            })
            .collect(),
    )
}

/// Interleaved buffer layout of one drawable. Hashable so it can key
/// pipeline caches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub fn new(stride: u64, attributes: Vec<wgpu::VertexAttribute>) -> Self {
        Self { stride, attributes }
    }

    /// The attribute bound to `location`, if any.
    pub fn attribute_at(&self, location: u32) -> Option<&wgpu::VertexAttribute> {
        self.attributes.iter().find(|a| a.shader_location == location)
    }

    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}
