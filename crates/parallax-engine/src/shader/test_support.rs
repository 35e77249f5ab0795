use super::{ShaderStage, StageKind};

pub(crate) const BASIC_WGSL: &str = r#"
struct Uniforms {
    projectionMatrix: mat4x4<f32>,
    modelviewMatrix: mat4x4<f32>,
    time: f32,
    opacity: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) shade: f32,
}

@vertex
fn vs_main(@location(0) vertexPosition: vec3<f32>) -> VertexOut {
    var out: VertexOut;
    out.clip = u.projectionMatrix * u.modelviewMatrix * vec4<f32>(vertexPosition, 1.0);
    out.shade = u.time;
    return out;
}

@fragment
fn fs_main(v: VertexOut) -> @location(0) vec4<f32> {
    return vec4<f32>(v.shade, 0.0, 0.0, u.opacity);
}
"#;

pub(crate) const MESH_WGSL: &str = r#"
struct Uniforms {
    projectionMatrix: mat4x4<f32>,
    modelviewMatrix: mat4x4<f32>,
    opacity: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexIn {
    @location(1) vertexNormal: vec3<f32>,
    @location(0) vertexPosition: vec3<f32>,
}

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) normal: vec3<f32>,
}

@vertex
fn vs_main(v: VertexIn) -> VertexOut {
    var out: VertexOut;
    out.clip = u.projectionMatrix * u.modelviewMatrix * vec4<f32>(v.vertexPosition, 1.0);
    out.normal = v.vertexNormal;
    return out;
}

@fragment
fn fs_main(v: VertexOut) -> @location(0) vec4<f32> {
    return vec4<f32>(abs(v.normal), u.opacity);
}
"#;

pub(crate) fn stages(src: &str) -> (ShaderStage, ShaderStage) {
    (
        ShaderStage::from_wgsl(src, StageKind::Vertex).unwrap(),
        ShaderStage::from_wgsl(src, StageKind::Fragment).unwrap(),
    )
}
