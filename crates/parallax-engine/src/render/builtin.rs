use crate::shader::{CompileError, ShaderProgram};

pub const POINTS_WGSL: &str = include_str!("shaders/points.wgsl");
pub const MESH_WGSL: &str = include_str!("shaders/mesh.wgsl");

/// Program for point clouds: reads `vertexPosition`.
pub fn points_program() -> Result<ShaderProgram, CompileError> {
    ShaderProgram::from_wgsl("points", POINTS_WGSL)
}

/// Program for meshes: reads `vertexPosition` and `vertexNormal`.
pub fn mesh_program() -> Result<ShaderProgram, CompileError> {
    ShaderProgram::from_wgsl("mesh", MESH_WGSL)
}
