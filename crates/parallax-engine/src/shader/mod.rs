//! WGSL shader stages and programs.
//!
//! A [`ShaderProgram`] pairs a vertex and a fragment [`ShaderStage`] and keeps
//! host copies of its group-0 uniform blocks. Uniforms and vertex inputs are
//! looked up by name after [`link`](ShaderProgram::link); lookups that miss
//! return `NOT_FOUND` handles, which every setter accepts and ignores.
//!
//! Draws capture a [`UniformSnapshot`] so that values set between two draws of
//! the same frame reach the GPU independently.

mod collection;
mod error;
mod program;
mod reflect;
mod stage;
mod uniform;

#[cfg(test)]
pub(crate) mod test_support;

pub use collection::ShaderCollection;
pub use error::{CompileError, LinkError, ShaderError};
pub use program::{names, LinkedProgram, ProgramId, ShaderProgram, UniformSnapshot};
pub use reflect::{AttributeInfo, ScalarClass, UniformBlock, UniformSlot};
pub use stage::{ShaderStage, StageKind};
pub use uniform::{AttributeLocation, UniformLocation, UniformType, UniformValue};
