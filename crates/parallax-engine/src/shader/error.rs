use thiserror::Error;

use super::StageKind;

/// A stage failed to compile. Carries the compiler log.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("{stage} stage source is not valid UTF-8")]
    InvalidUtf8 { stage: StageKind },

    #[error("{stage} stage failed to compile:\n{log}")]
    Syntax { stage: StageKind, log: String },

    #[error("{stage} stage source has no @{stage} entry point")]
    MissingEntryPoint { stage: StageKind },

    #[error("{stage} stages are not supported by the wgpu backend")]
    UnsupportedStage { stage: StageKind },
}

/// A program failed to link. `Display` is the link log.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("program has no {0} stage attached")]
    MissingStage(StageKind),

    #[error("program has more than one {0} stage attached")]
    DuplicateStage(StageKind),

    #[error("uniform `{name}` is declared in bind group {group}; only group 0 is supported")]
    UnsupportedBindGroup { name: String, group: u32 },

    #[error("resource `{name}` is not a uniform buffer")]
    UnsupportedResource { name: String },

    #[error("uniform binding {binding} is declared differently by the vertex and fragment stages")]
    BindingConflict { binding: u32 },

    #[error("uniform `{name}` is declared by more than one uniform block")]
    UniformConflict { name: String },
}

/// Misuse of a program at draw time.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    #[error("shader program `{label}` is not linked")]
    NotReady { label: String },
}
