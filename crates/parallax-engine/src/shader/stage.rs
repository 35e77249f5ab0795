use std::fmt;
use std::sync::Arc;

use crate::asset::ByteBuffer;

use super::CompileError;

/// Pipeline stage a [`ShaderStage`] is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
    Geometry,
}

impl StageKind {
    fn naga_stage(self) -> Option<naga::ShaderStage> {
        match self {
            StageKind::Vertex => Some(naga::ShaderStage::Vertex),
            StageKind::Fragment => Some(naga::ShaderStage::Fragment),
            StageKind::Geometry => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
            StageKind::Geometry => "geometry",
        })
    }
}

/// A validated WGSL module with a known entry point for one stage.
///
/// Cheap to clone; the source and parsed module are shared.
#[derive(Debug, Clone)]
pub struct ShaderStage {
    kind: StageKind,
    entry_point: String,
    source: Arc<str>,
    module: Arc<naga::Module>,
}

impl ShaderStage {
    /// Parses and validates `source` as WGSL and picks the first entry point of
    /// `kind`.
    pub fn compile(source: &ByteBuffer, kind: StageKind) -> Result<Self, CompileError> {
        let text = std::str::from_utf8(source.as_slice())
            .map_err(|_| CompileError::InvalidUtf8 { stage: kind })?;
        Self::from_wgsl(text, kind)
    }

    /// Same as [`compile`](Self::compile) for source already in memory.
    pub fn from_wgsl(text: &str, kind: StageKind) -> Result<Self, CompileError> {
        let Some(naga_stage) = kind.naga_stage() else {
            return Err(CompileError::UnsupportedStage { stage: kind });
        };

        let module = naga::front::wgsl::parse_str(text).map_err(|e| CompileError::Syntax {
            stage: kind,
            log: e.emit_to_string(text),
        })?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| CompileError::Syntax {
            stage: kind,
            log: e.emit_to_string(text),
        })?;

        let entry_point = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == naga_stage)
            .map(|ep| ep.name.clone())
            .ok_or(CompileError::MissingEntryPoint { stage: kind })?;

        Ok(Self {
            kind,
            entry_point,
            source: text.into(),
            module: Arc::new(module),
        })
    }

    #[inline]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    #[inline]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// WGSL text the stage was compiled from.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }
}
