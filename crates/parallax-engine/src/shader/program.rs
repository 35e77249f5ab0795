use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::reflect::{reflect, AttributeInfo, Reflection, UniformBlock, UniformSlot};
use super::{
    AttributeLocation, CompileError, LinkError, ShaderError, ShaderStage, StageKind,
    UniformLocation, UniformValue,
};

/// Conventional uniform and attribute names shared by the scene and the
/// built-in shaders.
pub mod names {
    pub const PROJECTION_MATRIX: &str = "projectionMatrix";
    pub const MODELVIEW_MATRIX: &str = "modelviewMatrix";
    pub const NORMAL_MATRIX: &str = "normalMatrix";
    pub const TIME: &str = "time";
    pub const OPACITY: &str = "opacity";
    pub const VERTEX_POSITION: &str = "vertexPosition";
    pub const VERTEX_NORMAL: &str = "vertexNormal";
    pub const VERTEX_COLOR: &str = "vertexColor";
}

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one successful link. Relinking yields a new id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProgramId(u64);

/// Immutable result of a successful link.
#[derive(Debug)]
pub struct LinkedProgram {
    id: ProgramId,
    label: String,
    vertex: ShaderStage,
    fragment: ShaderStage,
    reflection: Reflection,
}

impl LinkedProgram {
    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn vertex(&self) -> &ShaderStage {
        &self.vertex
    }

    #[inline]
    pub fn fragment(&self) -> &ShaderStage {
        &self.fragment
    }

    #[inline]
    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.reflection.attributes
    }

    #[inline]
    pub fn blocks(&self) -> &[UniformBlock] {
        &self.reflection.blocks
    }

    #[inline]
    pub fn uniforms(&self) -> &[UniformSlot] {
        &self.reflection.uniforms
    }

    pub fn uniform_location(&self, name: &str) -> UniformLocation {
        self.reflection
            .uniforms
            .iter()
            .position(|u| u.name == name)
            .map_or(UniformLocation::NOT_FOUND, |i| UniformLocation(i as i32))
    }

    pub fn attribute_location(&self, name: &str) -> AttributeLocation {
        self.reflection
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map_or(AttributeLocation::NOT_FOUND, |a| AttributeLocation(a.location as i32))
    }

    fn slot(&self, loc: UniformLocation) -> Option<&UniformSlot> {
        self.reflection.uniforms.get(loc.index()?)
    }

    fn read(&self, blocks: &[impl AsRef<[u8]>], loc: UniformLocation) -> Option<UniformValue> {
        let slot = self.slot(loc)?;
        let block = blocks.get(slot.block)?.as_ref();
        UniformValue::read_from(slot.ty, block.get(slot.offset as usize..)?)
    }
}

#[derive(Debug)]
enum LinkState {
    Unlinked,
    Ready(Arc<LinkedProgram>),
    Failed(LinkError),
}

/// Uniform block contents captured at draw submission.
#[derive(Debug, Clone)]
pub struct UniformSnapshot {
    program: Arc<LinkedProgram>,
    blocks: Vec<Box<[u8]>>,
}

impl UniformSnapshot {
    #[inline]
    pub fn program(&self) -> &Arc<LinkedProgram> {
        &self.program
    }

    /// One byte block per [`LinkedProgram::blocks`] entry.
    #[inline]
    pub fn blocks(&self) -> &[Box<[u8]>] {
        &self.blocks
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.program.read(&self.blocks, self.program.uniform_location(name))
    }
}

/// A vertex + fragment pair with host-side uniform state.
///
/// Lifecycle: attach stages, [`link`](Self::link) once, then bracket each
/// use with [`begin`](Self::begin) / [`end`](Self::end). Uniform values
/// persist across frames until overwritten.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    stages: Vec<ShaderStage>,
    state: LinkState,
    blocks: Vec<Vec<u8>>,
    bound: bool,
}

impl ShaderProgram {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stages: Vec::new(),
            state: LinkState::Unlinked,
            blocks: Vec::new(),
            bound: false,
        }
    }

    /// Compiles the vertex and fragment entry points of one WGSL source and
    /// attaches both. The program still needs [`link`](Self::link).
    pub fn from_wgsl(label: impl Into<String>, source: &str) -> Result<Self, CompileError> {
        let mut program = Self::new(label);
        program.attach(ShaderStage::from_wgsl(source, StageKind::Vertex)?);
        program.attach(ShaderStage::from_wgsl(source, StageKind::Fragment)?);
        Ok(program)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Adds a compiled stage. Invalidates any previous link.
    pub fn attach(&mut self, stage: ShaderStage) {
        self.stages.push(stage);
        self.state = LinkState::Unlinked;
        self.blocks.clear();
        self.bound = false;
    }

    /// Links the attached stages. Repeated calls return the first outcome.
    pub fn link(&mut self) -> Result<(), LinkError> {
        match &self.state {
            LinkState::Ready(_) => return Ok(()),
            LinkState::Failed(e) => return Err(e.clone()),
            LinkState::Unlinked => {}
        }

        match self.try_link() {
            Ok(linked) => {
                log::debug!(
                    "linked shader `{}`: {} uniforms, {} vertex inputs",
                    self.label,
                    linked.uniforms().len(),
                    linked.attributes().len()
                );
                self.blocks = linked.blocks().iter().map(|b| vec![0u8; b.size as usize]).collect();
                self.state = LinkState::Ready(Arc::new(linked));
                Ok(())
            }
            Err(e) => {
                self.state = LinkState::Failed(e.clone());
                Err(e)
            }
        }
    }

    fn try_link(&self) -> Result<LinkedProgram, LinkError> {
        let single = |kind| {
            let mut it = self.stages.iter().filter(|s| s.kind() == kind);
            let first = it.next().ok_or(LinkError::MissingStage(kind))?;
            match it.next() {
                Some(_) => Err(LinkError::DuplicateStage(kind)),
                None => Ok(first),
            }
        };
        let vertex = single(StageKind::Vertex)?;
        let fragment = single(StageKind::Fragment)?;

        Ok(LinkedProgram {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            label: self.label.clone(),
            reflection: reflect(vertex, fragment)?,
            vertex: vertex.clone(),
            fragment: fragment.clone(),
        })
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, LinkState::Ready(_))
    }

    pub fn link_error(&self) -> Option<&LinkError> {
        match &self.state {
            LinkState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn linked(&self) -> Option<&Arc<LinkedProgram>> {
        match &self.state {
            LinkState::Ready(p) => Some(p),
            _ => None,
        }
    }

    pub fn lookup_uniform(&self, name: &str) -> UniformLocation {
        self.linked()
            .map_or(UniformLocation::NOT_FOUND, |p| p.uniform_location(name))
    }

    pub fn lookup_attribute(&self, name: &str) -> AttributeLocation {
        self.linked()
            .map_or(AttributeLocation::NOT_FOUND, |p| p.attribute_location(name))
    }

    pub fn position_location(&self) -> AttributeLocation {
        self.lookup_attribute(names::VERTEX_POSITION)
    }

    pub fn normal_location(&self) -> AttributeLocation {
        self.lookup_attribute(names::VERTEX_NORMAL)
    }

    pub fn color_location(&self) -> AttributeLocation {
        self.lookup_attribute(names::VERTEX_COLOR)
    }

    /// Makes the program current for subsequent draw submissions.
    pub fn begin(&mut self) -> Result<(), ShaderError> {
        if !self.is_ready() {
            return Err(ShaderError::NotReady { label: self.label.clone() });
        }
        self.bound = true;
        Ok(())
    }

    pub fn end(&mut self) {
        self.bound = false;
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Writes a uniform. `NOT_FOUND` is a silent no-op; a value whose type
    /// differs from the declaration is logged and dropped.
    pub fn set_uniform(&mut self, loc: UniformLocation, value: impl Into<UniformValue>) {
        let value = value.into();
        let Some(program) = self.linked() else { return };
        let Some(slot) = program.slot(loc) else { return };

        if slot.ty != value.ty() {
            log::error!(
                "shader `{}`: uniform `{}` is {:?}, got {:?}",
                self.label,
                slot.name,
                slot.ty,
                value.ty()
            );
            return;
        }

        let (block, offset) = (slot.block, slot.offset as usize);
        value.write_to(&mut self.blocks[block][offset..]);
    }

    /// Current host-side value of a uniform.
    pub fn uniform_value(&self, loc: UniformLocation) -> Option<UniformValue> {
        self.linked()?.read(&self.blocks, loc)
    }

    /// Copies the uniform blocks for a draw. `None` unless linked and bound.
    pub fn snapshot(&self) -> Option<UniformSnapshot> {
        if !self.bound {
            return None;
        }
        Some(UniformSnapshot {
            program: self.linked()?.clone(),
            blocks: self.blocks.iter().map(|b| b.clone().into_boxed_slice()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::shader::test_support::{stages, BASIC_WGSL, MESH_WGSL};

    fn linked(src: &str) -> ShaderProgram {
        let mut p = ShaderProgram::from_wgsl("test", src).unwrap();
        p.link().unwrap();
        p
    }

    // ── link ──────────────────────────────────────────────────────────────

    #[test]
    fn link_requires_both_stages() {
        let (vs, _) = stages(BASIC_WGSL);
        let mut p = ShaderProgram::new("vs only");
        p.attach(vs);
        assert!(matches!(p.link(), Err(LinkError::MissingStage(StageKind::Fragment))));
        assert!(!p.is_ready());
        assert!(p.link_error().is_some());
    }

    #[test]
    fn duplicate_stage_fails() {
        let (vs, fs) = stages(BASIC_WGSL);
        let mut p = ShaderProgram::new("dup");
        p.attach(vs.clone());
        p.attach(vs);
        p.attach(fs);
        assert!(matches!(p.link(), Err(LinkError::DuplicateStage(StageKind::Vertex))));
    }

    #[test]
    fn link_is_idempotent() {
        let mut p = linked(BASIC_WGSL);
        let id = p.linked().unwrap().id();
        p.link().unwrap();
        assert_eq!(p.linked().unwrap().id(), id);
    }

    #[test]
    fn attach_after_link_invalidates() {
        let (vs, _) = stages(MESH_WGSL);
        let mut p = linked(BASIC_WGSL);
        p.attach(vs);
        assert!(!p.is_ready());
        assert_eq!(p.lookup_uniform(names::TIME), UniformLocation::NOT_FOUND);
    }

    // ── lookup ────────────────────────────────────────────────────────────

    #[test]
    fn lookups_before_link_are_not_found() {
        let p = ShaderProgram::from_wgsl("unlinked", BASIC_WGSL).unwrap();
        assert!(!p.lookup_uniform(names::TIME).is_found());
        assert!(!p.position_location().is_found());
    }

    #[test]
    fn attribute_lookup_returns_shader_location() {
        let p = linked(MESH_WGSL);
        assert_eq!(p.position_location().slot(), Some(0));
        assert_eq!(p.normal_location().slot(), Some(1));
        assert!(!p.color_location().is_found());
    }

    #[test]
    fn unknown_uniform_is_not_found() {
        let p = linked(BASIC_WGSL);
        assert!(!p.lookup_uniform("doesNotExist").is_found());
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    #[test]
    fn uniforms_persist_until_overwritten() {
        let mut p = linked(BASIC_WGSL);
        let t = p.lookup_uniform(names::TIME);
        p.set_uniform(t, 0.25f32);
        assert_eq!(p.uniform_value(t), Some(UniformValue::F32(0.25)));
        p.begin().unwrap();
        p.end();
        assert_eq!(p.uniform_value(t), Some(UniformValue::F32(0.25)));
    }

    #[test]
    fn set_not_found_is_noop() {
        let mut p = linked(BASIC_WGSL);
        p.set_uniform(UniformLocation::NOT_FOUND, 1.0f32);
        assert_eq!(p.uniform_value(p.lookup_uniform(names::OPACITY)), Some(UniformValue::F32(0.0)));
    }

    #[test]
    fn mismatched_type_is_dropped() {
        let mut p = linked(BASIC_WGSL);
        let loc = p.lookup_uniform(names::PROJECTION_MATRIX);
        p.set_uniform(loc, Vec3::ONE);
        assert_eq!(p.uniform_value(loc), Some(UniformValue::Mat4(Mat4::ZERO)));
    }

    // ── begin / snapshot ──────────────────────────────────────────────────

    #[test]
    fn begin_requires_link() {
        let mut p = ShaderProgram::from_wgsl("unlinked", BASIC_WGSL).unwrap();
        assert!(matches!(p.begin(), Err(ShaderError::NotReady { .. })));
    }

    #[test]
    fn snapshot_only_while_bound() {
        let mut p = linked(BASIC_WGSL);
        assert!(p.snapshot().is_none());

        p.begin().unwrap();
        let m = Mat4::from_translation(Vec3::X);
        p.set_uniform(p.lookup_uniform(names::MODELVIEW_MATRIX), m);
        let snap = p.snapshot().unwrap();
        p.set_uniform(p.lookup_uniform(names::MODELVIEW_MATRIX), Mat4::IDENTITY);

        assert_eq!(snap.get(names::MODELVIEW_MATRIX), Some(UniformValue::Mat4(m)));
        assert_eq!(snap.blocks().len(), 1);
        p.end();
        assert!(p.snapshot().is_none());
    }
}
