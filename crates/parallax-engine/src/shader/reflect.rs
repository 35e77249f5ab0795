//! Name-based introspection of linked WGSL stages.

use std::collections::btree_map::{BTreeMap, Entry};

use naga::{AddressSpace, Binding, Module, ScalarKind, TypeInner};

use super::{LinkError, ShaderStage, UniformType};

/// Scalar class of a vertex input, used to validate buffer formats.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScalarClass {
    F32,
    F64,
    I32,
    U32,
}

/// A `@location` input of the vertex entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub location: u32,
    pub class: ScalarClass,
}

/// A `var<uniform>` binding in group 0.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub binding: u32,
    pub size: u32,
}

/// A host-settable value inside a [`UniformBlock`].
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSlot {
    pub name: String,
    /// Index into [`Reflection::blocks`].
    pub block: usize,
    pub offset: u32,
    pub ty: UniformType,
}

#[derive(Debug, Clone, Default)]
pub struct Reflection {
    pub attributes: Vec<AttributeInfo>,
    /// Sorted by binding.
    pub blocks: Vec<UniformBlock>,
    pub uniforms: Vec<UniformSlot>,
}

#[derive(Debug, PartialEq)]
struct BlockDecl {
    size: u32,
    members: Vec<(String, u32, UniformType)>,
}

pub(crate) fn reflect(vertex: &ShaderStage, fragment: &ShaderStage) -> Result<Reflection, LinkError> {
    let mut decls: BTreeMap<u32, BlockDecl> = BTreeMap::new();
    collect_blocks(vertex.module(), &mut decls)?;
    collect_blocks(fragment.module(), &mut decls)?;

    let mut blocks = Vec::with_capacity(decls.len());
    let mut uniforms: Vec<UniformSlot> = Vec::new();
    for (block, (binding, decl)) in decls.into_iter().enumerate() {
        blocks.push(UniformBlock { binding, size: decl.size });
        for (name, offset, ty) in decl.members {
            if uniforms.iter().any(|u| u.name == name) {
                return Err(LinkError::UniformConflict { name });
            }
            uniforms.push(UniformSlot { name, block, offset, ty });
        }
    }

    Ok(Reflection {
        attributes: vertex_inputs(vertex),
        blocks,
        uniforms,
    })
}

fn collect_blocks(module: &Module, decls: &mut BTreeMap<u32, BlockDecl>) -> Result<(), LinkError> {
    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else { continue };
        let name = var.name.clone().unwrap_or_default();

        if var.space != AddressSpace::Uniform {
            return Err(LinkError::UnsupportedResource { name });
        }
        if rb.group != 0 {
            return Err(LinkError::UnsupportedBindGroup { name, group: rb.group });
        }

        let inner = &module.types[var.ty].inner;
        let size = inner.size(module.to_ctx());
        let members = match inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|m| {
                    let ty = uniform_type(&module.types[m.ty].inner)?;
                    Some((m.name.clone()?, m.offset, ty))
                })
                .collect(),
            other => uniform_type(other).map(|ty| (name, 0, ty)).into_iter().collect(),
        };

        let decl = BlockDecl { size, members };
        match decls.entry(rb.binding) {
            Entry::Vacant(slot) => {
                slot.insert(decl);
            }
            Entry::Occupied(existing) if *existing.get() == decl => {}
            Entry::Occupied(_) => return Err(LinkError::BindingConflict { binding: rb.binding }),
        }
    }
    Ok(())
}

fn uniform_type(inner: &TypeInner) -> Option<UniformType> {
    match *inner {
        TypeInner::Scalar(s) if s.width == 4 => match s.kind {
            ScalarKind::Float => Some(UniformType::F32),
            ScalarKind::Sint => Some(UniformType::I32),
            ScalarKind::Uint => Some(UniformType::U32),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if scalar == naga::Scalar::F32 => {
            Some(UniformType::Vec(size as u8))
        }
        TypeInner::Matrix { columns, rows, scalar } if scalar == naga::Scalar::F32 => {
            Some(UniformType::Mat { cols: columns as u8, rows: rows as u8 })
        }
        _ => None,
    }
}

fn vertex_inputs(stage: &ShaderStage) -> Vec<AttributeInfo> {
    let module = stage.module();
    let Some(ep) = module.entry_points.iter().find(|ep| ep.name == stage.entry_point()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        match &module.types[arg.ty].inner {
            TypeInner::Struct { members, .. } => {
                for m in members {
                    push_input(module, &mut out, m.name.as_deref(), m.binding.as_ref(), m.ty);
                }
            }
            _ => push_input(module, &mut out, arg.name.as_deref(), arg.binding.as_ref(), arg.ty),
        }
    }
    out.sort_by_key(|a| a.location);
    out
}

fn push_input(
    module: &Module,
    out: &mut Vec<AttributeInfo>,
    name: Option<&str>,
    binding: Option<&Binding>,
    ty: naga::Handle<naga::Type>,
) {
    let Some(Binding::Location { location, .. }) = binding else { return };
    let scalar = match module.types[ty].inner {
        TypeInner::Scalar(s) => s,
        TypeInner::Vector { scalar, .. } => scalar,
        _ => return,
    };
    let class = match (scalar.kind, scalar.width) {
        (ScalarKind::Float, 4) => ScalarClass::F32,
        (ScalarKind::Float, 8) => ScalarClass::F64,
        (ScalarKind::Sint, 4) => ScalarClass::I32,
        (ScalarKind::Uint, 4) => ScalarClass::U32,
        _ => return,
    };
    out.push(AttributeInfo {
        name: name.unwrap_or_default().to_owned(),
        location: *location,
        class,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::test_support::{stages, BASIC_WGSL, MESH_WGSL};
    use crate::shader::StageKind;

    fn reflect_src(vs: &str, fs: &str) -> Result<Reflection, LinkError> {
        let v = ShaderStage::from_wgsl(vs, StageKind::Vertex).unwrap();
        let f = ShaderStage::from_wgsl(fs, StageKind::Fragment).unwrap();
        reflect(&v, &f)
    }

    #[test]
    fn struct_members_become_uniforms() {
        let (v, f) = stages(BASIC_WGSL);
        let r = reflect(&v, &f).unwrap();

        assert_eq!(r.blocks, vec![UniformBlock { binding: 0, size: 144 }]);
        let offsets: Vec<_> = r.uniforms.iter().map(|u| (u.name.as_str(), u.offset)).collect();
        assert_eq!(
            offsets,
            vec![("projectionMatrix", 0), ("modelviewMatrix", 64), ("time", 128), ("opacity", 132)]
        );
        assert_eq!(r.uniforms[0].ty, UniformType::Mat { cols: 4, rows: 4 });
    }

    #[test]
    fn vertex_inputs_sorted_by_location() {
        let (v, f) = stages(MESH_WGSL);
        let r = reflect(&v, &f).unwrap();
        let names: Vec<_> = r.attributes.iter().map(|a| (a.name.as_str(), a.location)).collect();
        assert_eq!(names, vec![("vertexPosition", 0), ("vertexNormal", 1)]);
        assert!(r.attributes.iter().all(|a| a.class == ScalarClass::F32));
    }

    #[test]
    fn loose_uniform_is_its_own_block() {
        let src = "
            @group(0) @binding(2) var<uniform> scale: f32;
            @vertex fn vs(@location(3) p: vec2<i32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(vec2<f32>(p) * scale, 0.0, 1.0);
            }
            @fragment fn fs() -> @location(0) vec4<f32> { return vec4<f32>(scale); }
        ";
        let r = reflect_src(src, src).unwrap();
        assert_eq!(r.blocks, vec![UniformBlock { binding: 2, size: 4 }]);
        assert_eq!(r.uniforms[0].name, "scale");
        assert_eq!(r.attributes[0].class, ScalarClass::I32);
    }

    #[test]
    fn other_bind_groups_are_rejected() {
        let src = "
            @group(1) @binding(0) var<uniform> tint: vec4<f32>;
            @vertex fn vs() -> @builtin(position) vec4<f32> { return tint; }
            @fragment fn fs() -> @location(0) vec4<f32> { return tint; }
        ";
        let err = reflect_src(src, src).unwrap_err();
        assert!(matches!(err, LinkError::UnsupportedBindGroup { group: 1, .. }));
    }

    #[test]
    fn mismatched_blocks_conflict() {
        let vs = "
            @group(0) @binding(0) var<uniform> a: f32;
            @vertex fn vs() -> @builtin(position) vec4<f32> { return vec4<f32>(a); }
        ";
        let fs = "
            @group(0) @binding(0) var<uniform> b: vec4<f32>;
            @fragment fn fs() -> @location(0) vec4<f32> { return b; }
        ";
        let err = reflect_src(vs, fs).unwrap_err();
        assert!(matches!(err, LinkError::BindingConflict { binding: 0 }));
    }

    #[test]
    fn same_name_in_two_blocks_conflicts() {
        let vs = "
            @group(0) @binding(0) var<uniform> a: f32;
            @vertex fn vs() -> @builtin(position) vec4<f32> { return vec4<f32>(a); }
        ";
        let fs = "
            @group(0) @binding(1) var<uniform> a: f32;
            @fragment fn fs() -> @location(0) vec4<f32> { return vec4<f32>(a); }
        ";
        let err = reflect_src(vs, fs).unwrap_err();
        assert!(matches!(err, LinkError::UniformConflict { .. }));
    }
}
