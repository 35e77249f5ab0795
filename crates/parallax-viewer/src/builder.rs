//! Turns a manifest (or the demo) into a scene graph plus shader programs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use parallax_engine::asset::ByteBuffer;
use parallax_engine::device::BufferAllocator;
use parallax_engine::render::{
    RendererConfig, StereoConfig, StereoMode, mesh_program, points_program,
};
use parallax_engine::scene::{
    CompositeGroup, CrossfadeSwitchGroup, FixedLayoutPointCloud, GlslType, MeshWithNormals,
    NodeId, Scene, SwitchGroup, TypedPointCloud, VertexField,
};
use parallax_engine::shader::{ShaderCollection, ShaderProgram, ShaderStage, StageKind};

use crate::demo;
use crate::manifest::{FieldEntry, Manifest, Node, SequenceKind, ShaderEntry, resolve, sequence_paths};

/// Everything `SceneRenderer::configure` takes.
#[derive(Debug)]
pub struct BuiltScene {
    pub scene: Scene,
    pub root: NodeId,
    pub shaders: ShaderCollection,
}

/// Where the scene comes from. Parsed before any window or GPU exists so a
/// bad manifest fails fast.
#[derive(Debug, Clone)]
pub enum SceneSource {
    Demo,
    Manifest { manifest: Manifest, base: PathBuf },
}

impl SceneSource {
    pub fn from_arg(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Ok(SceneSource::Demo) };
        let manifest = Manifest::load(path)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(SceneSource::Manifest { manifest, base })
    }

    pub fn renderer_config(&self) -> RendererConfig {
        match self {
            SceneSource::Demo => RendererConfig::default(),
            SceneSource::Manifest { manifest, .. } => manifest.renderer_config(),
        }
    }

    pub fn stereo_config(&self, mono: bool) -> StereoConfig {
        let mut config = match self {
            SceneSource::Demo => StereoConfig::default(),
            SceneSource::Manifest { manifest, .. } => manifest.stereo.apply(StereoConfig::default()),
        };
        if mono {
            config.mode = StereoMode::Mono;
        }
        config
    }

    /// Uploads every node through `alloc`.
    pub fn build(&self, alloc: &dyn BufferAllocator) -> Result<BuiltScene> {
        let built = match self {
            SceneSource::Demo => demo::build(alloc)?,
            SceneSource::Manifest { manifest, base } => {
                let mut builder = SceneBuilder { alloc, base, scene: Scene::new() };
                let root = builder.node(&manifest.root)?;
                BuiltScene { scene: builder.scene, root, shaders: load_shaders(&manifest.shaders, base)? }
            }
        };
        log::info!(
            "scene built: {} node(s), {} animated group(s), {} shader(s)",
            built.scene.len(),
            built.scene.animated().len(),
            built.shaders.len()
        );
        Ok(built)
    }
}

/// The built-in point and mesh programs.
pub fn builtin_shaders() -> Result<ShaderCollection> {
    let mut shaders = ShaderCollection::new();
    shaders.push(points_program()?);
    shaders.push(mesh_program()?);
    Ok(shaders)
}

fn load_shaders(entries: &[ShaderEntry], base: &Path) -> Result<ShaderCollection> {
    if entries.is_empty() {
        return builtin_shaders();
    }
    let mut shaders = ShaderCollection::new();
    for entry in entries {
        let mut program = ShaderProgram::new(entry.label.clone());
        program.attach(compile_stage(base, &entry.vertex, StageKind::Vertex)?);
        program.attach(compile_stage(base, entry.fragment_path(), StageKind::Fragment)?);
        shaders.push(program);
    }
    Ok(shaders)
}

fn compile_stage(base: &Path, path: &Path, kind: StageKind) -> Result<ShaderStage> {
    let path = resolve(base, path);
    let source = ByteBuffer::from_file(&path)?;
    ShaderStage::compile(&source, kind)
        .with_context(|| format!("{kind} stage {}", path.display()))
}

struct SceneBuilder<'a> {
    alloc: &'a dyn BufferAllocator,
    base: &'a Path,
    scene: Scene,
}

impl SceneBuilder<'_> {
    fn load(&self, path: &Path) -> Result<ByteBuffer> {
        Ok(ByteBuffer::from_file(resolve(self.base, path))?)
    }

    fn node(&mut self, node: &Node) -> Result<NodeId> {
        let id = match node {
            Node::Points { path } => {
                let cloud = FixedLayoutPointCloud::positions(self.alloc, &self.load(path)?)?;
                self.scene.insert(cloud)
            }
            Node::MassPoints { path } => {
                let cloud = FixedLayoutPointCloud::typed_masses(self.alloc, &self.load(path)?)?;
                self.scene.insert(cloud)
            }
            Node::VelocityPoints { previous, current, next } => {
                let cloud = FixedLayoutPointCloud::velocity(
                    self.alloc,
                    &self.load(previous)?,
                    &self.load(current)?,
                    &self.load(next)?,
                )?;
                self.scene.insert(cloud)
            }
            Node::TypedPoints { path, fields } => {
                let fields = fields.iter().map(vertex_field).collect::<Result<Vec<_>>>()?;
                let cloud = TypedPointCloud::new(self.alloc, &self.load(path)?, fields)?;
                self.scene.insert(cloud)
            }
            Node::Mesh { path, position_scale } => {
                let path = resolve(self.base, path);
                let mesh = MeshWithNormals::from_obj_file(self.alloc, &path, *position_scale)?;
                log::debug!("mesh {}: {} vertices, {} indices", path.display(), mesh.vertex_count(), mesh.index_count());
                self.scene.insert(mesh)
            }
            Node::Group { children } => {
                let group = self.scene.insert(CompositeGroup::new());
                self.children(group, children)?;
                group
            }
            Node::Switch { children, animated } => {
                let group = self.scene.insert(SwitchGroup::new());
                self.children(group, children)?;
                self.animate(group, *animated)?;
                group
            }
            Node::Crossfade { children, fade_step, animated } => {
                let group = self.scene.insert(crossfade(*fade_step));
                self.children(group, children)?;
                self.animate(group, *animated)?;
                group
            }
            Node::Sequence { pattern, first, last, kind, fade_step, animated } => {
                let group = match fade_step {
                    Some(step) => self.scene.insert(CrossfadeSwitchGroup::with_fade_step(*step)),
                    None => self.scene.insert(SwitchGroup::new()),
                };
                for path in sequence_paths(pattern, *first, *last)? {
                    let frame = match kind {
                        SequenceKind::Points => Node::Points { path: path.into() },
                        SequenceKind::MassPoints => Node::MassPoints { path: path.into() },
                    };
                    let child = self.node(&frame)?;
                    self.scene.add_child(group, child)?;
                }
                self.animate(group, *animated)?;
                group
            }
        };
        Ok(id)
    }

    fn children(&mut self, group: NodeId, children: &[Node]) -> Result<()> {
        for child in children {
            let id = self.node(child)?;
            self.scene.add_child(group, id)?;
        }
        Ok(())
    }

    fn animate(&mut self, group: NodeId, animated: bool) -> Result<()> {
        if animated {
            self.scene.mark_animated(group)?;
        }
        Ok(())
    }
}

fn crossfade(fade_step: Option<f32>) -> CrossfadeSwitchGroup {
    fade_step.map_or_else(CrossfadeSwitchGroup::new, CrossfadeSwitchGroup::with_fade_step)
}

fn vertex_field(entry: &FieldEntry) -> Result<VertexField> {
    let ty: GlslType = entry
        .ty
        .parse()
        .with_context(|| format!("field `{}`", entry.name))?;
    let field = VertexField::new(entry.name.clone(), ty);
    Ok(if entry.normalize { field.normalized() } else { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_engine::device::HostAllocator;
    use parallax_engine::scene::{DEFAULT_FADE_STEP, Drawable, MassRecord};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("parallax-viewer-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_points(dir: &Path, name: &str, count: usize) {
        let records: Vec<MassRecord> = (0..count)
            .map(|i| MassRecord { position: [i as f32, 0.0, 0.0], mass: 1.0 })
            .collect();
        std::fs::write(dir.join(name), bytemuck::cast_slice::<MassRecord, u8>(&records)).unwrap();
    }

    fn build(dir: &Path, json: &str) -> Result<BuiltScene> {
        let path = dir.join("scene.json");
        std::fs::write(&path, json).unwrap();
        SceneSource::from_arg(Some(path.as_path()))?.build(&HostAllocator::new())
    }

    // ── nodes ─────────────────────────────────────────────────────────────

    #[test]
    fn group_of_point_clouds() {
        let dir = temp_dir("group");
        write_points(&dir, "a.bin", 4);
        write_points(&dir, "b.bin", 2);

        let built = build(
            &dir,
            r#"{ "root": { "type": "group", "children": [
                { "type": "points", "path": "a.bin" },
                { "type": "points", "path": "b.bin" }
            ] } }"#,
        )
        .unwrap();

        assert_eq!(built.scene.len(), 3);
        let Some(Drawable::Composite(group)) = built.scene.get(built.root) else {
            panic!("root is not a composite group");
        };
        let counts: Vec<u32> = group
            .children()
            .iter()
            .map(|&id| match built.scene.get(id) {
                Some(Drawable::Points(p)) => p.count(),
                other => panic!("unexpected child {other:?}"),
            })
            .collect();
        assert_eq!(counts, [4, 2]);
        assert_eq!(built.shaders.len(), 2);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn sequence_becomes_animated_crossfade() {
        let dir = temp_dir("sequence");
        for i in 1..=3 {
            write_points(&dir, &format!("f{i}.bin"), 5);
        }

        let built = build(
            &dir,
            r#"{ "root": { "type": "sequence", "pattern": "f{}.bin", "first": 1, "last": 3, "fade_step": 0.5 } }"#,
        )
        .unwrap();

        match built.scene.get(built.root) {
            Some(Drawable::Crossfade(g)) => {
                assert_eq!(g.fade_step(), 0.5);
                assert_eq!(g.switch.len(), 3);
            }
            other => panic!("unexpected root {other:?}"),
        }
        assert_eq!(built.scene.animated(), [built.root]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn crossfade_without_step_uses_default() {
        assert_eq!(crossfade(None).fade_step(), DEFAULT_FADE_STEP);
        assert_eq!(crossfade(Some(0.2)).fade_step(), 0.2);
    }

    #[test]
    fn mesh_loads_relative_to_manifest() {
        let dir = temp_dir("mesh");
        std::fs::write(dir.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let built = build(&dir, r#"{ "root": { "type": "mesh", "path": "tri.obj", "position_scale": 2.0 } }"#)
            .unwrap();
        match built.scene.get(built.root) {
            Some(Drawable::Mesh(m)) => assert_eq!(m.index_count(), 3),
            other => panic!("unexpected root {other:?}"),
        }
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn typed_fields_map_to_layout() {
        let dir = temp_dir("typed");
        // Two records of { vec3 position, float mass }.
        let floats: [f32; 8] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0];
        std::fs::write(dir.join("t.bin"), bytemuck::cast_slice::<f32, u8>(&floats)).unwrap();

        let built = build(
            &dir,
            r#"{ "root": { "type": "typed_points", "path": "t.bin", "fields": [
                { "name": "vertexPosition", "type": "vec3" },
                { "name": "mass", "type": "float" }
            ] } }"#,
        )
        .unwrap();
        match built.scene.get(built.root) {
            Some(Drawable::TypedPoints(p)) => {
                assert_eq!(p.stride(), 16);
                assert_eq!(p.count(), 2);
            }
            other => panic!("unexpected root {other:?}"),
        }
        std::fs::remove_dir_all(dir).ok();
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn missing_data_file_names_the_path() {
        let dir = temp_dir("missing");
        let err = build(&dir, r#"{ "root": { "type": "points", "path": "nope.bin" } }"#).unwrap_err();
        assert!(format!("{err:#}").contains("nope.bin"));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn unknown_field_type_is_reported() {
        let entry = FieldEntry { name: "weird".into(), ty: "quaternion".into(), normalize: false };
        let err = vertex_field(&entry).unwrap_err();
        assert!(format!("{err:#}").contains("weird"));
    }

    #[test]
    fn missing_manifest_fails_early() {
        let dir = temp_dir("no-manifest");
        assert!(SceneSource::from_arg(Some(dir.join("absent.json").as_path())).is_err());
        std::fs::remove_dir_all(dir).ok();
    }

    // ── settings ──────────────────────────────────────────────────────────

    #[test]
    fn mono_flag_wins_over_manifest() {
        let source = SceneSource::Demo;
        assert_eq!(source.stereo_config(false).mode, StereoMode::SideBySide);
        assert_eq!(source.stereo_config(true).mode, StereoMode::Mono);
    }
}
