//! JSON scene manifest.
//!
//! ```json
//! {
//!   "shaders": [{ "label": "points", "vertex": "points.wgsl" }],
//!   "stereo": { "ipd": 0.05 },
//!   "animation_rate": 3.0,
//!   "clear_color": [0.0, 0.0, 0.05, 1.0],
//!   "root": {
//!     "type": "crossfade",
//!     "fade_step": 0.1,
//!     "animated": true,
//!     "children": [{ "type": "points", "path": "frame0.bin" }]
//!   }
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the manifest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use parallax_engine::render::{RendererConfig, StereoConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Empty selects the built-in programs.
    #[serde(default)]
    pub shaders: Vec<ShaderEntry>,
    #[serde(default)]
    pub stereo: StereoOverrides,
    pub animation_rate: Option<f32>,
    /// RGBA, as written to the clear load op.
    pub clear_color: Option<[f64; 4]>,
    pub root: Node,
}

/// One program built from WGSL files.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaderEntry {
    pub label: String,
    pub vertex: PathBuf,
    /// Defaults to `vertex` (one module with both entry points).
    pub fragment: Option<PathBuf>,
}

impl ShaderEntry {
    pub fn fragment_path(&self) -> &Path {
        self.fragment.as_deref().unwrap_or(&self.vertex)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StereoOverrides {
    pub ipd: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
    pub world_scale: Option<f32>,
    pub stereo_level: Option<f32>,
    pub fov_y_degrees: Option<f32>,
}

impl StereoOverrides {
    pub fn apply(&self, mut config: StereoConfig) -> StereoConfig {
        if let Some(v) = self.ipd {
            config.ipd = v;
        }
        if let Some(v) = self.near {
            config.near = v;
        }
        if let Some(v) = self.far {
            config.far = v;
        }
        if let Some(v) = self.world_scale {
            config.world_scale = v;
        }
        if let Some(v) = self.stereo_level {
            config.stereo_level = v;
        }
        if let Some(v) = self.fov_y_degrees {
            config.fov_y = v.to_radians();
        }
        config
    }
}

/// Scene node, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// `{x, y, z, mass}` records, positions only.
    Points { path: PathBuf },
    /// `{x, y, z, mass, type}` records.
    MassPoints { path: PathBuf },
    VelocityPoints { previous: PathBuf, current: PathBuf, next: PathBuf },
    TypedPoints { path: PathBuf, fields: Vec<FieldEntry> },
    Mesh {
        path: PathBuf,
        #[serde(default = "unit_scale")]
        position_scale: f32,
    },
    Group { children: Vec<Node> },
    Switch {
        children: Vec<Node>,
        #[serde(default)]
        animated: bool,
    },
    Crossfade {
        children: Vec<Node>,
        fade_step: Option<f32>,
        #[serde(default)]
        animated: bool,
    },
    /// Numbered files, one point cloud per frame.
    Sequence {
        pattern: String,
        first: u32,
        last: u32,
        #[serde(default)]
        kind: SequenceKind,
        /// Crossfade between frames; a plain switch when absent.
        fade_step: Option<f32>,
        #[serde(default = "yes")]
        animated: bool,
    },
}

fn unit_scale() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    #[default]
    Points,
    MassPoints,
}

/// One field of a `typed_points` record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldEntry {
    pub name: String,
    /// GLSL type keyword, e.g. `vec3` or `uint`.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub normalize: bool,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid manifest {}", path.display()))
    }

    pub fn renderer_config(&self) -> RendererConfig {
        let mut config = RendererConfig::default();
        if let Some(rate) = self.animation_rate {
            config.animation_rate = rate;
        }
        if let Some([r, g, b, a]) = self.clear_color {
            config.clear_color = wgpu::Color { r, g, b, a };
        }
        config
    }
}

/// Expands `pattern` once per frame number in `first..=last`, replacing `{}`.
pub fn sequence_paths(pattern: &str, first: u32, last: u32) -> Result<Vec<String>> {
    if !pattern.contains("{}") {
        bail!("sequence pattern `{pattern}` has no `{{}}` placeholder");
    }
    if first > last {
        bail!("sequence `{pattern}`: first frame {first} is after last frame {last}");
    }
    Ok((first..=last).map(|i| pattern.replace("{}", &i.to_string())).collect())
}

/// `path` itself when absolute, otherwise joined onto `base`.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn minimal_manifest_uses_defaults() {
        let m = Manifest::from_json(r#"{ "root": { "type": "points", "path": "a.bin" } }"#).unwrap();
        assert!(m.shaders.is_empty());
        assert_eq!(m.stereo, StereoOverrides::default());
        assert_eq!(m.root, Node::Points { path: "a.bin".into() });
        assert_eq!(m.renderer_config(), RendererConfig::default());
    }

    #[test]
    fn nested_tree_parses() {
        let m = Manifest::from_json(
            r#"{
                "root": {
                    "type": "group",
                    "children": [
                        { "type": "mesh", "path": "bunny.obj" },
                        { "type": "crossfade", "fade_step": 0.25, "children": [
                            { "type": "mass_points", "path": "m.bin" },
                            { "type": "velocity_points", "previous": "0.bin", "current": "1.bin", "next": "2.bin" }
                        ] },
                        { "type": "typed_points", "path": "t.bin", "fields": [
                            { "name": "vertexPosition", "type": "vec3" },
                            { "name": "vertexColor", "type": "uvec4", "normalize": true }
                        ] }
                    ]
                }
            }"#,
        )
        .unwrap();

        let Node::Group { children } = &m.root else { panic!("expected a group root") };
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], Node::Mesh { path: "bunny.obj".into(), position_scale: 1.0 });
        match &children[1] {
            Node::Crossfade { children, fade_step, animated } => {
                assert_eq!(children.len(), 2);
                assert_eq!(*fade_step, Some(0.25));
                assert!(!animated);
            }
            other => panic!("unexpected node {other:?}"),
        }
        match &children[2] {
            Node::TypedPoints { fields, .. } => {
                assert_eq!(fields[1].ty, "uvec4");
                assert!(fields[1].normalize);
                assert!(!fields[0].normalize);
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn sequence_defaults_to_animated_points() {
        let m = Manifest::from_json(
            r#"{ "root": { "type": "sequence", "pattern": "f{}.bin", "first": 1, "last": 3 } }"#,
        )
        .unwrap();
        assert_eq!(
            m.root,
            Node::Sequence {
                pattern: "f{}.bin".into(),
                first: 1,
                last: 3,
                kind: SequenceKind::Points,
                fade_step: None,
                animated: true,
            }
        );
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let err = Manifest::from_json(r#"{ "root": { "type": "teapot" } }"#).unwrap_err();
        assert!(format!("{err:#}").contains("teapot"));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        assert!(Manifest::from_json(r#"{ "root": { "type": "group", "children": [] }, "extra": 1 }"#).is_err());
    }

    // ── settings ──────────────────────────────────────────────────────────

    #[test]
    fn renderer_settings_override_defaults() {
        let m = Manifest::from_json(
            r#"{ "animation_rate": 2.0, "clear_color": [0.1, 0.2, 0.3, 1.0],
                 "root": { "type": "group", "children": [] } }"#,
        )
        .unwrap();
        let c = m.renderer_config();
        assert_eq!(c.animation_rate, 2.0);
        assert_eq!(c.clear_color, wgpu::Color { r: 0.1, g: 0.2, b: 0.3, a: 1.0 });
    }

    #[test]
    fn stereo_overrides_touch_only_given_fields() {
        let o = StereoOverrides { ipd: Some(0.06), fov_y_degrees: Some(90.0), ..Default::default() };
        let base = StereoConfig::default();
        let c = o.apply(base);
        assert_eq!(c.ipd, 0.06);
        assert!((c.fov_y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(c.near, base.near);
        assert_eq!(c.world_scale, base.world_scale);
    }

    #[test]
    fn fragment_defaults_to_vertex_file() {
        let e = ShaderEntry { label: "x".into(), vertex: "a.wgsl".into(), fragment: None };
        assert_eq!(e.fragment_path(), Path::new("a.wgsl"));
    }

    // ── paths ─────────────────────────────────────────────────────────────

    #[rstest]
    #[case("f{}.bin", 0, 2, &["f0.bin", "f1.bin", "f2.bin"])]
    #[case("run/{}/p{}.dat", 7, 7, &["run/7/p7.dat"])]
    fn sequence_expansion(
        #[case] pattern: &str,
        #[case] first: u32,
        #[case] last: u32,
        #[case] expected: &[&str],
    ) {
        assert_eq!(sequence_paths(pattern, first, last).unwrap(), expected);
    }

    #[test]
    fn sequence_rejects_bad_input() {
        assert!(sequence_paths("frame.bin", 0, 3).is_err());
        assert!(sequence_paths("f{}.bin", 4, 3).is_err());
    }

    #[test]
    fn relative_paths_join_the_base() {
        let base = Path::new("/data/scenes");
        assert_eq!(resolve(base, Path::new("a.bin")), PathBuf::from("/data/scenes/a.bin"));
        assert_eq!(resolve(base, Path::new("/abs/b.bin")), PathBuf::from("/abs/b.bin"));
    }
}
