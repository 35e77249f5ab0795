//! Scene graph of drawable nodes.
//!
//! Responsibilities:
//! - own every drawable and the GPU buffers behind it (arena + [`NodeId`] handles)
//! - describe runtime vertex layouts and map them to wgpu formats
//! - record draws into per-eye [`DrawList`]s, each with a uniform snapshot
//!
//! Nothing here talks to the GPU queue; the render module replays the lists.

mod frame;
mod group;
mod layout;
mod list;
mod mesh;
mod point_cloud;
mod typed_point_cloud;

pub use frame::FrameContext;
pub use group::{CompositeGroup, CrossfadeSwitchGroup, SwitchGroup, DEFAULT_FADE_STEP};
pub use layout::{
    field_attributes, record_layout, vertex_format, BaseType, GlslType, UnknownType, VertexField,
    VertexLayout,
};
pub use list::{DrawCall, DrawItem, DrawList, IndexRange, Topology};
pub use mesh::{load_obj_file, MeshData, MeshError, MeshVertex, MeshWithNormals};
pub use point_cloud::{
    read_records, FixedLayoutPointCloud, MassRecord, PositionVertex, TypedMassRecord,
    VelocityVertex,
};
pub use typed_point_cloud::TypedPointCloud;

use thiserror::Error;

use crate::shader::{names, ShaderProgram};

/// Handle to a node of a [`Scene`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone)]
pub enum Drawable {
    Points(FixedLayoutPointCloud),
    TypedPoints(TypedPointCloud),
    Mesh(MeshWithNormals),
    Composite(CompositeGroup),
    Switch(SwitchGroup),
    Crossfade(CrossfadeSwitchGroup),
}

macro_rules! impl_from_drawable {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for Drawable {
            fn from(v: $t) -> Self { Drawable::$variant(v) }
        })*
    };
}

impl_from_drawable! {
    FixedLayoutPointCloud => Points,
    TypedPointCloud => TypedPoints,
    MeshWithNormals => Mesh,
    CompositeGroup => Composite,
    SwitchGroup => Switch,
    CrossfadeSwitchGroup => Crossfade,
}

impl Drawable {
    fn children(&self) -> &[NodeId] {
        match self {
            Drawable::Composite(g) => g.children(),
            Drawable::Switch(g) => g.children(),
            Drawable::Crossfade(g) => g.switch.children(),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeId),

    #[error("scene node {0:?} is not a group")]
    NotAGroup(NodeId),

    #[error("scene node {0:?} is not a switch group")]
    NotASwitchGroup(NodeId),

    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Arena owning every node. Dropping the scene releases all node buffers
/// not still referenced by a recorded draw list.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Drawable>,
    animated: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: impl Into<Drawable>) -> NodeId {
        self.nodes.push(node.into());
        NodeId(self.nodes.len() - 1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Drawable> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Drawable> {
        self.nodes.get_mut(id.0)
    }

    /// Appends `child` to the group `parent`. A node may belong to several
    /// groups, but never to its own subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if self.get(child).is_none() {
            return Err(SceneError::UnknownNode(child));
        }
        if parent == child || self.reaches(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }
        match self.get_mut(parent).ok_or(SceneError::UnknownNode(parent))? {
            Drawable::Composite(g) => g.add(child),
            Drawable::Switch(g) => g.add(child),
            Drawable::Crossfade(g) => g.switch.add(child),
            _ => return Err(SceneError::NotAGroup(parent)),
        }
        Ok(())
    }

    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            stack.extend_from_slice(self.nodes[id.0].children());
        }
        false
    }

    /// The switch state of a switch or crossfade group.
    pub fn switch_group_mut(&mut self, id: NodeId) -> Result<&mut SwitchGroup, SceneError> {
        match self.get_mut(id).ok_or(SceneError::UnknownNode(id))? {
            Drawable::Switch(g) => Ok(g),
            Drawable::Crossfade(g) => Ok(&mut g.switch),
            _ => Err(SceneError::NotASwitchGroup(id)),
        }
    }

    /// Registers a switch group to advance on every animation wrap.
    pub fn mark_animated(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.switch_group_mut(id)?;
        if !self.animated.contains(&id) {
            self.animated.push(id);
        }
        Ok(())
    }

    #[inline]
    pub fn animated(&self) -> &[NodeId] {
        &self.animated
    }

    /// Advances every animated switch group by one child.
    pub fn advance_animations(&mut self) {
        for i in 0..self.animated.len() {
            let id = self.animated[i];
            if let Ok(g) = self.switch_group_mut(id) {
                g.advance();
            }
        }
    }

    /// Binds runtime-layout nodes to the inputs of `shader`.
    pub fn resolve_shader_locations(&mut self, shader: &ShaderProgram) {
        for node in &mut self.nodes {
            if let Drawable::TypedPoints(cloud) = node {
                cloud.resolve_shader_locations(shader);
            }
        }
    }

    /// Records the subtree rooted at `id`. `shader` must be bound.
    pub fn render(
        &self,
        id: NodeId,
        frame: &FrameContext,
        shader: &mut ShaderProgram,
        list: &mut DrawList,
    ) {
        let Some(node) = self.get(id) else {
            log::warn!("render of unknown scene node {id:?}");
            return;
        };

        match node {
            Drawable::Points(p) => p.render(frame, shader, list),
            Drawable::TypedPoints(p) => p.render(frame, shader, list),
            Drawable::Mesh(m) => m.render(frame, shader, list),
            Drawable::Composite(g) => {
                for &child in g.children() {
                    self.render(child, frame, shader, list);
                }
            }
            Drawable::Switch(g) => {
                if let Some(child) = g.current() {
                    self.render(child, frame, shader, list);
                }
            }
            Drawable::Crossfade(g) => {
                let opacity = shader.lookup_uniform(names::OPACITY);
                for (child, alpha) in g.fade_trail() {
                    shader.set_uniform(opacity, alpha);
                    self.render(child, frame, shader, list);
                }
                shader.set_uniform(opacity, 1.0f32);
            }
        }
    }
}
