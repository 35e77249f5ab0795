//! Built-in scene shown when no manifest is given: a wobbling ring of points,
//! one cloud per animation frame, crossfaded.

use std::f32::consts::TAU;

use anyhow::Result;

use parallax_engine::asset::ByteBuffer;
use parallax_engine::device::BufferAllocator;
use parallax_engine::scene::{CrossfadeSwitchGroup, FixedLayoutPointCloud, MassRecord, Scene};

use crate::builder::{BuiltScene, builtin_shaders};

pub const FRAMES: usize = 24;
pub const POINTS_PER_FRAME: usize = 4096;
const RADIUS: f32 = 0.3;
const FADE_STEP: f32 = 0.2;

/// Points of frame `frame`, spread around a ring in the XZ plane whose
/// height ripples as the frame advances.
pub fn ring_frame(frame: usize) -> Vec<MassRecord> {
    let phase = frame as f32 / FRAMES as f32 * TAU;
    (0..POINTS_PER_FRAME)
        .map(|i| {
            let angle = i as f32 / POINTS_PER_FRAME as f32 * TAU;
            // Thicken the ring with a small deterministic offset per point.
            let spread = ((i * 7919) % 101) as f32 / 100.0 - 0.5;
            let r = RADIUS * (1.0 + 0.15 * spread);
            let y = 0.05 * (3.0 * angle + phase).sin();
            MassRecord { position: [r * angle.cos(), y, r * angle.sin()], mass: 1.0 }
        })
        .collect()
}

pub fn build(alloc: &dyn BufferAllocator) -> Result<BuiltScene> {
    let mut scene = Scene::new();
    let root = scene.insert(CrossfadeSwitchGroup::with_fade_step(FADE_STEP));
    for frame in 0..FRAMES {
        let bytes = ByteBuffer::from_bytes(bytemuck::cast_slice(&ring_frame(frame)));
        let cloud = scene.insert(FixedLayoutPointCloud::positions(alloc, &bytes)?);
        scene.add_child(root, cloud)?;
    }
    scene.mark_animated(root)?;

    Ok(BuiltScene { scene, root, shaders: builtin_shaders()? })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_engine::device::HostAllocator;
    use parallax_engine::scene::Drawable;

    #[test]
    fn ring_points_stay_near_radius() {
        for record in ring_frame(5) {
            let [x, y, z] = record.position;
            let r = (x * x + z * z).sqrt();
            assert!((r - RADIUS).abs() <= RADIUS * 0.08, "radius {r}");
            assert!(y.abs() <= 0.05 + f32::EPSILON);
        }
    }

    #[test]
    fn frames_differ() {
        assert_ne!(ring_frame(0), ring_frame(1));
    }

    #[test]
    fn demo_is_an_animated_crossfade() {
        let built = build(&HostAllocator::new()).unwrap();
        assert_eq!(built.scene.len(), FRAMES + 1);
        assert_eq!(built.scene.animated(), [built.root]);
        match built.scene.get(built.root) {
            Some(Drawable::Crossfade(g)) => assert_eq!(g.switch.len(), FRAMES),
            other => panic!("unexpected root {other:?}"),
        }
        assert_eq!(built.shaders.len(), 2);
    }
}
