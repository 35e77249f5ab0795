//! Parallax engine crate.
//!
//! Stereo scene-graph rendering on wgpu: byte assets, WGSL shader programs
//! with name-based uniform and attribute lookup, point-cloud and mesh
//! drawables, switch/crossfade groups, a per-eye draw recorder, and the
//! window + GPU runtime that presents the result.

pub mod asset;
pub mod device;
pub mod shader;
pub mod scene;
pub mod tracking;
pub mod render;

pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
