//! Asset byte loading.
//!
//! Every asset (binary point dumps, OBJ/MTL text, WGSL sources) enters the
//! engine as a [`ByteBuffer`]. Loading failures are recoverable [`LoadError`]s.

mod byte_buffer;

pub use byte_buffer::{ByteBuffer, LoadError};
