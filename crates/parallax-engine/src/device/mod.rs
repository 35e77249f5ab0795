//! GPU device, surface and buffer management.
//!
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - static vertex/index buffers, on the device or in host memory

mod buffer;
mod error;
mod gpu;
mod init;
mod surface;

pub use buffer::{BufferAllocator, BufferUsage, GpuBuffer, HostAllocator};
pub use error::{GpuError, SurfaceErrorAction};
pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
