use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::GpuError;

/// What a static buffer will be bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

impl BufferUsage {
    fn to_wgpu(self) -> wgpu::BufferUsages {
        match self {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        }
    }
}

/// A write-once buffer owned by a drawable.
///
/// Storage is released when the last handle is dropped. Drawables hold these
/// behind `Arc` so recorded draw lists can keep a buffer alive until the frame
/// that references it has been submitted.
#[derive(Debug)]
pub enum GpuBuffer {
    /// Device memory created through wgpu.
    Device { buffer: wgpu::Buffer, size: u64 },
    /// Host copy used when rendering headless.
    Host(Box<[u8]>),
}

impl GpuBuffer {
    /// Size of the uploaded contents in bytes.
    pub fn size(&self) -> u64 {
        match self {
            GpuBuffer::Device { size, .. } => *size,
            GpuBuffer::Host(bytes) => bytes.len() as u64,
        }
    }

    pub fn device_buffer(&self) -> Option<&wgpu::Buffer> {
        match self {
            GpuBuffer::Device { buffer, .. } => Some(buffer),
            GpuBuffer::Host(_) => None,
        }
    }

    /// The uploaded bytes, when the buffer lives in host memory.
    pub fn host_bytes(&self) -> Option<&[u8]> {
        match self {
            GpuBuffer::Device { .. } => None,
            GpuBuffer::Host(bytes) => Some(bytes),
        }
    }
}

/// Creates static (upload-once) buffers.
pub trait BufferAllocator {
    fn create_static_buffer(
        &self,
        label: &str,
        contents: &[u8],
        usage: BufferUsage,
    ) -> Result<Arc<GpuBuffer>, GpuError>;
}

impl BufferAllocator for wgpu::Device {
    fn create_static_buffer(
        &self,
        label: &str,
        contents: &[u8],
        usage: BufferUsage,
    ) -> Result<Arc<GpuBuffer>, GpuError> {
        let size = contents.len() as u64;
        let max = self.limits().max_buffer_size;
        if size > max {
            return Err(GpuError::BufferTooLarge { label: label.to_string(), size, max });
        }

        let buffer = self.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: usage.to_wgpu(),
        });
        log::debug!("created {usage:?} buffer `{label}` ({size} bytes)");

        Ok(Arc::new(GpuBuffer::Device { buffer, size }))
    }
}

/// Allocator that keeps buffer contents in host memory.
///
/// Used for headless runs and tests; the recorded bytes can be inspected via
/// [`GpuBuffer::host_bytes`].
#[derive(Debug, Copy, Clone)]
pub struct HostAllocator {
    max_buffer_size: u64,
}

impl HostAllocator {
    pub fn new() -> Self {
        Self { max_buffer_size: u64::MAX }
    }

    /// Rejects buffers larger than `max_buffer_size`, mirroring a device limit.
    pub fn with_limit(max_buffer_size: u64) -> Self {
        Self { max_buffer_size }
    }
}

impl Default for HostAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferAllocator for HostAllocator {
    fn create_static_buffer(
        &self,
        label: &str,
        contents: &[u8],
        _usage: BufferUsage,
    ) -> Result<Arc<GpuBuffer>, GpuError> {
        let size = contents.len() as u64;
        if size > self.max_buffer_size {
            return Err(GpuError::BufferTooLarge {
                label: label.to_string(),
                size,
                max: self.max_buffer_size,
            });
        }
        Ok(Arc::new(GpuBuffer::Host(contents.into())))
    }
}
