use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to read an asset from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("asset not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable owned byte blob.
///
/// Constructed from a file or by copying an existing slice; the contents never
/// change afterwards. Consumers take copies out rather than aliasing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Box<[u8]>,
}

impl ByteBuffer {
    /// Reads the whole file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => {
                log::debug!("loaded {} ({} bytes)", path.display(), bytes.len());
                Ok(Self { bytes: bytes.into_boxed_slice() })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LoadError::NotFound {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Copies `bytes` into a new buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self { bytes: bytes.into() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Duplicates the held bytes into caller-owned memory.
    pub fn copy_out(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Copies at most `max_len` bytes, clamped to the buffer length.
    pub fn copy_out_truncated(&self, max_len: usize) -> Vec<u8> {
        let n = max_len.min(self.bytes.len());
        self.bytes[..n].to_vec()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes: bytes.into_boxed_slice() }
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("parallax-{}-{name}", std::process::id()))
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn from_bytes_copies() {
        let mut src = vec![1u8, 2, 3];
        let buf = ByteBuffer::from_bytes(&src);
        src[0] = 9;
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn from_file_reads_contents() {
        let path = temp_path("read.bin");
        std::fs::write(&path, [7u8; 37]).unwrap();
        let buf = ByteBuffer::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(buf.len(), 37);
        assert!(buf.as_slice().iter().all(|&b| b == 7));
    }

    #[test]
    fn missing_file_is_recoverable() {
        let err = ByteBuffer::from_file(temp_path("does-not-exist.bin")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    // ── copy out ──────────────────────────────────────────────────────────

    #[test]
    fn copy_out_duplicates_everything() {
        let buf = ByteBuffer::from_bytes(b"parallax");
        assert_eq!(buf.copy_out(), b"parallax".to_vec());
    }

    #[test]
    fn truncated_copy_respects_max_len() {
        let buf = ByteBuffer::from_bytes(&[0, 1, 2, 3, 4]);
        assert_eq!(buf.copy_out_truncated(3), vec![0, 1, 2]);
    }

    #[test]
    fn truncated_copy_clamps_to_length() {
        let buf = ByteBuffer::from_bytes(&[0, 1, 2]);
        assert_eq!(buf.copy_out_truncated(1000).len(), 3);
        assert!(ByteBuffer::default().copy_out_truncated(4).is_empty());
    }
}
