//! The gzip compression boundary.
//!
//! The encoders never compress anything themselves; tar.gz and gz builds hand
//! a complete byte stream to a [`Compressor`] and take back the gzip stream.

use async_trait::async_trait;

use crate::error::{ArchiveError, Result};

/// Something that can wrap a byte stream in gzip.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress `data`, which must be the complete input stream.
    async fn gzip(&self, data: Vec<u8>) -> Result<Vec<u8>>;
}

/// Native gzip backed by `flate2`, run on the blocking thread pool.
#[cfg(feature = "gzip")]
#[derive(Debug, Clone, Copy)]
pub struct FlateGzip {
    level: u32,
}

#[cfg(feature = "gzip")]
impl FlateGzip {
    /// Compression level 0 (none) to 9 (best); higher values are capped.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

#[cfg(feature = "gzip")]
impl Default for FlateGzip {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(feature = "gzip")]
#[async_trait]
impl Compressor for FlateGzip {
    async fn gzip(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let level = Compression::new(self.level);
        let input_len = data.len();

        let compressed = tokio::task::spawn_blocking(move || {
            let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 64), level);
            encoder.write_all(&data)?;
            encoder.finish()
        })
        .await
        .map_err(|e| ArchiveError::Codec(std::io::Error::other(e)))?
        .map_err(ArchiveError::Codec)?;

        tracing::debug!(input_len, output_len = compressed.len(), "gzip");
        Ok(compressed)
    }
}

/// Stand-in for hosts without a gzip codec; every call fails with
/// [`ArchiveError::CodecUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCodec;

#[async_trait]
impl Compressor for NoCodec {
    async fn gzip(&self, _data: Vec<u8>) -> Result<Vec<u8>> {
        Err(ArchiveError::CodecUnavailable)
    }
}

/// The best compressor this build offers.
pub fn default_compressor() -> Box<dyn Compressor> {
    #[cfg(feature = "gzip")]
    {
        Box::new(FlateGzip::default())
    }

    #[cfg(not(feature = "gzip"))]
    {
        Box::new(NoCodec)
    }
}
