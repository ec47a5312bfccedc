use memmap2::Mmap;
use std::ops::Deref;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::error::SourceError;

/// Configuration for source loading behavior
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Map the file into memory instead of reading it through a buffer
    pub use_mmap: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            use_mmap: false,
            buffer_size: 8192,
        }
    }
}

/// Statistics for one source load
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub bytes_read: u64,
    pub duration_ms: u64,
    pub mapped: bool,
}

/// Raw bytes of a source, owned or memory-mapped
pub enum SourceBytes {
    Buffered(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for SourceBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            SourceBytes::Buffered(bytes) => bytes,
            SourceBytes::Mapped(map) => map,
        }
    }
}

/// Loads whole sources into memory before any processing starts
pub struct AsyncFileReader {
    config: ReaderConfig,
}

impl AsyncFileReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read the complete contents of `file_path`
    pub async fn read_bytes<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<(SourceBytes, ReadStats), SourceError> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting read of source: {}", path.display());

        let bytes = if self.config.use_mmap {
            let file = std::fs::File::open(path)?;
            // SAFETY: the map is read-only and dropped before the run writes any output
            let map = unsafe { Mmap::map(&file)? };
            SourceBytes::Mapped(map)
        } else {
            let file = File::open(path).await?;
            let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
            let mut buffer = Vec::new();
            reader.read_to_end(&mut buffer).await?;
            SourceBytes::Buffered(buffer)
        };

        let stats = ReadStats {
            file_path: path.display().to_string(),
            bytes_read: bytes.len() as u64,
            duration_ms: start_time.elapsed().as_millis() as u64,
            mapped: self.config.use_mmap,
        };

        info!(
            "Read {}: {} bytes in {}ms{}",
            path.display(),
            stats.bytes_read,
            stats.duration_ms,
            if stats.mapped { " (mmap)" } else { "" }
        );

        Ok((bytes, stats))
    }
}

/// Convenience function for reading a single source with default configuration
pub async fn read_file_async<P: AsRef<Path>>(file_path: P) -> Result<Vec<u8>, SourceError> {
    let reader = AsyncFileReader::new(ReaderConfig::default());
    let (bytes, _stats) = reader.read_bytes(file_path).await?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    async fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let file_path = dir.join(name);
        fs::write(&file_path, content).await.unwrap();
        file_path
    }

    #[tokio::test]
    async fn test_read_buffered() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());

        let file_path = create_test_file(temp_dir.path(), "lines.txt", b"Line 1\nLine 2").await;
        let (bytes, stats) = reader.read_bytes(&file_path).await.unwrap();

        assert_eq!(&*bytes, b"Line 1\nLine 2");
        assert_eq!(stats.bytes_read, 13);
        assert!(!stats.mapped);
    }

    #[tokio::test]
    async fn test_read_mapped() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig { use_mmap: true, ..Default::default() });

        let file_path = create_test_file(temp_dir.path(), "mapped.txt", b"mapped content").await;
        let (bytes, stats) = reader.read_bytes(&file_path).await.unwrap();

        assert_eq!(&*bytes, b"mapped content");
        assert!(stats.mapped);
    }

    #[tokio::test]
    async fn test_read_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_test_file(temp_dir.path(), "empty.txt", b"").await;

        let bytes = read_file_async(&file_path).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_read_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());

        let result = reader.read_bytes(temp_dir.path().join("nonexistent.docx")).await;
        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    #[tokio::test]
    async fn test_custom_buffer_size() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig { use_mmap: false, buffer_size: 16 });

        let content = "x".repeat(2048);
        let file_path = create_test_file(temp_dir.path(), "large.txt", content.as_bytes()).await;
        let (bytes, _) = reader.read_bytes(&file_path).await.unwrap();

        assert_eq!(bytes.len(), 2048);
    }
}
