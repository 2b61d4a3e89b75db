//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two operations the pipeline needs:
//! identify and resize. The production implementation is
//! [`RasterBackend`](super::encoder::RasterBackend); tests use a recording
//! mock so pipeline logic can be exercised without touching image data.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Image source not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Parameters for a single resize-and-encode operation.
#[derive(Debug, Clone)]
pub struct ResizeJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// Trait for image processing backends.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, ImageError>;

    /// Resize the source and encode it to the output path, with the output
    /// format inferred from the output extension.
    fn resize(&self, job: &ResizeJob) -> Result<(), ImageError>;
}

impl<B: ImageBackend + ?Sized> ImageBackend for std::sync::Arc<B> {
    fn identify(&self, path: &Path) -> Result<Dimensions, ImageError> {
        (**self).identify(path)
    }

    fn resize(&self, job: &ResizeJob) -> Result<(), ImageError> {
        (**self).resize(job)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_result: Mutex<Option<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            output: String,
            width: u32,
            height: u32,
        },
    }

    impl MockBackend {
        pub fn with_dimensions(dims: Dimensions) -> Self {
            Self {
                identify_result: Mutex::new(Some(dims)),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, ImageError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_result
                .lock()
                .unwrap()
                .ok_or_else(|| ImageError::SourceNotFound(path.to_path_buf()))
        }

        fn resize(&self, job: &ResizeJob) -> Result<(), ImageError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                output: job.output.to_string_lossy().to_string(),
                width: job.width,
                height: job.height,
            });
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(Dimensions {
            width: 800,
            height: 600,
        });

        let dims = backend.identify(Path::new("/test/image.jpg")).unwrap();

        assert_eq!(dims.width, 800);
        assert_eq!(dims.height, 600);
        let ops = backend.get_operations();
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::default();

        backend
            .resize(&ResizeJob {
                source: "/source.jpg".into(),
                output: "/output.avif".into(),
                width: 250,
                height: 188,
                quality: 80,
            })
            .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 250,
                height: 188,
                ..
            }
        ));
    }
}
