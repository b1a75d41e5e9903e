//! Post-processing of files extracted from archives
//!
//! Every image and asset passes through an [`ImageProcessor`] before it is
//! written to storage. Processing is synchronous and runs inline.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Cannot process {name}: {message}")]
    Failed { name: String, message: String },
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Transforms file content before it is stored, e.g. recompressing images
pub trait ImageProcessor: Send + Sync {
    fn process(&self, name: &str, data: Bytes) -> ProcessingResult<Bytes>;
}

/// Stores content unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughProcessor;

impl ImageProcessor for PassthroughProcessor {
    fn process(&self, name: &str, data: Bytes) -> ProcessingResult<Bytes> {
        debug!(name, size = data.len(), "Storing file unprocessed");
        Ok(data)
    }
}

/// Check whether a file is an image by its name
pub fn is_image(name: &str) -> bool {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false)
}
