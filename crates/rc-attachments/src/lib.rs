//! # rc-attachments
//!
//! File storage for uploaded images and assets.
//!
//! ## Features
//!
//! - Storage abstraction (local filesystem, in-memory)
//! - Post-processing hook for extracted images
//! - Stored-file handles for cleanup after failed imports
//!
//! ## Example
//!
//! ```rust,ignore
//! use rc_attachments::{generate_key, MemoryStorage, Storage};
//!
//! let storage = MemoryStorage::new();
//! let key = generate_key("uploadedimages", "screenshot.png");
//! let metadata = storage.put(&key, bytes::Bytes::from(file_data)).await?;
//! ```

pub mod processing;
pub mod storage;

pub use processing::{is_image, ImageProcessor, PassthroughProcessor, ProcessingError, ProcessingResult};
pub use storage::{
    delete_stored_files, generate_key, FileMetadata, LocalStorage, MemoryStorage, Storage,
    StorageError, StorageResult, StoredFile,
};
