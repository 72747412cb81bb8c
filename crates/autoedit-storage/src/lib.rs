//! Autoedit storage
//!
//! Local directory storage for uploaded and processed artifacts. Keys are plain file
//! names; every lookup goes through [`LocalStorage::key_to_path`], which refuses keys
//! that would resolve outside the configured directory.

pub mod error;
pub mod local;

pub use error::{StorageError, StorageResult};
pub use local::LocalStorage;
