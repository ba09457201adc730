//! Shared infrastructure utilities for the transcript workbench.
//!
//! - **`persist`**: Crash-safe file replacement (temp + rename) for session
//!   documents, with recovery of interrupted writes

pub mod persist;

pub use persist::{PersistOptions, SyncPolicy, backup_path, persist_atomically, recover_backup};
