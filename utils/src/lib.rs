//! Shared infrastructure utilities for keystack.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename) and
//!   idempotent removal, used to publish and withdraw endpoint descriptors

pub mod atomic_write;

pub use atomic_write::{
    AtomicWriteOptions, FileSyncPolicy, ParentDirSyncPolicy, atomic_write,
    atomic_write_with_options, remove_if_exists,
};
