//! Persisted embedding bundle: format, file-backed store, and writer.
//!
//! The bundle is the single serialized unit produced by the offline
//! preparation stage: movie metadata, the (optionally quantized)
//! embedding matrix, and the optional reduction transform, under a
//! magic-plus-version header so incompatible files are rejected cleanly.

pub mod format;
pub mod store;
pub mod writer;

pub use format::{BUNDLE_MAGIC, BUNDLE_VERSION, BundleFile, StoredMatrix};
pub use store::FileBundleStore;
pub use writer::write_bundle;
