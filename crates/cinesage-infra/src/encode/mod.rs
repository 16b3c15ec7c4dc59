//! Text encoder backends.
//!
//! `local` wraps fastembed's ONNX MiniLM model; `remote` calls an
//! external batch embedding service with warm-up retry. Both implement
//! the `TextEncoder` trait from `cinesage-core`.

pub mod local;
pub mod remote;

pub use local::FastEmbedEncoder;
pub use remote::RemoteEncoder;
