//! Shared domain types for CineSage.
//!
//! This crate contains the core domain types used across the CineSage
//! retrieval stack: movie records, recommendation results, match quality
//! buckets, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod config;
pub mod error;
pub mod movie;
