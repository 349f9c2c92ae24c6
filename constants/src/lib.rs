//! Shared tuning values for the annotation engine.
//!
//! Kept in their own crate so hosts and tests can reference the defaults
//! without pulling in the engine.

pub mod annotation;
pub mod render_settings;
pub mod sync;
