//! Per-frame annotation pipeline.
//!
//! ```text
//! ArSession::update
//!   └─> fold finished sync work
//!       └─> place anchor for one pending tap
//!           └─> partition anchors by search matches
//!               ├─> DrawCommand per anchor
//!               ├─> LabelPlacement per projectable anchor
//!               └─> queue uploads for new local anchors
//! ```

/// Anchor model: identity, pose sources and sync hash.
pub mod anchor;

/// Frame outputs and the draw/label pass.
pub mod frame;

/// Hit filtering for tap placement.
pub mod placement;

/// World-to-screen projection and distance-based label sizing.
pub mod projection;

/// Bounded FIFO of live anchors.
pub mod registry;

/// Session state and the frame entry point.
pub mod session;
