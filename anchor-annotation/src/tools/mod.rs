//! Keyword-driven search over placed anchors.
//!
//! The keyword index maps anchor ids to the labels users give them; the
//! search engine turns submitted queries into a match set and splits the
//! registry into matched and unmatched anchors for rendering.

/// Bidirectional id <-> keyword mapping.
pub mod keyword_index;

/// Query state machine and registry partitioning.
pub mod search;
