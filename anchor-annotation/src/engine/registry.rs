use std::collections::VecDeque;

use bevy::log::debug;
use constants::annotation::MAX_ANCHORS;

use super::anchor::{Anchor, AnchorId};
use crate::error::{AnnotationError, Result};

/// Bounded, insertion-ordered set of anchors.
///
/// When full, appending evicts the oldest anchor and detaches its live
/// tracking before it is dropped.
#[derive(Debug)]
pub struct AnchorRegistry {
    anchors: VecDeque<Anchor>,
    capacity: usize,
}

impl Default for AnchorRegistry {
    fn default() -> Self {
        Self::new(MAX_ANCHORS)
    }
}

impl AnchorRegistry {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            anchors: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `anchor`, returning the evicted oldest anchor if the registry was full.
    pub fn append(&mut self, anchor: Anchor) -> Result<Option<Anchor>> {
        if self.contains(anchor.id()) {
            return Err(AnnotationError::DuplicateAnchor(anchor.id()));
        }

        let evicted = if self.anchors.len() >= self.capacity {
            self.anchors.pop_front().map(|mut oldest| {
                oldest.release();
                debug!("Evicted anchor {} to stay within {} anchors", oldest.id(), self.capacity);
                oldest
            })
        } else {
            None
        };

        self.anchors.push_back(anchor);
        Ok(evicted)
    }

    /// Remove the anchor with `id`, releasing its live tracking. No-op when absent.
    pub fn remove_by_identity(&mut self, id: AnchorId) -> Option<Anchor> {
        let index = self.anchors.iter().position(|anchor| anchor.id() == id)?;
        let mut removed = self.anchors.remove(index)?;
        removed.release();
        Some(removed)
    }

    /// Anchors in insertion order. Holding the iterator borrows the registry,
    /// so nothing can be added while a frame walks it.
    pub fn snapshot(&self) -> impl ExactSizeIterator<Item = &Anchor> + '_ {
        self.anchors.iter()
    }

    /// Anchor with `id`, if it is still registered.
    pub fn get(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.iter().find(|anchor| anchor.id() == id)
    }

    /// Mutable access to anchor `id`, if it is still registered.
    pub fn get_mut(&mut self, id: AnchorId) -> Option<&mut Anchor> {
        self.anchors.iter_mut().find(|anchor| anchor.id() == id)
    }

    /// Whether anchor `id` is still registered.
    pub fn contains(&self, id: AnchorId) -> bool {
        self.get(id).is_some()
    }

    /// Number of registered anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no anchor is registered.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Maximum anchor count before the oldest is evicted.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
