use std::collections::{HashMap, HashSet};

use crate::engine::anchor::AnchorId;

/// Result of a successful relabel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Relabel {
    /// Keyword the anchor owned before, if any.
    pub previous: Option<String>,
    /// Another anchor that owned the new keyword and lost it.
    pub displaced: Option<AnchorId>,
}

/// Bidirectional anchor id <-> keyword mapping backing search.
///
/// The two maps are exact inverses at all times. A keyword belongs to one
/// anchor; giving it to another anchor takes it away from the first. The
/// displaced anchor keeps its label but has no keyword until the session
/// hands the orphaned keyword back to it.
#[derive(Debug, Default, Clone)]
pub struct KeywordIndex {
    known: HashSet<AnchorId>,
    id_to_keyword: HashMap<AnchorId, String>,
    keyword_to_id: HashMap<String, AnchorId>,
}

impl KeywordIndex {
    /// Make `id` known and assign its first keyword.
    pub fn register(&mut self, id: AnchorId, keyword: &str) -> Relabel {
        self.known.insert(id);
        self.assign(id, keyword)
    }

    /// Replace the keyword of a known anchor. Unknown ids are ignored.
    pub fn relabel(&mut self, id: AnchorId, keyword: &str) -> Option<Relabel> {
        if !self.known.contains(&id) {
            return None;
        }
        Some(self.assign(id, keyword))
    }

    /// Drop `id` entirely, returning the keyword it owned.
    pub fn forget(&mut self, id: AnchorId) -> Option<String> {
        self.known.remove(&id);
        let keyword = self.id_to_keyword.remove(&id)?;
        self.keyword_to_id.remove(&keyword);
        Some(keyword)
    }

    /// Ids owning any of `keywords`. Unknown keywords are skipped.
    pub fn lookup_ids<'a>(&self, keywords: impl IntoIterator<Item = &'a str>) -> HashSet<AnchorId> {
        keywords
            .into_iter()
            .filter_map(|keyword| self.id_of(keyword))
            .collect()
    }

    pub fn keyword_of(&self, id: AnchorId) -> Option<&str> {
        self.id_to_keyword.get(&id).map(String::as_str)
    }

    pub fn id_of(&self, keyword: &str) -> Option<AnchorId> {
        self.keyword_to_id.get(keyword).copied()
    }

    pub fn is_known(&self, id: AnchorId) -> bool {
        self.known.contains(&id)
    }

    /// Number of keyword pairs.
    pub fn len(&self) -> usize {
        self.id_to_keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_keyword.is_empty()
    }

    /// Both maps mirror each other exactly.
    pub fn is_consistent(&self) -> bool {
        self.id_to_keyword.len() == self.keyword_to_id.len()
            && self
                .id_to_keyword
                .iter()
                .all(|(id, keyword)| self.keyword_to_id.get(keyword) == Some(id))
    }

    fn assign(&mut self, id: AnchorId, keyword: &str) -> Relabel {
        let previous = self.id_to_keyword.remove(&id);
        if let Some(old) = &previous {
            self.keyword_to_id.remove(old);
        }

        let displaced = self
            .keyword_to_id
            .insert(keyword.to_owned(), id)
            .filter(|owner| *owner != id);
        if let Some(owner) = displaced {
            self.id_to_keyword.remove(&owner);
        }
        self.id_to_keyword.insert(id, keyword.to_owned());

        Relabel { previous, displaced }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn relabel_replaces_old_pair() {
        let mut index = KeywordIndex::default();
        index.register(AnchorId(1), "New Marker #1");

        let change = index.relabel(AnchorId(1), "Lemon").unwrap();

        assert_eq!(change.previous.as_deref(), Some("New Marker #1"));
        assert_eq!(index.id_of("Lemon"), Some(AnchorId(1)));
        assert_eq!(index.id_of("New Marker #1"), None);
        assert_eq!(index.keyword_of(AnchorId(1)), Some("Lemon"));
        assert!(index.is_consistent());
    }

    #[test]
    fn relabel_of_unknown_id_is_ignored() {
        let mut index = KeywordIndex::default();
        assert_eq!(index.relabel(AnchorId(3), "Apple"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn taking_a_keyword_displaces_previous_owner() {
        let mut index = KeywordIndex::default();
        index.register(AnchorId(1), "Apple");
        index.register(AnchorId(2), "Banana");

        let change = index.relabel(AnchorId(2), "Apple").unwrap();

        assert_eq!(change.displaced, Some(AnchorId(1)));
        assert_eq!(index.id_of("Apple"), Some(AnchorId(2)));
        assert_eq!(index.keyword_of(AnchorId(1)), None);
        assert!(index.is_known(AnchorId(1)));
        assert_eq!(index.len(), 1);
        assert!(index.is_consistent());

        // the displaced anchor can still be relabelled
        assert!(index.relabel(AnchorId(1), "Cherry").is_some());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn lookup_skips_unknown_keywords() {
        let mut index = KeywordIndex::default();
        index.register(AnchorId(1), "Apple");
        index.register(AnchorId(2), "Banana");

        let ids = index.lookup_ids(["Apple", "Durian"]);

        assert_eq!(ids, HashSet::from([AnchorId(1)]));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn forget_returns_owned_keyword() {
        let mut index = KeywordIndex::default();
        index.register(AnchorId(4), "Mango");
        assert_eq!(index.forget(AnchorId(4)).as_deref(), Some("Mango"));
        assert!(!index.is_known(AnchorId(4)));
        assert_eq!(index.id_of("Mango"), None);
    }

    proptest! {
        #[test]
        fn maps_stay_inverse(ops in prop::collection::vec((0u64..6, 0usize..5), 0..60)) {
            const WORDS: [&str; 5] = ["Apple", "Banana", "Lemon", "Mango", "Grapes"];
            let mut index = KeywordIndex::default();
            for id in 0..3 {
                index.register(AnchorId(id), &format!("New Marker #{id}"));
            }

            for (id, word) in ops {
                index.relabel(AnchorId(id), WORDS[word]);
                prop_assert!(index.is_consistent());
            }
        }
    }
}
