use serde::{Deserialize, Serialize};

use super::keyword_index::KeywordIndex;
use crate::engine::anchor::Anchor;
use crate::engine::registry::AnchorRegistry;

/// How a submitted query selects candidate keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    Exact,
    Prefix,
    Substring,
}

impl MatchPolicy {
    pub fn matches(&self, candidate: &str, query: &str) -> bool {
        match self {
            Self::Exact => candidate == query,
            Self::Prefix => candidate.to_lowercase().starts_with(&query.to_lowercase()),
            Self::Substring => candidate.to_lowercase().contains(&query.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Unfiltered,
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Matched { matches: usize },
    NoMatch,
}

/// Registry split into anchors selected by the active search and the rest.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub matched: Vec<&'a Anchor>,
    pub unmatched: Vec<&'a Anchor>,
}

/// Search state over anchor keywords.
///
/// `candidates` is every keyword the UI can offer. Submitting a candidate
/// commits `current_matches`; typing only reshapes the suggestion list.
#[derive(Debug, Default, Clone)]
pub struct SearchEngine {
    policy: MatchPolicy,
    candidates: Vec<String>,
    current_matches: Vec<String>,
    suggestions: Vec<String>,
    suggestions_visible: bool,
}

impl SearchEngine {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn state(&self) -> SearchState {
        if self.current_matches.is_empty() {
            SearchState::Unfiltered
        } else {
            SearchState::Filtered
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn current_matches(&self) -> &[String] {
        &self.current_matches
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn suggestions_visible(&self) -> bool {
        self.suggestions_visible
    }

    pub fn add_candidate(&mut self, keyword: &str) {
        if !self.candidates.iter().any(|c| c == keyword) {
            self.candidates.push(keyword.to_owned());
            self.suggestions.push(keyword.to_owned());
        }
    }

    /// Drop a keyword; it also leaves the active matches.
    pub fn remove_candidate(&mut self, keyword: &str) {
        self.candidates.retain(|c| c != keyword);
        self.suggestions.retain(|c| c != keyword);
        self.current_matches.retain(|c| c != keyword);
    }

    /// Commit a query. Queries that are not a known keyword leave state untouched.
    pub fn submit_query(&mut self, text: &str) -> SubmitOutcome {
        if !self.candidates.iter().any(|c| c == text) {
            return SubmitOutcome::NoMatch;
        }

        self.current_matches = self
            .candidates
            .iter()
            .filter(|candidate| self.policy.matches(candidate, text))
            .cloned()
            .collect();

        SubmitOutcome::Matched {
            matches: self.current_matches.len(),
        }
    }

    /// Live-filter the suggestion list while typing. Does not touch matches.
    pub fn change_query(&mut self, text: &str) {
        self.suggestions = self
            .candidates
            .iter()
            .filter(|candidate| MatchPolicy::Prefix.matches(candidate, text))
            .cloned()
            .collect();
        self.suggestions_visible = !text.is_empty();
    }

    pub fn clear(&mut self) {
        self.current_matches.clear();
        self.suggestions = self.candidates.clone();
        self.suggestions_visible = false;
    }

    /// Split `registry` by the active matches. Unfiltered puts everything in `unmatched`.
    pub fn partition<'a>(&self, registry: &'a AnchorRegistry, index: &KeywordIndex) -> Partition<'a> {
        if self.state() == SearchState::Unfiltered {
            return Partition {
                matched: Vec::new(),
                unmatched: registry.snapshot().collect(),
            };
        }

        let matched_ids = index.lookup_ids(self.current_matches.iter().map(String::as_str));
        let (matched, unmatched): (Vec<&Anchor>, Vec<&Anchor>) = registry
            .snapshot()
            .partition(|anchor| matched_ids.contains(&anchor.id()));

        Partition { matched, unmatched }
    }
}
