use std::collections::VecDeque;
use std::time::Duration;

use bevy::log::{debug, error, info, warn};
use bevy::math::Vec2;
use bevy::prelude::Resource;
use uuid::Uuid;

use super::anchor::{Anchor, AnchorId, TrackableKind};
use super::frame::{FrameOutput, Notice, StatusMessage, render_pass};
use super::placement::select_hit;
use super::registry::AnchorRegistry;
use crate::ar::{ArFrame, ArSession, TrackingState};
use crate::config::AnnotationConfig;
use crate::error::Result;
use crate::sync::{CloudSync, HttpRemoteStore, HydratedAnchor, RemoteStore, SyncOutcome};
use crate::tools::keyword_index::KeywordIndex;
use crate::tools::search::{SearchEngine, SubmitOutcome};

/// All per-session annotation state.
///
/// Owns the anchor registry, keyword index, search state and sync
/// coordinator, and hands out anchor ids and auto-generated labels. Input
/// from the UI is queued here and consumed by [`AnnotationSession::process_frame`].
#[derive(Resource)]
pub struct AnnotationSession {
    config: AnnotationConfig,
    session_tag: Uuid,
    next_id: u64,
    next_label_number: u32,
    registry: AnchorRegistry,
    keywords: KeywordIndex,
    search: SearchEngine,
    sync: CloudSync,
    pending_taps: VecDeque<Vec2>,
    pending_notices: Vec<Notice>,
    viewport: Vec2,
}

impl AnnotationSession {
    pub fn new(config: AnnotationConfig, sync: CloudSync) -> Self {
        Self {
            registry: AnchorRegistry::new(config.max_anchors),
            search: SearchEngine::new(config.search_policy),
            next_label_number: config.first_anchor_number,
            pending_taps: VecDeque::with_capacity(config.max_pending_taps),
            session_tag: Uuid::new_v4(),
            next_id: 0,
            keywords: KeywordIndex::default(),
            sync,
            pending_notices: Vec::new(),
            viewport: Vec2::ZERO,
            config,
        }
    }

    /// Session that never talks to a remote store.
    pub fn offline(config: AnnotationConfig) -> Self {
        let sync = CloudSync::disabled(config.sync.room_id.clone());
        Self::new(config, sync)
    }

    pub fn with_remote<S: RemoteStore>(config: AnnotationConfig, store: S) -> Result<Self> {
        let sync = CloudSync::spawn(store, config.sync.room_id.clone())?;
        Ok(Self::new(config, sync))
    }

    /// Session wired to the HTTP store named in `config`, or offline when sync is disabled.
    pub fn from_config(config: AnnotationConfig) -> Result<Self> {
        if !config.sync.enabled {
            info!("Cloud sync disabled; running offline");
            return Ok(Self::offline(config));
        }

        let store = HttpRemoteStore::new(&config.sync)?;
        info!("Cloud sync using {} room {}", store.base_url(), config.sync.room_id);
        Self::with_remote(config, store)
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Buffer a tap for the next tracked frame. Returns `false` when the queue is full.
    pub fn queue_tap(&mut self, position: Vec2) -> bool {
        if self.pending_taps.len() >= self.config.max_pending_taps {
            debug!("Dropping tap at {position}: queue full");
            return false;
        }
        self.pending_taps.push_back(position);
        true
    }

    pub fn submit_query(&mut self, text: &str) -> SubmitOutcome {
        let outcome = self.search.submit_query(text);
        if outcome == SubmitOutcome::NoMatch {
            self.pending_notices.push(Notice::NoMatch { query: text.to_owned() });
        }
        outcome
    }

    pub fn change_query(&mut self, text: &str) {
        self.search.change_query(text);
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Give anchor `id` a new label. Unknown ids are ignored and return `false`.
    pub fn relabel(&mut self, id: AnchorId, label: &str) -> bool {
        let Some(change) = self.keywords.relabel(id, label) else {
            return false;
        };

        if let Some(owner) = change.displaced {
            debug!("Anchor {owner} lost keyword {label:?} to anchor {id}");
        }
        self.search.add_candidate(label);

        if let Some(anchor) = self.registry.get_mut(id) {
            anchor.set_label(label);
        }
        if let Some(previous) = change.previous.filter(|previous| previous != label) {
            if !self.reclaim_keyword(&previous) {
                self.search.remove_candidate(&previous);
            }
        }
        true
    }

    /// Ask the sync worker for the room's stored anchors.
    pub fn start_hydration(&mut self) -> bool {
        self.sync.request_hydration()
    }

    /// Place decoded cloud anchors. Records whose hash is already known are
    /// skipped. Returns the number of anchors added.
    pub fn apply_hydration(&mut self, records: Vec<HydratedAnchor>) -> usize {
        let mut added = 0;
        for record in records {
            if !self.sync.mark_processed(&record.hash) {
                continue;
            }

            let anchor = Anchor::cloud(self.allocate_id(), record.pose, record.keyword, record.hash);
            match self.insert_anchor(anchor) {
                Ok(_) => added += 1,
                Err(err) => warn!("Failed to place cloud anchor: {err}"),
            }
        }

        if added > 0 {
            info!("Placed {added} cloud anchors");
        }
        added
    }

    /// Block until outstanding sync jobs finish (or `timeout` passes) and apply their results.
    pub fn settle_sync(&mut self, timeout: Duration) -> Vec<AnchorId> {
        let outcomes = self.sync.settle(timeout);
        self.absorb(outcomes)
    }

    /// Run the per-frame pipeline against `ar`.
    pub fn process_frame(&mut self, ar: &mut dyn ArSession) -> FrameOutput {
        let mut output = FrameOutput::default();

        let outcomes = self.sync.drain();
        output.published = self.absorb(outcomes);

        let frame = match ar.update(self.config.clip_planes()) {
            Ok(frame) => frame,
            Err(err) => {
                error!("Camera not available during frame: {err}");
                self.pending_notices
                    .push(Notice::Error("Camera not available. Try restarting the app.".into()));
                output.notices.append(&mut self.pending_notices);
                output.skipped = true;
                return output;
            }
        };

        self.handle_tap(ar, &frame);
        output.status = StatusMessage::for_frame(&frame, !self.registry.is_empty());
        output.notices.append(&mut self.pending_notices);

        if frame.camera.tracking == TrackingState::Paused {
            return output;
        }

        let partition = self.search.partition(&self.registry, &self.keywords);
        let (labels, draws) = render_pass(&partition, &frame.camera, self.viewport, &self.config.label);
        output.labels = labels;
        output.draws = draws;

        self.publish_pending();
        output
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    pub fn registry(&self) -> &AnchorRegistry {
        &self.registry
    }

    pub fn keywords(&self) -> &KeywordIndex {
        &self.keywords
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn sync(&self) -> &CloudSync {
        &self.sync
    }

    pub fn session_tag(&self) -> Uuid {
        self.session_tag
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn pending_taps(&self) -> usize {
        self.pending_taps.len()
    }

    fn allocate_id(&mut self) -> AnchorId {
        let id = AnchorId(self.next_id);
        self.next_id += 1;
        id
    }

    fn local_sync_hash(&self, id: AnchorId) -> String {
        format!("{}-{}", self.session_tag.simple(), id.0)
    }

    /// One tap per tracked frame; taps on untracked frames wait.
    fn handle_tap(&mut self, ar: &mut dyn ArSession, frame: &ArFrame) {
        if frame.camera.tracking != TrackingState::Tracking {
            return;
        }
        let Some(tap) = self.pending_taps.pop_front() else {
            return;
        };

        let hits = ar.hit_test(frame, tap, self.config.hit_test_mode());
        let Some(hit) = select_hit(&hits, &frame.camera.pose) else {
            debug!("No placeable surface under tap at {tap}");
            return;
        };

        let live = ar.create_anchor(hit);
        let kind = TrackableKind::from(&hit.trackable);
        let id = self.allocate_id();
        let label = self.config.anchor_label(self.next_label_number);
        self.next_label_number += 1;

        let anchor = Anchor::local(id, live, kind, label.clone(), self.local_sync_hash(id));
        match self.insert_anchor(anchor) {
            Ok(()) => {
                info!("Created anchor {id} on {kind:?} as {label:?}");
                self.pending_notices.push(Notice::AnchorCreated { anchor: id, label });
            }
            Err(err) => error!("Failed to register new anchor: {err}"),
        }
    }

    /// Append to the registry and index the label. An evicted anchor takes
    /// its keyword with it.
    fn insert_anchor(&mut self, anchor: Anchor) -> Result<()> {
        let id = anchor.id();
        let label = anchor.label().to_owned();

        if let Some(evicted) = self.registry.append(anchor)? {
            if let Some(keyword) = self.keywords.forget(evicted.id()) {
                if !self.reclaim_keyword(&keyword) {
                    self.search.remove_candidate(&keyword);
                }
            }
        }

        let change = self.keywords.register(id, &label);
        if let Some(owner) = change.displaced {
            debug!("Anchor {owner} lost keyword {label:?} to anchor {id}");
        }
        self.search.add_candidate(&label);
        Ok(())
    }

    /// Hand an ownerless keyword to the oldest anchor still showing it.
    /// Returns `false` when no registered anchor carries the label.
    fn reclaim_keyword(&mut self, keyword: &str) -> bool {
        if self.keywords.id_of(keyword).is_some() {
            return true;
        }
        let heir = self
            .registry
            .snapshot()
            .find(|anchor| anchor.label() == keyword && self.keywords.keyword_of(anchor.id()).is_none())
            .map(Anchor::id);
        let Some(heir) = heir else {
            return false;
        };

        debug!("Anchor {heir} takes back keyword {keyword:?}");
        self.keywords.relabel(heir, keyword);
        true
    }

    fn absorb(&mut self, outcomes: Vec<SyncOutcome>) -> Vec<AnchorId> {
        let mut published = Vec::new();
        for outcome in outcomes {
            match outcome {
                SyncOutcome::Hydrated(records) => {
                    self.apply_hydration(records);
                }
                SyncOutcome::HydrationFailed(err) => {
                    warn!("Could not load cloud anchors for room {}: {err}", self.sync.room_id());
                }
                SyncOutcome::Published { anchor, .. } => published.push(anchor),
                SyncOutcome::PublishFailed { .. } => {}
            }
        }
        published
    }

    fn publish_pending(&mut self) {
        for anchor in self.registry.snapshot() {
            if let Err(err) = self.sync.publish(anchor) {
                warn!("Could not queue upload of anchor {}: {err}", anchor.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{Mat4, Vec3};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::engine::anchor::AnchorPose;

    fn session(max_anchors: usize) -> AnnotationSession {
        AnnotationSession::offline(AnnotationConfig {
            max_anchors,
            ..Default::default()
        })
    }

    fn hydrated(keyword: &str, hash: &str) -> HydratedAnchor {
        HydratedAnchor {
            keyword: keyword.into(),
            hash: hash.into(),
            pose: AnchorPose::from_matrix(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))),
        }
    }

    #[test]
    fn hydration_registers_keywords_once() {
        let mut session = session(20);

        assert_eq!(session.apply_hydration(vec![hydrated("Lemon", "abc")]), 1);
        assert_eq!(session.apply_hydration(vec![hydrated("Lemon", "abc")]), 0);

        let id = session.keywords().id_of("Lemon").unwrap();
        assert!(session.registry().get(id).unwrap().is_cloud());
        assert!(session.sync().is_processed("abc"));
        assert_eq!(session.search().candidates(), ["Lemon".to_string()]);
    }

    #[test]
    fn relabel_moves_search_candidate() {
        let mut session = session(20);
        session.apply_hydration(vec![hydrated("Old", "h1")]);
        let id = session.keywords().id_of("Old").unwrap();

        assert!(session.relabel(id, "Lemon"));

        assert_eq!(session.registry().get(id).unwrap().label(), "Lemon");
        assert_eq!(session.search().candidates(), ["Lemon".to_string()]);
        assert!(!session.relabel(AnchorId(99), "Ghost"));
    }

    #[test]
    fn relabel_to_same_keyword_keeps_candidate() {
        let mut session = session(20);
        session.apply_hydration(vec![hydrated("Lemon", "h1")]);
        let id = session.keywords().id_of("Lemon").unwrap();

        assert!(session.relabel(id, "Lemon"));
        assert_eq!(session.search().candidates(), ["Lemon".to_string()]);
    }

    #[test]
    fn eviction_forgets_keyword_and_candidate() {
        let mut session = session(2);
        session.apply_hydration(vec![hydrated("A", "1"), hydrated("B", "2"), hydrated("C", "3")]);

        assert_eq!(session.registry().len(), 2);
        assert_eq!(session.keywords().id_of("A"), None);
        assert_eq!(session.search().candidates(), ["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn relabelled_owner_hands_keyword_back() {
        let mut session = session(20);
        session.apply_hydration(vec![hydrated("Chair", "h1"), hydrated("Chair", "h2")]);
        assert_eq!(session.keywords().id_of("Chair"), Some(AnchorId(1)));

        assert!(session.relabel(AnchorId(1), "Table"));

        assert_eq!(session.keywords().id_of("Chair"), Some(AnchorId(0)));
        assert_eq!(session.keywords().id_of("Table"), Some(AnchorId(1)));
        assert_eq!(session.search().candidates(), ["Chair".to_string(), "Table".to_string()]);
        assert!(matches!(session.submit_query("Chair"), SubmitOutcome::Matched { .. }));
        assert!(session.keywords().is_consistent());
    }

    #[test]
    fn evicted_owner_hands_keyword_back() {
        let mut session = session(2);
        session.apply_hydration(vec![hydrated("Chair", "h1"), hydrated("Chair", "h2")]);
        assert!(session.relabel(AnchorId(0), "Chair"));
        assert_eq!(session.keywords().id_of("Chair"), Some(AnchorId(0)));

        session.apply_hydration(vec![hydrated("Lamp", "h3")]);

        assert!(!session.registry().contains(AnchorId(0)));
        assert_eq!(session.keywords().id_of("Chair"), Some(AnchorId(1)));
        assert!(session.search().candidates().contains(&"Chair".to_string()));
    }

    #[test]
    fn unknown_query_queues_notice() {
        let mut session = session(20);
        assert_eq!(session.submit_query("Durian"), SubmitOutcome::NoMatch);
        assert_eq!(
            session.pending_notices,
            vec![Notice::NoMatch { query: "Durian".into() }]
        );
    }

    #[test]
    fn tap_queue_is_bounded() {
        let mut session = AnnotationSession::offline(AnnotationConfig {
            max_pending_taps: 2,
            ..Default::default()
        });

        assert!(session.queue_tap(Vec2::ZERO));
        assert!(session.queue_tap(Vec2::ONE));
        assert!(!session.queue_tap(Vec2::ONE));
        assert_eq!(session.pending_taps(), 2);
    }
}
