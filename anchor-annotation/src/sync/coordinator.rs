use std::collections::HashSet;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bevy::log::{debug, info, warn};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use super::record::{CloudAnchorRecord, HydratedAnchor, PushRecord};
use super::remote::RemoteStore;
use crate::engine::anchor::{Anchor, AnchorId};
use crate::error::{AnnotationError, Result};

enum SyncJob {
    Hydrate { room_id: String },
    Push { anchor: AnchorId, record: PushRecord },
}

/// Completed network work, delivered back to the frame thread.
#[derive(Debug)]
pub enum SyncOutcome {
    Hydrated(Vec<HydratedAnchor>),
    HydrationFailed(AnnotationError),
    Published { anchor: AnchorId, hash: String },
    PublishFailed { anchor: AnchorId, hash: String, error: AnnotationError },
}

/// Fetch the room's anchors and decode them, skipping malformed elements.
pub fn fetch_hydration(store: &dyn RemoteStore, room_id: &str) -> Result<Vec<HydratedAnchor>> {
    let raw = store.fetch_anchors(room_id)?;
    let total = raw.len();

    let decoded: Vec<HydratedAnchor> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| {
            let decoded = serde_json::from_value::<CloudAnchorRecord>(value)
                .map_err(AnnotationError::from)
                .and_then(HydratedAnchor::try_from);
            match decoded {
                Ok(anchor) => Some(anchor),
                Err(err) => {
                    warn!("Skipping cloud anchor record {position} in room {room_id}: {err}");
                    None
                }
            }
        })
        .collect();

    info!("Fetched {}/{} cloud anchors for room {}", decoded.len(), total, room_id);
    Ok(decoded)
}

/// Owns remote sync state for one session.
///
/// Network calls run on a dedicated worker thread. Their outcomes wait in a
/// channel until the frame thread calls [`CloudSync::drain`], so the hash
/// sets are only ever written from the frame thread.
pub struct CloudSync {
    room_id: String,
    processed: HashSet<String>,
    in_flight: HashSet<String>,
    jobs: Option<Sender<SyncJob>>,
    outcomes: Option<Receiver<SyncOutcome>>,
    worker: Option<JoinHandle<()>>,
    pending: usize,
}

impl CloudSync {
    /// Start the worker thread around `store`.
    pub fn spawn<S: RemoteStore>(store: S, room_id: impl Into<String>) -> Result<Self> {
        let (job_tx, job_rx) = unbounded::<SyncJob>();
        let (outcome_tx, outcome_rx) = unbounded::<SyncOutcome>();

        let worker = thread::Builder::new()
            .name("cloud-sync".into())
            .spawn(move || run_worker(store, job_rx, outcome_tx))
            .map_err(AnnotationError::WorkerSpawn)?;

        Ok(Self {
            room_id: room_id.into(),
            processed: HashSet::new(),
            in_flight: HashSet::new(),
            jobs: Some(job_tx),
            outcomes: Some(outcome_rx),
            worker: Some(worker),
            pending: 0,
        })
    }

    /// Coordinator without a worker; every request is refused.
    pub fn disabled(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            processed: HashSet::new(),
            in_flight: HashSet::new(),
            jobs: None,
            outcomes: None,
            worker: None,
            pending: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.jobs.is_some()
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Queue a fetch of the room's anchors.
    pub fn request_hydration(&mut self) -> bool {
        let job = SyncJob::Hydrate {
            room_id: self.room_id.clone(),
        };
        self.submit(job)
    }

    /// Whether `anchor` still has to be uploaded.
    pub fn needs_publish(&self, anchor: &Anchor) -> bool {
        anchor.has_live_tracking()
            && !self.processed.contains(anchor.sync_hash())
            && !self.in_flight.contains(anchor.sync_hash())
    }

    /// Queue an upload of `anchor` unless it is cloud-only, already uploaded
    /// or already on its way. Returns whether a job was queued.
    pub fn publish(&mut self, anchor: &Anchor) -> Result<bool> {
        if !self.is_enabled() || !self.needs_publish(anchor) {
            return Ok(false);
        }
        let Some(pose) = anchor.live_pose() else {
            return Ok(false);
        };

        let hash = anchor.sync_hash().to_owned();
        let record = PushRecord::new(&self.room_id, anchor.label(), &pose, &hash)?;
        let queued = self.submit(SyncJob::Push {
            anchor: anchor.id(),
            record,
        });
        if queued {
            debug!("Queued upload of anchor {} ({})", anchor.id(), hash);
            self.in_flight.insert(hash);
        }
        Ok(queued)
    }

    /// Collect finished work without blocking and fold it into the hash sets.
    pub fn drain(&mut self) -> Vec<SyncOutcome> {
        let Some(outcomes) = &self.outcomes else {
            return Vec::new();
        };

        let drained: Vec<SyncOutcome> = outcomes.try_iter().collect();
        for outcome in &drained {
            self.fold(outcome);
        }
        drained
    }

    /// Block until every queued job has resolved or `timeout` elapses.
    pub fn settle(&mut self, timeout: Duration) -> Vec<SyncOutcome> {
        let deadline = Instant::now() + timeout;
        let mut settled = Vec::new();

        while self.pending > 0 {
            let Some(outcomes) = &self.outcomes else {
                break;
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            match outcomes.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.fold(&outcome);
                    settled.push(outcome);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Cloud sync still has {} job(s) outstanding", self.pending);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        settled
    }

    /// Record a hash as known remotely. Returns `false` if it already was.
    pub fn mark_processed(&mut self, hash: &str) -> bool {
        self.processed.insert(hash.to_owned())
    }

    pub fn is_processed(&self, hash: &str) -> bool {
        self.processed.contains(hash)
    }

    pub fn is_in_flight(&self, hash: &str) -> bool {
        self.in_flight.contains(hash)
    }

    pub fn processed_hashes(&self) -> &HashSet<String> {
        &self.processed
    }

    /// Jobs queued but not yet drained.
    pub fn pending(&self) -> usize {
        self.pending
    }

    fn submit(&mut self, job: SyncJob) -> bool {
        let Some(jobs) = &self.jobs else {
            return false;
        };

        if jobs.send(job).is_err() {
            warn!("Cloud sync worker has stopped; dropping job");
            return false;
        }
        self.pending += 1;
        true
    }

    fn fold(&mut self, outcome: &SyncOutcome) {
        self.pending = self.pending.saturating_sub(1);

        match outcome {
            SyncOutcome::Published { anchor, hash } => {
                self.in_flight.remove(hash);
                self.processed.insert(hash.clone());
                info!("Anchor {} uploaded as {}", anchor, hash);
            }
            SyncOutcome::PublishFailed { anchor, hash, error } => {
                self.in_flight.remove(hash);
                warn!("Upload of anchor {} failed, retrying next frame: {}", anchor, error);
            }
            SyncOutcome::Hydrated(_) | SyncOutcome::HydrationFailed(_) => {}
        }
    }
}

impl Drop for CloudSync {
    fn drop(&mut self) {
        // With both channel ends gone the worker stops after its current
        // job instead of running the backlog.
        self.jobs.take();
        self.outcomes.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Cloud sync worker panicked");
            }
        }
    }
}

fn run_worker<S: RemoteStore>(store: S, jobs: Receiver<SyncJob>, outcomes: Sender<SyncOutcome>) {
    for job in jobs.iter() {
        let outcome = match job {
            SyncJob::Hydrate { room_id } => match fetch_hydration(&store, &room_id) {
                Ok(anchors) => SyncOutcome::Hydrated(anchors),
                Err(error) => SyncOutcome::HydrationFailed(error),
            },
            SyncJob::Push { anchor, record } => match store.push_anchor(&record) {
                Ok(_) => SyncOutcome::Published {
                    anchor,
                    hash: record.hashcode,
                },
                Err(error) => SyncOutcome::PublishFailed {
                    anchor,
                    hash: record.hashcode,
                    error,
                },
            },
        };

        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}
