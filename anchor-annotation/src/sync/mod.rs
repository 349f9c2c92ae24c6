//! Remote anchor synchronisation.
//!
//! Anchors are uploaded once per sync hash and the room's existing anchors are
//! downloaded at startup. All network traffic happens on a worker thread; the
//! frame thread only queues jobs and folds their outcomes.

pub mod coordinator;
pub mod record;
pub mod remote;

pub use coordinator::{CloudSync, SyncOutcome, fetch_hydration};
pub use record::{CloudAnchorRecord, HydratedAnchor, PushRecord};
pub use remote::{HttpRemoteStore, RemoteStore};
