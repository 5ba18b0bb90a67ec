//! the single published snapshot
//!
//! readers hold a `watch` receiver. every change replaces the whole
//! `PublishedState`, so a reader sees either the old snapshot or the new
//! one, never a mix.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::{MonitorError, MonitorResult, ReadError};
use crate::snapshot::{PositionSnapshot, Session};

#[derive(Clone, Debug, PartialEq)]
pub struct PublishedState {
    pub session: Session,
    pub snapshot: Option<Arc<PositionSnapshot>>,
    /// the last refresh failed; `snapshot` may be outdated
    pub stale: bool,
    pub last_error: Option<String>,
}

impl PublishedState {
    fn empty(session: Session) -> Self {
        Self { session, snapshot: None, stale: false, last_error: None }
    }

    pub fn sequence(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.sequence)
    }
}

pub struct SnapshotStore {
    tx: watch::Sender<PublishedState>,
}

impl SnapshotStore {
    pub fn new(session: Session) -> Self {
        let (tx, _rx) = watch::channel(PublishedState::empty(session));
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<PublishedState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> PublishedState {
        self.tx.borrow().clone()
    }

    /// replace the published snapshot
    ///
    /// snapshots for another session, or not newer than the published one,
    /// are dropped and leave the state untouched.
    pub fn publish(&self, snapshot: PositionSnapshot) -> MonitorResult<Arc<PositionSnapshot>> {
        let snapshot = Arc::new(snapshot);
        let mut outcome = Ok(Arc::clone(&snapshot));

        self.tx.send_if_modified(|state| {
            if state.session != snapshot.session {
                outcome = Err(MonitorError::SessionMismatch);
                return false;
            }
            if let Some(published) = &state.snapshot {
                if snapshot.sequence <= published.sequence {
                    outcome = Err(MonitorError::StaleSequence {
                        published: published.sequence,
                        rejected: snapshot.sequence,
                    });
                    return false;
                }
            }
            state.snapshot = Some(Arc::clone(&snapshot));
            state.stale = false;
            state.last_error = None;
            true
        });

        if let Err(e) = &outcome {
            debug!(sequence = snapshot.sequence, reason = %e, "snapshot dropped");
        }
        outcome
    }

    /// keep the snapshot but flag it outdated; ignored for another session
    pub fn mark_stale(&self, session: &Session, error: &ReadError) -> bool {
        self.tx.send_if_modified(|state| {
            if state.session != *session {
                return false;
            }
            state.stale = true;
            state.last_error = Some(error.to_string());
            true
        })
    }

    /// discard everything for an account or chain switch
    pub fn reset(&self, session: Session) {
        self.tx.send_replace(PublishedState::empty(session));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sample_state;
    use crate::ledger::read_batch;
    use crate::fixture::FixtureLedger;
    use lendmirror_common::{Address, AssetDecimals};

    fn session() -> Session {
        Session::new(Address([0xaa; 20]), 1)
    }

    async fn snapshot(sequence: u64, session: Session) -> PositionSnapshot {
        let ledger = FixtureLedger::new(sample_state(Address([0xaa; 20])), AssetDecimals::default());
        let reads = read_batch(&ledger, &session.account).await.unwrap();
        PositionSnapshot::build(sequence, session, 0, reads, None)
    }

    #[tokio::test]
    async fn test_stale_sequence_rejected() {
        let store = SnapshotStore::new(session());
        store.publish(snapshot(5, session()).await).unwrap();

        let err = store.publish(snapshot(4, session()).await).unwrap_err();
        assert_eq!(err, MonitorError::StaleSequence { published: 5, rejected: 4 });
        assert_eq!(store.current().sequence(), Some(5));

        // equal sequence is not newer either
        assert!(store.publish(snapshot(5, session()).await).is_err());
        assert!(store.publish(snapshot(6, session()).await).is_ok());
    }

    #[tokio::test]
    async fn test_other_session_rejected() {
        let store = SnapshotStore::new(session());
        let other = session().next(Address([0xbb; 20]), 1);
        let err = store.publish(snapshot(1, other).await).unwrap_err();
        assert_eq!(err, MonitorError::SessionMismatch);
        assert!(store.current().snapshot.is_none());
    }

    #[tokio::test]
    async fn test_mark_stale_keeps_snapshot() {
        let store = SnapshotStore::new(session());
        store.publish(snapshot(1, session()).await).unwrap();

        assert!(store.mark_stale(&session(), &ReadError::Timeout(10)));
        let state = store.current();
        assert!(state.stale);
        assert_eq!(state.sequence(), Some(1));
        assert!(state.last_error.unwrap().contains("timed out"));

        // a fresh publish clears the flag
        store.publish(snapshot(2, session()).await).unwrap();
        assert!(!store.current().stale);
    }

    #[tokio::test]
    async fn test_reset_discards_snapshot() {
        let store = SnapshotStore::new(session());
        let mut rx = store.subscribe();
        store.publish(snapshot(1, session()).await).unwrap();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        let next = session().next(Address([0xbb; 20]), 1);
        store.reset(next);
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.session, next);
        assert!(state.snapshot.is_none());

        assert!(!store.mark_stale(&session(), &ReadError::Timeout(1)));
    }
}
