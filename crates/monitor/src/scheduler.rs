//! refresh scheduling
//!
//! two tasks feed one coalescing gate:
//!
//! - a polling task on a fixed interval
//! - an event task reacting to deposit/withdraw/borrow/repay events of
//!   the active account
//!
//! a refresh reads one batch, builds a snapshot and publishes it. a
//! session switch cancels the refresh in flight and its result is never
//! published.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use lendmirror_common::{Address, LedgerEvent, LedgerEventKind};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult, ReadError};
use crate::gate::{RefreshGate, RefreshPermit};
use crate::ledger::{read_batch, LedgerReader};
use crate::snapshot::{PositionSnapshot, Session};
use crate::store::{PublishedState, SnapshotStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Interval,
    Event(LedgerEventKind),
    Manual,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published(u64),
    /// another refresh was in flight and covers this trigger
    Coalesced,
    /// reads failed; the published snapshot was marked stale
    Failed(ReadError),
    /// the session changed while reading
    Cancelled,
    /// finished but lost against a newer snapshot
    Dropped(MonitorError),
}

struct Shared<L: ?Sized> {
    ledger: Arc<L>,
    config: MonitorConfig,
    store: Arc<SnapshotStore>,
    gate: Arc<RefreshGate>,
    sequence: AtomicU64,
    session_tx: watch::Sender<Session>,
    /// refreshes spawned by the loops, aborted on shutdown
    refreshes: Mutex<JoinSet<()>>,
}

pub struct RefreshScheduler<L: LedgerReader + ?Sized + 'static> {
    shared: Arc<Shared<L>>,
    events_tx: mpsc::Sender<LedgerEvent>,
    events_rx: Option<mpsc::Receiver<LedgerEvent>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl<L: LedgerReader + ?Sized + 'static> RefreshScheduler<L> {
    pub fn new(ledger: Arc<L>, config: MonitorConfig, account: Address) -> MonitorResult<Self> {
        config.validate()?;

        let session = Session::new(account, config.chain_id);
        let (session_tx, _) = watch::channel(session);
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            shared: Arc::new(Shared {
                ledger,
                store: Arc::new(SnapshotStore::new(session)),
                gate: RefreshGate::new(),
                sequence: AtomicU64::new(0),
                session_tx,
                refreshes: Mutex::new(JoinSet::new()),
                config,
            }),
            events_tx,
            events_rx: Some(events_rx),
            shutdown_tx,
            tasks: Vec::new(),
        })
    }

    /// spawn the polling and event tasks; the first poll fires immediately
    pub fn start(&mut self) {
        let Some(events_rx) = self.events_rx.take() else {
            return;
        };

        self.tasks.push(tokio::spawn(poll_loop(
            Arc::clone(&self.shared),
            self.shutdown_tx.subscribe(),
        )));
        self.tasks.push(tokio::spawn(event_loop(
            Arc::clone(&self.shared),
            events_rx,
            self.shutdown_tx.subscribe(),
        )));

        info!(
            account = %self.session().account,
            interval_secs = self.shared.config.poll_interval_secs,
            "refresh scheduler started"
        );
    }

    /// sender for ledger events; events for other accounts are ignored
    pub fn events(&self) -> mpsc::Sender<LedgerEvent> {
        self.events_tx.clone()
    }

    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.shared.store)
    }

    pub fn subscribe(&self) -> watch::Receiver<PublishedState> {
        self.shared.store.subscribe()
    }

    pub fn session(&self) -> Session {
        *self.shared.session_tx.borrow()
    }

    /// refresh in the caller's task, through the same gate as the loops
    pub async fn refresh_now(&self) -> RefreshOutcome {
        match self.shared.gate.try_acquire() {
            Some(permit) => run_refresh(&self.shared, permit, Trigger::Manual).await,
            None => {
                debug!(trigger = ?Trigger::Manual, "refresh in flight, trigger coalesced");
                RefreshOutcome::Coalesced
            }
        }
    }

    /// move to another account or chain
    ///
    /// the published snapshot is discarded first, then the in-flight
    /// refresh (if any) observes the new session and abandons its reads.
    pub fn switch_session(&self, account: Address, chain_id: u64) -> Session {
        let next = self.session().next(account, chain_id);
        self.shared.store.reset(next);
        self.shared.session_tx.send_replace(next);
        info!(account = %account, chain_id, epoch = next.epoch, "session switched");
        next
    }

    /// stop both loops, then abort any refresh still in flight so
    /// nothing is published once this returns
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        let mut refreshes = std::mem::take(&mut *self.shared.refreshes.lock().unwrap_or_else(PoisonError::into_inner));
        refreshes.shutdown().await;
        debug!("refresh scheduler stopped");
    }
}

async fn poll_loop<L>(shared: Arc<Shared<L>>, mut shutdown: watch::Receiver<bool>)
where
    L: LedgerReader + ?Sized + 'static,
{
    let mut ticker = tokio::time::interval(shared.config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => spawn_refresh(&shared, Trigger::Interval),
        }
    }
}

async fn event_loop<L>(
    shared: Arc<Shared<L>>,
    mut events: mpsc::Receiver<LedgerEvent>,
    mut shutdown: watch::Receiver<bool>,
) where
    L: LedgerReader + ?Sized + 'static,
{
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                let account = shared.session_tx.borrow().account;
                if !event.is_for(&account) {
                    continue;
                }
                debug!(kind = ?event.kind, block = event.block_number, "ledger event for active account");
                spawn_refresh(&shared, Trigger::Event(event.kind));
            }
        }
    }
}

/// start a refresh in its own task unless one is already running
fn spawn_refresh<L>(shared: &Arc<Shared<L>>, trigger: Trigger)
where
    L: LedgerReader + ?Sized + 'static,
{
    let Some(permit) = shared.gate.try_acquire() else {
        debug!(?trigger, "refresh in flight, trigger coalesced");
        return;
    };

    let mut refreshes = shared.refreshes.lock().unwrap_or_else(PoisonError::into_inner);
    while refreshes.try_join_next().is_some() {}

    let task_shared = Arc::clone(shared);
    refreshes.spawn(async move {
        run_refresh(&task_shared, permit, trigger).await;
    });
}

async fn run_refresh<L>(shared: &Shared<L>, permit: RefreshPermit, trigger: Trigger) -> RefreshOutcome
where
    L: LedgerReader + ?Sized + 'static,
{
    let mut session_rx = shared.session_tx.subscribe();
    let session = *session_rx.borrow_and_update();
    // fixed before reading: a slow batch never outranks a later one
    let sequence = shared.sequence.fetch_add(1, Ordering::SeqCst) + 1;

    let batch = tokio::time::timeout(
        shared.config.read_timeout(),
        read_batch(shared.ledger.as_ref(), &session.account),
    );

    let result = tokio::select! {
        _ = session_rx.changed() => {
            debug!(sequence, ?trigger, "session switched, refresh discarded");
            return RefreshOutcome::Cancelled;
        }
        result = batch => match result {
            Ok(reads) => reads,
            Err(_) => Err(ReadError::Timeout(shared.config.read_timeout_secs)),
        },
    };

    let reads = match result.and_then(|reads| reads.check_layout(&shared.config.decimals).map(|_| reads)) {
        Ok(reads) => reads,
        Err(e) => {
            warn!(sequence, ?trigger, code = e.code(), error = %e, "ledger read failed, keeping last snapshot");
            shared.store.mark_stale(&session, &e);
            return RefreshOutcome::Failed(e);
        }
    };

    let previous = shared.store.current().snapshot;
    let snapshot = PositionSnapshot::build(sequence, session, unix_now(), reads, previous.as_deref());
    if !snapshot.is_actionable() {
        warn!(sequence, flags = ?snapshot.integrity, "snapshot is inconsistent");
    }

    let outcome = match shared.store.publish(snapshot) {
        Ok(published) => {
            info!(
                sequence,
                ?trigger,
                block = published.block_number,
                tier = %published.risk.tier,
                "snapshot published"
            );
            RefreshOutcome::Published(sequence)
        }
        Err(e) => RefreshOutcome::Dropped(e),
    };

    drop(permit);
    outcome
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
