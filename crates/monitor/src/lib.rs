//! lendmirror-monitor: keeps a live mirror of one lending position
//!
//! reads raw pool and account state through a [`LedgerReader`], turns it
//! into a [`PositionSnapshot`] with the `lendmirror-common` math and
//! publishes it through a [`SnapshotStore`]. a [`RefreshScheduler`]
//! refreshes on a fixed interval and on ledger events of the account.
//!
//! ## usage
//!
//! ```rust,ignore
//! let ledger = Arc::new(FixtureLedger::load(path, config.decimals)?);
//! let mut scheduler = RefreshScheduler::new(ledger, config, account)?;
//! let mut updates = scheduler.subscribe();
//! scheduler.start();
//!
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update().clone();
//!     // render state.snapshot, flag it if state.stale
//! }
//! ```

pub mod config;
pub mod error;
pub mod fixture;
pub mod gate;
pub mod ledger;
pub mod scheduler;
pub mod snapshot;
pub mod store;

pub use config::*;
pub use error::*;
pub use fixture::{FixtureLedger, FixtureState};
pub use gate::*;
pub use ledger::*;
pub use scheduler::*;
pub use snapshot::*;
pub use store::*;
