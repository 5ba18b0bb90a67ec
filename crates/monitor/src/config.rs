//! monitor configuration

use std::path::Path;
use std::time::Duration;

use lendmirror_common::AssetDecimals;
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// runtime configuration, loadable from TOML
///
/// ```toml
/// poll_interval_secs = 15
/// chain_id = 11155111
///
/// [decimals]
/// collateral = 18
/// shares = 18
/// borrow = 6
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// seconds between polling refreshes
    pub poll_interval_secs: u64,
    /// upper bound for one batch of ledger reads
    pub read_timeout_secs: u64,
    /// chain the ledger lives on
    pub chain_id: u64,
    /// token decimals of the mirrored pool
    pub decimals: AssetDecimals,
    /// capacity of the ledger event queue
    pub event_buffer: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            read_timeout_secs: 10,
            chain_id: 11_155_111, // sepolia
            decimals: AssetDecimals::default(),
            event_buffer: 64,
        }
    }
}

impl MonitorConfig {
    pub fn from_toml_str(text: &str) -> MonitorResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| MonitorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> MonitorResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// decimals above 77 are already rejected while deserializing
    pub fn validate(&self) -> MonitorResult<()> {
        if self.poll_interval_secs == 0 {
            return Err(MonitorError::Config("poll_interval_secs must be positive".into()));
        }
        if self.read_timeout_secs == 0 {
            return Err(MonitorError::Config("read_timeout_secs must be positive".into()));
        }
        if self.event_buffer == 0 {
            return Err(MonitorError::Config("event_buffer must be positive".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}
