//! Manager configuration.

use serde::{Deserialize, Serialize};

/// Default page size for the resend scan.
const DEFAULT_RESEND_FETCH_SIZE: usize = 100;

/// Configuration for the transaction manager.
///
/// # Example
///
/// ```
/// use tacita_transaction::ManagerConfig;
///
/// let config = ManagerConfig::default().with_resend_fetch_size(250);
/// assert_eq!(config.resend_fetch_size(), 250);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagerConfig {
    resend_fetch_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            resend_fetch_size: DEFAULT_RESEND_FETCH_SIZE,
        }
    }
}

impl ManagerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resend page size. Values below one are clamped to one so
    /// the resend scan always makes progress.
    pub fn with_resend_fetch_size(mut self, size: usize) -> Self {
        self.resend_fetch_size = size.max(1);
        self
    }

    /// The number of records loaded per resend page.
    pub fn resend_fetch_size(&self) -> usize {
        self.resend_fetch_size
    }
}
