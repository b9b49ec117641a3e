//! Privacy modes.
//!
//! A transaction's privacy mode is chosen at send time, travels on the
//! wire as a one-byte flag, and is immutable after encryption. The mode
//! decides which cross-transaction invariants the validator enforces.

use serde::{Deserialize, Serialize};

use crate::{PayloadError, Result};

/// The privacy policy of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivacyMode {
    /// Peer-to-peer encryption with no cross-transaction invariants.
    StandardPrivate,

    /// Private state validation: every affected transaction must share
    /// this transaction's recipient set, and a non-empty execution hash
    /// is required.
    PrivateStateValidation,
}

impl PrivacyMode {
    /// The wire flag for this mode.
    pub fn flag(&self) -> u8 {
        match self {
            PrivacyMode::StandardPrivate => 0,
            PrivacyMode::PrivateStateValidation => 3,
        }
    }

    /// Resolve a wire flag to a mode.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::UnknownPrivacyFlag` for flags outside the
    /// closed set.
    pub fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            0 => Ok(PrivacyMode::StandardPrivate),
            3 => Ok(PrivacyMode::PrivateStateValidation),
            other => Err(PayloadError::UnknownPrivacyFlag(other)),
        }
    }
}
