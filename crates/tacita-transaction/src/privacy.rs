//! Privacy-mode validation.
//!
//! Two pure checks over a transaction's recipient list and its resolved
//! affected transactions. Both report the first offender in the order the
//! affected set was resolved, which is the store's return order for the
//! requested hashes, so a failing request names the same transaction on
//! every node.

use std::collections::HashSet;

use tacita_encryption::PublicKey;
use tacita_payload::{AffectedTransaction, PrivacyMode};

use crate::{Result, TransactionError};

/// Require every affected transaction to carry the new transaction's
/// privacy mode.
///
/// Applies regardless of mode: a standard-private transaction may not
/// consume state from a validated one, and vice versa.
///
/// # Errors
///
/// Returns [`TransactionError::PrivacyViolation`] naming the first
/// affected transaction whose mode differs.
pub fn validate_privacy_mode(
    privacy_mode: PrivacyMode,
    affected: &[AffectedTransaction],
) -> Result<()> {
    if let Some(mismatch) = affected
        .iter()
        .find(|a| a.payload().privacy_mode() != privacy_mode)
    {
        return Err(TransactionError::PrivacyViolation(format!(
            "Privacy flag mismatched with affected transaction {}",
            mismatch.hash().encode_to_base64()
        )));
    }
    Ok(())
}

/// Require every affected transaction to share the recipient set.
///
/// Only meaningful under private state validation: all parties to the
/// affected state must also be parties to the transaction consuming it.
/// Comparison is as sets; order and duplicates are ignored.
///
/// # Errors
///
/// Returns [`TransactionError::PrivacyViolation`] naming the first
/// affected transaction whose recipient set differs.
pub fn validate_recipients(
    recipients: &[PublicKey],
    affected: &[AffectedTransaction],
) -> Result<()> {
    let current: HashSet<&PublicKey> = recipients.iter().collect();
    if let Some(mismatch) = affected.iter().find(|a| {
        let theirs: HashSet<&PublicKey> = a.payload().recipient_keys().iter().collect();
        theirs != current
    }) {
        return Err(TransactionError::PrivacyViolation(format!(
            "Recipients mismatched for affected transaction {}",
            mismatch.hash().encode_to_base64()
        )));
    }
    Ok(())
}
