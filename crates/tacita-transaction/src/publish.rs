//! The peer publisher contract.

use tacita_encryption::PublicKey;
use tacita_payload::EncodedPayload;
use thiserror::Error;

/// Errors raised by a publisher implementation.
///
/// The manager logs these and moves on; a failed delivery never rolls
/// back persistence or aborts a resend scan.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The payload could not be delivered to the recipient's node.
    #[error("Unable to deliver payload to {recipient}: {reason}")]
    Delivery {
        /// The target recipient, base64 encoded.
        recipient: String,
        /// Why delivery failed.
        reason: String,
    },
}

/// Delivers a projected payload to the node holding `recipient`.
///
/// Implementations own routing, transport, and their own timeouts; the
/// manager calls this synchronously once per remote recipient and treats
/// any error as best-effort delivery having failed.
pub trait PayloadPublisher: Send + Sync {
    /// Deliver `payload` to the node holding `recipient`.
    fn publish_payload(
        &self,
        payload: &EncodedPayload,
        recipient: &PublicKey,
    ) -> std::result::Result<(), PublishError>;
}
