//! # tacita-payload
//!
//! The on-wire and at-rest unit of the Tacita transaction manager.
//!
//! An [`EncodedPayload`] carries a ciphertext, its nonces, one sealed
//! master-key box per recipient, a privacy mode, and the security hashes
//! binding the transaction to prior *affected* transactions. The codec is
//! byte-stable: encoding the same payload value always yields the same
//! bytes, and decode validates structure before handing a payload to the
//! manager.
//!
//! ## Payload structure
//!
//! ```text
//! +---------------------------+
//! | sender_key                | 32 bytes
//! | cipher_text               | variable, hashes to the tx address
//! | cipher_text_nonce         | 24 bytes
//! | recipient_boxes           | one sealed master key per recipient
//! | recipient_nonce           | 24 bytes, shared by all boxes
//! | recipient_keys            | positional match with boxes; may be
//! |                           | empty on a non-originating node
//! | privacy_mode              | 1-byte wire flag
//! | affected txns             | (hash, security hash) pairs, ordered
//! | exec_hash                 | non-empty only under private
//! |                           | state validation
//! +---------------------------+
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod affected;
pub mod error;
pub mod payload;
pub mod privacy_mode;

pub use affected::AffectedTransaction;
pub use error::{PayloadError, Result};
pub use payload::{EncodedPayload, EncodedPayloadBuilder, SecurityHash};
pub use privacy_mode::PrivacyMode;
