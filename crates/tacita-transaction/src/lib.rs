//! # tacita-transaction
//!
//! The mediator at the centre of a Tacita node.
//!
//! The [`TransactionManager`] normalises every transaction flow between
//! the enclave, the stores, and the peer publisher:
//!
//! - **send / send_signed**: seal a payload for a recipient set, persist
//!   it under its content hash, and project it to every remote recipient
//! - **store_payload**: accept a payload from a peer, enforce the privacy
//!   invariants, and persist or silently drop it
//! - **receive**: look up and open a stored transaction with a local key
//! - **resend**: replay stored transactions to a peer, either as a full
//!   paged scan or as a single synchronous record
//!
//! ## Privacy model
//!
//! Every transaction carries a privacy mode. Under private state
//! validation the manager additionally requires each referenced affected
//! transaction to share the new transaction's recipient set, and responds
//! to unverifiable inbound references with silent success so a probing
//! peer cannot learn which transactions this node holds.
//!
//! ## Collaborators
//!
//! ```text
//!                 +-----------------+
//!                 | TransactionMgr  |
//!                 +-----------------+
//!                  /    |     |    \
//!                 v     v     v     v
//!           Enclave  Stores  Publisher  ResendManager
//! ```
//!
//! All collaborators are injected as `Arc<dyn Trait>`; the manager itself
//! holds no mutable state and every operation is a bounded sequence of
//! store reads, one enclave call, and at most one store write.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod manager;
pub mod privacy;
pub mod publish;
pub mod resend;

pub use config::ManagerConfig;
pub use error::{Result, TransactionError};
pub use manager::{
    ReceiveRequest, ReceiveResponse, SendRequest, SendRequestBuilder, SendResponse,
    SendSignedRequest, SendSignedRequestBuilder, StoreRawRequest, StoreRawResponse,
    TransactionManager,
};
pub use publish::{PayloadPublisher, PublishError};
pub use resend::{ResendManager, ResendManagerImpl, ResendRequest, ResendResponse};
