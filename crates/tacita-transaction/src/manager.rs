//! The transaction manager.
//!
//! Mediates every transaction flow between the enclave, the stores, and
//! the peer publisher. The manager holds no state of its own: each
//! operation is a bounded sequence of store reads, one enclave call, zero
//! or more publisher calls, and at most one store write, so operations
//! may run concurrently on independent threads.
//!
//! Within one `send`, persistence strictly precedes publication; within
//! one `store_payload`, validation strictly precedes persistence. There
//! is no ordering across operations.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use tacita_enclave::{Enclave, RawTransaction};
use tacita_encryption::{MessageHash, PublicKey};
use tacita_payload::{AffectedTransaction, EncodedPayload, PrivacyMode};
use tacita_store::{
    EncryptedRawTransaction, EncryptedTransaction, RawTransactionStore, TransactionStore,
};

use crate::privacy::{validate_privacy_mode, validate_recipients};
use crate::publish::PayloadPublisher;
use crate::resend::{ResendManager, ResendRequest, ResendResponse};
use crate::{ManagerConfig, Result, TransactionError};

/// A request to encrypt and distribute a new transaction.
#[derive(Clone, Debug)]
pub struct SendRequest {
    payload: Vec<u8>,
    sender: Option<PublicKey>,
    recipients: Vec<PublicKey>,
    privacy_mode: PrivacyMode,
    exec_hash: Vec<u8>,
    affected_transactions: Vec<MessageHash>,
}

impl SendRequest {
    /// Create a builder.
    pub fn builder() -> SendRequestBuilder {
        SendRequestBuilder::default()
    }
}

/// Builder for [`SendRequest`].
#[derive(Default)]
pub struct SendRequestBuilder {
    payload: Option<Vec<u8>>,
    sender: Option<PublicKey>,
    recipients: Vec<PublicKey>,
    privacy_mode: Option<PrivacyMode>,
    exec_hash: Vec<u8>,
    affected_transactions: Vec<MessageHash>,
}

impl SendRequestBuilder {
    /// Set the plaintext to encrypt.
    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Set the sending key. Defaults to the enclave's default key.
    pub fn sender(mut self, sender: PublicKey) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the recipients.
    pub fn recipients(mut self, recipients: Vec<PublicKey>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Set the privacy mode. Defaults to standard private.
    pub fn privacy_mode(mut self, privacy_mode: PrivacyMode) -> Self {
        self.privacy_mode = Some(privacy_mode);
        self
    }

    /// Set the execution hash (required under private state validation).
    pub fn exec_hash(mut self, exec_hash: Vec<u8>) -> Self {
        self.exec_hash = exec_hash;
        self
    }

    /// Set the affected contract transactions this send consumes.
    pub fn affected_transactions(mut self, hashes: Vec<MessageHash>) -> Self {
        self.affected_transactions = hashes;
        self
    }

    /// Build the request.
    pub fn build(self) -> SendRequest {
        SendRequest {
            payload: self.payload.unwrap_or_default(),
            sender: self.sender,
            recipients: self.recipients,
            privacy_mode: self.privacy_mode.unwrap_or(PrivacyMode::StandardPrivate),
            exec_hash: self.exec_hash,
            affected_transactions: self.affected_transactions,
        }
    }
}

/// A request to distribute a previously stored raw transaction.
#[derive(Clone, Debug)]
pub struct SendSignedRequest {
    transaction_hash: MessageHash,
    recipients: Vec<PublicKey>,
    privacy_mode: PrivacyMode,
    exec_hash: Vec<u8>,
    affected_transactions: Vec<MessageHash>,
}

impl SendSignedRequest {
    /// Create a builder for the given raw transaction hash.
    pub fn builder(transaction_hash: MessageHash) -> SendSignedRequestBuilder {
        SendSignedRequestBuilder {
            transaction_hash,
            recipients: Vec::new(),
            privacy_mode: None,
            exec_hash: Vec::new(),
            affected_transactions: Vec::new(),
        }
    }
}

/// Builder for [`SendSignedRequest`].
pub struct SendSignedRequestBuilder {
    transaction_hash: MessageHash,
    recipients: Vec<PublicKey>,
    privacy_mode: Option<PrivacyMode>,
    exec_hash: Vec<u8>,
    affected_transactions: Vec<MessageHash>,
}

impl SendSignedRequestBuilder {
    /// Set the recipients.
    pub fn recipients(mut self, recipients: Vec<PublicKey>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Set the privacy mode. Defaults to standard private.
    pub fn privacy_mode(mut self, privacy_mode: PrivacyMode) -> Self {
        self.privacy_mode = Some(privacy_mode);
        self
    }

    /// Set the execution hash (required under private state validation).
    pub fn exec_hash(mut self, exec_hash: Vec<u8>) -> Self {
        self.exec_hash = exec_hash;
        self
    }

    /// Set the affected contract transactions this send consumes.
    pub fn affected_transactions(mut self, hashes: Vec<MessageHash>) -> Self {
        self.affected_transactions = hashes;
        self
    }

    /// Build the request.
    pub fn build(self) -> SendSignedRequest {
        SendSignedRequest {
            transaction_hash: self.transaction_hash,
            recipients: self.recipients,
            privacy_mode: self.privacy_mode.unwrap_or(PrivacyMode::StandardPrivate),
            exec_hash: self.exec_hash,
            affected_transactions: self.affected_transactions,
        }
    }
}

/// The outcome of a send: the content address of the new transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendResponse {
    transaction_hash: MessageHash,
}

impl SendResponse {
    /// The hash of the stored transaction.
    pub fn transaction_hash(&self) -> &MessageHash {
        &self.transaction_hash
    }
}

/// A request to look up and decrypt a stored transaction.
#[derive(Clone, Debug)]
pub struct ReceiveRequest {
    transaction_hash: MessageHash,
    recipient: Option<PublicKey>,
    raw: bool,
}

impl ReceiveRequest {
    /// Request the transaction with the given hash.
    pub fn new(transaction_hash: MessageHash) -> Self {
        Self {
            transaction_hash,
            recipient: None,
            raw: false,
        }
    }

    /// Decrypt with a specific local key instead of searching.
    pub fn with_recipient(mut self, recipient: PublicKey) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Look up the pre-distribution raw form instead.
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }
}

/// A decrypted transaction and its privacy metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveResponse {
    payload: Vec<u8>,
    privacy_mode: PrivacyMode,
    affected_transactions: Vec<MessageHash>,
    exec_hash: Vec<u8>,
}

impl ReceiveResponse {
    /// The decrypted plaintext.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The transaction's privacy mode.
    pub fn privacy_mode(&self) -> PrivacyMode {
        self.privacy_mode
    }

    /// The affected contract transactions referenced by the payload.
    pub fn affected_transactions(&self) -> &[MessageHash] {
        &self.affected_transactions
    }

    /// The execution hash (empty outside private state validation).
    pub fn exec_hash(&self) -> &[u8] {
        &self.exec_hash
    }
}

/// A request to store a payload ahead of a later signed send.
#[derive(Clone, Debug)]
pub struct StoreRawRequest {
    payload: Vec<u8>,
    sender: Option<PublicKey>,
}

impl StoreRawRequest {
    /// Store `payload` under the enclave's default key.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            sender: None,
        }
    }

    /// Store under a specific sending key.
    pub fn with_sender(mut self, sender: PublicKey) -> Self {
        self.sender = Some(sender);
        self
    }
}

/// The outcome of a raw store: the content address of the raw record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreRawResponse {
    transaction_hash: MessageHash,
}

impl StoreRawResponse {
    /// The hash of the stored raw transaction.
    pub fn transaction_hash(&self) -> &MessageHash {
        &self.transaction_hash
    }
}

/// Mediator between the enclave, the stores, and the peer publisher.
pub struct TransactionManager {
    enclave: Arc<dyn Enclave>,
    transaction_store: Arc<dyn TransactionStore>,
    raw_transaction_store: Arc<dyn RawTransactionStore>,
    publisher: Arc<dyn PayloadPublisher>,
    resend_manager: Arc<dyn ResendManager>,
    resend_fetch_size: usize,
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("resend_fetch_size", &self.resend_fetch_size)
            .finish_non_exhaustive()
    }
}

impl TransactionManager {
    /// Create a manager over the given collaborators.
    pub fn new(
        enclave: Arc<dyn Enclave>,
        transaction_store: Arc<dyn TransactionStore>,
        raw_transaction_store: Arc<dyn RawTransactionStore>,
        publisher: Arc<dyn PayloadPublisher>,
        resend_manager: Arc<dyn ResendManager>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            enclave,
            transaction_store,
            raw_transaction_store,
            publisher,
            resend_manager,
            resend_fetch_size: config.resend_fetch_size(),
        }
    }

    /// Encrypt, persist and distribute a new transaction.
    ///
    /// The recipient list is the request's recipients plus the sender and
    /// the enclave's forwarding keys, deduplicated in first-seen order.
    /// Persistence strictly precedes publication, and a failed publish to
    /// one recipient never rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Fails with [`TransactionError::PrivacyViolation`] if an affected
    /// transaction cannot be resolved, carries a different privacy mode,
    /// or (under private state validation) a different recipient set.
    pub fn send(&self, request: &SendRequest) -> Result<SendResponse> {
        let sender = request
            .sender
            .clone()
            .unwrap_or_else(|| self.enclave.default_public_key());

        let mut recipient_list = request.recipients.clone();
        recipient_list.push(sender.clone());
        recipient_list.extend(self.enclave.forwarding_keys());
        let recipients = dedup_first_seen(&recipient_list);

        let affected = self.build_affected(&request.affected_transactions)?;
        validate_privacy_mode(request.privacy_mode, &affected)?;
        if request.privacy_mode == PrivacyMode::PrivateStateValidation {
            validate_recipients(&recipient_list, &affected)?;
        }

        let payload = self.enclave.encrypt_payload(
            &request.payload,
            &sender,
            &recipients,
            request.privacy_mode,
            &affected,
            &request.exec_hash,
        )?;

        let transaction_hash = payload.transaction_hash();
        self.transaction_store.save(&EncryptedTransaction::new(
            transaction_hash.clone(),
            payload.to_bytes()?,
        ))?;

        self.publish(&recipients, &payload);

        Ok(SendResponse { transaction_hash })
    }

    /// Distribute a previously stored raw transaction.
    ///
    /// The plaintext and sender come from the raw record; the resulting
    /// payload reuses the raw ciphertext, so the returned hash equals the
    /// raw transaction's hash.
    ///
    /// # Errors
    ///
    /// Fails with [`TransactionError::TransactionNotFound`] if no raw
    /// record exists under the hash, and with the same privacy errors as
    /// [`TransactionManager::send`].
    pub fn send_signed(&self, request: &SendSignedRequest) -> Result<SendResponse> {
        let raw = self
            .raw_transaction_store
            .retrieve_by_hash(&request.transaction_hash)?
            .ok_or_else(|| {
                TransactionError::TransactionNotFound(request.transaction_hash.clone())
            })?;
        let sender = raw.sender().clone();

        let mut recipient_list = request.recipients.clone();
        recipient_list.extend(self.enclave.forwarding_keys());
        recipient_list.push(sender);
        let recipients = dedup_first_seen(&recipient_list);

        let affected = self.build_affected(&request.affected_transactions)?;
        validate_privacy_mode(request.privacy_mode, &affected)?;
        if request.privacy_mode == PrivacyMode::PrivateStateValidation {
            validate_recipients(&recipient_list, &affected)?;
        }

        let raw_transaction = RawTransaction::new(
            raw.encrypted_payload().to_vec(),
            raw.encrypted_key().to_vec(),
            raw.nonce().clone(),
            raw.sender().clone(),
        );
        let payload = self.enclave.encrypt_from_raw(
            &raw_transaction,
            &recipients,
            request.privacy_mode,
            &affected,
            &request.exec_hash,
        )?;

        let transaction_hash = payload.transaction_hash();
        self.transaction_store.save(&EncryptedTransaction::new(
            transaction_hash.clone(),
            payload.to_bytes()?,
        ))?;

        self.publish(&recipients, &payload);

        Ok(SendResponse { transaction_hash })
    }

    /// Accept a payload pushed by a peer.
    ///
    /// Unverifiable inbound references answer with the transaction hash
    /// and persist nothing, so a probing peer cannot distinguish "not
    /// held" from "held": an affected transaction with a different
    /// privacy mode, an affected transaction this node does not hold
    /// (under private state validation), and a sender who is not a
    /// participant of the affected transactions all take that path.
    ///
    /// # Errors
    ///
    /// Under private state validation, a mismatched recipient set or an
    /// invalid security hash is a hard [`TransactionError::PrivacyViolation`].
    pub fn store_payload(&self, input: &[u8]) -> Result<MessageHash> {
        let payload = EncodedPayload::from_bytes(input)?;
        let transaction_hash = payload.transaction_hash();
        let privacy_mode = payload.privacy_mode();

        // Resolve against the local store only; unknown hashes drop out.
        let affected = self.resolve_affected(&payload.affected_hashes())?;

        if affected
            .iter()
            .any(|a| a.payload().privacy_mode() != privacy_mode)
        {
            debug!(
                hash = %transaction_hash,
                "Privacy flag mismatched with affected transactions, ignoring payload"
            );
            return Ok(transaction_hash);
        }

        if privacy_mode == PrivacyMode::PrivateStateValidation {
            if affected.len() != payload.affected_contract_transactions().len() {
                info!(
                    hash = %transaction_hash,
                    "Not all affected transactions were found for inbound payload, ignoring"
                );
                return Ok(transaction_hash);
            }

            let sender_is_participant = affected
                .iter()
                .any(|a| a.payload().recipient_keys().contains(payload.sender_key()));
            if !sender_is_participant {
                debug!(
                    hash = %transaction_hash,
                    "Sender is not a participant of the affected transactions, ignoring payload"
                );
                return Ok(transaction_hash);
            }

            validate_recipients(payload.recipient_keys(), &affected)?;
        }

        let invalid = self.enclave.find_invalid_security_hashes(&payload, &affected);
        let sanitized = if invalid.is_empty() {
            input.to_vec()
        } else {
            if privacy_mode == PrivacyMode::PrivateStateValidation {
                let invalid_list = invalid
                    .iter()
                    .map(MessageHash::encode_to_base64)
                    .collect::<Vec<_>>()
                    .join(",");
                return Err(TransactionError::PrivacyViolation(format!(
                    "Invalid security hashes identified for transaction {}. Invalid affected transactions: {}",
                    transaction_hash.encode_to_base64(),
                    invalid_list
                )));
            }
            debug!(
                hash = %transaction_hash,
                discarded = invalid.len(),
                "Discarding affected transaction entries with invalid security hashes"
            );
            payload.without_affected(&invalid).to_bytes()?
        };

        if self.enclave.public_keys().contains(payload.sender_key()) {
            // Our own message coming back from a peer during catch-up.
            self.resend_manager.accept_own_message(&sanitized)?;
        } else {
            self.transaction_store
                .save(&EncryptedTransaction::new(transaction_hash.clone(), sanitized))?;
            info!(hash = %transaction_hash, "Stored payload");
        }

        Ok(transaction_hash)
    }

    /// Look up and decrypt a stored transaction.
    ///
    /// With no explicit recipient, every local key is tried in the
    /// enclave's key order and the first that decrypts wins. The raw
    /// variant reads the pre-distribution record and always reports
    /// standard private with no affected data, as a raw record has no
    /// shared privacy metadata yet.
    ///
    /// # Errors
    ///
    /// Fails with [`TransactionError::TransactionNotFound`] if the record
    /// is absent and [`TransactionError::RecipientKeyNotFound`] if no
    /// local key decrypts the payload.
    pub fn receive(&self, request: &ReceiveRequest) -> Result<ReceiveResponse> {
        let hash = &request.transaction_hash;

        if request.raw {
            let raw = self
                .raw_transaction_store
                .retrieve_by_hash(hash)?
                .ok_or_else(|| TransactionError::TransactionNotFound(hash.clone()))?;
            let raw_transaction = RawTransaction::new(
                raw.encrypted_payload().to_vec(),
                raw.encrypted_key().to_vec(),
                raw.nonce().clone(),
                raw.sender().clone(),
            );
            let payload = self.enclave.unencrypt_raw_payload(&raw_transaction)?;
            return Ok(ReceiveResponse {
                payload,
                privacy_mode: PrivacyMode::StandardPrivate,
                affected_transactions: Vec::new(),
                exec_hash: Vec::new(),
            });
        }

        debug!(hash = %hash, "Lookup transaction");
        let payload = self.fetch_payload(hash)?;

        let recipient_key = match &request.recipient {
            Some(key) => key.clone(),
            None => self
                .search_for_recipient_key(&payload)
                .ok_or_else(|| TransactionError::RecipientKeyNotFound(hash.clone()))?,
        };

        let plain_text = self.enclave.unencrypt_transaction(&payload, &recipient_key)?;

        Ok(ReceiveResponse {
            payload: plain_text,
            privacy_mode: payload.privacy_mode(),
            affected_transactions: payload.affected_hashes(),
            exec_hash: payload.exec_hash().to_vec(),
        })
    }

    /// Replay stored transactions for a peer.
    ///
    /// The full scan pages through the store, skipping records that fail
    /// to decode or whose recipient cannot be recovered; one bad record
    /// never aborts the scan. The individual variant returns the encoded
    /// projection synchronously and publishes nothing.
    ///
    /// # Errors
    ///
    /// The individual variant fails with
    /// [`TransactionError::TransactionNotFound`] for an unknown hash and
    /// [`TransactionError::RecipientKeyNotFound`] when the sender-side
    /// recipient cannot be recovered.
    pub fn resend(&self, request: &ResendRequest) -> Result<ResendResponse> {
        match request {
            ResendRequest::All { recipient } => {
                self.resend_all(recipient)?;
                Ok(ResendResponse::empty())
            }
            ResendRequest::Individual { recipient, hash } => {
                let payload = self.resend_individual(recipient, hash)?;
                Ok(ResendResponse::with_payload(payload.to_bytes()?))
            }
        }
    }

    fn resend_all(&self, recipient: &PublicKey) -> Result<()> {
        let local_keys = self.enclave.public_keys();
        let fetch_size = self.resend_fetch_size.max(1);

        let mut offset = 0;
        while offset < self.transaction_store.transaction_count()? {
            for record in self
                .transaction_store
                .retrieve_transactions(offset, fetch_size)?
            {
                let payload = match EncodedPayload::from_bytes(record.encoded_payload()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(
                            hash = %record.hash(),
                            error = %e,
                            "Skipping undecodable stored transaction during resend"
                        );
                        continue;
                    }
                };

                let is_recipient = payload.recipient_keys().contains(recipient);
                let is_sender = payload.sender_key() == recipient;
                if !is_recipient && !is_sender {
                    continue;
                }

                let outgoing = if is_sender {
                    if payload.recipient_keys().is_empty() {
                        // A payload stored without its recipient labels:
                        // recover our own recipient before handing the
                        // sender back its transaction.
                        match self.search_for_recipient_key(&payload) {
                            Some(key) => payload.with_recipient(key),
                            None => {
                                warn!(
                                    hash = %payload.transaction_hash(),
                                    "No key found as recipient of transaction, skipping resend"
                                );
                                continue;
                            }
                        }
                    } else {
                        payload
                    }
                } else {
                    match payload.for_recipient(recipient) {
                        Ok(projected) => projected,
                        Err(e) => {
                            warn!(
                                hash = %payload.transaction_hash(),
                                error = %e,
                                "Skipping unprojectable transaction during resend"
                            );
                            continue;
                        }
                    }
                };

                if local_keys.contains(recipient) {
                    continue;
                }
                if let Err(e) = self.publisher.publish_payload(&outgoing, recipient) {
                    warn!(
                        recipient = %recipient.encode_to_base64(),
                        error = %e,
                        "Unable to publish payload during resend"
                    );
                }
            }
            offset += fetch_size;
        }
        Ok(())
    }

    fn resend_individual(
        &self,
        recipient: &PublicKey,
        hash: &MessageHash,
    ) -> Result<EncodedPayload> {
        let payload = self.fetch_payload(hash)?;

        if payload.sender_key() == recipient {
            if payload.recipient_keys().is_empty() {
                let key = self
                    .search_for_recipient_key(&payload)
                    .ok_or_else(|| TransactionError::RecipientKeyNotFound(hash.clone()))?;
                Ok(payload.with_recipient(key))
            } else {
                Ok(payload)
            }
        } else {
            Ok(payload.for_recipient(recipient)?)
        }
    }

    /// Encrypt and persist a raw transaction ahead of a signed send.
    pub fn store_raw(&self, request: &StoreRawRequest) -> Result<StoreRawResponse> {
        let sender = request
            .sender
            .clone()
            .unwrap_or_else(|| self.enclave.default_public_key());

        let raw = self.enclave.encrypt_raw_payload(&request.payload, &sender)?;
        let transaction_hash = MessageHash::from_cipher_text(raw.encrypted_payload());

        self.raw_transaction_store.save(&EncryptedRawTransaction::new(
            transaction_hash.clone(),
            raw.encrypted_payload().to_vec(),
            raw.encrypted_key().to_vec(),
            raw.nonce().clone(),
            raw.from().clone(),
        ))?;

        Ok(StoreRawResponse { transaction_hash })
    }

    /// Delete a stored transaction. Deleting an absent hash succeeds.
    pub fn delete(&self, hash: &MessageHash) -> Result<()> {
        info!(hash = %hash, "Received request to delete transaction");
        self.transaction_store.delete(hash)?;
        Ok(())
    }

    /// Whether the stored transaction was sent by a locally held key.
    ///
    /// # Errors
    ///
    /// Fails with [`TransactionError::TransactionNotFound`] if the record
    /// is absent.
    pub fn is_sender(&self, hash: &MessageHash) -> Result<bool> {
        let payload = self.fetch_payload(hash)?;
        Ok(self.enclave.public_keys().contains(payload.sender_key()))
    }

    /// The recipient keys of a stored transaction, sender included when
    /// present.
    ///
    /// # Errors
    ///
    /// Fails with [`TransactionError::TransactionNotFound`] if the record
    /// is absent.
    pub fn participants(&self, hash: &MessageHash) -> Result<Vec<PublicKey>> {
        let payload = self.fetch_payload(hash)?;
        Ok(payload.recipient_keys().to_vec())
    }

    /// Project and deliver `payload` to every remote recipient.
    ///
    /// Recipients whose keys are held locally are skipped. Delivery
    /// failures are logged per recipient and never surfaced.
    fn publish(&self, recipients: &[PublicKey], payload: &EncodedPayload) {
        let local_keys = self.enclave.public_keys();
        for recipient in recipients.iter().filter(|r| !local_keys.contains(r)) {
            let outgoing = match payload.for_recipient(recipient) {
                Ok(projected) => projected,
                Err(e) => {
                    warn!(
                        recipient = %recipient.encode_to_base64(),
                        error = %e,
                        "Unable to project payload for recipient"
                    );
                    continue;
                }
            };
            if let Err(e) = self.publisher.publish_payload(&outgoing, recipient) {
                warn!(
                    recipient = %recipient.encode_to_base64(),
                    error = %e,
                    "Unable to publish payload to recipient"
                );
            }
        }
    }

    /// Resolve affected hashes, requiring every one to be present.
    fn build_affected(&self, hashes: &[MessageHash]) -> Result<Vec<AffectedTransaction>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.transaction_store.find_by_hashes(hashes)?;
        let found: HashSet<&MessageHash> = records.iter().map(|r| r.hash()).collect();
        if let Some(missing) = hashes.iter().find(|h| !found.contains(h)) {
            return Err(TransactionError::PrivacyViolation(format!(
                "Unable to find affectedContractTransaction {}",
                missing.encode_to_base64()
            )));
        }

        records
            .into_iter()
            .map(|record| {
                let payload = EncodedPayload::from_bytes(record.encoded_payload())?;
                Ok(AffectedTransaction::new(record.hash().clone(), payload))
            })
            .collect()
    }

    /// Resolve affected hashes against the local store, dropping unknown
    /// hashes silently.
    fn resolve_affected(&self, hashes: &[MessageHash]) -> Result<Vec<AffectedTransaction>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }
        self.transaction_store
            .find_by_hashes(hashes)?
            .into_iter()
            .map(|record| {
                let payload = EncodedPayload::from_bytes(record.encoded_payload())?;
                Ok(AffectedTransaction::new(record.hash().clone(), payload))
            })
            .collect()
    }

    /// Try every local key against the payload; first success wins.
    fn search_for_recipient_key(&self, payload: &EncodedPayload) -> Option<PublicKey> {
        for key in self.enclave.public_keys() {
            match self.enclave.unencrypt_transaction(payload, &key) {
                Ok(_) => return Some(key),
                Err(_) => {
                    debug!("Attempted payload decryption using wrong key, discarding");
                }
            }
        }
        None
    }

    fn fetch_payload(&self, hash: &MessageHash) -> Result<EncodedPayload> {
        let record = self
            .transaction_store
            .retrieve_by_hash(hash)?
            .ok_or_else(|| TransactionError::TransactionNotFound(hash.clone()))?;
        Ok(EncodedPayload::from_bytes(record.encoded_payload())?)
    }
}

/// Deduplicate keys preserving first-seen order.
fn dedup_first_seen(keys: &[PublicKey]) -> Vec<PublicKey> {
    let mut seen = HashSet::new();
    keys.iter()
        .filter(|key| seen.insert((*key).clone()))
        .cloned()
        .collect()
}
