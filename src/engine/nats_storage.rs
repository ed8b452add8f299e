// NATS storage implementation for employee documents and id sequences
// This provides durable storage using NATS JetStream

//! # NATS Storage Implementation
//!
//! This module backs [`DocumentStorage`] with NATS JetStream.
//!
//! ## Layout
//!
//! - **Documents**: a key-value bucket (default `employees`). The key is the
//!   decimal employee id, the value the JSON encoded [`EmployeeDocument`].
//! - **Counters**: one stream per sequence name, `EMPLOYEE_SEQ_<name>`, bound to
//!   the subject `employee.seq.<name>` and retaining a single message. The name
//!   is used verbatim, so only names accepted by
//!   [`validate_sequence_name`] are allowed.
//!
//! ## Counters
//!
//! JetStream assigns every stored message the next stream sequence number on
//! the server, and the publish acknowledgment carries that number back. So a
//! publish is an increment-and-return performed atomically by the server:
//! concurrent publishers always receive distinct, consecutive values. The stream
//! is created on first use and its first sequence is 1. Only the newest message
//! is retained, but the sequence keeps counting.
//!
//! ## Writes to documents
//!
//! - inserts use the bucket's `create`, which fails if the key holds a value
//! - field updates and deletes are a compare-and-set against the entry
//!   revision. An update racing with a delete cannot bring the document back,
//!   and of two racing deletes only one reports a deleted document.

use std::collections::HashSet;
use std::sync::Arc;

use async_nats::jetstream::context::GetStreamErrorKind;
use async_nats::jetstream::{self, kv, stream, Context, ErrorCode};
use bytes::Bytes;
use futures::TryStreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::engine::document::{DocumentStorage, EmployeeCollection, EmployeeDocument};
use crate::engine::sequence::{validate_sequence_name, SequenceCounter};
use crate::models::EmployeeInput;
use crate::Result;

/// Configuration for NATS storage
#[derive(Debug, Clone)]
pub struct NATSStorageConfig {
    /// NATS server URLs
    pub nats_urls: Vec<String>,

    /// Key-value bucket holding employee documents
    pub bucket: String,

    /// Revisions kept per document key
    pub history: i64,

    /// Prefix of the per-counter stream names
    pub counter_stream_prefix: String,
}

impl Default for NATSStorageConfig {
    fn default() -> Self {
        Self {
            nats_urls: vec!["nats://localhost:4222".to_string()],
            bucket: "employees".to_string(),
            history: 1,
            counter_stream_prefix: "EMPLOYEE_SEQ".to_string(),
        }
    }
}

/// Sequence counters backed by JetStream stream sequences
pub struct NATSSequenceCounter {
    jetstream: Context,
    stream_prefix: String,
    known_streams: Mutex<HashSet<String>>,
}

impl NATSSequenceCounter {
    pub fn new(jetstream: Context, stream_prefix: impl Into<String>) -> Self {
        Self {
            jetstream,
            stream_prefix: stream_prefix.into(),
            known_streams: Mutex::new(HashSet::new()),
        }
    }

    /// Stream that carries the counter `name`
    pub fn stream_name(&self, name: &str) -> Result<String> {
        validate_sequence_name(name)?;
        Ok(format!("{}_{}", self.stream_prefix, name))
    }

    /// Subject published to when `name` is incremented
    pub fn subject(name: &str) -> Result<String> {
        validate_sequence_name(name)?;
        Ok(format!("employee.seq.{}", name))
    }

    /// Ensure the counter stream exists (with caching)
    async fn ensure_stream(&self, name: &str) -> Result<()> {
        let stream_name = self.stream_name(name)?;

        let mut known = self.known_streams.lock().await;
        if known.contains(&stream_name) {
            return Ok(());
        }

        let config = stream::Config {
            name: stream_name.clone(),
            subjects: vec![Self::subject(name)?],
            max_messages: 1,
            storage: stream::StorageType::File,
            num_replicas: 1,
            retention: stream::RetentionPolicy::Limits,
            discard: stream::DiscardPolicy::Old,
            ..Default::default()
        };

        self.jetstream
            .get_or_create_stream(config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create counter stream {}: {}", stream_name, e))?;

        debug!("Counter stream {} ready", stream_name);
        known.insert(stream_name);
        Ok(())
    }
}

#[async_trait::async_trait]
impl SequenceCounter for NATSSequenceCounter {
    async fn next_sequence(&self, name: &str) -> Result<i64> {
        self.ensure_stream(name).await?;

        let ack = self
            .jetstream
            .publish(Self::subject(name)?, Bytes::new())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to publish to counter {}: {}", name, e))?
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get counter {} acknowledgment: {}", name, e))?;

        debug!("Counter {} advanced to {}", name, ack.sequence);
        Ok(ack.sequence as i64)
    }

    async fn current_sequence(&self, name: &str) -> Result<i64> {
        let stream_name = self.stream_name(name)?;

        let mut stream = match self.jetstream.get_stream(&stream_name).await {
            Ok(stream) => stream,
            Err(e) => {
                // A counter that was never incremented has no stream yet
                if is_stream_not_found(&e.kind()) {
                    return Ok(0);
                }
                return Err(anyhow::anyhow!("Failed to get counter stream {}: {}", stream_name, e).into());
            }
        };

        let info = stream
            .info()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get counter stream info: {}", e))?;
        Ok(info.state.last_sequence as i64)
    }
}

fn is_stream_not_found(kind: &GetStreamErrorKind) -> bool {
    matches!(kind, GetStreamErrorKind::JetStream(err) if err.error_code() == ErrorCode::STREAM_NOT_FOUND)
}

/// What a failed revision-conditioned write saw when it read the key again
#[derive(Debug, PartialEq, Eq)]
enum Conflict {
    /// The document is gone
    Deleted,
    /// Another writer changed the document; try again on the new revision
    Changed,
    /// Nothing moved, so the write failed for another reason
    Unchanged,
}

impl Conflict {
    fn classify(expected_revision: u64, current_revision: Option<u64>) -> Self {
        match current_revision {
            None => Conflict::Deleted,
            Some(revision) if revision != expected_revision => Conflict::Changed,
            Some(_) => Conflict::Unchanged,
        }
    }
}

/// Employee documents in a JetStream key-value bucket
pub struct NATSEmployeeCollection {
    store: kv::Store,
}

impl NATSEmployeeCollection {
    pub fn new(store: kv::Store) -> Self {
        Self { store }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let keys = self
            .store
            .keys()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list employee keys: {}", e))?;

        let keys: Vec<String> = keys
            .try_collect()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read employee keys: {}", e))?;
        Ok(keys)
    }

    /// Delete every document; returns how many were deleted
    ///
    /// Counters are left alone, so ids are not reused afterwards.
    pub async fn delete_all(&self) -> Result<u64> {
        let mut deleted = 0;
        for key in self.keys().await? {
            self.store
                .delete(&key)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to delete employee {}: {}", key, e))?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Current entry for `key`, or `None` if it is missing or deleted
    async fn live_entry(&self, key: &str) -> Result<Option<kv::Entry>> {
        let entry = self
            .store
            .entry(key)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get employee {}: {}", key, e))?;

        // Tombstones are returned as entries too
        Ok(entry.filter(|entry| matches!(entry.operation, kv::Operation::Put)))
    }

    fn encode(doc: &EmployeeDocument) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(doc)?))
    }
}

#[async_trait::async_trait]
impl EmployeeCollection for NATSEmployeeCollection {
    async fn find_all(&self) -> Result<Vec<EmployeeDocument>> {
        let mut documents = Vec::new();
        for key in self.keys().await? {
            let value = self
                .store
                .get(&key)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to get employee {}: {}", key, e))?;

            // Deleted between listing and reading
            if let Some(value) = value {
                documents.push(serde_json::from_slice(&value)?);
            }
        }
        Ok(documents)
    }

    async fn find_one(&self, id: i64) -> Result<Option<EmployeeDocument>> {
        let value = self
            .store
            .get(id.to_string())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get employee {}: {}", id, e))?;

        match value {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn insert_one(&self, doc: EmployeeDocument) -> Result<()> {
        let payload = Self::encode(&doc)?;
        self.store
            .create(doc.id.to_string(), payload)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert employee {}: {}", doc.id, e))?;
        Ok(())
    }

    async fn set_fields(&self, id: i64, fields: EmployeeInput) -> Result<Option<EmployeeDocument>> {
        let key = id.to_string();

        let entry = match self.live_entry(&key).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let mut doc: EmployeeDocument = serde_json::from_slice(&entry.value)?;
        doc.set_fields(fields);

        self.store
            .update(key.as_str(), Self::encode(&doc)?, entry.revision)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update employee {}: {}", id, e))?;
        Ok(Some(doc))
    }

    async fn delete_one(&self, id: i64) -> Result<u64> {
        let key = id.to_string();

        loop {
            let revision = match self.live_entry(&key).await? {
                Some(entry) => entry.revision,
                None => return Ok(0),
            };

            let err = match self.store.delete_expect_revision(key.as_str(), Some(revision)).await {
                Ok(()) => return Ok(1),
                Err(err) => err,
            };

            let current = self.live_entry(&key).await?.map(|entry| entry.revision);
            match Conflict::classify(revision, current) {
                Conflict::Deleted => return Ok(0),
                Conflict::Changed => debug!("Employee {} changed during delete, retrying", id),
                Conflict::Unchanged => {
                    return Err(anyhow::anyhow!("Failed to delete employee {}: {}", id, err).into())
                }
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.keys().await?.len() as u64)
    }
}

/// NATS JetStream storage: document collection plus sequence counters
pub struct NATSStorage {
    config: NATSStorageConfig,
    collection: Arc<NATSEmployeeCollection>,
    sequence: Arc<NATSSequenceCounter>,
}

impl NATSStorage {
    /// Connect to NATS and open (or create) the employee bucket
    pub async fn new(config: NATSStorageConfig) -> Result<Self> {
        let client = async_nats::connect(&config.nats_urls.join(","))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to NATS: {}", e))?;

        let jetstream = jetstream::new(client);
        let store = Self::open_bucket(&jetstream, &config).await?;

        info!("Connected to NATS, employee bucket '{}'", config.bucket);

        Ok(Self {
            collection: Arc::new(NATSEmployeeCollection::new(store)),
            sequence: Arc::new(NATSSequenceCounter::new(
                jetstream,
                config.counter_stream_prefix.clone(),
            )),
            config,
        })
    }

    async fn open_bucket(jetstream: &Context, config: &NATSStorageConfig) -> Result<kv::Store> {
        if let Ok(store) = jetstream.get_key_value(config.bucket.as_str()).await {
            return Ok(store);
        }

        info!("Creating key-value bucket '{}'", config.bucket);
        let store = jetstream
            .create_key_value(kv::Config {
                bucket: config.bucket.clone(),
                history: config.history,
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create bucket {}: {}", config.bucket, e))?;
        Ok(store)
    }

    pub fn config(&self) -> &NATSStorageConfig {
        &self.config
    }

    pub fn collection(&self) -> Arc<NATSEmployeeCollection> {
        self.collection.clone()
    }

    pub fn sequence(&self) -> Arc<NATSSequenceCounter> {
        self.sequence.clone()
    }

    /// The employee store backed by this connection
    pub fn document_storage(&self) -> DocumentStorage {
        DocumentStorage::new(self.collection.clone(), self.sequence.clone())
    }
}
