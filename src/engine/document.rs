// Persistent employee store: a document collection plus a named id counter

//! # Document Storage
//!
//! The persistent variant of [`EmployeeStorage`]. Employee records are kept as
//! documents `{id, name, age, job, language, pay}` in an
//! [`EmployeeCollection`], and ids come from the `employee_id`
//! [`SequenceCounter`]. Both are traits so the same store logic runs against
//! NATS JetStream in production and against process memory in tests.
//!
//! ## Identity
//!
//! Document ids are integers. An [`EmployeeId`] that does not parse as an
//! integer cannot name a document: a lookup finds nothing, while update and
//! delete reject it with `InvalidInput`.
//!
//! ## Startup
//!
//! [`DocumentStorage::seed_if_empty`] inserts the sample rows into an empty
//! collection, each with a fresh id from the counter, so a new deployment
//! starts with ids 1 through 4.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::engine::sequence::{InMemorySequenceCounter, SequenceCounter};
use crate::engine::storage::EmployeeStorage;
use crate::models::{sample_employees, Employee, EmployeeId, EmployeeInput, EMPLOYEE_SEQUENCE};
use crate::{EmployeeServiceError, Result};

/// An employee as stored in the document collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeDocument {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub job: String,
    pub language: String,
    pub pay: i32,
}

impl EmployeeDocument {
    pub fn new(id: i64, input: EmployeeInput) -> Self {
        Self {
            id,
            name: input.name,
            age: input.age,
            job: input.job,
            language: input.language,
            pay: input.pay,
        }
    }

    /// Set name/age/job/language/pay, leaving the id alone
    pub fn set_fields(&mut self, fields: EmployeeInput) {
        self.name = fields.name;
        self.age = fields.age;
        self.job = fields.job;
        self.language = fields.language;
        self.pay = fields.pay;
    }
}

impl From<EmployeeDocument> for Employee {
    fn from(doc: EmployeeDocument) -> Self {
        Employee {
            id: EmployeeId::from(doc.id),
            name: doc.name,
            age: doc.age,
            job: doc.job,
            language: doc.language,
            pay: doc.pay,
        }
    }
}

/// A collection of employee documents keyed by integer id
#[async_trait::async_trait]
pub trait EmployeeCollection: Send + Sync {
    /// Every document, in no particular order
    async fn find_all(&self) -> Result<Vec<EmployeeDocument>>;

    /// The document with this id, if any
    async fn find_one(&self, id: i64) -> Result<Option<EmployeeDocument>>;

    /// Insert a new document; fails if a document with the same id exists
    async fn insert_one(&self, doc: EmployeeDocument) -> Result<()>;

    /// Set the non-id fields of the document with this id
    ///
    /// Returns the document as it reads after the update, or `None` when no
    /// document matched.
    async fn set_fields(&self, id: i64, fields: EmployeeInput) -> Result<Option<EmployeeDocument>>;

    /// Delete the document with this id and return how many were deleted
    async fn delete_one(&self, id: i64) -> Result<u64>;

    /// Number of documents in the collection
    async fn count(&self) -> Result<u64>;
}

/// Document collection held in process memory
#[derive(Debug, Default)]
pub struct InMemoryCollection {
    documents: Mutex<BTreeMap<i64, EmployeeDocument>>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EmployeeCollection for InMemoryCollection {
    async fn find_all(&self) -> Result<Vec<EmployeeDocument>> {
        let documents = self.documents.lock().await;
        Ok(documents.values().cloned().collect())
    }

    async fn find_one(&self, id: i64) -> Result<Option<EmployeeDocument>> {
        let documents = self.documents.lock().await;
        Ok(documents.get(&id).cloned())
    }

    async fn insert_one(&self, doc: EmployeeDocument) -> Result<()> {
        let mut documents = self.documents.lock().await;
        if documents.contains_key(&doc.id) {
            return Err(anyhow::anyhow!("Duplicate employee document id {}", doc.id).into());
        }
        documents.insert(doc.id, doc);
        Ok(())
    }

    async fn set_fields(&self, id: i64, fields: EmployeeInput) -> Result<Option<EmployeeDocument>> {
        let mut documents = self.documents.lock().await;
        Ok(documents.get_mut(&id).map(|doc| {
            doc.set_fields(fields);
            doc.clone()
        }))
    }

    async fn delete_one(&self, id: i64) -> Result<u64> {
        let mut documents = self.documents.lock().await;
        Ok(documents.remove(&id).map_or(0, |_| 1))
    }

    async fn count(&self) -> Result<u64> {
        let documents = self.documents.lock().await;
        Ok(documents.len() as u64)
    }
}

/// Persistent employee store
///
/// Cheap to clone; clones share the same collection and counter.
#[derive(Clone)]
pub struct DocumentStorage {
    collection: Arc<dyn EmployeeCollection>,
    sequence: Arc<dyn SequenceCounter>,
}

impl DocumentStorage {
    pub fn new(collection: Arc<dyn EmployeeCollection>, sequence: Arc<dyn SequenceCounter>) -> Self {
        Self { collection, sequence }
    }

    /// Document store backed entirely by process memory
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryCollection::new()),
            Arc::new(InMemorySequenceCounter::new()),
        )
    }

    /// Mint the next employee id
    pub async fn next_id(&self) -> Result<i64> {
        self.sequence.next_sequence(EMPLOYEE_SEQUENCE).await
    }

    /// Last employee id minted, 0 if none
    pub async fn current_id(&self) -> Result<i64> {
        self.sequence.current_sequence(EMPLOYEE_SEQUENCE).await
    }

    /// Number of stored employees
    pub async fn count(&self) -> Result<u64> {
        self.collection.count().await
    }

    /// Insert the sample rows when the collection is empty
    ///
    /// Returns how many rows were inserted: 4 on an empty collection, 0
    /// otherwise.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        if self.collection.count().await? > 0 {
            debug!("Employee collection already populated, skipping seed");
            return Ok(0);
        }

        let samples = sample_employees();
        let inserted = samples.len();
        for input in samples {
            let id = self.next_id().await?;
            self.collection.insert_one(EmployeeDocument::new(id, input)).await?;
        }

        info!("Seeded employee collection with {} sample rows", inserted);
        Ok(inserted)
    }

    fn document_id(id: &EmployeeId) -> Result<i64> {
        id.as_number().ok_or_else(|| {
            EmployeeServiceError::InvalidInput(format!("employee id must be an integer, got '{}'", id))
        })
    }
}

#[async_trait::async_trait]
impl EmployeeStorage for DocumentStorage {
    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let mut documents = self.collection.find_all().await?;
        documents.sort_by_key(|doc| doc.id);
        Ok(documents.into_iter().map(Employee::from).collect())
    }

    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>> {
        let doc_id = match id.as_number() {
            Some(doc_id) => doc_id,
            None => return Ok(None),
        };
        Ok(self.collection.find_one(doc_id).await?.map(Employee::from))
    }

    async fn create_employee(&self, input: EmployeeInput) -> Result<Employee> {
        let id = self.next_id().await?;
        let doc = EmployeeDocument::new(id, input);

        self.collection.insert_one(doc.clone()).await?;
        Ok(Employee::from(doc))
    }

    async fn update_employee(&self, id: &EmployeeId, input: EmployeeInput) -> Result<Employee> {
        let doc_id = Self::document_id(id)?;

        if self.collection.find_one(doc_id).await?.is_none() {
            return Err(EmployeeServiceError::employee_not_found(id));
        }

        // The document can disappear between the lookup and the write
        self.collection
            .set_fields(doc_id, input)
            .await?
            .map(Employee::from)
            .ok_or_else(|| EmployeeServiceError::employee_not_found(id))
    }

    async fn delete_employee(&self, id: &EmployeeId) -> Result<EmployeeId> {
        let doc_id = Self::document_id(id)?;

        if self.collection.delete_one(doc_id).await? == 0 {
            return Err(EmployeeServiceError::employee_not_found(id));
        }
        Ok(EmployeeId::from(doc_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio_test::assert_err;

    fn ann() -> EmployeeInput {
        EmployeeInput::new("Ann", 30, "qa", "go", 350)
    }

    async fn seeded() -> DocumentStorage {
        let storage = DocumentStorage::in_memory();
        storage.seed_if_empty().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_seed_inserts_samples_with_sequential_ids() {
        let storage = DocumentStorage::in_memory();

        assert_eq!(storage.seed_if_empty().await.unwrap(), 4);

        let employees = storage.list_employees().await.unwrap();
        let ids: Vec<&str> = employees.iter().map(|e| e.id.as_str()).collect();
        let names: Vec<&str> = employees.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert_eq!(names, vec!["John", "Peter", "Sue", "Susan"]);
        assert_eq!(storage.current_id().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_seed_is_noop_when_populated() {
        let storage = seeded().await;

        assert_eq!(storage.seed_if_empty().await.unwrap(), 0);
        assert_eq!(storage.count().await.unwrap(), 4);
        assert_eq!(storage.current_id().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_create_uses_next_sequence_value() {
        let storage = seeded().await;

        let created = storage.create_employee(ann()).await.unwrap();

        assert_eq!(created.id.as_str(), "5");
        assert_eq!(created.to_input(), ann());
        assert_eq!(storage.get_employee(&created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_id() {
        let collection = Arc::new(InMemoryCollection::new());
        for id in [3, 1, 2] {
            collection.insert_one(EmployeeDocument::new(id, ann())).await.unwrap();
        }
        let storage = DocumentStorage::new(collection, Arc::new(InMemorySequenceCounter::new()));

        let ids: Vec<String> = storage
            .list_employees()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_update_sets_every_field() {
        let storage = seeded().await;
        let id = EmployeeId::from("3");

        let updated = storage.update_employee(&id, ann()).await.unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.to_input(), ann());
        assert_eq!(storage.get_employee(&id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found_and_leaves_store_unchanged() {
        let storage = seeded().await;
        let before = storage.list_employees().await.unwrap();

        let err = assert_err!(storage.update_employee(&EmployeeId::from("9"), ann()).await);

        assert!(err.is_not_found());
        assert_eq!(storage.list_employees().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found_and_leaves_store_unchanged() {
        let storage = seeded().await;
        let before = storage.list_employees().await.unwrap();

        let err = assert_err!(storage.delete_employee(&EmployeeId::from("9")).await);

        assert!(err.is_not_found());
        assert_eq!(storage.list_employees().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_removes_document_and_returns_id() {
        let storage = seeded().await;

        let deleted = storage.delete_employee(&EmployeeId::from("2")).await.unwrap();

        assert_eq!(deleted.as_str(), "2");
        assert_eq!(storage.count().await.unwrap(), 3);
        assert!(storage.get_employee(&deleted).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleted_ids_are_not_reused() {
        let storage = seeded().await;

        storage.delete_employee(&EmployeeId::from("4")).await.unwrap();
        let created = storage.create_employee(ann()).await.unwrap();

        assert_eq!(created.id.as_str(), "5");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_absent_on_get() {
        let storage = seeded().await;

        assert_eq!(storage.get_employee(&EmployeeId::from("abc")).await.unwrap(), None);
        assert_eq!(storage.get_employee(&EmployeeId::from("")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_invalid_input_on_writes() {
        let storage = seeded().await;
        let before = storage.list_employees().await.unwrap();

        let err = assert_err!(storage.update_employee(&EmployeeId::from("abc"), ann()).await);
        assert!(matches!(err, EmployeeServiceError::InvalidInput(_)));

        let err = assert_err!(storage.delete_employee(&EmployeeId::from("abc")).await);
        assert!(matches!(err, EmployeeServiceError::InvalidInput(_)));

        assert_eq!(storage.list_employees().await.unwrap(), before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deletes_of_one_id_succeed_once() {
        let storage = seeded().await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.delete_employee(&EmployeeId::from("3")).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(id) => {
                    assert_eq!(id.as_str(), "3");
                    succeeded += 1;
                }
                Err(err) => assert!(err.is_not_found()),
            }
        }
        assert_eq!(succeeded, 1);
        assert_eq!(storage.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_fails() {
        let collection = InMemoryCollection::new();
        collection.insert_one(EmployeeDocument::new(1, ann())).await.unwrap();

        let err = assert_err!(collection.insert_one(EmployeeDocument::new(1, ann())).await);
        assert!(matches!(err, EmployeeServiceError::Storage(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids() {
        let storage = DocumentStorage::in_memory();

        let handles: Vec<_> = (0..40)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.create_employee(ann()).await.unwrap().id })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(storage.count().await.unwrap(), 40);
        assert_eq!(storage.current_id().await.unwrap(), 40);
    }
}
