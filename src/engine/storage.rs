// Storage abstraction for the employee service
// This defines the interface every employee store implements

//! # Storage Abstraction Layer
//!
//! This module provides the storage abstraction the GraphQL resolvers talk to,
//! plus the in-memory store. The persistent store lives in
//! [`crate::engine::document`].
//!
//! ## Storage Architecture
//!
//! The storage layer follows the **Repository Pattern**:
//! - **EmployeeStorage trait**: list, get, create, update and delete
//! - **InMemoryStorage**: ordered collection in process memory
//! - **DocumentStorage**: document collection plus a named id counter
//!
//! ## Contract shared by every store
//!
//! - `get_employee` returns `Ok(None)` for an unknown id; absence is not an error
//! - `update_employee` and `delete_employee` fail with
//!   [`EmployeeServiceError::NotFound`] when no record has the id, and leave the
//!   store unchanged
//! - ids are assigned by the store from a sequence counter and are never reused
//!
//! ## Thread Safety
//!
//! Stores are shared across request handlers, so they are `Send + Sync` and
//! guard their own state. The in-memory store keeps its records behind a
//! `tokio::sync::RwLock`: reads run concurrently, every mutation is exclusive.

use tokio::sync::RwLock;
use tracing::debug;

use crate::engine::sequence::{InMemorySequenceCounter, SequenceCounter};
use crate::models::{sample_employees, Employee, EmployeeId, EmployeeInput, EMPLOYEE_SEQUENCE};
use crate::{EmployeeServiceError, Result};

/// Storage trait for employee records
///
/// ## Rust Learning Notes:
///
/// ### Generic Return Types
/// - `Result<Option<Employee>>` means "the lookup can fail, and if it
///   succeeds the record might or might not exist"
/// - `Result<Employee>` on update means a missing record is an error
#[async_trait::async_trait]
pub trait EmployeeStorage: Send + Sync {
    /// List every employee
    ///
    /// The in-memory store returns insertion order, the document store
    /// ascending id order.
    async fn list_employees(&self) -> Result<Vec<Employee>>;

    /// Get an employee by id
    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>>;

    /// Create an employee with a freshly assigned id
    async fn create_employee(&self, input: EmployeeInput) -> Result<Employee>;

    /// Overwrite every non-id field of an existing employee
    ///
    /// ## Errors
    /// - `NotFound` if no employee has this id
    async fn update_employee(&self, id: &EmployeeId, input: EmployeeInput) -> Result<Employee>;

    /// Delete an employee and return its id
    ///
    /// ## Errors
    /// - `NotFound` if no employee has this id
    async fn delete_employee(&self, id: &EmployeeId) -> Result<EmployeeId>;
}

/// In-memory employee store
///
/// Records live in a `Vec` in insertion order. Ids come from an
/// [`InMemorySequenceCounter`], so every created record gets a new id even
/// after deletions.
///
/// ## Limitations
///
/// - **Not persistent**: Data is lost when process restarts
/// - **Linear scans**: get, update and delete walk the whole collection
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    employees: RwLock<Vec<Employee>>,
    sequence: InMemorySequenceCounter,
}

impl InMemoryStorage {
    /// Empty store whose first created record gets id "1"
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the four sample rows, ids "1" through "4"
    ///
    /// The id sequence continues after the seeded rows.
    pub fn with_sample_data() -> Self {
        let employees: Vec<Employee> = sample_employees()
            .into_iter()
            .zip(1_i64..)
            .map(|(input, id)| Employee::from_input(id, input))
            .collect();
        let last = employees.len() as i64;

        Self {
            employees: RwLock::new(employees),
            sequence: InMemorySequenceCounter::starting_after(EMPLOYEE_SEQUENCE, last),
        }
    }
}

#[async_trait::async_trait]
impl EmployeeStorage for InMemoryStorage {
    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.clone())
    }

    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.iter().find(|e| &e.id == id).cloned())
    }

    async fn create_employee(&self, input: EmployeeInput) -> Result<Employee> {
        let id = self.sequence.next_sequence(EMPLOYEE_SEQUENCE).await?;
        let employee = Employee::from_input(id, input);

        let mut employees = self.employees.write().await;
        employees.push(employee.clone());
        debug!("Stored employee {} in memory ({} total)", employee.id, employees.len());

        Ok(employee)
    }

    async fn update_employee(&self, id: &EmployeeId, input: EmployeeInput) -> Result<Employee> {
        let mut employees = self.employees.write().await;

        let slot = employees
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| EmployeeServiceError::employee_not_found(id))?;

        // Replace the record in place; the id stays as it was
        *slot = Employee::from_input(slot.id.clone(), input);
        Ok(slot.clone())
    }

    async fn delete_employee(&self, id: &EmployeeId) -> Result<EmployeeId> {
        let mut employees = self.employees.write().await;

        let before = employees.len();
        employees.retain(|e| &e.id != id);

        if employees.len() == before {
            return Err(EmployeeServiceError::employee_not_found(id));
        }
        Ok(id.clone())
    }
}
