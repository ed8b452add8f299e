// Employee GraphQL - Rust Edition
// A small GraphQL CRUD service for Employee records with pluggable storage

//! # Employee GraphQL Library
//!
//! This is the library crate behind the `server` and `admin` binaries. It
//! exposes an Employee entity over GraphQL with a query to list and fetch
//! employees and mutations to create, update and delete them.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`Employee`]: A stored employee record
//! - [`EmployeeInput`]: Create/update payload, every field except the id
//! - [`EmployeeId`]: Opaque identifier assigned by the store
//!
//! ### Storage Layer
//! Two interchangeable implementations of [`EmployeeStorage`]:
//!
//! - [`InMemoryStorage`]: an ordered collection in process memory, seeded with
//!   four sample rows
//! - [`DocumentStorage`]: a document collection plus a named sequence counter
//!   for ids, backed by NATS JetStream ([`NATSStorage`]) in production
//!
//! ### GraphQL Engine
//! Resolvers that map each Query/Mutation field onto the configured store.
//!
//! ### Server
//! An axum HTTP server with the GraphQL endpoint, CORS and a liveness route.
//!
//! **Usage Example:**
//! ```rust
//! use employee_graphql::{create_schema_with_storage, InMemoryStorage};
//! use std::sync::Arc;
//!
//! let schema = create_schema_with_storage(Arc::new(InMemoryStorage::with_sample_data()));
//! // let response = schema.execute("{ employees { id name } }").await;
//! # let _ = schema;
//! ```
//!
//! ## Rust Learning Notes:
//!
//! ### Re-exports
//! `pub use` statements create shortcuts so users don't need to know the internal
//! module structure. Instead of `use employee_graphql::models::employee::Employee`,
//! users can write `use employee_graphql::Employee`.

// Core domain models
pub mod models;

// Engine implementations (GraphQL, storage)
pub mod engine;

// Server implementations
pub mod server;

// Re-export core domain types for easy access
pub use models::{Employee, EmployeeId, EmployeeInput};

// Re-export engine types for convenience
pub use engine::{
    document::{DocumentStorage, EmployeeCollection, EmployeeDocument, InMemoryCollection},
    graphql::{
        create_schema, create_schema_with_storage, schema_sdl, EmployeeGQL, EmployeeInputGQL,
        EmployeeSchema,
    },
    nats_storage::{NATSStorage, NATSStorageConfig},
    sequence::{InMemorySequenceCounter, SequenceCounter},
    storage::{EmployeeStorage, InMemoryStorage},
};

// Re-export server types for convenience
pub use server::graphql::GraphQLServerBuilder;

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Error types for employee service operations
///
/// ## Rust Learning Notes:
///
/// ### The `thiserror` Crate
/// - `#[derive(Error)]` implements the `std::error::Error` trait
/// - `#[error("...")]` provides human-readable error messages
/// - `#[from]` enables automatic conversion from other error types, so `?`
///   works on `anyhow::Error` and `serde_json::Error` results
#[derive(Error, Debug)]
pub enum EmployeeServiceError {
    /// No record matches the given id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error when invalid input is provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage-related errors
    /// Using anyhow::Error for flexible error handling with NATS and other storage backends
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EmployeeServiceError {
    pub fn employee_not_found(id: &EmployeeId) -> Self {
        EmployeeServiceError::NotFound(format!("employee {}", id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EmployeeServiceError::NotFound(_))
    }

    /// Machine readable code placed in the GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            EmployeeServiceError::NotFound(_) => "NOT_FOUND",
            EmployeeServiceError::InvalidInput(_) => "BAD_USER_INPUT",
            EmployeeServiceError::Storage(_) | EmployeeServiceError::Serialization(_) => {
                "INTERNAL_SERVER_ERROR"
            }
        }
    }

    /// Convert into a GraphQL error whose message starts with `action`
    pub fn into_graphql_error(self, action: &str) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(format!("{}: {}", action, self))
            .extend_with(|_, extensions| extensions.set("code", code))
    }
}

/// Type alias for Results that use our custom error type
pub type Result<T> = std::result::Result<T, EmployeeServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(EmployeeServiceError::employee_not_found(&EmployeeId::from("1")).code(), "NOT_FOUND");
        assert_eq!(EmployeeServiceError::InvalidInput("x".into()).code(), "BAD_USER_INPUT");
        assert_eq!(
            EmployeeServiceError::from(anyhow::anyhow!("connection refused")).code(),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = EmployeeServiceError::employee_not_found(&EmployeeId::from("12"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: employee 12");
    }
}
