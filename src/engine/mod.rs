// Employee service engine
// This contains the GraphQL resolvers and the storage implementations

//! # Engine Module
//!
//! The engine is the layer between the domain models and the outside world.
//!
//! ## Architecture Overview
//!
//! - **Domain Models**: Plain data (in `models/`)
//! - **Engine Layer**: Resolvers and stores (this module)
//! - **Server Layer**: HTTP server and GraphQL endpoint (in `server/`)
//!
//! ## Engine Components
//!
//! ### GraphQL Engine (`graphql` module)
//! - Schema types and the Query/Mutation resolvers
//! - Translates between GraphQL types and domain models
//! - Turns store errors into GraphQL errors with a `code` extension
//!
//! ### Storage (`storage` module)
//! - The `EmployeeStorage` trait every store implements
//! - The in-memory store
//!
//! ### Document Storage (`document` module)
//! - The persistent store: a document collection plus an id counter
//! - Seeding of an empty collection
//!
//! ### Sequence Counters (`sequence` module)
//! - Atomic increment-and-return counters used to mint ids
//!
//! ### NATS Storage (`nats_storage` module)
//! - JetStream key-value bucket for documents
//! - JetStream stream sequences for counters

/// GraphQL schema types, resolvers and schema builders
pub mod graphql;

/// Storage trait and in-memory store
pub mod storage;

/// Persistent store over a document collection and a sequence counter
pub mod document;

/// Named sequence counters
pub mod sequence;

/// NATS JetStream backend for the persistent store
pub mod nats_storage;

pub use graphql::{
    create_schema, create_schema_with_storage, schema_sdl, EmployeeGQL, EmployeeInputGQL,
    EmployeeSchema, Mutation, Query,
};
pub use storage::{EmployeeStorage, InMemoryStorage};
pub use document::{DocumentStorage, EmployeeCollection, EmployeeDocument, InMemoryCollection};
pub use sequence::{InMemorySequenceCounter, SequenceCounter};
pub use nats_storage::{NATSEmployeeCollection, NATSSequenceCounter, NATSStorage, NATSStorageConfig};
