// Employee service server implementations
// This contains the HTTP server that exposes the employee schema

//! # Server Module
//!
//! The server layer sits on top of the engine layer and makes the GraphQL
//! schema reachable over HTTP.
//!
//! ```text
//! Client (browser, any language)
//!        ↓ HTTP/GraphQL
//! Server Layer (this module) ← axum routes, CORS
//!        ↓ Function calls
//! Engine Layer ← GraphQL resolvers, employee stores
//! ```
//!
//! ## Routes
//!
//! - `GET /` - liveness message
//! - `POST /graphql` - GraphQL queries and mutations
//! - `GET /graphql` - GraphiQL explorer
//! - `GET /health` - health check

/// GraphQL HTTP server implementation
pub mod graphql;

pub use graphql::{GraphQLServer, GraphQLServerBuilder, GraphQLServerConfig};
