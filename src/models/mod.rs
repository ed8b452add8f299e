// Core domain models for the Employee service
// These are plain data structures shared by every store and the GraphQL layer

//! # Domain Models Module
//!
//! This module contains the domain types of the employee service. They know
//! nothing about GraphQL or storage; the engine layer converts them into API
//! types and persists them.
//!
//! ## Rust Learning Notes:
//!
//! ### Re-exports for Clean APIs
//! The `pub use` statements at the bottom create a clean, flat API.
//! Users can import `use employee_graphql::models::Employee` instead of
//! `use employee_graphql::models::employee::Employee`.

// Declares the `employee` submodule from `employee.rs`
// Contains Employee, EmployeeInput and EmployeeId
pub mod employee;

/// Re-export employee types
/// - Employee: A stored record
/// - EmployeeInput: Create/update payload (every field except the id)
/// - EmployeeId: Opaque store-assigned identifier
pub use employee::{sample_employees, Employee, EmployeeId, EmployeeInput, EMPLOYEE_SEQUENCE};
