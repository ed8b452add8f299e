// Employee domain model - the single entity managed by the service
//
// ## Model Overview
//
// An **Employee** is a flat record with an opaque identifier assigned by the
// store. Clients never choose ids; they send an **EmployeeInput** carrying
// every field except the id, and the store hands back the full record.
//
// ### Identity:
//
// - Ids are strings at the API boundary (GraphQL `ID!`)
// - The in-memory store mints them from a process-local sequence
// - The document store mints them from a persistent named counter and keeps
//   them as integers inside each document
// - Ids are never rewritten by an update

use serde::{Deserialize, Serialize};

/// Name of the sequence counter that mints employee ids
pub const EMPLOYEE_SEQUENCE: &str = "employee_id";

/// **Employee Identifier** - opaque, stable, assigned by the store
///
/// Stored as text so both store variants share one representation. The
/// document store additionally needs the numeric form, see [`EmployeeId::as_number`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    /// Get the identifier as a string slice
    ///
    /// ```rust
    /// # use employee_graphql::EmployeeId;
    /// let id = EmployeeId::from("7");
    /// assert_eq!(id.as_str(), "7");
    /// ```
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create an identifier from any string-like input
    pub fn new<S: Into<String>>(id: S) -> Self {
        EmployeeId(id.into())
    }

    /// Numeric form of the identifier, if it has one
    ///
    /// Surrounding whitespace is ignored; anything else that does not parse
    /// as a signed 64-bit integer yields `None`.
    ///
    /// ```rust
    /// # use employee_graphql::EmployeeId;
    /// assert_eq!(EmployeeId::from(" 12 ").as_number(), Some(12));
    /// assert_eq!(EmployeeId::from("abc").as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }
}

impl From<&str> for EmployeeId {
    fn from(s: &str) -> Self {
        EmployeeId(s.to_string())
    }
}

impl From<String> for EmployeeId {
    fn from(s: String) -> Self {
        EmployeeId(s)
    }
}

impl From<i64> for EmployeeId {
    fn from(n: i64) -> Self {
        EmployeeId(n.to_string())
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// **Employee** - a stored employee record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub age: i32,
    pub job: String,
    pub language: String,
    pub pay: i32,
}

impl Employee {
    /// Build a record from an id and an input payload
    pub fn from_input(id: impl Into<EmployeeId>, input: EmployeeInput) -> Self {
        Self {
            id: id.into(),
            name: input.name,
            age: input.age,
            job: input.job,
            language: input.language,
            pay: input.pay,
        }
    }

    /// Replace every non-id field with the values from `input`
    pub fn apply(&mut self, input: EmployeeInput) {
        self.name = input.name;
        self.age = input.age;
        self.job = input.job;
        self.language = input.language;
        self.pay = input.pay;
    }

    /// The non-id fields of this record as an input payload
    pub fn to_input(&self) -> EmployeeInput {
        EmployeeInput {
            name: self.name.clone(),
            age: self.age,
            job: self.job.clone(),
            language: self.language.clone(),
            pay: self.pay,
        }
    }
}

/// **Employee Input** - every employee field except the id
///
/// Used as the payload of both create and update. Consumed by the call it
/// is passed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInput {
    pub name: String,
    pub age: i32,
    pub job: String,
    pub language: String,
    pub pay: i32,
}

impl EmployeeInput {
    pub fn new(
        name: impl Into<String>,
        age: i32,
        job: impl Into<String>,
        language: impl Into<String>,
        pay: i32,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            job: job.into(),
            language: language.into(),
            pay,
        }
    }
}

/// The fixed rows every store starts with, in seeding order
pub fn sample_employees() -> Vec<EmployeeInput> {
    vec![
        EmployeeInput::new("John", 35, "frontend", "react", 400),
        EmployeeInput::new("Peter", 28, "backend", "java", 300),
        EmployeeInput::new("Sue", 38, "publisher", "javascript", 400),
        EmployeeInput::new("Susan", 45, "pm", "python", 500),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_id_creation() {
        let id1 = EmployeeId::from("3");
        let id2 = EmployeeId::from("3".to_string());
        let id3 = EmployeeId::new("3");
        let id4 = EmployeeId::from(3_i64);

        assert_eq!(id1, id2);
        assert_eq!(id2, id3);
        assert_eq!(id3, id4);
        assert_eq!(id1.to_string(), "3");
        assert_eq!(id1.as_number(), Some(3));
    }

    #[test]
    fn test_non_numeric_id_has_no_number() {
        assert_eq!(EmployeeId::from("").as_number(), None);
        assert_eq!(EmployeeId::from("1.5").as_number(), None);
        assert_eq!(EmployeeId::from("ten").as_number(), None);
    }

    #[test]
    fn test_apply_keeps_id() {
        let mut employee = Employee::from_input("2", sample_employees()[1].clone());
        employee.apply(EmployeeInput::new("Ann", 30, "qa", "go", 350));

        assert_eq!(employee.id.as_str(), "2");
        assert_eq!(employee.to_input(), EmployeeInput::new("Ann", 30, "qa", "go", 350));
    }

    #[test]
    fn test_sample_rows_order() {
        let names: Vec<String> = sample_employees().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["John", "Peter", "Sue", "Susan"]);
    }

    #[test]
    fn test_employee_serializes_flat() {
        let employee = Employee::from_input(1_i64, EmployeeInput::new("John", 35, "frontend", "react", 400));
        let json = serde_json::to_value(&employee).unwrap();

        assert_eq!(json["id"], "1");
        assert_eq!(json["name"], "John");
        assert_eq!(json["pay"], 400);
    }
}
