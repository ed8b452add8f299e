// GraphQL API for the employee service
// This maps the Query/Mutation fields onto whichever EmployeeStorage is configured

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, InputObject, Object, Schema, SimpleObject, ID};
use tracing::{debug, info, warn};

use crate::engine::storage::EmployeeStorage;
use crate::models::{Employee, EmployeeId, EmployeeInput};

// GraphQL types - these are the API representations of our domain models

#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(name = "Employee")]
pub struct EmployeeGQL {
    pub id: ID,
    pub name: String,
    pub age: i32,
    pub job: String,
    pub language: String,
    pub pay: i32,
}

#[derive(InputObject, Debug, Clone)]
#[graphql(name = "EmployeeInput")]
pub struct EmployeeInputGQL {
    pub name: String,
    pub age: i32,
    pub job: String,
    pub language: String,
    pub pay: i32,
}

impl From<&Employee> for EmployeeGQL {
    fn from(employee: &Employee) -> Self {
        Self {
            id: ID(employee.id.to_string()),
            name: employee.name.clone(),
            age: employee.age,
            job: employee.job.clone(),
            language: employee.language.clone(),
            pay: employee.pay,
        }
    }
}

impl From<EmployeeInputGQL> for EmployeeInput {
    fn from(input: EmployeeInputGQL) -> Self {
        EmployeeInput {
            name: input.name,
            age: input.age,
            job: input.job,
            language: input.language,
            pay: input.pay,
        }
    }
}

fn storage<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<dyn EmployeeStorage>> {
    ctx.data::<Arc<dyn EmployeeStorage>>()
}

fn employee_id(id: ID) -> EmployeeId {
    EmployeeId::from(id.0)
}

// GraphQL Query root
pub struct Query;

#[Object]
impl Query {
    /// List all employees
    async fn employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<EmployeeGQL>> {
        let storage = storage(ctx)?;
        match storage.list_employees().await {
            Ok(employees) => Ok(employees.iter().map(EmployeeGQL::from).collect()),
            Err(e) => Err(e.into_graphql_error("Failed to list employees")),
        }
    }

    /// Get an employee by ID; null when no employee has this ID
    async fn employee(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<EmployeeGQL>> {
        let storage = storage(ctx)?;
        let id = employee_id(id);

        match storage.get_employee(&id).await {
            Ok(Some(employee)) => Ok(Some(EmployeeGQL::from(&employee))),
            Ok(None) => {
                debug!("Employee {} not found", id);
                Ok(None)
            }
            Err(e) => Err(e.into_graphql_error("Failed to get employee")),
        }
    }
}

// GraphQL Mutation root
pub struct Mutation;

#[Object]
impl Mutation {
    /// Create a new employee; the ID is assigned by the store
    async fn create_employee(
        &self,
        ctx: &Context<'_>,
        input: EmployeeInputGQL,
    ) -> async_graphql::Result<EmployeeGQL> {
        let storage = storage(ctx)?;

        let created = storage
            .create_employee(EmployeeInput::from(input))
            .await
            .map_err(|e| e.into_graphql_error("Failed to create employee"))?;

        info!("Created employee {} ({})", created.id, created.name);
        Ok(EmployeeGQL::from(&created))
    }

    /// Replace every field of an existing employee
    async fn update_employee(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: EmployeeInputGQL,
    ) -> async_graphql::Result<EmployeeGQL> {
        let storage = storage(ctx)?;
        let id = employee_id(id);

        match storage.update_employee(&id, EmployeeInput::from(input)).await {
            Ok(updated) => {
                info!("Updated employee {}", updated.id);
                Ok(EmployeeGQL::from(&updated))
            }
            Err(e) => {
                if e.is_not_found() {
                    warn!("Update of unknown employee {}", id);
                }
                Err(e.into_graphql_error("Failed to update employee"))
            }
        }
    }

    /// Delete an employee and return its ID
    async fn delete_employee(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ID> {
        let storage = storage(ctx)?;
        let id = employee_id(id);

        match storage.delete_employee(&id).await {
            Ok(deleted) => {
                info!("Deleted employee {}", deleted);
                Ok(ID(deleted.to_string()))
            }
            Err(e) => {
                if e.is_not_found() {
                    warn!("Delete of unknown employee {}", id);
                }
                Err(e.into_graphql_error("Failed to delete employee"))
            }
        }
    }
}

// Schema type alias
pub type EmployeeSchema = Schema<Query, Mutation, EmptySubscription>;

/// Create schema with storage backend
pub fn create_schema_with_storage(storage: Arc<dyn EmployeeStorage>) -> EmployeeSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(storage)
        .finish()
}

/// Create schema over a fresh in-memory store holding the sample rows
pub fn create_schema() -> EmployeeSchema {
    create_schema_with_storage(Arc::new(crate::engine::storage::InMemoryStorage::with_sample_data()))
}

/// SDL of the employee schema
pub fn schema_sdl() -> String {
    Schema::build(Query, Mutation, EmptySubscription).finish().sdl()
}
