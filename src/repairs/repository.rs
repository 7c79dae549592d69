//! Storage seams for the ticket service.
//!
//! `PgStore` implements both traits against Postgres; `MemoryStore` implements
//! them over in-process maps for tests and local runs.

use async_trait::async_trait;

use super::{
    error::RepositoryError,
    models::{Customer, Employee, NewTicket, Principal, ServiceTicket},
};

/// Durable storage for employees, customers, and service tickets.
///
/// Tickets are always returned hydrated with their customer and employee.
/// List methods return rows ordered by id.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_ticket(&self, id: i64) -> Result<Option<ServiceTicket>, RepositoryError>;

    /// All tickets, or only those with `date_completed` set.
    async fn all_tickets(
        &self,
        completed_only: bool,
    ) -> Result<Vec<ServiceTicket>, RepositoryError>;

    async fn filter_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<ServiceTicket>, RepositoryError>;

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<ServiceTicket, RepositoryError>;

    /// Point a ticket at `employee_id`. Only the employee reference is written.
    /// Returns `false` when no ticket with `ticket_id` exists.
    async fn assign_employee(
        &self,
        ticket_id: i64,
        employee_id: i64,
    ) -> Result<bool, RepositoryError>;

    /// Hard delete. Returns `false` when no row was removed.
    async fn delete_ticket(&self, id: i64) -> Result<bool, RepositoryError>;

    async fn find_employee(&self, id: i64) -> Result<Option<Employee>, RepositoryError>;

    async fn list_employees(&self) -> Result<Vec<Employee>, RepositoryError>;

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, RepositoryError>;

    async fn find_customer_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<Customer>, RepositoryError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, RepositoryError>;

    /// Liveness check used by `/health`.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Maps a token digest to the principal it belongs to.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, token_hash: &[u8]) -> Result<Option<Principal>, RepositoryError>;
}
