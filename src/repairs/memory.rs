//! In-process store backed by ordered maps.
//!
//! Used by the test suites and by `--dsn memory://` for local runs. Seeding
//! helpers stand in for the admin tooling that populates users, employees, and
//! customers in a real deployment; `Seed` carries the same data from a JSON file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{
    error::RepositoryError,
    models::{Customer, Employee, NewTicket, Principal, ServiceTicket},
    repository::{PrincipalResolver, TicketRepository},
    token::hash_token,
};

#[derive(Clone, Debug)]
struct TicketRow {
    customer_id: i64,
    employee_id: Option<i64>,
    description: String,
    emergency: bool,
    date_completed: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, bool>,
    tokens: HashMap<Vec<u8>, i64>,
    employees: BTreeMap<i64, Employee>,
    customers: BTreeMap<i64, Customer>,
    tickets: BTreeMap<i64, TicketRow>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn hydrate(&self, id: i64, row: &TicketRow) -> Result<ServiceTicket, RepositoryError> {
        let customer = self
            .customers
            .get(&row.customer_id)
            .cloned()
            .ok_or(RepositoryError::MissingReference("customer"))?;
        let employee = match row.employee_id {
            Some(employee_id) => Some(
                self.employees
                    .get(&employee_id)
                    .cloned()
                    .ok_or(RepositoryError::MissingReference("employee"))?,
            ),
            None => None,
        };
        Ok(ServiceTicket {
            id,
            customer,
            employee,
            description: row.description.clone(),
            emergency: row.emergency,
            date_completed: row.date_completed,
        })
    }

    fn collect<F>(&self, keep: F) -> Result<Vec<ServiceTicket>, RepositoryError>
    where
        F: Fn(&TicketRow) -> bool,
    {
        self.tickets
            .iter()
            .filter(|(_, row)| keep(row))
            .map(|(id, row)| self.hydrate(*id, row))
            .collect()
    }
}

/// Initial contents for a `MemoryStore`, usually read from `--seed <FILE>`.
///
/// ```json
/// { "users": [
///     { "is_staff": true, "tokens": ["staff-local-token-0001"],
///       "employee": { "specialty": "plumbing", "full_name": "Pat Wrench" } },
///     { "tokens": ["customer-local-token-01"],
///       "customer": { "full_name": "Casey Client", "address": "42 Elm St" } }
/// ] }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub tokens: Vec<String>,
    pub employee: Option<SeedEmployee>,
    pub customer: Option<SeedCustomer>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedEmployee {
    pub specialty: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCustomer {
    pub full_name: String,
    pub address: String,
}

impl Seed {
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.users
            .iter()
            .flat_map(|user| user.tokens.iter().map(String::as_str))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user and returns its id.
    pub async fn add_user(&self, is_staff: bool) -> i64 {
        let mut state = self.state.write().await;
        let id = state.next_id();
        state.users.insert(id, is_staff);
        id
    }

    /// Issues `token` for `user_id`; only its digest is kept.
    pub async fn add_token(&self, user_id: i64, token: &str) {
        let mut state = self.state.write().await;
        state.tokens.insert(hash_token(token), user_id);
    }

    pub async fn add_employee(&self, user_id: i64, specialty: &str, full_name: &str) -> Employee {
        let mut state = self.state.write().await;
        let employee = Employee {
            id: state.next_id(),
            user_id,
            specialty: specialty.to_string(),
            full_name: full_name.to_string(),
        };
        state.employees.insert(employee.id, employee.clone());
        employee
    }

    pub async fn add_customer(&self, user_id: i64, full_name: &str, address: &str) -> Customer {
        let mut state = self.state.write().await;
        let customer = Customer {
            id: state.next_id(),
            user_id,
            full_name: full_name.to_string(),
            address: address.to_string(),
        };
        state.customers.insert(customer.id, customer.clone());
        customer
    }

    /// Loads every user in `seed` with its tokens and optional employee and
    /// customer records.
    pub async fn load_seed(&self, seed: &Seed) {
        for user in &seed.users {
            let user_id = self.add_user(user.is_staff).await;
            for token in &user.tokens {
                self.add_token(user_id, token).await;
            }
            if let Some(employee) = &user.employee {
                self.add_employee(user_id, &employee.specialty, &employee.full_name)
                    .await;
            }
            if let Some(customer) = &user.customer {
                self.add_customer(user_id, &customer.full_name, &customer.address)
                    .await;
            }
        }
    }

    /// Marks a ticket done. Completion is written outside the ticket API.
    /// Returns `false` when the ticket does not exist.
    pub async fn complete_ticket(&self, id: i64, at: DateTime<Utc>) -> bool {
        let mut state = self.state.write().await;
        state.tickets.get_mut(&id).is_some_and(|row| {
            row.date_completed = Some(at);
            true
        })
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn find_ticket(&self, id: i64) -> Result<Option<ServiceTicket>, RepositoryError> {
        let state = self.state.read().await;
        state
            .tickets
            .get(&id)
            .map(|row| state.hydrate(id, row))
            .transpose()
    }

    async fn all_tickets(
        &self,
        completed_only: bool,
    ) -> Result<Vec<ServiceTicket>, RepositoryError> {
        let state = self.state.read().await;
        state.collect(|row| !completed_only || row.date_completed.is_some())
    }

    async fn filter_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<ServiceTicket>, RepositoryError> {
        let state = self.state.read().await;
        state.collect(|row| row.customer_id == customer_id)
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<ServiceTicket, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.customers.contains_key(&ticket.customer_id) {
            return Err(RepositoryError::MissingReference("customer"));
        }
        let id = state.next_id();
        let row = TicketRow {
            customer_id: ticket.customer_id,
            employee_id: None,
            description: ticket.description,
            emergency: ticket.emergency,
            date_completed: None,
        };
        let hydrated = state.hydrate(id, &row)?;
        state.tickets.insert(id, row);
        Ok(hydrated)
    }

    async fn assign_employee(
        &self,
        ticket_id: i64,
        employee_id: i64,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.employees.contains_key(&employee_id) {
            return Err(RepositoryError::MissingReference("employee"));
        }
        let Some(row) = state.tickets.get_mut(&ticket_id) else {
            return Ok(false);
        };
        row.employee_id = Some(employee_id);
        Ok(true)
    }

    async fn delete_ticket(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.tickets.remove(&id).is_some())
    }

    async fn find_employee(&self, id: i64) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.state.read().await.employees.get(&id).cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, RepositoryError> {
        Ok(self.state.read().await.employees.values().cloned().collect())
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.state.read().await.customers.get(&id).cloned())
    }

    async fn find_customer_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<Customer>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .customers
            .values()
            .find(|customer| customer.user_id == user_id)
            .cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
        Ok(self.state.read().await.customers.values().cloned().collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl PrincipalResolver for MemoryStore {
    async fn resolve(&self, token_hash: &[u8]) -> Result<Option<Principal>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.tokens.get(token_hash).and_then(|user_id| {
            state.users.get(user_id).map(|is_staff| Principal {
                user_id: *user_id,
                is_staff: *is_staff,
            })
        }))
    }
}
