//! Postgres-backed repository.
//!
//! Tickets are always read through `ticket_select`, which joins the customer and
//! left-joins the employee so every row comes back hydrated in one round trip.
//! Foreign-key violations (`23503`) surface as `RepositoryError::MissingReference`.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument, Span};

use super::{
    error::RepositoryError,
    models::{Customer, Employee, NewTicket, Principal, ServiceTicket},
    repository::{PrincipalResolver, TicketRepository},
};

const TICKET_COLUMNS: &str = r"
    t.id,
    t.description,
    t.emergency,
    t.date_completed,
    c.id AS customer_id,
    c.user_id AS customer_user_id,
    c.full_name AS customer_full_name,
    c.address AS customer_address,
    e.id AS employee_id,
    e.user_id AS employee_user_id,
    e.specialty AS employee_specialty,
    e.full_name AS employee_full_name
";

const TICKET_JOINS: &str = r"
    JOIN customers c ON c.id = t.customer_id
    LEFT JOIN employees e ON e.id = t.employee_id
";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_span(operation: &'static str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn ticket_select(filter: &str) -> String {
    format!("SELECT {TICKET_COLUMNS} FROM service_tickets t {TICKET_JOINS} {filter} ORDER BY t.id")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23503"),
        _ => false,
    }
}

fn ticket_from_row(row: &PgRow) -> Result<ServiceTicket, sqlx::Error> {
    let customer = Customer {
        id: row.try_get("customer_id")?,
        user_id: row.try_get("customer_user_id")?,
        full_name: row.try_get("customer_full_name")?,
        address: row.try_get("customer_address")?,
    };

    let employee = match row.try_get::<Option<i64>, _>("employee_id")? {
        Some(id) => Some(Employee {
            id,
            user_id: row.try_get("employee_user_id")?,
            specialty: row.try_get("employee_specialty")?,
            full_name: row.try_get("employee_full_name")?,
        }),
        None => None,
    };

    Ok(ServiceTicket {
        id: row.try_get("id")?,
        customer,
        employee,
        description: row.try_get("description")?,
        emergency: row.try_get("emergency")?,
        date_completed: row.try_get("date_completed")?,
    })
}

fn employee_from_row(row: &PgRow) -> Result<Employee, sqlx::Error> {
    Ok(Employee {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        specialty: row.try_get("specialty")?,
        full_name: row.try_get("full_name")?,
    })
}

fn customer_from_row(row: &PgRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        full_name: row.try_get("full_name")?,
        address: row.try_get("address")?,
    })
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn find_ticket(&self, id: i64) -> Result<Option<ServiceTicket>, RepositoryError> {
        let query = ticket_select("WHERE t.id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;
        Ok(row.as_ref().map(ticket_from_row).transpose()?)
    }

    async fn all_tickets(
        &self,
        completed_only: bool,
    ) -> Result<Vec<ServiceTicket>, RepositoryError> {
        let query = if completed_only {
            ticket_select("WHERE t.date_completed IS NOT NULL")
        } else {
            ticket_select("")
        };
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;
        Ok(rows
            .iter()
            .map(ticket_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn filter_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<ServiceTicket>, RepositoryError> {
        let query = ticket_select("WHERE t.customer_id = $1");
        let rows = sqlx::query(&query)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;
        Ok(rows
            .iter()
            .map(ticket_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<ServiceTicket, RepositoryError> {
        let query = format!(
            r"
            WITH t AS (
                INSERT INTO service_tickets (customer_id, description, emergency)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {TICKET_COLUMNS} FROM t {TICKET_JOINS}
            "
        );
        let result = sqlx::query(&query)
            .bind(ticket.customer_id)
            .bind(&ticket.description)
            .bind(ticket.emergency)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await;

        match result {
            Ok(row) => Ok(ticket_from_row(&row)?),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(RepositoryError::MissingReference("customer"))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn assign_employee(
        &self,
        ticket_id: i64,
        employee_id: i64,
    ) -> Result<bool, RepositoryError> {
        let query = "UPDATE service_tickets SET employee_id = $2 WHERE id = $1";
        let result = sqlx::query(query)
            .bind(ticket_id)
            .bind(employee_id)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(RepositoryError::MissingReference("employee"))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_ticket(&self, id: i64) -> Result<bool, RepositoryError> {
        let query = "DELETE FROM service_tickets WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_employee(&self, id: i64) -> Result<Option<Employee>, RepositoryError> {
        let query = "SELECT id, user_id, specialty, full_name FROM employees WHERE id = $1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(row.as_ref().map(employee_from_row).transpose()?)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, RepositoryError> {
        let query = "SELECT id, user_id, specialty, full_name FROM employees ORDER BY id";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(rows
            .iter()
            .map(employee_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>, RepositoryError> {
        let query = "SELECT id, user_id, full_name, address FROM customers WHERE id = $1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(row.as_ref().map(customer_from_row).transpose()?)
    }

    async fn find_customer_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<Customer>, RepositoryError> {
        let query = "SELECT id, user_id, full_name, address FROM customers WHERE user_id = $1";
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(row.as_ref().map(customer_from_row).transpose()?)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, RepositoryError> {
        let query = "SELECT id, user_id, full_name, address FROM customers ORDER BY id";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(rows
            .iter()
            .map(customer_from_row)
            .collect::<Result<_, _>>()?)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .instrument(db_span("PING", "SELECT 1"))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PrincipalResolver for PgStore {
    async fn resolve(&self, token_hash: &[u8]) -> Result<Option<Principal>, RepositoryError> {
        let query = r"
            SELECT u.id, u.is_staff
            FROM auth_tokens a
            JOIN users u ON u.id = a.user_id
            WHERE a.token_hash = $1 AND u.is_active
        ";
        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        let principal = match row {
            Some(row) => Some(Principal {
                user_id: row.try_get("id")?,
                is_staff: row.try_get("is_staff")?,
            }),
            None => None,
        };
        Ok(principal)
    }
}
