//! Request/response payloads for the ticket, employee, and customer APIs.
//!
//! Response types fix the exposed field sets. Tickets inline their customer and
//! employee one level deep using the reduced `TicketCustomer`/`TicketEmployee`
//! shapes; nothing nests further.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::repairs::{Customer, Employee, ServiceTicket};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub description: Option<String>,
    pub emergency: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignEmployeeRequest {
    pub employee: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTicketsQuery {
    /// `done` for completed tickets only, `all` (or absent) for every ticket. Staff only.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct EmployeeResponse {
    pub id: i64,
    pub user: i64,
    pub specialty: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct CustomerResponse {
    pub id: i64,
    pub user: i64,
    pub full_name: String,
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TicketCustomer {
    pub id: i64,
    pub full_name: String,
    pub address: String,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TicketEmployee {
    pub id: i64,
    pub specialty: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct TicketResponse {
    pub id: i64,
    pub customer: TicketCustomer,
    pub employee: Option<TicketEmployee>,
    pub description: String,
    pub emergency: bool,
    pub date_completed: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&Employee> for EmployeeResponse {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            user: employee.user_id,
            specialty: employee.specialty.clone(),
            full_name: employee.full_name.clone(),
        }
    }
}

impl From<&Customer> for CustomerResponse {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            user: customer.user_id,
            full_name: customer.full_name.clone(),
            address: customer.address.clone(),
        }
    }
}

impl From<&Customer> for TicketCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            full_name: customer.full_name.clone(),
            address: customer.address.clone(),
        }
    }
}

impl From<&Employee> for TicketEmployee {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            specialty: employee.specialty.clone(),
            full_name: employee.full_name.clone(),
        }
    }
}

impl From<&ServiceTicket> for TicketResponse {
    fn from(ticket: &ServiceTicket) -> Self {
        Self {
            id: ticket.id,
            customer: TicketCustomer::from(&ticket.customer),
            employee: ticket.employee.as_ref().map(TicketEmployee::from),
            description: ticket.description.clone(),
            emergency: ticket.emergency,
            date_completed: ticket.date_completed,
        }
    }
}
