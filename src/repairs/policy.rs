//! Authorization rules for ticket operations.
//!
//! Every permission decision the service makes goes through here. Two policies
//! exist:
//!
//! - `Hardened` (default): direct lookups obey ownership and assignment is
//!   staff-only.
//! - `Lenient`: any authenticated caller may fetch any ticket by id or reassign
//!   its employee.
//!
//! Deletion is staff-only under both policies.

use std::{fmt, str::FromStr};

use super::models::{Principal, ServiceTicket};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    CreateTicket,
    ListTickets,
    GetTicket,
    AssignEmployee,
    DeleteTicket,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTicket => "create_ticket",
            Self::ListTickets => "list_tickets",
            Self::GetTicket => "get_ticket",
            Self::AssignEmployee => "assign_employee",
            Self::DeleteTicket => "delete_ticket",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    Lenient,
    #[default]
    Hardened,
}

impl AccessPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Hardened => "hardened",
        }
    }

    /// Returns `true` when `operation` may only be performed by staff.
    #[must_use]
    pub const fn requires_staff(self, operation: Operation) -> bool {
        match operation {
            Operation::DeleteTicket => true,
            Operation::AssignEmployee => matches!(self, Self::Hardened),
            Operation::CreateTicket | Operation::ListTickets | Operation::GetTicket => false,
        }
    }

    /// Returns `true` when results of `operation` must pass `can_see`.
    #[must_use]
    pub const fn checks_visibility(self, operation: Operation) -> bool {
        match operation {
            Operation::ListTickets => true,
            Operation::GetTicket => matches!(self, Self::Hardened),
            Operation::CreateTicket | Operation::AssignEmployee | Operation::DeleteTicket => {
                false
            }
        }
    }

    /// Staff see every ticket; everyone else only tickets of their own customer record.
    #[must_use]
    pub fn can_see(principal: &Principal, ticket: &ServiceTicket) -> bool {
        principal.is_staff || ticket.customer.user_id == principal.user_id
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "hardened" => Ok(Self::Hardened),
            _ => Err(format!(
                "invalid access policy: {value} (expected lenient or hardened)"
            )),
        }
    }
}
