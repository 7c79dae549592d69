use chrono::{DateTime, Utc};

/// Authenticated caller resolved from an API token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub is_staff: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Employee {
    pub id: i64,
    pub user_id: i64,
    pub specialty: String,
    pub full_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub address: String,
}

/// A ticket with its customer and (optional) employee already loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceTicket {
    pub id: i64,
    pub customer: Customer,
    pub employee: Option<Employee>,
    pub description: String,
    pub emergency: bool,
    pub date_completed: Option<DateTime<Utc>>,
}

impl ServiceTicket {
    /// `date_completed` is the only completion marker.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.date_completed.is_some()
    }

    #[must_use]
    pub fn status(&self) -> TicketStatus {
        if self.is_done() {
            TicketStatus::Done
        } else if self.employee.is_some() {
            TicketStatus::Assigned
        } else {
            TicketStatus::Open
        }
    }
}

/// Insert payload; the customer is always the caller's own record.
#[derive(Clone, Debug)]
pub struct NewTicket {
    pub customer_id: i64,
    pub description: String,
    pub emergency: bool,
}

/// Lifecycle stage derived from the ticket fields, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    Assigned,
    Done,
}

impl TicketStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::Done => "done",
        }
    }
}

/// Value of the `status` query parameter on the ticket list.
///
/// Unknown values are kept (for logging) but behave like `All`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    Unrecognized(String),
}

impl StatusFilter {
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("all") => Self::All,
            Some("done") => Self::Done,
            Some(other) => Self::Unrecognized(other.to_string()),
        }
    }

    /// Returns `true` when only completed tickets should be returned.
    #[must_use]
    pub fn completed_only(&self) -> bool {
        matches!(self, Self::Done)
    }
}
