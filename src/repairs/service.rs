//! Ticket access service.
//!
//! Every operation first asks `AccessPolicy` whether the caller needs staff
//! rights, then goes through the repository. Visibility of individual tickets is
//! decided by `AccessPolicy::can_see`; callers that may not see a ticket get
//! `NotFound` so foreign ticket ids stay hidden.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    error::{RepositoryError, TicketError},
    models::{Customer, Employee, NewTicket, Principal, ServiceTicket, StatusFilter},
    policy::{AccessPolicy, Operation},
    repository::TicketRepository,
};

pub struct TicketService {
    repository: Arc<dyn TicketRepository>,
    policy: AccessPolicy,
}

impl std::fmt::Debug for TicketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl TicketService {
    #[must_use]
    pub fn new(repository: Arc<dyn TicketRepository>, policy: AccessPolicy) -> Self {
        Self { repository, policy }
    }

    #[must_use]
    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    fn authorize(&self, principal: &Principal, operation: Operation) -> Result<(), TicketError> {
        if self.policy.requires_staff(operation) && !principal.is_staff {
            debug!(
                user_id = principal.user_id,
                operation = operation.as_str(),
                "staff-only operation denied"
            );
            return Err(TicketError::Forbidden(operation));
        }
        Ok(())
    }

    /// Opens a ticket owned by the caller's own customer record.
    ///
    /// # Errors
    /// `InvalidInput` when `description` or `emergency` is missing, `NotFound` when
    /// the caller has no customer record, `Repository` on storage failure.
    #[instrument(skip(self, description), fields(user_id = principal.user_id))]
    pub async fn create_ticket(
        &self,
        principal: &Principal,
        description: Option<String>,
        emergency: Option<bool>,
    ) -> Result<ServiceTicket, TicketError> {
        self.authorize(principal, Operation::CreateTicket)?;

        let description = description.ok_or(TicketError::InvalidInput("description is required"))?;
        let emergency = emergency.ok_or(TicketError::InvalidInput("emergency is required"))?;

        let customer = self
            .repository
            .find_customer_by_user(principal.user_id)
            .await?
            .ok_or(TicketError::NotFound("customer"))?;

        let ticket = self
            .repository
            .insert_ticket(NewTicket {
                customer_id: customer.id,
                description,
                emergency,
            })
            .await?;

        info!(
            ticket_id = ticket.id,
            customer_id = customer.id,
            emergency = ticket.emergency,
            "ticket created"
        );
        Ok(ticket)
    }

    /// Lists tickets visible to the caller.
    ///
    /// Staff see everything, narrowed to completed tickets for `StatusFilter::Done`.
    /// Customers only ever see their own tickets and the filter is ignored.
    ///
    /// # Errors
    /// `Repository` on storage failure.
    #[instrument(skip(self), fields(user_id = principal.user_id, is_staff = principal.is_staff))]
    pub async fn list_tickets(
        &self,
        principal: &Principal,
        filter: &StatusFilter,
    ) -> Result<Vec<ServiceTicket>, TicketError> {
        self.authorize(principal, Operation::ListTickets)?;

        let tickets = if principal.is_staff {
            if let StatusFilter::Unrecognized(value) = filter {
                debug!(status = %value, "unrecognized status filter, returning all tickets");
            }
            self.repository.all_tickets(filter.completed_only()).await?
        } else {
            match self.repository.find_customer_by_user(principal.user_id).await? {
                Some(customer) => self.repository.filter_by_customer(customer.id).await?,
                None => Vec::new(),
            }
        };

        // Repository scoping and `can_see` must agree.
        let visible: Vec<ServiceTicket> = if self.policy.checks_visibility(Operation::ListTickets) {
            tickets
                .into_iter()
                .filter(|ticket| AccessPolicy::can_see(principal, ticket))
                .collect()
        } else {
            tickets
        };

        debug!(count = visible.len(), "tickets listed");
        Ok(visible)
    }

    /// Fetches one ticket by id.
    ///
    /// # Errors
    /// `NotFound` when the ticket does not exist, or under the hardened policy when
    /// the caller may not see it. `Repository` on storage failure.
    #[instrument(skip(self), fields(user_id = principal.user_id))]
    pub async fn get_ticket(
        &self,
        principal: &Principal,
        ticket_id: i64,
    ) -> Result<ServiceTicket, TicketError> {
        self.authorize(principal, Operation::GetTicket)?;

        let ticket = self
            .repository
            .find_ticket(ticket_id)
            .await?
            .ok_or(TicketError::NotFound("ticket"))?;

        if self.policy.checks_visibility(Operation::GetTicket)
            && !AccessPolicy::can_see(principal, &ticket)
        {
            debug!(ticket_id, "ticket hidden from caller");
            return Err(TicketError::NotFound("ticket"));
        }

        Ok(ticket)
    }

    /// Points a ticket at `employee_id`, replacing any previous assignment.
    ///
    /// # Errors
    /// `Forbidden` when the policy requires staff, `NotFound` when either the
    /// ticket or the employee does not exist, `Repository` on storage failure.
    #[instrument(skip(self), fields(user_id = principal.user_id))]
    pub async fn assign_employee(
        &self,
        principal: &Principal,
        ticket_id: i64,
        employee_id: i64,
    ) -> Result<ServiceTicket, TicketError> {
        self.authorize(principal, Operation::AssignEmployee)?;

        let previous = self
            .repository
            .find_ticket(ticket_id)
            .await?
            .ok_or(TicketError::NotFound("ticket"))?
            .employee
            .map(|current| current.id);
        self.repository
            .find_employee(employee_id)
            .await?
            .ok_or(TicketError::NotFound("employee"))?;

        // Only the employee reference is written; other columns may change concurrently.
        match self.repository.assign_employee(ticket_id, employee_id).await {
            Ok(true) => {}
            Ok(false) => return Err(TicketError::NotFound("ticket")),
            Err(RepositoryError::MissingReference(entity)) => {
                return Err(TicketError::NotFound(entity))
            }
            Err(err) => return Err(err.into()),
        }

        let ticket = self
            .repository
            .find_ticket(ticket_id)
            .await?
            .ok_or(TicketError::NotFound("ticket"))?;

        info!(ticket_id, employee_id, ?previous, "employee assigned");
        Ok(ticket)
    }

    /// Permanently removes a ticket.
    ///
    /// # Errors
    /// `Forbidden` for non-staff callers, `NotFound` when the ticket does not
    /// exist, `Repository` on storage failure.
    #[instrument(skip(self), fields(user_id = principal.user_id))]
    pub async fn delete_ticket(
        &self,
        principal: &Principal,
        ticket_id: i64,
    ) -> Result<(), TicketError> {
        self.authorize(principal, Operation::DeleteTicket)?;

        if !self.repository.delete_ticket(ticket_id).await? {
            return Err(TicketError::NotFound("ticket"));
        }

        info!(ticket_id, "ticket deleted");
        Ok(())
    }

    /// # Errors
    /// `Repository` on storage failure.
    pub async fn list_employees(&self) -> Result<Vec<Employee>, TicketError> {
        Ok(self.repository.list_employees().await?)
    }

    /// # Errors
    /// `NotFound` when the employee does not exist, `Repository` on storage failure.
    pub async fn get_employee(&self, employee_id: i64) -> Result<Employee, TicketError> {
        self.repository
            .find_employee(employee_id)
            .await?
            .ok_or(TicketError::NotFound("employee"))
    }

    /// # Errors
    /// `Repository` on storage failure.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, TicketError> {
        Ok(self.repository.list_customers().await?)
    }

    /// # Errors
    /// `NotFound` when the customer does not exist, `Repository` on storage failure.
    pub async fn get_customer(&self, customer_id: i64) -> Result<Customer, TicketError> {
        self.repository
            .find_customer(customer_id)
            .await?
            .ok_or(TicketError::NotFound("customer"))
    }

    /// # Errors
    /// Returns the repository error when storage is unreachable.
    pub async fn ping(&self) -> Result<(), TicketError> {
        Ok(self.repository.ping().await?)
    }
}
