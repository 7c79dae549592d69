//! Ticket access rules and record storage.
//!
//! The HTTP layer never talks to storage directly. Handlers resolve a
//! `Principal`, then call `TicketService`, which consults `AccessPolicy` before
//! every read or write and goes through the `TicketRepository` trait for data.
//!
//! Flow Overview:
//! 1) Resolve the bearer token into a principal (`PrincipalResolver`).
//! 2) Check the operation against the access policy (staff-only, visibility).
//! 3) Load, filter, or mutate rows through the repository.
//! 4) Hand hydrated records back for rendering.

pub mod error;
pub mod memory;
pub mod models;
pub mod policy;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod token;

pub use error::{RepositoryError, TicketError};
pub use memory::MemoryStore;
pub use models::{
    Customer, Employee, NewTicket, Principal, ServiceTicket, StatusFilter, TicketStatus,
};
pub use policy::{AccessPolicy, Operation};
pub use postgres::PgStore;
pub use repository::{PrincipalResolver, TicketRepository};
pub use service::TicketService;
