//! API handlers for Repairs.
//!
//! Resource handlers (`tickets`, `employees`, `customers`) authenticate through
//! `principal`, delegate to `TicketService`, and render with the payloads in
//! `types`. Errors become JSON responses via the `IntoResponse` impl in `error`.

pub mod customers;
pub mod employees;
pub mod error;
mod extract;
pub mod health;
pub(crate) mod principal;
pub mod root;
pub mod tickets;
pub mod types;

#[cfg(test)]
mod tests;
