//! # Repairs (Service Ticket API)
//!
//! `repairs` exposes employees, customers, and service tickets of a repair shop
//! as REST resources backed by Postgres.
//!
//! ## Access Model
//!
//! Every request is authenticated with an API token that resolves to a principal
//! carrying a user id and a staff flag.
//!
//! - **Customers** create tickets for themselves and only ever list their own tickets.
//! - **Staff** list every ticket (optionally only completed ones), assign employees,
//!   and delete tickets.
//! - **Access policy:** `hardened` (default) also hides other customers' tickets on
//!   direct lookup and restricts assignment to staff. `lenient` keeps the historical
//!   behavior where any authenticated caller may fetch or reassign any ticket.
//!
//! ## Presentation
//!
//! Tickets are rendered with their customer and employee inlined exactly one level
//! deep; an unassigned ticket carries `"employee": null`.

pub mod api;
pub mod cli;
pub mod repairs;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
