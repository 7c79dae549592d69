//! Service ticket handlers.
//!
//! Handlers only authenticate, parse inputs, and render; every access decision
//! is made by `TicketService`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{
    extract::{json_body, path_id, query},
    principal::require_auth,
    types::{
        AssignEmployeeRequest, CreateTicketRequest, ErrorResponse, ListTicketsQuery,
        TicketResponse,
    },
};
use crate::repairs::{PrincipalResolver, StatusFilter, TicketError, TicketService};

#[utoipa::path(
    post,
    path = "/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created for the caller's customer record.", body = TicketResponse),
        (status = 400, description = "Missing description or emergency flag, or malformed body.", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
        (status = 404, description = "Caller has no customer record.", body = ErrorResponse),
    ),
    tag = "tickets"
)]
/// Opens a ticket owned by the caller. The customer always comes from the token,
/// never from the payload.
pub async fn create_ticket(
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, resolver.as_ref()).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let request = match json_body(payload) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    match service
        .create_ticket(&principal, request.description, request.emergency)
        .await
    {
        Ok(ticket) => (StatusCode::CREATED, Json(TicketResponse::from(&ticket))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/tickets",
    params(ListTicketsQuery),
    responses(
        (status = 200, description = "Tickets visible to the caller.", body = [TicketResponse]),
        (status = 400, description = "Malformed query string.", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
    ),
    tag = "tickets"
)]
/// Lists tickets. Staff see all tickets (`?status=done` narrows to completed ones);
/// customers see only their own and the filter is ignored.
pub async fn list_tickets(
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
    params: Result<Query<ListTicketsQuery>, QueryRejection>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, resolver.as_ref()).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let params = match query(params) {
        Ok(params) => params,
        Err(err) => return err.into_response(),
    };

    let filter = StatusFilter::parse(params.status.as_deref());
    match service.list_tickets(&principal, &filter).await {
        Ok(tickets) => {
            let body: Vec<TicketResponse> = tickets.iter().map(TicketResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket detail.", body = TicketResponse),
        (status = 400, description = "Ticket id is not an integer.", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
        (status = 404, description = "Ticket not found or not visible to the caller.", body = ErrorResponse),
    ),
    tag = "tickets"
)]
pub async fn get_ticket(
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, resolver.as_ref()).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let ticket_id = match path_id(path) {
        Ok(ticket_id) => ticket_id,
        Err(err) => return err.into_response(),
    };

    match service.get_ticket(&principal, ticket_id).await {
        Ok(ticket) => (StatusCode::OK, Json(TicketResponse::from(&ticket))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/tickets/{id}",
    request_body = AssignEmployeeRequest,
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 204, description = "Employee assigned."),
        (status = 400, description = "Missing employee id, malformed body, or non-integer ticket id.", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
        (status = 403, description = "Assignment requires a staff account.", body = ErrorResponse),
        (status = 404, description = "Ticket or employee not found.", body = ErrorResponse),
    ),
    tag = "tickets"
)]
/// Assigns an employee to a ticket, replacing any previous assignment.
pub async fn assign_employee(
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
    payload: Result<Json<AssignEmployeeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, resolver.as_ref()).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let ticket_id = match path_id(path) {
        Ok(ticket_id) => ticket_id,
        Err(err) => return err.into_response(),
    };

    let request = match json_body(payload) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    let Some(employee_id) = request.employee else {
        return TicketError::InvalidInput("employee is required").into_response();
    };

    match service
        .assign_employee(&principal, ticket_id, employee_id)
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 204, description = "Ticket deleted."),
        (status = 400, description = "Ticket id is not an integer.", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
        (status = 403, description = "Deletion requires a staff account.", body = ErrorResponse),
        (status = 404, description = "Ticket not found.", body = ErrorResponse),
    ),
    tag = "tickets"
)]
/// Hard-deletes a ticket. Staff only.
pub async fn delete_ticket(
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, resolver.as_ref()).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let ticket_id = match path_id(path) {
        Ok(ticket_id) => ticket_id,
        Err(err) => return err.into_response(),
    };

    match service.delete_ticket(&principal, ticket_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
