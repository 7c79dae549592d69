use axum::{
    extract::{rejection::PathRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{
    extract::path_id,
    principal::require_auth,
    types::{EmployeeResponse, ErrorResponse},
};
use crate::repairs::{PrincipalResolver, TicketService};

#[utoipa::path(
    get,
    path = "/employees",
    responses(
        (status = 200, description = "All employees.", body = [EmployeeResponse]),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
    ),
    tag = "employees"
)]
pub async fn list_employees(
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, resolver.as_ref()).await {
        return err.into_response();
    }

    match service.list_employees().await {
        Ok(employees) => {
            let body: Vec<EmployeeResponse> =
                employees.iter().map(EmployeeResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/employees/{id}",
    params(("id" = i64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee detail.", body = EmployeeResponse),
        (status = 400, description = "Employee id is not an integer.", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
        (status = 404, description = "Employee not found.", body = ErrorResponse),
    ),
    tag = "employees"
)]
pub async fn get_employee(
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, resolver.as_ref()).await {
        return err.into_response();
    }

    let employee_id = match path_id(path) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match service.get_employee(employee_id).await {
        Ok(employee) => (StatusCode::OK, Json(EmployeeResponse::from(&employee))).into_response(),
        Err(err) => err.into_response(),
    }
}
