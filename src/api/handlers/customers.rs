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
    types::{CustomerResponse, ErrorResponse},
};
use crate::repairs::{PrincipalResolver, TicketService};

#[utoipa::path(
    get,
    path = "/customers",
    responses(
        (status = 200, description = "All customers.", body = [CustomerResponse]),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn list_customers(
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, resolver.as_ref()).await {
        return err.into_response();
    }

    match service.list_customers().await {
        Ok(customers) => {
            let body: Vec<CustomerResponse> =
                customers.iter().map(CustomerResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer detail.", body = CustomerResponse),
        (status = 400, description = "Customer id is not an integer.", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API token.", body = ErrorResponse),
        (status = 404, description = "Customer not found.", body = ErrorResponse),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    path: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    Extension(service): Extension<Arc<TicketService>>,
    Extension(resolver): Extension<Arc<dyn PrincipalResolver>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, resolver.as_ref()).await {
        return err.into_response();
    }

    let customer_id = match path_id(path) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match service.get_customer(customer_id).await {
        Ok(customer) => (StatusCode::OK, Json(CustomerResponse::from(&customer))).into_response(),
        Err(err) => err.into_response(),
    }
}
