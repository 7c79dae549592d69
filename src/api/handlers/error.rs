//! HTTP mapping for `TicketError`.
//!
//! Every error carries an `ErrorResponse` body. Repository failures are logged
//! server-side and surfaced as a generic `500`.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::types::ErrorResponse;
use crate::repairs::TicketError;

pub(crate) fn status_for(err: &TicketError) -> StatusCode {
    match err {
        TicketError::NotFound(_) => StatusCode::NOT_FOUND,
        TicketError::InvalidInput(_) | TicketError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
        TicketError::Unauthenticated => StatusCode::UNAUTHORIZED,
        TicketError::Forbidden(_) => StatusCode::FORBIDDEN,
        TicketError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for TicketError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = match &self {
            Self::Repository(err) => {
                error!("Repository error: {err}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message,
        });

        let mut response = (status, body).into_response();
        if matches!(self, Self::Unauthenticated) {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
        }
        response
    }
}
