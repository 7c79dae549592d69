//! Rejection mapping for axum extractors.
//!
//! Handlers take `Result<Path<_>, PathRejection>` (and the query/body
//! equivalents) so they can authenticate first and then report decoding
//! failures with the same JSON error body as every other error.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Json,
};

use crate::repairs::TicketError;

pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, TicketError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| TicketError::MalformedRequest(rejection.body_text()))
}

pub(crate) fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, TicketError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| TicketError::MalformedRequest(rejection.body_text()))
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, TicketError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| TicketError::MalformedRequest(rejection.body_text()))
}
