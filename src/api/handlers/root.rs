use axum::response::IntoResponse;

// Plain-text banner for `/`, not part of the OpenAPI document
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
