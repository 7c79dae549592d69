use crate::repairs::{
    memory::Seed, AccessPolicy, MemoryStore, PgStore, PrincipalResolver, TicketRepository,
    TicketService,
};
use anyhow::{bail, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, options},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

pub const MEMORY_DSN_SCHEME: &str = "memory";

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Build the complete application: documented routes, `/`, `OPTIONS /health`,
/// Swagger UI, request ids, tracing, and the shared service state.
pub fn app(service: Arc<TicketService>, resolver: Arc<dyn PrincipalResolver>) -> Router {
    let (router, openapi) = router().split_for_parts();
    router
        .route("/", get(handlers::root::root))
        .route("/health", options(handlers::health::health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(service))
                .layer(Extension(resolver)),
        )
}

/// Open the store named by `dsn`: `memory://` for the in-process store,
/// loaded from `seed` when given, anything else is handed to the Postgres pool.
///
/// # Errors
/// Returns an error if the database cannot be reached or a seed is given for
/// a database DSN.
pub async fn connect(
    dsn: &str,
    max_connections: u32,
    seed: Option<&Seed>,
) -> Result<(Arc<dyn TicketRepository>, Arc<dyn PrincipalResolver>)> {
    if dsn.starts_with(&format!("{MEMORY_DSN_SCHEME}://")) {
        let store = Arc::new(MemoryStore::new());
        if let Some(seed) = seed {
            store.load_seed(seed).await;
        }
        info!(
            seeded_users = seed.map_or(0, |seed| seed.users.len()),
            "Using in-memory store"
        );
        let repository: Arc<dyn TicketRepository> = store.clone();
        let resolver: Arc<dyn PrincipalResolver> = store;
        return Ok((repository, resolver));
    }

    if seed.is_some() {
        bail!("a seed file only applies to the {MEMORY_DSN_SCHEME}:// store");
    }

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")?;

    let store = Arc::new(PgStore::new(pool));
    let repository: Arc<dyn TicketRepository> = store.clone();
    let resolver: Arc<dyn PrincipalResolver> = store;
    Ok((repository, resolver))
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the store or to start the server
pub async fn new(
    port: u16,
    dsn: &str,
    max_connections: u32,
    policy: AccessPolicy,
    seed: Option<Seed>,
) -> Result<()> {
    let (repository, resolver) = connect(dsn, max_connections, seed.as_ref()).await?;
    let service = Arc::new(TicketService::new(repository, policy));

    let app = app(service, resolver);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!(access_policy = %policy, "Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
