//! HTTP API server with observability for the bookstore backend.
//!
//! Provides REST endpoints for the catalog, accounts, checkout and shipping
//! rates, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use courier::{CourierService, RajaOngkirClient};
use domain::{AuthService, DomainError, LineItemFanOut, Registration};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/register", post(routes::users::register::<S>))
        .route("/api/login", post(routes::users::login::<S>))
        .route("/api/refresh", post(routes::users::refresh::<S>))
        .route("/api/profile", get(routes::users::profile))
        .route(
            "/api/books",
            get(routes::books::list::<S>).post(routes::books::create::<S>),
        )
        .route("/api/books/home", get(routes::books::home::<S>))
        .route(
            "/api/books/{id}",
            get(routes::books::get::<S>)
                .put(routes::books::update::<S>)
                .delete(routes::books::delete::<S>),
        )
        .route(
            "/api/orders",
            get(routes::orders::list::<S>).post(routes::orders::create::<S>),
        )
        .route("/api/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/api/orders/{id}/lines",
            post(routes::orders::repair_lines::<S>),
        )
        .route("/api/user-orders", get(routes::orders::for_user::<S>))
        .route(
            "/api/rajaongkir/province",
            get(routes::rajaongkir::provinces::<S>),
        )
        .route(
            "/api/rajaongkir/city/{province_id}",
            get(routes::rajaongkir::cities::<S>),
        )
        .route("/api/rajaongkir/cost", post(routes::rajaongkir::costs::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .max_age(Duration::from_secs(12 * 60 * 60)),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state from configuration.
///
/// Fails when the JWT secret cannot be used for signing.
pub fn create_state<S: Store>(store: S, config: &Config) -> Result<Arc<AppState<S>>, DomainError> {
    let courier: Arc<dyn CourierService> = Arc::new(RajaOngkirClient::new(
        config.rajaongkir_base_url.clone(),
        config.rajaongkir_api_key.clone(),
    ));
    create_state_with_courier(store, config, courier)
}

/// Builds the application state with an explicit courier implementation.
pub fn create_state_with_courier<S: Store>(
    store: S,
    config: &Config,
    courier: Arc<dyn CourierService>,
) -> Result<Arc<AppState<S>>, DomainError> {
    let auth = AuthService::new(store.clone(), config.jwt.clone())?;
    let fanout = LineItemFanOut::new(config.line_item_concurrency);
    Ok(Arc::new(AppState::new(store, auth, fanout, courier)))
}

/// Seeds the default catalog and provisions the configured admin account.
pub async fn bootstrap<S: Store>(state: &AppState<S>, config: &Config) -> Result<(), DomainError> {
    state.books.seed_defaults().await?;

    if let Some(admin) = &config.admin {
        let registration = Registration {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password: admin.password.expose_secret().to_string(),
        };
        match state.auth.register_admin(registration).await {
            Ok(user) => tracing::info!(user_id = %user.id, "provisioned admin account"),
            Err(DomainError::Validation(msg)) if msg.contains("already registered") => {
                tracing::debug!("admin account already exists");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
