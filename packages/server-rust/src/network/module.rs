//! Router assembly and the deferred-startup server lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until shutdown. Splitting bind from serve
//! lets the caller learn the bound port (useful with port 0) before any
//! request is accepted.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::{SwaggerUi, Url};

use super::config::NetworkConfig;
use super::handlers::{
    create_review, delete_review, get_review, health_handler, list_reviews, liveness_handler,
    not_found_handler, readiness_handler, review_summary, update_review, AppState,
};
use super::middleware::{build_http_layers, track_in_flight};
use super::openapi::{ApiDoc, OPENAPI_JSON_PATH, SWAGGER_UI_LABEL, SWAGGER_UI_PATH};
use super::shutdown::ShutdownController;
use crate::service::ReviewService;

/// Review routes, mounted both bare and under `/v1`.
fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/summary", get(review_summary))
        .route(
            "/reviews/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
}

/// Assembles the full router with all routes and middleware.
///
/// Routes:
/// - `/reviews...` and `/v1/reviews...` -- the review API
/// - `GET /health`, `/health/live`, `/health/ready` -- probes
/// - `GET /api-docs/v1/openapi.json` -- generated OpenAPI document
/// - `GET /swagger-ui` -- interactive documentation
pub fn build_router(state: AppState, config: &NetworkConfig) -> Router {
    let in_flight =
        axum::middleware::from_fn_with_state(Arc::clone(&state.shutdown), track_in_flight);

    Router::new()
        .merge(review_routes())
        .nest("/v1", review_routes())
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(
            Url::new(SWAGGER_UI_LABEL, OPENAPI_JSON_PATH),
            ApiDoc::openapi(),
        ))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(in_flight)
        .layer(build_http_layers(config))
        .with_state(state)
}

/// Owns the listener and the shared lifecycle controller.
pub struct NetworkModule {
    config: NetworkConfig,
    service: ReviewService,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, service: ReviewService) -> Self {
        Self {
            config,
            service,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Shared handle to the lifecycle controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Binds the TCP listener and returns the actual port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves or
    /// [`ShutdownController::trigger_shutdown`] is called, then waits up to
    /// `drain_timeout` for in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;

        let state = AppState {
            service: self.service,
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
        };
        let router = build_router(state, &self.config);

        let ctrl = Arc::clone(&self.shutdown);
        let signal = async move {
            tokio::select! {
                () = shutdown => {},
                () = ctrl.signalled() => {},
            }
            ctrl.trigger_shutdown();
            info!("shutdown requested, draining");
        };

        self.shutdown.set_ready();
        info!("serving review API");

        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await?;

        if self.shutdown.wait_for_drain(self.config.drain_timeout).await {
            info!("all requests drained");
        } else {
            warn!("drain timeout expired with in-flight requests remaining");
        }
        Ok(())
    }
}
