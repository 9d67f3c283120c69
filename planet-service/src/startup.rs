//! Application startup and lifecycle management.
//!
//! `Application::build` moves the service from *starting* (database connection
//! attempt in flight, listener unbound) to a bound listener. Whatever the
//! outcome of the database connection, the service then serves until a
//! shutdown signal arrives; the database session is closed afterwards.

use crate::config::{MongoConfig, PlanetConfig, WebConfig};
use crate::handlers;
use crate::services::{
    CollectorLogger, CollectorWorker, DisconnectedStore, LogEntry, PlanetDb, PlanetStore,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, get_service, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use service_core::observability::MetricsRegistry;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlanetStore>,
    pub collector: CollectorLogger,
    pub metrics: MetricsRegistry,
    pub environment: Option<String>,
}

pub fn build_router(state: AppState, web: &WebConfig) -> Router {
    Router::new()
        .route("/", get_service(ServeFile::new(web.index_file())))
        .route("/planet", post(handlers::find_planet))
        .route("/os", get(handlers::host_info))
        .route("/live", get(handlers::liveness))
        .route("/ready", get(handlers::readiness))
        .route("/metrics", get(handlers::metrics))
        // Everything else under the web root is public.
        .fallback_service(ServeDir::new(&web.root))
        .layer(from_fn_with_state(state.metrics.clone(), metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
    collector_worker: Option<CollectorWorker>,
}

impl Application {
    /// Connect to MongoDB and bind the HTTP listener.
    ///
    /// A failed database connection is logged and forwarded, never returned:
    /// the service starts with a store that fails every lookup.
    pub async fn build(config: PlanetConfig) -> Result<Self, AppError> {
        for (name, status) in config.describe_mongo_env() {
            tracing::info!("{}: {}", name, status);
        }

        let (collector, collector_worker) = CollectorLogger::spawn(&config.collector);
        let store = connect_store(&config.mongodb, &collector).await;

        Self::assemble(config, store, collector, collector_worker).await
    }

    /// Build around an already constructed store instead of MongoDB.
    pub async fn build_with_store(
        config: PlanetConfig,
        store: Arc<dyn PlanetStore>,
    ) -> Result<Self, AppError> {
        let (collector, collector_worker) = CollectorLogger::spawn(&config.collector);
        Self::assemble(config, store, collector, collector_worker).await
    }

    async fn assemble(
        config: PlanetConfig,
        store: Arc<dyn PlanetStore>,
        collector: CollectorLogger,
        collector_worker: Option<CollectorWorker>,
    ) -> Result<Self, AppError> {
        let metrics = MetricsRegistry::new()?;

        let state = AppState {
            store,
            collector,
            metrics,
            environment: config.environment.clone(),
        };
        let router = build_router(state.clone(), &config.web);

        // Port 0 = random port for testing
        let addr = config.common.bind_address();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router,
            state,
            collector_worker,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then close the database session and
    /// give the collector queue a bounded time to drain.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            port,
            listener,
            router,
            state,
            collector_worker,
        } = self;

        tracing::info!("Server successfully running on port - {}", port);
        state
            .collector
            .send(LogEntry::info("Server started").field("port", port));

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;
        if let Err(e) = &served {
            tracing::error!("HTTP server error: {}", e);
        }

        let AppState {
            store, collector, ..
        } = state;
        store.shutdown().await;
        drop(store);

        // The worker stops once the last sender is gone.
        drop(collector);
        if let Some(worker) = collector_worker {
            worker.finish().await;
        }

        served
    }
}

async fn connect_store(
    config: &MongoConfig,
    collector: &CollectorLogger,
) -> Arc<dyn PlanetStore> {
    match PlanetDb::connect(config).await {
        Ok(db) => {
            tracing::info!("MongoDB Connection Successful");
            collector.send(LogEntry::info("MongoDB connected successfully"));
            Arc::new(db)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                "MongoDB connection failed, serving without a database session"
            );
            collector.send(
                LogEntry::error("MongoDB connection failed").field("error", e.to_string()),
            );
            Arc::new(DisconnectedStore::new(e.to_string()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
