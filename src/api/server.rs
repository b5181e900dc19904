//! HTTP API server

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AuthService, MemoryIdentityStore, MemorySessionStore};
use crate::config::{Config, StorageBackend};
use crate::error::{Error, Result};
use crate::storage::{self, PostgresIdentityStore, PostgresSessionStore};

use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub auth: AuthService,
}

pub type SharedState = Arc<AppState>;

/// Run the HTTP API server until Ctrl-C / SIGTERM
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    config.validate()?;
    let (auth, purge_task) = build_auth(&config).await?;

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(
        "Server listening on {} ({:?} storage)",
        addr,
        config.storage.backend
    );

    let result = serve(listener, auth, shutdown_signal()).await;
    purge_task.abort();
    tracing::info!("Server stopped");
    result
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, auth: AuthService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState { auth });
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Wire the stores named by the config into an [`AuthService`], along with
/// the task that purges evicted sessions
pub async fn build_auth(config: &Config) -> Result<(AuthService, JoinHandle<()>)> {
    let every = config.storage.purge_interval();

    match config.storage.backend {
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .ok_or_else(|| Error::Config("database.url is not set".to_string()))?;

            let client = storage::connect(url).await?;
            storage::migrate(&client).await?;

            let sessions = PostgresSessionStore::new(client.clone());
            let purge_task = storage::spawn_purge_task(sessions.clone(), every);
            let auth = AuthService::from_config(
                config,
                Arc::new(PostgresIdentityStore::new(client)),
                Arc::new(sessions),
            );
            Ok((auth, purge_task))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; users and sessions are lost on restart");

            let sessions = MemorySessionStore::new();
            let purge_task = spawn_memory_purge(sessions.clone(), every);
            let auth = AuthService::from_config(
                config,
                Arc::new(MemoryIdentityStore::new()),
                Arc::new(sessions),
            );
            Ok((auth, purge_task))
        }
    }
}

fn spawn_memory_purge(store: MemorySessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} evicted sessions", purged);
            }
        }
    })
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let identified = Router::new()
        .route("/api/auth/logout", put(routes::logout))
        .route(
            "/api/me",
            get(routes::me).layer(middleware::from_fn(auth::age_gate)),
        )
        .route(
            "/api/admin/users/{id}",
            get(routes::get_user).layer(middleware::from_fn(auth::require_admin)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::identify));

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/auth/sign-up", post(routes::sign_up))
        .route("/api/auth/sign-in", post(routes::sign_in))
        .route("/api/auth/refresh", post(routes::refresh))
        .merge(identified)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
