use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trainhub_api::config::ServerConfig;
use trainhub_api::engine::{EventIngest, RunDispatcher};
use trainhub_api::notifications::NotificationBridge;
use trainhub_api::{routes, state::AppState};
use trainhub_dispatch::StationClient;
use trainhub_notify::{PollRegistry, UpdateBus};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trainhub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = trainhub_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    trainhub_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    trainhub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Update bus and long-poll registries ---
    let bus = Arc::new(UpdateBus::default());
    let run_registry = Arc::new(PollRegistry::new());
    let job_registry = Arc::new(PollRegistry::new());

    let sweeper_cancel = tokio_util::sync::CancellationToken::new();
    let run_sweeper = tokio::spawn(
        Arc::clone(&run_registry).run_sweeper(sweeper_cancel.clone()),
    );
    let job_sweeper = tokio::spawn(
        Arc::clone(&job_registry).run_sweeper(sweeper_cancel.clone()),
    );

    // Bridge bus updates into the registries.
    let bridge = NotificationBridge::new(Arc::clone(&run_registry), Arc::clone(&job_registry));
    let bridge_handle = tokio::spawn(bridge.run(bus.subscribe()));

    // --- Ingestion engine ---
    let ingest = EventIngest::new(pool.clone(), Arc::clone(&bus));

    // --- Run dispatcher ---
    let station_client = Arc::new(StationClient::new(
        config.callback_root.clone(),
        Duration::from_secs(config.dispatch_timeout_secs),
    ));
    let dispatcher = RunDispatcher::new(
        pool.clone(),
        ingest.clone(),
        station_client,
        Duration::from_secs(config.dispatch_interval_secs),
    );
    let dispatcher_cancel = tokio_util::sync::CancellationToken::new();
    let dispatcher_cancel_clone = dispatcher_cancel.clone();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(dispatcher_cancel_clone).await;
    });
    tracing::info!("Background services started (bridge, sweepers, dispatcher)");

    // --- App state ---
    let app_state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ingest,
        run_registry,
        job_registry,
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = routes::router()
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(app_state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    dispatcher_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Run dispatcher stopped");

    // Dropping the bus closes the broadcast channel, which ends the
    // bridge loop.
    drop(bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), bridge_handle).await;

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), run_sweeper).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), job_sweeper).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid; we want
/// misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
