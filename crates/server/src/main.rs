//! TenantGrid control plane service
//!
//! The single entry point for tenant lifecycle management:
//! - HTTP API for tenant administration (create, update, suspend,
//!   activate, soft delete, list)
//! - gRPC read API for internal services (get, validate, list)
//! - Observability (structured logs, Prometheus metrics, health probes)

mod grpc;
mod handlers;
mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tenantgrid_common::{
    auth::TokenVerifier,
    config::AppConfig,
    db::{Db, PgTenantStore},
    errors::{ErrorCode, ErrorResponse},
    events::{EventPublisher, KafkaPublisher, NoopPublisher},
    lifecycle::TenantLifecycle,
    metrics::{register_metrics, LATENCY_BUCKETS, PROVISIONING_BUCKETS},
    provisioning::SchemaProvisioner,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Db,
    pub lifecycle: Arc<TenantLifecycle>,
    pub verifier: Option<Arc<TokenVerifier>>,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().context("failed to load configuration")?);

    // Initialize tracing
    init_tracing(&config);

    info!(
        version = tenantgrid_common::VERSION,
        env = %config.server.env,
        port = config.server.port,
        grpc_port = config.server.grpc_port,
        "Starting TenantGrid service"
    );

    if !config.telemetry.jaeger_agent_host.is_empty() {
        info!(
            agent = %config.telemetry.jaeger_agent_host,
            port = config.telemetry.jaeger_agent_port,
            service = %config.telemetry.jaeger_service_name,
            "Jaeger agent configured"
        );
    }

    // Initialize metrics
    let metrics_handle = if config.telemetry.prometheus_enabled {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("request_duration_seconds".into()),
                LATENCY_BUCKETS,
            )
            .context("metrics buckets")?
            .set_buckets_for_metric(
                Matcher::Suffix("provisioning_duration_seconds".into()),
                PROVISIONING_BUCKETS,
            )
            .context("metrics buckets")?
            .install_recorder()
            .context("failed to install metrics recorder")?;
        register_metrics();
        Some(handle)
    } else {
        None
    };

    // Database
    let db = Db::connect(&config.database).await?;
    let store = Arc::new(PgTenantStore::new(db.conn().clone()));
    let provisioner = Arc::new(SchemaProvisioner::new(
        db.conn().clone(),
        config.database.migrations_path.clone(),
    ));

    // Event publisher: Kafka when configured, no-op otherwise
    let publisher: Arc<dyn EventPublisher> = if config.kafka.is_configured() {
        match KafkaPublisher::new(&config.kafka) {
            Ok(producer) => Arc::new(producer),
            Err(e) => {
                warn!(error = %e, "Failed to initialize Kafka producer, using no-op publisher");
                Arc::new(NoopPublisher)
            }
        }
    } else {
        warn!("Kafka not configured, using no-op event publisher");
        Arc::new(NoopPublisher)
    };

    // Orchestrator
    let lifecycle = Arc::new(TenantLifecycle::new(
        store,
        provisioner,
        Arc::clone(&publisher),
    ));

    // Token verifier
    let verifier = if config.jwt.is_configured() {
        Some(Arc::new(TokenVerifier::from_config(&config.jwt).await?))
    } else {
        warn!("JWT_PUBLIC_KEY_URL not set, request authentication is DISABLED");
        None
    };

    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        lifecycle: Arc::clone(&lifecycle),
        verifier,
        metrics: metrics_handle,
    };

    // Shutdown broadcast shared by both listeners
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // HTTP server
    let app = create_router(state);
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;
    info!(addr = %http_addr, "HTTP server listening");

    let mut http_shutdown = shutdown_rx.clone();
    let http_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = http_shutdown.changed().await;
            })
            .await
    });

    // gRPC server with health and reflection sub-services
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<tenantgrid_common::proto::tenant::tenant_service_server::TenantServiceServer<grpc::TenantGrpcService>>()
        .await;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(tenantgrid_common::proto::FILE_DESCRIPTOR_SET)
        .build()
        .context("failed to build reflection service")?;

    let grpc_addr = SocketAddr::from(([0, 0, 0, 0], config.server.grpc_port));
    info!(addr = %grpc_addr, "gRPC server listening");

    let mut grpc_shutdown = shutdown_rx.clone();
    let grpc_task = tokio::spawn(
        tonic::transport::Server::builder()
            .add_service(health_service)
            .add_service(reflection_service)
            .add_service(grpc::TenantGrpcService::new(lifecycle).into_server())
            .serve_with_shutdown(grpc_addr, async move {
                let _ = grpc_shutdown.changed().await;
            }),
    );

    // Drain both servers; force-stop after the shutdown timeout.
    let drain = async {
        let (http_res, grpc_res) = tokio::join!(http_task, grpc_task);
        match http_res {
            Ok(Err(e)) => error!(error = %e, "HTTP server error"),
            Err(e) => error!(error = %e, "HTTP server task panicked"),
            _ => {}
        }
        match grpc_res {
            Ok(Err(e)) => error!(error = %e, "gRPC server error"),
            Err(e) => error!(error = %e, "gRPC server task panicked"),
            _ => {}
        }
    };
    tokio::pin!(drain);

    let mut force_stop = shutdown_rx.clone();
    tokio::select! {
        _ = &mut drain => info!("Servers stopped"),
        _ = async {
            let _ = force_stop.changed().await;
            tokio::time::sleep(config.shutdown_timeout()).await;
        } => warn!(
            timeout_secs = config.server.shutdown_timeout_secs,
            "Drain timed out, forcing shutdown"
        ),
    }

    // The publisher goes last so enqueued events get a chance to drain.
    publisher.close().await;
    if let Err(e) = db.close().await {
        warn!(error = %e, "Database pool close failed");
    }

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Tenant management requires a bearer token with the admin role.
    let tenant_routes = Router::new()
        .route(
            "/",
            post(handlers::tenants::create_tenant).get(handlers::tenants::list_tenants),
        )
        .route(
            "/{id}",
            get(handlers::tenants::get_tenant)
                .patch(handlers::tenants::update_tenant)
                .delete(handlers::tenants::delete_tenant),
        )
        .route("/{id}/suspend", post(handlers::tenants::suspend_tenant))
        .route("/{id}/activate", post(handlers::tenants::activate_tenant))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        // Public probes
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api/v1/tenants", tenant_routes)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        // route_layer so the metrics recorder sees the matched route template
        .route_layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(ErrorCode::NotFound, "Endpoint not found")),
    )
}

async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new(
            ErrorCode::MethodNotAllowed,
            "HTTP method not allowed",
        )),
    )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
