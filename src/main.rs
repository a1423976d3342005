use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use dispatch_ai::config::{AppConfig, ReferencePaths};
use dispatch_ai::dispatch::memory::{MemoryAlerts, MemoryRepository, StaticWeather};
use dispatch_ai::dispatch::{
    dispatch_router, AreaProfiles, DispatchService, RawShipmentSubmission, ReferenceData,
    VehicleSpecs,
};
use dispatch_ai::error::AppError;
use dispatch_ai::telemetry;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Dispatch Decision Service",
    about = "Run the last-mile dispatch risk pipeline from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a single shipment submission from a JSON file and print the
    /// decision
    Assess(AssessArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Path to a JSON shipment submission
    #[arg(long)]
    file: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Assess(args) => run_assess(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let reference = load_reference(&config.reference)?;
    let service = Arc::new(DispatchService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(MemoryAlerts::default()),
        StaticWeather::clear(),
        reference,
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(dispatch_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dispatch decision service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.file)?;
    let submission: RawShipmentSubmission = serde_json::from_str(&raw)
        .map_err(|err| AppError::InvalidInput(format!("unreadable submission: {err}")))?;

    let config = AppConfig::load()?;
    let reference = load_reference(&config.reference)?;
    let service = DispatchService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(MemoryAlerts::default()),
        StaticWeather::clear(),
        reference,
    );

    let now = Utc::now();
    let record = service
        .submit(submission, now.date_naive())
        .map_err(|err| AppError::InvalidInput(err.to_string()))?;
    let view = service
        .evaluate(&record.shipment.id, now.date_naive(), now)
        .map_err(|err| AppError::InvalidInput(err.to_string()))?;

    let rendered = serde_json::to_string_pretty(&view)
        .map_err(|err| AppError::InvalidInput(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn load_reference(paths: &ReferencePaths) -> Result<ReferenceData, AppError> {
    let mut reference = ReferenceData::default();
    if let Some(path) = &paths.area_profiles {
        reference.area_profiles = AreaProfiles::from_path(path)?;
    }
    if let Some(path) = &paths.vehicle_specs {
        reference.vehicle_specs = VehicleSpecs::from_path(path)?;
    }
    Ok(reference)
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
