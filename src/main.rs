use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tracing::{info, warn};

use leadflow::admins::{admin_router, AdminService, AdminServiceError, NewAdmin};
use leadflow::auth::{auth_router, AuthApi, AuthGuard, JwtService};
use leadflow::config::AppConfig;
use leadflow::error::AppError;
use leadflow::leads::domain::Timeframe;
use leadflow::leads::{compute_score, lead_router, LeadService};
use leadflow::messages::{message_router, MessageService};
use leadflow::notify::LogNotifier;
use leadflow::{store, telemetry};

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Lead Intake Service",
    about = "Run the real-estate lead intake and admin management service",
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
    /// Score a hypothetical lead and print the factor breakdown
    Score(ScoreArgs),
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
struct ScoreArgs {
    /// Contact expressed selling interest
    #[arg(long)]
    selling: bool,
    /// Contact expressed buying interest
    #[arg(long)]
    buying: bool,
    /// Timeframe as submitted, e.g. "1-3 months"
    #[arg(long, default_value = "not sure")]
    timeframe: String,
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
        Command::Score(args) => {
            run_score(args);
            Ok(())
        }
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let store = store::ensure_initialized();
    let notifier = Arc::new(LogNotifier);
    let lead_service = Arc::new(LeadService::new(
        store.clone(),
        store.clone(),
        notifier,
        config.notifications.mode,
    ));
    let admin_service = Arc::new(AdminService::new(store.clone()));
    let message_service = Arc::new(MessageService::new(store));

    let jwt = JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_issuer.clone(),
        config.auth.token_ttl_hours,
    );
    let guard = Arc::new(AuthGuard {
        jwt: jwt.clone(),
        disabled: config.auth.disabled,
    });
    let auth_api = Arc::new(AuthApi::new(
        admin_service.clone(),
        jwt,
        config.auth.allow_registration,
    ));

    bootstrap_admin(&config, &admin_service).await;

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(lead_router(lead_service, guard.clone()))
        .merge(admin_router(admin_service, guard.clone()))
        .merge(message_router(message_service, guard.clone()))
        .merge(auth_router(auth_api, guard))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Seed the first admin account from the environment so a fresh store
/// has a login. A taken username is left alone.
async fn bootstrap_admin<S>(config: &AppConfig, admins: &AdminService<S>)
where
    S: leadflow::admins::AdminRepository + 'static,
{
    let (Some(username), Some(password)) = (
        config.auth.bootstrap_username.clone(),
        config.auth.bootstrap_password.clone(),
    ) else {
        return;
    };

    let seed = NewAdmin {
        username: username.clone(),
        password,
        first_name: "Bootstrap".to_string(),
        last_name: "Admin".to_string(),
        email: config.notifications.sender.clone(),
        role: Some("admin".to_string()),
    };
    match admins.create(seed).await {
        Ok(_) => info!(%username, "bootstrap admin created"),
        Err(AdminServiceError::UsernameTaken) => {}
        Err(err) => warn!(%username, error = %err, "bootstrap admin creation failed"),
    }
}

fn run_score(args: ScoreArgs) {
    let timeframe = Timeframe::parse(&args.timeframe);
    let result = compute_score(args.selling, args.buying, timeframe);

    println!("Lead scoring demo ({})", result.score_version);
    println!(
        "Inputs: selling={}, buying={}, timeframe={}",
        args.selling,
        args.buying,
        timeframe.label()
    );
    println!("\nFactors");
    println!("- intent_selling: {}", result.factors.intent_selling);
    println!("- intent_buying: {}", result.factors.intent_buying);
    println!("- timeframe_score: {}", result.factors.timeframe_score);
    println!("- quality_score: {}", result.factors.quality_score);
    println!("- base_value: {}", result.factors.base_value);
    println!(
        "\nTotal: {} -> {}",
        result.total_score,
        result.category.label()
    );
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
