use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use evcharge::store::{BookingStore, CancelOutcome, PgStore};
use evcharge::{api, cli, config, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "evcharge=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Station { command }) => {
            let store = connect(&cfg).await?;
            handle_station_command(&store, command).await
        }
        Some(cli::Commands::Booking { command }) => {
            let store = connect(&cfg).await?;
            handle_booking_command(&store, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn connect(cfg: &config::Config) -> anyhow::Result<PgStore> {
    PgStore::connect(
        &cfg.database_url,
        Duration::from_secs(cfg.db_acquire_timeout_secs),
    )
    .await
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let store = connect(&cfg).await?;

    tracing::info!("Running migrations...");
    store.migrate().await?;

    let store: Arc<dyn BookingStore> = Arc::new(store);
    let web_origin = cfg.web_origin.clone();
    let state = Arc::new(AppState::new(store.clone(), cfg));

    let app = axum::Router::new()
        // Health endpoint (no auth)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .nest("/api/v1", api::api_router(state.clone()))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer({
            use axum::http::Method;
            use tower_http::cors::AllowOrigin;
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str == web_origin
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::HeaderName::from_static("content-type"),
                    axum::http::HeaderName::from_static("authorization"),
                ])
        })
        .layer(axum::middleware::from_fn(request_id_middleware));

    // Hourly sweep retiring past confirmed bookings to `completed`.
    jobs::completion::spawn(store);
    tracing::info!("Background completion sweep started (hourly)");

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("EVCharge API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware: injects a unique X-Request-Id into every response so
/// clients can correlate errors with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

async fn handle_station_command(
    store: &PgStore,
    cmd: cli::StationCommands,
) -> anyhow::Result<()> {
    match cmd {
        cli::StationCommands::List { owner_id } => {
            let stations = match owner_id {
                Some(raw) => {
                    let id: Uuid = raw.parse().context("invalid owner id")?;
                    store.stations_for_owner(id).await?
                }
                None => store.list_active_stations().await?,
            };
            if stations.is_empty() {
                println!("No stations found.");
            } else {
                println!("{:<38} {:<24} {:<8} {:<8}", "ID", "NAME", "PRICE/H", "ACTIVE");
                for s in stations {
                    println!(
                        "{:<38} {:<24} {:<8.2} {:<8}",
                        s.id, s.name, s.price_per_hour, s.is_active
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_booking_command(
    store: &PgStore,
    cmd: cli::BookingCommands,
) -> anyhow::Result<()> {
    match cmd {
        cli::BookingCommands::List { user_id } => {
            let id: Uuid = user_id.parse().context("invalid user id")?;
            let bookings = store.bookings_for_user(id).await?;
            if bookings.is_empty() {
                println!("No bookings found.");
            } else {
                println!(
                    "{:<38} {:<24} {:<12} {:<7} {:<10}",
                    "ID", "STATION", "DATE", "SLOT", "STATUS"
                );
                for b in bookings {
                    println!(
                        "{:<38} {:<24} {:<12} {:<7} {:<10}",
                        b.id,
                        b.station_name,
                        b.date.format("%Y-%m-%d"),
                        b.time_slot,
                        b.status.as_str()
                    );
                }
            }
        }
        cli::BookingCommands::Cancel { booking_id } => {
            let id: Uuid = booking_id.parse().context("invalid booking id")?;
            match store.cancel_booking(id).await? {
                CancelOutcome::Cancelled => println!("Booking cancelled."),
                CancelOutcome::AlreadyCancelled => println!("Booking was already cancelled."),
                CancelOutcome::NotFound => println!("Booking not found."),
            }
        }
    }
    Ok(())
}
