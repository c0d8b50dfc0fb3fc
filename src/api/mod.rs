use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};

use crate::auth::{hash_session_token, Identity};
use crate::errors::AppError;
use crate::AppState;

pub mod handlers;

/// Build the API router. All routes are relative; the caller mounts this
/// under `/api/v1`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/stations",
            get(handlers::list_stations).post(handlers::create_station),
        )
        .route(
            "/stations/:id",
            put(handlers::update_station).delete(handlers::delete_station),
        )
        .route(
            "/stations/:id/availability",
            get(handlers::check_availability),
        )
        .route(
            "/bookings",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/bookings/:id/cancel", post(handlers::cancel_booking))
        .route("/bookings/:id/ics", get(handlers::booking_ics))
        .layer(middleware::from_fn_with_state(state, session_auth))
}

/// Middleware: resolves the bearer session token to a caller identity and
/// attaches it to the request. A missing token is not an error here;
/// public routes work anonymously and protected operations reject with
/// `AuthenticationRequired` themselves. A token that no longer resolves
/// (revoked, expired) is rejected outright.
async fn session_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let identity = match token {
        None => Identity(None),
        Some(token) => {
            let caller = state
                .store
                .caller_by_session(&hash_session_token(token))
                .await?;
            match caller {
                Some(caller) => Identity(Some(caller)),
                None => {
                    tracing::warn!("request with unknown or expired session token");
                    return Err(AppError::AuthenticationRequired);
                }
            }
        }
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
