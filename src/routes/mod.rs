pub mod health;
pub mod players;
pub mod scores;
pub mod state;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use sqlx::sqlite::SqlitePool;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Build the full router. Static segments (`scores/`, `state/`) win over `{username}`.
pub fn router(pool: SqlitePool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Root and health
        .route("/", get(|| async { "Player Risk API - v1.0" }))
        .route("/health", get(health::health_check))

        // Player endpoints
        .route("/players/", get(players::get_players).post(players::create_player))
        .route("/players/{username}", get(players::get_player).delete(players::delete_player))

        // Score endpoints
        .route("/players/scores/", get(scores::get_all_scores))
        .route(
            "/players/{username}/scores/",
            get(scores::get_player_scores).post(scores::add_risk_score),
        )

        // State endpoints
        .route("/players/state/", get(state::get_all_states))
        .route(
            "/players/{username}/state/",
            get(state::get_player_state).patch(state::toggle_player_state),
        )

        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(process_time)),
        )
        .with_state(pool)
}

// Stamp every response with how long the handler took, in seconds
async fn process_time(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    if let Ok(value) = HeaderValue::from_str(&elapsed.to_string()) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}
