use axum::{
    extract::{Path, State},
    response::Json,
};
use sqlx::sqlite::SqlitePool;
use crate::db;
use crate::error::ApiError;
use crate::models::PlayerStateOut;

// GET /players/:username/state/ - Get a player's state
pub async fn get_player_state(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<Json<PlayerStateOut>, ApiError> {
    let state = db::get_player_state(&pool, &username).await?;

    Ok(Json(state))
}

// GET /players/state/ - State of every player, including those without scores
pub async fn get_all_states(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<PlayerStateOut>>, ApiError> {
    let states = db::list_all_player_states(&pool).await?;

    Ok(Json(states))
}

// PATCH /players/:username/state/ - Flip active <-> inactive
pub async fn toggle_player_state(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<Json<PlayerStateOut>, ApiError> {
    let state = db::toggle_player_state(&pool, &username).await?;

    Ok(Json(state))
}
