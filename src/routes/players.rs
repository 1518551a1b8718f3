use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    response::Json,
};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use crate::db;
use crate::error::ApiError;
use crate::models::PlayerOut;
use crate::validation::{NewPlayer, Pagination};

// GET /players/?skip=0&limit=10 - List players in storage order
pub async fn get_players(
    State(pool): State<SqlitePool>,
    params: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<PlayerOut>>, ApiError> {
    let Query(page) = params?;
    let players = db::list_players(&pool, page).await?;

    Ok(Json(players))
}

// GET /players/:username - Get player with its risk scores
pub async fn get_player(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<Json<PlayerOut>, ApiError> {
    let player = db::get_player(&pool, &username).await?;

    Ok(Json(player))
}

// POST /players/ - Create a player
pub async fn create_player(
    State(pool): State<SqlitePool>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PlayerOut>, ApiError> {
    let Json(body) = payload?;
    let new_player = NewPlayer::from_json(&body)?;

    let player = db::create_player(&pool, new_player).await?;

    Ok(Json(player))
}

// DELETE /players/:username - Delete a player and its scores
pub async fn delete_player(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<Json<PlayerOut>, ApiError> {
    let player = db::delete_player(&pool, &username).await?;

    Ok(Json(player))
}
