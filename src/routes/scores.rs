use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    response::Json,
};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use crate::db;
use crate::error::ApiError;
use crate::models::{PlayerScoresOut, RiskScoreOut};
use crate::validation::{NewRiskScore, Pagination};

// POST /players/:username/scores/ - Append a risk score
pub async fn add_risk_score(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RiskScoreOut>, ApiError> {
    let Json(body) = payload?;
    let new_score = NewRiskScore::from_json(&body)?;

    let score = db::add_risk_score(&pool, &username, new_score).await?;

    Ok(Json(score))
}

// GET /players/:username/scores/?skip=0&limit=10 - Player's scores, oldest first
pub async fn get_player_scores(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
    params: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<RiskScoreOut>>, ApiError> {
    let Query(page) = params?;
    let scores = db::list_scores_for_player(&pool, &username, page).await?;

    Ok(Json(scores))
}

// GET /players/scores/ - Every score, grouped by player
pub async fn get_all_scores(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<PlayerScoresOut>>, ApiError> {
    let groups = db::list_all_scores(&pool).await?;

    Ok(Json(groups))
}
