use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{is_unique_violation, ApiError};
use crate::models::*;
use crate::validation::{NewPlayer, NewRiskScore, Pagination};

// Every statement is idempotent so startup can run them on an existing file
const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS players (
           username    TEXT PRIMARY KEY NOT NULL,
           first_name  TEXT NOT NULL,
           last_name   TEXT NOT NULL,
           middle_name TEXT,
           birthday    TEXT NOT NULL,
           gender      TEXT NOT NULL CHECK (gender IN ('male', 'female', 'others')),
           state       TEXT NOT NULL CHECK (state IN ('active', 'inactive'))
       )"#,
    r#"CREATE TABLE IF NOT EXISTS scores (
           id              INTEGER PRIMARY KEY AUTOINCREMENT,
           player_username TEXT NOT NULL REFERENCES players(username) ON DELETE CASCADE,
           score           REAL NOT NULL CHECK (score >= 0 AND score <= 100),
           created_at      TEXT NOT NULL
       )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_scores_player_created_at
           ON scores (player_username, created_at)"#,
];

/// Open the pool with foreign keys enforced on every connection
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Begin a transaction that takes the write lock up front.
///
/// A deferred transaction that reads before writing can deadlock against
/// another one doing the same, and SQLite fails one of them immediately
/// instead of waiting. Taking the lock at BEGIN makes writers queue on the
/// busy timeout, which also serializes read-modify-write operations.
async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

// Row helpers, run on the caller's transaction

async fn fetch_player(conn: &mut SqliteConnection, username: &str) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>(
        r#"SELECT * FROM players WHERE username = ?"#
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await
}

async fn fetch_scores(conn: &mut SqliteConnection, username: &str) -> Result<Vec<RiskScore>, sqlx::Error> {
    sqlx::query_as::<_, RiskScore>(
        r#"SELECT * FROM scores
           WHERE player_username = ?
           ORDER BY created_at, id"#
    )
    .bind(username)
    .fetch_all(&mut *conn)
    .await
}

// Access operations: one transaction each, rolled back on drop if not committed.
// Anything that writes starts with begin_write.

pub async fn list_players(pool: &SqlitePool, page: Pagination) -> Result<Vec<PlayerOut>, ApiError> {
    let mut tx = pool.begin().await?;

    let players = sqlx::query_as::<_, Player>(
        r#"SELECT * FROM players ORDER BY rowid LIMIT ? OFFSET ?"#
    )
    .bind(i64::from(page.limit))
    .bind(i64::from(page.skip))
    .fetch_all(&mut *tx)
    .await?;

    let mut out = Vec::with_capacity(players.len());
    for player in &players {
        let scores = fetch_scores(&mut tx, &player.username).await?;
        out.push(player.to_player_out(&scores));
    }

    tx.commit().await?;
    Ok(out)
}

pub async fn get_player(pool: &SqlitePool, username: &str) -> Result<PlayerOut, ApiError> {
    let mut tx = pool.begin().await?;

    let player = fetch_player(&mut tx, username)
        .await?
        .ok_or_else(ApiError::player_not_found)?;
    let scores = fetch_scores(&mut tx, username).await?;

    tx.commit().await?;
    Ok(player.to_player_out(&scores))
}

pub async fn create_player(pool: &SqlitePool, new: NewPlayer) -> Result<PlayerOut, ApiError> {
    let mut tx = begin_write(pool).await?;

    if fetch_player(&mut tx, &new.username).await?.is_some() {
        return Err(ApiError::player_exists());
    }

    sqlx::query(
        r#"INSERT INTO players
           (username, first_name, last_name, middle_name, birthday, gender, state)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#
    )
    .bind(&new.username)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.middle_name)
    .bind(new.birthday)
    .bind(new.gender)
    .bind(new.state)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::player_exists()
        } else {
            ApiError::from(e)
        }
    })?;

    tx.commit().await?;
    tracing::info!("Created player {}", new.username);

    let player = Player {
        username: new.username,
        first_name: new.first_name,
        last_name: new.last_name,
        middle_name: new.middle_name,
        birthday: new.birthday,
        gender: new.gender,
        state: new.state,
    };
    Ok(player.to_player_out(&[]))
}

pub async fn add_risk_score(
    pool: &SqlitePool,
    username: &str,
    new: NewRiskScore,
) -> Result<RiskScoreOut, ApiError> {
    let mut tx = begin_write(pool).await?;

    if fetch_player(&mut tx, username).await?.is_none() {
        return Err(ApiError::player_not_found());
    }

    let created_at = Utc::now();
    let result = sqlx::query(
        r#"INSERT INTO scores (player_username, score, created_at) VALUES (?, ?, ?)"#
    )
    .bind(username)
    .bind(new.score)
    .bind(created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(
        "Added score {} to player {} (id {})",
        new.score,
        username,
        result.last_insert_rowid()
    );

    Ok(RiskScoreOut {
        score: new.score,
        created_at,
    })
}

pub async fn list_scores_for_player(
    pool: &SqlitePool,
    username: &str,
    page: Pagination,
) -> Result<Vec<RiskScoreOut>, ApiError> {
    let mut tx = pool.begin().await?;

    if fetch_player(&mut tx, username).await?.is_none() {
        return Err(ApiError::player_not_found());
    }

    let scores = sqlx::query_as::<_, RiskScore>(
        r#"SELECT * FROM scores
           WHERE player_username = ?
           ORDER BY created_at, id
           LIMIT ? OFFSET ?"#
    )
    .bind(username)
    .bind(i64::from(page.limit))
    .bind(i64::from(page.skip))
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(scores.iter().map(RiskScore::to_score_out).collect())
}

pub async fn list_all_scores(pool: &SqlitePool) -> Result<Vec<PlayerScoresOut>, ApiError> {
    let mut tx = pool.begin().await?;

    let scores = sqlx::query_as::<_, RiskScore>(
        r#"SELECT * FROM scores ORDER BY id"#
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(group_scores_by_player(scores))
}

pub async fn get_player_state(pool: &SqlitePool, username: &str) -> Result<PlayerStateOut, ApiError> {
    let mut tx = pool.begin().await?;

    let player = fetch_player(&mut tx, username)
        .await?
        .ok_or_else(ApiError::player_not_found)?;

    tx.commit().await?;
    Ok(player.to_state_out())
}

pub async fn list_all_player_states(pool: &SqlitePool) -> Result<Vec<PlayerStateOut>, ApiError> {
    let mut tx = pool.begin().await?;

    let players = sqlx::query_as::<_, Player>(
        r#"SELECT * FROM players ORDER BY rowid"#
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(players.iter().map(Player::to_state_out).collect())
}

pub async fn toggle_player_state(pool: &SqlitePool, username: &str) -> Result<PlayerStateOut, ApiError> {
    let mut tx = begin_write(pool).await?;

    let mut player = fetch_player(&mut tx, username)
        .await?
        .ok_or_else(ApiError::player_not_found)?;
    let next = player.state.toggled();

    sqlx::query(
        r#"UPDATE players SET state = ? WHERE username = ?"#
    )
    .bind(next)
    .bind(username)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!("Player {} is now {:?}", username, next);

    player.state = next;
    Ok(player.to_state_out())
}

/// Delete a player and, in the same transaction, every score it owns.
/// Returns the player as it was, scores included.
pub async fn delete_player(pool: &SqlitePool, username: &str) -> Result<PlayerOut, ApiError> {
    let mut tx = begin_write(pool).await?;

    let player = fetch_player(&mut tx, username)
        .await?
        .ok_or_else(ApiError::player_not_found)?;
    let scores = fetch_scores(&mut tx, username).await?;

    sqlx::query(r#"DELETE FROM scores WHERE player_username = ?"#)
        .bind(username)
        .execute(&mut *tx)
        .await?;

    sqlx::query(r#"DELETE FROM players WHERE username = ?"#)
        .bind(username)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("Deleted player {} and {} scores", username, scores.len());

    Ok(player.to_player_out(&scores))
}
