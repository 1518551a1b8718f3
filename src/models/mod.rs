use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

/// Activity flag of a player. Only ever changed through [`PlayerState::toggled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlayerState {
    Active,
    Inactive,
}

impl PlayerState {
    pub fn toggled(self) -> Self {
        match self {
            PlayerState::Active => PlayerState::Inactive,
            PlayerState::Inactive => PlayerState::Active,
        }
    }
}

/// Row from the players table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Player {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub birthday: NaiveDate,
    pub gender: Gender,
    pub state: PlayerState,
}

/// Row from the scores table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RiskScore {
    pub id: i64,
    pub player_username: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl RiskScore {
    pub fn to_score_out(&self) -> RiskScoreOut {
        RiskScoreOut {
            score: self.score,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScoreOut {
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// Full player record with its scores nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOut {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub birthday: NaiveDate,
    pub gender: Gender,
    pub state: PlayerState,
    pub risk_scores: Vec<RiskScoreOut>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStateOut {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub state: PlayerState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScoresOut {
    pub username: String,
    pub risk_scores: Vec<RiskScoreOut>,
}

impl Player {
    /// Convert database row to the full response, attaching the given scores
    pub fn to_player_out(&self, scores: &[RiskScore]) -> PlayerOut {
        PlayerOut {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            middle_name: self.middle_name.clone(),
            birthday: self.birthday,
            gender: self.gender,
            state: self.state,
            risk_scores: scores.iter().map(RiskScore::to_score_out).collect(),
        }
    }

    pub fn to_state_out(&self) -> PlayerStateOut {
        PlayerStateOut {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            middle_name: self.middle_name.clone(),
            state: self.state,
        }
    }
}

/// Partition scores by owning player.
///
/// Groups appear in order of each username's first score and keep their
/// scores in input order. Players without scores never show up here.
pub fn group_scores_by_player(scores: Vec<RiskScore>) -> Vec<PlayerScoresOut> {
    let mut groups: Vec<PlayerScoresOut> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for score in scores {
        let slot = match index.get(&score.player_username) {
            Some(&i) => i,
            None => {
                index.insert(score.player_username.clone(), groups.len());
                groups.push(PlayerScoresOut {
                    username: score.player_username.clone(),
                    risk_scores: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[slot].risk_scores.push(score.to_score_out());
    }

    groups
}
