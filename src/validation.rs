//! Input schemas checked before anything reaches the database.
//!
//! Shape and types come from serde (`deny_unknown_fields`, typed fields),
//! with `serde_path_to_error` naming the offending field. Value rules such as
//! the score range are declared with `validator`.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::{Gender, PlayerState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.into(),
                message: message.into(),
            }],
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ValidationError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        // "." is the body itself: missing/unknown fields and non-object bodies
        let field = if path == "." { "body".to_string() } else { path };
        ValidationError::single(field, err.inner().to_string())
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut issues: Vec<FieldIssue> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldIssue {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed `{}` check", e.code)),
                })
            })
            .collect();
        issues.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError { issues }
    }
}

/// Decode `body` into `T`, then run its declared value rules
fn parse_body<T>(body: &Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_path_to_error::deserialize(body)?;
    parsed.validate()?;
    Ok(parsed)
}

/// Validated input for creating a player
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewPlayer {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub birthday: NaiveDate,
    pub gender: Gender,
    pub state: PlayerState,
}

impl NewPlayer {
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        parse_body(body)
    }
}

/// Validated input for appending a risk score
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewRiskScore {
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100 inclusive"))]
    pub score: f64,
}

impl NewRiskScore {
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        parse_body(body)
    }
}

fn default_skip() -> u32 {
    0
}

fn default_limit() -> u32 {
    10
}

/// `skip`/`limit` window for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_skip")]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: default_skip(),
            limit: default_limit(),
        }
    }
}
