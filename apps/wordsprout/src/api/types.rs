//! Request and response bodies.

use super::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Json, Request};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wordsprout_core::level::{self, LevelGuide};
use wordsprout_core::{Child, Level, LevelSource, User, UserId, WordStatus};

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> ApiError {
    let status = match rejection.status() {
        StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
        other => other,
    };
    ApiError::new(status, rejection.body_text())
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// A user without credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

// =============================================================================
// CHILDREN
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AddChildRequest {
    pub name: String,
    /// `YYYY-MM-DD` or RFC 3339.
    pub birth_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetLevelRequest {
    pub level: Level,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordStatusRequest {
    pub status: WordStatus,
}

/// A child with derived display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildView {
    #[serde(flatten)]
    pub child: Child,
    pub age_months: i64,
    pub level_label: String,
}

impl ChildView {
    pub fn new(child: Child, today: NaiveDate) -> Self {
        Self {
            age_months: level::age_in_months(child.birth_date, today).max(0),
            level_label: child.level.label(),
            child,
        }
    }
}

// =============================================================================
// LEVELS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LevelInfo {
    pub level: Level,
    pub name: &'static str,
    pub label: String,
    pub description: &'static str,
    pub word_range: &'static str,
}

impl From<Level> for LevelInfo {
    fn from(level: Level) -> Self {
        Self {
            level,
            name: level.name(),
            label: level.label(),
            description: level.description(),
            word_range: level.word_range(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelsResponse {
    pub levels: Vec<LevelInfo>,
    pub guide: Vec<LevelGuide>,
}

/// Query for `/levels/assess`. Fields stay strings so parse failures surface
/// as engine errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessQuery {
    pub birth_date: Option<String>,
    pub known_words: Option<String>,
}

/// One engine answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub level: Level,
    pub source: LevelSource,
    pub label: String,
}

impl Assessment {
    pub fn new(level: Level, source: LevelSource) -> Self {
        Self {
            level,
            source,
            label: level.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_months: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_age: Option<Assessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_vocabulary: Option<Assessment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseQuery {
    pub level: Option<String>,
}
