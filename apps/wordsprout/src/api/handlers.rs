//! Route handlers.

use super::types::{
    AddChildRequest, ApiJson, AssessQuery, AssessResponse, Assessment, AuthResponse, ChildView,
    ExerciseQuery, LevelInfo, LevelsResponse, SetLevelRequest, SignInRequest, SignUpRequest,
    WordStatusRequest,
};
use super::{ApiError, AppState, BearerToken, CurrentUser};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{Local, NaiveDate};
use serde_json::{Value, json};
use tracing::{debug, info};
use wordsprout_core::level::{self, assessment_guide};
use wordsprout_core::{
    ChildId, ChildVocabulary, CategoryWithWords, Exercise, ExerciseId, ExerciseResult, Level,
    LevelChange, LevelSource, NewAttempt, ProgressSummary, WordId,
};

type ApiResult<T> = Result<T, ApiError>;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_level(raw: &str) -> ApiResult<Level> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("level must be an integer, got '{}'", raw)))?;
    Ok(Level::try_from(value)?)
}

// =============================================================================
// HEALTH & ACCOUNTS
// =============================================================================

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let (user, session) = state
        .run(move |c| c.sign_up(&body.name, &body.email, &body.password))
        .await?;
    info!(user = %user.id, "parent signed up");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: session.token,
            user: user.into(),
        }),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignInRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, session) = state
        .run(move |c| c.sign_in(&body.email, &body.password))
        .await?;
    debug!(user = %user.id, "parent signed in");
    Ok(Json(AuthResponse {
        token: session.token,
        user: user.into(),
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<StatusCode> {
    state.run(move |c| c.sign_out(&token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// CHILDREN
// =============================================================================

pub async fn list_children(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<ChildView>>> {
    let children = state.run(move |c| c.list_children(user.id)).await?;
    let today = today();
    Ok(Json(
        children
            .into_iter()
            .map(|child| ChildView::new(child, today))
            .collect(),
    ))
}

pub async fn add_child(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<AddChildRequest>,
) -> ApiResult<(StatusCode, Json<ChildView>)> {
    let today = today();
    let child = state
        .run(move |c| c.add_child(user.id, &body.name, &body.birth_date, today))
        .await?;
    info!(child = %child.id, level = child.level.as_u8(), "child added");
    Ok((StatusCode::CREATED, Json(ChildView::new(child, today))))
}

pub async fn get_child(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<Json<ChildView>> {
    let child = state.run(move |c| c.get_child(user.id, ChildId(id))).await?;
    Ok(Json(ChildView::new(child, today())))
}

pub async fn delete_child(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    let child = ChildId(id);
    let _guard = state.locks.lock(child).await;
    state.run(move |c| c.delete_child(user.id, child)).await?;
    info!(child = %child, "child deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_child_level(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    ApiJson(body): ApiJson<SetLevelRequest>,
) -> ApiResult<Json<ChildView>> {
    let child = ChildId(id);
    let _guard = state.locks.lock(child).await;
    let updated = state
        .run(move |c| c.set_child_level(user.id, child, body.level))
        .await?;
    info!(child = %child, level = updated.level.as_u8(), "level set manually");
    Ok(Json(ChildView::new(updated, today())))
}

// =============================================================================
// VOCABULARY
// =============================================================================

pub async fn vocabulary(State(state): State<AppState>) -> ApiResult<Json<Vec<CategoryWithWords>>> {
    Ok(Json(state.run(|c| c.categories_with_words()).await?))
}

pub async fn child_vocabulary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<Json<ChildVocabulary>> {
    Ok(Json(
        state
            .run(move |c| c.child_vocabulary(user.id, ChildId(id)))
            .await?,
    ))
}

pub async fn update_word_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, word_id)): Path<(u64, u64)>,
    ApiJson(body): ApiJson<WordStatusRequest>,
) -> ApiResult<Json<LevelChange>> {
    let child = ChildId(id);
    let status = body.status;
    let today = today();
    let _guard = state.locks.lock(child).await;
    let change = state
        .run(move |c| c.update_word_status(user.id, child, WordId(word_id), status, today))
        .await?;
    debug!(child = %child, word = word_id, status = %status, "word status updated");
    if change.changed {
        info!(
            child = %child,
            from = change.previous.as_u8(),
            to = change.current.as_u8(),
            known_words = change.known_words,
            "level recomputed"
        );
    }
    Ok(Json(change))
}

// =============================================================================
// LEVELS
// =============================================================================

pub async fn levels() -> Json<LevelsResponse> {
    Json(LevelsResponse {
        levels: Level::ALL.into_iter().map(LevelInfo::from).collect(),
        guide: assessment_guide(),
    })
}

pub async fn assess(Query(query): Query<AssessQuery>) -> ApiResult<Json<AssessResponse>> {
    if query.birth_date.is_none() && query.known_words.is_none() {
        return Err(ApiError::bad_request(
            "provide birth_date, known_words, or both",
        ));
    }

    let mut response = AssessResponse {
        age_months: None,
        by_age: None,
        by_vocabulary: None,
    };
    if let Some(raw) = query.birth_date.as_deref() {
        let birth_date = level::parse_birth_date(raw)?;
        let today = today();
        response.age_months = Some(level::age_in_months(birth_date, today));
        response.by_age = Some(Assessment::new(
            level::level_from_age(birth_date, today),
            LevelSource::Age,
        ));
    }
    if let Some(raw) = query.known_words.as_deref() {
        let count: i64 = raw.trim().parse().map_err(|_| {
            ApiError::bad_request(format!("known_words must be an integer, got '{}'", raw))
        })?;
        response.by_vocabulary = Some(Assessment::new(
            level::level_from_known_word_count(count)?,
            LevelSource::VocabularySize,
        ));
    }
    Ok(Json(response))
}

// =============================================================================
// EXERCISES & PROGRESS
// =============================================================================

pub async fn exercises(
    State(state): State<AppState>,
    Query(query): Query<ExerciseQuery>,
) -> ApiResult<Json<Vec<Exercise>>> {
    let raw = query
        .level
        .ok_or_else(|| ApiError::bad_request("level query parameter is required"))?;
    let level = parse_level(&raw)?;
    Ok(Json(state.run(move |c| c.exercises_for_level(level)).await?))
}

pub async fn record_exercise(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, exercise_id)): Path<(u64, u64)>,
    ApiJson(attempt): ApiJson<NewAttempt>,
) -> ApiResult<(StatusCode, Json<ExerciseResult>)> {
    let result = state
        .run(move |c| c.record_exercise(user.id, ChildId(id), ExerciseId(exercise_id), attempt))
        .await?;
    debug!(child = id, exercise = exercise_id, score = result.score, "exercise recorded");
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<Json<ProgressSummary>> {
    let today = today();
    Ok(Json(
        state
            .run(move |c| c.progress(user.id, ChildId(id), today))
            .await?,
    ))
}
