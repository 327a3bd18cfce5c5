use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    state::AppState,
    tasks::dto::{Pagination, SearchParams, TaskCreate, TaskUpdate},
    tasks::repo::Task,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks/", get(list_tasks).post(create_task))
        .route("/tasks/search/", get(search_tasks))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[instrument(skip(state, user, payload), fields(user = %user.0.name))]
pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<TaskCreate>,
) -> Result<Json<Task>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }

    let task = Task::create(&state.db, payload, &user.0)
        .await
        .map_err(AppError::Internal)?;

    info!(task_id = %task.id, "task created");
    Ok(Json(task))
}

#[instrument(skip(state, _user))]
pub async fn list_tasks(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Task>>, AppError> {
    p.validate()?;
    let tasks = Task::list(&state.db, p.skip, p.limit)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(tasks))
}

#[instrument(skip(state, _user))]
pub async fn get_task(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    let task = Task::get(&state.db, id)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound("Task"))?;
    Ok(Json(task))
}

#[instrument(skip(state, user, payload), fields(user = %user.0.name))]
pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<Task>, AppError> {
    let task = Task::update(&state.db, id, payload, &user.0.name)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound("Task"))?;

    info!(task_id = %task.id, "task updated");
    Ok(Json(task))
}

#[instrument(skip(state, user), fields(user = %user.0.name))]
pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = Task::delete(&state.db, id)
        .await
        .map_err(AppError::Internal)?;
    if !deleted {
        return Err(AppError::NotFound("Task"));
    }

    info!(task_id = %id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _user))]
pub async fn search_tasks(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = Task::search(&state.db, params)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(tasks))
}
