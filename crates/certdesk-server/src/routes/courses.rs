//! Course catalogue endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use certdesk_core::validate::validate_course_name;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AdminSession;
use crate::models::CourseInsert;
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub name: String,
}

/// Creates the courses router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/{name}", delete(delete_course))
        .with_state(state)
}

/// GET /api/v1/courses
async fn list_courses(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(storage::list_course_names(&state.pool).await)
}

/// POST /api/v1/courses
async fn create_course(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let name = validate_course_name(&request.name)?;

    let outcome = storage::insert_course(&state.pool, &name).await?;

    match outcome {
        CourseInsert::Created => {
            tracing::info!(course = %name, "Course created");
            Ok((StatusCode::CREATED, Json(CourseResponse { name })))
        }
        CourseInsert::Duplicate => Err(AppError::Conflict(format!(
            "Course '{}' already exists",
            name
        ))),
    }
}

/// DELETE /api/v1/courses/{name}
async fn delete_course(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = storage::delete_course(&state.pool, name.trim()).await?;

    if !deleted {
        return Err(AppError::NotFound(format!("Course '{}' not found", name.trim())));
    }

    tracing::info!(course = %name.trim(), "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}
