//! Unit selection endpoints
//!
//! Consistency failures answer 400 with the reason; unknown classes and
//! terms answer 404.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::auth::AuthenticatedStudent;
use crate::api::params::RowId;
use crate::error::{ApiError, ApiResult};
use crate::services::enrollment::register;
use crate::services::format::{self, RegistrationOutcome};
use crate::services::semester::{finalize, Selection};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CourseRegistrationRequest {
    pub class_id: RowId,
}

/// POST /student/course_registration
pub async fn course_registration(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
    payload: Result<Json<CourseRegistrationRequest>, JsonRejection>,
) -> ApiResult<Json<RegistrationOutcome>> {
    let Json(request) = payload?;
    let student = identity.load(&state).await?;
    let class_id = request.class_id.get();

    register(&state.db, &state.policy, student.id, class_id)
        .await
        .map_err(ApiError::rejected)?;

    Ok(Json(format::class_registered(class_id)))
}

#[derive(Debug, Deserialize)]
pub struct SemesterClass {
    pub course_id: RowId,
    pub class_id: RowId,
}

#[derive(Debug, Deserialize)]
pub struct SemesterRegistrationRequest {
    pub semester: String,
    #[serde(default)]
    pub classes: Vec<SemesterClass>,
}

/// POST /student/semester_registration
pub async fn semester_registration(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
    payload: Result<Json<SemesterRegistrationRequest>, JsonRejection>,
) -> ApiResult<Json<RegistrationOutcome>> {
    let Json(request) = payload?;
    let semester = request.semester.trim();
    if semester.is_empty() || request.classes.is_empty() {
        return Err(ApiError::BadRequest(
            "درخواست انتخاب واحد ناقص است. (مثلاً درسی انتخاب نشده)".to_string(),
        ));
    }

    let student = identity.load(&state).await?;
    let selections: Vec<Selection> = request
        .classes
        .iter()
        .map(|c| Selection {
            course_id: c.course_id.get(),
            class_id: c.class_id.get(),
        })
        .collect();

    let finalized = finalize(&state.db, &state.policy, student.id, semester, &selections)
        .await
        .map_err(ApiError::rejected)?;

    Ok(Json(format::semester_finalized(&finalized.term_code)))
}
