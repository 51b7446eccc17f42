//! Student profile, dashboard and self-service endpoints
//!
//! Every handler here runs behind the bearer-token middleware.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use edu_common::db::attendance::{list_attendance, AttendanceRecord};
use edu_common::db::contacts::{list_contacts, mobile_number, Contact};
use edu_common::db::payments::{list_payments, Payment};
use edu_common::db::surveys::{submit_survey, SurveyRatings, SurveySummary};
use edu_common::db::ContactOwner;
use serde::Deserialize;

use crate::api::auth::AuthenticatedStudent;
use crate::api::params::RowId;
use crate::error::{ApiError, ApiResult};
use crate::services::format::{self, BasicProfile, Dashboard, FullProfile};
use crate::services::metrics::{cohort_for, student_metrics};
use crate::AppState;

/// GET /student/profile/basic
pub async fn profile_basic(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
) -> ApiResult<Json<BasicProfile>> {
    let student = identity.load(&state).await?;
    Ok(Json(format::basic_profile(&student)))
}

/// GET /student/profile/full
pub async fn profile_full(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
) -> ApiResult<Json<FullProfile>> {
    let student = identity.load(&state).await?;
    let metrics = student_metrics(&state.db, &student).await?;
    let mobile = mobile_number(&state.db, ContactOwner::Student(student.id)).await?;
    Ok(Json(format::full_profile(&student, &metrics, mobile)))
}

/// GET /student/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
) -> ApiResult<Json<Dashboard>> {
    let student = identity.load(&state).await?;
    let metrics = student_metrics(&state.db, &student).await?;
    let college_id = metrics.program.as_ref().map(|p| p.college_id);
    let cohort = cohort_for(&state.db, &student, college_id).await?;
    Ok(Json(format::dashboard(&student, &metrics, &cohort)))
}

/// GET /student/payments
pub async fn payments(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
) -> ApiResult<Json<Vec<Payment>>> {
    let student = identity.load(&state).await?;
    Ok(Json(list_payments(&state.db, student.id).await?))
}

/// GET /student/contacts
pub async fn contacts(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
) -> ApiResult<Json<Vec<Contact>>> {
    let student = identity.load(&state).await?;
    Ok(Json(list_contacts(&state.db, ContactOwner::Student(student.id)).await?))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub class_id: RowId,
}

/// GET /student/attendance?class_id=
pub async fn attendance(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
    query: Result<Query<AttendanceQuery>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let student = identity.load(&state).await?;
    Ok(Json(list_attendance(&state.db, student.id, query.class_id.get()).await?))
}

#[derive(Debug, Deserialize)]
pub struct SurveyRequest {
    pub professor_id: RowId,
    pub class_id: RowId,
    #[serde(flatten)]
    pub ratings: SurveyRatings,
}

/// POST /student/survey
pub async fn survey(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedStudent>,
    payload: Result<Json<SurveyRequest>, JsonRejection>,
) -> ApiResult<Json<SurveySummary>> {
    let Json(request) = payload?;
    let student = identity.load(&state).await?;
    let summary = submit_survey(
        &state.db,
        student.id,
        request.professor_id.get(),
        request.class_id.get(),
        &request.ratings,
    )
    .await?;
    Ok(Json(summary))
}
