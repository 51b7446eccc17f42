//! Course catalog endpoints (public)

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use edu_common::db::classes::list_course_classes;
use edu_common::db::courses::{active_courses, load_course};
use edu_common::db::terms::current_term;
use edu_common::Error;
use serde::Deserialize;

use crate::api::params::RowId;
use crate::error::{ApiError, ApiResult};
use crate::services::format::{self, CourseClasses, ProvidedCourses};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProvidedQuery {
    #[serde(default)]
    pub course_name: Option<String>,
}

/// GET /courses/provided?course_name=
///
/// Active catalog courses, independent of the current term.
pub async fn provided(
    State(state): State<AppState>,
    Query(query): Query<ProvidedQuery>,
) -> ApiResult<Json<ProvidedCourses>> {
    let courses = active_courses(&state.db).await?;
    Ok(Json(format::provided_courses(&courses, query.course_name.as_deref())))
}

#[derive(Debug, Deserialize)]
pub struct CourseClassRequest {
    pub course_id: RowId,
}

/// POST /courses/class
///
/// Active classes of the course in the current term, or in every term when
/// no term is current.
pub async fn classes(
    State(state): State<AppState>,
    payload: Result<Json<CourseClassRequest>, JsonRejection>,
) -> ApiResult<Json<CourseClasses>> {
    let Json(request) = payload?;

    let course = match load_course(&state.db, request.course_id.get()).await {
        Ok(course) => course,
        Err(Error::NotFound(_)) => {
            return Err(ApiError::NotFound("درس مورد نظر یافت نشد.".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let term_id = current_term(&state.db).await?.map(|term| term.id);
    let listings = list_course_classes(&state.db, course.id, term_id).await?;
    Ok(Json(format::course_classes(&course, &listings)))
}
