//! Administrative endpoints
//!
//! Every route here sits behind the admin hash middleware. Request bodies
//! also carry `timestamp` and `hash`; the payload types ignore them.
//! Creates answer 201 with the stored entity or its id.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use edu_common::db::assignments::Assignment;
use edu_common::db::attendance::{record_attendance, NewAttendance};
use edu_common::db::classes::{load_class, ClassRecord, NewClass};
use edu_common::db::contacts::{create_contact, NewContact};
use edu_common::db::courses::{
    add_requisite, create_course, load_course, Course, NewCourse, RequisiteKind, RequisiteLink,
};
use edu_common::db::geography::{create_city, create_country, create_province, load_city, City};
use edu_common::db::payments::{record_payment, NewPayment};
use edu_common::db::professors::{create_professor, current_assignment_count, load_professor, NewProfessor, Professor};
use edu_common::db::programs::{
    create_college, create_field_of_study, create_specialization, load_field_of_study, FieldOfStudy,
    NewFieldOfStudy,
};
use edu_common::db::registrations::set_outcome;
use edu_common::db::rooms::{create_room, load_room, NewRoom, Room};
use edu_common::db::staff::{create_staff, load_staff, NewStaff, StaffMember};
use edu_common::db::students::{create_student, load_student, set_academic_status, set_password, NewStudent, Student};
use edu_common::db::terms::{create_term, load_term, set_current_term, set_registration_open, NewTerm, Term};
use edu_common::db::{AcademicStatus, RegistrationStatus};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::services::assignment::{assign_professor, update_assignment, AssignmentChange, NewAssignment};
use crate::services::schedule::{create_class, update_class};
use crate::AppState;

type Payload<T> = Result<Json<T>, JsonRejection>;
type Created<T> = (StatusCode, Json<T>);

fn created<T>(value: T) -> Created<T> {
    (StatusCode::CREATED, Json(value))
}

fn created_id(id: i64) -> Created<Value> {
    created(json!({ "id": id }))
}

// ----- people -----

pub async fn post_student(State(state): State<AppState>, payload: Payload<NewStudent>) -> ApiResult<Created<Student>> {
    let Json(student) = payload?;
    let id = create_student(&state.db, &student).await?;
    Ok(created(load_student(&state.db, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub academic_status: AcademicStatus,
}

pub async fn put_student_status(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    payload: Payload<StatusChange>,
) -> ApiResult<Json<Student>> {
    let Json(change) = payload?;
    set_academic_status(&state.db, student_id, change.academic_status).await?;
    Ok(Json(load_student(&state.db, student_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub password: String,
}

pub async fn put_student_password(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    payload: Payload<PasswordChange>,
) -> ApiResult<StatusCode> {
    let Json(change) = payload?;
    set_password(&state.db, student_id, &change.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_professor(
    State(state): State<AppState>,
    payload: Payload<NewProfessor>,
) -> ApiResult<Created<Professor>> {
    let Json(professor) = payload?;
    let id = create_professor(&state.db, &professor).await?;
    Ok(created(load_professor(&state.db, id).await?))
}

#[derive(Debug, Serialize)]
pub struct ProfessorLoad {
    pub professor: Professor,
    pub teaching_experience_years: Option<i32>,
    pub current_assignment_count: i64,
}

/// GET /admin/professors/:id
pub async fn get_professor(
    State(state): State<AppState>,
    Path(professor_id): Path<i64>,
) -> ApiResult<Json<ProfessorLoad>> {
    let professor = load_professor(&state.db, professor_id).await?;
    let count = current_assignment_count(&state.db, professor_id).await?;
    Ok(Json(ProfessorLoad {
        teaching_experience_years: professor.teaching_experience_years(),
        current_assignment_count: count,
        professor,
    }))
}

pub async fn post_staff(State(state): State<AppState>, payload: Payload<NewStaff>) -> ApiResult<Created<StaffMember>> {
    let Json(staff) = payload?;
    let id = create_staff(&state.db, &staff).await?;
    Ok(created(load_staff(&state.db, id).await?))
}

// ----- organization and geography -----

#[derive(Debug, Deserialize)]
pub struct NewCollege {
    pub code: String,
    pub name: String,
}

pub async fn post_college(State(state): State<AppState>, payload: Payload<NewCollege>) -> ApiResult<Created<Value>> {
    let Json(college) = payload?;
    Ok(created_id(create_college(&state.db, &college.code, &college.name).await?))
}

pub async fn post_field(
    State(state): State<AppState>,
    payload: Payload<NewFieldOfStudy>,
) -> ApiResult<Created<FieldOfStudy>> {
    let Json(field) = payload?;
    let id = create_field_of_study(&state.db, &field).await?;
    Ok(created(load_field_of_study(&state.db, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct NewSpecialization {
    pub field_of_study_id: i64,
    pub code: String,
    pub name: String,
}

pub async fn post_specialization(
    State(state): State<AppState>,
    payload: Payload<NewSpecialization>,
) -> ApiResult<Created<Value>> {
    let Json(specialization) = payload?;
    let id = create_specialization(
        &state.db,
        specialization.field_of_study_id,
        &specialization.code,
        &specialization.name,
    )
    .await?;
    Ok(created_id(id))
}

#[derive(Debug, Deserialize)]
pub struct NewCountry {
    pub name: String,
    pub code: String,
}

pub async fn post_country(State(state): State<AppState>, payload: Payload<NewCountry>) -> ApiResult<Created<Value>> {
    let Json(country) = payload?;
    Ok(created_id(create_country(&state.db, &country.name, &country.code).await?))
}

#[derive(Debug, Deserialize)]
pub struct NewProvince {
    pub country_id: i64,
    pub name: String,
}

pub async fn post_province(State(state): State<AppState>, payload: Payload<NewProvince>) -> ApiResult<Created<Value>> {
    let Json(province) = payload?;
    Ok(created_id(create_province(&state.db, province.country_id, &province.name).await?))
}

#[derive(Debug, Deserialize)]
pub struct NewCity {
    pub province_id: i64,
    pub name: String,
}

pub async fn post_city(State(state): State<AppState>, payload: Payload<NewCity>) -> ApiResult<Created<City>> {
    let Json(city) = payload?;
    let id = create_city(&state.db, city.province_id, &city.name).await?;
    Ok(created(load_city(&state.db, id).await?))
}

// ----- terms -----

pub async fn post_term(State(state): State<AppState>, payload: Payload<NewTerm>) -> ApiResult<Created<Term>> {
    let Json(term) = payload?;
    let id = create_term(&state.db, &term).await?;
    Ok(created(load_term(&state.db, id).await?))
}

pub async fn put_term_current(State(state): State<AppState>, Path(term_id): Path<i64>) -> ApiResult<Json<Term>> {
    set_current_term(&state.db, term_id).await?;
    Ok(Json(load_term(&state.db, term_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RegistrationWindow {
    pub is_registration_open: bool,
}

pub async fn put_term_registration(
    State(state): State<AppState>,
    Path(term_id): Path<i64>,
    payload: Payload<RegistrationWindow>,
) -> ApiResult<Json<Term>> {
    let Json(window) = payload?;
    set_registration_open(&state.db, term_id, window.is_registration_open).await?;
    Ok(Json(load_term(&state.db, term_id).await?))
}

// ----- catalog and scheduling -----

pub async fn post_course(State(state): State<AppState>, payload: Payload<NewCourse>) -> ApiResult<Created<Course>> {
    let Json(course) = payload?;
    let id = create_course(&state.db, &course).await?;
    Ok(created(load_course(&state.db, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct RequisiteRequest {
    pub kind: RequisiteKind,
    #[serde(flatten)]
    pub link: RequisiteLink,
}

pub async fn post_requisite(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    payload: Payload<RequisiteRequest>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload?;
    load_course(&state.db, course_id).await?;
    add_requisite(&state.db, req.kind, course_id, &req.link).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_room(State(state): State<AppState>, payload: Payload<NewRoom>) -> ApiResult<Created<Room>> {
    let Json(room) = payload?;
    let id = create_room(&state.db, &room).await?;
    Ok(created(load_room(&state.db, id).await?))
}

pub async fn post_class(State(state): State<AppState>, payload: Payload<NewClass>) -> ApiResult<Created<ClassRecord>> {
    let Json(class) = payload?;
    let id = create_class(&state.db, &class).await?;
    Ok(created(load_class(&state.db, id).await?))
}

pub async fn put_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    payload: Payload<NewClass>,
) -> ApiResult<Json<ClassRecord>> {
    let Json(class) = payload?;
    update_class(&state.db, class_id, &class).await?;
    Ok(Json(load_class(&state.db, class_id).await?))
}

pub async fn post_assignment(
    State(state): State<AppState>,
    payload: Payload<NewAssignment>,
) -> ApiResult<Created<Assignment>> {
    let Json(assignment) = payload?;
    Ok(created(assign_professor(&state.db, &assignment).await?))
}

pub async fn put_assignment(
    State(state): State<AppState>,
    Path(assignment_id): Path<i64>,
    payload: Payload<AssignmentChange>,
) -> ApiResult<Json<Assignment>> {
    let Json(change) = payload?;
    Ok(Json(update_assignment(&state.db, assignment_id, &change).await?))
}

// ----- student records -----

#[derive(Debug, Deserialize)]
pub struct Outcome {
    pub student_id: i64,
    pub class_id: i64,
    pub status: RegistrationStatus,
    #[serde(default)]
    pub grade: Option<f64>,
}

pub async fn post_grade(State(state): State<AppState>, payload: Payload<Outcome>) -> ApiResult<StatusCode> {
    let Json(outcome) = payload?;
    set_outcome(&state.db, outcome.student_id, outcome.class_id, outcome.status, outcome.grade).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn post_contact(State(state): State<AppState>, payload: Payload<NewContact>) -> ApiResult<Created<Value>> {
    let Json(contact) = payload?;
    Ok(created_id(create_contact(&state.db, &contact).await?))
}

pub async fn post_attendance(
    State(state): State<AppState>,
    payload: Payload<NewAttendance>,
) -> ApiResult<Created<Value>> {
    let Json(attendance) = payload?;
    Ok(created_id(record_attendance(&state.db, &attendance).await?))
}

pub async fn post_payment(State(state): State<AppState>, payload: Payload<NewPayment>) -> ApiResult<Created<Value>> {
    let Json(payment) = payload?;
    Ok(created_id(record_payment(&state.db, &payment).await?))
}
