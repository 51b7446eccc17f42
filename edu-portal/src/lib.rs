//! edu-portal library - student information backend
//!
//! Serves the student API (bearer token), the public course catalog and the
//! admin API (timestamp + hash) from one router.

use axum::Router;
use edu_common::config::EnrollmentPolicy;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Admin request hash secret; 0 disables admin auth
    pub shared_secret: i64,
    /// Student token signing key, never 0
    pub token_key: i64,
    pub token_ttl_secs: u64,
    pub policy: EnrollmentPolicy,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        shared_secret: i64,
        token_key: i64,
        token_ttl_secs: u64,
        policy: EnrollmentPolicy,
    ) -> Self {
        Self {
            db,
            shared_secret,
            token_key,
            token_ttl_secs,
            policy,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let student = Router::new()
        .route("/student/profile/basic", get(api::student::profile_basic))
        .route("/student/profile/full", get(api::student::profile_full))
        .route("/student/dashboard", get(api::student::dashboard))
        .route("/student/payments", get(api::student::payments))
        .route("/student/contacts", get(api::student::contacts))
        .route("/student/attendance", get(api::student::attendance))
        .route("/student/survey", post(api::student::survey))
        .route(
            "/student/course_registration",
            post(api::registration::course_registration),
        )
        .route(
            "/student/semester_registration",
            post(api::registration::semester_registration),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::student_auth_middleware,
        ));

    let admin = Router::new()
        .route("/admin/students", post(api::admin::post_student))
        .route("/admin/students/:id/status", put(api::admin::put_student_status))
        .route("/admin/students/:id/password", put(api::admin::put_student_password))
        .route("/admin/professors", post(api::admin::post_professor))
        .route("/admin/professors/:id", get(api::admin::get_professor))
        .route("/admin/staff", post(api::admin::post_staff))
        .route("/admin/colleges", post(api::admin::post_college))
        .route("/admin/fields", post(api::admin::post_field))
        .route("/admin/specializations", post(api::admin::post_specialization))
        .route("/admin/countries", post(api::admin::post_country))
        .route("/admin/provinces", post(api::admin::post_province))
        .route("/admin/cities", post(api::admin::post_city))
        .route("/admin/terms", post(api::admin::post_term))
        .route("/admin/terms/:id/current", put(api::admin::put_term_current))
        .route("/admin/terms/:id/registration", put(api::admin::put_term_registration))
        .route("/admin/courses", post(api::admin::post_course))
        .route("/admin/courses/:id/requisites", post(api::admin::post_requisite))
        .route("/admin/rooms", post(api::admin::post_room))
        .route("/admin/classes", post(api::admin::post_class))
        .route("/admin/classes/:id", put(api::admin::put_class))
        .route("/admin/assignments", post(api::admin::post_assignment))
        .route("/admin/assignments/:id", put(api::admin::put_assignment))
        .route("/admin/grades", post(api::admin::post_grade))
        .route("/admin/contacts", post(api::admin::post_contact))
        .route("/admin/attendance", post(api::admin::post_attendance))
        .route("/admin/payments", post(api::admin::post_payment))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::admin_auth_middleware,
        ));

    let public = Router::new()
        .route("/auth/login", post(api::login))
        .route("/courses/provided", get(api::courses::provided))
        .route("/courses/class", post(api::courses::classes))
        .merge(api::health_routes());

    Router::new()
        .merge(student)
        .merge(admin)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
