//! Shared fixtures for edu-portal integration tests
//!
//! A `World` owns a temporary database seeded with one college, one field
//! of study, a current term open for registration and one room. Tests add
//! students, courses and classes on top.

#![allow(dead_code)]

use axum::{body::Body, http::Request, Router};
use edu_common::api::{calculate_hash, issue_token};
use edu_common::config::EnrollmentPolicy;
use edu_common::db::classes::NewClass;
use edu_common::db::courses::{create_course, NewCourse, RequisiteLink};
use edu_common::db::persons::NewPerson;
use edu_common::db::professors::{create_professor, NewProfessor};
use edu_common::db::programs::{create_college, create_field_of_study, NewFieldOfStudy};
use edu_common::db::rooms::{create_room, NewRoom};
use edu_common::db::students::{create_student, NewStudent};
use edu_common::db::terms::{create_term, NewTerm};
use edu_common::db::{init_database, Gender, MaritalStatus, ProfessorContract, RoomType, Weekday};
use edu_common::validation::national_id_check_digit;
use edu_portal::services::schedule::create_class;
use edu_portal::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub const PASSWORD: &str = "s3cret-pass";

pub struct World {
    pub _dir: TempDir,
    pub pool: SqlitePool,
    pub secret: i64,
    pub token_key: i64,
    pub policy: EnrollmentPolicy,
    pub college_id: i64,
    pub field_id: i64,
    pub term_id: i64,
    pub room_id: i64,
    next_person: AtomicU32,
}

/// Valid national id derived from a sequence number
pub fn national_id(n: u32) -> String {
    let prefix = format!("{:09}", 23_456_000 + n);
    format!("{}{}", prefix, national_id_check_digit(&prefix).unwrap())
}

pub fn person(n: u32, first: &str, last: &str, gender: Gender) -> NewPerson {
    NewPerson {
        first_name: first.to_string(),
        last_name: last.to_string(),
        father_name: "حسن".to_string(),
        national_id: national_id(n),
        id_number: None,
        birth_date: "1381/02/10".to_string(),
        birth_city_id: None,
        gender,
        marital_status: MaritalStatus::Single,
        military_status: None,
        address: None,
    }
}

impl World {
    pub async fn new() -> Self {
        Self::with_policy(EnrollmentPolicy::default()).await
    }

    pub async fn with_policy(policy: EnrollmentPolicy) -> Self {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("edu.db")).await.unwrap();

        let college_id = create_college(&pool, "ENG", "دانشکده فنی").await.unwrap();
        let field_id = create_field_of_study(
            &pool,
            &NewFieldOfStudy {
                college_id,
                code: "SE".to_string(),
                name: "مهندسی نرم افزار".to_string(),
                degree_level: "کارشناسی".to_string(),
                total_credits: 140,
            },
        )
        .await
        .unwrap();

        let term_id = create_term(
            &pool,
            &NewTerm {
                code: "4031".to_string(),
                name: "نیمسال اول ۱۴۰۳".to_string(),
                start_date: "1403/06/31".to_string(),
                end_date: "1403/10/30".to_string(),
                is_current: true,
                is_registration_open: true,
            },
        )
        .await
        .unwrap();

        let room_id = create_room(
            &pool,
            &NewRoom {
                code: "B403".to_string(),
                name: "کلاس ۴۰۳".to_string(),
                room_type: RoomType::Classroom,
                capacity: 40,
                building: "B".to_string(),
                floor: 4,
            },
        )
        .await
        .unwrap();

        Self {
            _dir: dir,
            pool,
            secret: 0,
            token_key: 0x5eed_7a11,
            policy,
            college_id,
            field_id,
            term_id,
            room_id,
            next_person: AtomicU32::new(1),
        }
    }

    fn person_seq(&self) -> u32 {
        self.next_person.fetch_add(1, Ordering::SeqCst)
    }

    pub fn app(&self) -> Router {
        build_router(AppState::new(
            self.pool.clone(),
            self.secret,
            self.token_key,
            3600,
            self.policy,
        ))
    }

    pub async fn add_student(&self, number: &str) -> i64 {
        let n = self.person_seq();
        create_student(
            &self.pool,
            &NewStudent {
                person: person(n, "مهرشاد", "شاکری بنا", Gender::Male),
                student_number: number.to_string(),
                email: None,
                field_of_study_id: Some(self.field_id),
                specialization_id: None,
                entry_term_code: Some("4021".to_string()),
                password: Some(PASSWORD.to_string()),
            },
        )
        .await
        .unwrap()
    }

    pub async fn add_professor(&self, code: &str, first: &str, last: &str) -> i64 {
        let n = self.person_seq();
        create_professor(
            &self.pool,
            &NewProfessor {
                person: person(n, first, last, Gender::Male),
                professor_code: code.to_string(),
                employee_number: None,
                contract_type: ProfessorContract::FullTime,
                hire_date: "1395/07/01".to_string(),
                expertise: None,
            },
        )
        .await
        .unwrap()
    }

    pub async fn add_course(&self, code: &str, name: &str) -> i64 {
        self.add_course_with(code, name, Vec::new(), Vec::new()).await
    }

    pub async fn add_course_with(
        &self,
        code: &str,
        name: &str,
        prerequisites: Vec<RequisiteLink>,
        corequisites: Vec<RequisiteLink>,
    ) -> i64 {
        create_course(
            &self.pool,
            &NewCourse {
                field_of_study_id: self.field_id,
                code: code.to_string(),
                name: name.to_string(),
                credits: 3,
                course_type: "theory".to_string(),
                description: None,
                prerequisites,
                corequisites,
            },
        )
        .await
        .unwrap()
    }

    pub fn class(&self, course_id: i64, code: &str, day: Weekday, start: &str, end: &str) -> NewClass {
        NewClass {
            course_id,
            term_id: self.term_id,
            room_id: None,
            class_code: code.to_string(),
            day_of_week: day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            capacity: 30,
            exam_date: Some("1403/10/15".to_string()),
            is_active: true,
        }
    }

    pub async fn add_class(&self, class: NewClass) -> i64 {
        create_class(&self.pool, &class).await.unwrap()
    }

    /// Class on Saturday 08:00-09:30 with the given capacity
    pub async fn simple_class(&self, course_id: i64, code: &str, capacity: i64) -> i64 {
        let mut class = self.class(course_id, code, Weekday::Saturday, "08:00", "09:30");
        class.capacity = capacity;
        self.add_class(class).await
    }

    pub fn token(&self, student_number: &str) -> String {
        issue_token(student_number, self.token_key, 3600).unwrap()
    }
}

pub fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64
}

/// Sign an admin body with the timestamp and hash fields
pub fn sign(mut body: Value, secret: i64) -> Value {
    let obj = body.as_object_mut().unwrap();
    obj.insert("timestamp".to_string(), json!(now_ms()));
    obj.insert("hash".to_string(), json!(""));
    let hash = calculate_hash(&body, secret);
    body["hash"] = json!(hash);
    body
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_json(uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    send_json("POST", uri, body, token)
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
