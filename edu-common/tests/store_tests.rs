//! Entity store tests against a temporary database

use edu_common::db::assignments::insert_assignment;
use edu_common::db::attendance::{list_attendance, record_attendance, NewAttendance};
use edu_common::db::classes::{insert_class, list_course_classes, NewClass};
use edu_common::db::contacts::{create_contact, list_contacts, mobile_number, NewContact};
use edu_common::db::courses::{
    add_requisite, create_course, requisites, NewCourse, RequisiteKind, RequisiteLink,
};
use edu_common::db::init::init_database;
use edu_common::db::payments::{list_payments, record_payment, NewPayment};
use edu_common::db::persons::NewPerson;
use edu_common::db::professors::{create_professor, load_professor, NewProfessor};
use edu_common::db::programs::{create_college, create_field_of_study, NewFieldOfStudy};
use edu_common::db::registrations::{find_registration, insert_registration, set_outcome};
use edu_common::db::students::{create_student, find_student_by_number, load_student, NewStudent};
use edu_common::db::surveys::{submit_survey, SurveyRatings};
use edu_common::db::terms::{create_term, current_term, load_term, set_current_term, NewTerm};
use edu_common::db::{ContactOwner, Gender, MaritalStatus, ProfessorContract, RegistrationStatus, Weekday};
use edu_common::validation::national_id_check_digit;
use edu_common::Error;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("edu.db")).await.unwrap();
    (dir, pool)
}

/// Valid national id derived from a sequence number
fn national_id(n: u32) -> String {
    let prefix = format!("{:09}", 12_345_000 + n);
    format!("{}{}", prefix, national_id_check_digit(&prefix).unwrap())
}

fn person(n: u32, first: &str, last: &str) -> NewPerson {
    NewPerson {
        first_name: first.to_string(),
        last_name: last.to_string(),
        father_name: "علی".to_string(),
        national_id: national_id(n),
        id_number: None,
        birth_date: "1380/05/12".to_string(),
        birth_city_id: None,
        gender: Gender::Male,
        marital_status: MaritalStatus::Single,
        military_status: None,
        address: None,
    }
}

fn student(n: u32, number: &str) -> NewStudent {
    NewStudent {
        person: person(n, "رضا", "احمدی"),
        student_number: number.to_string(),
        email: None,
        field_of_study_id: None,
        specialization_id: None,
        entry_term_code: Some("4001".to_string()),
        password: None,
    }
}

fn professor(n: u32, code: &str) -> NewProfessor {
    NewProfessor {
        person: person(n, "مریم", "کریمی"),
        professor_code: code.to_string(),
        employee_number: None,
        contract_type: ProfessorContract::FullTime,
        hire_date: "1390/01/15".to_string(),
        expertise: None,
    }
}

fn term(code: &str, current: bool) -> NewTerm {
    NewTerm {
        code: code.to_string(),
        name: format!("ترم {}", code),
        start_date: "1403/06/31".to_string(),
        end_date: "1403/10/30".to_string(),
        is_current: current,
        is_registration_open: true,
    }
}

async fn field(pool: &SqlitePool) -> i64 {
    let college = create_college(pool, "ENG", "دانشکده فنی").await.unwrap();
    create_field_of_study(
        pool,
        &NewFieldOfStudy {
            college_id: college,
            code: "CE".to_string(),
            name: "مهندسی کامپیوتر".to_string(),
            degree_level: "کارشناسی".to_string(),
            total_credits: 140,
        },
    )
    .await
    .unwrap()
}

fn course(field_id: i64, code: &str) -> NewCourse {
    NewCourse {
        field_of_study_id: field_id,
        code: code.to_string(),
        name: format!("درس {}", code),
        credits: 3,
        course_type: "theory".to_string(),
        description: None,
        prerequisites: Vec::new(),
        corequisites: Vec::new(),
    }
}

fn class(course_id: i64, term_id: i64, code: &str) -> NewClass {
    NewClass {
        course_id,
        term_id,
        room_id: None,
        class_code: code.to_string(),
        day_of_week: Weekday::Saturday,
        start_time: "10:00".to_string(),
        end_time: "11:30".to_string(),
        capacity: 30,
        exam_date: None,
        is_active: true,
    }
}

async fn add_class(pool: &SqlitePool, new_class: &NewClass) -> edu_common::Result<i64> {
    let values = new_class.validate()?;
    let mut conn = pool.acquire().await?;
    insert_class(&mut conn, &values).await
}

#[tokio::test]
async fn test_student_round_trip() {
    let (_dir, pool) = setup().await;

    let id = create_student(&pool, &student(1, "40012345")).await.unwrap();
    let loaded = load_student(&pool, id).await.unwrap();

    assert_eq!(loaded.student_number, "40012345");
    assert_eq!(loaded.person.full_name(), "رضا احمدی");
    assert!(loaded.is_active());
    assert!(!loaded.enrollment_date.is_empty());
    let age = loaded.person.age().unwrap();
    assert!(age >= 20, "born 1380, got {} years", age);

    let by_number = find_student_by_number(&pool, "40012345").await.unwrap();
    assert_eq!(by_number.map(|s| s.id), Some(id));
    assert!(find_student_by_number(&pool, "40099999").await.unwrap().is_none());
}

#[tokio::test]
async fn test_national_id_shared_across_roles_is_duplicate() {
    let (_dir, pool) = setup().await;

    create_student(&pool, &student(1, "40012345")).await.unwrap();
    let err = create_professor(&pool, &professor(1, "P-1")).await.unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)), "got {:?}", err);

    // The failed transaction left no professor behind
    let professors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM professors")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(professors, 0);
}

#[tokio::test]
async fn test_invalid_national_id_rejected() {
    let (_dir, pool) = setup().await;

    let mut bad = student(1, "40012345");
    bad.person.national_id = "0012345678".to_string();
    let err = create_student(&pool, &bad).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_professor_experience_from_hire_date() {
    let (_dir, pool) = setup().await;

    let id = create_professor(&pool, &professor(2, "P-1")).await.unwrap();
    let loaded = load_professor(&pool, id).await.unwrap();

    let years = loaded.teaching_experience_years().unwrap();
    assert!(years >= 10, "hired 1390, got {} years", years);
}

#[tokio::test]
async fn test_only_one_current_term() {
    let (_dir, pool) = setup().await;

    let first = create_term(&pool, &term("4031", true)).await.unwrap();
    let second = create_term(&pool, &term("4032", true)).await.unwrap();

    assert_eq!(current_term(&pool).await.unwrap().map(|t| t.id), Some(second));
    assert!(!load_term(&pool, first).await.unwrap().is_current);

    set_current_term(&pool, first).await.unwrap();
    assert_eq!(current_term(&pool).await.unwrap().map(|t| t.id), Some(first));

    // Unknown term leaves the current flag untouched
    assert!(matches!(
        set_current_term(&pool, 999).await,
        Err(Error::NotFound(_))
    ));
    assert_eq!(current_term(&pool).await.unwrap().map(|t| t.id), Some(first));
}

#[tokio::test]
async fn test_term_dates_must_be_ordered() {
    let (_dir, pool) = setup().await;

    let mut reversed = term("4031", false);
    reversed.end_date = "1403/01/01".to_string();
    assert!(matches!(
        create_term(&pool, &reversed).await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_course_cannot_require_itself() {
    let (_dir, pool) = setup().await;
    let field_id = field(&pool).await;

    let basics = create_course(&pool, &course(field_id, "CE101")).await.unwrap();
    let mut advanced = course(field_id, "CE201");
    advanced.prerequisites.push(RequisiteLink {
        course_id: basics,
        is_mandatory: true,
    });
    let advanced_id = create_course(&pool, &advanced).await.unwrap();

    let prereqs = requisites(&pool, RequisiteKind::Prerequisite, advanced_id)
        .await
        .unwrap();
    assert_eq!(prereqs.len(), 1);
    assert_eq!(prereqs[0].code, "CE101");

    let err = add_requisite(
        &pool,
        RequisiteKind::Corequisite,
        advanced_id,
        &RequisiteLink {
            course_id: advanced_id,
            is_mandatory: true,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_course_code_unique_within_field() {
    let (_dir, pool) = setup().await;
    let field_id = field(&pool).await;

    create_course(&pool, &course(field_id, "CE101")).await.unwrap();
    assert!(matches!(
        create_course(&pool, &course(field_id, "CE101")).await,
        Err(Error::Duplicate(_))
    ));
}

#[tokio::test]
async fn test_class_code_unique_per_term() {
    let (_dir, pool) = setup().await;
    let field_id = field(&pool).await;
    let course_id = create_course(&pool, &course(field_id, "CE101")).await.unwrap();
    let fall = create_term(&pool, &term("4031", true)).await.unwrap();
    let spring = create_term(&pool, &term("4032", false)).await.unwrap();

    add_class(&pool, &class(course_id, fall, "CL-1")).await.unwrap();
    assert!(matches!(
        add_class(&pool, &class(course_id, fall, "CL-1")).await,
        Err(Error::Duplicate(_))
    ));
    add_class(&pool, &class(course_id, spring, "CL-1")).await.unwrap();

    let all = list_course_classes(&pool, course_id, None).await.unwrap();
    assert_eq!(all.len(), 2);
    let fall_only = list_course_classes(&pool, course_id, Some(fall)).await.unwrap();
    assert_eq!(fall_only.len(), 1);
    assert_eq!(fall_only[0].registered, 0);
}

#[tokio::test]
async fn test_class_start_must_precede_end() {
    let mut backwards = class(1, 1, "CL-1");
    backwards.start_time = "12:00".to_string();
    backwards.end_time = "12:00".to_string();
    assert!(matches!(backwards.validate(), Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_grade_requires_final_status() {
    let (_dir, pool) = setup().await;
    let field_id = field(&pool).await;
    let course_id = create_course(&pool, &course(field_id, "CE101")).await.unwrap();
    let term_id = create_term(&pool, &term("4031", true)).await.unwrap();
    let class_id = add_class(&pool, &class(course_id, term_id, "CL-1")).await.unwrap();
    let student_id = create_student(&pool, &student(1, "40012345")).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    insert_registration(&mut conn, student_id, class_id, || {
        Error::Duplicate("pair".to_string())
    })
    .await
    .unwrap();
    let dup = insert_registration(&mut conn, student_id, class_id, || {
        Error::Duplicate("pair".to_string())
    })
    .await;
    assert!(matches!(dup, Err(Error::Duplicate(_))));
    drop(conn);

    let err = set_outcome(&pool, student_id, class_id, RegistrationStatus::Registered, Some(15.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = set_outcome(&pool, student_id, class_id, RegistrationStatus::Passed, Some(21.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    set_outcome(&pool, student_id, class_id, RegistrationStatus::Passed, Some(17.5))
        .await
        .unwrap();
    let registration = find_registration(&pool, student_id, class_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(registration.status, RegistrationStatus::Passed);
    assert_eq!(registration.grade, Some(17.5));
}

#[tokio::test]
async fn test_primary_contact_demotes_previous() {
    let (_dir, pool) = setup().await;
    let student_id = create_student(&pool, &student(1, "40012345")).await.unwrap();
    let owner = ContactOwner::Student(student_id);

    for (value, primary) in [("09121111111", true), ("09122222222", true)] {
        create_contact(
            &pool,
            &NewContact {
                owner,
                contact_type: "mobile".to_string(),
                value: value.to_string(),
                is_primary: primary,
            },
        )
        .await
        .unwrap();
    }

    let contacts = list_contacts(&pool, owner).await.unwrap();
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts.iter().filter(|c| c.is_primary).count(), 1);
    assert_eq!(
        mobile_number(&pool, owner).await.unwrap().as_deref(),
        Some("09122222222")
    );
}

#[tokio::test]
async fn test_contact_owner_must_exist() {
    let (_dir, pool) = setup().await;

    let err = create_contact(
        &pool,
        &NewContact {
            owner: ContactOwner::Professor(42),
            contact_type: "email".to_string(),
            value: "prof@uni.ac.ir".to_string(),
            is_primary: false,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

fn payment(student_id: i64, amount: i64, code: &str, status: &str) -> NewPayment {
    NewPayment {
        student_id,
        term_id: None,
        amount,
        payment_date: "1403/07/01".to_string(),
        method: "online".to_string(),
        status: status.to_string(),
        transaction_code: code.to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn test_payment_rules() {
    let (_dir, pool) = setup().await;
    let student_id = create_student(&pool, &student(1, "40012345")).await.unwrap();

    assert!(matches!(
        record_payment(&pool, &payment(student_id, 0, "PAY1", "success")).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        record_payment(&pool, &payment(student_id, 1000, "TX1", "success")).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        record_payment(&pool, &payment(student_id, 1000, "PAY1", "refunded")).await,
        Err(Error::InvalidInput(_))
    ));

    record_payment(&pool, &payment(student_id, 5_000_000, "PAY1", "success"))
        .await
        .unwrap();
    record_payment(&pool, &payment(student_id, 2_000_000, "PAY2", "pending"))
        .await
        .unwrap();
    assert!(matches!(
        record_payment(&pool, &payment(student_id, 1000, "PAY1", "success")).await,
        Err(Error::Duplicate(_))
    ));

    let payments = list_payments(&pool, student_id).await.unwrap();
    assert_eq!(payments.len(), 2);
    let successful: Vec<_> = payments.iter().filter(|p| p.is_successful).collect();
    assert_eq!(successful.len(), 1);
    assert_eq!(successful[0].transaction_code, "PAY1");
}

#[tokio::test]
async fn test_attendance_inside_class_window() {
    let (_dir, pool) = setup().await;
    let field_id = field(&pool).await;
    let course_id = create_course(&pool, &course(field_id, "CE101")).await.unwrap();
    let term_id = create_term(&pool, &term("4031", true)).await.unwrap();
    let class_id = add_class(&pool, &class(course_id, term_id, "CL-1")).await.unwrap();
    let student_id = create_student(&pool, &student(1, "40012345")).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();
    insert_registration(&mut conn, student_id, class_id, || Error::Duplicate("pair".into()))
        .await
        .unwrap();
    drop(conn);

    let at = |time: &str| NewAttendance {
        student_id,
        class_id,
        attendance_time: chrono::NaiveDateTime::parse_from_str(
            &format!("2024-10-12 {}", time),
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap(),
        method: "qr".to_string(),
        is_approved_by_professor: false,
        notes: None,
    };

    record_attendance(&pool, &at("10:00:00")).await.unwrap();
    record_attendance(&pool, &at("11:30:00")).await.unwrap();
    assert!(matches!(
        record_attendance(&pool, &at("11:31:00")).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        record_attendance(&pool, &at("10:00:00")).await,
        Err(Error::Duplicate(_))
    ));

    let mut manual = at("10:15:00");
    manual.method = "telepathy".to_string();
    assert!(matches!(
        record_attendance(&pool, &manual).await,
        Err(Error::InvalidInput(_))
    ));

    assert_eq!(list_attendance(&pool, student_id, class_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_survey_requires_shared_class() {
    let (_dir, pool) = setup().await;
    let field_id = field(&pool).await;
    let course_id = create_course(&pool, &course(field_id, "CE101")).await.unwrap();
    let term_id = create_term(&pool, &term("4031", true)).await.unwrap();
    let class_id = add_class(&pool, &class(course_id, term_id, "CL-1")).await.unwrap();
    let student_id = create_student(&pool, &student(1, "40012345")).await.unwrap();
    let professor_id = create_professor(&pool, &professor(2, "P-1")).await.unwrap();

    let ratings = SurveyRatings {
        teaching_quality: 5,
        communication: 4,
        punctuality: 4,
        overall_rating: 4,
        comments: Some("عالی".to_string()),
    };

    // Not registered and not assigned yet
    assert!(matches!(
        submit_survey(&pool, student_id, professor_id, class_id, &ratings).await,
        Err(Error::NotFound(_))
    ));

    let mut conn = pool.acquire().await.unwrap();
    insert_registration(&mut conn, student_id, class_id, || Error::Duplicate("pair".into()))
        .await
        .unwrap();
    insert_assignment(&mut conn, professor_id, class_id, true, None)
        .await
        .unwrap();
    drop(conn);

    let summary = submit_survey(&pool, student_id, professor_id, class_id, &ratings)
        .await
        .unwrap();
    assert_eq!(summary.average_rating, 4.25);

    assert!(matches!(
        submit_survey(&pool, student_id, professor_id, class_id, &ratings).await,
        Err(Error::Duplicate(_))
    ));
}
