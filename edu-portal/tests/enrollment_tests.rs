//! Enrollment engine tests against a temporary database

mod helpers;

use edu_common::config::EnrollmentPolicy;
use edu_common::db::classes::seat_count;
use edu_common::db::courses::RequisiteLink;
use edu_common::db::registrations::{find_registration, set_outcome};
use edu_common::db::students::set_academic_status;
use edu_common::db::terms::{create_term, set_registration_open, NewTerm};
use edu_common::db::{AcademicStatus, RegistrationStatus, Weekday};
use edu_common::Error;
use edu_portal::services::enrollment::register;
use edu_portal::services::schedule::update_class;
use edu_portal::services::semester::{finalize, Selection};
use helpers::World;

fn mandatory(course_id: i64) -> RequisiteLink {
    RequisiteLink {
        course_id,
        is_mandatory: true,
    }
}

/// Earlier closed term holding one class of `course_id`, passed or failed by the student
async fn past_result(world: &World, student_id: i64, course_id: i64, passed: bool) {
    let term_id = create_term(
        &world.pool,
        &NewTerm {
            code: format!("40{}", 20 + course_id),
            name: "ترم گذشته".to_string(),
            start_date: "1402/06/31".to_string(),
            end_date: "1402/10/30".to_string(),
            is_current: false,
            is_registration_open: false,
        },
    )
    .await
    .unwrap();

    let mut class = world.class(course_id, &format!("OLD-{}", course_id), Weekday::Friday, "08:00", "09:00");
    class.term_id = term_id;
    let class_id = world.add_class(class).await;

    register(&world.pool, &EnrollmentPolicy::permissive(), student_id, class_id)
        .await
        .unwrap();
    let (status, grade) = if passed {
        (RegistrationStatus::Passed, 15.0)
    } else {
        (RegistrationStatus::Failed, 7.0)
    };
    set_outcome(&world.pool, student_id, class_id, status, Some(grade))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_full_class_leaves_no_row() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let class_id = world.simple_class(course, "SE-1", 2).await;

    let a = world.add_student("401000001").await;
    let b = world.add_student("401000002").await;
    let c = world.add_student("401000003").await;

    register(&world.pool, &world.policy, a, class_id).await.unwrap();
    register(&world.pool, &world.policy, b, class_id).await.unwrap();
    let err = register(&world.pool, &world.policy, c, class_id).await.unwrap_err();

    assert!(matches!(err, Error::ClassFull { capacity: 2, .. }), "got {:?}", err);
    assert!(find_registration(&world.pool, c, class_id).await.unwrap().is_none());
    assert_eq!(seat_count(&world.pool, class_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_leaves_state_unchanged() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let class_id = world.simple_class(course, "SE-1", 30).await;
    let student = world.add_student("401000001").await;

    let first = register(&world.pool, &world.policy, student, class_id).await.unwrap();
    let err = register(&world.pool, &world.policy, student, class_id).await.unwrap_err();

    assert!(matches!(err, Error::AlreadyRegistered { .. }), "got {:?}", err);
    let kept = find_registration(&world.pool, student, class_id).await.unwrap().unwrap();
    assert_eq!(kept.id, first);
    assert_eq!(kept.status, RegistrationStatus::Registered);
    assert_eq!(seat_count(&world.pool, class_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_student_and_class() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let class_id = world.simple_class(course, "SE-1", 30).await;
    let student = world.add_student("401000001").await;

    let err = register(&world.pool, &world.policy, 9999, class_id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);

    let err = register(&world.pool, &world.policy, student, 9999).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_inactive_class_is_not_found() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let mut class = world.class(course, "SE-1", Weekday::Saturday, "08:00", "09:30");
    class.is_active = false;
    let class_id = world.add_class(class).await;
    let student = world.add_student("401000001").await;

    let err = register(&world.pool, &world.policy, student, class_id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_concurrent_registrations_respect_capacity() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let class_id = world.simple_class(course, "SE-1", 3).await;

    let mut students = Vec::new();
    for i in 0..8 {
        students.push(world.add_student(&format!("40100010{}", i)).await);
    }

    let handles: Vec<_> = students
        .into_iter()
        .map(|student| {
            let pool = world.pool.clone();
            let policy = world.policy;
            tokio::spawn(async move { register(&pool, &policy, student, class_id).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(Error::ClassFull { .. }) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    assert_eq!(accepted, 3);
    assert_eq!(seat_count(&world.pool, class_id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_closed_term_rejected() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let class_id = world.simple_class(course, "SE-1", 30).await;
    let student = world.add_student("401000001").await;
    set_registration_open(&world.pool, world.term_id, false).await.unwrap();

    let err = register(&world.pool, &world.policy, student, class_id).await.unwrap_err();
    assert!(matches!(err, Error::RegistrationClosed { .. }), "got {:?}", err);

    // The policy switch turns the check off
    register(&world.pool, &EnrollmentPolicy::permissive(), student, class_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_inactive_student_rejected() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let class_id = world.simple_class(course, "SE-1", 30).await;
    let student = world.add_student("401000001").await;
    set_academic_status(&world.pool, student, AcademicStatus::Suspended)
        .await
        .unwrap();

    let err = register(&world.pool, &world.policy, student, class_id).await.unwrap_err();
    assert!(matches!(err, Error::StudentInactive { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_prerequisite_must_be_passed() {
    let world = World::new().await;
    let basics = world.add_course("AP1", "مبانی برنامه نویسی").await;
    let advanced = world
        .add_course_with("AP2", "برنامه نویسی پیشرفته", vec![mandatory(basics)], Vec::new())
        .await;
    let class_id = world.simple_class(advanced, "AP2-1", 30).await;

    let fresh = world.add_student("401000001").await;
    let err = register(&world.pool, &world.policy, fresh, class_id).await.unwrap_err();
    match err {
        Error::PrerequisiteNotMet { prerequisite_code, .. } => assert_eq!(prerequisite_code, "AP1"),
        other => panic!("unexpected error {:?}", other),
    }

    let failed = world.add_student("401000002").await;
    past_result(&world, failed, basics, false).await;
    let err = register(&world.pool, &world.policy, failed, class_id).await.unwrap_err();
    assert!(matches!(err, Error::PrerequisiteNotMet { .. }), "got {:?}", err);

    let passed = world.add_student("401000003").await;
    past_result(&world, passed, basics, true).await;
    register(&world.pool, &world.policy, passed, class_id).await.unwrap();
}

#[tokio::test]
async fn test_optional_prerequisite_not_enforced() {
    let world = World::new().await;
    let basics = world.add_course("AP1", "مبانی برنامه نویسی").await;
    let advanced = world
        .add_course_with(
            "AP2",
            "برنامه نویسی پیشرفته",
            vec![RequisiteLink {
                course_id: basics,
                is_mandatory: false,
            }],
            Vec::new(),
        )
        .await;
    let class_id = world.simple_class(advanced, "AP2-1", 30).await;
    let student = world.add_student("401000001").await;

    register(&world.pool, &world.policy, student, class_id).await.unwrap();
}

#[tokio::test]
async fn test_corequisite_taken_in_same_term() {
    let world = World::new().await;
    let physics = world.add_course("PH1", "فیزیک ۱").await;
    let lab = world
        .add_course_with("PH1L", "آزمایشگاه فیزیک ۱", Vec::new(), vec![mandatory(physics)])
        .await;
    let physics_class = world.simple_class(physics, "PH1-1", 30).await;
    let lab_class = world
        .add_class(world.class(lab, "PH1L-1", Weekday::Monday, "14:00", "16:00"))
        .await;
    let student = world.add_student("401000001").await;

    let err = register(&world.pool, &world.policy, student, lab_class).await.unwrap_err();
    match err {
        Error::CorequisiteNotMet { corequisite_code, .. } => assert_eq!(corequisite_code, "PH1"),
        other => panic!("unexpected error {:?}", other),
    }

    register(&world.pool, &world.policy, student, physics_class).await.unwrap();
    register(&world.pool, &world.policy, student, lab_class).await.unwrap();
}

#[tokio::test]
async fn test_student_time_conflict() {
    let world = World::new().await;
    let a = world.add_course("A1", "درس الف").await;
    let b = world.add_course("B1", "درس ب").await;
    let c = world.add_course("C1", "درس ج").await;
    let first = world
        .add_class(world.class(a, "A-1", Weekday::Sunday, "10:00", "11:30"))
        .await;
    let overlapping = world
        .add_class(world.class(b, "B-1", Weekday::Sunday, "11:00", "12:00"))
        .await;
    let adjacent = world
        .add_class(world.class(c, "C-1", Weekday::Sunday, "11:30", "13:00"))
        .await;
    let student = world.add_student("401000001").await;

    register(&world.pool, &world.policy, student, first).await.unwrap();

    let err = register(&world.pool, &world.policy, student, overlapping)
        .await
        .unwrap_err();
    match err {
        Error::TimeConflict { conflicting_class, .. } => assert_eq!(conflicting_class, "A-1"),
        other => panic!("unexpected error {:?}", other),
    }

    register(&world.pool, &world.policy, student, adjacent).await.unwrap();
}

#[tokio::test]
async fn test_deactivated_class_does_not_block_schedule() {
    let world = World::new().await;
    let a = world.add_course("A1", "درس الف").await;
    let b = world.add_course("B1", "درس ب").await;
    let first = world
        .add_class(world.class(a, "A-1", Weekday::Sunday, "10:00", "11:30"))
        .await;
    let overlapping = world
        .add_class(world.class(b, "B-1", Weekday::Sunday, "11:00", "12:00"))
        .await;
    let student = world.add_student("401000001").await;

    register(&world.pool, &world.policy, student, first).await.unwrap();

    let mut cancelled = world.class(a, "A-1", Weekday::Sunday, "10:00", "11:30");
    cancelled.is_active = false;
    update_class(&world.pool, first, &cancelled).await.unwrap();

    register(&world.pool, &world.policy, student, overlapping).await.unwrap();
}

#[tokio::test]
async fn test_restoring_withdrawn_registration_needs_a_seat() {
    let world = World::new().await;
    let course = world.add_course("SE1", "توسعه نرم افزار").await;
    let class_id = world.simple_class(course, "SE-1", 1).await;
    let a = world.add_student("401000001").await;
    let b = world.add_student("401000002").await;

    register(&world.pool, &world.policy, a, class_id).await.unwrap();
    set_outcome(&world.pool, a, class_id, RegistrationStatus::Withdrawn, None)
        .await
        .unwrap();
    assert_eq!(seat_count(&world.pool, class_id).await.unwrap(), 0);

    // The freed seat goes to another student
    register(&world.pool, &world.policy, b, class_id).await.unwrap();

    let err = set_outcome(&world.pool, a, class_id, RegistrationStatus::Passed, Some(15.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ClassFull { capacity: 1, .. }), "got {:?}", err);
    assert_eq!(seat_count(&world.pool, class_id).await.unwrap(), 1);
    let kept = find_registration(&world.pool, a, class_id).await.unwrap().unwrap();
    assert_eq!(kept.status, RegistrationStatus::Withdrawn);

    // Grading a row that already holds a seat never needs a free one
    set_outcome(&world.pool, b, class_id, RegistrationStatus::Passed, Some(18.0))
        .await
        .unwrap();
    assert_eq!(seat_count(&world.pool, class_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_finalize_rejects_mismatched_course() {
    let world = World::new().await;
    let se = world.add_course("SE1", "توسعه نرم افزار").await;
    let db = world.add_course("DB1", "پایگاه داده").await;
    let class_id = world.simple_class(se, "SE-1", 30).await;
    let student = world.add_student("401000001").await;

    let err = finalize(
        &world.pool,
        &world.policy,
        student,
        "4031",
        &[Selection {
            course_id: db,
            class_id,
        }],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
    assert!(find_registration(&world.pool, student, class_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_finalize_counts_new_registrations() {
    let world = World::new().await;
    let se = world.add_course("SE1", "توسعه نرم افزار").await;
    let db = world.add_course("DB1", "پایگاه داده").await;
    let c1 = world.simple_class(se, "SE-1", 30).await;
    let c2 = world
        .add_class(world.class(db, "DB-1", Weekday::Tuesday, "08:00", "09:30"))
        .await;
    let student = world.add_student("401000001").await;
    register(&world.pool, &world.policy, student, c1).await.unwrap();

    let finalized = finalize(
        &world.pool,
        &world.policy,
        student,
        "4031",
        &[
            Selection { course_id: se, class_id: c1 },
            Selection { course_id: db, class_id: c2 },
        ],
    )
    .await
    .unwrap();

    assert_eq!(finalized.term_code, "4031");
    assert_eq!(finalized.newly_registered, 1);
    assert!(find_registration(&world.pool, student, c2).await.unwrap().is_some());

    let err = finalize(&world.pool, &world.policy, student, "4031", &[]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)), "got {:?}", err);
}
