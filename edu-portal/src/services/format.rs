//! Response shapes of the student API
//!
//! Pure mappers from stored records to the JSON field names clients rely
//! on. Identifiers leave as decimal strings; absent values stay `null`.

use crate::services::metrics::{CohortAverages, StudentMetrics};
use edu_common::db::classes::ClassListing;
use edu_common::db::courses::Course;
use edu_common::db::students::Student;
use edu_common::validation::format_class_time;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicProfile {
    pub student_id: String,
    pub full_name: String,
    pub gender: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FullProfile {
    pub studentid: String,
    pub first_name: String,
    pub last_name: String,
    pub father_name: String,
    pub national_code: String,
    pub entry_semester: Option<String>,
    pub major: Option<String>,
    pub degree: Option<String>,
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonChart {
    pub same_entrance_avg: Option<f64>,
    pub same_major_avg: Option<f64>,
    pub same_faculty_avg: Option<f64>,
    pub university_avg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub passed_units: i64,
    pub total_units: Option<i64>,
    pub gpa: Option<f64>,
    pub gender: String,
    pub comparison_chart: ComparisonChart,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseSummary {
    pub course_id: String,
    pub course_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseFilter {
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProvidedCourses {
    pub query: String,
    pub filter: CourseFilter,
    pub results: Vec<CourseSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassTime {
    pub day: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassDetails {
    pub class_id: String,
    pub master_name: Option<String>,
    pub class_time: ClassTime,
    pub class_location: Option<String>,
    pub exam_date: Option<String>,
    pub capacity: i64,
    pub registred: i64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseClasses {
    pub course_id: String,
    pub course_name: String,
    pub classes: Vec<ClassDetails>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegistrationOutcome {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
}

pub fn basic_profile(student: &Student) -> BasicProfile {
    BasicProfile {
        student_id: student.student_number.clone(),
        full_name: student.person.full_name(),
        gender: student.person.gender.label().to_string(),
    }
}

pub fn full_profile(student: &Student, metrics: &StudentMetrics, mobile_number: Option<String>) -> FullProfile {
    let person = &student.person;
    FullProfile {
        studentid: student.student_number.clone(),
        first_name: person.first_name.clone(),
        last_name: person.last_name.clone(),
        father_name: person.father_name.clone(),
        national_code: person.national_id.clone(),
        entry_semester: student.entry_term_code.clone(),
        major: metrics.program.as_ref().map(|p| p.name.clone()),
        degree: metrics.program.as_ref().map(|p| p.degree_level.clone()),
        mobile_number,
    }
}

pub fn dashboard(student: &Student, metrics: &StudentMetrics, cohort: &CohortAverages) -> Dashboard {
    Dashboard {
        passed_units: metrics.credits_passed,
        total_units: metrics.program.as_ref().map(|p| p.total_credits),
        gpa: metrics.gpa,
        gender: student.person.gender.label().to_string(),
        comparison_chart: ComparisonChart {
            same_entrance_avg: cohort.same_entry_term,
            same_major_avg: cohort.same_field,
            same_faculty_avg: cohort.same_college,
            university_avg: cohort.university,
        },
    }
}

/// Case-insensitive substring filter over course names
pub fn provided_courses(courses: &[Course], course_name: Option<&str>) -> ProvidedCourses {
    let filter = course_name.map(str::trim).filter(|name| !name.is_empty());
    let needle = filter.map(str::to_lowercase);

    let results = courses
        .iter()
        .filter(|course| match &needle {
            Some(needle) => course.name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .map(|course| CourseSummary {
            course_id: course.id.to_string(),
            course_name: course.name.clone(),
        })
        .collect();

    ProvidedCourses {
        query: match filter {
            Some(name) => format!("فیلتر شده با: {}", name),
            None => "همه دروس".to_string(),
        },
        filter: CourseFilter {
            course_name: filter.map(str::to_string),
        },
        results,
    }
}

pub fn class_details(listing: &ClassListing) -> ClassDetails {
    let class = &listing.class;
    ClassDetails {
        class_id: class.id.to_string(),
        master_name: listing.master_name.clone(),
        class_time: ClassTime {
            day: class.day_of_week.persian_name().to_string(),
            start: format_class_time(class.start_time),
            end: format_class_time(class.end_time),
        },
        class_location: listing.room_code.clone(),
        exam_date: class.exam_date.clone(),
        capacity: class.capacity,
        registred: listing.registered,
        is_available: class.is_active && listing.registered < class.capacity,
    }
}

pub fn course_classes(course: &Course, listings: &[ClassListing]) -> CourseClasses {
    CourseClasses {
        course_id: course.id.to_string(),
        course_name: course.name.clone(),
        classes: listings.iter().map(class_details).collect(),
    }
}

pub fn class_registered(class_id: i64) -> RegistrationOutcome {
    RegistrationOutcome {
        status: "success".to_string(),
        message: format!("درس با موفقیت انتخاب شد: کلاس {}", class_id),
        class_id: Some(class_id.to_string()),
    }
}

pub fn semester_finalized(term_code: &str) -> RegistrationOutcome {
    RegistrationOutcome {
        status: "success".to_string(),
        message: format!("انتخاب واحد با موفقیت برای ترم {} انجام شد.", term_code),
        class_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use edu_common::db::classes::ClassRecord;
    use edu_common::db::Weekday;
    use serde_json::json;

    fn course(id: i64, name: &str) -> Course {
        Course {
            id,
            field_of_study_id: 1,
            code: format!("C{}", id),
            name: name.to_string(),
            credits: 3,
            course_type: "theory".to_string(),
            description: None,
            is_active: true,
        }
    }

    fn listing(capacity: i64, registered: i64, room: Option<&str>) -> ClassListing {
        ClassListing {
            class: ClassRecord {
                id: 42,
                course_id: 1,
                term_id: 1,
                room_id: room.map(|_| 7),
                class_code: "CL-42".to_string(),
                day_of_week: Weekday::Tuesday,
                start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(12, 45, 0).unwrap(),
                capacity,
                exam_date: Some("1404/04/17".to_string()),
                is_active: true,
            },
            room_code: room.map(str::to_string),
            master_name: None,
            registered,
        }
    }

    #[test]
    fn test_filter_matches_substring() {
        let courses = [
            course(1, "توسعه نرم افزار"),
            course(2, "سیستم‌های توزیع شده"),
            course(3, "شبکه‌های کامپیوتری"),
        ];

        let provided = provided_courses(&courses, Some("توسعه"));
        assert_eq!(provided.query, "فیلتر شده با: توسعه");
        assert_eq!(provided.filter.course_name.as_deref(), Some("توسعه"));
        assert_eq!(
            provided.results,
            vec![CourseSummary {
                course_id: "1".to_string(),
                course_name: "توسعه نرم افزار".to_string(),
            }]
        );
    }

    #[test]
    fn test_filter_ignores_case() {
        let courses = [course(1, "Data Structures"), course(2, "Compilers")];
        let provided = provided_courses(&courses, Some("data"));
        assert_eq!(provided.results.len(), 1);
        assert_eq!(provided.results[0].course_id, "1");
    }

    #[test]
    fn test_no_filter_lists_everything() {
        let courses = [course(1, "A"), course(2, "B")];
        for name in [None, Some(""), Some("  ")] {
            let provided = provided_courses(&courses, name);
            assert_eq!(provided.query, "همه دروس");
            assert_eq!(provided.filter.course_name, None);
            assert_eq!(provided.results.len(), 2);
        }
    }

    #[test]
    fn test_class_details_shape() {
        let value = serde_json::to_value(class_details(&listing(40, 35, Some("B403")))).unwrap();
        assert_eq!(
            value,
            json!({
                "class_id": "42",
                "master_name": null,
                "class_time": {"day": "سه شنبه", "start": "10:00", "end": "12:45"},
                "class_location": "B403",
                "exam_date": "1404/04/17",
                "capacity": 40,
                "registred": 35,
                "is_available": true
            })
        );
    }

    #[test]
    fn test_full_class_is_unavailable() {
        assert!(!class_details(&listing(2, 2, None)).is_available);

        let mut inactive = listing(40, 0, None);
        inactive.class.is_active = false;
        assert!(!class_details(&inactive).is_available);
    }

    #[test]
    fn test_registration_outcomes() {
        let value = serde_json::to_value(class_registered(42)).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["class_id"], "42");

        let value = serde_json::to_value(semester_finalized("4021")).unwrap();
        assert_eq!(value["message"], "انتخاب واحد با موفقیت برای ترم 4021 انجام شد.");
        assert!(value.get("class_id").is_none());
    }

    #[test]
    fn test_dashboard_field_names() {
        let chart = ComparisonChart {
            same_entrance_avg: Some(16.0),
            same_major_avg: None,
            same_faculty_avg: Some(15.5),
            university_avg: Some(15.25),
        };
        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["sameEntranceAvg"], 16.0);
        assert!(value["sameMajorAvg"].is_null());
        assert_eq!(value["universityAvg"], 15.25);
    }
}
