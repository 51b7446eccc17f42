//! Professor surveys filled in by students

use crate::validation::validate_rating;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct SurveyRatings {
    pub teaching_quality: i64,
    pub communication: i64,
    pub punctuality: i64,
    pub overall_rating: i64,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveySummary {
    pub survey_id: i64,
    pub average_rating: f64,
}

impl SurveyRatings {
    pub fn validate(&self) -> Result<()> {
        validate_rating("Teaching quality", self.teaching_quality)?;
        validate_rating("Communication", self.communication)?;
        validate_rating("Punctuality", self.punctuality)?;
        validate_rating("Overall", self.overall_rating)?;
        Ok(())
    }

    /// Mean of the four ratings, two decimals
    pub fn average(&self) -> f64 {
        let sum = self.teaching_quality + self.communication + self.punctuality + self.overall_rating;
        (sum as f64 / 4.0 * 100.0).round() / 100.0
    }
}

/// Store a survey for a class the student is registered in and the professor teaches
pub async fn submit_survey(
    pool: &SqlitePool,
    student_id: i64,
    professor_id: i64,
    class_id: i64,
    ratings: &SurveyRatings,
) -> Result<SurveySummary> {
    ratings.validate()?;

    let eligible: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM student_class_registrations r
            JOIN professor_course_assignments a ON a.class_id = r.class_id
            WHERE r.student_id = ? AND a.professor_id = ? AND r.class_id = ?
        )
        "#,
    )
    .bind(student_id)
    .bind(professor_id)
    .bind(class_id)
    .fetch_one(pool)
    .await?;
    if !eligible {
        return Err(Error::NotFound(format!(
            "Class {} with professor {} for student {}",
            class_id, professor_id, student_id
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO professor_surveys (
            student_id, professor_id, class_id, teaching_quality, communication,
            punctuality, overall_rating, comments
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(student_id)
    .bind(professor_id)
    .bind(class_id)
    .bind(ratings.teaching_quality)
    .bind(ratings.communication)
    .bind(ratings.punctuality)
    .bind(ratings.overall_rating)
    .bind(&ratings.comments)
    .execute(pool)
    .await
    .map_err(|e| {
        Error::on_unique_violation(e, || {
            Error::Duplicate(format!(
                "Survey for professor {} in class {} already submitted",
                professor_id, class_id
            ))
        })
    })?;

    let survey_id = result.last_insert_rowid();
    info!(survey_id, professor_id, class_id, "Survey submitted");
    Ok(SurveySummary {
        survey_id,
        average_rating: ratings.average(),
    })
}
