//! Database initialization
//!
//! Creates the database file on first run, applies connection pragmas and
//! creates every table idempotently. Lookup tables (contact types, payment
//! methods and statuses, attendance methods) are seeded with their fixed rows.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Busy timeout used until the settings table is readable
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = open_pool(db_path, DEFAULT_BUSY_TIMEOUT_MS).await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    init_default_settings(&pool).await?;

    let timeout_ms: i64 = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'database_busy_timeout_ms'",
    )
    .fetch_optional(&pool)
    .await?
    .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS as i64);

    if timeout_ms as u64 != DEFAULT_BUSY_TIMEOUT_MS && timeout_ms > 0 {
        // Pragmas are per connection, so reopen the pool with the configured value
        pool.close().await;
        let pool = open_pool(db_path, timeout_ms as u64).await?;
        info!("Database busy timeout set to {} ms", timeout_ms);
        return Ok(pool);
    }

    info!("Database busy timeout set to {} ms", DEFAULT_BUSY_TIMEOUT_MS);
    Ok(pool)
}

/// Every connection gets foreign keys, WAL and the busy timeout
async fn open_pool(db_path: &Path, busy_timeout_ms: u64) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;

    // Reference data
    create_geography_tables(pool).await?;
    create_contact_type_table(pool).await?;

    // People
    create_persons_table(pool).await?;
    create_academic_unit_tables(pool).await?;
    create_students_table(pool).await?;
    create_professors_table(pool).await?;
    create_staff_table(pool).await?;
    create_contact_info_table(pool).await?;

    // Catalog and scheduling
    create_terms_table(pool).await?;
    create_courses_tables(pool).await?;
    create_rooms_table(pool).await?;
    create_classes_table(pool).await?;

    // Enrollment
    create_registrations_table(pool).await?;
    create_assignments_table(pool).await?;
    create_semester_registrations_table(pool).await?;

    // Operations
    create_attendance_tables(pool).await?;
    create_payment_tables(pool).await?;
    create_surveys_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores runtime key-value pairs (shared secret, busy timeout).
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_geography_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS countries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            code TEXT NOT NULL UNIQUE CHECK (length(code) = 3)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provinces (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            country_id INTEGER NOT NULL REFERENCES countries(id),
            name TEXT NOT NULL,
            UNIQUE (name, country_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            province_id INTEGER NOT NULL REFERENCES provinces(id),
            name TEXT NOT NULL,
            UNIQUE (name, province_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contact_type_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (code, name) in [
        ("mobile", "موبایل"),
        ("email", "ایمیل"),
        ("phone", "تلفن ثابت"),
    ] {
        sqlx::query("INSERT OR IGNORE INTO contact_types (code, name) VALUES (?, ?)")
            .bind(code)
            .bind(name)
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_persons_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            father_name TEXT NOT NULL DEFAULT '',
            national_id TEXT NOT NULL UNIQUE CHECK (length(national_id) = 10),
            id_number TEXT,
            birth_date TEXT NOT NULL,
            birth_city_id INTEGER REFERENCES cities(id),
            gender TEXT NOT NULL CHECK (gender IN ('M', 'F')),
            marital_status TEXT NOT NULL DEFAULT 'S' CHECK (marital_status IN ('S', 'M', 'D', 'W')),
            military_status TEXT CHECK (military_status IS NULL OR military_status IN ('E', 'C', 'D', 'N')),
            address TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_academic_unit_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS colleges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fields_of_study (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            college_id INTEGER NOT NULL REFERENCES colleges(id),
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            degree_level TEXT NOT NULL,
            total_credits INTEGER NOT NULL CHECK (total_credits > 0),
            is_active INTEGER NOT NULL DEFAULT 1,
            UNIQUE (code, college_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS specializations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            field_of_study_id INTEGER NOT NULL REFERENCES fields_of_study(id),
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            UNIQUE (code, field_of_study_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL UNIQUE REFERENCES persons(id),
            student_number TEXT NOT NULL UNIQUE,
            email TEXT,
            field_of_study_id INTEGER REFERENCES fields_of_study(id),
            specialization_id INTEGER REFERENCES specializations(id),
            entry_term_code TEXT,
            enrollment_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            academic_status TEXT NOT NULL DEFAULT 'A' CHECK (academic_status IN ('A', 'G', 'W', 'S')),
            password_hash TEXT NOT NULL DEFAULT '',
            password_salt TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_students_field ON students(field_of_study_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_professors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS professors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL UNIQUE REFERENCES persons(id),
            professor_code TEXT NOT NULL UNIQUE,
            employee_number TEXT UNIQUE,
            contract_type TEXT NOT NULL DEFAULT 'F' CHECK (contract_type IN ('F', 'P', 'V')),
            hire_date TEXT NOT NULL,
            expertise TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_staff_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS staff (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL UNIQUE REFERENCES persons(id),
            employee_number TEXT NOT NULL UNIQUE,
            contract_type TEXT NOT NULL DEFAULT 'F' CHECK (contract_type IN ('F', 'P', 'C')),
            hire_date TEXT NOT NULL,
            position TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contact_info_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_kind TEXT NOT NULL CHECK (owner_kind IN ('student', 'professor', 'staff')),
            owner_id INTEGER NOT NULL,
            contact_type_id INTEGER NOT NULL REFERENCES contact_types(id),
            value TEXT NOT NULL,
            is_primary INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (owner_kind, owner_id, contact_type_id, value)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_terms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 0,
            is_registration_open INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_courses_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            field_of_study_id INTEGER NOT NULL REFERENCES fields_of_study(id),
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            credits INTEGER NOT NULL CHECK (credits BETWEEN 1 AND 6),
            course_type TEXT NOT NULL DEFAULT 'theory',
            description TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            UNIQUE (code, field_of_study_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (table, column) in [
        ("course_prerequisites", "prerequisite_course_id"),
        ("course_corequisites", "corequisite_course_id"),
    ] {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id INTEGER NOT NULL REFERENCES courses(id),
                {column} INTEGER NOT NULL REFERENCES courses(id),
                is_mandatory INTEGER NOT NULL DEFAULT 1,
                UNIQUE (course_id, {column}),
                CHECK (course_id <> {column})
            )
            "#
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}

async fn create_rooms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rooms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            room_type TEXT NOT NULL DEFAULT 'C' CHECK (room_type IN ('C', 'L', 'O', 'A')),
            capacity INTEGER NOT NULL CHECK (capacity >= 1),
            building TEXT NOT NULL DEFAULT '',
            floor INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_classes_table(pool: &SqlitePool) -> Result<()> {
    // Times are zero-padded HH:MM, so text comparison orders them correctly
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL REFERENCES courses(id),
            term_id INTEGER NOT NULL REFERENCES terms(id),
            room_id INTEGER REFERENCES rooms(id),
            class_code TEXT NOT NULL,
            day_of_week TEXT NOT NULL CHECK (day_of_week IN ('SA', 'SU', 'MO', 'TU', 'WE', 'TH', 'FR')),
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            capacity INTEGER NOT NULL CHECK (capacity >= 1),
            exam_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (class_code, term_id),
            CHECK (start_time < end_time)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_classes_room_slot ON classes(room_id, term_id, day_of_week)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_classes_course ON classes(course_id, term_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_registrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student_class_registrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES students(id),
            class_id INTEGER NOT NULL REFERENCES classes(id),
            status TEXT NOT NULL DEFAULT 'R' CHECK (status IN ('R', 'P', 'F', 'W', 'I')),
            grade REAL CHECK (grade IS NULL OR (grade >= 0 AND grade <= 20)),
            notes TEXT,
            registration_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (student_id, class_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_registrations_class ON student_class_registrations(class_id, status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS professor_course_assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            professor_id INTEGER NOT NULL REFERENCES professors(id),
            class_id INTEGER NOT NULL REFERENCES classes(id),
            is_primary INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            assignment_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (professor_id, class_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one primary instructor per class
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_one_primary
        ON professor_course_assignments(class_id) WHERE is_primary = 1
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_semester_registrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS semester_registrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES students(id),
            term_id INTEGER NOT NULL REFERENCES terms(id),
            finalized_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (student_id, term_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attendance_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_methods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (code, name) in [("manual", "ثبت دستی"), ("qr", "کد QR"), ("card", "کارت هوشمند")] {
        sqlx::query("INSERT OR IGNORE INTO attendance_methods (code, name) VALUES (?, ?)")
            .bind(code)
            .bind(name)
            .execute(pool)
            .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS class_attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES students(id),
            class_id INTEGER NOT NULL REFERENCES classes(id),
            attendance_time TEXT NOT NULL,
            method_id INTEGER NOT NULL REFERENCES attendance_methods(id),
            is_approved_by_professor INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            UNIQUE (student_id, class_id, attendance_time)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_payment_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payment_methods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payment_statuses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            is_successful INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (code, name) in [("online", "پرداخت اینترنتی"), ("card", "کارتخوان"), ("cash", "نقدی")] {
        sqlx::query("INSERT OR IGNORE INTO payment_methods (code, name) VALUES (?, ?)")
            .bind(code)
            .bind(name)
            .execute(pool)
            .await?;
    }

    for (code, name, successful) in [
        ("pending", "در انتظار", false),
        ("success", "موفق", true),
        ("failed", "ناموفق", false),
    ] {
        sqlx::query(
            "INSERT OR IGNORE INTO payment_statuses (code, name, is_successful) VALUES (?, ?, ?)",
        )
        .bind(code)
        .bind(name)
        .bind(successful)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tuition_payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES students(id),
            term_id INTEGER REFERENCES terms(id),
            amount INTEGER NOT NULL CHECK (amount > 0),
            payment_date TEXT NOT NULL,
            method_id INTEGER NOT NULL REFERENCES payment_methods(id),
            status_id INTEGER NOT NULL REFERENCES payment_statuses(id),
            transaction_code TEXT NOT NULL UNIQUE,
            notes TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_surveys_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS professor_surveys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL REFERENCES students(id),
            professor_id INTEGER NOT NULL REFERENCES professors(id),
            class_id INTEGER NOT NULL REFERENCES classes(id),
            teaching_quality INTEGER NOT NULL CHECK (teaching_quality BETWEEN 1 AND 5),
            communication INTEGER NOT NULL CHECK (communication BETWEEN 1 AND 5),
            punctuality INTEGER NOT NULL CHECK (punctuality BETWEEN 1 AND 5),
            overall_rating INTEGER NOT NULL CHECK (overall_rating BETWEEN 1 AND 5),
            comments TEXT,
            survey_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (student_id, professor_id, class_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Ensure every runtime setting exists with a non-NULL value
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "database_busy_timeout_ms", "5000").await?;
    Ok(())
}

async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        None => {
            // INSERT OR IGNORE: two processes may initialize the same file
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}
