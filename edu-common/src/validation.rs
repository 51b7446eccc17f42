//! Field validators shared by every entity
//!
//! Each rule lives here exactly once; role tables (students, professors,
//! staff) all go through the same person validation.

use crate::{Error, Result};
use chrono::NaiveTime;

/// Highest grade on the 0-20 scale
pub const MAX_GRADE: f64 = 20.0;

/// Check a 10-digit national identifier against its mod-11 check digit
pub fn is_valid_national_id(national_id: &str) -> bool {
    let bytes = national_id.as_bytes();
    if bytes.len() != 10 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    national_id_check_digit(&national_id[..9]) == Some((bytes[9] - b'0') as u32)
}

/// Check digit that completes a 9-digit prefix, `None` for a malformed prefix
///
/// Weights 10..2 are applied to the nine digits; with `s` the weighted sum
/// mod 11, the check digit is `s` when `s < 2`, otherwise `11 - s`.
pub fn national_id_check_digit(prefix: &str) -> Option<u32> {
    let bytes = prefix.as_bytes();
    if bytes.len() != 9 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let s = bytes
        .iter()
        .enumerate()
        .map(|(i, b)| (b - b'0') as u32 * (10 - i as u32))
        .sum::<u32>()
        % 11;
    // 11 - s is always <= 9 for s >= 2
    Some(if s < 2 { s } else { 11 - s })
}

pub fn validate_national_id(national_id: &str) -> Result<()> {
    if national_id.len() != 10 {
        return Err(Error::InvalidInput(
            "National id must be exactly 10 digits".to_string(),
        ));
    }
    if !is_valid_national_id(national_id) {
        return Err(Error::InvalidInput(format!(
            "National id {} fails checksum",
            national_id
        )));
    }
    Ok(())
}

/// Student numbers are digits only and strictly positive
pub fn validate_student_number(student_number: &str) -> Result<()> {
    if student_number.is_empty() || !student_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!(
            "Student number '{}' must contain digits only",
            student_number
        )));
    }
    if student_number.chars().all(|c| c == '0') {
        return Err(Error::InvalidInput(
            "Student number must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_grade(grade: f64) -> Result<()> {
    if !grade.is_finite() || !(0.0..=MAX_GRADE).contains(&grade) {
        return Err(Error::InvalidInput(format!(
            "Grade {} must be between 0 and 20",
            grade
        )));
    }
    Ok(())
}

pub fn validate_credits(credits: i64) -> Result<()> {
    if !(1..=6).contains(&credits) {
        return Err(Error::InvalidInput(format!(
            "Course credits {} must be between 1 and 6",
            credits
        )));
    }
    Ok(())
}

pub fn validate_capacity(capacity: i64) -> Result<()> {
    if capacity < 1 {
        return Err(Error::InvalidInput(format!(
            "Capacity {} must be at least 1",
            capacity
        )));
    }
    Ok(())
}

/// Mobile numbers: `09` followed by nine digits
pub fn validate_mobile(value: &str) -> Result<()> {
    if value.len() == 11 && value.starts_with("09") && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Mobile number '{}' must start with 09 and have 11 digits",
            value
        )))
    }
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain
pub fn validate_email(value: &str) -> Result<()> {
    let invalid = || Error::InvalidInput(format!("Email '{}' is not valid", value));
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || value.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

/// Payment transaction codes start with `PAY`
pub fn validate_transaction_code(code: &str) -> Result<()> {
    if code.starts_with("PAY") && code.len() > 3 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Transaction code '{}' must start with PAY",
            code
        )))
    }
}

/// Survey ratings are 1 to 5
pub fn validate_rating(name: &str, rating: i64) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} rating {} must be between 1 and 5",
            name, rating
        )))
    }
}

/// Parse a class time (`HH:MM` or `HH:MM:SS`)
pub fn parse_class_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| Error::InvalidInput(format!("Time '{}' must be HH:MM", value)))
}

/// Canonical storage form for class times
pub fn format_class_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Half-open interval overlap: `[s1, e1)` and `[s2, e2)` share a moment
pub fn intervals_overlap(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// Attendance must be recorded inside the class window, bounds inclusive
pub fn validate_attendance_window(at: NaiveTime, start: NaiveTime, end: NaiveTime) -> Result<()> {
    if at < start || at > end {
        return Err(Error::InvalidInput(format!(
            "Attendance time {} must be between {} and {}",
            format_class_time(at),
            format_class_time(start),
            format_class_time(end)
        )));
    }
    Ok(())
}

/// Reject empty or whitespace-only required text
pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_national_ids() {
        assert!(is_valid_national_id("0025176447"));
        assert!(is_valid_national_id("0499370899"));
        assert!(!is_valid_national_id("0025176448"));
        assert!(!is_valid_national_id("1234567890"));
        assert!(!is_valid_national_id("002517644"));
        assert!(!is_valid_national_id("002517644a"));
        assert!(!is_valid_national_id("00251764470"));
    }

    #[test]
    fn test_computed_check_digit_is_accepted() {
        // Deterministic sweep over prefixes instead of a random generator
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let prefix = format!("{:09}", seed % 1_000_000_000);
            let check = national_id_check_digit(&prefix).unwrap();
            let id = format!("{}{}", prefix, check);
            assert!(is_valid_national_id(&id), "rejected {}", id);
        }
    }

    #[test]
    fn test_single_digit_mutation_of_check_digit_rejected() {
        let id = "0025176447";
        for d in 0..10u8 {
            let mut bytes = id.as_bytes().to_vec();
            if bytes[9] == b'0' + d {
                continue;
            }
            bytes[9] = b'0' + d;
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(!is_valid_national_id(&mutated), "accepted {}", mutated);
        }
    }

    #[test]
    fn test_single_digit_mutation_mostly_rejected() {
        // Mod-11 weights 10..2 are all coprime with 11, so changing one of the
        // first nine digits always changes s; only the s=0/s=1 boundary (where
        // the check digit is s, not 11-s) can collide.
        let id = "0025176447";
        let mut accepted = 0;
        let mut total = 0;
        for pos in 0..9 {
            for d in 0..10u8 {
                let mut bytes = id.as_bytes().to_vec();
                if bytes[pos] == b'0' + d {
                    continue;
                }
                bytes[pos] = b'0' + d;
                total += 1;
                if is_valid_national_id(std::str::from_utf8(&bytes).unwrap()) {
                    accepted += 1;
                }
            }
        }
        assert!(accepted * 10 < total, "{} of {} mutations accepted", accepted, total);
    }

    #[test]
    fn test_student_number() {
        assert!(validate_student_number("402777321").is_ok());
        assert!(validate_student_number("0").is_err());
        assert!(validate_student_number("000").is_err());
        assert!(validate_student_number("40a").is_err());
        assert!(validate_student_number("").is_err());
        assert!(validate_student_number("-5").is_err());
    }

    #[test]
    fn test_grade_range() {
        assert!(validate_grade(0.0).is_ok());
        assert!(validate_grade(20.0).is_ok());
        assert!(validate_grade(17.25).is_ok());
        assert!(validate_grade(-0.5).is_err());
        assert!(validate_grade(20.01).is_err());
        assert!(validate_grade(f64::NAN).is_err());
    }

    #[test]
    fn test_contact_values() {
        assert!(validate_mobile("09123456789").is_ok());
        assert!(validate_mobile("9123456789").is_err());
        assert!(validate_mobile("0912345678a").is_err());
        assert!(validate_email("mehrshad@example.com").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_transaction_code() {
        assert!(validate_transaction_code("PAY202510190001").is_ok());
        assert!(validate_transaction_code("TX202510190001").is_err());
        assert!(validate_transaction_code("PAY").is_err());
    }

    #[test]
    fn test_class_time_parsing() {
        let t = parse_class_time("10:00").unwrap();
        assert_eq!(format_class_time(t), "10:00");
        assert_eq!(format_class_time(parse_class_time("12:45:00").unwrap()), "12:45");
        assert!(parse_class_time("25:00").is_err());
        assert!(parse_class_time("ten").is_err());
    }

    #[test]
    fn test_adjacent_intervals_do_not_overlap() {
        let t = |s| parse_class_time(s).unwrap();
        assert!(intervals_overlap(t("10:00"), t("11:30"), t("11:00"), t("12:00")));
        assert!(!intervals_overlap(t("10:00"), t("11:30"), t("11:30"), t("13:00")));
        assert!(intervals_overlap(t("10:00"), t("12:00"), t("10:30"), t("11:00")));
    }

    #[test]
    fn test_attendance_window_inclusive() {
        let t = |s| parse_class_time(s).unwrap();
        assert!(validate_attendance_window(t("10:00"), t("10:00"), t("11:30")).is_ok());
        assert!(validate_attendance_window(t("11:30"), t("10:00"), t("11:30")).is_ok());
        assert!(validate_attendance_window(t("11:31"), t("10:00"), t("11:30")).is_err());
    }
}
