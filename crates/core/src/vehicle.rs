//! Vehicle entry validation: plate format and entry time.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Rwandan plate format, e.g. `RAB 123A`.
static PLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RA[A-Z] \d{3}[A-Z]$").expect("plate regex is valid"));

/// Minimum plate length accepted before pattern matching.
pub const MIN_PLATE_LEN: usize = 6;

/// Maximum plate length accepted before pattern matching.
pub const MAX_PLATE_LEN: usize = 10;

/// Trim surrounding whitespace and upper-case a plate number.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_ascii_uppercase()
}

/// Validate a plate number against the accepted format.
pub fn validate_plate_number(plate: &str) -> Result<(), CoreError> {
    let len = plate.len();
    if !(MIN_PLATE_LEN..=MAX_PLATE_LEN).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Plate number must be between {MIN_PLATE_LEN} and {MAX_PLATE_LEN} characters"
        )));
    }
    if !PLATE_RE.is_match(plate) {
        return Err(CoreError::Validation(
            "Plate number must match Rwanda format: e.g. \"RAB 123A\"".into(),
        ));
    }
    Ok(())
}

/// A vehicle cannot be recorded as having arrived after `now`.
pub fn validate_entry_time(entry_time: Timestamp, now: Timestamp) -> Result<(), CoreError> {
    if entry_time > now {
        return Err(CoreError::Validation(
            "Entry time must not be in the future".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn accepts_well_formed_plate() {
        assert!(validate_plate_number("RAB 123A").is_ok());
        assert!(validate_plate_number("RAZ 000Z").is_ok());
    }

    #[test]
    fn rejects_wrong_prefix_and_lowercase() {
        assert!(validate_plate_number("RBB 123A").is_err());
        assert!(validate_plate_number("rab 123a").is_err());
    }

    #[test]
    fn rejects_missing_space_and_short_input() {
        assert!(validate_plate_number("RAB123A").is_err());
        assert!(validate_plate_number("RA").is_err());
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_plate("  rab 123a "), "RAB 123A");
        assert!(validate_plate_number(&normalize_plate("rab 123a")).is_ok());
    }

    #[test]
    fn entry_time_may_not_be_after_now() {
        let now = Utc::now();
        assert!(validate_entry_time(now, now).is_ok());
        assert!(validate_entry_time(now - Duration::hours(2), now).is_ok());
        assert!(matches!(
            validate_entry_time(now + Duration::seconds(1), now),
            Err(CoreError::Validation(_))
        ));
    }
}
