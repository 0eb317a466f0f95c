//! Time-based parking charges.
//!
//! A stay is billed per started hour: the elapsed time is measured exactly and
//! rounded up to the next whole hour before the hourly fee is applied, so a
//! stay of 1h01m bills as two hours.

use crate::error::CoreError;
use crate::types::{Amount, Timestamp};

/// Microseconds in one hour.
const MICROS_PER_HOUR: i64 = 3_600_000_000;

/// Number of started hours between `entry` and `exit`.
///
/// Fails with [`CoreError::InvalidInterval`] when `exit` precedes `entry`.
pub fn billable_hours(entry: Timestamp, exit: Timestamp) -> Result<i64, CoreError> {
    let elapsed = exit.signed_duration_since(entry);
    let micros = elapsed
        .num_microseconds()
        .ok_or_else(|| CoreError::Validation("Parking interval is too long to bill".into()))?;

    if micros < 0 {
        return Err(CoreError::InvalidInterval { entry, exit });
    }

    // Ceiling division; `micros` is non-negative here.
    Ok((micros + MICROS_PER_HOUR - 1) / MICROS_PER_HOUR)
}

/// Compute the charge for a stay from `entry` to `exit` at `hourly_fee`.
///
/// `amount = ceil(hours_elapsed) * hourly_fee`.
pub fn compute_charge(
    entry: Timestamp,
    exit: Timestamp,
    hourly_fee: Amount,
) -> Result<Amount, CoreError> {
    if hourly_fee < 0 {
        return Err(CoreError::Validation(format!(
            "Hourly fee must not be negative, got {hourly_fee}"
        )));
    }

    let hours = billable_hours(entry, exit)?;
    hours
        .checked_mul(hourly_fee)
        .ok_or_else(|| CoreError::Validation("Parking charge overflows".into()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn ninety_minutes_bills_two_hours() {
        let charge = compute_charge(t0(), t0() + Duration::minutes(90), 1000).unwrap();
        assert_eq!(charge, 2000);
    }

    #[test]
    fn exact_hour_bills_one_hour() {
        let charge = compute_charge(t0(), t0() + Duration::minutes(60), 1000).unwrap();
        assert_eq!(charge, 1000);
    }

    #[test]
    fn one_hour_one_minute_bills_two_hours() {
        assert_eq!(billable_hours(t0(), t0() + Duration::minutes(61)).unwrap(), 2);
    }

    #[test]
    fn a_single_microsecond_past_the_hour_starts_a_new_one() {
        let exit = t0() + Duration::hours(1) + Duration::microseconds(1);
        assert_eq!(billable_hours(t0(), exit).unwrap(), 2);
    }

    #[test]
    fn zero_length_stay_is_free() {
        assert_eq!(compute_charge(t0(), t0(), 1000).unwrap(), 0);
    }

    #[test]
    fn one_hundred_twenty_five_minutes_at_five_hundred() {
        let charge = compute_charge(t0(), t0() + Duration::minutes(125), 500).unwrap();
        assert_eq!(charge, 1500);
    }

    #[test]
    fn negative_interval_is_rejected() {
        let result = compute_charge(t0(), t0() - Duration::minutes(1), 1000);
        assert_matches!(result, Err(CoreError::InvalidInterval { .. }));
    }

    #[test]
    fn negative_fee_is_rejected() {
        let result = compute_charge(t0(), t0() + Duration::hours(1), -5);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn overflowing_charge_is_rejected() {
        let result = compute_charge(t0(), t0() + Duration::hours(3), i64::MAX);
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("overflows"));
    }
}
