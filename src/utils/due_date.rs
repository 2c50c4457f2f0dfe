// Next due date for recurring maintenance items

use chrono::{DateTime, Datelike, Months, Utc};

use crate::models::maintenance::MaintenanceFrequency;

/// Month increment for a frequency label. Unknown labels recur monthly.
pub fn months_for_label(frequency: &str) -> u32 {
    frequency
        .parse::<MaintenanceFrequency>()
        .map(|f| f.months())
        .unwrap_or(1)
}

/// First occurrence of `start + k * step` months (k >= 0) strictly after `now`.
///
/// Occurrences are always computed from `start`, so a start on the 31st lands
/// on the last day of shorter months without drifting afterwards. The number
/// of whole periods is estimated from the calendar distance, so long-unmaintained
/// records cost the same as fresh ones. Returns `None` only when the result
/// falls outside the representable date range.
pub fn next_due_date(
    start: DateTime<Utc>,
    frequency: &str,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if start > now {
        return Some(start);
    }

    let step = months_for_label(frequency);
    let elapsed_months = (now.year() - start.year()) * 12 + now.month() as i32
        - start.month() as i32;
    // One period short of the estimate, so the scan below takes at most a few steps
    let mut periods = (elapsed_months.max(0) as u32 / step).saturating_sub(1);

    loop {
        let candidate = start.checked_add_months(Months::new(periods.checked_mul(step)?))?;
        if candidate > now {
            return Some(candidate);
        }
        periods += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    const LABELS: [&str; 5] = ["monthly", "bimonthly", "quarterly", "biannually", "annually"];

    #[test]
    fn test_monthly_reference_case() {
        let due = next_due_date(utc(2024, 1, 1), "monthly", utc(2024, 6, 15));
        assert_eq!(due, Some(utc(2024, 7, 1)));
    }

    #[test]
    fn test_annual_reference_case() {
        let due = next_due_date(utc(2024, 1, 1), "annually", utc(2024, 6, 15));
        assert_eq!(due, Some(utc(2025, 1, 1)));
    }

    #[test]
    fn test_month_increments() {
        assert_eq!(months_for_label("monthly"), 1);
        assert_eq!(months_for_label("bimonthly"), 2);
        assert_eq!(months_for_label("quarterly"), 3);
        assert_eq!(months_for_label("biannually"), 6);
        assert_eq!(months_for_label("annually"), 12);
        assert_eq!(months_for_label("fortnightly"), 1);
    }

    #[test]
    fn test_label_lookup_is_case_sensitive() {
        assert_eq!(months_for_label("Annually"), 1);
        assert_eq!(months_for_label("QUARTERLY"), 1);
        let due = next_due_date(utc(2024, 1, 1), "Annually", utc(2024, 6, 15));
        assert_eq!(due, Some(utc(2024, 7, 1)));
    }

    #[test]
    fn test_unknown_label_recurs_monthly() {
        let due = next_due_date(utc(2024, 1, 1), "weekly", utc(2024, 6, 15));
        assert_eq!(due, Some(utc(2024, 7, 1)));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        // A due date equal to now is already past
        let due = next_due_date(utc(2024, 1, 1), "quarterly", utc(2024, 4, 1));
        assert_eq!(due, Some(utc(2024, 7, 1)));
    }

    #[test]
    fn test_future_start_is_returned_unchanged() {
        let due = next_due_date(utc(2025, 3, 1), "annually", utc(2024, 6, 15));
        assert_eq!(due, Some(utc(2025, 3, 1)));
    }

    #[test]
    fn test_month_end_does_not_drift() {
        let start = utc(2024, 1, 31);
        assert_eq!(
            next_due_date(start, "monthly", utc(2024, 2, 10)),
            Some(utc(2024, 2, 29))
        );
        assert_eq!(
            next_due_date(start, "monthly", utc(2024, 3, 1)),
            Some(utc(2024, 3, 31))
        );
    }

    #[test]
    fn test_long_unmaintained_record() {
        let due = next_due_date(utc(1990, 5, 20), "biannually", utc(2024, 6, 15));
        assert_eq!(due, Some(utc(2024, 11, 20)));
    }

    #[test]
    fn test_due_date_properties_for_all_labels() {
        let starts = [utc(2020, 1, 31), utc(2023, 2, 28), utc(2024, 6, 15), utc(2019, 12, 1)];
        let nows = [
            utc(2024, 6, 15),
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap(),
            utc(2025, 1, 1),
            utc(2030, 8, 9),
        ];

        for label in LABELS {
            let step = months_for_label(label);
            for start in starts {
                for now in nows {
                    let due = next_due_date(start, label, now).expect("in range");
                    assert!(due > now, "{label}: {due} should be after {now}");

                    // Reachable from start by whole increments, and the first such date
                    let k = (0..=1000u32)
                        .find(|k| start.checked_add_months(Months::new(k * step)) == Some(due))
                        .unwrap_or_else(|| panic!("{label}: {due} not reachable from {start}"));
                    if k > 0 {
                        let previous = start
                            .checked_add_months(Months::new((k - 1) * step))
                            .unwrap();
                        assert!(previous <= now);
                    }
                }
            }
        }
    }
}
