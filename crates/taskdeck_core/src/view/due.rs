//! Human-facing due date labels for task cards.

use chrono::{DateTime, Days, NaiveDate, Utc};
use std::fmt::{Display, Formatter};

/// Relative label for a due date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueLabel {
    Today,
    Tomorrow,
    /// Formatted as `MMM d, yyyy`, e.g. `Jan 10, 2024`.
    Date(String),
}

impl Display for DueLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => f.write_str("Today"),
            Self::Tomorrow => f.write_str("Tomorrow"),
            Self::Date(value) => f.write_str(value),
        }
    }
}

/// Labels `due` relative to the caller's calendar day `today` (UTC dates).
pub fn due_label(due: DateTime<Utc>, today: NaiveDate) -> DueLabel {
    let due_day = due.date_naive();
    if due_day == today {
        return DueLabel::Today;
    }
    if today.checked_add_days(Days::new(1)) == Some(due_day) {
        return DueLabel::Tomorrow;
    }
    DueLabel::Date(due_day.format("%b %-d, %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::{due_label, DueLabel};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()
    }

    #[test]
    fn labels_today_and_tomorrow() {
        let morning = Utc.with_ymd_and_hms(2024, 1, 9, 8, 0, 0).unwrap();
        let next_night = Utc.with_ymd_and_hms(2024, 1, 10, 23, 59, 0).unwrap();
        assert_eq!(due_label(morning, today()), DueLabel::Today);
        assert_eq!(due_label(next_night, today()), DueLabel::Tomorrow);
    }

    #[test]
    fn other_days_use_short_month_format() {
        let later = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(due_label(later, today()).to_string(), "Feb 3, 2024");
        assert_eq!(due_label(earlier, today()).to_string(), "Jan 8, 2024");
    }
}
