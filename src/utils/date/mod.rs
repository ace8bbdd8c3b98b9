// Date utility functions

use chrono::{DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};

/// Canonical date-key format shared by the grid, store, and controller.
/// The same calendar day always produces the same key; distinct days never
/// collide.
const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT)
        .map_err(|e| format!("invalid date key '{}': {}", key, e))
}

/// First day of the given month. `month` must be in 1..=12.
pub fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("month must be in 1..=12")
}

/// Shift a (year, month) anchor by a signed number of months.
pub fn add_months(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + delta;
    (zero_based.div_euclid(12), (zero_based.rem_euclid(12) + 1) as u32)
}

/// Signed month distance from a (year, month) anchor to a date.
/// Zero means the date falls in the anchor month itself.
pub fn months_from(year: i32, month: u32, date: NaiveDate) -> i32 {
    (date.year() * 12 + date.month() as i32) - (year * 12 + month as i32)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = add_months(year, month, 1);
    first_of_month(next_year, next_month)
        .pred_opt()
        .expect("month start has a predecessor")
        .day()
}

/// Resolve a naive local datetime against the host's timezone.
/// Ambiguous times (DST fold) resolve to the earlier instant; times that do
/// not exist (DST gap) resolve to `None`.
pub fn to_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}
