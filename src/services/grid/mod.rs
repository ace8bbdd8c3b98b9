//! Calendar grid generation.
//!
//! Pure functions mapping a focal month (or a window of consecutive months)
//! to fixed 6x7 grids of day cells. No side effects; "today" and the
//! has-entries lookup are passed in so rendering and tests stay
//! deterministic.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::calendar_day::CalendarDay;
use crate::utils::date::{add_months, first_of_month};

/// Cells per month grid: six full weeks of seven days.
pub const CELLS_PER_MONTH: usize = 42;

/// Generate the 42-cell grid for one focal month.
///
/// Cell 0 is the Sunday on or before the 1st of the month; the grid always
/// spans complete weeks, so leading/trailing days from adjacent months are
/// included and flagged `is_in_focal_month = false`.
pub fn month_grid<F>(year: i32, month: u32, today: NaiveDate, has_entries: F) -> Vec<CalendarDay>
where
    F: Fn(NaiveDate) -> bool,
{
    month_grid_indexed(year, month, today, 0, &has_entries)
}

/// Generate independent grids for `month_count` consecutive months starting
/// at (`start_year`, `start_month`), concatenated in order. Each cell carries
/// the index of its owning month so clicks can be routed back to it.
pub fn window_grid<F>(
    start_year: i32,
    start_month: u32,
    month_count: u32,
    today: NaiveDate,
    has_entries: F,
) -> Vec<CalendarDay>
where
    F: Fn(NaiveDate) -> bool,
{
    let mut cells = Vec::with_capacity(CELLS_PER_MONTH * month_count as usize);
    for offset in 0..month_count {
        let (year, month) = add_months(start_year, start_month, offset as i32);
        cells.extend(month_grid_indexed(
            year,
            month,
            today,
            offset as usize,
            &has_entries,
        ));
    }
    cells
}

fn month_grid_indexed<F>(
    year: i32,
    month: u32,
    today: NaiveDate,
    month_index: usize,
    has_entries: &F,
) -> Vec<CalendarDay>
where
    F: Fn(NaiveDate) -> bool,
{
    let first = first_of_month(year, month);
    let lead_days = first.weekday().num_days_from_sunday() as i64;
    let grid_start = first - Duration::days(lead_days);

    (0..CELLS_PER_MONTH as i64)
        .map(|offset| {
            let date = grid_start + Duration::days(offset);
            CalendarDay {
                date,
                is_in_focal_month: date.year() == year && date.month() == month,
                is_today: date == today,
                has_entries: has_entries(date),
                month_index,
            }
        })
        .collect()
}

/// Weekday labels in grid order (cell 0 is always a Sunday).
pub fn weekday_labels() -> [&'static str; 7] {
    ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
}
