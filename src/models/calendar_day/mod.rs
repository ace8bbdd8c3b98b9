// Calendar day module
// Derived grid cell, never persisted

use chrono::NaiveDate;

/// A single cell of the rendered calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Whether this date belongs to the month the grid is labeled with.
    /// Leading/trailing days from adjacent months are shown for completeness.
    pub is_in_focal_month: bool,
    pub is_today: bool,
    pub has_entries: bool,
    /// Position of the owning month within a multi-month window, so the
    /// controller can route clicks back to the right grid.
    pub month_index: usize,
}

impl CalendarDay {
    pub fn day_of_month(&self) -> u32 {
        use chrono::Datelike;
        self.date.day()
    }
}
