// Schedule entry module
// Domain model for a single planned task occurrence

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Opaque entry identifier.
///
/// Minted from a monotonic counter and zero-padded so that lexicographic
/// order equals creation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long before the task's time the reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ReminderLead {
    FiveMinutes,
    TenMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
}

impl ReminderLead {
    pub const ALL: [ReminderLead; 5] = [
        ReminderLead::FiveMinutes,
        ReminderLead::TenMinutes,
        ReminderLead::FifteenMinutes,
        ReminderLead::ThirtyMinutes,
        ReminderLead::OneHour,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            ReminderLead::FiveMinutes => 5,
            ReminderLead::TenMinutes => 10,
            ReminderLead::FifteenMinutes => 15,
            ReminderLead::ThirtyMinutes => 30,
            ReminderLead::OneHour => 60,
        }
    }
}

impl Default for ReminderLead {
    fn default() -> Self {
        ReminderLead::TenMinutes
    }
}

impl TryFrom<u32> for ReminderLead {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            5 => Ok(ReminderLead::FiveMinutes),
            10 => Ok(ReminderLead::TenMinutes),
            15 => Ok(ReminderLead::FifteenMinutes),
            30 => Ok(ReminderLead::ThirtyMinutes),
            60 => Ok(ReminderLead::OneHour),
            other => Err(format!("unsupported reminder lead: {} minutes", other)),
        }
    }
}

impl From<ReminderLead> for u32 {
    fn from(lead: ReminderLead) -> u32 {
        lead.minutes()
    }
}

/// One planned task occurrence on a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Wall-clock time of day, local time, no seconds.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// The calendar day this entry belongs to (also the store's bucket key).
    pub date: NaiveDate,
    #[serde(default)]
    pub reminder_enabled: bool,
    #[serde(default)]
    pub reminder_lead: ReminderLead,
}

impl ScheduleEntry {
    /// Create an entry with the required fields.
    ///
    /// # Examples
    /// ```
    /// use fairy_schedule::models::entry::{EntryId, ScheduleEntry};
    /// use chrono::{NaiveDate, NaiveTime};
    ///
    /// let entry = ScheduleEntry::new(
    ///     EntryId("0000000001".to_string()),
    ///     "Water the moonflowers",
    ///     NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
    ///     NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    /// )
    /// .unwrap();
    /// assert!(!entry.reminder_enabled);
    /// ```
    pub fn new(
        id: EntryId,
        task_name: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Self, String> {
        let task_name = task_name.into();
        if task_name.trim().is_empty() {
            return Err("Task name cannot be empty".to_string());
        }

        Ok(Self {
            id,
            task_name,
            description: None,
            time,
            date,
            reminder_enabled: false,
            reminder_lead: ReminderLead::default(),
        })
    }

    pub fn builder() -> ScheduleEntryBuilder {
        ScheduleEntryBuilder::new()
    }

    /// Validate the entry. Form-boundary rules; the store re-checks them
    /// against callers that bypass the form.
    pub fn validate(&self) -> Result<(), String> {
        if self.task_name.trim().is_empty() {
            return Err("Task name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Builder for constructing entries with optional fields.
pub struct ScheduleEntryBuilder {
    id: Option<EntryId>,
    task_name: Option<String>,
    description: Option<String>,
    time: Option<NaiveTime>,
    date: Option<NaiveDate>,
    reminder_enabled: bool,
    reminder_lead: ReminderLead,
}

impl ScheduleEntryBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            task_name: None,
            description: None,
            time: None,
            date: None,
            reminder_enabled: false,
            reminder_lead: ReminderLead::default(),
        }
    }

    pub fn id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = Some(task_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn reminder(mut self, enabled: bool, lead: ReminderLead) -> Self {
        self.reminder_enabled = enabled;
        self.reminder_lead = lead;
        self
    }

    pub fn build(self) -> Result<ScheduleEntry, String> {
        let id = self.id.ok_or("Entry id is required")?;
        let task_name = self.task_name.ok_or("Task name is required")?;
        let date = self.date.ok_or("Entry date is required")?;
        let time = self.time.ok_or("Entry time is required")?;

        let mut entry = ScheduleEntry::new(id, task_name, date, time)?;
        entry.description = self.description.filter(|d| !d.trim().is_empty());
        entry.reminder_enabled = self.reminder_enabled;
        entry.reminder_lead = self.reminder_lead;
        Ok(entry)
    }
}

impl Default for ScheduleEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serde adapter for "HH:MM" times (no seconds).
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}
