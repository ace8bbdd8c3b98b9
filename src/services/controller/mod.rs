//! Calendar controller.
//!
//! Owns the schedule store exclusively and orchestrates navigation, the
//! entry-form lifecycle, write-through persistence, and reminder
//! arming/cancellation. All mutations funnel through here, which is what
//! keeps upsert/remove atomic without locking.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime};

use crate::error::ScheduleError;
use crate::models::calendar_day::CalendarDay;
use crate::models::entry::{EntryId, ReminderLead, ScheduleEntry};
use crate::services::grid;
use crate::services::notification::{Notifier, PermissionState};
use crate::services::persistence::StorePersistence;
use crate::services::reminder::{ArrangeOutcome, FiredReminder, ReminderScheduler};
use crate::services::store::ScheduleStore;
use crate::utils::date::add_months;

/// Entry-form lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Closed,
    Creating { date: NaiveDate },
    Editing { entry: ScheduleEntry },
}

/// Raw form input, validated on submit.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pub task_name: String,
    pub description: String,
    pub time: Option<NaiveTime>,
    pub reminder_enabled: bool,
    pub reminder_lead: ReminderLead,
}

/// What a successful submit did, including the reminder disposition so the
/// UI can surface a denied permission instead of swallowing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub entry_id: EntryId,
    pub reminder: Option<ArrangeOutcome>,
}

pub struct CalendarController<P: StorePersistence, N: Notifier> {
    store: ScheduleStore,
    scheduler: ReminderScheduler,
    persistence: P,
    notifier: N,
    focal_year: i32,
    focal_month: u32,
    window_months: u32,
    selected_date: Option<NaiveDate>,
    form_state: FormState,
    durability_degraded: bool,
}

impl<P: StorePersistence, N: Notifier> CalendarController<P, N> {
    /// Load the store and anchor the focal window to the current month.
    /// Load failure or absence starts an empty store; that is non-fatal by
    /// contract.
    pub fn new(persistence: P, notifier: N, window_months: u32) -> Self {
        Self::new_at(persistence, notifier, window_months, Local::now())
    }

    pub fn new_at(persistence: P, mut notifier: N, window_months: u32, now: DateTime<Local>) -> Self {
        let store = match persistence.load() {
            Ok(Some(snapshot)) => match ScheduleStore::from_snapshot(snapshot) {
                Ok(store) => store,
                Err(e) => {
                    log::warn!("discarding unreadable schedule snapshot: {}", e);
                    ScheduleStore::new()
                }
            },
            Ok(None) => ScheduleStore::new(),
            Err(e) => {
                log::warn!("failed to load schedules, starting empty: {:#}", e);
                ScheduleStore::new()
            }
        };

        if notifier.permission_state() == PermissionState::Undetermined {
            notifier.request_permission();
        }

        let today = now.date_naive();
        let mut controller = Self {
            store,
            scheduler: ReminderScheduler::new(),
            persistence,
            notifier,
            focal_year: today.year(),
            focal_month: today.month(),
            window_months: window_months.max(1),
            selected_date: None,
            form_state: FormState::Closed,
            durability_degraded: false,
        };

        let rearmed = controller.rearm_pending_at(now);
        if rearmed > 0 {
            log::info!("re-armed {} reminders from the persisted store", rearmed);
        }
        controller
    }

    /// Shift the focal window by a signed number of months. No data
    /// mutation.
    pub fn navigate(&mut self, delta_months: i32) {
        let (year, month) = add_months(self.focal_year, self.focal_month, delta_months);
        self.focal_year = year;
        self.focal_month = month;
    }

    /// Select a date. With no form open (or a creation form), this opens a
    /// creation form pre-bound to the date; while editing, it retargets the
    /// open entry instead, which is how an entry moves between days.
    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
        if !matches!(self.form_state, FormState::Editing { .. }) {
            self.form_state = FormState::Creating { date };
        }
    }

    /// Open the form pre-filled from an existing entry. Returns false if the
    /// entry is not in the store.
    pub fn edit_entry(&mut self, entry_id: &EntryId, date: NaiveDate) -> bool {
        let Some(entry) = self.store.find(entry_id, date).cloned() else {
            return false;
        };
        self.selected_date = Some(entry.date);
        self.form_state = FormState::Editing { entry };
        true
    }

    pub fn cancel_form(&mut self) {
        self.form_state = FormState::Closed;
    }

    /// Validate and apply the open form.
    ///
    /// On validation failure the form stays open and the store is untouched.
    /// On success the entry is upserted, persisted, and its reminder armed
    /// or cancelled as the flag dictates, then the form closes.
    pub fn submit_form(&mut self, fields: FormFields) -> Result<SubmitOutcome, ScheduleError> {
        self.submit_form_at(fields, Local::now())
    }

    pub fn submit_form_at(
        &mut self,
        fields: FormFields,
        now: DateTime<Local>,
    ) -> Result<SubmitOutcome, ScheduleError> {
        let (date, existing_id) = match &self.form_state {
            FormState::Closed => {
                return Err(ScheduleError::Validation("no entry form is open".into()))
            }
            FormState::Creating { date } => (*date, None),
            FormState::Editing { entry } => (
                self.selected_date.unwrap_or(entry.date),
                Some(entry.id.clone()),
            ),
        };

        if fields.task_name.trim().is_empty() {
            return Err(ScheduleError::Validation("Task name cannot be empty".into()));
        }
        let time = fields
            .time
            .ok_or_else(|| ScheduleError::Validation("Entry time is required".into()))?;

        let id = existing_id.unwrap_or_else(|| self.store.mint_id());
        let mut builder = ScheduleEntry::builder()
            .id(id.clone())
            .task_name(fields.task_name.trim())
            .date(date)
            .time(time)
            .reminder(fields.reminder_enabled, fields.reminder_lead);
        if !fields.description.trim().is_empty() {
            builder = builder.description(fields.description.trim());
        }
        let entry = builder.build().map_err(ScheduleError::Validation)?;

        self.store.upsert(entry.clone())?;
        self.persist();

        let reminder = if entry.reminder_enabled {
            Some(self.scheduler.arrange_at(&entry, now, &self.notifier))
        } else {
            // Edits that clear the flag must invalidate the old timer.
            self.scheduler.cancel(&entry.id);
            None
        };

        self.form_state = FormState::Closed;
        log::info!("saved entry {} on {}", entry.id, entry.date);
        Ok(SubmitOutcome {
            entry_id: entry.id,
            reminder,
        })
    }

    /// Delete an entry, dropping any reminder state first so a stale
    /// notification can never fire.
    pub fn delete_entry(&mut self, entry_id: &EntryId, date: NaiveDate) -> bool {
        self.scheduler.discard(entry_id);
        let removed = self.store.remove(entry_id, date);
        if removed {
            self.persist();
            log::info!("deleted entry {} from {}", entry_id, date);
        }
        removed
    }

    /// Grid cells for the visible window.
    pub fn visible_days(&self) -> Vec<CalendarDay> {
        self.visible_days_at(Local::now().date_naive())
    }

    pub fn visible_days_at(&self, today: NaiveDate) -> Vec<CalendarDay> {
        grid::window_grid(
            self.focal_year,
            self.focal_month,
            self.window_months,
            today,
            |date| self.store.has_entries(date),
        )
    }

    /// Agenda view: every entry in the visible window, (date, time) order.
    pub fn agenda(&self) -> Vec<ScheduleEntry> {
        self.store
            .entries_in_window(self.focal_year, self.focal_month, self.window_months)
    }

    pub fn entries_for(&self, date: NaiveDate) -> Vec<ScheduleEntry> {
        self.store.entries_for(date)
    }

    /// Drive reminder delivery. The binary calls this from its tick loop.
    pub fn tick_reminders(&mut self) -> Vec<FiredReminder> {
        self.tick_reminders_at(Local::now())
    }

    pub fn tick_reminders_at(&mut self, now: DateTime<Local>) -> Vec<FiredReminder> {
        self.scheduler.tick_at(now, &self.notifier)
    }

    /// Re-arm reminder-enabled entries whose fire time is still ahead.
    /// Anything already past stays skipped; there is no backfill.
    pub fn rearm_pending_at(&mut self, now: DateTime<Local>) -> usize {
        let pending: Vec<ScheduleEntry> = self
            .store
            .iter_entries()
            .filter(|e| e.reminder_enabled)
            .cloned()
            .collect();

        pending
            .iter()
            .filter(|entry| {
                matches!(
                    self.scheduler.arrange_at(entry, now, &self.notifier),
                    ArrangeOutcome::Armed(_)
                )
            })
            .count()
    }

    pub fn focal_window_start(&self) -> (i32, u32) {
        (self.focal_year, self.focal_month)
    }

    pub fn window_months(&self) -> u32 {
        self.window_months
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn form_state(&self) -> &FormState {
        &self.form_state
    }

    /// True once any save has failed this session; in-memory state is still
    /// usable but not guaranteed durable.
    pub fn durability_degraded(&self) -> bool {
        self.durability_degraded
    }

    /// Explicit save for shutdown paths that want the failure reported
    /// instead of latched. Success clears the degraded flag.
    pub fn save_now(&mut self) -> Result<(), ScheduleError> {
        self.persistence.save(&self.store.snapshot())?;
        self.durability_degraded = false;
        Ok(())
    }

    /// Re-check notification permission, prompting if still undetermined,
    /// so the UI can tell the user why reminders are not arming.
    pub fn ensure_notification_permission(&mut self) -> Result<(), ScheduleError> {
        if self.notifier.permission_state() == PermissionState::Undetermined {
            self.notifier.request_permission();
        }
        match self.notifier.permission_state() {
            PermissionState::Granted => Ok(()),
            _ => Err(ScheduleError::PermissionDenied),
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Time of the next pending reminder, so the driver can sleep until it
    /// instead of polling blindly.
    pub fn next_fire_at(&self) -> Option<DateTime<Local>> {
        self.scheduler.next_fire_at()
    }

    fn persist(&mut self) {
        if let Err(e) = self.persistence.save(&self.store.snapshot()) {
            log::warn!("failed to save schedules, continuing in memory: {:#}", e);
            self.durability_degraded = true;
        }
    }
}
