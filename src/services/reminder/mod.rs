//! Reminder scheduler.
//!
//! Computes a fire time per entry (event time minus lead minutes) and keeps
//! one pending timer per entry id. The tick loop delivers due reminders
//! through the notification collaborator; callers pass `now` in, so tests
//! advance time by calling `tick_at` with fabricated instants.
//!
//! Per-entry state machine: Unarmed -> Armed -> Fired, or Armed -> Cancelled.
//! Arranging over an armed id replaces the pending timer; there is never more
//! than one per entry. Stale fire times (already past at arrangement) are a
//! defined no-op, not an error. Terminal slots (Fired/Cancelled) stay
//! observable until the next tick, then drop, so the map stays bounded by
//! the live timer set. Pending timers do not survive a process restart; the
//! controller's startup re-arm pass covers still-future entries.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local};

use crate::models::entry::{EntryId, ScheduleEntry};
use crate::services::notification::{Notifier, PermissionState};
use crate::utils::date::to_local;

/// Result of an arrangement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrangeOutcome {
    /// A timer is pending for the given instant.
    Armed(DateTime<Local>),
    /// The computed fire time was already past; silently skipped, no
    /// backfill.
    StaleFireTime,
    /// Notification permission not granted at arrangement time. No retry or
    /// queuing; the caller may re-check permission and arrange again.
    PermissionDenied,
}

/// Observable reminder state for one entry id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Unarmed,
    Armed { fire_at: DateTime<Local> },
    Fired,
    Cancelled,
}

/// A reminder that was delivered during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub entry_id: EntryId,
    pub task_name: String,
    pub fire_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
struct ArmedTimer {
    fire_at: DateTime<Local>,
    task_name: String,
    lead_minutes: u32,
}

#[derive(Debug, Clone)]
enum TimerSlot {
    Armed(ArmedTimer),
    Fired,
    Cancelled,
}

/// One-shot local reminder timers, keyed by entry id.
#[derive(Debug, Default)]
pub struct ReminderScheduler {
    slots: HashMap<EntryId, TimerSlot>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Arrange a one-shot reminder for the entry, evaluated at `now`.
    ///
    /// Replaces any pending timer for the same id. Checks notification
    /// permission at arrangement time; without it this is a no-op.
    pub fn arrange(&mut self, entry: &ScheduleEntry, notifier: &dyn Notifier) -> ArrangeOutcome {
        self.arrange_at(entry, Local::now(), notifier)
    }

    pub fn arrange_at(
        &mut self,
        entry: &ScheduleEntry,
        now: DateTime<Local>,
        notifier: &dyn Notifier,
    ) -> ArrangeOutcome {
        // An edit replaces whatever timer was pending for this id.
        self.cancel(&entry.id);

        if notifier.permission_state() != PermissionState::Granted {
            log::debug!(
                "reminder for entry {} not armed: permission not granted",
                entry.id
            );
            return ArrangeOutcome::PermissionDenied;
        }

        let lead = Duration::minutes(entry.reminder_lead.minutes() as i64);
        let fire_at = match to_local(entry.date.and_time(entry.time) - lead) {
            Some(instant) => instant,
            None => {
                // The lead landed in a DST gap; treat like a stale time.
                log::warn!(
                    "reminder for entry {} falls in a nonexistent local time, skipping",
                    entry.id
                );
                return ArrangeOutcome::StaleFireTime;
            }
        };

        if fire_at <= now {
            log::debug!(
                "reminder for entry {} already past (fire_at {}), skipping",
                entry.id,
                fire_at
            );
            return ArrangeOutcome::StaleFireTime;
        }

        self.slots.insert(
            entry.id.clone(),
            TimerSlot::Armed(ArmedTimer {
                fire_at,
                task_name: entry.task_name.clone(),
                lead_minutes: entry.reminder_lead.minutes(),
            }),
        );
        log::info!("armed reminder for entry {} at {}", entry.id, fire_at);
        ArrangeOutcome::Armed(fire_at)
    }

    /// Invalidate a pending timer. Returns true if one was pending.
    pub fn cancel(&mut self, entry_id: &EntryId) -> bool {
        match self.slots.get(entry_id) {
            Some(TimerSlot::Armed(_)) => {
                self.slots.insert(entry_id.clone(), TimerSlot::Cancelled);
                log::debug!("cancelled pending reminder for entry {}", entry_id);
                true
            }
            _ => false,
        }
    }

    /// Deliver every armed reminder whose fire time has arrived.
    pub fn tick(&mut self, notifier: &dyn Notifier) -> Vec<FiredReminder> {
        self.tick_at(Local::now(), notifier)
    }

    pub fn tick_at(&mut self, now: DateTime<Local>, notifier: &dyn Notifier) -> Vec<FiredReminder> {
        // Terminal slots from earlier ticks have had a full tick to be
        // observed; drop them before processing this one.
        self.slots
            .retain(|_, slot| matches!(slot, TimerSlot::Armed(_)));

        let due: Vec<(EntryId, ArmedTimer)> = self
            .slots
            .iter()
            .filter_map(|(id, slot)| match slot {
                TimerSlot::Armed(timer) if timer.fire_at <= now => {
                    Some((id.clone(), timer.clone()))
                }
                _ => None,
            })
            .collect();

        let mut fired = Vec::with_capacity(due.len());
        for (entry_id, timer) in due {
            let title = format!("Fairy Reminder: {}", timer.task_name);
            let body = format!(
                "Your magical task \"{}\" is starting in {} minutes!",
                timer.task_name, timer.lead_minutes
            );
            // Best-effort delivery: a display failure is logged, not retried.
            if let Err(e) = notifier.show(&title, &body) {
                log::warn!("reminder delivery failed for entry {}: {}", entry_id, e);
            }

            self.slots.insert(entry_id.clone(), TimerSlot::Fired);
            fired.push(FiredReminder {
                entry_id,
                task_name: timer.task_name,
                fire_at: timer.fire_at,
            });
        }

        // Sort so multi-fire ticks deliver in fire-time order.
        fired.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.entry_id.cmp(&b.entry_id)));
        fired
    }

    /// Drop all timer state for the entry, as when the entry itself is
    /// deleted. Returns true if a timer was still pending.
    pub fn discard(&mut self, entry_id: &EntryId) -> bool {
        matches!(self.slots.remove(entry_id), Some(TimerSlot::Armed(_)))
    }

    pub fn state(&self, entry_id: &EntryId) -> ReminderState {
        match self.slots.get(entry_id) {
            None => ReminderState::Unarmed,
            Some(TimerSlot::Armed(timer)) => ReminderState::Armed {
                fire_at: timer.fire_at,
            },
            Some(TimerSlot::Fired) => ReminderState::Fired,
            Some(TimerSlot::Cancelled) => ReminderState::Cancelled,
        }
    }

    pub fn armed_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, TimerSlot::Armed(_)))
            .count()
    }

    /// Time of the next pending fire, if any. Lets a driver sleep precisely.
    pub fn next_fire_at(&self) -> Option<DateTime<Local>> {
        self.slots
            .values()
            .filter_map(|slot| match slot {
                TimerSlot::Armed(timer) => Some(timer.fire_at),
                _ => None,
            })
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::ReminderLead;
    use crate::services::notification::RecordingNotifier;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn entry_at(id: u64, hour: u32, minute: u32, lead: ReminderLead) -> ScheduleEntry {
        let mut entry = ScheduleEntry::new(
            EntryId(format!("{:010}", id)),
            "Moonpetal harvest",
            NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        )
        .unwrap();
        entry.reminder_enabled = true;
        entry.reminder_lead = lead;
        entry
    }

    fn local(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 8, 29, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn arms_at_event_time_minus_lead() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);

        let outcome = scheduler.arrange_at(&entry, local(13, 0), &notifier);
        assert_eq!(outcome, ArrangeOutcome::Armed(local(13, 50)));
        assert_eq!(
            scheduler.state(&entry.id),
            ReminderState::Armed {
                fire_at: local(13, 50)
            }
        );
    }

    #[test]
    fn past_fire_time_arms_nothing() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);

        let outcome = scheduler.arrange_at(&entry, local(14, 5), &notifier);
        assert_eq!(outcome, ArrangeOutcome::StaleFireTime);
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn permission_denied_is_a_noop() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::denied();
        let entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);

        let outcome = scheduler.arrange_at(&entry, local(13, 0), &notifier);
        assert_eq!(outcome, ArrangeOutcome::PermissionDenied);
        assert_eq!(scheduler.state(&entry.id), ReminderState::Unarmed);
    }

    #[test]
    fn tick_fires_due_reminders_once() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);
        scheduler.arrange_at(&entry, local(13, 0), &notifier);

        assert!(scheduler.tick_at(local(13, 49), &notifier).is_empty());

        let fired = scheduler.tick_at(local(13, 50), &notifier);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].entry_id, entry.id);
        assert_eq!(scheduler.state(&entry.id), ReminderState::Fired);
        assert_eq!(
            notifier.shown_titles(),
            vec!["Fairy Reminder: Moonpetal harvest".to_string()]
        );

        // Already fired; later ticks deliver nothing more.
        assert!(scheduler.tick_at(local(15, 0), &notifier).is_empty());
        assert_eq!(notifier.shown.borrow().len(), 1);
    }

    #[test]
    fn fired_body_carries_lead_phrasing() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let entry = entry_at(1, 14, 0, ReminderLead::ThirtyMinutes);
        scheduler.arrange_at(&entry, local(13, 0), &notifier);
        scheduler.tick_at(local(13, 30), &notifier);

        let shown = notifier.shown.borrow();
        assert!(shown[0].1.contains("starting in 30 minutes"));
    }

    #[test]
    fn cancelled_reminder_never_fires() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);
        scheduler.arrange_at(&entry, local(13, 0), &notifier);

        assert!(scheduler.cancel(&entry.id));
        assert_eq!(scheduler.state(&entry.id), ReminderState::Cancelled);

        // Advance well past the original fire time: nothing is delivered.
        assert!(scheduler.tick_at(local(18, 0), &notifier).is_empty());
        assert!(notifier.shown.borrow().is_empty());
    }

    #[test]
    fn cancel_without_pending_timer_is_noop() {
        let mut scheduler = ReminderScheduler::new();
        assert!(!scheduler.cancel(&EntryId("0000000042".into())));
    }

    #[test]
    fn rearranging_replaces_the_pending_timer() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let mut entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);
        scheduler.arrange_at(&entry, local(12, 0), &notifier);

        // Edit moves the task later with a longer lead.
        entry.time = NaiveTime::from_hms_opt(16, 0, 0).unwrap();
        entry.reminder_lead = ReminderLead::OneHour;
        scheduler.arrange_at(&entry, local(12, 0), &notifier);

        assert_eq!(scheduler.armed_count(), 1);
        assert_eq!(scheduler.next_fire_at(), Some(local(15, 0)));

        // The superseded 13:50 timer must not fire.
        assert!(scheduler.tick_at(local(13, 55), &notifier).is_empty());
        let fired = scheduler.tick_at(local(15, 0), &notifier);
        assert_eq!(fired.len(), 1);
        assert_eq!(notifier.shown.borrow().len(), 1);
    }

    #[test]
    fn terminal_slots_are_dropped_on_the_next_tick() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);
        scheduler.arrange_at(&entry, local(13, 0), &notifier);

        scheduler.tick_at(local(13, 50), &notifier);
        assert_eq!(scheduler.state(&entry.id), ReminderState::Fired);

        scheduler.tick_at(local(14, 0), &notifier);
        assert_eq!(scheduler.state(&entry.id), ReminderState::Unarmed);

        // Cancelled slots drop the same way.
        let other = entry_at(2, 18, 0, ReminderLead::TenMinutes);
        scheduler.arrange_at(&other, local(14, 0), &notifier);
        scheduler.cancel(&other.id);
        assert_eq!(scheduler.state(&other.id), ReminderState::Cancelled);

        scheduler.tick_at(local(14, 30), &notifier);
        assert_eq!(scheduler.state(&other.id), ReminderState::Unarmed);
    }

    #[test]
    fn discard_drops_all_timer_state() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let entry = entry_at(1, 14, 0, ReminderLead::TenMinutes);
        scheduler.arrange_at(&entry, local(13, 0), &notifier);

        assert!(scheduler.discard(&entry.id));
        assert_eq!(scheduler.state(&entry.id), ReminderState::Unarmed);
        assert!(scheduler.tick_at(local(18, 0), &notifier).is_empty());
        assert!(notifier.shown.borrow().is_empty());

        // Nothing pending any more.
        assert!(!scheduler.discard(&entry.id));
    }

    #[test]
    fn tick_orders_multiple_fires_by_fire_time() {
        let mut scheduler = ReminderScheduler::new();
        let notifier = RecordingNotifier::granted();
        let late = entry_at(1, 15, 0, ReminderLead::FiveMinutes);
        let early = entry_at(2, 14, 0, ReminderLead::FiveMinutes);
        scheduler.arrange_at(&late, local(9, 0), &notifier);
        scheduler.arrange_at(&early, local(9, 0), &notifier);

        let fired = scheduler.tick_at(local(16, 0), &notifier);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].entry_id, early.id);
        assert_eq!(fired[1].entry_id, late.id);
    }
}
