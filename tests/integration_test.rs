// Integration tests for the schedule lifecycle and persistence
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use tempfile::tempdir;

use fairy_schedule::models::entry::ReminderLead;
use fairy_schedule::services::controller::{CalendarController, FormFields};
use fairy_schedule::services::notification::RecordingNotifier;
use fairy_schedule::services::persistence::JsonFileStore;
use fairy_schedule::services::reminder::ReminderState;

fn now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 8, 29, 9, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn form(name: &str, t: NaiveTime) -> FormFields {
    FormFields {
        task_name: name.to_string(),
        time: Some(t),
        ..FormFields::default()
    }
}

#[test]
fn test_schedule_lifecycle_across_restarts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedules.json");

    // First session: create two entries, one with a reminder.
    let created_id = {
        let mut controller = CalendarController::new_at(
            JsonFileStore::new(&path),
            RecordingNotifier::granted(),
            4,
            now(),
        );

        controller.select_date(date(2026, 8, 30));
        controller
            .submit_form_at(form("Harvest festival", time(10, 0)), now())
            .unwrap();

        controller.select_date(date(2026, 9, 2));
        let with_reminder = controller
            .submit_form_at(
                FormFields {
                    task_name: "Lantern lighting".into(),
                    description: "Bring spare wicks".into(),
                    time: Some(time(19, 30)),
                    reminder_enabled: true,
                    reminder_lead: ReminderLead::FifteenMinutes,
                },
                now(),
            )
            .unwrap();

        assert_eq!(controller.agenda().len(), 2);
        with_reminder.entry_id
    };

    // Second session: state reloads from disk and the future reminder
    // re-arms; pending timers themselves never survive a restart.
    {
        let mut controller = CalendarController::new_at(
            JsonFileStore::new(&path),
            RecordingNotifier::granted(),
            4,
            now(),
        );

        let agenda = controller.agenda();
        assert_eq!(agenda.len(), 2);
        assert_eq!(agenda[0].task_name, "Harvest festival");
        assert_eq!(agenda[1].description.as_deref(), Some("Bring spare wicks"));

        let expected_fire = Local.with_ymd_and_hms(2026, 9, 2, 19, 15, 0).unwrap();
        assert_eq!(
            controller.scheduler().state(&created_id),
            ReminderState::Armed {
                fire_at: expected_fire
            }
        );

        // Edit the reminded entry onto a different date.
        assert!(controller.edit_entry(&created_id, date(2026, 9, 2)));
        controller.select_date(date(2026, 9, 5));
        let edited = controller
            .submit_form_at(
                FormFields {
                    task_name: "Lantern lighting".into(),
                    time: Some(time(20, 0)),
                    reminder_enabled: true,
                    reminder_lead: ReminderLead::FifteenMinutes,
                    ..FormFields::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(edited.entry_id, created_id);
        assert!(controller.entries_for(date(2026, 9, 2)).is_empty());
        assert_eq!(controller.entries_for(date(2026, 9, 5)).len(), 1);
    }

    // Third session: the cross-bucket edit persisted; delete everything and
    // confirm the buckets disappear from disk.
    {
        let mut controller = CalendarController::new_at(
            JsonFileStore::new(&path),
            RecordingNotifier::granted(),
            4,
            now(),
        );

        assert!(controller.entries_for(date(2026, 9, 2)).is_empty());
        let moved = controller.entries_for(date(2026, 9, 5));
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].time, time(20, 0));

        for entry in controller.agenda() {
            assert!(controller.delete_entry(&entry.id, entry.date));
        }
        assert!(controller.agenda().is_empty());
    }

    let raw = std::fs::read_to_string(&path).unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot["schema_version"], 1);
    assert!(snapshot["buckets"].as_object().unwrap().is_empty());
    // Ids keep advancing across sessions.
    assert!(snapshot["next_id"].as_u64().unwrap() >= 3);
}

#[test]
fn test_reminder_fires_through_restart_rearm() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedules.json");

    {
        let mut controller = CalendarController::new_at(
            JsonFileStore::new(&path),
            RecordingNotifier::granted(),
            4,
            now(),
        );
        controller.select_date(date(2026, 8, 29));
        controller
            .submit_form_at(
                FormFields {
                    task_name: "Teatime".into(),
                    time: Some(time(14, 0)),
                    reminder_enabled: true,
                    reminder_lead: ReminderLead::TenMinutes,
                    ..FormFields::default()
                },
                now(),
            )
            .unwrap();
    }

    let mut controller = CalendarController::new_at(
        JsonFileStore::new(&path),
        RecordingNotifier::granted(),
        4,
        now(),
    );

    assert!(controller
        .tick_reminders_at(Local.with_ymd_and_hms(2026, 8, 29, 13, 49, 0).unwrap())
        .is_empty());

    let fired =
        controller.tick_reminders_at(Local.with_ymd_and_hms(2026, 8, 29, 13, 50, 0).unwrap());
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].task_name, "Teatime");
    assert_eq!(
        controller.notifier().shown_titles(),
        vec!["Fairy Reminder: Teatime".to_string()]
    );
}

#[test]
fn test_navigation_and_window_agenda() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedules.json");
    let mut controller = CalendarController::new_at(
        JsonFileStore::new(&path),
        RecordingNotifier::granted(),
        4,
        now(),
    );

    // August window: Aug-Nov 2026. December entry is outside it.
    controller.select_date(date(2026, 12, 1));
    controller
        .submit_form_at(form("Winter feast", time(12, 0)), now())
        .unwrap();
    controller.select_date(date(2026, 9, 10));
    controller
        .submit_form_at(form("Equinox dance", time(18, 0)), now())
        .unwrap();

    let agenda = controller.agenda();
    assert_eq!(agenda.len(), 1);
    assert_eq!(agenda[0].task_name, "Equinox dance");

    controller.navigate(4);
    assert_eq!(controller.focal_window_start(), (2026, 12));
    let agenda = controller.agenda();
    assert_eq!(agenda.len(), 1);
    assert_eq!(agenda[0].task_name, "Winter feast");

    controller.navigate(-4);
    let days = controller.visible_days_at(now().date_naive());
    assert_eq!(days.len(), 4 * 42);
    assert!(days
        .iter()
        .any(|c| c.date == date(2026, 9, 10) && c.has_entries));
}
