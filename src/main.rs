// Fairy Schedule Application
// Main entry point: loads the store, re-arms reminders, and runs the tick loop.

use anyhow::Result;
use chrono::Local;

use fairy_schedule::services::config::AppConfig;
use fairy_schedule::services::controller::CalendarController;
use fairy_schedule::services::notification::DesktopNotifier;
use fairy_schedule::services::persistence::JsonFileStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    log::info!("Starting Fairy Schedule");

    let config = AppConfig::load_or_default();
    let data_path = config.data_path()?;
    log::info!("schedule store at {}", data_path.display());

    let persistence = JsonFileStore::new(data_path);
    let notifier = DesktopNotifier::new(config.notifications_enabled);
    let mut controller = CalendarController::new(persistence, notifier, config.window_months);

    print_agenda(&controller);

    let tick_interval = std::time::Duration::from_secs(config.tick_interval_secs.max(1));
    loop {
        tokio::select! {
            _ = tokio::time::sleep(tick_delay(&controller, tick_interval)) => {
                for fired in controller.tick_reminders() {
                    log::info!("delivered reminder for '{}' ({})", fired.task_name, fired.entry_id);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                if let Err(e) = controller.save_now() {
                    log::warn!("final save failed: {}", e);
                }
                break;
            }
        }
    }

    Ok(())
}

/// Sleep until the next pending fire time, bounded by the tick interval so
/// newly arranged reminders are still picked up promptly.
fn tick_delay(
    controller: &CalendarController<JsonFileStore, DesktopNotifier>,
    tick_interval: std::time::Duration,
) -> std::time::Duration {
    match controller.next_fire_at() {
        Some(fire_at) => (fire_at - Local::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
            .min(tick_interval),
        None => tick_interval,
    }
}

fn print_agenda(
    controller: &CalendarController<JsonFileStore, DesktopNotifier>,
) {
    let (year, month) = controller.focal_window_start();
    let today = Local::now().date_naive();
    println!(
        "Fairy Schedule - window of {} months from {}-{:02} (today: {})",
        controller.window_months(),
        year,
        month,
        today
    );

    let agenda = controller.agenda();
    if agenda.is_empty() {
        println!("No schedules in the visible window.");
        return;
    }
    for entry in agenda {
        let marker = if entry.reminder_enabled {
            format!(" [reminder {}m before]", entry.reminder_lead.minutes())
        } else {
            String::new()
        };
        println!(
            "  {} {}  {}{}",
            entry.date,
            entry.time.format("%H:%M"),
            entry.task_name,
            marker
        );
    }
}
