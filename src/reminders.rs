//! Appointment reminder scheduling.
//!
//! A pass fetches the upcoming appointments of the logged-in patient and
//! replaces the local notification queue with a day-before and an
//! hour-before notification per appointment, keeping only those that are
//! still in the future. Passes are single-flight: a trigger that arrives
//! while one runs is folded into one extra pass after it.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::{atomic::{AtomicBool, Ordering}, Arc};
use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::error::{ApiError, ParseError};
use crate::models::Reminder;
use crate::notifier::{NotificationKind, ScheduledNotification};
use crate::types::{SharedSession, SharedSink};

pub const DAY_BEFORE_TITLE: &str = "Lembrete de Consulta";
pub const HOUR_BEFORE_TITLE: &str = "Consulta em 1 hora!";

/// Source of the upcoming appointments of the current user.
#[async_trait]
pub trait ReminderSource: Send + Sync {
    async fn fetch_reminders(&self) -> Result<Vec<Reminder>, ApiError>;
}

#[async_trait]
impl ReminderSource for ApiClient {
    async fn fetch_reminders(&self) -> Result<Vec<Reminder>, ApiError> {
        Ok(self.get_reminders().await?.reminders)
    }
}

/// Parses `DD/MM/YYYY` and `HH:MM` (seconds are ignored) into a local
/// wall-clock time.
pub fn parse_appointment_datetime(date: &str, time: &str) -> Result<NaiveDateTime, ParseError> {
    let date_err = || ParseError::Date(date.to_string());
    let time_err = || ParseError::Time(time.to_string());

    let parts: Vec<&str> = date.trim().split('/').collect();
    let [day, month, year] = parts.as_slice() else { return Err(date_err()) };
    let day = day.trim().parse::<u32>().map_err(|_| date_err())?;
    let month = month.trim().parse::<u32>().map_err(|_| date_err())?;
    let year = year.trim().parse::<i32>().map_err(|_| date_err())?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(date_err)?;

    let mut parts = time.trim().split(':');
    let hour = parts.next().and_then(|h| h.trim().parse::<u32>().ok()).ok_or_else(time_err)?;
    let minute = parts.next().and_then(|m| m.trim().parse::<u32>().ok()).ok_or_else(time_err)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(time_err)?;

    Ok(date.and_time(time))
}

fn notification_text(kind: NotificationKind, reminder: &Reminder) -> (String, String) {
    match kind {
        NotificationKind::DayBefore => (
            DAY_BEFORE_TITLE.to_string(),
            format!("Sua consulta com {} ({}) esta agendada para amanha as {} na {}",
                reminder.doctor_name, reminder.service_name, reminder.time, reminder.unit_name),
        ),
        NotificationKind::HourBefore => (
            HOUR_BEFORE_TITLE.to_string(),
            format!("Lembrete: {} com {} as {}",
                reminder.service_name, reminder.doctor_name, reminder.time),
        ),
    }
}

fn offset(kind: NotificationKind) -> Duration {
    match kind {
        NotificationKind::DayBefore => Duration::hours(24),
        NotificationKind::HourBefore => Duration::hours(1),
    }
}

/// Maps a wall-clock time to an instant. A time skipped by a DST jump is
/// rolled forward by the hour the clocks skipped.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: &NaiveDateTime) -> Result<DateTime<Utc>, ParseError> {
    tz.from_local_datetime(local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(*local + Duration::hours(1))).earliest())
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| ParseError::NonexistentLocalTime(local.to_string()))
}

/// Notifications for a single reminder, in `now`'s time zone.
pub fn plan_for_reminder<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>)
    -> Result<Vec<ScheduledNotification>, ParseError> {

    let local = parse_appointment_datetime(&reminder.date, &reminder.time)?;
    let appointment_at = resolve_local(&now.timezone(), &local)?;
    let now = now.with_timezone(&Utc);

    let mut planned = Vec::with_capacity(2);
    for kind in [NotificationKind::DayBefore, NotificationKind::HourBefore] {
        let fire_at = appointment_at - offset(kind);
        if fire_at <= now {
            continue;
        }
        let (title, body) = notification_text(kind, reminder);
        planned.push(ScheduledNotification {
            id: format!("{}:{}", reminder.id, kind.as_str()),
            appointment_id: reminder.id.clone(),
            kind,
            fire_at,
            title,
            body,
        });
    }
    Ok(planned)
}

/// Full notification set for a pass. Reminders that fail to parse are
/// skipped with a warning.
pub fn plan_notifications<Tz: TimeZone>(reminders: &[Reminder], now: &DateTime<Tz>) -> Vec<ScheduledNotification> {
    reminders.iter()
        .flat_map(|reminder| match plan_for_reminder(reminder, now) {
            Ok(planned) => planned,
            Err(e) => {
                warn!("reminders:: skipping appointment {}: {}", reminder.id, e);
                Vec::new()
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Foreground,
    Periodic,
    Realtime,
    Booking,
    Manual,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    Rescheduled(usize),
    /// Another pass was running; it will run once more on our behalf.
    Coalesced,
    /// The session ended while the reminders were being fetched.
    Discarded,
    SkippedUnsupported,
    SkippedUnauthenticated,
    Failed,
}

/// Holds the single-flight token for one pass and releases it on drop, so
/// a pass whose future is dropped halfway does not block later triggers.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ReminderScheduler {
    source: Arc<dyn ReminderSource>,
    session: SharedSession,
    sink: Option<SharedSink>,
    in_flight: AtomicBool,
    rerun: AtomicBool,
    /// Bumped on logout. A pass only publishes its result if the epoch it
    /// started in is still current.
    epoch: Mutex<u64>,
}

impl ReminderScheduler {
    pub fn new(source: Arc<dyn ReminderSource>, session: SharedSession, sink: Option<SharedSink>) -> ReminderScheduler {
        ReminderScheduler {
            source,
            session,
            sink,
            in_flight: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
            epoch: Mutex::new(0),
        }
    }

    pub fn sink(&self) -> Option<&SharedSink> {
        self.sink.as_ref()
    }

    fn try_enter(&self) -> Option<FlightGuard<'_>> {
        loop {
            if !self.in_flight.swap(true, Ordering::SeqCst) {
                return Some(FlightGuard(&self.in_flight));
            }
            self.rerun.store(true, Ordering::SeqCst);
            // The running pass may have finished between the swap and the store.
            if self.in_flight.load(Ordering::SeqCst) {
                return None;
            }
        }
    }

    /// Runs one scheduling pass. Never fails; errors are logged.
    pub async fn run_pass(&self, trigger: Trigger) -> PassOutcome {
        let Some(sink) = self.sink.as_ref() else {
            return PassOutcome::SkippedUnsupported;
        };

        let Some(mut guard) = self.try_enter() else {
            debug!("reminders:: {:?} pass coalesced into running pass", trigger);
            return PassOutcome::Coalesced;
        };

        loop {
            self.rerun.store(false, Ordering::SeqCst);
            let outcome = self.reschedule(sink, trigger).await;
            drop(guard);

            if !self.rerun.swap(false, Ordering::SeqCst) {
                return outcome;
            }
            match self.try_enter() {
                Some(next) => guard = next,
                // A new trigger already took over.
                None => return outcome,
            }
            debug!("reminders:: running coalesced pass");
        }
    }

    async fn reschedule(&self, sink: &SharedSink, trigger: Trigger) -> PassOutcome {
        let started_in = *self.epoch.lock().await;
        if !self.session.read().await.is_authenticated() {
            debug!("reminders:: {:?} pass skipped, no session", trigger);
            return PassOutcome::SkippedUnauthenticated;
        }

        let reminders = match self.source.fetch_reminders().await {
            Ok(reminders) => reminders,
            Err(e) => {
                error!("reminders:: {:?} pass failed to fetch reminders: {}", trigger, e);
                return PassOutcome::Failed;
            }
        };

        let planned = plan_notifications(&reminders, &chrono::Local::now());
        let count = planned.len();

        let epoch = self.epoch.lock().await;
        if *epoch != started_in || !self.session.read().await.is_authenticated() {
            info!("reminders:: {:?} pass discarded, session ended during fetch", trigger);
            return PassOutcome::Discarded;
        }
        sink.replace_all(planned).await;
        drop(epoch);

        info!("reminders:: {:?} pass scheduled {} notification(s) for {} appointment(s)",
            trigger, count, reminders.len());
        PassOutcome::Rescheduled(count)
    }

    /// Logout: nothing should fire for the previous user, including the
    /// result of a pass that is still fetching.
    pub async fn clear(&self) {
        let mut epoch = self.epoch.lock().await;
        *epoch += 1;
        if let Some(sink) = &self.sink {
            sink.cancel_all().await;
        }
    }
}

pub async fn reminder_refresh_loop(scheduler: Arc<ReminderScheduler>, period: std::time::Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately; the initial pass is run separately.
    interval.tick().await;
    loop {
        interval.tick().await;
        scheduler.run_pass(Trigger::Periodic).await;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

impl AppState {
    pub fn from_name(name: &str) -> Option<AppState> {
        match name.trim().to_ascii_lowercase().as_str() {
            "active" => Some(AppState::Active),
            "inactive" => Some(AppState::Inactive),
            "background" => Some(AppState::Background),
            _ => None,
        }
    }
}

/// Remembers the last reported app state.
pub struct AppStateTracker {
    current: AppState,
}

impl AppStateTracker {
    pub fn new() -> AppStateTracker {
        AppStateTracker { current: AppState::Active }
    }

    /// Records `next`; true when the app just came to the foreground.
    pub fn transition(&mut self, next: AppState) -> bool {
        let previous = std::mem::replace(&mut self.current, next);
        matches!(previous, AppState::Inactive | AppState::Background) && next == AppState::Active
    }

    pub fn current(&self) -> AppState {
        self.current
    }
}

impl Default for AppStateTracker {
    fn default() -> Self {
        AppStateTracker::new()
    }
}
