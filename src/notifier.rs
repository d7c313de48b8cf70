use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

use crate::delivery::DeliveryTarget;
use crate::timing::start_fire_timer;
use crate::types::{PendingMap, SharedSink};

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DayBefore,
    HourBefore,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::DayBefore => "day_before",
            NotificationKind::HourBefore => "hour_before",
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ScheduledNotification {
    pub id: String,
    pub appointment_id: String,
    pub kind: NotificationKind,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

/// Host capability for local notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Desktop,
    Web,
}

impl Platform {
    pub fn from_name(name: &str) -> Platform {
        match name.trim().to_ascii_lowercase().as_str() {
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            "web" => Platform::Web,
            _ => Platform::Desktop,
        }
    }

    pub fn supports_local_notifications(&self) -> bool {
        !matches!(self, Platform::Web)
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Cancels every pending notification and registers `notifications` in
    /// their place.
    async fn replace_all(&self, notifications: Vec<ScheduledNotification>);

    async fn cancel_all(&self);

    /// Pending notifications ordered by fire time.
    async fn scheduled(&self) -> Vec<ScheduledNotification>;
}

/// In-process notification queue. Every entry owns a timer task that fires
/// the notification and removes it from the queue.
pub struct LocalNotificationQueue {
    pending: Arc<RwLock<PendingMap>>,
    delivery: Option<DeliveryTarget>,
}

impl LocalNotificationQueue {
    pub fn new(delivery: Option<DeliveryTarget>) -> LocalNotificationQueue {
        LocalNotificationQueue {
            pending: Arc::new(RwLock::new(HashMap::new())),
            delivery,
        }
    }

    async fn cancel_locked(pending: &mut PendingMap) {
        for (_, (_, cancel)) in pending.drain() {
            cancel.send(true).await.ok();
        }
    }
}

#[async_trait]
impl NotificationSink for LocalNotificationQueue {
    async fn replace_all(&self, notifications: Vec<ScheduledNotification>) {
        let mut pending = self.pending.write().await;
        let cancelled = pending.len();
        LocalNotificationQueue::cancel_locked(&mut pending).await;

        for notification in notifications {
            let (tx, rx) = mpsc::channel(1);
            debug!("notifier:: scheduling {} at {}", notification.id, notification.fire_at);
            tokio::spawn(start_fire_timer(
                notification.clone(),
                rx,
                Arc::clone(&self.pending),
                self.delivery.clone(),
            ));
            pending.insert(notification.id.clone(), (notification, tx));
        }
        info!("notifier:: replaced {} pending notification(s) with {}", cancelled, pending.len());
    }

    async fn cancel_all(&self) {
        let mut pending = self.pending.write().await;
        let cancelled = pending.len();
        LocalNotificationQueue::cancel_locked(&mut pending).await;
        info!("notifier:: cancelled {} pending notification(s)", cancelled);
    }

    async fn scheduled(&self) -> Vec<ScheduledNotification> {
        let mut scheduled: Vec<ScheduledNotification> = self.pending.read().await
            .values()
            .map(|(notification, _)| notification.clone())
            .collect();
        scheduled.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.id.cmp(&b.id)));
        scheduled
    }
}

/// Returns no sink when the platform cannot show local notifications, which
/// turns the reminder scheduler into a no-op.
pub fn detect_sink(platform: Platform, delivery: Option<DeliveryTarget>) -> Option<SharedSink> {
    if !platform.supports_local_notifications() {
        info!("notifier:: local notifications unavailable on {:?}", platform);
        return None;
    }
    Some(Arc::new(LocalNotificationQueue::new(delivery)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn notification(id: &str, fire_at: DateTime<Utc>) -> ScheduledNotification {
        ScheduledNotification {
            id: id.to_string(),
            appointment_id: id.split(':').next().unwrap_or(id).to_string(),
            kind: NotificationKind::DayBefore,
            fire_at,
            title: "Lembrete de Consulta".into(),
            body: "body".into(),
        }
    }

    #[test]
    fn web_has_no_sink() {
        assert!(detect_sink(Platform::from_name("web"), None).is_none());
        assert!(!Platform::from_name(" WEB ").supports_local_notifications());
        assert_eq!(Platform::from_name("android"), Platform::Android);
        assert_eq!(Platform::from_name(""), Platform::Desktop);
    }

    #[tokio::test]
    async fn replace_all_drops_previous_set() {
        let queue = LocalNotificationQueue::new(None);
        let later = Utc::now() + Duration::hours(5);

        queue.replace_all(vec![notification("a:day_before", later), notification("b:day_before", later)]).await;
        queue.replace_all(vec![notification("c:day_before", later)]).await;

        let ids: Vec<String> = queue.scheduled().await.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["c:day_before".to_string()]);
    }

    #[tokio::test]
    async fn scheduled_is_ordered_by_fire_time() {
        let queue = LocalNotificationQueue::new(None);
        let now = Utc::now();
        queue.replace_all(vec![
            notification("late:x", now + Duration::hours(3)),
            notification("early:x", now + Duration::hours(1)),
        ]).await;

        let ids: Vec<String> = queue.scheduled().await.into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["early:x".to_string(), "late:x".to_string()]);
    }

    #[tokio::test]
    async fn cancel_all_empties_queue() {
        let queue = LocalNotificationQueue::new(None);
        queue.replace_all(vec![notification("a:x", Utc::now() + Duration::hours(1))]).await;
        queue.cancel_all().await;
        assert!(queue.scheduled().await.is_empty());
    }

    #[tokio::test]
    async fn due_notification_fires_and_leaves_queue() {
        let queue = LocalNotificationQueue::new(None);
        queue.replace_all(vec![notification("a:x", Utc::now() - Duration::seconds(1))]).await;

        for _ in 0..50 {
            if queue.scheduled().await.is_empty() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("notification was not fired");
    }
}
