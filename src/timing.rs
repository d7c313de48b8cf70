use chrono::Utc;
use log::debug;
use std::sync::Arc;
use tokio::{sync::{mpsc, RwLock}, time::Duration};

use crate::delivery::{send_notification, DeliveryTarget};
use crate::notifier::ScheduledNotification;
use crate::types::PendingMap;

/// Waits until the notification's fire time unless cancelled first, then
/// delivers it and drops it from the pending queue.
pub async fn start_fire_timer(notification: ScheduledNotification,
    mut cancel: mpsc::Receiver<bool>,
    pending: Arc<RwLock<PendingMap>>,
    delivery: Option<DeliveryTarget>) {

    // Already-due entries fire right away
    let wait_time = (notification.fire_at - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO);

    debug!("fire_timer:: {} waiting for {:?}", notification.id, wait_time);

    let sleep_handle = tokio::time::sleep(wait_time);
    let cancel_handle = cancel.recv();

    tokio::select! {
        _ = sleep_handle => {}
        _ = cancel_handle => {
            debug!("fire_timer:: {} cancelled", notification.id);
            return;
        }
    }

    {
        let mut pending = pending.write().await;
        // A replace may have raced with the sleep; only the live entry fires.
        if cancel.try_recv().is_ok() {
            return;
        }
        pending.remove(&notification.id);
    }

    send_notification(delivery.as_ref(), &notification).await;
}
