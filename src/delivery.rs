use chrono::Utc;
use log::{error, info};
use serde_json::json;

use crate::notifier::ScheduledNotification;

/// Where fired notifications go besides the log.
#[derive(Clone, Debug)]
pub struct DeliveryTarget {
    client: reqwest::Client,
    url: String,
}

impl DeliveryTarget {
    pub fn new(url: String) -> DeliveryTarget {
        DeliveryTarget { client: reqwest::Client::new(), url }
    }
}

/// Deliver a notification whose fire time has arrived
pub async fn send_notification(target: Option<&DeliveryTarget>, notification: &ScheduledNotification) {
    info!("delivery:: {} | {} | {}", notification.id, notification.title, notification.body);

    let Some(target) = target else { return };

    let body = get_notification_body(notification);
    let result = target.client.post(&target.url)
        .header("content-type", "application/json")
        .body(body)
        .send()
    .await;

    match result {
        Ok(res) => {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            info!("delivery:: response status={}, {}", status, body);
        },
        Err(e) => error!("delivery:: error {e}"),
    }
}

fn get_notification_body(notification: &ScheduledNotification) -> String {
    json!({
        "timestamp": Utc::now().timestamp(),
        "channel": "reminders",
        "title": notification.title,
        "body": notification.body,
        "sound": "default",
        "fireAt": notification.fire_at.to_rfc3339(),
        "data": {
            "appointmentId": notification.appointment_id,
        }
    }).to_string()
}
