use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc::Sender, RwLock};

use crate::notifier::{NotificationSink, ScheduledNotification};
use crate::session::Session;

pub type SharedSession = Arc<RwLock<Session>>;

pub type SharedSink = Arc<dyn NotificationSink>;

/// <notification_id, (notification, cancel sender of its fire timer)>
pub type PendingMap = HashMap<String, (ScheduledNotification, Sender<bool>)>;
