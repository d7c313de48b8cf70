//! Listener for the admin realtime channel.
//!
//! The backend pushes `{"type": ..., "data": ...}` messages over a plain
//! WebSocket at `{WS_URL}/{client_id}`. Each event becomes a notice in the
//! log and marks the list that should be refetched; appointment events also
//! trigger a reminder pass.

use futures_util::StreamExt;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::{sync::RwLock, time::Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::reminders::{ReminderScheduler, Trigger};

pub const RECONNECT_ATTEMPTS: u32 = 10;
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Appointments,
    Patients,
    Staff,
    Units,
    Services,
    Doctors,
    Inventory,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RealtimeEvent {
    NewAppointment { patient: String, time: String },
    NewPatient { name: String },
    AppointmentCancelled,
    AppointmentUpdated,
    StaffUpdated,
    UnitsUpdated,
    ServicesUpdated,
    DoctorsUpdated,
    InventoryUpdated,
    Other(String),
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

fn data_str(data: &Value, key: &str) -> String {
    data.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

impl RealtimeEvent {
    pub fn parse(text: &str) -> Result<(RealtimeEvent, Value), serde_json::Error> {
        let raw: Value = serde_json::from_str(text)?;
        let RawMessage { kind, data } = serde_json::from_value(raw.clone())?;
        let event = match kind.as_str() {
            "new_appointment" => RealtimeEvent::NewAppointment {
                patient: data_str(&data, "patient"),
                time: data_str(&data, "time"),
            },
            "new_patient" => RealtimeEvent::NewPatient { name: data_str(&data, "name") },
            "appointment_cancelled" => RealtimeEvent::AppointmentCancelled,
            "appointment_updated" => RealtimeEvent::AppointmentUpdated,
            "staff_updated" => RealtimeEvent::StaffUpdated,
            "units_updated" => RealtimeEvent::UnitsUpdated,
            "services_updated" => RealtimeEvent::ServicesUpdated,
            "doctors_updated" => RealtimeEvent::DoctorsUpdated,
            "inventory_updated" => RealtimeEvent::InventoryUpdated,
            _ => RealtimeEvent::Other(kind),
        };
        Ok((event, raw))
    }

    pub fn notice(&self) -> Option<Notice> {
        let (level, text) = match self {
            RealtimeEvent::NewAppointment { patient, time } =>
                (NoticeLevel::Info, format!("Novo agendamento: {patient} - {time}")),
            RealtimeEvent::NewPatient { name } =>
                (NoticeLevel::Success, format!("Novo paciente cadastrado: {name}")),
            RealtimeEvent::AppointmentCancelled => (NoticeLevel::Warning, "Agendamento cancelado".to_string()),
            RealtimeEvent::AppointmentUpdated => (NoticeLevel::Info, "Agendamento atualizado".to_string()),
            RealtimeEvent::StaffUpdated => (NoticeLevel::Info, "Equipe atualizada".to_string()),
            RealtimeEvent::UnitsUpdated => (NoticeLevel::Info, "Clínicas/Unidades atualizadas".to_string()),
            RealtimeEvent::ServicesUpdated => (NoticeLevel::Info, "Serviços atualizados".to_string()),
            RealtimeEvent::DoctorsUpdated => (NoticeLevel::Info, "Doutores atualizados".to_string()),
            RealtimeEvent::InventoryUpdated => (NoticeLevel::Info, "Estoque atualizado".to_string()),
            RealtimeEvent::Other(_) => return None,
        };
        Some(Notice { level, text })
    }

    /// List that is stale after this event.
    pub fn stale_resource(&self) -> Option<Resource> {
        match self {
            RealtimeEvent::NewAppointment { .. }
            | RealtimeEvent::AppointmentCancelled
            | RealtimeEvent::AppointmentUpdated => Some(Resource::Appointments),
            RealtimeEvent::NewPatient { .. } => Some(Resource::Patients),
            RealtimeEvent::StaffUpdated => Some(Resource::Staff),
            RealtimeEvent::UnitsUpdated => Some(Resource::Units),
            RealtimeEvent::ServicesUpdated => Some(Resource::Services),
            RealtimeEvent::DoctorsUpdated => Some(Resource::Doctors),
            RealtimeEvent::InventoryUpdated => Some(Resource::Inventory),
            RealtimeEvent::Other(_) => None,
        }
    }
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct RealtimeState {
    pub connected: bool,
    pub last_message: Option<Value>,
    pub stale: Vec<Resource>,
}

impl RealtimeState {
    fn record(&mut self, event: &RealtimeEvent, raw: Value) {
        self.last_message = Some(raw);
        if let Some(resource) = event.stale_resource() {
            if !self.stale.contains(&resource) {
                self.stale.push(resource);
            }
        }
    }
}

pub type SharedRealtimeState = Arc<RwLock<RealtimeState>>;

pub fn client_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..7].to_string()
}

pub fn socket_url(ws_url: &str, client_id: &str) -> String {
    format!("{}/{}", ws_url.trim_end_matches('/'), client_id)
}

async fn handle_text(text: &str, state: &SharedRealtimeState, scheduler: &Arc<ReminderScheduler>) {
    let (event, raw) = match RealtimeEvent::parse(text) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("realtime:: unparseable message: {e}");
            return;
        }
    };
    debug!("realtime:: received {:?}", event);

    if let Some(notice) = event.notice() {
        match notice.level {
            NoticeLevel::Warning => warn!("realtime:: {}", notice.text),
            _ => info!("realtime:: {}", notice.text),
        }
    }
    if event.stale_resource() == Some(Resource::Appointments) {
        let scheduler = Arc::clone(scheduler);
        tokio::spawn(async move { scheduler.run_pass(Trigger::Realtime).await });
    }
    state.write().await.record(&event, raw);
}

pub async fn realtime_listener_loop(ws_url: String, state: SharedRealtimeState, scheduler: Arc<ReminderScheduler>) {
    let url = socket_url(&ws_url, &client_id());
    let mut failures = 0;

    while failures < RECONNECT_ATTEMPTS {
        info!("realtime:: connecting to {}", url);
        match connect_async(url.as_str()).await {
            Ok((mut stream, _)) => {
                failures = 0;
                state.write().await.connected = true;
                info!("realtime:: connected");

                while let Some(message) = stream.next().await {
                    match message {
                        Ok(Message::Text(text)) => handle_text(&text, &state, &scheduler).await,
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            error!("realtime:: stream error: {e}");
                            break;
                        }
                    }
                }
                state.write().await.connected = false;
                info!("realtime:: disconnected");
            }
            Err(e) => {
                failures += 1;
                error!("realtime:: connection attempt {} failed: {}", failures, e);
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
    error!("realtime:: giving up after {} failed attempts", RECONNECT_ATTEMPTS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::LocalNotificationQueue;
    use crate::testing::{session, upcoming, CountingSource};
    use crate::types::SharedSink;

    #[test]
    fn new_appointment_notice_names_patient_and_time() {
        let (event, raw) = RealtimeEvent::parse(
            r#"{"type": "new_appointment", "data": {"patient": "Maria", "time": "14:00"}}"#).unwrap();
        assert_eq!(event, RealtimeEvent::NewAppointment { patient: "Maria".into(), time: "14:00".into() });
        assert_eq!(event.notice().unwrap().text, "Novo agendamento: Maria - 14:00");
        assert_eq!(event.stale_resource(), Some(Resource::Appointments));
        assert_eq!(raw["data"]["patient"], "Maria");
    }

    #[test]
    fn every_update_event_has_a_notice() {
        let cases = [
            ("appointment_cancelled", NoticeLevel::Warning, "Agendamento cancelado", Resource::Appointments),
            ("appointment_updated", NoticeLevel::Info, "Agendamento atualizado", Resource::Appointments),
            ("staff_updated", NoticeLevel::Info, "Equipe atualizada", Resource::Staff),
            ("units_updated", NoticeLevel::Info, "Clínicas/Unidades atualizadas", Resource::Units),
            ("services_updated", NoticeLevel::Info, "Serviços atualizados", Resource::Services),
            ("doctors_updated", NoticeLevel::Info, "Doutores atualizados", Resource::Doctors),
            ("inventory_updated", NoticeLevel::Info, "Estoque atualizado", Resource::Inventory),
        ];
        for (kind, level, text, resource) in cases {
            let (event, _) = RealtimeEvent::parse(&format!(r#"{{"type": "{kind}"}}"#)).unwrap();
            assert_eq!(event.notice(), Some(Notice { level, text: text.to_string() }), "{kind}");
            assert_eq!(event.stale_resource(), Some(resource), "{kind}");
        }
    }

    #[test]
    fn new_patient_is_success() {
        let (event, _) = RealtimeEvent::parse(r#"{"type": "new_patient", "data": {"name": "Jose"}}"#).unwrap();
        let notice = event.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.text, "Novo paciente cadastrado: Jose");
    }

    #[test]
    fn unknown_types_are_kept_quietly() {
        let (event, _) = RealtimeEvent::parse(r#"{"type": "pong"}"#).unwrap();
        assert_eq!(event, RealtimeEvent::Other("pong".into()));
        assert_eq!(event.notice(), None);
        assert_eq!(event.stale_resource(), None);
        assert!(RealtimeEvent::parse("not json").is_err());
        assert!(RealtimeEvent::parse(r#"{"data": {}}"#).is_err());
    }

    #[test]
    fn state_tracks_last_message_and_stale_lists() {
        let mut state = RealtimeState::default();
        for text in [r#"{"type": "staff_updated"}"#, r#"{"type": "staff_updated"}"#, r#"{"type": "units_updated"}"#] {
            let (event, raw) = RealtimeEvent::parse(text).unwrap();
            state.record(&event, raw);
        }
        assert_eq!(state.stale, vec![Resource::Staff, Resource::Units]);
        assert_eq!(state.last_message.unwrap()["type"], "units_updated");
    }

    #[test]
    fn url_gets_client_id_suffix() {
        assert_eq!(socket_url("wss://api.clinica.example/ws/", "abc1234"), "wss://api.clinica.example/ws/abc1234");
        assert_eq!(client_id().len(), 7);
    }

    #[tokio::test]
    async fn only_appointment_events_trigger_a_pass() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CountingSource::new(upcoming()));
        let scheduler = Arc::new(ReminderScheduler::new(
            source.clone(), session(&dir, true), Some(Arc::new(LocalNotificationQueue::new(None)) as SharedSink)));
        let state: SharedRealtimeState = Arc::new(RwLock::new(RealtimeState::default()));

        handle_text(r#"{"type": "staff_updated"}"#, &state, &scheduler).await;
        handle_text("not json", &state, &scheduler).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 0);

        handle_text(r#"{"type": "appointment_cancelled"}"#, &state, &scheduler).await;
        for _ in 0..50 {
            if source.calls() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(source.calls(), 1);

        let state = state.read().await;
        assert_eq!(state.stale, vec![Resource::Staff, Resource::Appointments]);
        assert_eq!(state.last_message.as_ref().unwrap()["type"], "appointment_cancelled");
    }
}
