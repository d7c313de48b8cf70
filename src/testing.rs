//! Fixtures shared by the unit tests: a counting reminder source, sessions
//! and a local stand-in for the clinic backend.

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use async_trait::async_trait;
use chrono::{Duration, Local};
use serde_json::{json, Value};
use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::models::{AuthResponse, Reminder, User};
use crate::reminders::ReminderSource;
use crate::session::{Session, TokenStore};
use crate::types::SharedSession;

pub const TOKEN: &str = "tok-123";

pub fn reminder(id: &str, date: &str, time: &str) -> Reminder {
    Reminder {
        id: id.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        doctor_name: "Dra. Ana".into(),
        service_name: "Limpeza".into(),
        unit_name: "Unidade Centro".into(),
    }
}

/// Two appointments three days from now, four notifications in total.
pub fn upcoming() -> Vec<Reminder> {
    let date = (Local::now() + Duration::days(3)).format("%d/%m/%Y").to_string();
    vec![reminder("a1", &date, "10:00"), reminder("a2", &date, "15:30")]
}

pub fn auth_response(token: &str) -> AuthResponse {
    AuthResponse {
        access_token: token.to_string(),
        user: User {
            id: "u-1".into(),
            name: "Maria Souza".into(),
            cpf: Some("123.456.789-01".into()),
            email: None,
            birth_date: Some("01/02/1990".into()),
            created_at: None,
        },
    }
}

pub fn session(dir: &tempfile::TempDir, logged_in: bool) -> SharedSession {
    let mut session = Session::load(TokenStore::new(dir.path().join("session.json")));
    if logged_in {
        session.establish(auth_response(TOKEN)).unwrap();
    }
    Arc::new(RwLock::new(session))
}

pub struct CountingSource {
    reminders: Vec<Reminder>,
    calls: AtomicUsize,
    delay: std::time::Duration,
}

impl CountingSource {
    pub fn new(reminders: Vec<Reminder>) -> CountingSource {
        CountingSource::with_delay(reminders, std::time::Duration::ZERO)
    }

    pub fn with_delay(reminders: Vec<Reminder>, delay: std::time::Duration) -> CountingSource {
        CountingSource { reminders, calls: AtomicUsize::new(0), delay }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReminderSource for CountingSource {
    async fn fetch_reminders(&self) -> Result<Vec<Reminder>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reminders.clone())
    }
}

pub struct FailingSource;

#[async_trait]
impl ReminderSource for FailingSource {
    async fn fetch_reminders(&self) -> Result<Vec<Reminder>, ApiError> {
        Err(ApiError::Status { status: 500, detail: "boom".into() })
    }
}

fn appointment(id: &str, status: &str, notes: &str) -> Value {
    json!({
        "id": id,
        "date": "25/12/2030",
        "time": "10:00",
        "status": status,
        "doctor_name": "Dra. Ana",
        "notes": notes,
    })
}

fn patient(id: &str) -> Value {
    json!({ "id": id, "name": "Maria Souza", "cpf": "123.456.789-01" })
}

async fn backend(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let bearer = format!("Bearer {TOKEN}");
    let authorized = req.headers().get("authorization").and_then(|v| v.to_str().ok()) == Some(bearer.as_str());
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let query = req.query_string().to_string();
    let path = req.path().trim_start_matches("/api");

    let protected = path.starts_with("/admin/") && path != "/admin/auth/login"
        || path.starts_with("/appointments") && path != "/appointments/booked-slots"
        || path == "/auth/me";
    if protected && !authorized {
        return HttpResponse::Unauthorized().json(json!({ "detail": "Not authenticated" }));
    }

    let reply = match (req.method().as_str(), path) {
        ("POST", "/auth/login") | ("POST", "/auth/register") | ("POST", "/admin/auth/login") =>
            json!({ "access_token": TOKEN, "user": { "id": "u-1", "name": "Maria Souza" } }),
        ("GET", "/auth/me") => json!({ "id": "u-1", "name": "Maria Souza" }),
        ("GET", "/units") => json!([{ "id": "u1", "name": "Centro" }]),
        ("GET", "/services") => json!({ "unexpected": true }),
        ("GET", "/doctors") => json!([{ "id": "d1", "name": "Dra. Ana", "unit_id": query }]),
        ("GET", "/appointments/booked-slots") => json!({ "booked_slots": ["09:00", query] }),
        ("GET", "/appointments/reminders") => json!({ "reminders": [] }),
        ("GET", "/appointments") => json!([appointment("a1", "agendado", "")]),
        ("POST", "/appointments") => {
            let mut created = body.clone();
            created["id"] = json!("a9");
            created["status"] = json!("agendado");
            created
        }
        ("DELETE", p) if p.starts_with("/appointments/") => json!({ "message": "Appointment cancelled" }),
        ("GET", "/admin/staff") => json!([{ "id": "s1", "name": "Ana", "email": "ana@clinica.example" }]),
        ("POST", "/admin/staff") => {
            let mut created = body.clone();
            created["id"] = json!("s2");
            created
        }
        ("DELETE", p) if p.starts_with("/admin/") => json!({ "message": "deleted" }),
        ("GET", "/admin/appointments") => json!([appointment("a1", "concluido", &query)]),
        ("PUT", p) if p.starts_with("/admin/appointments/") => body.clone(),
        ("GET", "/admin/financial/daily") => json!({ "date": query, "total_revenue": 150.0, "appointments": [] }),
        ("GET", "/admin/financial/summary") => json!({
            "total_revenue": 240.0,
            "total_appointments": 3,
            "average_ticket": 80.0,
            "appointments": [],
        }),
        ("POST", "/admin/inventory/movement") => body.clone(),
        ("GET", "/admin/inventory/movements") =>
            json!([{ "id": "m1", "item_id": query, "type": "saida", "quantity": 2.0 }]),
        ("GET", "/admin/inventory") => json!([{ "id": "i1", "name": "Luvas", "quantity": 40.0 }]),
        ("GET", "/admin/patients") => json!([patient("p1")]),
        ("GET", p) if p.starts_with("/admin/patients/") =>
            json!({ "patient": patient(p.trim_start_matches("/admin/patients/")), "appointments": [] }),
        ("GET", "/admin/document-templates") => json!([{ "type": "atestado", "content": "Atesto que {patient_name}" }]),
        ("PUT", p) if p.starts_with("/admin/document-templates/") => json!({ "message": "updated" }),
        ("POST", "/admin/documents/generate") =>
            json!({ "template_type": body["template_type"], "content": "Atesto que Maria Souza" }),
        _ => return HttpResponse::NotFound().json(json!({ "detail": "Not Found" })),
    };
    HttpResponse::Ok().json(reply)
}

/// Serves canned backend responses on a free local port; returns the
/// backend URL without the `/api` prefix.
pub async fn mock_backend() -> String {
    let server = HttpServer::new(|| App::new().default_service(web::to(backend)))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}")
}
