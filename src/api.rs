//! Typed client for the clinic backend.
//!
//! Every request carries the session's bearer token when there is one.
//! Responses are decoded into the explicit types in `models`; a body that
//! does not match is rejected as `ApiError::Decode`.

use log::debug;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::models::*;
use crate::types::SharedSession;

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SharedSession,
}

impl ApiClient {
    pub fn new(backend_url: &str, session: SharedSession) -> ApiClient {
        ApiClient {
            client: reqwest::Client::new(),
            base_url: api_base_url(backend_url),
            session,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match self.session.read().await.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let res = builder.send().await?;
        let status = res.status();
        let body = res.text().await?;
        debug!("api:: response status={} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), detail: error_detail(&body) });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path).await;
        self.send(builder).await
    }

    async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path).await.query(query);
        self.send(builder).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path).await.json(body);
        self.send(builder).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let builder = self.request(Method::PUT, path).await.json(body);
        self.send(builder).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        let builder = self.request(Method::DELETE, path).await;
        self.send(builder).await
    }

    // Patient authentication

    pub async fn register(&self, data: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post("/auth/register", data).await
    }

    pub async fn login(&self, data: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post("/auth/login", data).await
    }

    pub async fn get_me(&self) -> Result<User, ApiError> {
        self.require_session().await?;
        self.get("/auth/me").await
    }

    // Catalog

    pub async fn get_units(&self) -> Result<Vec<Unit>, ApiError> {
        self.get("/units").await
    }

    pub async fn get_services(&self) -> Result<Vec<Service>, ApiError> {
        self.get("/services").await
    }

    pub async fn get_doctors(&self, unit_id: Option<&str>) -> Result<Vec<Doctor>, ApiError> {
        match unit_id {
            Some(unit_id) => self.get_with("/doctors", &[("unit_id", unit_id)]).await,
            None => self.get("/doctors").await,
        }
    }

    pub async fn get_doctor(&self, id: &str) -> Result<Doctor, ApiError> {
        self.get(&format!("/doctors/{id}")).await
    }

    // Patient appointments

    pub async fn create_appointment(&self, data: &NewAppointment) -> Result<Appointment, ApiError> {
        self.require_session().await?;
        self.post("/appointments", data).await
    }

    pub async fn get_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.require_session().await?;
        self.get("/appointments").await
    }

    pub async fn cancel_appointment(&self, id: &str) -> Result<Value, ApiError> {
        self.require_session().await?;
        self.delete(&format!("/appointments/{id}")).await
    }

    pub async fn get_booked_slots(&self, doctor_id: &str, date: &str) -> Result<BookedSlots, ApiError> {
        self.get_with("/appointments/booked-slots", &[("doctor_id", doctor_id), ("date", date)]).await
    }

    pub async fn get_reminders(&self) -> Result<RemindersResponse, ApiError> {
        self.require_session().await?;
        self.get("/appointments/reminders").await
    }

    // Administration

    pub async fn admin_login(&self, data: &AdminLoginRequest) -> Result<AuthResponse, ApiError> {
        self.post("/admin/auth/login", data).await
    }

    pub async fn get_staff(&self) -> Result<Vec<StaffMember>, ApiError> {
        self.get("/admin/staff").await
    }

    pub async fn create_staff(&self, data: &Value) -> Result<StaffMember, ApiError> {
        self.post("/admin/staff", data).await
    }

    pub async fn update_staff(&self, id: &str, data: &Value) -> Result<StaffMember, ApiError> {
        self.put(&format!("/admin/staff/{id}"), data).await
    }

    pub async fn delete_staff(&self, id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/staff/{id}")).await
    }

    pub async fn create_unit(&self, data: &Value) -> Result<Unit, ApiError> {
        self.post("/admin/units", data).await
    }

    pub async fn update_unit(&self, id: &str, data: &Value) -> Result<Unit, ApiError> {
        self.put(&format!("/admin/units/{id}"), data).await
    }

    pub async fn delete_unit(&self, id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/units/{id}")).await
    }

    pub async fn admin_get_services(&self) -> Result<Vec<Service>, ApiError> {
        self.get("/admin/services").await
    }

    pub async fn create_service(&self, data: &Value) -> Result<Service, ApiError> {
        self.post("/admin/services", data).await
    }

    pub async fn update_service(&self, id: &str, data: &Value) -> Result<Service, ApiError> {
        self.put(&format!("/admin/services/{id}"), data).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/services/{id}")).await
    }

    pub async fn admin_get_doctors(&self) -> Result<Vec<Doctor>, ApiError> {
        self.get("/admin/doctors").await
    }

    pub async fn create_doctor(&self, data: &Value) -> Result<Doctor, ApiError> {
        self.post("/admin/doctors", data).await
    }

    pub async fn update_doctor(&self, id: &str, data: &Value) -> Result<Doctor, ApiError> {
        self.put(&format!("/admin/doctors/{id}"), data).await
    }

    pub async fn delete_doctor(&self, id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/doctors/{id}")).await
    }

    pub async fn admin_get_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, ApiError> {
        self.get_with("/admin/appointments", filter).await
    }

    pub async fn update_appointment(&self, id: &str, update: &AppointmentUpdate) -> Result<Value, ApiError> {
        self.put(&format!("/admin/appointments/{id}"), update).await
    }

    pub async fn get_financial_summary(&self, month: u32, year: i32, unit_id: Option<&str>) -> Result<FinancialSummary, ApiError> {
        self.get_with("/admin/financial/summary", &summary_query(month, year, unit_id)).await
    }

    pub async fn get_financial_daily(&self, date: &str) -> Result<DailyFinancial, ApiError> {
        self.get_with("/admin/financial/daily", &[("date", date)]).await
    }

    pub async fn get_inventory(&self) -> Result<Vec<InventoryItem>, ApiError> {
        self.get("/admin/inventory").await
    }

    pub async fn create_inventory_item(&self, data: &Value) -> Result<InventoryItem, ApiError> {
        self.post("/admin/inventory", data).await
    }

    pub async fn update_inventory_item(&self, id: &str, data: &Value) -> Result<InventoryItem, ApiError> {
        self.put(&format!("/admin/inventory/{id}"), data).await
    }

    pub async fn add_inventory_movement(&self, movement: &InventoryMovement) -> Result<Value, ApiError> {
        self.post("/admin/inventory/movement", movement).await
    }

    pub async fn get_inventory_movements(&self, item_id: Option<&str>) -> Result<Vec<InventoryMovement>, ApiError> {
        match item_id {
            Some(item_id) => self.get_with("/admin/inventory/movements", &[("item_id", item_id)]).await,
            None => self.get("/admin/inventory/movements").await,
        }
    }

    pub async fn get_patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.get("/admin/patients").await
    }

    pub async fn get_patient(&self, id: &str) -> Result<PatientDetails, ApiError> {
        self.get(&format!("/admin/patients/{id}")).await
    }

    pub async fn update_patient(&self, id: &str, data: &Value) -> Result<Value, ApiError> {
        self.put(&format!("/admin/patients/{id}"), data).await
    }

    pub async fn get_document_templates(&self) -> Result<Vec<DocumentTemplate>, ApiError> {
        self.get("/admin/document-templates").await
    }

    pub async fn update_document_template(&self, template_type: &str, content: &str) -> Result<Value, ApiError> {
        self.put(&format!("/admin/document-templates/{template_type}"), &serde_json::json!({ "content": content })).await
    }

    pub async fn generate_document(&self, request: &GenerateDocumentRequest) -> Result<GeneratedDocument, ApiError> {
        self.post("/admin/documents/generate", request).await
    }

    pub async fn generate_document_pdf(&self, request: &GenerateDocumentRequest) -> Result<GeneratedPdf, ApiError> {
        self.post("/admin/documents/generate-pdf", request).await
    }

    async fn require_session(&self) -> Result<(), ApiError> {
        if self.session.read().await.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::Unauthenticated)
        }
    }
}

fn api_base_url(backend_url: &str) -> String {
    format!("{}/api", backend_url.trim_end_matches('/'))
}

fn summary_query(month: u32, year: i32, unit_id: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("month", month.to_string()), ("year", year.to_string())];
    if let Some(unit_id) = unit_id.filter(|u| !u.is_empty()) {
        query.push(("unit_id", unit_id.to_string()));
    }
    query
}

/// Pulls the backend's `detail` message out of an error body, falling back
/// to the raw body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(ErrorDetail { detail: Value::String(detail) }) => detail,
        Ok(ErrorDetail { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
