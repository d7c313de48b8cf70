use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// Authentication

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub cpf: String,
    pub birth_date: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub cpf: String,
    pub birth_date: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

// Catalog

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Unit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub cro: Option<String>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub available_days: Vec<String>,
}

// Appointments

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Agendado,
    Concluido,
    Cancelado,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Appointment {
    pub id: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_cpf: Option<String>,
    #[serde(default)]
    pub service_price: Option<f64>,
    #[serde(default)]
    pub paid_value: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewAppointment {
    pub unit_id: String,
    pub service_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AppointmentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AppointmentUpdate {
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_value: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BookedSlots {
    #[serde(default)]
    pub booked_slots: Vec<String>,
}

/// Upcoming appointment, denormalized for notification texts.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Reminder {
    pub id: String,
    pub date: String,
    pub time: String,
    pub doctor_name: String,
    pub service_name: String,
    pub unit_name: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RemindersResponse {
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

// Administration

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub min_quantity: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entrada,
    Saida,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InventoryMovement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub item_id: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub cpf: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub associate: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PatientDetails {
    pub patient: Patient,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

// Finance

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FinancialAppointment {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub paid_value: Option<f64>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ClinicBreakdown {
    pub unit_id: String,
    pub unit_name: String,
    pub total_revenue: f64,
    pub total_appointments: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct FinancialSummary {
    pub total_revenue: f64,
    pub total_appointments: u32,
    #[serde(default)]
    pub average_ticket: Option<f64>,
    #[serde(default)]
    pub clinic_breakdown: Vec<ClinicBreakdown>,
    #[serde(default)]
    pub appointments: Vec<FinancialAppointment>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DailyFinancial {
    pub date: String,
    pub total_revenue: f64,
    #[serde(default)]
    pub appointments: Vec<FinancialAppointment>,
}

// Documents

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DocumentTemplate {
    #[serde(rename = "type")]
    pub template_type: String,
    #[serde(default)]
    pub name: Option<String>,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerateDocumentRequest {
    pub template_type: String,
    pub patient_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub custom_fields: HashMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeneratedDocument {
    pub template_type: String,
    pub content: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GeneratedPdf {
    pub pdf_base64: String,
    pub filename: String,
}

// Control surface payloads

#[derive(Deserialize, Clone, Debug)]
pub struct FinanceQuery {
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub unit_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PatientQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct UnitQuery {
    #[serde(default)]
    pub unit_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SlotsQuery {
    pub doctor_id: String,
    pub date: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct MovementQuery {
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TemplateContent {
    pub content: String,
}

/// Error body shape used by the backend.
#[derive(Deserialize, Clone, Debug)]
pub struct ErrorDetail {
    pub detail: Value,
}
