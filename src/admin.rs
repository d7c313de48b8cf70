//! Admin control routes. Each one calls the matching `/admin` backend
//! endpoint with the admin session's token.

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::Value;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::documents::{prepare_request, TEMPLATES};
use crate::models::{AppointmentFilter, AppointmentUpdate, DateQuery, GenerateDocumentRequest, InventoryMovement, MovementQuery, TemplateContent};
use crate::routes::{respond, validation_response};

// Staff

#[get("/admin/staff")]
async fn list_staff(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_staff().await)
}

#[post("/admin/staff")]
async fn create_staff(payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.create_staff(&payload).await)
}

#[put("/admin/staff/{id}")]
async fn update_staff(id: web::Path<String>, payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.update_staff(&id, &payload).await)
}

#[delete("/admin/staff/{id}")]
async fn delete_staff(id: web::Path<String>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.delete_staff(&id).await)
}

// Units

#[get("/admin/units")]
async fn list_units(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_units().await)
}

#[post("/admin/units")]
async fn create_unit(payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.create_unit(&payload).await)
}

#[put("/admin/units/{id}")]
async fn update_unit(id: web::Path<String>, payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.update_unit(&id, &payload).await)
}

#[delete("/admin/units/{id}")]
async fn delete_unit(id: web::Path<String>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.delete_unit(&id).await)
}

// Services

#[get("/admin/services")]
async fn list_services(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.admin_get_services().await)
}

#[post("/admin/services")]
async fn create_service(payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.create_service(&payload).await)
}

#[put("/admin/services/{id}")]
async fn update_service(id: web::Path<String>, payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.update_service(&id, &payload).await)
}

#[delete("/admin/services/{id}")]
async fn delete_service(id: web::Path<String>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.delete_service(&id).await)
}

// Doctors

#[get("/admin/doctors")]
async fn list_doctors(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.admin_get_doctors().await)
}

#[post("/admin/doctors")]
async fn create_doctor(payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.create_doctor(&payload).await)
}

#[put("/admin/doctors/{id}")]
async fn update_doctor(id: web::Path<String>, payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.update_doctor(&id, &payload).await)
}

#[delete("/admin/doctors/{id}")]
async fn delete_doctor(id: web::Path<String>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.delete_doctor(&id).await)
}

// Appointments and finance

#[get("/admin/appointments")]
async fn list_appointments(filter: web::Query<AppointmentFilter>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.admin_get_appointments(&filter).await)
}

#[put("/admin/appointments/{id}")]
async fn update_appointment(id: web::Path<String>,
    payload: web::Json<AppointmentUpdate>,
    api: web::Data<Arc<ApiClient>>) -> impl Responder {

    if payload.paid_value.map_or(false, |v| v < 0.0) {
        return HttpResponse::BadRequest().json(serde_json::json!({ "detail": "paid_value must not be negative" }));
    }
    respond(api.update_appointment(&id, &payload).await)
}

#[get("/admin/finance/daily")]
async fn daily_finance(query: web::Query<DateQuery>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_financial_daily(&query.date).await)
}

// Inventory

#[get("/admin/inventory")]
async fn list_inventory(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_inventory().await)
}

#[post("/admin/inventory")]
async fn create_inventory_item(payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.create_inventory_item(&payload).await)
}

#[put("/admin/inventory/{id}")]
async fn update_inventory_item(id: web::Path<String>, payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.update_inventory_item(&id, &payload).await)
}

#[post("/admin/inventory/movement")]
async fn add_movement(payload: web::Json<InventoryMovement>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    if payload.quantity <= 0.0 {
        return HttpResponse::BadRequest().json(serde_json::json!({ "detail": "quantity must be positive" }));
    }
    respond(api.add_inventory_movement(&payload).await)
}

#[get("/admin/inventory/movements")]
async fn list_movements(query: web::Query<MovementQuery>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_inventory_movements(query.item_id.as_deref()).await)
}

// Patients

#[get("/admin/patients/{id}")]
async fn patient(id: web::Path<String>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_patient(&id).await)
}

#[put("/admin/patients/{id}")]
async fn update_patient(id: web::Path<String>, payload: web::Json<Value>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.update_patient(&id, &payload).await)
}

// Documents

#[get("/documents/kinds")]
async fn document_kinds() -> impl Responder {
    HttpResponse::Ok().json(&TEMPLATES)
}

#[get("/admin/document-templates")]
async fn document_templates(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_document_templates().await)
}

#[put("/admin/document-templates/{template_type}")]
async fn update_document_template(template_type: web::Path<String>,
    payload: web::Json<TemplateContent>,
    api: web::Data<Arc<ApiClient>>) -> impl Responder {

    respond(api.update_document_template(&template_type, &payload.content).await)
}

#[post("/admin/documents/generate")]
async fn generate_document(payload: web::Json<GenerateDocumentRequest>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    match prepare_request(&payload.template_type, &payload.patient_id, &payload.doctor_id, &payload.custom_fields) {
        Ok(request) => respond(api.generate_document(&request).await),
        Err(e) => validation_response(&e),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_staff)
        .service(create_staff)
        .service(update_staff)
        .service(delete_staff)
        .service(list_units)
        .service(create_unit)
        .service(update_unit)
        .service(delete_unit)
        .service(list_services)
        .service(create_service)
        .service(update_service)
        .service(delete_service)
        .service(list_doctors)
        .service(create_doctor)
        .service(update_doctor)
        .service(delete_doctor)
        .service(list_appointments)
        .service(update_appointment)
        .service(daily_finance)
        .service(list_inventory)
        .service(create_inventory_item)
        .service(update_inventory_item)
        .service(add_movement)
        .service(list_movements)
        .service(patient)
        .service(update_patient)
        .service(document_kinds)
        .service(document_templates)
        .service(update_document_template)
        .service(generate_document);
}
