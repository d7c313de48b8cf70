//! Patient-facing control routes: the booking catalog and the patient's own
//! appointments. Booking or cancelling changes the reminder set, so both
//! kick off a reminder pass.

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use log::info;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::error::ValidationError;
use crate::models::{NewAppointment, SlotsQuery, UnitQuery};
use crate::reminders::{parse_appointment_datetime, ReminderScheduler, Trigger};
use crate::routes::{api_error_response, respond, validation_response};

fn spawn_pass(scheduler: &Arc<ReminderScheduler>) {
    let scheduler = Arc::clone(scheduler);
    tokio::spawn(async move { scheduler.run_pass(Trigger::Booking).await });
}

fn check_booking(appointment: &NewAppointment) -> Result<(), HttpResponse> {
    let required = [
        ("unit_id", &appointment.unit_id),
        ("service_id", &appointment.service_id),
        ("doctor_id", &appointment.doctor_id),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(validation_response(&ValidationError::MissingField(*field)));
    }
    parse_appointment_datetime(&appointment.date, &appointment.time)
        .map(|_| ())
        .map_err(|e| validation_response(&e))
}

#[get("/catalog/units")]
async fn units(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_units().await)
}

#[get("/catalog/services")]
async fn services(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_services().await)
}

#[get("/catalog/doctors")]
async fn doctors(query: web::Query<UnitQuery>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    let unit_id = query.unit_id.as_deref().filter(|u| !u.is_empty());
    respond(api.get_doctors(unit_id).await)
}

#[get("/catalog/doctors/{id}")]
async fn doctor(id: web::Path<String>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_doctor(&id).await)
}

#[get("/appointments")]
async fn appointments(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_appointments().await)
}

#[get("/appointments/booked-slots")]
async fn booked_slots(query: web::Query<SlotsQuery>, api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_booked_slots(&query.doctor_id, &query.date).await)
}

#[post("/appointments")]
async fn book(payload: web::Json<NewAppointment>,
    api: web::Data<Arc<ApiClient>>,
    scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {

    if let Err(response) = check_booking(&payload) {
        return response;
    }
    match api.create_appointment(&payload).await {
        Ok(appointment) => {
            info!("booking:: booked {} on {} {}", appointment.id, appointment.date, appointment.time);
            spawn_pass(scheduler.get_ref());
            HttpResponse::Ok().json(appointment)
        }
        Err(e) => api_error_response(&e),
    }
}

#[delete("/appointments/{id}")]
async fn cancel(id: web::Path<String>,
    api: web::Data<Arc<ApiClient>>,
    scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {

    match api.cancel_appointment(&id).await {
        Ok(body) => {
            info!("booking:: cancelled {}", id.as_str());
            spawn_pass(scheduler.get_ref());
            HttpResponse::Ok().json(body)
        }
        Err(e) => api_error_response(&e),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(units)
        .service(services)
        .service(doctors)
        .service(doctor)
        .service(booked_slots)
        .service(appointments)
        .service(book)
        .service(cancel);
}
