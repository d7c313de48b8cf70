use actix_web::{Responder, HttpResponse, post, get, delete, web::{self}};
use log::{info, debug, error};
use serde::Serialize;
use serde_json::json;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::documents::{download_pdf, prepare_request};
use crate::error::{ApiError, DocumentError, ValidationError};
use crate::finance::SummaryView;
use crate::formatting::{validate_birth_date, validate_cpf};
use crate::models::{AdminLoginRequest, AuthResponse, FinanceQuery, GenerateDocumentRequest, LoginRequest, PatientQuery, RegisterRequest};
use crate::patients::filter_patients;
use crate::realtime::SharedRealtimeState;
use crate::reminders::{AppState, AppStateTracker, ReminderScheduler, Trigger};

/// Directory generated PDFs are written to.
#[derive(Clone, Debug)]
pub struct DocumentsDir(pub PathBuf);

pub fn validation_response(e: &impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "detail": e.to_string() }))
}

pub fn api_error_response(e: &ApiError) -> HttpResponse {
    error!("routes:: backend call failed: {}", e);
    if e.is_unauthorized() {
        return HttpResponse::Unauthorized().json(json!({ "detail": e.to_string() }));
    }
    HttpResponse::BadGateway().json(json!({ "detail": e.to_string() }))
}

/// Backend result as a control-surface response.
pub fn respond<T: Serialize>(result: Result<T, ApiError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => api_error_response(&e),
    }
}

async fn start_session(response: AuthResponse,
    api: &ApiClient,
    scheduler: &Arc<ReminderScheduler>) -> HttpResponse {

    let user = match api.session().write().await.establish(response) {
        Ok(user) => user.clone(),
        Err(e) => {
            error!("routes:: failed to persist session: {}", e);
            return HttpResponse::InternalServerError().json(json!({ "detail": e.to_string() }));
        }
    };
    let scheduler = Arc::clone(scheduler);
    tokio::spawn(async move { scheduler.run_pass(Trigger::Initial).await });
    HttpResponse::Ok().json(user)
}

#[get("/health")]
pub async fn health() -> impl Responder {
    info!("Health check");
    HttpResponse::Ok()
}

#[post("/session/login")]
async fn login(payload: web::Json<LoginRequest>,
    api: web::Data<Arc<ApiClient>>,
    scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {

    let request = match (validate_cpf(&payload.cpf), validate_birth_date(&payload.birth_date)) {
        (Ok(cpf), Ok(birth_date)) => LoginRequest { cpf, birth_date },
        (Err(e), _) | (_, Err(e)) => return validation_response(&e),
    };
    match api.login(&request).await {
        Ok(response) => start_session(response, &api, &scheduler).await,
        Err(e) => api_error_response(&e),
    }
}

#[post("/session/register")]
async fn register(payload: web::Json<RegisterRequest>,
    api: web::Data<Arc<ApiClient>>,
    scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {

    if payload.name.trim().is_empty() {
        return validation_response(&ValidationError::MissingField("name"));
    }
    let request = match (validate_cpf(&payload.cpf), validate_birth_date(&payload.birth_date)) {
        (Ok(cpf), Ok(birth_date)) => RegisterRequest { name: payload.name.trim().to_string(), cpf, birth_date },
        (Err(e), _) | (_, Err(e)) => return validation_response(&e),
    };
    match api.register(&request).await {
        Ok(response) => start_session(response, &api, &scheduler).await,
        Err(e) => api_error_response(&e),
    }
}

#[post("/session/admin-login")]
async fn admin_login(payload: web::Json<AdminLoginRequest>,
    api: web::Data<Arc<ApiClient>>,
    scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {

    if payload.email.trim().is_empty() {
        return validation_response(&ValidationError::MissingField("email"));
    }
    if payload.password.is_empty() {
        return validation_response(&ValidationError::MissingField("password"));
    }
    match api.admin_login(&payload).await {
        Ok(response) => start_session(response, &api, &scheduler).await,
        Err(e) => api_error_response(&e),
    }
}

#[get("/session")]
async fn current_user(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    match api.session().read().await.user() {
        Some(user) => HttpResponse::Ok().json(user),
        None => HttpResponse::Unauthorized().json(json!({ "detail": ApiError::Unauthenticated.to_string() })),
    }
}

#[get("/session/me")]
async fn backend_user(api: web::Data<Arc<ApiClient>>) -> impl Responder {
    respond(api.get_me().await)
}

#[post("/session/logout")]
async fn logout(api: web::Data<Arc<ApiClient>>,
    scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {

    let result = api.session().write().await.clear();
    scheduler.clear().await;
    match result {
        Ok(_) => HttpResponse::Ok().finish(),
        Err(e) => {
            error!("routes:: failed to remove session file: {}", e);
            HttpResponse::InternalServerError().json(json!({ "detail": e.to_string() }))
        }
    }
}

#[post("/app-state/{state}")]
async fn app_state(state: web::Path<String>,
    tracker: web::Data<Arc<RwLock<AppStateTracker>>>,
    scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {

    let Some(next) = AppState::from_name(&state) else {
        return HttpResponse::BadRequest().json(json!({ "detail": format!("unknown app state {:?}", state.as_str()) }));
    };
    let foreground = tracker.write().await.transition(next);
    debug!("app_state:: {:?} (foreground transition: {})", next, foreground);

    if foreground {
        let scheduler = Arc::clone(scheduler.get_ref());
        tokio::spawn(async move { scheduler.run_pass(Trigger::Foreground).await });
    }
    HttpResponse::Ok().json(json!({ "state": state.to_ascii_lowercase(), "foreground": foreground }))
}

#[get("/app-state")]
async fn current_app_state(tracker: web::Data<Arc<RwLock<AppStateTracker>>>) -> impl Responder {
    let state = format!("{:?}", tracker.read().await.current()).to_ascii_lowercase();
    HttpResponse::Ok().json(json!({ "state": state }))
}

#[post("/reminders/refresh")]
async fn refresh_reminders(scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {
    // The pass runs on its own task so a client that disconnects does not
    // abandon it.
    let scheduler = Arc::clone(scheduler.get_ref());
    match tokio::spawn(async move { scheduler.run_pass(Trigger::Manual).await }).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({ "outcome": outcome })),
        Err(e) => {
            error!("routes:: reminder pass task failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/notifications")]
async fn notifications(scheduler: web::Data<Arc<ReminderScheduler>>) -> impl Responder {
    match scheduler.sink() {
        Some(sink) => HttpResponse::Ok().json(sink.scheduled().await),
        None => HttpResponse::Ok().json(json!([])),
    }
}

#[get("/finance/summary")]
async fn finance_summary(query: web::Query<FinanceQuery>,
    api: web::Data<Arc<ApiClient>>) -> impl Responder {

    if !(1..=12).contains(&query.month) {
        return HttpResponse::BadRequest().json(json!({ "detail": "month must be between 1 and 12" }));
    }
    let unit_id = query.unit_id.as_deref().filter(|u| !u.is_empty());
    match api.get_financial_summary(query.month, query.year, unit_id).await {
        Ok(summary) => HttpResponse::Ok().json(SummaryView::build(&summary, query.month, query.year, unit_id)),
        Err(e) => api_error_response(&e),
    }
}

#[get("/patients")]
async fn search_patients(query: web::Query<PatientQuery>,
    api: web::Data<Arc<ApiClient>>) -> impl Responder {

    match api.get_patients().await {
        Ok(patients) => HttpResponse::Ok().json(filter_patients(&patients, &query.search)),
        Err(e) => api_error_response(&e),
    }
}

#[post("/documents/pdf")]
async fn generate_pdf(payload: web::Json<GenerateDocumentRequest>,
    api: web::Data<Arc<ApiClient>>,
    dir: web::Data<DocumentsDir>) -> impl Responder {

    let request = match prepare_request(&payload.template_type, &payload.patient_id, &payload.doctor_id, &payload.custom_fields) {
        Ok(request) => request,
        Err(e) => return validation_response(&e),
    };
    match download_pdf(&api, &request, &dir.0).await {
        Ok(path) => HttpResponse::Ok().json(json!({ "path": path })),
        Err(DocumentError::Validation(e)) => validation_response(&e),
        Err(DocumentError::Api(e)) => api_error_response(&e),
        Err(e) => {
            error!("routes:: document download failed: {}", e);
            HttpResponse::BadGateway().json(json!({ "detail": e.to_string() }))
        }
    }
}

#[get("/realtime/status")]
async fn realtime_status(state: web::Data<SharedRealtimeState>) -> impl Responder {
    HttpResponse::Ok().json(&*state.read().await)
}

#[delete("/realtime/stale")]
async fn clear_stale(state: web::Data<SharedRealtimeState>) -> impl Responder {
    state.write().await.stale.clear();
    HttpResponse::Ok().finish()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(login)
        .service(register)
        .service(admin_login)
        .service(current_user)
        .service(backend_user)
        .service(logout)
        .service(current_app_state)
        .service(app_state)
        .service(refresh_reminders)
        .service(notifications)
        .service(finance_summary)
        .service(search_patients)
        .service(generate_pdf)
        .service(realtime_status)
        .service(clear_stale);
}
