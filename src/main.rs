// Companion service for the clinic's patient app: keeps the session with the
// clinic backend, schedules local appointment reminders and exposes a small
// control API for the host shell.
mod admin;
mod api;
mod booking;
mod delivery;
mod documents;
mod error;
mod finance;
mod formatting;
mod models;
mod notifier;
mod patients;
mod realtime;
mod reminders;
mod routes;
mod session;
#[cfg(test)]
mod testing;
mod timing;
mod types;
mod util;

use actix_web::{HttpResponse, HttpServer, App, web::{self, Data}, error::InternalError};
use dotenv::dotenv;
use log::{info, error};
use std::{sync::Arc, process::exit, env, path::PathBuf};
use tokio::{sync::RwLock, time::Duration};

use util::{HOST, PORT, VAR_BACKEND_URL, VAR_DELIVERY_URL, VAR_DOCUMENTS_DIR, VAR_PLATFORM, VAR_SESSION_PATH, VAR_WS_URL};
use api::ApiClient;
use delivery::DeliveryTarget;
use notifier::{detect_sink, Platform};
use realtime::{realtime_listener_loop, RealtimeState};
use reminders::{reminder_refresh_loop, AppStateTracker, ReminderScheduler, Trigger};
use routes::DocumentsDir;
use session::{Session, TokenStore};

pub const LOG_CONFIG_PATH: &str = "log4rs.yaml";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    let check = util::check_environment_vars();
    if check.is_err() {
        eprintln!("Missing environment variable");
        eprintln!("Required environment variables: {VAR_BACKEND_URL}");
        exit(1)
    }
    util::init_logging();

    let backend_url = env::var(VAR_BACKEND_URL).unwrap_or_default();
    let session_path = util::optional_var(VAR_SESSION_PATH).unwrap_or(String::from(util::DEFAULT_SESSION_PATH));
    let session = Arc::new(RwLock::new(Session::load(TokenStore::new(session_path))));

    let api = Arc::new(ApiClient::new(&backend_url, Arc::clone(&session)));
    info!("Backend: {}", backend_url);

    let platform = Platform::from_name(&util::optional_var(VAR_PLATFORM).unwrap_or_default());
    let delivery = util::optional_var(VAR_DELIVERY_URL).map(DeliveryTarget::new);
    let sink = detect_sink(platform, delivery);
    let scheduler = Arc::new(ReminderScheduler::new(api.clone(), Arc::clone(&session), sink));

    let interval_minutes = util::reminder_interval_minutes();
    info!("Platform {:?}, reminder refresh every {} minutes", platform, interval_minutes);

    let initial = Arc::clone(&scheduler);
    tokio::spawn(async move { initial.run_pass(Trigger::Initial).await });
    let refresh_loop_handle = tokio::spawn(reminder_refresh_loop(
        Arc::clone(&scheduler),
        Duration::from_secs(interval_minutes * 60),
    ));

    let realtime_state = Arc::new(RwLock::new(RealtimeState::default()));
    if let Some(ws_url) = util::optional_var(VAR_WS_URL) {
        tokio::spawn(realtime_listener_loop(ws_url, Arc::clone(&realtime_state), Arc::clone(&scheduler)));
    }

    let api_data = Data::new(api);
    let scheduler_data = Data::new(scheduler);
    let tracker_data = Data::new(Arc::new(RwLock::new(AppStateTracker::new())));
    let realtime_data = Data::new(realtime_state);
    let documents_dir = util::optional_var(VAR_DOCUMENTS_DIR).unwrap_or(String::from(util::DEFAULT_DOCUMENTS_DIR));
    let documents_data = Data::new(DocumentsDir(PathBuf::from(documents_dir)));

    let host = env::var(HOST).unwrap_or(String::from("127.0.0.1"));
    let port = env::var(PORT).unwrap_or(String::from("9898"));

    let server_handle = HttpServer::new(move || {
        let json_cfg = web::JsonConfig::default()
            .error_handler(|err, _req| {
                error!("Json config error: {}", err);
                InternalError::from_response(err, HttpResponse::Conflict().into()).into()
            });
        App::new()
            .app_data(Data::clone(&api_data))
            .app_data(Data::clone(&scheduler_data))
            .app_data(Data::clone(&tracker_data))
            .app_data(Data::clone(&realtime_data))
            .app_data(Data::clone(&documents_data))
            .app_data(json_cfg)
            .configure(routes::configure)
            .configure(booking::configure)
            .configure(admin::configure)
    })
        .bind(format!("{}:{}", host, port))?
        .run();

    tokio::select! {
        _ = server_handle => {}
        _ = refresh_loop_handle => {},
    }
    Ok(())
}
