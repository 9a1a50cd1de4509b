pub mod auth;
pub mod capture;
pub mod credentials;
pub mod phase;
pub mod settings;
pub mod verifier;

use std::sync::Arc;

use auth::{Authenticator, StaticAuthenticator};
use credentials::CredentialStore;
use phase::{
    commands::{
        cancel_capture, confirm_capture, freeze_frame, get_phase_state, request_verification,
        reset_session, retake_frame, retry_verification, submit_goal,
    },
    PhaseController,
};
use settings::SettingsStore;
use tauri::{Manager, State};
use verifier::GeminiVerifier;

pub(crate) struct AppState {
    pub(crate) phase: PhaseController,
    pub(crate) credentials: CredentialStore,
    pub(crate) auth: Arc<dyn Authenticator>,
}

#[tauri::command]
fn login(username: String, password: String, state: State<AppState>) -> Result<bool, String> {
    Ok(state.auth.authenticate(&username, &password))
}

#[tauri::command]
fn has_api_key(state: State<AppState>) -> Result<bool, String> {
    Ok(state.credentials.has())
}

#[tauri::command]
fn set_api_key(api_key: String, state: State<AppState>) -> Result<(), String> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err("API Key cannot be empty.".to_string());
    }
    state
        .credentials
        .set(api_key.to_string())
        .map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Goal Lock starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings = Arc::new(SettingsStore::new(settings_path)?);
                let credentials = CredentialStore::new(settings);

                let verifier = GeminiVerifier::new(credentials.clone());
                let phase_controller = PhaseController::new(app.handle().clone(), verifier);

                app.manage(AppState {
                    phase: phase_controller,
                    credentials,
                    auth: Arc::new(StaticAuthenticator::default()),
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            login,
            has_api_key,
            set_api_key,
            get_phase_state,
            submit_goal,
            freeze_frame,
            retake_frame,
            confirm_capture,
            cancel_capture,
            request_verification,
            retry_verification,
            reset_session,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
