use chrono::{DateTime, Utc};
use tauri::State;

use crate::{
    phase::{GoalSession, PhaseController, PhaseSnapshot},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> PhaseController {
    state.phase.clone()
}

#[tauri::command]
pub async fn get_phase_state(state: State<'_, AppState>) -> Result<PhaseSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn submit_goal(
    state: State<'_, AppState>,
    goal_text: String,
    deadline: DateTime<Utc>,
) -> Result<GoalSession, String> {
    let controller = controller_from_state(&state);
    controller
        .submit_goal(goal_text, deadline)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn freeze_frame(
    state: State<'_, AppState>,
    frame_data_url: String,
) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller
        .freeze_frame(frame_data_url)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn retake_frame(state: State<'_, AppState>) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller.retake_frame().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn confirm_capture(state: State<'_, AppState>) -> Result<GoalSession, String> {
    let controller = controller_from_state(&state);
    controller.confirm_capture().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cancel_capture(state: State<'_, AppState>) -> Result<GoalSession, String> {
    let controller = controller_from_state(&state);
    controller.cancel_capture().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn request_verification(state: State<'_, AppState>) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller
        .request_verification()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn retry_verification(state: State<'_, AppState>) -> Result<GoalSession, String> {
    let controller = controller_from_state(&state);
    controller.retry().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn reset_session(state: State<'_, AppState>) -> Result<GoalSession, String> {
    let controller = controller_from_state(&state);
    controller.reset().await.map_err(|e| e.to_string())
}
