mod cache;
mod location;
mod permissions;
mod state;

use log::LevelFilter;
use tauri::{AppHandle, State};
use tauri_specta::{ErrorHandlingMode, collect_commands, collect_events};
use tokio::sync::RwLock;

use whereabouts_logic::DisplayState;

use std::result::Result as StdResult;

use crate::state::{AppState, AppStateHandle, LocationUpdate};

type Result<T = (), E = String> = StdResult<T, E>;

#[tauri::command]
#[specta::specta]
/// The "Get Location" button: ensure permission (prompting if needed) and
/// start periodic location updates. Shows a denial message if the user
/// refuses.
async fn get_location(app: AppHandle, state: State<'_, AppStateHandle>) -> Result {
    AppState::request_location(app, state.inner()).await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// Get the latest fix and its address for rendering, call after receiving a
/// [LocationUpdate] event. Before tracking starts everything is `null` and
/// the screen shows "Location not available!".
async fn get_display_state(state: State<'_, AppStateHandle>) -> Result<DisplayState> {
    match state.read().await.get_tracker() {
        Ok(tracker) => Ok(tracker.ui_state().await),
        Err(_) => Ok(DisplayState::default()),
    }
}

#[tauri::command]
#[specta::specta]
/// Resolve the address for the current fix. Cached per fix, so calling this
/// on every render is fine. Returns `null` before the first fix.
async fn resolve_address(state: State<'_, AppStateHandle>) -> Result<Option<String>> {
    match state.read().await.get_tracker() {
        Ok(tracker) => Ok(tracker.resolve_address().await),
        Err(_) => Ok(None),
    }
}

#[tauri::command]
#[specta::specta]
/// Stop the location subscription, call when the screen unmounts
async fn stop_updates(app: AppHandle, state: State<'_, AppStateHandle>) -> Result {
    let mut state = state.write().await;
    state.stop_tracking(&app).await;
    Ok(())
}

pub fn mk_specta() -> tauri_specta::Builder {
    tauri_specta::Builder::<tauri::Wry>::new()
        .error_handling(ErrorHandlingMode::Throw)
        .commands(collect_commands![
            get_location,
            get_display_state,
            resolve_address,
            stop_updates,
        ])
        .events(collect_events![LocationUpdate])
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let state = RwLock::new(AppState::Idle);

    let builder = mk_specta();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(LevelFilter::Debug)
                .build(),
        )
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_geolocation::init())
        .plugin(tauri_plugin_store::Builder::default().build())
        .invoke_handler(builder.invoke_handler())
        .manage(state)
        .setup(move |app| {
            builder.mount_events(app);
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
