use std::{marker::PhantomData, sync::Arc};

use log::{error, info};
use serde::{Deserialize, Serialize};
use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_specta::Event;
use tokio::sync::RwLock;

use whereabouts_geocode::NominatimGeocoder;
use whereabouts_logic::{
    PermissionOutcome, StateUpdateSender, Tracker, UPDATE_INTERVAL, denial_message,
    ensure_location_access,
};

use crate::{
    Result,
    cache::{read_last_fix, write_last_fix},
    location::TauriLocation,
    permissions::TauriGate,
};

/// The latest fix or its resolved address has changed
#[derive(Serialize, Deserialize, Clone, Default, Debug, specta::Type, tauri_specta::Event)]
pub struct LocationUpdate;

// The event parameter must be thread-safe itself since [StateUpdateSender]
// is shared with the tracker loop
pub struct TauriStateUpdateSender<E: Clone + Default + Event + Serialize + Send + Sync>(
    AppHandle,
    PhantomData<E>,
);

impl<E: Serialize + Clone + Default + Event + Send + Sync> TauriStateUpdateSender<E> {
    fn new(app: &AppHandle) -> Self {
        Self(app.clone(), PhantomData)
    }
}

impl<E: Serialize + Clone + Default + Event + Send + Sync> StateUpdateSender
    for TauriStateUpdateSender<E>
{
    fn send_update(&self) {
        if let Err(why) = E::default().emit(&self.0) {
            error!("Error sending location update to UI: {why:?}");
        }
    }
}

pub type AppTracker =
    Tracker<TauriLocation, NominatimGeocoder, TauriStateUpdateSender<LocationUpdate>>;

pub enum AppState {
    /// No subscription running, the screen shows the persisted fix if any
    Idle,
    /// Location updates are flowing
    Tracking(Arc<AppTracker>),
}

pub type AppStateHandle = RwLock<AppState>;

fn message_dialog(app: &AppHandle, kind: MessageDialogKind, msg: &str) {
    app.dialog().message(msg).kind(kind).show(|_| {});
}

impl AppState {
    /// The "Get Location" button. Checks permission (prompting if needed) and
    /// starts the update loop on grant. On denial shows the appropriate
    /// message and stays idle. Pressing it while already tracking is a no-op,
    /// the subscription refreshes on its own.
    ///
    /// The permission prompt blocks until the user answers, so the state lock
    /// is only taken around the actual transitions, never across the prompt.
    pub async fn request_location(app: AppHandle, handle: &AppStateHandle) {
        if let AppState::Tracking(_) = &*handle.read().await {
            return;
        }

        let gate = TauriGate::new(app.clone());
        match ensure_location_access(&gate) {
            PermissionOutcome::Granted => {
                let mut state = handle.write().await;
                // Another press may have started it while the prompt was up
                if let AppState::Idle = &*state {
                    state.start_tracking(app);
                }
            }
            PermissionOutcome::Denied { rationale_required } => {
                info!("Location permission denied (rationale_required: {rationale_required})");
                message_dialog(
                    &app,
                    MessageDialogKind::Warning,
                    denial_message(rationale_required),
                );
            }
        }
    }

    fn start_tracking(&mut self, app: AppHandle) {
        let geocoder = match NominatimGeocoder::new() {
            Ok(geocoder) => geocoder,
            Err(why) => {
                error!("Failed to build geocoder client: {why:?}");
                message_dialog(
                    &app,
                    MessageDialogKind::Error,
                    "Couldn't start the address lookup service",
                );
                return;
            }
        };

        let location = TauriLocation::new(app.clone());
        let state_updates = TauriStateUpdateSender::new(&app);
        let tracker = Arc::new(AppTracker::with_initial(
            UPDATE_INTERVAL,
            location,
            geocoder,
            state_updates,
            read_last_fix(&app),
        ));
        *self = AppState::Tracking(tracker.clone());
        Self::tracker_loop(tracker);
    }

    fn tracker_loop(tracker: Arc<AppTracker>) {
        tokio::spawn(async move {
            tracker.main_loop().await;
            info!("Location updates stopped");
        });
    }

    pub fn get_tracker(&self) -> Result<Arc<AppTracker>> {
        if let AppState::Tracking(tracker) = self {
            Ok(tracker.clone())
        } else {
            Err("Location updates are not running".to_string())
        }
    }

    /// Tear down the subscription when the screen goes away, persisting the
    /// last fix for the next launch
    pub async fn stop_tracking(&mut self, app: &AppHandle) {
        if let AppState::Tracking(tracker) = self {
            let tracker = tracker.clone();
            if let Some(fix) = tracker.ui_state().await.coordinate {
                write_last_fix(app, fix);
            }
            tracker.stop();
            *self = AppState::Idle;
        }
    }
}
