use log::warn;
use tauri::{AppHandle, plugin::PermissionState};
use tauri_plugin_geolocation::{GeolocationExt, PermissionStatus, PermissionType};

use whereabouts_logic::{PermissionGate, PermissionSnapshot};

/// [PermissionGate] backed by the OS runtime permission API via the
/// geolocation plugin. Every call goes to the OS, nothing is cached here.
pub struct TauriGate(AppHandle);

impl TauriGate {
    pub fn new(app: AppHandle) -> Self {
        Self(app)
    }
}

fn granted(state: PermissionState) -> bool {
    matches!(state, PermissionState::Granted)
}

fn snapshot(status: PermissionStatus) -> PermissionSnapshot {
    let rationale_required = matches!(status.location, PermissionState::PromptWithRationale)
        || matches!(status.coarse_location, PermissionState::PromptWithRationale);

    PermissionSnapshot {
        fine: granted(status.location),
        coarse: granted(status.coarse_location),
        rationale_required,
    }
}

impl PermissionGate for TauriGate {
    fn check(&self) -> PermissionSnapshot {
        match self.0.geolocation().check_permissions() {
            Ok(status) => snapshot(status),
            Err(why) => {
                warn!("Failed to check location permissions: {why:?}");
                PermissionSnapshot::denied()
            }
        }
    }

    fn request(&self) -> PermissionSnapshot {
        let wanted = vec![PermissionType::Location, PermissionType::CoarseLocation];
        match self.0.geolocation().request_permissions(Some(wanted)) {
            Ok(status) => snapshot(status),
            Err(why) => {
                warn!("Failed to request location permissions: {why:?}");
                PermissionSnapshot::denied()
            }
        }
    }
}
