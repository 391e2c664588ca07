use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, specta::Type)]
/// The OS permission state for the two location permissions, queried fresh on
/// every call. Never cache one of these, the user can revoke from settings at
/// any time.
pub struct PermissionSnapshot {
    /// Fine (GPS-level) location granted
    pub fine: bool,
    /// Coarse (network-level) location granted
    pub coarse: bool,
    /// The OS hints that the user denied before and an explanation may change
    /// their mind on the next prompt
    pub rationale_required: bool,
}

impl PermissionSnapshot {
    /// Location access requires BOTH permissions
    pub fn granted(&self) -> bool {
        self.fine && self.coarse
    }

    pub fn denied() -> Self {
        Self {
            fine: false,
            coarse: false,
            rationale_required: false,
        }
    }
}

pub trait PermissionGate: Send + Sync {
    /// Query the current permission state without prompting
    fn check(&self) -> PermissionSnapshot;
    /// Prompt the user (shows a system dialog), returns the state after the
    /// prompt resolves. Denial is a normal outcome, not an error.
    fn request(&self) -> PermissionSnapshot;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    /// The user said no. `rationale_required` selects which message to show,
    /// see [denial_message]
    Denied { rationale_required: bool },
}

/// Check for location access, prompting the user if it isn't granted yet.
/// Location updates must only be started after this returns
/// [PermissionOutcome::Granted], starting them unchecked is undefined on some
/// platforms.
pub fn ensure_location_access<G: PermissionGate>(gate: &G) -> PermissionOutcome {
    if gate.check().granted() {
        return PermissionOutcome::Granted;
    }

    let after = gate.request();

    if after.granted() {
        PermissionOutcome::Granted
    } else {
        PermissionOutcome::Denied {
            rationale_required: after.rationale_required,
        }
    }
}

/// The message to show the user after they deny location access. When the OS
/// wants a rationale shown we only explain, otherwise the prompt won't appear
/// again and they have to go through settings.
pub fn denial_message(rationale_required: bool) -> &'static str {
    if rationale_required {
        "Location access is required for this feature to work!"
    } else {
        "Location access is required for this feature to work! Please enable it in mobile settings"
    }
}
