use tauri::AppHandle;
use tauri_plugin_store::StoreExt;

use whereabouts_logic::Coordinate;

const STORE_NAME: &str = "last_location";

/// Read the fix persisted by the previous session, if any
pub fn read_last_fix(app: &AppHandle) -> Option<Coordinate> {
    let store = app.store(STORE_NAME).expect("Couldn't Create Store");

    let fix = store
        .get("fix")
        .and_then(|v| serde_json::from_value::<Coordinate>(v).ok())
        .filter(Coordinate::in_bounds);

    store.close_resource();

    fix
}

pub fn write_last_fix(app: &AppHandle, fix: Coordinate) {
    let store = app.store(STORE_NAME).expect("Couldn't create store");

    let value = serde_json::to_value(fix).expect("Failed to serialize");
    store.set("fix", value);
}
