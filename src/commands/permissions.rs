use crate::permissions::{check_permission_detailed, PermissionInfo, PermissionStatus};
use tauri::command;

/// Request camera permission
///
/// Desktop platforms have no programmatic prompt outside of opening the
/// device, so this reports what the user has to do when access is missing.
#[command]
pub async fn request_camera_permission() -> Result<PermissionInfo, String> {
    log::info!("Requesting camera permission");

    let current = check_permission_detailed();

    match current.status {
        PermissionStatus::Granted => {
            log::info!("Permission already granted");
            Ok(current)
        }
        PermissionStatus::Denied | PermissionStatus::Restricted => {
            log::warn!("Camera permission {}: {}", current.status, current.message);
            Ok(current)
        }
        PermissionStatus::NotDetermined => {
            let message = if cfg!(target_os = "windows") {
                "Please enable camera access in Windows Settings > Privacy > Camera".to_string()
            } else if cfg!(target_os = "macos") {
                "macOS will ask for camera access when the camera is started".to_string()
            } else {
                current.message.clone()
            };
            Ok(PermissionInfo {
                status: PermissionStatus::NotDetermined,
                message,
                can_request: current.can_request,
            })
        }
    }
}

/// Check camera permission status
#[command]
pub async fn check_camera_permission_status() -> Result<PermissionInfo, String> {
    log::debug!("Checking camera permission status");
    Ok(check_permission_detailed())
}
