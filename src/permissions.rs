/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (the OS asks when the camera is opened)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl PermissionStatus {
    /// Whether opening a camera may be attempted
    pub fn allows_request(&self) -> bool {
        matches!(self, PermissionStatus::Granted | PermissionStatus::NotDetermined)
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Check camera permission status
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check camera permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "linux")]
    {
        check_permission_linux()
    }

    #[cfg(not(target_os = "linux"))]
    {
        // Windows and macOS prompt (or refuse) when the device is opened
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Camera access is decided by the OS when the camera is opened".to_string(),
            can_request: true,
        }
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux() -> PermissionInfo {
    use std::fs::OpenOptions;
    use std::path::Path;

    let probes: Vec<(String, std::io::Result<()>)> = (0..10)
        .map(|i| format!("/dev/video{}", i))
        .filter(|path| Path::new(path).exists())
        .map(|path| {
            let opened = OpenOptions::new().read(true).open(&path).map(|_| ());
            (path, opened)
        })
        .collect();

    summarize_probes(&probes)
}

/// Access is granted when any node opens or fails for a reason other than
/// permissions. Denied only when every node refuses.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn summarize_probes(probes: &[(String, std::io::Result<()>)]) -> PermissionInfo {
    if probes.is_empty() {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No video devices found at /dev/video*".to_string(),
            can_request: false,
        };
    }

    let usable: Vec<&str> = probes
        .iter()
        .filter(|(_, result)| match result {
            Ok(()) => true,
            // Busy or transiently unavailable devices still grant access
            Err(e) => e.kind() != std::io::ErrorKind::PermissionDenied,
        })
        .map(|(path, _)| path.as_str())
        .collect();

    match usable.first() {
        Some(first) => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!(
                "Camera access granted ({} of {} devices usable, first {})",
                usable.len(),
                probes.len(),
                first
            ),
            can_request: false,
        },
        None => PermissionInfo {
            status: PermissionStatus::Denied,
            message: format!(
                "No camera device is readable ({} checked) - run: sudo usermod -a -G video $USER",
                probes.len()
            ),
            can_request: true,
        },
    }
}
