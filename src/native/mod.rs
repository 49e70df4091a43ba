/// Desktop implementations of the platform capabilities
///
/// - Folder-backed and synthetic cameras (camera.rs)
/// - Configured position and permission state (location.rs)
/// - Save dialog / downloads folder export and system viewer (share.rs)
///
/// Storage and network adapters live next to their traits.

pub mod camera;
pub mod location;
pub mod share;

use crate::config::AppConfig;
use crate::platform::{Capabilities, PlatformFamily};

/// What the desktop build offers; computed once at startup
pub fn desktop_capabilities(config: &AppConfig) -> Capabilities {
    Capabilities {
        share_files: false,
        share: false,
        permission_introspection: config.location.permission_introspection,
        geolocation: true,
        family: PlatformFamily::Desktop,
    }
}
