/// Platform capability seams
///
/// Every device feature the application needs is a trait here:
/// - Camera devices and live streams (camera.rs)
/// - One-shot and continuous geolocation (geolocation.rs)
/// - Permission introspection (permissions.rs)
/// - Key-value storage (storage.rs)
/// - Sharing, saving and viewing files (share.rs)
/// - Network fetches (network.rs)
///
/// Optional features are answered once per session by [`Capabilities`].

pub mod camera;
pub mod geolocation;
pub mod permissions;
pub mod storage;
pub mod share;
pub mod network;

/// Browser families that silently ignore a save-as download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformFamily {
    #[default]
    Desktop,
    /// iPhone / iPad / iPod browsers
    AppleMobile,
    Other,
}

impl PlatformFamily {
    /// Classify a user agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        if ["iPhone", "iPad", "iPod"]
            .iter()
            .any(|device| user_agent.contains(device))
        {
            PlatformFamily::AppleMobile
        } else if user_agent.is_empty() {
            PlatformFamily::Desktop
        } else {
            PlatformFamily::Other
        }
    }

    pub fn ignores_download(&self) -> bool {
        matches!(self, PlatformFamily::AppleMobile)
    }
}

/// Which optional operations this platform offers. Decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Share API accepts file payloads
    pub share_files: bool,
    /// Share API exists (links/text at least)
    pub share: bool,
    /// Permission states can be queried and observed
    pub permission_introspection: bool,
    /// Geolocation is available at all
    pub geolocation: bool,
    pub family: PlatformFamily,
}

impl Capabilities {
    pub fn ignores_download(&self) -> bool {
        self.family.ignores_download()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_family() {
        let ios = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Safari/604.1";
        assert_eq!(PlatformFamily::from_user_agent(ios), PlatformFamily::AppleMobile);
        assert!(PlatformFamily::from_user_agent("Mozilla/5.0 (iPad; ...)").ignores_download());

        let android = "Mozilla/5.0 (Linux; Android 14) Chrome/120.0";
        assert_eq!(PlatformFamily::from_user_agent(android), PlatformFamily::Other);
        assert!(!PlatformFamily::from_user_agent(android).ignores_download());
        assert_eq!(PlatformFamily::from_user_agent(""), PlatformFamily::Desktop);
    }
}
