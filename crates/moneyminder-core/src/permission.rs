//! Push-permission and exact-alarm capability gateway.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PlatformError;

/// Platform permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Undetermined,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Undetermined => "undetermined",
        };
        f.write_str(s)
    }
}

/// Result of a permission query or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatus {
    pub granted: bool,
    pub can_ask_again: bool,
    pub status: PermissionState,
}

impl PermissionStatus {
    pub fn granted() -> Self {
        Self {
            granted: true,
            can_ask_again: true,
            status: PermissionState::Granted,
        }
    }

    pub fn denied(can_ask_again: bool) -> Self {
        Self {
            granted: false,
            can_ask_again,
            status: PermissionState::Denied,
        }
    }

    pub fn undetermined() -> Self {
        Self {
            granted: false,
            can_ask_again: true,
            status: PermissionState::Undetermined,
        }
    }
}

/// Platform permission surface.
///
/// A denial is a [`PermissionStatus`], never an error; errors mean the
/// platform could not be asked at all.
pub trait PermissionGateway {
    fn get_status(&self) -> Result<PermissionStatus, PlatformError>;

    /// Prompt the user. May return immediately when the OS will not ask again.
    fn request_permission(&mut self) -> Result<PermissionStatus, PlatformError>;

    /// Open the OS settings page for notifications / exact alarms.
    fn open_platform_settings(&mut self) -> Result<(), PlatformError>;
}

/// Wrapper adding the request-if-needed and best-effort policies.
pub struct Permissions<G> {
    gateway: G,
}

impl<G: PermissionGateway> Permissions<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn status(&self) -> Result<PermissionStatus, PlatformError> {
        self.gateway.get_status()
    }

    /// Return the current status, prompting only if not granted and the OS
    /// still allows asking.
    pub fn ensure_granted(&mut self) -> Result<PermissionStatus, PlatformError> {
        let status = self.gateway.get_status()?;
        if status.granted || !status.can_ask_again {
            return Ok(status);
        }
        debug!(status = %status.status, "requesting notification permission");
        self.gateway.request_permission()
    }

    /// Open platform settings; failure is logged and swallowed.
    pub fn open_settings_best_effort(&mut self) -> bool {
        match self.gateway.open_platform_settings() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "could not open platform notification settings");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeGateway {
        status: PermissionStatus,
        grant_on_request: bool,
        requests: usize,
        settings_fail: bool,
        settings_opened: usize,
    }

    impl FakeGateway {
        fn with(status: PermissionStatus) -> Self {
            Self {
                status,
                grant_on_request: true,
                requests: 0,
                settings_fail: false,
                settings_opened: 0,
            }
        }
    }

    impl PermissionGateway for FakeGateway {
        fn get_status(&self) -> Result<PermissionStatus, PlatformError> {
            Ok(self.status)
        }

        fn request_permission(&mut self) -> Result<PermissionStatus, PlatformError> {
            self.requests += 1;
            if self.grant_on_request {
                self.status = PermissionStatus::granted();
            } else {
                self.status = PermissionStatus::denied(false);
            }
            Ok(self.status)
        }

        fn open_platform_settings(&mut self) -> Result<(), PlatformError> {
            if self.settings_fail {
                return Err(PlatformError::new("settings", "intent not resolvable"));
            }
            self.settings_opened += 1;
            Ok(())
        }
    }

    #[test]
    fn granted_does_not_prompt() {
        let mut perms = Permissions::new(FakeGateway::with(PermissionStatus::granted()));
        assert!(perms.ensure_granted().unwrap().granted);
        assert_eq!(perms.gateway().requests, 0);
    }

    #[test]
    fn undetermined_prompts_once() {
        let mut perms = Permissions::new(FakeGateway::with(PermissionStatus::undetermined()));
        assert!(perms.ensure_granted().unwrap().granted);
        assert_eq!(perms.gateway().requests, 1);
    }

    #[test]
    fn permanent_denial_is_a_status_not_an_error() {
        let mut perms = Permissions::new(FakeGateway::with(PermissionStatus::denied(false)));
        let status = perms.ensure_granted().unwrap();
        assert!(!status.granted);
        assert_eq!(status.status, PermissionState::Denied);
        assert_eq!(perms.gateway().requests, 0);
    }

    #[test]
    fn denied_after_request() {
        let mut gateway = FakeGateway::with(PermissionStatus::denied(true));
        gateway.grant_on_request = false;
        let mut perms = Permissions::new(gateway);
        let status = perms.ensure_granted().unwrap();
        assert!(!status.granted);
        assert!(!status.can_ask_again);
    }

    #[test]
    fn settings_failure_is_swallowed() {
        let mut gateway = FakeGateway::with(PermissionStatus::granted());
        gateway.settings_fail = true;
        let mut perms = Permissions::new(gateway);
        assert!(!perms.open_settings_best_effort());

        perms.gateway_mut().settings_fail = false;
        assert!(perms.open_settings_best_effort());
        assert_eq!(perms.gateway().settings_opened, 1);
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_value(PermissionStatus::denied(true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"granted": false, "canAskAgain": true, "status": "denied"})
        );
    }
}
