//! Notification permission probing behind the push-registration facade.

use shell_host::{
    NotificationPermissionState, PushFuture, PushRegistration, PushRegistrationService,
};
use tauri::AppHandle;
use tauri_plugin_notification::{NotificationExt, PermissionState};
use tracing::warn;

/// Push-registration service backed by the Tauri notification plugin.
///
/// Desktop webviews carry no push transport, so the token is always absent;
/// the permission posture is still probed and conveyed so the hosted page can
/// distinguish `denied` from `unavailable`.
pub(crate) struct NotificationPermissionProbe {
    app: AppHandle,
}

impl NotificationPermissionProbe {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn probe(&self) -> NotificationPermissionState {
        let notifications = self.app.notification();
        match notifications.permission_state() {
            Ok(PermissionState::Granted) => NotificationPermissionState::Granted,
            Ok(PermissionState::Denied) => NotificationPermissionState::Denied,
            Ok(_) => match notifications.request_permission() {
                Ok(PermissionState::Granted) => NotificationPermissionState::Granted,
                Ok(PermissionState::Denied) => NotificationPermissionState::Denied,
                Ok(_) => NotificationPermissionState::Unknown,
                Err(err) => {
                    warn!(error = %err, "notification permission request failed");
                    NotificationPermissionState::Error
                }
            },
            Err(err) => {
                warn!(error = %err, "notification permission check failed");
                NotificationPermissionState::Error
            }
        }
    }
}

impl PushRegistrationService for NotificationPermissionProbe {
    fn acquire<'a>(&'a self) -> PushFuture<'a, PushRegistration> {
        Box::pin(async move {
            PushRegistration {
                token: None,
                status: self.probe(),
            }
        })
    }
}
