//! Bridge transport and command handler between the webview surface and host.

use shell_runtime::{BridgeFuture, BridgeTransport, OutboundMessage};
use tauri::{AppHandle, Manager};
use tracing::debug;

use crate::runtime::{EventBus, ShellEvent};
use crate::MAIN_WINDOW_LABEL;

/// Bootstrap script injected into the surface at document start.
///
/// Exposes the same `window.ReactNativeWebView`-shaped channel the hosted page
/// already speaks, plus the login/share helpers, and announces readiness after
/// a short delay.
pub(crate) const BOOTSTRAP_SCRIPT: &str = r#"
(function () {
  if (window.ReactNativeWebView) {
    return;
  }
  window.isReactNativeWebView = true;

  var post = function (payload) {
    window.__TAURI_INTERNALS__.invoke('bridge_post_message', { payload: payload });
  };

  window.ReactNativeWebView = {
    postMessage: post
  };

  window.requestGoogleLogin = function () {
    post(JSON.stringify({ type: 'GOOGLE_LOGIN_REQUEST' }));
  };

  window.shareContent = function (shareData) {
    try {
      post(JSON.stringify({
        type: 'share',
        url: shareData.url,
        title: shareData.title,
        text: shareData.text
      }));
    } catch (error) {
      console.error('[VibzShell] shareContent failed', error);
    }
  };

  setTimeout(function () {
    try {
      post(JSON.stringify({
        type: 'webViewReady',
        timestamp: new Date().toISOString()
      }));
    } catch (error) {
      console.error('[VibzShell] webViewReady failed', error);
    }
  }, 500);
})();
"#;

/// Receives one raw surface payload and hands it to the runtime thread.
#[tauri::command]
pub fn bridge_post_message(bus: tauri::State<'_, EventBus>, payload: String) -> Result<(), String> {
    bus.send(ShellEvent::SurfaceMessage(payload))
}

/// Transport posting host messages into the surface webview.
///
/// Messages are dispatched as both a `MessageEvent` and the legacy
/// `reactNativeMessage` custom event, matching the listener shapes the hosted
/// page registers.
pub(crate) struct WebviewBridgeTransport {
    app: AppHandle,
}

impl WebviewBridgeTransport {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl BridgeTransport for WebviewBridgeTransport {
    fn post<'a>(&'a self, message: &'a OutboundMessage) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let payload = serde_json::to_string(message)
                .map_err(|err| format!("failed to serialize bridge message: {err}"))?;
            let window = self
                .app
                .get_webview_window(MAIN_WINDOW_LABEL)
                .ok_or_else(|| "surface window is not available".to_string())?;
            let script = format!(
                "(function () {{\n  try {{\n    window.dispatchEvent(new MessageEvent('message', {{ data: {payload} }}));\n    window.dispatchEvent(new CustomEvent('reactNativeMessage', {{ detail: {payload} }}));\n  }} catch (error) {{\n    console.error('[VibzShell] failed to dispatch host message', error);\n  }}\n}})();"
            );
            debug!("posting bridge message to surface");
            window
                .eval(&script)
                .map_err(|err| format!("failed to evaluate bridge dispatch: {err}"))
        })
    }
}
