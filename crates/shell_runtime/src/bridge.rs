//! Typed message bridge between the host process and the embedded surface.
//!
//! Both directions carry flat JSON objects with a required `type` tag. The
//! transport is opaque: a reliable-within-process duplex channel with no retry
//! of its own. The session layer is pure (inbound message in, effect commands
//! out) so every protocol rule is testable without a webview; the driver
//! executes commands against the capability facade and the transport.
//!
//! Ordering contract: the host keeps a single `ready` flag per surface
//! instance, false until `webViewReady` arrives, and state-change `pushToken`
//! pushes are gated on it. Messages sent before readiness are not guaranteed
//! delivered; the surface re-requests with `requestPushToken`.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shell_host::{
    unix_time_ms_now, LoginOutcome, NotificationPermissionState, PushRegistration, ShareOutcome,
    ShareRequest, ShareService, SocialLoginService,
};
use tracing::{debug, warn};

use crate::push_state::{PushTokenSnapshot, PushTokenState};

/// Object-safe boxed future used by [`BridgeTransport`].
pub type BridgeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Messages sent from the host to the embedded surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Current push token and permission posture. The token may be null; the
    /// status is always conveyed.
    #[serde(rename = "pushToken")]
    PushToken {
        /// Device push token, or null when none is held.
        token: Option<String>,
        /// Current permission posture.
        #[serde(rename = "permissionStatus")]
        permission_status: NotificationPermissionState,
        /// Send time in unix milliseconds.
        timestamp: u64,
    },
    /// Data payload of a notification the user tapped.
    #[serde(rename = "notificationTapped")]
    NotificationTapped {
        /// Opaque notification data forwarded to the page.
        data: Value,
    },
    /// Social login completed with a token pair.
    #[serde(rename = "GOOGLE_LOGIN_SUCCESS")]
    GoogleLoginSuccess {
        /// OAuth access token.
        #[serde(rename = "accessToken")]
        access_token: String,
        /// OpenID identity token.
        #[serde(rename = "idToken")]
        id_token: String,
    },
    /// Social login failed.
    #[serde(rename = "GOOGLE_LOGIN_ERROR")]
    GoogleLoginError {
        /// Failure description.
        error: String,
    },
    /// Outcome of a share request.
    #[serde(rename = "shareResult")]
    ShareResult {
        /// Whether the share sheet completed.
        success: bool,
        /// Host action token, present on completion.
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<String>,
        /// Host activity identifier; null when the platform reports none.
        #[serde(rename = "activityType")]
        activity_type: Option<String>,
        /// Failure description, present on failure.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// The host failed to parse an inbound message.
    #[serde(rename = "error")]
    Error {
        /// Parse failure description.
        error: String,
    },
}

impl OutboundMessage {
    /// Builds a `pushToken` message from the current state snapshot.
    pub fn push_token(snapshot: &PushTokenSnapshot) -> Self {
        Self::PushToken {
            token: snapshot.token.clone(),
            permission_status: snapshot.permission,
            timestamp: unix_time_ms_now(),
        }
    }

    /// Builds the login response for a capability outcome.
    pub fn login_result(outcome: LoginOutcome) -> Self {
        match (outcome.success, outcome.access_token, outcome.id_token) {
            (true, Some(access_token), Some(id_token)) => Self::GoogleLoginSuccess {
                access_token,
                id_token,
            },
            _ => Self::GoogleLoginError {
                error: outcome.error.unwrap_or_else(|| "Login failed".to_string()),
            },
        }
    }

    /// Builds the share response for a capability outcome.
    pub fn share_result(outcome: ShareOutcome) -> Self {
        Self::ShareResult {
            success: outcome.success,
            action: outcome.action,
            activity_type: outcome.activity_type,
            error: outcome.error,
        }
    }

    fn share_rejected(error: impl Into<String>) -> Self {
        Self::ShareResult {
            success: false,
            action: None,
            activity_type: None,
            error: Some(error.into()),
        }
    }
}

/// Messages received from the embedded surface.
///
/// Unrecognized `type` values deserialize to [`InboundMessage::Unknown`] and
/// are ignored; only malformed JSON produces an `error` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// The surface finished booting and can process host messages.
    #[serde(rename = "webViewReady")]
    WebViewReady {
        /// Surface-reported send time, carried opaquely.
        #[serde(default)]
        timestamp: Option<Value>,
    },
    /// Explicit request to re-send the current push token state.
    #[serde(rename = "requestPushToken")]
    RequestPushToken,
    /// Request to run the native social-login flow.
    #[serde(rename = "GOOGLE_LOGIN_REQUEST")]
    GoogleLoginRequest,
    /// Request to present the native share sheet.
    #[serde(rename = "share")]
    Share {
        /// Link to share; required.
        #[serde(default)]
        url: Option<String>,
        /// Optional share title.
        #[serde(default)]
        title: Option<String>,
        /// Optional share text.
        #[serde(default)]
        text: Option<String>,
    },
    /// Any message type this host does not recognize.
    #[serde(other)]
    Unknown,
}

/// Effect intents produced by the session layer.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCommand {
    /// Post a message to the surface.
    Send(OutboundMessage),
    /// Run the social-login capability and post its result.
    InvokeLogin,
    /// Run the share capability and post its result.
    InvokeShare(ShareRequest),
}

/// Per-surface-instance protocol state.
#[derive(Debug, Default)]
pub struct BridgeSession {
    ready: bool,
}

impl BridgeSession {
    /// Creates a session for a fresh surface instance, not yet ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the surface has signaled readiness.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Handles one raw inbound payload.
    ///
    /// Malformed JSON degrades to an `error` response; the channel stays open.
    pub fn handle_raw(&mut self, raw: &str, snapshot: &PushTokenSnapshot) -> Vec<BridgeCommand> {
        match serde_json::from_str::<InboundMessage>(raw) {
            Ok(message) => self.handle_message(message, snapshot),
            Err(err) => {
                warn!(error = %err, "discarding malformed bridge message");
                vec![BridgeCommand::Send(OutboundMessage::Error {
                    error: format!("Failed to parse message: {err}"),
                })]
            }
        }
    }

    /// Handles one parsed inbound message.
    pub fn handle_message(
        &mut self,
        message: InboundMessage,
        snapshot: &PushTokenSnapshot,
    ) -> Vec<BridgeCommand> {
        match message {
            InboundMessage::WebViewReady { .. } => {
                self.ready = true;
                debug!("surface signaled ready, pushing current token state");
                vec![BridgeCommand::Send(OutboundMessage::push_token(snapshot))]
            }
            InboundMessage::RequestPushToken => {
                // Unconditional: an explicit request is honored even pre-ready.
                vec![BridgeCommand::Send(OutboundMessage::push_token(snapshot))]
            }
            InboundMessage::GoogleLoginRequest => vec![BridgeCommand::InvokeLogin],
            InboundMessage::Share { url, title, text } => {
                match url.filter(|value| !value.is_empty()) {
                    Some(url) => vec![BridgeCommand::InvokeShare(ShareRequest {
                        url,
                        title,
                        text,
                    })],
                    None => vec![BridgeCommand::Send(OutboundMessage::share_rejected(
                        "URL is required for sharing",
                    ))],
                }
            }
            InboundMessage::Unknown => {
                debug!("ignoring bridge message with unrecognized type");
                Vec::new()
            }
        }
    }

    /// Reacts to a push token/permission state change.
    ///
    /// Gated on readiness: a surface that has not signaled `webViewReady`
    /// cannot process the push yet and will re-request when it boots.
    pub fn handle_token_state_change(&self, snapshot: &PushTokenSnapshot) -> Option<OutboundMessage> {
        self.ready.then(|| OutboundMessage::push_token(snapshot))
    }

    /// Reacts to a tapped notification while the surface is ready.
    pub fn handle_notification_response(&self, data: Value) -> Option<OutboundMessage> {
        self.ready
            .then(|| OutboundMessage::NotificationTapped { data })
    }
}

/// Transport posting host messages into the embedded surface.
pub trait BridgeTransport {
    /// Posts one message. Delivery before surface readiness is best-effort.
    fn post<'a>(&'a self, message: &'a OutboundMessage) -> BridgeFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Default)]
/// Transport that records posted messages, for tests and headless hosts.
pub struct MemoryBridgeTransport {
    posted: Rc<RefCell<Vec<OutboundMessage>>>,
}

impl MemoryBridgeTransport {
    /// Messages posted so far, in order.
    pub fn posted(&self) -> Vec<OutboundMessage> {
        self.posted.borrow().clone()
    }
}

impl BridgeTransport for MemoryBridgeTransport {
    fn post<'a>(&'a self, message: &'a OutboundMessage) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.posted.borrow_mut().push(message.clone());
            Ok(())
        })
    }
}

/// Executes bridge protocol effects against the capability facade.
///
/// Owns the session state and the single-writer token state; everything else
/// is borrowed capability services. Concurrent invocations of the same
/// capability are not de-duplicated; the surface handles duplicates
/// idempotently.
pub struct BridgeDriver {
    session: RefCell<BridgeSession>,
    token_state: Rc<PushTokenState>,
    transport: Rc<dyn BridgeTransport>,
    share: Rc<dyn ShareService>,
    login: Rc<dyn SocialLoginService>,
}

impl BridgeDriver {
    /// Creates a driver for one surface instance.
    pub fn new(
        token_state: Rc<PushTokenState>,
        transport: Rc<dyn BridgeTransport>,
        share: Rc<dyn ShareService>,
        login: Rc<dyn SocialLoginService>,
    ) -> Self {
        Self {
            session: RefCell::new(BridgeSession::new()),
            token_state,
            transport,
            share,
            login,
        }
    }

    /// Whether the surface has signaled readiness.
    pub fn is_ready(&self) -> bool {
        self.session.borrow().is_ready()
    }

    /// Handles one raw payload received from the surface.
    pub async fn on_surface_message(&self, raw: &str) {
        let commands = self
            .session
            .borrow_mut()
            .handle_raw(raw, &self.token_state.snapshot());
        for command in commands {
            self.execute(command).await;
        }
    }

    /// Applies a fresh registration result and pushes it when it changed state
    /// and the surface is ready.
    pub async fn apply_registration(&self, registration: PushRegistration) {
        if !self.token_state.apply_registration(registration) {
            return;
        }
        let message = self
            .session
            .borrow()
            .handle_token_state_change(&self.token_state.snapshot());
        if let Some(message) = message {
            self.post(message).await;
        }
    }

    /// Forwards a tapped notification's data payload to the surface.
    pub async fn on_notification_response(&self, data: Value) {
        let message = self.session.borrow().handle_notification_response(data);
        if let Some(message) = message {
            self.post(message).await;
        }
    }

    async fn execute(&self, command: BridgeCommand) {
        match command {
            BridgeCommand::Send(message) => self.post(message).await,
            BridgeCommand::InvokeLogin => {
                let outcome = self.login.login().await;
                self.post(OutboundMessage::login_result(outcome)).await;
            }
            BridgeCommand::InvokeShare(request) => {
                let outcome = self.share.share(&request).await;
                self.post(OutboundMessage::share_result(outcome)).await;
            }
        }
    }

    async fn post(&self, message: OutboundMessage) {
        if let Err(err) = self.transport.post(&message).await {
            warn!(error = %err, "failed to post bridge message to surface");
        }
    }
}
