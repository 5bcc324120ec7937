//! Event-loop wiring between Tauri callbacks and the shell runtime.
//!
//! The application keeps a single logical thread of control: every OS callback,
//! IPC command, and surface message is funneled through one channel into a
//! dedicated thread that owns the resolver, the bridge, and the stores. The
//! webview runs its own execution context; message passing is the only
//! cross-boundary interaction.

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread;

use futures::executor::block_on;
use serde_json::Value;
use shell_host::{
    AttributionPayload, HostCapabilities, HostServices, HostStrategy, MemoryAttributionEvents,
    MemoryLinkEvents, MemoryNotificationEvents, NoopSocialLoginService, PrefsStore,
    PushRegistrationService,
};
use shell_runtime::{
    internal_route, BridgeDriver, DeepLinkResolver, DeferredLinkStore, NavigationSink,
    PushTokenState, ShellSession, MESSAGE_BASE_URL,
};
use tauri::{AppHandle, Manager};
use tauri_plugin_deep_link::DeepLinkExt;
use tracing::{debug, error, warn};
use url::Url;

use crate::bridge::{WebviewBridgeTransport, BOOTSTRAP_SCRIPT};
use crate::prefs::FilePrefsStore;
use crate::push::NotificationPermissionProbe;
use crate::share::OpenerShareService;
use crate::{MAIN_WINDOW_LABEL, USER_AGENT};

/// Events funneled into the shell runtime thread.
#[derive(Debug, Clone)]
pub enum ShellEvent {
    /// Process booted: resolve the cold-start target and create the surface.
    Boot {
        /// URL the OS handed to the process at launch, if any.
        initial_link: Option<String>,
    },
    /// Raw payload posted by the embedded surface.
    SurfaceMessage(String),
    /// OS link event while the process is running.
    LinkOpened(String),
    /// Attribution SDK direct deep-link callback.
    AttributionDeepLink(AttributionPayload),
    /// Attribution SDK install-conversion callback.
    InstallConversion(AttributionPayload),
    /// Data payload of a tapped notification.
    NotificationResponse(Value),
    /// Re-check notification permission (app returned to foreground).
    PermissionRecheck,
    /// Tear the runtime down.
    Shutdown,
}

/// Handle through which commands and OS callbacks reach the runtime thread.
pub struct EventBus {
    sender: Mutex<Sender<ShellEvent>>,
}

impl EventBus {
    fn new(sender: Sender<ShellEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }

    /// Enqueues an event for the runtime thread.
    pub fn send(&self, event: ShellEvent) -> Result<(), String> {
        self.sender
            .lock()
            .map_err(|_| "shell event bus is poisoned".to_string())?
            .send(event)
            .map_err(|err| format!("shell runtime is unavailable: {err}"))
    }
}

/// Wires the runtime thread and OS listeners into the Tauri application.
pub fn attach(app: &mut tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let (sender, receiver) = mpsc::channel();
    app.manage(EventBus::new(sender.clone()));

    let handle = app.handle().clone();
    thread::Builder::new()
        .name("vibz-shell-runtime".into())
        .spawn(move || runtime_main(handle, receiver))?;

    let initial_link = app
        .deep_link()
        .get_current()
        .ok()
        .flatten()
        .and_then(|urls| urls.into_iter().next())
        .map(|url| url.to_string());

    let link_sender = sender.clone();
    app.deep_link().on_open_url(move |event| {
        for url in event.urls() {
            if link_sender
                .send(ShellEvent::LinkOpened(url.to_string()))
                .is_err()
            {
                warn!("dropping link event, shell runtime is gone");
            }
        }
    });

    sender.send(ShellEvent::Boot { initial_link })?;
    Ok(())
}

fn runtime_main(app: AppHandle, events: Receiver<ShellEvent>) {
    let prefs: Rc<dyn PrefsStore> = match FilePrefsStore::from_app(&app) {
        Ok(store) => Rc::new(store),
        Err(err) => {
            warn!(error = %err, "prefs unavailable, deferred-link persistence disabled");
            Rc::new(shell_host::NoopPrefsStore)
        }
    };
    let services = HostServices {
        prefs,
        push_registration: Rc::new(NotificationPermissionProbe::new(app.clone())),
        share: Rc::new(OpenerShareService::new(app.clone())),
        social_login: Rc::new(NoopSocialLoginService),
        capabilities: HostCapabilities::tauri(),
        host_strategy: HostStrategy::Tauri,
    };
    debug!(
        strategy = services.host_strategy.as_str(),
        push_available = services.capabilities.push_notifications.is_available(),
        "host services ready"
    );

    let resolver = Rc::new(DeepLinkResolver::new(DeferredLinkStore::new(Rc::clone(
        &services.prefs,
    ))));
    let driver = Rc::new(BridgeDriver::new(
        Rc::new(PushTokenState::new()),
        Rc::new(WebviewBridgeTransport::new(app.clone())),
        Rc::clone(&services.share),
        Rc::clone(&services.social_login),
    ));
    let navigator = Rc::new(WebviewNavigator::new(app.clone()));

    // In-process hubs: OS callbacks land here as plain events, so the session
    // wiring below is identical for the Tauri host and the test harnesses.
    let link_events = MemoryLinkEvents::default();
    let attribution_events = MemoryAttributionEvents::default();
    let notification_events = MemoryNotificationEvents::default();

    let mut session = ShellSession::new(Rc::clone(&resolver), Rc::clone(&driver), navigator);
    session.attach_link_source(&link_events);
    session.attach_attribution_source(&attribution_events);
    session.attach_notification_source(&notification_events);

    while let Ok(event) = events.recv() {
        match event {
            ShellEvent::Boot { initial_link } => {
                let target = block_on(resolver.resolve_cold_start(initial_link.as_deref()))
                    .map(|navigation| navigation.absolute_url)
                    .unwrap_or_else(|| MESSAGE_BASE_URL.to_string());
                create_main_window(&app, &target);
                let registration = block_on(services.push_registration.acquire());
                block_on(driver.apply_registration(registration));
            }
            ShellEvent::SurfaceMessage(raw) => block_on(driver.on_surface_message(&raw)),
            ShellEvent::LinkOpened(url) => link_events.emit(&url),
            ShellEvent::AttributionDeepLink(payload) => {
                attribution_events.emit_deep_link(&payload)
            }
            ShellEvent::InstallConversion(payload) => {
                attribution_events.emit_install_conversion(&payload)
            }
            ShellEvent::NotificationResponse(data) => notification_events.emit_response(&data),
            ShellEvent::PermissionRecheck => {
                let registration = block_on(services.push_registration.acquire());
                block_on(driver.apply_registration(registration));
            }
            ShellEvent::Shutdown => break,
        }
    }

    session.shutdown();
    debug!("shell runtime thread exited");
}

fn create_main_window(app: &AppHandle, target_url: &str) {
    let url = match Url::parse(target_url) {
        Ok(url) => url,
        Err(err) => {
            error!(url = target_url, error = %err, "invalid start URL, using message base");
            Url::parse(MESSAGE_BASE_URL).expect("message base URL is valid")
        }
    };

    debug!(url = %url, "creating shell window");
    let result =
        tauri::WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, tauri::WebviewUrl::External(url))
            .title("Vibz World")
            .user_agent(USER_AGENT)
            .initialization_script(BOOTSTRAP_SCRIPT)
            .maximized(true)
            .build();
    if let Err(err) = result {
        error!(error = %err, "failed to create shell window");
    }
}

struct WebviewNavigator {
    app: AppHandle,
}

impl WebviewNavigator {
    fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl NavigationSink for WebviewNavigator {
    fn navigate(&self, absolute_url: &str) {
        let url = match Url::parse(absolute_url) {
            Ok(url) => url,
            Err(err) => {
                warn!(url = absolute_url, error = %err, "refusing to navigate to unparsable URL");
                return;
            }
        };
        match self.app.get_webview_window(MAIN_WINDOW_LABEL) {
            Some(mut window) => {
                debug!(route = %internal_route(absolute_url), "navigating surface");
                if let Err(err) = window.navigate(url) {
                    warn!(error = %err, "surface navigation failed");
                }
            }
            None => warn!(url = absolute_url, "no surface window to navigate"),
        }
    }
}
