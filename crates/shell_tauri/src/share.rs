//! Share adapter over the system opener.

use shell_host::{ShareFuture, ShareOutcome, ShareRequest, ShareService};
use tauri::AppHandle;
use tauri_plugin_opener::OpenerExt;
use tracing::debug;

/// Share service that hands the link to the system default handler.
///
/// Desktop hosts have no native share sheet; opening the link externally is
/// the closest equivalent, reported with an `openedExternally` action token.
pub(crate) struct OpenerShareService {
    app: AppHandle,
}

impl OpenerShareService {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ShareService for OpenerShareService {
    fn share<'a>(&'a self, request: &'a ShareRequest) -> ShareFuture<'a, ShareOutcome> {
        Box::pin(async move {
            debug!(
                title = request.title_or_default(),
                message = %request.composed_message(),
                "opening share target externally"
            );
            match self.app.opener().open_url(request.url.clone(), None::<String>) {
                Ok(()) => ShareOutcome::completed("openedExternally"),
                Err(err) => ShareOutcome::failed(format!("share failed: {err}")),
            }
        })
    }
}
