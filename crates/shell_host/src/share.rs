//! Native share-sheet contracts and adapters.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

/// Object-safe boxed future used by [`ShareService`].
pub type ShareFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Payload handed to the native share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    /// Link being shared. Validated by the bridge before the service is invoked.
    pub url: String,
    /// Optional share-sheet title.
    pub title: Option<String>,
    /// Optional message text shown alongside the link.
    pub text: Option<String>,
}

impl ShareRequest {
    /// Creates a request for a bare URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            text: None,
        }
    }

    /// Title handed to the share sheet, with the product default applied.
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Check this out!")
    }

    /// Message body handed to the share sheet: text above the link when text
    /// is present, otherwise the bare link.
    pub fn composed_message(&self) -> String {
        match self.text.as_deref() {
            Some(text) => format!("{text}\n\n{}", self.url),
            None => self.url.clone(),
        }
    }
}

/// Outcome of a share invocation, mirrored back to the hosted page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShareOutcome {
    /// Whether the share sheet completed without error.
    pub success: bool,
    /// Host-specific action token (for example `sharedAction`).
    pub action: Option<String>,
    /// Host-specific activity identifier, when the platform reports one.
    pub activity_type: Option<String>,
    /// Failure description when `success` is false.
    pub error: Option<String>,
}

impl ShareOutcome {
    /// Successful outcome with an action token.
    pub fn completed(action: impl Into<String>) -> Self {
        Self {
            success: true,
            action: Some(action.into()),
            activity_type: None,
            error: None,
        }
    }

    /// Failed outcome with an error description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: None,
            activity_type: None,
            error: Some(error.into()),
        }
    }
}

/// Host service that presents the native share sheet.
pub trait ShareService {
    /// Presents the share sheet for `request` and reports the outcome.
    ///
    /// Implementations fail soft: platform errors are folded into the outcome
    /// rather than raised.
    fn share<'a>(&'a self, request: &'a ShareRequest) -> ShareFuture<'a, ShareOutcome>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op share service for hosts without a share sheet.
pub struct NoopShareService;

impl ShareService for NoopShareService {
    fn share<'a>(&'a self, _request: &'a ShareRequest) -> ShareFuture<'a, ShareOutcome> {
        Box::pin(async { ShareOutcome::failed("share is not supported on this host") })
    }
}

#[derive(Debug, Clone, Default)]
/// Share service that records requests and returns a configured outcome, for tests.
pub struct RecordingShareService {
    outcome: ShareOutcome,
    requests: Rc<RefCell<Vec<ShareRequest>>>,
}

impl RecordingShareService {
    /// Creates a recording service that reports `outcome` for every request.
    pub fn new(outcome: ShareOutcome) -> Self {
        Self {
            outcome,
            requests: Rc::default(),
        }
    }

    /// Requests observed so far, in invocation order.
    pub fn requests(&self) -> Vec<ShareRequest> {
        self.requests.borrow().clone()
    }
}

impl ShareService for RecordingShareService {
    fn share<'a>(&'a self, request: &'a ShareRequest) -> ShareFuture<'a, ShareOutcome> {
        Box::pin(async move {
            self.requests.borrow_mut().push(request.clone());
            self.outcome.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn composed_message_places_text_above_link() {
        let request = ShareRequest {
            url: "https://lovenote.vibz.world/abc".to_string(),
            title: None,
            text: Some("Look at this".to_string()),
        };
        assert_eq!(
            request.composed_message(),
            "Look at this\n\nhttps://lovenote.vibz.world/abc"
        );
        assert_eq!(request.title_or_default(), "Check this out!");
    }

    #[test]
    fn composed_message_without_text_is_the_bare_link() {
        let request = ShareRequest::new("https://lovenote.vibz.world/abc");
        assert_eq!(request.composed_message(), "https://lovenote.vibz.world/abc");
    }

    #[test]
    fn recording_service_captures_requests_in_order() {
        let service = RecordingShareService::new(ShareOutcome::completed("sharedAction"));
        let first = ShareRequest::new("https://lovenote.vibz.world/1");
        let second = ShareRequest::new("https://lovenote.vibz.world/2");

        let outcome = block_on(service.share(&first));
        assert!(outcome.success);
        block_on(service.share(&second));

        assert_eq!(service.requests(), vec![first, second]);
    }
}
