//! Social-login contracts and adapters.

use std::{future::Future, pin::Pin};

/// Object-safe boxed future used by [`SocialLoginService`].
pub type LoginFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Outcome of a native social-login flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginOutcome {
    /// Whether the flow completed with a token pair.
    pub success: bool,
    /// OAuth access token on success.
    pub access_token: Option<String>,
    /// OpenID identity token on success.
    pub id_token: Option<String>,
    /// Failure description when `success` is false.
    pub error: Option<String>,
}

impl LoginOutcome {
    /// Successful outcome carrying the acquired token pair.
    pub fn succeeded(access_token: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            success: true,
            access_token: Some(access_token.into()),
            id_token: Some(id_token.into()),
            error: None,
        }
    }

    /// Failed outcome with an error description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            access_token: None,
            id_token: None,
            error: Some(error.into()),
        }
    }
}

/// Host service that runs the native social-login flow.
///
/// The flow may suspend for unbounded real time (user interaction, network);
/// callers attach no timeout and display no progress UI.
pub trait SocialLoginService {
    /// Starts the login flow and reports its outcome. Fails soft.
    fn login<'a>(&'a self) -> LoginFuture<'a, LoginOutcome>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op social-login service for hosts without a native login flow.
pub struct NoopSocialLoginService;

impl SocialLoginService for NoopSocialLoginService {
    fn login<'a>(&'a self) -> LoginFuture<'a, LoginOutcome> {
        Box::pin(async { LoginOutcome::failed("social login is not supported on this host") })
    }
}

#[derive(Debug, Clone, Default)]
/// Social-login service that returns a fixed outcome, for tests.
pub struct StaticSocialLoginService {
    outcome: LoginOutcome,
}

impl StaticSocialLoginService {
    /// Creates a service that always reports `outcome`.
    pub fn new(outcome: LoginOutcome) -> Self {
        Self { outcome }
    }
}

impl SocialLoginService for StaticSocialLoginService {
    fn login<'a>(&'a self) -> LoginFuture<'a, LoginOutcome> {
        Box::pin(async move { self.outcome.clone() })
    }
}
