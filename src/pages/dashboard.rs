//! Dashboard page handler: greets the persisted identity and offers logout.
//!
//! DESIGN
//! ======
//! `load` runs once per page visit. Without a persisted identity it redirects
//! before any request is made. The display region is overwritten directly;
//! there is no loading state and no retry.
//!
//! Logout is client-authoritative: the identity is cleared and the page
//! leaves regardless of what the API does with the notification, which is
//! spawned and never awaited by the handler.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::net::api::UserApi;
use crate::net::types::UserInfo;
use crate::page::{Location, Page};
use crate::session::Session;

pub const LOGIN_REQUIRED_ALERT: &str = "You need to be logged in to access this page.";
pub const USER_NOT_FOUND_MESSAGE: &str = "Error: user not found in the API.";
pub const LOAD_FAILED_FALLBACK: &str = "Unknown error.";
pub const API_UNREACHABLE_MESSAGE: &str = "Could not connect to the API.";
pub const LOGGED_OUT_ALERT: &str = "You have been logged out.";

/// How a dashboard load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardOutcome {
    /// No identity; redirected to the login page without a request.
    Unauthenticated,
    /// Welcome rendered for this username.
    Welcomed(String),
    /// The API does not know the persisted username.
    NotFound,
    /// The API answered with another error status.
    Failed,
    /// No usable answer from the API.
    Unreachable,
}

#[must_use]
pub fn welcome_message(username: &str, profile: Option<&UserInfo>) -> String {
    match profile.and_then(|info| info.email.as_deref()).filter(|email| !email.is_empty()) {
        Some(email) => format!("Welcome, {username}! ({email})"),
        None => format!("Welcome, {username}!"),
    }
}

#[must_use]
pub fn load_failed_message(detail: Option<&str>) -> String {
    format!("Error loading data: {}", detail.unwrap_or(LOAD_FAILED_FALLBACK))
}

pub struct DashboardPage {
    api: Arc<dyn UserApi>,
    session: Session,
    page: Arc<dyn Page>,
}

impl DashboardPage {
    pub fn new(api: Arc<dyn UserApi>, session: Session, page: Arc<dyn Page>) -> Self {
        Self { api, session, page }
    }

    /// Page-load entry point.
    pub async fn load(&self) -> DashboardOutcome {
        let Some(username) = self.session.current() else {
            self.page.alert(LOGIN_REQUIRED_ALERT);
            self.page.navigate(Location::Login);
            return DashboardOutcome::Unauthenticated;
        };

        match self.api.fetch_user(&username).await {
            Ok(profile) => {
                self.page.render(&welcome_message(&username, profile.as_ref()));
                DashboardOutcome::Welcomed(username)
            }
            Err(ApiError::NotFound { .. }) => {
                warn!(%username, "persisted user not found by API");
                self.page.render(USER_NOT_FOUND_MESSAGE);
                DashboardOutcome::NotFound
            }
            Err(e) if e.is_connectivity() => {
                error!(error = %e, "user info request could not reach the API");
                self.page.render(API_UNREACHABLE_MESSAGE);
                DashboardOutcome::Unreachable
            }
            Err(e) => {
                warn!(error = %e, "user info request failed");
                self.page.render(&load_failed_message(e.detail()));
                DashboardOutcome::Failed
            }
        }
    }

    /// Logout control. Clears the identity, notifies the API in the
    /// background, alerts, and returns to the login page.
    ///
    /// The returned handle is only for hosts that must keep the runtime
    /// alive for the notification; the handler never awaits it. Outside a
    /// Tokio runtime the notification is skipped and `None` is returned.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        if let Err(e) = self.session.clear() {
            error!(error = %e, "failed to clear identity on logout");
        }

        let notice = match Handle::try_current() {
            Ok(runtime) => {
                let api = Arc::clone(&self.api);
                Some(runtime.spawn(async move {
                    if let Err(e) = api.logout().await {
                        warn!(error = %e, "logout notification failed; server session may linger");
                    }
                }))
            }
            Err(e) => {
                warn!(error = %e, "no async runtime; logout notification skipped");
                None
            }
        };

        info!("logged out");
        self.page.alert(LOGGED_OUT_ALERT);
        self.page.navigate(Location::Login);
        notice
    }
}
