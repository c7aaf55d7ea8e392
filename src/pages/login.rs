//! Login page handler: exchanges form credentials for a persisted identity.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::net::api::UserApi;
use crate::net::types::Credentials;
use crate::page::{Location, Page};
use crate::session::Session;

pub const LOGIN_SUCCESS_NOTICE: &str = "Authenticated! Welcome!";
pub const LOGIN_REJECTED_FALLBACK: &str = "Invalid credentials.";
pub const SERVER_UNREACHABLE_ALERT: &str = "Could not reach the server. Check that the API is running.";
pub const MISSING_FIELDS_ALERT: &str = "Enter both username and password.";
pub const STORAGE_FAILED_ALERT: &str = "Logged in, but the session could not be saved on this device.";

/// How a single form submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Identity persisted and the page moved to the dashboard.
    LoggedIn(String),
    /// The API refused the credentials.
    Rejected,
    /// No usable answer from the API.
    Unreachable,
    /// A required field was empty; nothing was sent.
    MissingFields,
    /// Another submission was still pending; nothing was sent.
    Ignored,
    /// The API accepted the login but the identity could not be stored.
    StorageFailed,
}

/// Check the form's required fields. Values are passed through as typed.
///
/// # Errors
///
/// Returns the alert text when either field is empty.
pub fn validate_credentials(username: &str, password: &str) -> Result<Credentials, &'static str> {
    if username.is_empty() || password.is_empty() {
        return Err(MISSING_FIELDS_ALERT);
    }
    Ok(Credentials::new(username, password))
}

#[must_use]
pub fn rejected_message(detail: Option<&str>) -> String {
    format!("Login failed: {}", detail.unwrap_or(LOGIN_REJECTED_FALLBACK))
}

// =============================================================================
// IN-FLIGHT GUARD
// =============================================================================

/// Holds the form's pending flag; released on drop so every exit path
/// re-enables the form.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// HANDLER
// =============================================================================

pub struct LoginPage {
    api: Arc<dyn UserApi>,
    session: Session,
    page: Arc<dyn Page>,
    in_flight: AtomicBool,
}

impl LoginPage {
    pub fn new(api: Arc<dyn UserApi>, session: Session, page: Arc<dyn Page>) -> Self {
        Self { api, session, page, in_flight: AtomicBool::new(false) }
    }

    /// True while a submission is awaiting the API. The submit control
    /// should render disabled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Handle one form submission. At most one attempt is in flight; a
    /// re-entrant call returns [`LoginOutcome::Ignored`] without a request.
    pub async fn submit(&self, username: &str, password: &str) -> LoginOutcome {
        let credentials = match validate_credentials(username, password) {
            Ok(credentials) => credentials,
            Err(message) => {
                self.page.alert(message);
                return LoginOutcome::MissingFields;
            }
        };

        let Some(_pending) = InFlight::acquire(&self.in_flight) else {
            debug!(username = %credentials.username, "login already pending; submission ignored");
            return LoginOutcome::Ignored;
        };

        match self.api.login(&credentials).await {
            Ok(resp) => {
                if let Err(e) = self.session.persist(&resp.username) {
                    error!(error = %e, "failed to persist identity after login");
                    self.page.alert(STORAGE_FAILED_ALERT);
                    return LoginOutcome::StorageFailed;
                }
                info!(username = %resp.username, "login succeeded");
                self.page.alert(LOGIN_SUCCESS_NOTICE);
                self.page.navigate(Location::Dashboard);
                LoginOutcome::LoggedIn(resp.username)
            }
            Err(e) if e.is_connectivity() => {
                error!(error = %e, "login request could not reach the API");
                self.page.alert(SERVER_UNREACHABLE_ALERT);
                LoginOutcome::Unreachable
            }
            Err(e) => {
                warn!(error = %e, "login rejected");
                self.page.alert(&rejected_message(e.detail()));
                LoginOutcome::Rejected
            }
        }
    }
}
