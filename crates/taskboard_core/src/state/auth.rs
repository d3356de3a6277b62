//! crates/taskboard_core/src/state/auth.rs
//!
//! Session identity and the login/register lifecycle.

use crate::domain::{Session, User};
use crate::state::Effect;

/// Which asynchronous auth operation is running, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOp {
    Login,
    Register,
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    /// A login or register request was sent.
    Pending,
    Fulfilled(Session),
    Rejected(String),
    /// A well-formed session record was read from local storage.
    Restored(Session),
    Logout,
    /// The server rejected the stored token; tear down and send the user to login.
    SessionExpired,
    ClearError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Set when a 401 ended the session. Callers route to the login view.
    pub session_expired: bool,
    /// Requests sent but not yet settled. `loading` is true while non-zero.
    in_flight: u32,
}

impl AuthState {
    pub fn session(&self) -> Option<Session> {
        match (&self.user, &self.token) {
            (Some(user), Some(token)) => Some(Session {
                user: user.clone(),
                token: token.clone(),
            }),
            _ => None,
        }
    }

    pub fn reduce(&mut self, action: AuthAction) -> Vec<Effect> {
        match action {
            AuthAction::Pending => {
                self.in_flight += 1;
                self.loading = true;
                self.error = None;
                self.session_expired = false;
                vec![]
            }
            AuthAction::Fulfilled(session) => {
                self.settle();
                self.sign_in(session);
                vec![]
            }
            AuthAction::Restored(session) => {
                self.sign_in(session);
                vec![]
            }
            AuthAction::Rejected(message) => {
                self.settle();
                self.error = Some(message);
                self.is_authenticated = false;
                vec![]
            }
            AuthAction::Logout => {
                self.clear_session();
                vec![Effect::RemoveSession, Effect::RemoveSelection]
            }
            AuthAction::SessionExpired => {
                self.clear_session();
                self.session_expired = true;
                vec![Effect::RemoveSession, Effect::RemoveSelection]
            }
            AuthAction::ClearError => {
                self.error = None;
                vec![]
            }
        }
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
    }

    fn sign_in(&mut self, session: Session) {
        self.user = Some(session.user);
        self.token = Some(session.token);
        self.is_authenticated = true;
        self.error = None;
    }

    fn clear_session(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
    }
}
