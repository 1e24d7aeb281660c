//! Per-visitor sessions: the login gate and a one-shot notice slot.
//!
//! A session is created on the first successful login and lives until the
//! process exits; there is no logout.

use axum::http::{HeaderMap, header};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "counter_session";

pub type SessionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginState {
    #[default]
    LoggedOut,
    LoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    login: LoginState,
    notice: Option<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("wrong password")]
    WrongPassword,
}

impl Session {
    pub fn login_state(&self) -> LoginState {
        self.login
    }

    pub fn is_logged_in(&self) -> bool {
        self.login == LoginState::LoggedIn
    }

    /// The only transition: LoggedOut -> LoggedIn on the right password.
    pub fn submit_password(&mut self, submitted: &str, expected: &str) -> Result<(), LoginError> {
        if submitted == expected {
            self.login = LoginState::LoggedIn;
            Ok(())
        } else {
            Err(LoginError::WrongPassword)
        }
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log in on the session named by `existing`, or on a fresh one.
    /// Returns the session id and whether it was just created. Failed
    /// attempts never create a session. A session that is already logged in
    /// stays logged in whatever password is submitted.
    pub async fn login(
        &self,
        existing: Option<SessionId>,
        submitted: &str,
        expected: &str,
    ) -> Result<(SessionId, bool), LoginError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(id) = existing {
            if let Some(session) = sessions.get_mut(&id) {
                if !session.is_logged_in() {
                    session.submit_password(submitted, expected)?;
                }
                return Ok((id, false));
            }
        }

        let mut session = Session::default();
        if let Err(err) = session.submit_password(submitted, expected) {
            warn!("rejected login attempt");
            return Err(err);
        }
        let id = Uuid::new_v4();
        sessions.insert(id, session);
        info!(sessions = sessions.len(), "session logged in");
        Ok((id, true))
    }

    pub async fn is_logged_in(&self, id: Option<SessionId>) -> bool {
        let Some(id) = id else {
            return false;
        };
        self.sessions
            .lock()
            .await
            .get(&id)
            .is_some_and(Session::is_logged_in)
    }

    /// Stores a notice on a logged-in session. Unknown ids are ignored.
    pub async fn set_notice(&self, id: SessionId, notice: Notice) {
        if let Some(session) = self.sessions.lock().await.get_mut(&id) {
            session.set_notice(notice);
        }
    }

    pub async fn take_notice(&self, id: SessionId) -> Option<Notice> {
        self.sessions
            .lock()
            .await
            .get_mut(&id)
            .and_then(Session::take_notice)
    }
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(id: SessionId) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}
