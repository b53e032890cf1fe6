//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie carries two entries: a *pending* login recorded once the
//! password has been checked, and the authenticated [`UserSession`] recorded
//! once the verification code has been accepted. Handlers only deal with
//! those domain-friendly values.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, UserId, UserSession};

pub(crate) const PENDING_LOGIN_KEY: &str = "pending_login";
pub(crate) const USER_KEY: &str = "user";

/// Login whose password was accepted but whose code is still outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingLogin {
    pub user_id: UserId,
    pub email: String,
    pub started_at: DateTime<Utc>,
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    fn read<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.0.get::<T>(key) {
            Ok(value) => Ok(value),
            Err(error) => {
                tracing::warn!(%key, %error, "discarding unreadable session entry");
                self.0.remove(key);
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Record a login awaiting its verification code.
    pub fn begin_login(&self, pending: &PendingLogin) -> Result<(), Error> {
        self.0.remove(USER_KEY);
        self.write(PENDING_LOGIN_KEY, pending)
    }

    /// The login awaiting verification, if any.
    pub fn pending_login(&self) -> Result<Option<PendingLogin>, Error> {
        self.read(PENDING_LOGIN_KEY)
    }

    /// The pending login or `400 Bad Request` when none was started.
    pub fn require_pending_login(&self) -> Result<PendingLogin, Error> {
        self.pending_login()?
            .ok_or_else(|| Error::invalid_request("no login is awaiting verification"))
    }

    /// Replace the pending login with an authenticated session.
    ///
    /// The session id is renewed so a cookie captured before verification
    /// cannot be replayed.
    pub fn complete_login(&self, user: &UserSession) -> Result<(), Error> {
        self.0.remove(PENDING_LOGIN_KEY);
        self.0.renew();
        self.write(USER_KEY, user)
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Result<Option<UserSession>, Error> {
        self.read(USER_KEY)
    }

    /// Require an authenticated user or return `401 Unauthorized`.
    pub fn require_user(&self) -> Result<UserSession, Error> {
        self.user()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require an administrator or return `401`/`403`.
    pub fn require_admin(&self) -> Result<UserSession, Error> {
        let user = self.require_user()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(Error::forbidden("administrator access required"))
        }
    }

    /// Drop everything stored in the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
