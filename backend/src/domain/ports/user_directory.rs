//! Driving port for account management and password authentication.
//!
//! Inbound adapters call it without knowing how accounts are stored. The
//! directory owns the account invariants: case-insensitive email
//! uniqueness and at least one active administrator.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, NewUser, UserAccount, UserId, UserPatch};

/// Domain use-case port for the user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Return the active account matching the credentials, if any.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<UserAccount>, Error>;

    /// Every account, in creation order.
    async fn list(&self) -> Result<Vec<UserAccount>, Error>;

    /// Account with the given id.
    async fn find(&self, id: &UserId) -> Result<Option<UserAccount>, Error>;

    /// Create an active account. Conflicts when the email is taken.
    async fn create(&self, user: NewUser) -> Result<UserAccount, Error>;

    /// Apply a partial update.
    async fn update(&self, id: &UserId, patch: UserPatch) -> Result<UserAccount, Error>;

    /// Remove an account.
    async fn delete(&self, id: &UserId) -> Result<(), Error>;

    /// Flip the active flag.
    async fn toggle_active(&self, id: &UserId) -> Result<UserAccount, Error>;

    /// Create `admin` when the directory is empty. Returns whether it did.
    async fn ensure_bootstrap_admin(&self, admin: NewUser) -> Result<bool, Error>;
}
