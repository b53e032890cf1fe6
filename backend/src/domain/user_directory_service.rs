//! User directory service implementing the [`UserDirectory`] driving port.
//!
//! The whole account collection is one versioned document; every mutation
//! is an optimistic read-modify-write cycle. Password hashing happens once,
//! before the cycle, so retries never re-hash.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::password::{PasswordHash, verify_against_decoy};
use crate::domain::ports::{UserDirectory, UserRepository, Versioned};
use crate::domain::versioned_write::{
    MAX_WRITE_ATTEMPTS, exhausted, map_repository_error, retry_after,
};
use crate::domain::{
    EmailAddress, Error, LoginCredentials, NewUser, Password, UserAccount, UserId, UserPatch,
};

const COLLECTION: &str = "users";

/// User directory backed by a [`UserRepository`].
#[derive(Clone)]
pub struct UserDirectoryService<R> {
    users: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> UserDirectoryService<R> {
    /// Create a directory over the given repository.
    pub fn new(users: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

fn hash(password: &Password) -> Result<PasswordHash, Error> {
    PasswordHash::derive(password)
        .map_err(|err| Error::internal(format!("failed to hash password: {err}")))
}

fn not_found(id: &UserId) -> Error {
    Error::not_found(format!("user {id} not found"))
}

fn email_taken(email: &EmailAddress) -> Error {
    Error::conflict(format!("email {email} is already registered"))
}

fn position(users: &[UserAccount], id: &UserId) -> Result<usize, Error> {
    users
        .iter()
        .position(|user| &user.id == id)
        .ok_or_else(|| not_found(id))
}

/// Refuse any change that leaves a populated directory without an active admin.
fn guard_last_admin(had_admin: bool, users: &[UserAccount]) -> Result<(), Error> {
    if had_admin && !users.iter().any(UserAccount::is_active_admin) {
        return Err(Error::conflict(
            "at least one active administrator must remain",
        ));
    }
    Ok(())
}

impl<R> UserDirectoryService<R>
where
    R: UserRepository,
{
    async fn load(&self) -> Result<Versioned<Vec<UserAccount>>, Error> {
        self.users
            .load_users()
            .await
            .map_err(|err| map_repository_error(COLLECTION, err))
    }

    /// Run `apply` against the latest collection and save the result.
    ///
    /// The active-admin guard is checked after `apply` on every attempt.
    async fn mutate<T, F>(&self, mut apply: F) -> Result<T, Error>
    where
        F: FnMut(&mut Vec<UserAccount>) -> Result<T, Error> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Versioned { mut value, version } = self.load().await?;
            let had_admin = value.iter().any(UserAccount::is_active_admin);
            let outcome = apply(&mut value)?;
            guard_last_admin(had_admin, &value)?;
            match self.users.save_users(&value, version).await {
                Ok(()) => return Ok(outcome),
                Err(err) => retry_after(COLLECTION, attempt, err)?,
            }
        }
        Err(exhausted(COLLECTION))
    }
}

#[async_trait]
impl<R> UserDirectory for UserDirectoryService<R>
where
    R: UserRepository,
{
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<UserAccount>, Error> {
        let users = self.load().await?.value;
        let candidate = users
            .into_iter()
            .find(|user| user.active && user.email.matches(credentials.email()));
        match candidate {
            Some(user) if user.password_hash.verify(credentials.password()) => Ok(Some(user)),
            Some(_) => Ok(None),
            None => {
                verify_against_decoy(credentials.password());
                Ok(None)
            }
        }
    }

    async fn list(&self) -> Result<Vec<UserAccount>, Error> {
        Ok(self.load().await?.value)
    }

    async fn find(&self, id: &UserId) -> Result<Option<UserAccount>, Error> {
        Ok(self
            .load()
            .await?
            .value
            .into_iter()
            .find(|user| &user.id == id))
    }

    async fn create(&self, user: NewUser) -> Result<UserAccount, Error> {
        let account = UserAccount {
            id: UserId::random(),
            email: user.email,
            password_hash: hash(&user.password)?,
            role: user.role,
            display_name: user.display_name,
            created_at: self.clock.utc(),
            active: true,
        };
        let created = self
            .mutate(|users| {
                let normalised = account.email.normalised();
                if users.iter().any(|existing| existing.email.matches(&normalised)) {
                    return Err(email_taken(&account.email));
                }
                users.push(account.clone());
                Ok(account.clone())
            })
            .await?;
        tracing::info!(user_id = %created.id, role = %created.role, "user created");
        Ok(created)
    }

    async fn update(&self, id: &UserId, patch: UserPatch) -> Result<UserAccount, Error> {
        let password_hash = patch.password.as_ref().map(hash).transpose()?;
        let updated = self
            .mutate(|users| {
                if let Some(email) = &patch.email {
                    let normalised = email.normalised();
                    if users
                        .iter()
                        .any(|other| &other.id != id && other.email.matches(&normalised))
                    {
                        return Err(email_taken(email));
                    }
                }
                let index = position(users, id)?;
                let user = &mut users[index];
                if let Some(email) = &patch.email {
                    user.email = email.clone();
                }
                if let Some(hash) = &password_hash {
                    user.password_hash = hash.clone();
                }
                if let Some(role) = patch.role {
                    user.role = role;
                }
                if let Some(display_name) = &patch.display_name {
                    user.display_name = display_name.clone();
                }
                if let Some(active) = patch.active {
                    user.active = active;
                }
                Ok(user.clone())
            })
            .await?;
        tracing::info!(user_id = %updated.id, "user updated");
        Ok(updated)
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.mutate(|users| {
            let index = position(users, id)?;
            users.remove(index);
            Ok(())
        })
        .await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn toggle_active(&self, id: &UserId) -> Result<UserAccount, Error> {
        let current = self.find(id).await?.ok_or_else(|| not_found(id))?;
        self.update(id, UserPatch::active(!current.active)).await
    }

    async fn ensure_bootstrap_admin(&self, admin: NewUser) -> Result<bool, Error> {
        if !self.load().await?.value.is_empty() {
            return Ok(false);
        }
        let account = UserAccount {
            id: UserId::random(),
            email: admin.email,
            password_hash: hash(&admin.password)?,
            role: admin.role,
            display_name: admin.display_name,
            created_at: self.clock.utc(),
            active: true,
        };
        let created = self
            .mutate(|users| {
                if !users.is_empty() {
                    return Ok(false);
                }
                users.push(account.clone());
                Ok(true)
            })
            .await?;
        if created {
            tracing::info!(user_id = %account.id, "bootstrap administrator created");
        }
        Ok(created)
    }
}

#[cfg(test)]
#[path = "user_directory_service_tests.rs"]
mod tests;
