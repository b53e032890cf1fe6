//! Municipality registry service implementing [`MunicipalityRegistry`].
//!
//! Owners are checked against the user collection before each write, and
//! deleting a municipality also drops its ledger.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    LedgerRepository, MunicipalityRegistry, MunicipalityRepository, UserRepository, Versioned,
};
use crate::domain::versioned_write::{
    MAX_WRITE_ATTEMPTS, exhausted, map_repository_error, retry_after,
};
use crate::domain::{Error, Municipality, MunicipalityId, MunicipalityPatch, NewMunicipality, UserId};

const COLLECTION: &str = "municipalities";

/// Registry backed by municipality, user and ledger repositories.
#[derive(Clone)]
pub struct MunicipalityService<M, U, L> {
    municipalities: Arc<M>,
    users: Arc<U>,
    ledgers: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<M, U, L> MunicipalityService<M, U, L> {
    pub fn new(
        municipalities: Arc<M>,
        users: Arc<U>,
        ledgers: Arc<L>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            municipalities,
            users,
            ledgers,
            clock,
        }
    }
}

fn not_found(id: &MunicipalityId) -> Error {
    Error::not_found(format!("municipality {id} not found"))
}

fn ensure_code_free(
    municipalities: &[Municipality],
    code: &str,
    except: Option<&MunicipalityId>,
) -> Result<(), Error> {
    let taken = municipalities
        .iter()
        .filter(|existing| Some(&existing.id) != except)
        .any(|existing| existing.code.eq_ignore_ascii_case(code));
    if taken {
        return Err(Error::conflict(format!(
            "municipality code {code} is already used"
        )));
    }
    Ok(())
}

impl<M, U, L> MunicipalityService<M, U, L>
where
    M: MunicipalityRepository,
    U: UserRepository,
    L: LedgerRepository,
{
    async fn load(&self) -> Result<Versioned<Vec<Municipality>>, Error> {
        self.municipalities
            .load_municipalities()
            .await
            .map_err(|err| map_repository_error(COLLECTION, err))
    }

    async fn ensure_owner_exists(&self, owner: Option<&UserId>) -> Result<(), Error> {
        let Some(owner) = owner else {
            return Ok(());
        };
        let users = self
            .users
            .load_users()
            .await
            .map_err(|err| map_repository_error("users", err))?
            .value;
        if users.iter().any(|user| &user.id == owner) {
            Ok(())
        } else {
            Err(Error::invalid_request(format!("owner {owner} does not exist"))
                .with_details(serde_json::json!({ "field": "owner" })))
        }
    }

    async fn mutate<T, F>(&self, mut apply: F) -> Result<T, Error>
    where
        F: FnMut(&mut Vec<Municipality>) -> Result<T, Error> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Versioned { mut value, version } = self.load().await?;
            let outcome = apply(&mut value)?;
            match self
                .municipalities
                .save_municipalities(&value, version)
                .await
            {
                Ok(()) => return Ok(outcome),
                Err(err) => retry_after(COLLECTION, attempt, err)?,
            }
        }
        Err(exhausted(COLLECTION))
    }
}

#[async_trait]
impl<M, U, L> MunicipalityRegistry for MunicipalityService<M, U, L>
where
    M: MunicipalityRepository,
    U: UserRepository,
    L: LedgerRepository,
{
    async fn list_all(&self) -> Result<Vec<Municipality>, Error> {
        Ok(self.load().await?.value)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Municipality>, Error> {
        let mut all = self.load().await?.value;
        all.retain(|municipality| municipality.owner.as_ref() == Some(owner));
        Ok(all)
    }

    async fn find(&self, id: &MunicipalityId) -> Result<Option<Municipality>, Error> {
        Ok(self
            .load()
            .await?
            .value
            .into_iter()
            .find(|municipality| &municipality.id == id))
    }

    async fn create(&self, input: NewMunicipality) -> Result<Municipality, Error> {
        self.ensure_owner_exists(input.owner()).await?;
        let municipality = input.into_municipality(self.clock.utc());
        let created = self
            .mutate(|all| {
                ensure_code_free(all, &municipality.code, None)?;
                all.push(municipality.clone());
                Ok(municipality.clone())
            })
            .await?;
        tracing::info!(municipality_id = %created.id, code = %created.code, "municipality created");
        Ok(created)
    }

    async fn update(
        &self,
        id: &MunicipalityId,
        patch: MunicipalityPatch,
    ) -> Result<Municipality, Error> {
        if let Some(owner) = patch.owner() {
            self.ensure_owner_exists(owner).await?;
        }
        let now = self.clock.utc();
        let updated = self
            .mutate(|all| {
                if let Some(code) = patch.code() {
                    ensure_code_free(all, code, Some(id))?;
                }
                let target = all
                    .iter_mut()
                    .find(|municipality| &municipality.id == id)
                    .ok_or_else(|| not_found(id))?;
                patch.clone().apply(target, now);
                Ok(target.clone())
            })
            .await?;
        tracing::info!(municipality_id = %updated.id, "municipality updated");
        Ok(updated)
    }

    async fn delete(&self, id: &MunicipalityId) -> Result<(), Error> {
        self.mutate(|all| {
            let index = all
                .iter()
                .position(|municipality| &municipality.id == id)
                .ok_or_else(|| not_found(id))?;
            all.remove(index);
            Ok(())
        })
        .await?;
        self.ledgers
            .delete_ledger(id)
            .await
            .map_err(|err| map_repository_error("budget ledgers", err))?;
        tracing::info!(municipality_id = %id, "municipality deleted with its ledger");
        Ok(())
    }
}

#[cfg(test)]
#[path = "municipality_service_tests.rs"]
mod tests;
