//! Municipality registry data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Validation errors raised while constructing municipality values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MunicipalityValidationError {
    InvalidId,
    EmptyName,
    EmptyCode,
    EmptyRegion,
}

impl fmt::Display for MunicipalityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "municipality id must be a valid UUID"),
            Self::EmptyName => write!(f, "municipality name must not be empty"),
            Self::EmptyCode => write!(f, "municipality code must not be empty"),
            Self::EmptyRegion => write!(f, "governorate must not be empty"),
        }
    }
}

impl std::error::Error for MunicipalityValidationError {}

/// Stable municipality identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MunicipalityId(Uuid);

impl MunicipalityId {
    /// Parse an identifier from its hyphenated UUID form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, MunicipalityValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| MunicipalityValidationError::InvalidId)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for MunicipalityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for MunicipalityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MunicipalityId> for String {
    fn from(value: MunicipalityId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for MunicipalityId {
    type Error = MunicipalityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A municipality whose budget is tracked by the portal.
///
/// ## Invariants
/// - `code` is unique across the registry, trimmed and non-empty.
/// - `owner`, when set, references an existing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Municipality {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: MunicipalityId,
    #[schema(example = "Tunis")]
    pub name: String,
    #[schema(example = "1000")]
    pub code: String,
    /// Governorate.
    #[schema(example = "Tunis")]
    pub region: String,
    /// Delegation within the governorate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_region: Option<String>,
    /// Employee assigned to enter the budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn required(raw: &str, err: MunicipalityValidationError) -> Result<String, MunicipalityValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(err)
    } else {
        Ok(trimmed.to_owned())
    }
}

fn optional(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Validated input for registering a municipality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMunicipality {
    name: String,
    code: String,
    region: String,
    sub_region: Option<String>,
    owner: Option<UserId>,
}

impl NewMunicipality {
    /// Trim and validate the raw registration fields.
    ///
    /// # Examples
    /// ```
    /// use budget_portal::domain::NewMunicipality;
    ///
    /// let input = NewMunicipality::try_new(" Sfax ", "3000", "Sfax", Some(" ".into()), None)
    ///     .expect("valid input");
    /// assert_eq!(input.name(), "Sfax");
    /// assert_eq!(input.sub_region(), None);
    /// ```
    pub fn try_new(
        name: &str,
        code: &str,
        region: &str,
        sub_region: Option<String>,
        owner: Option<UserId>,
    ) -> Result<Self, MunicipalityValidationError> {
        Ok(Self {
            name: required(name, MunicipalityValidationError::EmptyName)?,
            code: required(code, MunicipalityValidationError::EmptyCode)?,
            region: required(region, MunicipalityValidationError::EmptyRegion)?,
            sub_region: optional(sub_region),
            owner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn sub_region(&self) -> Option<&str> {
        self.sub_region.as_deref()
    }

    pub fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    /// Materialise the record with a fresh identifier.
    pub fn into_municipality(self, now: DateTime<Utc>) -> Municipality {
        Municipality {
            id: MunicipalityId::random(),
            name: self.name,
            code: self.code,
            region: self.region,
            sub_region: self.sub_region,
            owner: self.owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a municipality.
///
/// Outer `None` leaves a field untouched. For the optional fields an inner
/// `None` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MunicipalityPatch {
    name: Option<String>,
    code: Option<String>,
    region: Option<String>,
    sub_region: Option<Option<String>>,
    owner: Option<Option<UserId>>,
}

impl MunicipalityPatch {
    /// Trim and validate the supplied fields.
    pub fn try_new(
        name: Option<&str>,
        code: Option<&str>,
        region: Option<&str>,
        sub_region: Option<Option<String>>,
        owner: Option<Option<UserId>>,
    ) -> Result<Self, MunicipalityValidationError> {
        Ok(Self {
            name: name
                .map(|value| required(value, MunicipalityValidationError::EmptyName))
                .transpose()?,
            code: code
                .map(|value| required(value, MunicipalityValidationError::EmptyCode))
                .transpose()?,
            region: region
                .map(|value| required(value, MunicipalityValidationError::EmptyRegion))
                .transpose()?,
            sub_region: sub_region.map(optional),
            owner,
        })
    }

    /// Code the patch would assign, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Owner the patch would assign; `Some(None)` clears the owner.
    pub fn owner(&self) -> Option<Option<&UserId>> {
        self.owner.as_ref().map(Option::as_ref)
    }

    /// Apply the patch in place and bump `updated_at`.
    pub fn apply(self, target: &mut Municipality, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            target.name = name;
        }
        if let Some(code) = self.code {
            target.code = code;
        }
        if let Some(region) = self.region {
            target.region = region;
        }
        if let Some(sub_region) = self.sub_region {
            target.sub_region = sub_region;
        }
        if let Some(owner) = self.owner {
            target.owner = owner;
        }
        target.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tunis() -> Municipality {
        NewMunicipality::try_new("Tunis", "1000", "Tunis", Some("Bab Bhar".into()), None)
            .expect("valid input")
            .into_municipality(DateTime::<Utc>::UNIX_EPOCH)
    }

    #[rstest]
    #[case("", "1000", "Tunis", MunicipalityValidationError::EmptyName)]
    #[case("Tunis", "  ", "Tunis", MunicipalityValidationError::EmptyCode)]
    #[case("Tunis", "1000", "", MunicipalityValidationError::EmptyRegion)]
    fn new_rejects_blank_required_fields(
        #[case] name: &str,
        #[case] code: &str,
        #[case] region: &str,
        #[case] expected: MunicipalityValidationError,
    ) {
        let err = NewMunicipality::try_new(name, code, region, None, None)
            .expect_err("blank field must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn new_trims_code(tunis: Municipality) {
        let input = NewMunicipality::try_new("Tunis", " 1000 ", "Tunis", None, None)
            .expect("valid input");
        assert_eq!(input.code(), "1000");
        assert_eq!(tunis.code, "1000");
    }

    #[rstest]
    fn patch_clears_optional_fields(mut tunis: Municipality) {
        tunis.owner = Some(UserId::random());
        let later = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(60);
        let patch = MunicipalityPatch::try_new(None, None, None, Some(None), Some(None))
            .expect("valid patch");
        patch.apply(&mut tunis, later);
        assert_eq!(tunis.sub_region, None);
        assert_eq!(tunis.owner, None);
        assert_eq!(tunis.updated_at, later);
        assert_eq!(tunis.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[rstest]
    fn patch_leaves_untouched_fields(mut tunis: Municipality) {
        let patch = MunicipalityPatch::try_new(Some("Tunis Ville"), None, None, None, None)
            .expect("valid patch");
        patch.apply(&mut tunis, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(tunis.name, "Tunis Ville");
        assert_eq!(tunis.sub_region.as_deref(), Some("Bab Bhar"));
    }

    #[rstest]
    fn patch_rejects_blank_code() {
        let err = MunicipalityPatch::try_new(None, Some(" "), None, None, None)
            .expect_err("blank code must fail");
        assert_eq!(err, MunicipalityValidationError::EmptyCode);
    }

    #[rstest]
    fn serialisation_omits_absent_optionals(tunis: Municipality) {
        let mut value = serde_json::to_value(&tunis).expect("serialise");
        assert_eq!(value["subRegion"], "Bab Bhar");
        assert!(value.get("owner").is_none());
        value["owner"] = serde_json::Value::Null;
        let back: Municipality = serde_json::from_value(value).expect("deserialise");
        assert_eq!(back, tunis);
    }
}
