//! Deterministic demonstration data for fresh installations.
//!
//! Seeds four employees, six municipalities (four of them assigned), nine
//! years of figures for every rubric and three future events per
//! municipality. Amounts come from a fixed-seed [`SmallRng`], so two runs
//! with the same seed produce the same ledgers. Seeding is skipped once any
//! municipality exists.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::budget::{BudgetKind, FutureEventDraft, Rubric};
use crate::domain::interchange::LedgerRow;
use crate::domain::ports::{
    BudgetLedgerCommand, LedgerInterchange, MunicipalityRegistry, UserDirectory,
};
use crate::domain::{
    DisplayName, EmailAddress, Error, Municipality, MunicipalityPatch, NewMunicipality, NewUser,
    Password, Role, UserId,
};

/// Seed used when none is configured.
pub const DEFAULT_DEMO_SEED: u64 = 2018;

const DEMO_YEARS: std::ops::RangeInclusive<i64> = 2018..=2026;

struct DemoEmployee {
    email: &'static str,
    password: &'static str,
    name: &'static str,
}

const EMPLOYEES: [DemoEmployee; 4] = [
    DemoEmployee {
        email: "receveur.tunis@municipalite.tn",
        password: "receveur123",
        name: "Ahmed Ben Ali",
    },
    DemoEmployee {
        email: "financier.sfax@municipalite.tn",
        password: "financier123",
        name: "Fatma Trabelsi",
    },
    DemoEmployee {
        email: "agent.sousse@municipalite.tn",
        password: "agent123",
        name: "Mohamed Hammami",
    },
    DemoEmployee {
        email: "comptable.bizerte@municipalite.tn",
        password: "comptable123",
        name: "Salma Khelifi",
    },
];

/// `(name, code, governorate, delegation)`
const MUNICIPALITIES: [(&str, &str, &str, &str); 6] = [
    ("Tunis", "1000", "Tunis", "Tunis Centre"),
    ("Sfax", "3000", "Sfax", "Sfax Ville"),
    ("Sousse", "4000", "Sousse", "Sousse Médina"),
    ("Bizerte", "7000", "Bizerte", "Bizerte Nord"),
    ("Gabès", "6000", "Gabès", "Gabès Centre"),
    ("Kairouan", "3100", "Kairouan", "Kairouan Médina"),
];

/// `(year, description, impact, rubric)`
const EVENTS: [(i64, &str, f64, &str); 3] = [
    (
        2026,
        "Recrutement de 5 agents administratifs et 3 techniciens",
        450_000.0,
        "D1",
    ),
    (
        2026,
        "Projet d'aménagement de la place centrale",
        1_200_000.0,
        "D5",
    ),
    (2027, "Augmentation des recettes fiscales prévue", 800_000.0, "R1"),
];

/// What a seeding run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSeedSummary {
    pub employees: usize,
    pub municipalities: usize,
    pub ledger_rows: usize,
    pub events: usize,
}

/// Populates an empty registry through the driving ports.
#[derive(Clone)]
pub struct DemoDataSeeder {
    users: Arc<dyn UserDirectory>,
    municipalities: Arc<dyn MunicipalityRegistry>,
    ledger: Arc<dyn BudgetLedgerCommand>,
    interchange: Arc<dyn LedgerInterchange>,
    seed: u64,
}

fn invalid(what: &str, err: impl std::fmt::Display) -> Error {
    Error::internal(format!("demo {what} is invalid: {err}"))
}

/// Figures of one municipality; amounts grow 5% a year from a per-town base.
fn ledger_rows(rng: &mut SmallRng, index: usize) -> Vec<LedgerRow> {
    let base = 1_000_000.0 + index as f64 * 200_000.0;
    let mut rows = Vec::new();
    for kind in [BudgetKind::Revenue, BudgetKind::Expense] {
        let (offset, step, floor) = match kind {
            BudgetKind::Revenue => (0.5, 0.1, 0.85),
            BudgetKind::Expense => (0.4, 0.12, 0.88),
        };
        for (position, rubric) in Rubric::of_kind(kind).enumerate() {
            for year in DEMO_YEARS {
                let growth = 1.0 + (year - 2018) as f64 * 0.05;
                let planned = base * (offset + position as f64 * step) * growth;
                let voted = (planned * rng.gen_range(0.95..1.05)).round();
                let actual = (voted * rng.gen_range(floor..1.0)).round();
                rows.push(LedgerRow::from_parts(year, rubric, voted, actual));
            }
        }
    }
    rows
}

impl DemoDataSeeder {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        municipalities: Arc<dyn MunicipalityRegistry>,
        ledger: Arc<dyn BudgetLedgerCommand>,
        interchange: Arc<dyn LedgerInterchange>,
    ) -> Self {
        Self {
            users,
            municipalities,
            ledger,
            interchange,
            seed: DEFAULT_DEMO_SEED,
        }
    }

    /// Override the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seed the demonstration data unless municipalities already exist.
    ///
    /// Returns `None` when seeding was skipped.
    pub async fn seed(&self) -> Result<Option<DemoSeedSummary>, Error> {
        if !self.municipalities.list_all().await?.is_empty() {
            tracing::info!("municipalities already present, skipping demo data");
            return Ok(None);
        }
        let mut summary = DemoSeedSummary::default();
        let owners = self.ensure_employees(&mut summary).await?;
        let mut rng = SmallRng::seed_from_u64(self.seed);

        for (index, (name, code, region, delegation)) in MUNICIPALITIES.iter().enumerate() {
            let municipality = self
                .create_municipality(name, code, region, delegation, owners.get(index))
                .await?;
            summary.municipalities += 1;

            let rows = ledger_rows(&mut rng, index);
            let report = self.interchange.from_rows(&municipality.id, rows).await?;
            summary.ledger_rows += report.imported;

            for (year, description, impact, rubric) in EVENTS {
                let rubric: Rubric = rubric.parse().map_err(|err| invalid("rubric", err))?;
                let draft = FutureEventDraft::try_new(year, description, impact, rubric, None)
                    .map_err(|err| invalid("event", err))?;
                self.ledger.add_future_event(&municipality.id, draft).await?;
                summary.events += 1;
            }
        }
        tracing::info!(
            employees = summary.employees,
            municipalities = summary.municipalities,
            ledger_rows = summary.ledger_rows,
            events = summary.events,
            "demo data seeded"
        );
        Ok(Some(summary))
    }

    async fn ensure_employees(&self, summary: &mut DemoSeedSummary) -> Result<Vec<UserId>, Error> {
        let existing = self.users.list().await?;
        let mut ids = Vec::with_capacity(EMPLOYEES.len());
        for employee in &EMPLOYEES {
            if let Some(found) = existing.iter().find(|user| user.email.matches(employee.email)) {
                ids.push(found.id.clone());
                continue;
            }
            let user = NewUser {
                email: EmailAddress::new(employee.email).map_err(|err| invalid("email", err))?,
                password: Password::new(employee.password).map_err(|err| invalid("password", err))?,
                role: Role::Employee,
                display_name: DisplayName::new(employee.name).map_err(|err| invalid("name", err))?,
            };
            ids.push(self.users.create(user).await?.id);
            summary.employees += 1;
        }
        Ok(ids)
    }

    async fn create_municipality(
        &self,
        name: &str,
        code: &str,
        region: &str,
        delegation: &str,
        owner: Option<&UserId>,
    ) -> Result<Municipality, Error> {
        let input = NewMunicipality::try_new(name, code, region, Some(delegation.to_owned()), None)
            .map_err(|err| invalid("municipality", err))?;
        let created = self.municipalities.create(input).await?;
        let Some(owner) = owner else {
            return Ok(created);
        };
        let patch = MunicipalityPatch::try_new(None, None, None, None, Some(Some(owner.clone())))
            .map_err(|err| invalid("assignment", err))?;
        self.municipalities.update(&created.id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockBudgetLedgerCommand, MockLedgerInterchange, MockMunicipalityRegistry, MockUserDirectory};
    use crate::domain::interchange::ImportReport;
    use rstest::rstest;

    #[rstest]
    fn generated_rows_are_deterministic_and_valid() {
        let first = ledger_rows(&mut SmallRng::seed_from_u64(7), 2);
        let second = ledger_rows(&mut SmallRng::seed_from_u64(7), 2);
        assert_eq!(first, second);
        assert_eq!(first.len(), 23 * 9);
        for row in &first {
            let (_, entry) = row.validate().expect("generated rows validate");
            assert!(entry.actual.get() <= entry.voted.get());
        }
    }

    #[rstest]
    #[tokio::test]
    async fn seeding_is_skipped_when_municipalities_exist() {
        let mut registry = MockMunicipalityRegistry::new();
        registry.expect_list_all().returning(|| {
            let existing = NewMunicipality::try_new("Tunis", "1000", "Tunis", None, None)
                .expect("valid input")
                .into_municipality(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
            Ok(vec![existing])
        });
        registry.expect_create().never();
        let mut users = MockUserDirectory::new();
        users.expect_create().never();

        let seeder = DemoDataSeeder::new(
            Arc::new(users),
            Arc::new(registry),
            Arc::new(MockBudgetLedgerCommand::new()),
            Arc::new(MockLedgerInterchange::new()),
        );
        assert_eq!(seeder.seed().await.expect("seed"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_installation_is_fully_seeded() {
        let mut registry = MockMunicipalityRegistry::new();
        registry.expect_list_all().returning(|| Ok(Vec::new()));
        registry.expect_create().times(6).returning(|input| {
            Ok(input.into_municipality(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH))
        });
        registry.expect_update().times(4).returning(|id, patch| {
            let mut municipality = NewMunicipality::try_new("x", "x", "x", None, None)
                .expect("valid input")
                .into_municipality(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
            municipality.id = id.clone();
            patch.apply(&mut municipality, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
            Ok(municipality)
        });

        let mut users = MockUserDirectory::new();
        users.expect_list().returning(|| Ok(Vec::new()));
        users.expect_create().times(4).returning(|user| {
            Ok(crate::domain::UserAccount {
                id: UserId::random(),
                email: user.email,
                password_hash: serde_json::from_value(serde_json::json!("$argon2id$x"))
                    .expect("stored hash"),
                role: user.role,
                display_name: user.display_name,
                created_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
                active: true,
            })
        });

        let mut interchange = MockLedgerInterchange::new();
        interchange.expect_from_rows().times(6).returning(|_, rows| {
            Ok(ImportReport {
                imported: rows.len(),
                skipped: Vec::new(),
            })
        });
        let mut ledger = MockBudgetLedgerCommand::new();
        ledger
            .expect_add_future_event()
            .times(18)
            .returning(|_, draft| Ok(draft.into_event(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)));

        let seeder = DemoDataSeeder::new(
            Arc::new(users),
            Arc::new(registry),
            Arc::new(ledger),
            Arc::new(interchange),
        );
        let summary = seeder.seed().await.expect("seed").expect("seeded");
        assert_eq!(
            summary,
            DemoSeedSummary {
                employees: 4,
                municipalities: 6,
                ledger_rows: 6 * 23 * 9,
                events: 18,
            }
        );
    }
}
