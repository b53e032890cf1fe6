//! Closed nomenclature of budget rubrics.
//!
//! Revenues are grouped into twelve categories (`R1`..`R12`) and expenses
//! into eleven parts (`D1`..`D11`). Declaration order is the display order
//! and the derived `Ord` follows it, revenues before expenses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::BudgetValidationError;

macro_rules! rubric_codes {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Short code such as `R1` or `D11`.
            pub fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }

            /// Official label of the rubric.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn from_code(code: &str) -> Option<Self> {
                match code {
                    $(stringify!($variant) => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

rubric_codes! {
    /// Revenue category.
    pub enum RevenueCategory {
        R1 => "Recettes fiscales",
        R2 => "Recettes non fiscales",
        R3 => "Recettes de la dette",
        R4 => "Recettes d'exploitation",
        R5 => "Recettes exceptionnelles",
        R6 => "Subventions et dotations",
        R7 => "Emprunts",
        R8 => "Fonds de concours",
        R9 => "Produits des cessions",
        R10 => "Produits financiers",
        R11 => "Autres recettes",
        R12 => "Recettes de régularisation",
    }
}

rubric_codes! {
    /// Expense part.
    pub enum ExpensePart {
        D1 => "Charges de personnel",
        D2 => "Charges de fonctionnement",
        D3 => "Charges d'intérêts",
        D4 => "Subventions et dotations",
        D5 => "Investissements",
        D6 => "Remboursements d'emprunts",
        D7 => "Charges exceptionnelles",
        D8 => "Fonds de concours",
        D9 => "Acquisitions d'immobilisations",
        D10 => "Autres dépenses",
        D11 => "Dépenses de régularisation",
    }
}

/// Side of the budget a rubric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BudgetKind {
    #[serde(rename = "recette")]
    Revenue,
    #[serde(rename = "depense")]
    Expense,
}

impl BudgetKind {
    /// Wire name used by the spreadsheet interchange.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "recette",
            Self::Expense => "depense",
        }
    }
}

impl fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetKind {
    type Err = BudgetValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recette" => Ok(Self::Revenue),
            "depense" | "dépense" => Ok(Self::Expense),
            other => Err(BudgetValidationError::UnknownKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// A budget line: one revenue category or one expense part.
///
/// # Examples
/// ```
/// use budget_portal::domain::budget::{BudgetKind, Rubric};
///
/// let rubric: Rubric = "d3".parse().expect("known rubric");
/// assert_eq!(rubric.code(), "D3");
/// assert_eq!(rubric.kind(), BudgetKind::Expense);
/// assert_eq!(Rubric::all().count(), 23);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rubric {
    Revenue(RevenueCategory),
    Expense(ExpensePart),
}

impl Rubric {
    /// All rubrics: revenue categories then expense parts.
    pub fn all() -> impl Iterator<Item = Self> {
        RevenueCategory::ALL
            .iter()
            .copied()
            .map(Self::Revenue)
            .chain(ExpensePart::ALL.iter().copied().map(Self::Expense))
    }

    /// Rubrics of one budget side, in declaration order.
    pub fn of_kind(kind: BudgetKind) -> impl Iterator<Item = Self> {
        Self::all().filter(move |rubric| rubric.kind() == kind)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Revenue(category) => category.code(),
            Self::Expense(part) => part.code(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Revenue(category) => category.name(),
            Self::Expense(part) => part.name(),
        }
    }

    /// Budget side implied by the rubric.
    pub fn kind(self) -> BudgetKind {
        match self {
            Self::Revenue(_) => BudgetKind::Revenue,
            Self::Expense(_) => BudgetKind::Expense,
        }
    }

    /// Check a caller-declared kind against the rubric.
    pub fn ensure_kind(self, declared: BudgetKind) -> Result<(), BudgetValidationError> {
        if self.kind() == declared {
            Ok(())
        } else {
            Err(BudgetValidationError::KindMismatch {
                rubric: self.code().to_owned(),
                declared: declared.as_str().to_owned(),
            })
        }
    }
}

impl fmt::Display for Rubric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Rubric {
    type Err = BudgetValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim().to_ascii_uppercase();
        RevenueCategory::from_code(&code)
            .map(Self::Revenue)
            .or_else(|| ExpensePart::from_code(&code).map(Self::Expense))
            .ok_or(BudgetValidationError::UnknownRubric { code })
    }
}

impl From<Rubric> for String {
    fn from(value: Rubric) -> Self {
        value.code().to_owned()
    }
}

impl TryFrom<String> for Rubric {
    type Error = BudgetValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
