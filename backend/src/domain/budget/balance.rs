//! Balance rule: voted revenues must cover voted expenses.

use serde::Serialize;
use utoipa::ToSchema;

use super::BudgetYear;

/// Maximum absolute gap, in dinars, still considered balanced.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// Outcome of a balance check. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    #[schema(value_type = i32, example = 2024)]
    pub year: BudgetYear,
    pub balanced: bool,
    pub total_revenue: f64,
    pub total_expense: f64,
    #[schema(example = "Équilibre respecté")]
    pub message: String,
}

impl BalanceReport {
    pub(super) fn compute(year: BudgetYear, total_revenue: f64, total_expense: f64) -> Self {
        let balanced = (total_revenue - total_expense).abs() <= BALANCE_TOLERANCE;
        let message = if balanced {
            "Équilibre respecté".to_owned()
        } else {
            format!(
                "Équilibre non respecté pour {year}: Recettes = {total_revenue:.2} DT, Dépenses = {total_expense:.2} DT"
            )
        };
        Self {
            year,
            balanced,
            total_revenue,
            total_expense,
            message,
        }
    }
}
