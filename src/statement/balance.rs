use serde::Serialize;

use super::money::is_negative_amount;

/// Every aggregate printed on the statement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportTotals {
    pub prior_balance: f64,
    pub subtotal_rateio: f64,
    pub subtotal_taxa: f64,
    pub subtotal_caixa: f64,
    pub total_fixed_expenses: f64,
    pub extra_income_total: f64,
    pub extra_expense_total: f64,
    pub current_balance: f64,
}

impl ReportTotals {
    /// A negative balance is a valid outcome, printed in the warning colour
    pub fn is_deficit(&self) -> bool {
        is_negative_amount(self.current_balance)
    }
}

/// prior + taxa + extra income - fixed expenses - extra expenses, unrounded
pub fn current_balance(
    prior_balance: f64,
    subtotal_taxa: f64,
    extra_income_total: f64,
    total_fixed_expenses: f64,
    extra_expense_total: f64,
) -> f64 {
    prior_balance + subtotal_taxa + extra_income_total - total_fixed_expenses - extra_expense_total
}
