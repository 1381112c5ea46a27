mod allocation;
mod balance;
mod generator;
pub mod money;

pub use allocation::{allocate, Allocation, Unit};
pub use balance::{current_balance, ReportTotals};
pub use generator::{
    generate_statement, layout_statement, output_file_name, GeneratedStatement, MEDIA_TYPE,
};
pub use money::{
    format_money, is_negative_amount, parse_amounts, ExtraItemBlock, ParsedAmounts,
};

use serde::Serialize;

use crate::config::{Identification, StatementInput};

/// One fixed recurring expense (utility bills and the like)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseLine {
    pub name: String,
    pub value: f64,
}

/// Every computed figure of one monthly statement
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    pub identification: Identification,
    pub signer: String,
    pub allocation: Allocation,
    pub expenses: Vec<ExpenseLine>,
    pub extra_expenses: ExtraItemBlock,
    pub extra_income: ExtraItemBlock,
    pub totals: ReportTotals,
}

impl Statement {
    /// Run the money parser, the allocation and the balance over one input
    pub fn compute(input: &StatementInput) -> Self {
        let expenses: Vec<ExpenseLine> = input
            .expenses
            .iter()
            .map(|e| ExpenseLine {
                name: e.name.clone(),
                value: e.value,
            })
            .collect();
        let total_fixed_expenses: f64 = expenses.iter().map(|e| e.value).sum();

        let extra_expenses = ExtraItemBlock::from_text(&input.extra_expenses);
        let extra_income = ExtraItemBlock::from_text(&input.extra_income);

        let allocation = allocate(total_fixed_expenses, &input.units);

        let totals = ReportTotals {
            prior_balance: input.prior_balance,
            subtotal_rateio: allocation.subtotal_rateio,
            subtotal_taxa: allocation.subtotal_taxa,
            subtotal_caixa: allocation.subtotal_caixa,
            total_fixed_expenses,
            extra_income_total: extra_income.total,
            extra_expense_total: extra_expenses.total,
            current_balance: current_balance(
                input.prior_balance,
                allocation.subtotal_taxa,
                extra_income.total,
                total_fixed_expenses,
                extra_expenses.total,
            ),
        };

        Self {
            identification: input.identification.clone(),
            signer: input.signer.trim().to_string(),
            allocation,
            expenses,
            extra_expenses,
            extra_income,
            totals,
        }
    }
}
