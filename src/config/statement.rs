use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{PrestacaoError, Result};

const DEFAULT_UNITS: [&str; 6] = ["101", "102", "201", "202", "301", "302"];
const DEFAULT_EXPENSES: [&str; 2] = ["CELPE", "COMPESA"];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan.", "fev.", "mar.", "abr.", "mai.", "jun.", "jul.", "ago.", "set.", "out.", "nov.",
    "dez.",
];

/// Everything one statement generation needs, read from the statement file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatementInput {
    #[serde(default)]
    pub identification: Identification,
    #[serde(default)]
    pub prior_balance: f64,
    /// Name printed above the signature line
    #[serde(default)]
    pub signer: String,
    #[serde(default = "default_units")]
    pub units: Vec<UnitInput>,
    #[serde(default = "default_expenses")]
    pub expenses: Vec<ExpenseInput>,
    /// Free text such as "Lâmpada R$ 20,00; Válvula R$ 75,60"
    #[serde(default)]
    pub extra_expenses: String,
    /// Free text such as "Multa R$ 50,00; Juros R$ 20,00"
    #[serde(default)]
    pub extra_income: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Identification {
    #[serde(default = "default_quadra")]
    pub quadra: String,
    #[serde(default = "default_bloco")]
    pub bloco: String,
    /// Month/year label, e.g. "nov./25"
    #[serde(default = "current_period")]
    pub period: String,
}

impl Default for Identification {
    fn default() -> Self {
        Self {
            quadra: default_quadra(),
            bloco: default_bloco(),
            period: current_period(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UnitInput {
    pub id: String,
    #[serde(default = "default_true")]
    pub occupied: bool,
    /// Contribution collected from the unit; ignored for vacant units
    #[serde(default)]
    pub taxa: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpenseInput {
    pub name: String,
    #[serde(default)]
    pub value: f64,
}

impl Default for StatementInput {
    fn default() -> Self {
        Self {
            identification: Identification::default(),
            prior_balance: 0.0,
            signer: String::new(),
            units: default_units(),
            expenses: default_expenses(),
            extra_expenses: String::new(),
            extra_income: String::new(),
        }
    }
}

impl StatementInput {
    /// Reject unit lists and amounts no statement can contain
    pub fn validate(&self) -> Result<()> {
        if self.units.is_empty() {
            return Err(PrestacaoError::NoUnits);
        }

        let mut seen = HashSet::new();
        for unit in &self.units {
            if !seen.insert(unit.id.as_str()) {
                return Err(PrestacaoError::DuplicateUnit(unit.id.clone()));
            }
            if unit.occupied {
                check_amount(&format!("taxa of unit {}", unit.id), unit.taxa)?;
            }
        }

        check_amount("prior_balance", self.prior_balance)?;
        for expense in &self.expenses {
            check_amount(&format!("expense {}", expense.name), expense.value)?;
        }

        Ok(())
    }
}

fn check_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PrestacaoError::InvalidAmount {
            field: field.to_string(),
            value,
            reason: "must be a number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(PrestacaoError::InvalidAmount {
            field: field.to_string(),
            value,
            reason: "must not be negative".to_string(),
        });
    }
    Ok(())
}

/// Format a date as the month/year label used on the statement ("nov./25")
pub fn period_label(date: NaiveDate) -> String {
    format!(
        "{}/{:02}",
        MONTH_ABBREVIATIONS[date.month0() as usize],
        date.year() % 100
    )
}

fn current_period() -> String {
    period_label(Local::now().date_naive())
}

fn default_quadra() -> String {
    "C".to_string()
}

fn default_bloco() -> String {
    "11A".to_string()
}

fn default_true() -> bool {
    true
}

fn default_units() -> Vec<UnitInput> {
    DEFAULT_UNITS
        .iter()
        .map(|id| UnitInput {
            id: id.to_string(),
            occupied: true,
            taxa: 0.0,
        })
        .collect()
}

fn default_expenses() -> Vec<ExpenseInput> {
    DEFAULT_EXPENSES
        .iter()
        .map(|name| ExpenseInput {
            name: name.to_string(),
            value: 0.0,
        })
        .collect()
}
