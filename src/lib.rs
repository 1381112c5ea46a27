pub mod config;
pub mod error;
pub mod pdf;
pub mod report;
pub mod statement;

pub use config::{Config, ExpenseInput, Identification, StatementInput, UnitInput};
pub use error::{PrestacaoError, Result};
pub use report::{build_report, ReportDocument};
pub use statement::{generate_statement, Allocation, ReportTotals, Statement, Unit};
