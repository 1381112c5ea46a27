use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use prestacao::config::{
    config_dir, default_statement_file, load_config_or_default, load_statement, CONFIG_TEMPLATE,
    STATEMENT_TEMPLATE,
};
use prestacao::error::{PrestacaoError, Result};
use prestacao::pdf::WatermarkOutcome;
use prestacao::statement::{format_money, generate_statement, Statement};

#[derive(Parser)]
#[command(name = "prestacao")]
#[command(version, about = "Monthly condominium statement generator", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.prestacao)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Compute the statement and render it as a PDF
    Generate {
        /// Statement file (default: <config dir>/statement.toml)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Custom output file path (default: output_dir/Prestacao_Contas_<bloco>_<period>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Print the computed statement without rendering a PDF
    Summary {
        /// Statement file (default: <config dir>/statement.toml)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print the computed statement as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("prestacao={}", cli.log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Generate {
            input,
            output,
            open,
        } => cmd_generate(&cfg_dir, input, output, open),
        Commands::Summary { input, json } => cmd_summary(&cfg_dir, input, json),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(PrestacaoError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;

    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(default_statement_file(cfg_dir), STATEMENT_TEMPLATE)?;

    println!("Initialized prestacao config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set the title and watermark:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Fill in this month's values:  $EDITOR {}/statement.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then check the numbers and generate the PDF:");
    println!("  prestacao summary");
    println!("  prestacao generate --open");

    Ok(())
}

fn cmd_generate(
    cfg_dir: &Path,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let input = input.unwrap_or_else(|| default_statement_file(cfg_dir));
    let config = load_config_or_default(cfg_dir)?;
    let symbol = config.report.currency_symbol.as_str();

    let generated = generate_statement(&config, cfg_dir, &input, output)?;
    let totals = &generated.statement.totals;
    let id = &generated.statement.identification;

    println!("Generated statement for Bloco {} ({})", id.bloco, id.period);
    println!(
        "  Balance:   {}{}",
        format_money(totals.current_balance, symbol),
        if totals.is_deficit() { " (deficit)" } else { "" }
    );
    println!("  Pages:     {}", generated.pages);
    match &generated.watermark {
        WatermarkOutcome::Applied(_) => println!("  Watermark: applied"),
        WatermarkOutcome::Skipped { reason } => println!("  Watermark: skipped ({reason})"),
    }
    println!("  Saved:     {}", generated.path.display());

    if open {
        open_path(&generated.path)?;
    }

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "APTO")]
    id: String,
    #[tabled(rename = "RATEIO")]
    rateio: String,
    #[tabled(rename = "TAXA")]
    taxa: String,
    #[tabled(rename = "CAIXA")]
    caixa: String,
}

#[derive(Tabled)]
struct AmountRow {
    #[tabled(rename = "ITEM")]
    label: String,
    #[tabled(rename = "VALOR")]
    value: String,
}

/// Print the computed statement as terminal tables or JSON
fn cmd_summary(cfg_dir: &Path, input: Option<PathBuf>, json: bool) -> Result<()> {
    let input = input.unwrap_or_else(|| default_statement_file(cfg_dir));
    let config = load_config_or_default(cfg_dir)?;
    let statement = Statement::compute(&load_statement(&input)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&statement)?);
        return Ok(());
    }

    let symbol = config.report.currency_symbol.as_str();
    let money = |value: f64| format_money(value, symbol);
    let id = &statement.identification;
    let totals = &statement.totals;

    println!(
        "Quadra {} | Bloco {} | Mês/Ano {}",
        id.quadra, id.bloco, id.period
    );
    println!();

    let mut units: Vec<UnitRow> = statement
        .allocation
        .units
        .iter()
        .map(|unit| {
            if unit.occupied {
                UnitRow {
                    id: unit.id.clone(),
                    rateio: money(unit.rateio),
                    taxa: money(unit.taxa),
                    caixa: money(unit.caixa),
                }
            } else {
                UnitRow {
                    id: unit.id.clone(),
                    rateio: "Desocupado".to_string(),
                    taxa: "-".to_string(),
                    caixa: "-".to_string(),
                }
            }
        })
        .collect();
    units.push(UnitRow {
        id: "SUBTOTAL".to_string(),
        rateio: money(totals.subtotal_rateio),
        taxa: money(totals.subtotal_taxa),
        caixa: money(totals.subtotal_caixa),
    });
    let table = Table::new(units).with(Style::rounded()).to_string();
    println!("{table}");

    let mut expenses: Vec<AmountRow> = statement
        .expenses
        .iter()
        .map(|e| AmountRow {
            label: e.name.clone(),
            value: money(e.value),
        })
        .collect();
    expenses.push(AmountRow {
        label: "TOTAL".to_string(),
        value: money(totals.total_fixed_expenses),
    });
    let table = Table::new(expenses).with(Style::rounded()).to_string();
    println!("{table}");

    let summary = vec![
        AmountRow {
            label: "Total Despesas Extras".to_string(),
            value: money(totals.extra_expense_total),
        },
        AmountRow {
            label: "Total Receitas Extras".to_string(),
            value: money(totals.extra_income_total),
        },
        AmountRow {
            label: "Saldo Anterior".to_string(),
            value: money(totals.prior_balance),
        },
        AmountRow {
            label: "Saldo Atual".to_string(),
            value: money(totals.current_balance),
        },
    ];
    let table = Table::new(summary).with(Style::rounded()).to_string();
    println!("{table}");

    println!(
        "Occupied units: {} | Rateio per unit: {}",
        statement.allocation.occupied_count,
        money(statement.allocation.rateio_per_unit)
    );
    if statement.extra_expenses.is_empty() && !statement.extra_expenses.text.is_empty() {
        println!("Note: no amounts found in extra_expenses");
    }
    if statement.extra_income.is_empty() && !statement.extra_income.text.is_empty() {
        println!("Note: no amounts found in extra_income");
    }
    if totals.is_deficit() {
        println!("Warning: current balance is negative");
    }

    Ok(())
}

fn open_path(pdf_path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(pdf_path)
            .spawn()?;
    }
    Ok(())
}
