mod settings;
mod statement;

pub use settings::{Condominium, Config, PdfSettings, ReportSettings};
pub use statement::{period_label, ExpenseInput, Identification, StatementInput, UnitInput};

use crate::error::{PrestacaoError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Get the config directory path (XDG config dir, or ~/.prestacao/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "prestacao") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        PrestacaoError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".prestacao"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured path: `~` expanded, relative paths anchored at the config dir
pub fn resolve_path(path: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

/// Default location of the statement file inside the config dir
pub fn default_statement_file(config_dir: &Path) -> PathBuf {
    config_dir.join("statement.toml")
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(PrestacaoError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let config: Config =
        toml::from_str(&content).map_err(|e| PrestacaoError::ConfigParse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// `config.toml` from the config dir, or the defaults when there is none.
/// A file that exists but does not parse or validate is still an error.
pub fn load_config_or_default(config_dir: &Path) -> Result<Config> {
    if config_dir.join("config.toml").exists() {
        load_config(config_dir)
    } else {
        info!("No config.toml in {}, using defaults", config_dir.display());
        Ok(Config::default())
    }
}

/// Load and validate a statement file
pub fn load_statement(path: &Path) -> Result<StatementInput> {
    if !path.exists() {
        return Err(PrestacaoError::StatementNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let input: StatementInput =
        toml::from_str(&content).map_err(|e| PrestacaoError::StatementParse {
            path: path.to_path_buf(),
            source: e,
        })?;
    input.validate()?;
    Ok(input)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[condominium]
# name = "Residencial Jardim das Flores"   # optional, printed under the title

[report]
title = "Prestação de Contas"
currency_symbol = "R$"

[pdf]
output_dir = "output"          # relative paths are resolved against this directory
# watermark = "fab.png"        # optional PNG/JPEG drawn behind every page
watermark_opacity = 0.4
watermark_scale = 0.6          # fraction of the page width
typst_bin = "typst"
"#;

/// Template content for statement.toml
pub const STATEMENT_TEMPLATE: &str = r#"# One statement per month. Edit the values and run:
#   prestacao generate

prior_balance = 0.0
signer = ""

# Free text; every amount like 20,00 or 20.00 is summed
extra_expenses = ""            # e.g. "Lâmpada R$ 20,00; Válvula R$ 75,60"
extra_income = ""              # e.g. "Multa R$ 50,00; Juros R$ 20,00"

[identification]
quadra = "C"
bloco = "11A"
period = "nov./25"

[[units]]
id = "101"
occupied = true
taxa = 0.0

[[units]]
id = "102"
occupied = true
taxa = 0.0

[[units]]
id = "201"
occupied = true
taxa = 0.0

[[units]]
id = "202"
occupied = true
taxa = 0.0

[[units]]
id = "301"
occupied = true
taxa = 0.0

[[units]]
id = "302"
occupied = true
taxa = 0.0

[[expenses]]
name = "CELPE"
value = 0.0

[[expenses]]
name = "COMPESA"
value = 0.0
"#;
