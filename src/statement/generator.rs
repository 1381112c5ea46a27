use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::Statement;
use crate::config::{load_statement, resolve_path, Config, Identification};
use crate::error::{PrestacaoError, Result};
use crate::pdf::{
    render, FileWatermark, NoWatermark, RenderOptions, RenderedDocument, TypstCompiler,
    WatermarkOutcome, WatermarkSource,
};
use crate::report::build_report;

pub const MEDIA_TYPE: &str = "application/pdf";

/// What one `generate` run produced
#[derive(Debug)]
pub struct GeneratedStatement {
    pub path: PathBuf,
    pub statement: Statement,
    pub pages: usize,
    pub watermark: WatermarkOutcome,
    pub size: usize,
}

/// `Prestacao_Contas_<bloco>_<period>.pdf`, with path-unsafe characters replaced
pub fn output_file_name(identification: &Identification) -> String {
    let bloco = sanitize(&identification.bloco);
    let period = sanitize(&identification.period);
    if period.is_empty() {
        format!("Prestacao_Contas_{bloco}.pdf")
    } else {
        format!("Prestacao_Contas_{bloco}_{period}.pdf")
    }
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| match c {
            '/' => '-',
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
            _ => '_',
        })
        .collect()
}

/// Pick the watermark source the config asks for
fn watermark_source(config: &Config, cfg_dir: &Path) -> Box<dyn WatermarkSource> {
    match &config.pdf.watermark {
        Some(path) => Box::new(FileWatermark {
            path: resolve_path(path, cfg_dir),
            opacity: config.pdf.watermark_opacity,
        }),
        None => Box::new(NoWatermark),
    }
}

/// Lay out a computed statement; no file is written
pub fn layout_statement(
    statement: &Statement,
    config: &Config,
    watermark: &WatermarkOutcome,
) -> RenderedDocument {
    let report = build_report(
        statement,
        &config.report,
        config.condominium.name.as_deref(),
    );
    let options = RenderOptions {
        watermark_scale: config.pdf.watermark_scale,
        generated_on: Some(Local::now().date_naive()),
        ..RenderOptions::default()
    };
    render(&report, watermark, &options)
}

/// Compile the laid-out statement. A watermark the compiler cannot decode
/// is dropped and the document compiled again without it.
fn compile_statement(
    compiler: &TypstCompiler,
    statement: &Statement,
    config: &Config,
    watermark: WatermarkOutcome,
) -> Result<(RenderedDocument, Vec<u8>, WatermarkOutcome)> {
    let document = layout_statement(statement, config, &watermark);

    match compiler.compile(&document) {
        Ok(bytes) => Ok((document, bytes, watermark)),
        Err(PrestacaoError::PdfGeneration(stderr)) if watermark.is_applied() => {
            let reason = format!("watermark rejected by typst: {}", stderr.trim());
            warn!("Skipping watermark: {reason}");

            let watermark = WatermarkOutcome::Skipped { reason };
            let document = layout_statement(statement, config, &watermark);
            let bytes = compiler.compile(&document)?;
            Ok((document, bytes, watermark))
        }
        Err(e) => Err(e),
    }
}

/// Load the statement, compute, render and write the PDF
pub fn generate_statement(
    config: &Config,
    cfg_dir: &Path,
    input_path: &Path,
    output_path: Option<PathBuf>,
) -> Result<GeneratedStatement> {
    let input = load_statement(input_path)?;

    let statement = Statement::compute(&input);
    info!(
        bloco = %statement.identification.bloco,
        period = %statement.identification.period,
        occupied = statement.allocation.occupied_count,
        balance = statement.totals.current_balance,
        "Computed statement"
    );

    let watermark = watermark_source(config, cfg_dir).load();
    let compiler = TypstCompiler::new(config.pdf.typst_bin.clone());

    // Compile fully before touching the destination so a failure leaves no partial file
    let (document, bytes, watermark) =
        compile_statement(&compiler, &statement, config, watermark)?;

    let path = match output_path {
        Some(path) => path,
        None => {
            let output_dir = resolve_path(&config.pdf.output_dir, cfg_dir);
            std::fs::create_dir_all(&output_dir)?;
            output_dir.join(output_file_name(&statement.identification))
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(PrestacaoError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Output directory does not exist: {}", parent.display()),
            )));
        }
    }
    std::fs::write(&path, &bytes)?;
    info!(path = %path.display(), media_type = MEDIA_TYPE, "Saved statement");

    Ok(GeneratedStatement {
        path,
        statement,
        pages: document.page_count(),
        watermark,
        size: bytes.len(),
    })
}
