use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use super::layout::{CellBox, ImageBox, Primitive, RenderedDocument, Rule};
use crate::error::{PrestacaoError, Result};
use crate::report::style::{Align, Rgb};

const FONTS: &str = r#"("Helvetica", "Arial", "Liberation Sans", "DejaVu Sans")"#;

/// Compiles laid-out documents to PDF with the Typst CLI
pub struct TypstCompiler {
    bin: String,
}

impl Default for TypstCompiler {
    fn default() -> Self {
        Self::new("typst")
    }
}

impl TypstCompiler {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Produce the PDF bytes. Nothing is written outside a private temp dir.
    pub fn compile(&self, document: &RenderedDocument) -> Result<Vec<u8>> {
        // Check if typst is available
        let typst_check = Command::new(&self.bin).arg("--version").output();
        if typst_check.is_err() {
            return Err(PrestacaoError::TypstNotFound);
        }

        // One directory per call; removed when `temp_dir` drops
        let temp_dir = tempfile::Builder::new().prefix("prestacao-").tempdir()?;
        self.compile_in(temp_dir.path(), document)
    }

    fn compile_in(&self, temp_dir: &Path, document: &RenderedDocument) -> Result<Vec<u8>> {
        let watermark_file = match &document.watermark {
            Some(watermark) => {
                let name = format!("watermark.{}", watermark.format.extension());
                std::fs::write(temp_dir.join(&name), &watermark.bytes)?;
                Some(name)
            }
            None => None,
        };

        let source = typst_source(document, watermark_file.as_deref());
        let template_path = temp_dir.join("statement.typ");
        std::fs::write(&template_path, &source)?;
        let output_path: PathBuf = temp_dir.join("statement.pdf");

        debug!(
            template = %template_path.display(),
            bytes = source.len(),
            "Compiling Typst source"
        );

        let output = Command::new(&self.bin)
            .arg("compile")
            .arg("--root")
            .arg(temp_dir)
            .arg(&template_path)
            .arg(&output_path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrestacaoError::PdfGeneration(stderr.to_string()));
        }

        let bytes = std::fs::read(&output_path)?;
        if bytes.is_empty() {
            return Err(PrestacaoError::PdfGeneration(
                "typst produced an empty file".to_string(),
            ));
        }

        info!(pages = document.page_count(), bytes = bytes.len(), "Compiled PDF");
        Ok(bytes)
    }
}

/// Typst markup for a laid-out document. Every primitive is placed at an
/// absolute position on a margin-less page, so Typst does no layout of its own.
pub fn typst_source(document: &RenderedDocument, watermark_file: Option<&str>) -> String {
    let g = &document.geometry;
    let mut out = String::new();

    let _ = writeln!(out, "// Generated by prestacao");
    let _ = write!(out, "#set document(title: {}", string(&document.title));
    if let Some(author) = &document.author {
        let _ = write!(out, ", author: {}", string(author));
    }
    match document.generated_on {
        Some(date) => {
            use chrono::Datelike;
            let _ = write!(
                out,
                ", date: datetime(year: {}, month: {}, day: {})",
                date.year(),
                date.month(),
                date.day()
            );
        }
        None => out.push_str(", date: none"),
    }
    out.push_str(")\n");

    let _ = writeln!(
        out,
        "#set page(width: {}, height: {}, margin: 0pt)",
        mm(g.width),
        mm(g.height)
    );
    let _ = writeln!(out, "#set text(font: {FONTS}, size: 10pt, lang: \"pt\")");

    for (index, page) in document.pages.iter().enumerate() {
        if index > 0 {
            out.push_str("#pagebreak()\n");
        }
        let _ = writeln!(out, "// page {}", page.number);
        for primitive in &page.primitives {
            match primitive {
                Primitive::Watermark(image) => {
                    if let Some(file) = watermark_file {
                        write_watermark(&mut out, image, file);
                    }
                }
                Primitive::Cell(cell) => write_cell(&mut out, cell),
                Primitive::Rule(rule) => write_rule(&mut out, rule),
            }
        }
    }

    out
}

fn write_watermark(out: &mut String, image: &ImageBox, file: &str) {
    let _ = writeln!(
        out,
        "#place(top + left, dx: {}, dy: {}, image({}, width: {}, height: {}, fit: \"contain\"))",
        mm(image.x),
        mm(image.y),
        string(file),
        mm(image.width),
        mm(image.height)
    );

    // A white veil of alpha (1 - opacity) blends the image onto the white page
    let veil = ((1.0 - image.opacity.clamp(0.0, 1.0)) * 255.0).round() as u8;
    if veil > 0 {
        let _ = writeln!(
            out,
            "#place(top + left, dx: {}, dy: {}, rect(width: {}, height: {}, fill: rgb(255, 255, 255, {veil}), stroke: none))",
            mm(image.x),
            mm(image.y),
            mm(image.width),
            mm(image.height)
        );
    }
}

fn write_cell(out: &mut String, cell: &CellBox) {
    let fill = cell.fill.map(color).unwrap_or_else(|| "none".to_string());
    let stroke = cell
        .border
        .map(|c| format!("0.2mm + {}", color(c)))
        .unwrap_or_else(|| "none".to_string());
    let align = match cell.align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    };

    let mut text_args = format!("size: {}pt", number(cell.font.size));
    if cell.font.bold {
        text_args.push_str(", weight: \"bold\"");
    }
    if cell.font.italic {
        text_args.push_str(", style: \"italic\"");
    }

    let _ = writeln!(
        out,
        "#place(top + left, dx: {}, dy: {}, box(width: {}, height: {}, fill: {fill}, stroke: {stroke}, inset: (x: 1mm), clip: true, align({align} + horizon, text({text_args}, fill: {}, {}))))",
        mm(cell.x),
        mm(cell.y),
        mm(cell.width),
        mm(cell.height),
        color(cell.color),
        string(&cell.text)
    );
}

fn write_rule(out: &mut String, rule: &Rule) {
    let _ = writeln!(
        out,
        "#place(top + left, line(start: ({}, {}), end: ({}, {}), stroke: {} + {}))",
        mm(rule.x1),
        mm(rule.y1),
        mm(rule.x2),
        mm(rule.y2),
        mm(rule.thickness),
        color(rule.color)
    );
}

fn number(value: f32) -> String {
    let formatted = format!("{value:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn mm(value: f32) -> String {
    format!("{}mm", number(value))
}

fn color(rgb: Rgb) -> String {
    format!("rgb({}, {}, {})", rgb.0, rgb.1, rgb.2)
}

/// Typst string literal
fn string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ReportSettings;
    use crate::pdf::layout::{render, RenderOptions};
    use crate::pdf::watermark::tests::png_header;
    use crate::pdf::watermark::{ImageFormat, Watermark, WatermarkOutcome};
    use crate::report::build_report;
    use crate::statement::tests::scenario_input;
    use crate::statement::Statement;
    use chrono::NaiveDate;

    /// Shell script standing in for the Typst CLI. `body` runs for
    /// `compile` with `$src` and `$out` set; the default copies the source.
    #[cfg(unix)]
    pub(crate) fn fake_typst(dir: &Path, body: Option<&str>) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-typst");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then echo \"typst 0.0.0\"; exit 0; fi\n\
             src=\"$4\"\nout=\"$5\"\n{}\n",
            body.unwrap_or("cp \"$src\" \"$out\"")
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn skipped() -> WatermarkOutcome {
        WatermarkOutcome::Skipped {
            reason: "none".to_string(),
        }
    }

    fn signed_by(signer: &str) -> RenderedDocument {
        let mut input = scenario_input();
        input.signer = signer.to_string();
        let statement = Statement::compute(&input);
        let report = build_report(&statement, &ReportSettings::default(), None);
        render(&report, &skipped(), &RenderOptions::default())
    }

    fn rendered(watermark: WatermarkOutcome) -> RenderedDocument {
        let statement = Statement::compute(&scenario_input());
        let report = build_report(&statement, &ReportSettings::default(), None);
        let options = RenderOptions {
            generated_on: NaiveDate::from_ymd_opt(2025, 11, 30),
            ..RenderOptions::default()
        };
        render(&report, &watermark, &options)
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(string("R$ 20,00"), "\"R$ 20,00\"");
        assert_eq!(string(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(string("x\u{7}y\tz"), "\"xy z\"");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(mm(30.0), "30mm");
        assert_eq!(mm(42.5), "42.5mm");
        assert_eq!(mm(1.0 / 3.0), "0.33mm");
        assert_eq!(number(0.0), "0");
    }

    #[test]
    fn test_source_header_and_metadata() {
        let source = typst_source(
            &rendered(WatermarkOutcome::Skipped {
                reason: "none".to_string(),
            }),
            None,
        );
        assert!(source.contains("#set page(width: 210mm, height: 297mm, margin: 0pt)"));
        assert!(source.contains("author: \"Maria Souza\""));
        assert!(source.contains("date: datetime(year: 2025, month: 11, day: 30)"));
        assert!(source.contains("\"Página 1/1\""));
        assert!(source.contains("\"R$ 150.00\""));
        assert!(!source.contains("image("));
        assert!(!source.contains("#pagebreak()"));
    }

    #[test]
    fn test_source_places_watermark_with_veil() {
        let watermark = WatermarkOutcome::Applied(Watermark {
            bytes: png_header(400, 200),
            format: ImageFormat::Png,
            width_px: 400,
            height_px: 200,
            opacity: 0.4,
        });
        let source = typst_source(&rendered(watermark), Some("watermark.png"));

        assert!(source.contains(
            "image(\"watermark.png\", width: 126mm, height: 63mm, fit: \"contain\")"
        ));
        // 60% white over the image leaves it at 40% strength
        assert!(source.contains("fill: rgb(255, 255, 255, 153)"));

        let image_at = source.find("image(").unwrap();
        let first_cell_at = source.find("box(").unwrap();
        assert!(image_at < first_cell_at);
    }

    #[test]
    fn test_source_cells_carry_style() {
        let source = typst_source(
            &rendered(WatermarkOutcome::Skipped {
                reason: "none".to_string(),
            }),
            None,
        );
        // header row of the unit table
        assert!(source.contains(
            "fill: rgb(0, 70, 140), stroke: 0.2mm + rgb(180, 180, 180), inset: (x: 1mm), clip: true, align(left + horizon, text(size: 10pt, weight: \"bold\", fill: rgb(255, 255, 255), \"Apto\"))"
        ));
        assert!(source.contains("align(right + horizon"));
        assert!(source.contains("style: \"italic\""));
        assert!(source.contains("line(start: ("));
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_returns_typst_output() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = TypstCompiler::new(fake_typst(dir.path(), None).to_string_lossy());

        let document = signed_by("Maria Souza");
        let bytes = compiler.compile(&document).unwrap();
        assert_eq!(bytes, typst_source(&document, None).into_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_typst(dir.path(), Some("echo \"error: bad markup\" >&2\nexit 1"));

        let result = TypstCompiler::new(bin.to_string_lossy()).compile(&signed_by("Maria"));
        assert!(matches!(result, Err(PrestacaoError::PdfGeneration(stderr)) if stderr.contains("bad markup")));
    }

    #[cfg(unix)]
    #[test]
    fn test_concurrent_compiles_keep_their_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_typst(dir.path(), Some("sleep 0.3\ncp \"$src\" \"$out\""));

        let handles: Vec<_> = ["Alice", "Bob"]
            .into_iter()
            .map(|signer| {
                let document = signed_by(signer);
                let compiler = TypstCompiler::new(bin.to_string_lossy());
                std::thread::spawn(move || (signer, compiler.compile(&document)))
            })
            .collect();

        for handle in handles {
            let (signer, result) = handle.join().unwrap();
            let source = String::from_utf8(result.unwrap()).unwrap();
            let other = if signer == "Alice" { "Bob" } else { "Alice" };
            assert!(source.contains(&format!("\"{signer}\"")));
            assert!(!source.contains(other));
        }
    }
}
