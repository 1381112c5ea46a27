use serde::{Deserialize, Serialize};

use crate::error::{PrestacaoError, Result};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub condominium: Condominium,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub pdf: PdfSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Condominium {
    /// Printed under the title when present
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PdfSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// PNG or JPEG drawn behind every page
    #[serde(default)]
    pub watermark: Option<String>,
    #[serde(default = "default_watermark_opacity")]
    pub watermark_opacity: f32,
    /// Watermark width as a fraction of the page width
    #[serde(default = "default_watermark_scale")]
    pub watermark_scale: f32,
    #[serde(default = "default_typst_bin")]
    pub typst_bin: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            watermark: None,
            watermark_opacity: default_watermark_opacity(),
            watermark_scale: default_watermark_scale(),
            typst_bin: default_typst_bin(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let opacity = self.pdf.watermark_opacity;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(PrestacaoError::InvalidSetting {
                key: "pdf.watermark_opacity".to_string(),
                reason: format!("{opacity} is outside 0.0..=1.0"),
            });
        }

        let scale = self.pdf.watermark_scale;
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(PrestacaoError::InvalidSetting {
                key: "pdf.watermark_scale".to_string(),
                reason: format!("{scale} is outside (0.0, 1.0]"),
            });
        }

        Ok(())
    }
}

fn default_title() -> String {
    "Prestação de Contas".to_string()
}

fn default_currency_symbol() -> String {
    "R$".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_watermark_opacity() -> f32 {
    0.4
}

fn default_watermark_scale() -> f32 {
    0.6
}

fn default_typst_bin() -> String {
    "typst".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_printed_layout() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.report.title, "Prestação de Contas");
        assert_eq!(config.report.currency_symbol, "R$");
        assert_eq!(config.pdf.watermark_opacity, 0.4);
        assert_eq!(config.pdf.watermark_scale, 0.6);
        assert!(config.pdf.watermark.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_watermark() {
        let mut config = Config::default();
        config.pdf.watermark_opacity = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pdf.watermark_scale = 0.0;
        assert!(config.validate().is_err());
    }
}
