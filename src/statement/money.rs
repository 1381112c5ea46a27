use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Digits, one `.` or `,` separator, exactly two cent digits.
///
/// The separator is always read as the decimal point, so grouped values
/// such as `1.234,56` split into two amounts (`1.23` and `4.56`).
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[.,]\d{2}").expect("valid regex"));

/// Amounts found in a free-text block, in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedAmounts {
    pub amounts: Vec<f64>,
    pub total: f64,
}

impl ParsedAmounts {
    /// True when the text held no amount at all ("no extras")
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Extract every monetary amount from `text`, e.g.
/// `"Lamp R$ 20,00; Valve R$ 75,60"` gives `[20.0, 75.6]`.
pub fn parse_amounts(text: &str) -> ParsedAmounts {
    let amounts: Vec<f64> = AMOUNT
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .collect();

    let total = if amounts.is_empty() {
        0.0
    } else {
        amounts.iter().sum()
    };

    ParsedAmounts { amounts, total }
}

/// Free-text list of extra income or expense entries plus its derived total
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtraItemBlock {
    pub text: String,
    pub amounts: Vec<f64>,
    pub total: f64,
}

impl ExtraItemBlock {
    pub fn from_text(text: &str) -> Self {
        let parsed = parse_amounts(text);
        Self {
            text: text.trim().to_string(),
            amounts: parsed.amounts,
            total: parsed.total,
        }
    }

    /// Whether the detail should show the "none" placeholder instead of the text
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Magnitudes below half a cent print as zero
const HALF_CENT: f64 = 0.005;

/// True when `value` prints as a negative amount. The deficit flag and the
/// warning colour both go through this so they agree with the printed text.
pub fn is_negative_amount(value: f64) -> bool {
    value <= -HALF_CENT
}

/// Format an amount the way the statement prints money: `R$ 1234.56`
pub fn format_money(value: f64, currency_symbol: &str) -> String {
    // Avoid printing "-0.00" for values that round to zero
    let value = if value.abs() < HALF_CENT { 0.0 } else { value };
    format!("{} {:.2}", currency_symbol, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_itemized_text() {
        let parsed = parse_amounts("Lamp R$ 20,00; Valve R$ 75,60");
        assert_eq!(parsed.amounts, vec![20.0, 75.6]);
        assert!(approx(parsed.total, 95.6));
    }

    #[test]
    fn test_parse_without_amounts() {
        let parsed = parse_amounts("no amounts here");
        assert!(parsed.is_empty());
        assert_eq!(parsed.total, 0.0);

        let parsed = parse_amounts("");
        assert!(parsed.amounts.is_empty());
        assert_eq!(parsed.total, 0.0);
    }

    #[test]
    fn test_dot_and_comma_both_read_as_decimal_point() {
        let parsed = parse_amounts("Multa 50.00, Juros 20,50");
        assert_eq!(parsed.amounts, vec![50.0, 20.5]);
    }

    #[test]
    fn test_requires_two_cent_digits() {
        assert!(parse_amounts("Taxa R$ 20,5").is_empty());
        assert!(parse_amounts("R$ 100").is_empty());
        // Only the first two fractional digits take part in the match
        assert_eq!(parse_amounts("20,005").amounts, vec![20.0]);
    }

    #[test]
    fn test_grouped_thousands_are_not_supported() {
        let parsed = parse_amounts("Reforma R$ 1.234,56");
        assert_eq!(parsed.amounts, vec![1.23, 4.56]);
        assert!(!approx(parsed.total, 1234.56));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "Lâmpada R$ 20,00\nVálvula R$ 75,60\nPintura 300.10";
        assert_eq!(parse_amounts(text), parse_amounts(text));
    }

    #[test]
    fn test_extra_block_keeps_text_and_total() {
        let block = ExtraItemBlock::from_text("  Bulb R$ 20,00  ");
        assert_eq!(block.text, "Bulb R$ 20,00");
        assert!(approx(block.total, 20.0));
        assert!(!block.is_empty());

        let empty = ExtraItemBlock::from_text("nothing this month");
        assert!(empty.is_empty());
        assert_eq!(empty.total, 0.0);
    }

    #[test]
    fn test_negative_amount_matches_printed_text() {
        let noise = 0.3 - (0.1 + 0.2);
        assert!(noise < 0.0);
        assert!(!is_negative_amount(noise));
        assert_eq!(format_money(noise, "R$"), "R$ 0.00");

        assert!(is_negative_amount(-0.01));
        assert!(format_money(-0.01, "R$").starts_with("R$ -"));
        assert!(!is_negative_amount(0.0));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(95.6, "R$"), "R$ 95.60");
        assert_eq!(format_money(-20.0, "R$"), "R$ -20.00");
        assert_eq!(format_money(-0.001, "R$"), "R$ 0.00");
    }
}
