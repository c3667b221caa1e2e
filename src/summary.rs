// 🧾 Summary Formatter - totals and the shareable build table
//
// Totals use Indian digit grouping (1,50,000) with up to three fraction
// digits, matching the en-IN locale convention. The shareable summary is a
// Markdown table that gets pushed to a clipboard sink.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::Write;

use crate::build::BuildList;
use crate::error::{BuildError, Result};

/// Prefix for on-screen totals
pub const CURRENCY_SYMBOL: &str = "₹";

/// Prefix for the total in the shared summary
pub const CURRENCY_CODE: &str = "INR";

/// First line of the shared summary
pub const SUMMARY_HEADER: &str = "[PCPriceTracker Build](https://pcpricetracker.in/b/s/custom)";

// ============================================================================
// NUMBER FORMATTING
// ============================================================================

/// Format with en-IN grouping: last three digits, then pairs.
///
/// Rounds to three fraction digits and drops trailing zeros.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    // Text formatting keeps every integer digit, however large
    let text = format!("{:.3}", value.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && (whole != "0" || !fraction.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_indian(whole));

    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }

    out
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), last_three)
}

/// Total as shown on screen, e.g. `₹ 15,000`
pub fn format_total(value: f64) -> String {
    format!("{} {}", CURRENCY_SYMBOL, format_grouped(value))
}

// ============================================================================
// SHAREABLE SUMMARY
// ============================================================================

/// Markdown table of the build followed by the grand total.
///
/// Rows with neither a product nor a price are left out.
pub fn format_summary(list: &BuildList) -> String {
    let mut markdown = format!("{}\n\n", SUMMARY_HEADER);
    markdown.push_str("Category|Selection|Source|Price\n");
    markdown.push_str(":----|:----|:----|----:\n");

    for row in list.rows() {
        let product = row.product.trim().replace("\r\n", " ").replace('\n', " ");
        let price = row.price.trim();
        let source = row.source.trim();

        if !product.is_empty() || !price.is_empty() {
            markdown.push_str(&format!(
                "**{}** | {} | {} | {}\n",
                row.category, product, source, price
            ));
        }
    }

    markdown.push_str(&format!(
        "| | **Grand Total** | **{} {}** |",
        CURRENCY_CODE,
        format_grouped(list.total())
    ));

    markdown
}

// ============================================================================
// CLIPBOARD SINKS
// ============================================================================

pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Terminal clipboard via the OSC 52 escape sequence
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Osc52Clipboard { out }
    }
}

impl Osc52Clipboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Osc52Clipboard::new(std::io::stdout())
    }
}

impl<W: Write> ClipboardSink for Osc52Clipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let payload = STANDARD.encode(text);
        write!(self.out, "\x1b]52;c;{}\x07", payload)
            .and_then(|_| self.out.flush())
            .map_err(|e| BuildError::ClipboardWriteFailure(e.to_string()))
    }
}

/// Keeps the last copied text
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl ClipboardSink for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Format the summary and hand it to `sink`; the list is never touched
pub fn copy_summary(list: &BuildList, sink: &mut dyn ClipboardSink) -> Result<String> {
    let text = format_summary(list);
    sink.write_text(&text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::BuildRow;

    struct DeniedClipboard;

    impl ClipboardSink for DeniedClipboard {
        fn write_text(&mut self, _text: &str) -> Result<()> {
            Err(BuildError::ClipboardWriteFailure("denied".to_string()))
        }
    }

    #[test]
    fn test_format_grouped_indian_convention() {
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(15000.0), "15,000");
        assert_eq!(format_grouped(150000.0), "1,50,000");
        assert_eq!(format_grouped(12345678.0), "1,23,45,678");
        assert_eq!(format_grouped(1500.5), "1,500.5");
        assert_eq!(format_grouped(1234.5678), "1,234.568");
        assert_eq!(format_grouped(0.1 + 0.2), "0.3");
        assert_eq!(format_grouped(-2500.0), "-2,500");
    }

    #[test]
    fn test_format_grouped_huge_totals_keep_digits() {
        let list = BuildList::from_rows(vec![BuildRow::for_category("Processor").with_price("1e20")]);

        assert_eq!(
            format_total(list.total()),
            "₹ 10,00,00,00,00,00,00,00,00,000"
        );
        assert_eq!(format_grouped(-0.0001), "0");
    }

    #[test]
    fn test_format_total() {
        assert_eq!(format_total(15000.0), "₹ 15,000");
    }

    #[test]
    fn test_format_summary_skips_blank_rows() {
        let list = BuildList::from_rows(vec![
            BuildRow::for_category("Processor")
                .with_product("Ryzen 5")
                .with_price("15000")
                .with_source("Amazon"),
            BuildRow::for_category("Motherboard"),
            BuildRow::for_category("Graphic Card")
                .with_product("  RTX 4060\nDual  ")
                .with_source(" MD "),
        ]);

        let summary = format_summary(&list);
        let expected = "[PCPriceTracker Build](https://pcpricetracker.in/b/s/custom)\n\n\
                        Category|Selection|Source|Price\n\
                        :----|:----|:----|----:\n\
                        **Processor** | Ryzen 5 | Amazon | 15000\n\
                        **Graphic Card** | RTX 4060 Dual | MD | \n\
                        | | **Grand Total** | **INR 15,000** |";
        assert_eq!(summary, expected);
    }

    #[test]
    fn test_copy_summary_to_memory() {
        let list = BuildList::from_rows(vec![BuildRow::default().with_price("100")]);
        let mut clipboard = MemoryClipboard::default();

        let text = copy_summary(&list, &mut clipboard).unwrap();
        assert_eq!(clipboard.contents, Some(text));
    }

    #[test]
    fn test_copy_summary_failure_leaves_list_alone() {
        let list = BuildList::from_rows(vec![BuildRow::default().with_price("100")]);
        let before = list.clone();

        let result = copy_summary(&list, &mut DeniedClipboard);
        assert!(matches!(result, Err(BuildError::ClipboardWriteFailure(_))));
        assert_eq!(list, before);
    }

    #[test]
    fn test_osc52_sequence() {
        let mut buffer = Vec::new();
        Osc52Clipboard::new(&mut buffer).write_text("hi").unwrap();

        assert_eq!(buffer, b"\x1b]52;c;aGk=\x07");
    }
}
