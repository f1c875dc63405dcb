//! Record to document transformation.
//!
//! # Responsibility
//! - Lay a record out as a fixed report: header, client details, notes,
//!   parts table with total, generation footer.
//! - Derive the export file name.
//!
//! # Invariants
//! - Output depends only on the record, the config and `generated_at`.
//! - A part without a stored price shows `N/A` and counts as zero in the
//!   total.

use crate::model::record::Record;
use crate::report::writer::{
    Align, ColumnSpec, DocumentWriter, FontStyle, TableSpec, TextItem, TextStyle,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};

const MARGIN_X: usize = 4;
const VALUE_X: usize = MARGIN_X + 22;
const HEADER_Y: usize = 2;
const NOT_AVAILABLE: &str = "N/A";

const TITLE_STYLE: TextStyle = TextStyle::new(20, FontStyle::Bold);
const SUBTITLE_STYLE: TextStyle = TextStyle::new(12, FontStyle::Normal);
const SECTION_STYLE: TextStyle = TextStyle::new(16, FontStyle::Bold);
const SUBSECTION_STYLE: TextStyle = TextStyle::new(14, FontStyle::Bold);
const LABEL_STYLE: TextStyle = TextStyle::new(11, FontStyle::Bold);
const VALUE_STYLE: TextStyle = TextStyle::new(11, FontStyle::Normal);
const NOTES_STYLE: TextStyle = TextStyle::new(10, FontStyle::Normal);
const FOOTER_STYLE: TextStyle = TextStyle::new(8, FontStyle::Italic);

/// Branding and naming used by the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub organization_name: String,
    pub organization_subtitle: String,
    pub currency: String,
    pub file_prefix: String,
    /// Footer text placed before the generation timestamp.
    pub generated_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            organization_name: "Focus Part".to_string(),
            organization_subtitle: "Management Piese Auto".to_string(),
            currency: "RON".to_string(),
            file_prefix: "Focus_Part".to_string(),
            generated_label: "Generated on".to_string(),
        }
    }
}

/// Renders records into any `DocumentWriter`.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Draws the full report for `record` onto `writer`.
    pub fn render<W: DocumentWriter>(&self, record: &Record, generated_at: NaiveDateTime, writer: &mut W) {
        let width = writer.page_width();
        let height = writer.page_height();
        let center_x = width / 2;
        let content_width = width.saturating_sub(2 * MARGIN_X);
        let bottom_y = height.saturating_sub(5);

        writer.text(TextItem {
            text: self.config.organization_name.clone(),
            x: center_x,
            y: HEADER_Y,
            align: Align::Center,
            style: TITLE_STYLE,
        });
        writer.text(TextItem {
            text: self.config.organization_subtitle.clone(),
            x: center_x,
            y: HEADER_Y + 1,
            align: Align::Center,
            style: SUBTITLE_STYLE,
        });
        writer.rule(HEADER_Y + 2, MARGIN_X, width.saturating_sub(MARGIN_X));

        let mut y = HEADER_Y + 4;
        heading(writer, "Detalii Client", y, SECTION_STYLE);
        y += 2;

        let plate = record
            .license_plate
            .as_deref()
            .filter(|plate| !plate.is_empty())
            .unwrap_or(NOT_AVAILABLE);
        let created = format_created_date(record.created_at);
        for (label, value) in [
            ("Serie de Sasiu:", record.vin_number.as_str()),
            ("Numar Inmatriculare:", plate),
            ("Nume Client:", record.client_name.as_str()),
            ("Data Crearii:", created.as_str()),
        ] {
            label_value(writer, label, value, y);
            y += 1;
        }
        y += 1;

        if let Some(notes) = record.notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
            heading(writer, "Notite", y, SUBSECTION_STYLE);
            y += 1;
            for line in writer.split_text_to_size(notes, content_width) {
                if y >= bottom_y {
                    writer.new_page();
                    y = writer.top_margin();
                }
                writer.text(TextItem {
                    text: line,
                    x: MARGIN_X,
                    y,
                    align: Align::Left,
                    style: NOTES_STYLE,
                });
                y += 1;
            }
            y += 1;
        }

        if y + 2 >= bottom_y {
            writer.new_page();
            y = writer.top_margin();
        }
        heading(writer, "Piese Achizitionate", y, SUBSECTION_STYLE);
        y += 1;

        let currency = self.config.currency.as_str();
        let body = record
            .parts
            .iter()
            .enumerate()
            .map(|(idx, part)| {
                vec![
                    (idx + 1).to_string(),
                    part.name.clone(),
                    if part.serial_number.is_empty() {
                        NOT_AVAILABLE.to_string()
                    } else {
                        part.serial_number.clone()
                    },
                    format_price(part.price, currency),
                ]
            })
            .collect();
        writer.table(&TableSpec {
            x: MARGIN_X,
            start_y: y,
            bottom_y,
            columns: vec![
                ColumnSpec {
                    width: 4,
                    align: Align::Center,
                },
                ColumnSpec {
                    width: 30,
                    align: Align::Left,
                },
                ColumnSpec {
                    width: 24,
                    align: Align::Left,
                },
                ColumnSpec {
                    width: 17,
                    align: Align::Right,
                },
            ],
            head: ["Nr.", "Nume Piesa", "Numar Serie", "Pret"]
                .map(String::from)
                .to_vec(),
            body,
            foot: Some(vec![
                String::new(),
                String::new(),
                "Total:".to_string(),
                format_price(Some(record.total_price()), currency),
            ]),
            head_align: Some(Align::Center),
            foot_align: Some(Align::Right),
        });

        writer.rule(height.saturating_sub(4), MARGIN_X, width.saturating_sub(MARGIN_X));
        writer.text(TextItem {
            text: format!(
                "{} {}",
                self.config.generated_label,
                format_generated_at(generated_at)
            ),
            x: center_x,
            y: height.saturating_sub(2),
            align: Align::Center,
            style: FOOTER_STYLE,
        });
    }

    /// Export file stem for `record` generated on `date`.
    pub fn file_name(&self, record: &Record, date: NaiveDate) -> String {
        report_file_name(&self.config.file_prefix, &record.vin_number, date)
    }
}

/// `<prefix>_<vin>_<YYYY-MM-DD>`, without extension.
///
/// Characters of the VIN outside `[A-Za-z0-9_-]` become `_`, so the stem is
/// always a single path component.
pub fn report_file_name(prefix: &str, vin: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}_{}", file_safe(vin), date.format("%Y-%m-%d"))
}

fn file_safe(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Two-decimal money text, half away from zero; `N/A` when missing.
pub fn format_price(price: Option<Decimal>, currency: &str) -> String {
    match price {
        Some(price) => {
            let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.2} {currency}")
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `dd.mm.yyyy` in UTC from epoch milliseconds.
pub fn format_created_date(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|at| at.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_generated_at(at: NaiveDateTime) -> String {
    at.format("%d.%m.%Y, %H:%M:%S").to_string()
}

fn heading<W: DocumentWriter>(writer: &mut W, text: &str, y: usize, style: TextStyle) {
    writer.text(TextItem {
        text: text.to_string(),
        x: MARGIN_X,
        y,
        align: Align::Left,
        style,
    });
}

fn label_value<W: DocumentWriter>(writer: &mut W, label: &str, value: &str, y: usize) {
    writer.text(TextItem {
        text: label.to_string(),
        x: MARGIN_X,
        y,
        align: Align::Left,
        style: LABEL_STYLE,
    });
    writer.text(TextItem {
        text: value.to_string(),
        x: VALUE_X,
        y,
        align: Align::Left,
        style: VALUE_STYLE,
    });
}

#[cfg(test)]
mod tests {
    use super::{format_created_date, format_price, report_file_name};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn format_price_pads_and_rounds() {
        assert_eq!(format_price(Some(Decimal::new(1205, 1)), "RON"), "120.50 RON");
        assert_eq!(format_price(Some(Decimal::new(1005, 3)), "RON"), "1.01 RON");
        assert_eq!(format_price(Some(Decimal::ZERO), "RON"), "0.00 RON");
        assert_eq!(format_price(None, "RON"), "N/A");
    }

    #[test]
    fn created_date_is_utc_day_month_year() {
        // 2024-03-05T23:30:00Z
        assert_eq!(format_created_date(1_709_681_400_000), "05.03.2024");
    }

    #[test]
    fn file_name_joins_prefix_vin_and_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            report_file_name("Focus_Part", "1HGCM82633A004352", date),
            "Focus_Part_1HGCM82633A004352_2024-03-05"
        );
    }

    #[test]
    fn file_name_replaces_path_characters_in_vin() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            report_file_name("Focus_Part", "AB/CD", date),
            "Focus_Part_AB_CD_2024-03-05"
        );
        assert_eq!(
            report_file_name("Focus_Part", "../x\\y", date),
            "Focus_Part____x_y_2024-03-05"
        );
    }
}
