//! Console tables and CSV exports

use std::path::Path;

use chipvol_core::PercentileSet;
use chipvol_core::summary::{CumulativeSummary, PeriodSummaryRow, VariantExportRow};
use jiff::civil::Date;
use serde::Serialize;

use crate::scenario::Scenario;

/// Format a count with thousands separators (e.g., 1234567.4 -> "1,234,567")
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let digits = (value.abs().round() as u64).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value < 0.0 && grouped != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Lay out rows as aligned columns: first column left-aligned, the rest right-aligned
fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &width))| {
                if i == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = format_row(header);
    out.push('\n');
    let rule_len = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out
}

/// Per-period table of "median (p5-p95)" cells with a Total column
pub fn render_period_table(rows: &[PeriodSummaryRow]) -> String {
    let mut header = vec!["Period".to_string()];
    if let Some(first) = rows.first() {
        header.extend(first.cells.iter().map(|(variant, _)| variant.to_string()));
    }
    header.push("Total".to_string());

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.period.to_string()];
            cells.extend(row.cells.iter().map(|(_, cell)| cell.clone()));
            cells.push(row.total.clone());
            cells
        })
        .collect();

    render_table(&header, &body)
}

fn interval_cells(set: &PercentileSet) -> [String; 3] {
    [
        format_count(set.p50),
        format_count(set.p5),
        format_count(set.p95),
    ]
}

/// Cumulative units and compute equivalents per variant, plus the grand total.
///
/// `equivalents` must summarize the same variants as `units`; rows missing
/// from it are shown as blanks.
pub fn render_cumulative(units: &CumulativeSummary, equivalents: &CumulativeSummary) -> String {
    let header: Vec<String> = [
        "Variant",
        "Units p50",
        "p5",
        "p95",
        "H100e p50",
        "p5",
        "p95",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();

    let blank = || std::array::from_fn::<String, 3, _>(|_| "-".to_string());

    let mut body = Vec::with_capacity(units.rows.len() + 1);
    for (variant, set) in &units.rows {
        let equiv = equivalents
            .rows
            .iter()
            .find(|(v, _)| v == variant)
            .map_or_else(blank, |(_, e)| interval_cells(e));

        let mut cells = vec![variant.to_string()];
        cells.extend(interval_cells(set));
        cells.extend(equiv);
        body.push(cells);
    }

    if let Some(total) = &units.total {
        let mut cells = vec!["Total".to_string()];
        cells.extend(interval_cells(total));
        cells.extend(equivalents.total.as_ref().map_or_else(blank, interval_cells));
        body.push(cells);
    }

    render_table(&header, &body)
}

#[derive(Debug, Serialize)]
struct ByVariantRecord<'a> {
    quarter: &'a str,
    start_date: Option<Date>,
    end_date: Option<Date>,
    version: &'a str,
    chips_p5: i64,
    chips_p50: i64,
    chips_p95: i64,
    h100e_p5: i64,
    h100e_p50: i64,
    h100e_p95: i64,
}

/// Write one CSV row per (period, variant) with volume. Period dates come
/// from the scenario and are left empty when it doesn't declare them.
pub fn write_by_variant_csv(
    path: &Path,
    rows: &[VariantExportRow],
    scenario: &Scenario,
) -> color_eyre::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    for row in rows {
        let period = scenario.period(row.period.as_str());
        writer.serialize(ByVariantRecord {
            quarter: row.period.as_str(),
            start_date: period.and_then(|p| p.start),
            end_date: period.and_then(|p| p.end),
            version: row.variant.as_str(),
            chips_p5: row.chips_p5,
            chips_p50: row.chips_p50,
            chips_p95: row.chips_p95,
            h100e_p5: row.equiv_p5,
            h100e_p50: row.equiv_p50,
            h100e_p95: row.equiv_p95,
        })?;
    }

    writer.flush()?;
    tracing::info!(rows = rows.len(), "wrote by-variant export to {}", path.display());
    Ok(())
}

/// Write the per-period summary table as CSV
pub fn write_summary_csv(path: &Path, rows: &[PeriodSummaryRow]) -> color_eyre::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["quarter".to_string()];
    if let Some(first) = rows.first() {
        header.extend(first.cells.iter().map(|(variant, _)| variant.to_string()));
    }
    header.push("total".to_string());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.period.as_str()];
        record.extend(row.cells.iter().map(|(_, cell)| cell.as_str()));
        record.push(row.total.as_str());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    tracing::info!(rows = rows.len(), "wrote summary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chipvol_core::{Period, Variant};

    use super::*;
    use crate::scenario::tests::example;

    fn set(p5: f64, p50: f64, p95: f64) -> PercentileSet {
        PercentileSet { p5, p50, p95 }
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.4), "999");
        assert_eq!(format_count(1_000.0), "1,000");
        assert_eq!(format_count(1_234_567.4), "1,234,567");
        assert_eq!(format_count(-12_345.0), "-12,345");
        assert_eq!(format_count(-0.2), "0");
        assert_eq!(format_count(f64::INFINITY), "inf");
    }

    #[test]
    fn test_period_table_layout() {
        let rows = vec![
            PeriodSummaryRow {
                period: Period::from("Q1_FY24"),
                cells: vec![
                    (Variant::from("A100"), "75k (75k-75k)".to_string()),
                    (Variant::from("H100"), "-".to_string()),
                ],
                total: "75k (75k-75k)".to_string(),
            },
            PeriodSummaryRow {
                period: Period::from("Q2"),
                cells: vec![
                    (Variant::from("A100"), "-".to_string()),
                    (Variant::from("H100"), "100k (90k-110k)".to_string()),
                ],
                total: "100k (90k-110k)".to_string(),
            },
        ];

        let table = render_period_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Period"));
        assert!(lines[0].ends_with("Total"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("Q1_FY24"));
        assert!(lines[3].starts_with("Q2     "));
        assert!(lines[3].ends_with("100k (90k-110k)"));
    }

    #[test]
    fn test_cumulative_includes_total_row() {
        let units = CumulativeSummary {
            rows: vec![(Variant::from("H100"), set(900.0, 1_000.0, 1_100.0))],
            total: Some(set(900.0, 1_000.0, 1_100.0)),
        };
        let equivalents = CumulativeSummary {
            rows: vec![(Variant::from("H100"), set(900.0, 1_000.0, 1_100.0))],
            total: Some(set(900.0, 1_000.0, 1_100.0)),
        };

        let table = render_cumulative(&units, &equivalents);
        let last = table.lines().last().unwrap();
        assert!(last.starts_with("Total"));
        assert!(last.contains("1,100"));
    }

    #[test]
    fn test_by_variant_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("by_variant.csv");
        let rows = vec![
            VariantExportRow {
                period: Period::from("Q1_FY24"),
                variant: Variant::from("A100"),
                chips_p5: 75_000,
                chips_p50: 75_000,
                chips_p95: 75_000,
                equiv_p5: 23_648,
                equiv_p50: 23_648,
                equiv_p95: 23_648,
            },
            VariantExportRow {
                period: Period::from("Q2_FY24"),
                variant: Variant::from("H100"),
                chips_p5: 1,
                chips_p50: 2,
                chips_p95: 3,
                equiv_p5: 1,
                equiv_p50: 2,
                equiv_p95: 3,
            },
        ];

        write_by_variant_csv(&path, &rows, &example()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "quarter,start_date,end_date,version,chips_p5,chips_p50,chips_p95,h100e_p5,h100e_p50,h100e_p95"
        );
        assert_eq!(
            lines[1],
            "Q1_FY24,2023-01-30,2023-04-30,A100,75000,75000,75000,23648,23648,23648"
        );
        assert_eq!(lines[2], "Q2_FY24,,,H100,1,2,3,1,2,3");
    }

    #[test]
    fn test_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![PeriodSummaryRow {
            period: Period::from("Q1_FY24"),
            cells: vec![
                (Variant::from("A100"), "75k (75k-75k)".to_string()),
                (Variant::from("H100"), "-".to_string()),
            ],
            total: "75k (75k-75k)".to_string(),
        }];

        write_summary_csv(&path, &rows).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "quarter,A100,H100,total\nQ1_FY24,75k (75k-75k),-,75k (75k-75k)\n"
        );
    }
}
