//! Spreadsheet rendering.
//!
//! Produces the downloadable workbook: merged title cell, styled and
//! frozen header row, one data row per report row with automatic type
//! coercion. The workbook is built in memory and streamed whole.

use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, XlsxError};

use crate::{ApiError, ApiResult};
use mlib_common::config::columns::ReportColumn;

const HEADER_GREEN: Color = Color::RGB(0x008000);

/// How one cell value is written.
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Values that parse as integers become integer cells, other parseable
/// numbers become float cells, everything else is trimmed text.
fn coerce(value: &str) -> CellValue {
    let trimmed = value.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }
    CellValue::Text(trimmed.to_string())
}

/// Build the workbook and return its bytes.
pub fn render_workbook(
    title: &str,
    columns: &[&'static ReportColumn],
    rows: &[Vec<Option<String>>],
) -> ApiResult<Vec<u8>> {
    build_workbook(title, columns, rows)
        .map_err(|e| ApiError::Internal(format!("workbook build failed: {e}")))
}

fn build_workbook(
    title: &str,
    columns: &[&'static ReportColumn],
    rows: &[Vec<Option<String>>],
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let title_format = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(HEADER_GREEN)
        .set_align(FormatAlign::Center);
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(HEADER_GREEN)
        .set_align(FormatAlign::Center);

    let last_col = (columns.len() - 1) as u16;
    if last_col == 0 {
        worksheet.write_string_with_format(0, 0, title, &title_format)?;
    } else {
        worksheet.merge_range(0, 0, 0, last_col, title, &title_format)?;
    }

    for (col, column) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, column.width)?;
        worksheet.write_string_with_format(2, col, column.name, &header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let excel_row = index as u32 + 3;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            let Some(text) = cell else { continue };
            match coerce(text) {
                CellValue::Integer(i) => worksheet.write_number(excel_row, col, i as f64)?,
                CellValue::Float(f) => worksheet.write_number(excel_row, col, f)?,
                CellValue::Text(t) => worksheet.write_string(excel_row, col, t)?,
            };
        }
    }

    // Title and header rows stay visible while scrolling.
    worksheet.set_freeze_panes(3, 0)?;

    workbook.save_to_buffer()
}

/// "{title} {YYYYMMDD}-{request id}.xlsx", today's local date.
pub fn report_filename(title: &str, request_id: i64) -> String {
    format!("{} {}-{}.xlsx", title, Local::now().format("%Y%m%d"), request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlib_common::config::columns::report_column;

    #[test]
    fn integer_strings_become_integer_cells() {
        assert_eq!(coerce("42"), CellValue::Integer(42));
        assert_eq!(coerce("  42 "), CellValue::Integer(42));
    }

    #[test]
    fn other_numbers_become_float_cells() {
        assert_eq!(coerce("42.5"), CellValue::Float(42.5));
    }

    #[test]
    fn everything_else_is_trimmed_text() {
        assert_eq!(coerce(" Op. 42 "), CellValue::Text("Op. 42".to_string()));
        assert_eq!(coerce("inf"), CellValue::Text("inf".to_string()));
    }

    #[test]
    fn filename_embeds_title_and_id() {
        let name = report_filename("Spring Inventory", 17);
        assert!(name.starts_with("Spring Inventory "));
        assert!(name.ends_with("-17.xlsx"));
    }

    #[test]
    fn single_column_workbook_builds() {
        let columns = vec![report_column("Title").unwrap()];
        let rows = vec![vec![Some("Ode to Joy".to_string())], vec![None]];
        let bytes = render_workbook("Test", &columns, &rows).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn title_is_bold_green_twelve_point() {
        use std::io::Read;

        let columns = vec![
            report_column("Item ID").unwrap(),
            report_column("Title").unwrap(),
        ];
        let rows = vec![vec![Some("000001".to_string()), Some("Ode to Joy".to_string())]];
        let bytes = render_workbook("Styled", &columns, &rows).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut styles = String::new();
        archive
            .by_name("xl/styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        // Title font: bold, 12 pt, green. The same green fills the header
        // row behind white text.
        assert!(styles.contains(r#"val="12""#), "missing 12-pt font: {styles}");
        assert!(styles.contains("FF008000"), "missing green: {styles}");
    }

    #[test]
    fn multi_column_workbook_builds() {
        let columns = vec![
            report_column("Item ID").unwrap(),
            report_column("Title").unwrap(),
            report_column("Latest Price").unwrap(),
        ];
        let rows = vec![vec![
            Some("000001".to_string()),
            Some("Ode to Joy".to_string()),
            Some("4.50".to_string()),
        ]];
        let bytes = render_workbook("Test", &columns, &rows).unwrap();
        assert!(!bytes.is_empty());
    }
}
