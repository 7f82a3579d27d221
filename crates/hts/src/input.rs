//! Input-row reading.
//!
//! Rows come from a spreadsheet (XLSX, XLS, XLSM, XLSB, ODS via
//! calamine) or a CSV file. Columns are matched by header name, not
//! position; header row is row 1, data starts at row 2.

use std::path::Path;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use hts_core::RowInput;

const HEADER_STYLE_NO: &str = "style_no";
const HEADER_PRODUCT_NAME: &str = "product_name";
const HEADER_WEAVE_TYPE: &str = "weave_type";
const HEADER_CATEGORY: &str = "category";
const HEADER_GENDER: &str = "gender";
const HEADER_COMPOSITION: &str = "composition";

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// Read input rows from `path`, dispatching on the file extension.
///
/// `sheet` selects a worksheet by name; `None` means the first sheet.
/// CSV files ignore `sheet`.
pub fn read_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<RowInput>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        read_spreadsheet(path, sheet)
    } else if ext == "csv" {
        read_csv(path)
    } else {
        bail!("Unsupported input format: {}", path.display())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        // Style numbers come through as floats; keep integers clean.
        // Values outside i64 range fall through to float formatting.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            format!("{}", *f as i64)
        }
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

struct ColumnMap {
    style_no: usize,
    product_name: Option<usize>,
    weave_type: usize,
    category: usize,
    gender: Option<usize>,
    composition: usize,
}

impl ColumnMap {
    fn from_header(header: &[Data]) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|cell| cell_text(cell).to_lowercase() == name)
        };
        let require = |name: &str| {
            find(name).with_context(|| format!("Input is missing required column '{name}'"))
        };
        Ok(Self {
            style_no: require(HEADER_STYLE_NO)?,
            product_name: find(HEADER_PRODUCT_NAME),
            weave_type: require(HEADER_WEAVE_TYPE)?,
            category: require(HEADER_CATEGORY)?,
            gender: find(HEADER_GENDER),
            composition: require(HEADER_COMPOSITION)?,
        })
    }

    fn row(&self, cells: &[Data]) -> RowInput {
        let get = |idx: usize| cells.get(idx).map(cell_text).unwrap_or_default();
        let get_opt = |idx: Option<usize>| idx.map(|i| get(i)).unwrap_or_default();
        RowInput {
            style_no: get(self.style_no),
            product_name: get_opt(self.product_name),
            weave_type: get(self.weave_type),
            category: get(self.category),
            gender: get_opt(self.gender),
            composition: get(self.composition),
        }
    }
}

fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Vec<RowInput>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .with_context(|| format!("Spreadsheet has no sheets: {}", path.display()))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet '{sheet_name}'"))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .with_context(|| format!("Sheet '{sheet_name}' is empty"))?;
    let columns = ColumnMap::from_header(header)?;

    let mut rows: Vec<RowInput> = rows.map(|cells| columns.row(cells)).collect();
    trim_trailing_blanks(&mut rows);
    tracing::debug!(sheet = %sheet_name, rows = rows.len(), "spreadsheet rows read");
    Ok(rows)
}

fn is_blank(row: &RowInput) -> bool {
    row.style_no.is_empty()
        && row.product_name.is_empty()
        && row.weave_type.is_empty()
        && row.category.is_empty()
        && row.gender.is_empty()
        && row.composition.is_empty()
}

/// Drop the trailing all-empty region of the sheet. Blank rows inside
/// the data region are kept so each surviving row's batch index still
/// maps 1:1 to its sheet row; the pipeline reports them as
/// missing-field failures.
fn trim_trailing_blanks(rows: &mut Vec<RowInput>) {
    while rows.last().is_some_and(is_blank) {
        rows.pop();
    }
}

fn read_csv(path: &Path) -> Result<Vec<RowInput>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<RowInput>() {
        let row = record.with_context(|| format!("Malformed CSV row in {}", path.display()))?;
        rows.push(row);
    }
    tracing::debug!(rows = rows.len(), "csv rows read");
    Ok(rows)
}
