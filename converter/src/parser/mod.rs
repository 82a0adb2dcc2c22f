//! Metadata workbook loading.
//!
//! A workbook is either:
//!
//! - a spreadsheet file (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) read with calamine
//! - a directory of per-sheet CSV exports, one `<sheet name>.csv` per sheet,
//!   with encoding and delimiter auto-detection
//!
//! Sheets are loaded eagerly as raw grids. Headers are resolved on demand
//! with [`Workbook::sheet`], because metadata sheets start with a title
//! banner and the header sits on a later row. Cells become JSON scalars:
//! empty cells and blank strings are `null`. No form-specific logic here.

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde_json::{Map, Number, Value};
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};

use crate::error::{WorkbookError, WorkbookResult};

/// Spreadsheet extensions handled by calamine.
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A loaded workbook with every sheet as a raw grid of cells.
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Path the workbook was loaded from
    pub source: PathBuf,
    sheets: Vec<RawSheet>,
}

#[derive(Debug, Clone)]
struct RawSheet {
    name: String,
    grid: Vec<Vec<Value>>,
}

/// A sheet with resolved headers.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    /// Column headers in sheet order
    pub headers: Vec<String>,
    /// Data rows below the header row
    pub rows: Vec<Row>,
}

/// One data row, keyed by column header.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based row number in the sheet
    pub number: usize,
    cells: Map<String, Value>,
}

impl Workbook {
    /// Open a spreadsheet file or a directory of CSV sheets.
    ///
    /// # Example
    /// ```ignore
    /// let workbook = Workbook::open("metadata.xlsx")?;
    /// let sheet = workbook.sheet("F01-MHPSS_Baseline", 2)?;
    /// println!("{} rows", sheet.rows.len());
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> WorkbookResult<Self> {
        let path = path.as_ref();

        if path.is_dir() {
            return Self::open_csv_dir(path);
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            Self::open_spreadsheet(path)
        } else {
            Err(WorkbookError::UnsupportedFormat(path.display().to_string()))
        }
    }

    fn open_spreadsheet(path: &Path) -> WorkbookResult<Self> {
        let open_error = |e: calamine::Error| WorkbookError::OpenError {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let mut workbook = open_workbook_auto(path).map_err(open_error)?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(open_error)?;
            sheets.push(RawSheet {
                name,
                grid: range_to_grid(&range),
            });
        }

        Ok(Self {
            source: path.to_path_buf(),
            sheets,
        })
    }

    fn open_csv_dir(dir: &Path) -> WorkbookResult<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
            })
            .collect();
        paths.sort();

        let mut sheets = Vec::new();
        for path in paths {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let bytes = fs::read(&path)?;
            sheets.push(RawSheet {
                name,
                grid: parse_csv_grid(&bytes)?,
            });
        }

        Ok(Self {
            source: dir.to_path_buf(),
            sheets,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    /// Resolve a sheet with its header on the given 1-based row.
    pub fn sheet(&self, name: &str, header_row: usize) -> WorkbookResult<Sheet> {
        let raw = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))?;

        Sheet::from_grid(&raw.name, &raw.grid, header_row)
    }
}

impl Sheet {
    /// Build a sheet from a raw grid, taking headers from `header_row` (1-based).
    ///
    /// Blank header cells are named `Unnamed: <index>`; a repeated header
    /// keeps its first column.
    pub fn from_grid(name: &str, grid: &[Vec<Value>], header_row: usize) -> WorkbookResult<Self> {
        if header_row == 0 || header_row > grid.len() {
            return Err(WorkbookError::HeaderRowOutOfRange {
                sheet: name.to_string(),
                header_row,
                rows: grid.len(),
            });
        }

        let header_cells = &grid[header_row - 1];
        let mut columns: Vec<Option<String>> = Vec::with_capacity(header_cells.len());
        let mut headers: Vec<String> = Vec::with_capacity(header_cells.len());

        for (i, cell) in header_cells.iter().enumerate() {
            let header = cell_text(cell).unwrap_or_else(|| format!("Unnamed: {}", i));
            if headers.contains(&header) {
                columns.push(None);
            } else {
                headers.push(header.clone());
                columns.push(Some(header));
            }
        }

        let rows = grid
            .iter()
            .enumerate()
            .skip(header_row)
            .map(|(idx, cells)| {
                let mut obj = Map::new();
                for (i, column) in columns.iter().enumerate() {
                    if let Some(column) = column {
                        let value = cells.get(i).cloned().unwrap_or(Value::Null);
                        obj.insert(column.clone(), value);
                    }
                }
                Row {
                    number: idx + 1,
                    cells: obj,
                }
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }
}

impl Row {
    /// Build a row from a JSON object (non-objects give an empty row).
    pub fn from_json(number: usize, value: Value) -> Self {
        let cells = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { number, cells }
    }

    /// Raw cell value, `None` when the column does not exist.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Cell as text, `None` for missing columns and empty cells.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(cell_text)
    }

    /// True when every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| cell_text(v).is_none())
    }
}

/// Grid of a calamine range in sheet coordinates.
///
/// A range starts at its first used cell. Leading blank rows and columns
/// are put back as nulls so the header row and row numbers match the sheet.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<Value>> {
    let (top, left) = range.start().unwrap_or((0, 0));

    let mut grid: Vec<Vec<Value>> = vec![Vec::new(); top as usize];
    grid.extend(range.rows().map(|row| {
        iter::repeat(Value::Null)
            .take(left as usize)
            .chain(row.iter().map(cell_to_value))
            .collect()
    }));
    grid
}

/// Convert a calamine cell into a JSON scalar.
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => text_value(s),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTimeIso(s) | Data::DurationIso(s) => text_value(s),
        other => text_value(&other.to_string()),
    }
}

fn text_value(s: &str) -> Value {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

/// Render a cell as text.
///
/// Integral floats drop their fraction, so an ID typed as `1234` in a
/// spreadsheet reads back as `"1234"` and not `"1234.0"`.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// CSV sheets
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first lines.
///
/// Several lines are inspected because the first one is usually a title
/// banner with few or no separators.
pub fn detect_delimiter(content: &str) -> char {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(5)
        .collect();

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count: usize = sample.iter().map(|l| l.matches(sep).count()).sum();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes into a raw grid with encoding and delimiter detection.
pub fn parse_csv_grid(bytes: &[u8]) -> WorkbookResult<Vec<Vec<Value>>> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(text_value).collect());
    }

    Ok(grid)
}
