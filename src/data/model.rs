use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a measurement table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. SQLite columns carry no enforced type,
/// so every cell is read into this enum and coerced later where needed.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret an already-numeric cell as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Coerce the cell to a finite `f64`: numeric strings parse, booleans
    /// map to 1.0/0.0, everything unparseable (and NaN/inf) becomes
    /// missing.
    pub fn coerce_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }
}

// ---------------------------------------------------------------------------
// Dataset – one measurement table in memory
// ---------------------------------------------------------------------------

/// Required X column of every plottable table.
pub const VALUE_X: &str = "ValueX";
/// Required Y column of every plottable table.
pub const VALUE_Y: &str = "ValueY";

/// The contents of a single table: an ordered header plus rows of cells.
/// Rows always have exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names, in table order.
    pub columns: Vec<String>,
    /// Row-major cell data.
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// An empty dataset with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Dataset {
            columns,
            rows: Vec::new(),
        }
    }

    /// Index of a column by exact name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extract the `(ValueX, ValueY)` pair of every row whose X and Y
    /// cells are numeric. On a sanitized dataset this is one pair per row.
    pub fn xy_points(&self) -> Vec<(f64, f64)> {
        let (Some(xi), Some(yi)) = (self.column_index(VALUE_X), self.column_index(VALUE_Y))
        else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| Some((row[xi].as_f64()?, row[yi].as_f64()?)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ChartKind – the four rendering categories
// ---------------------------------------------------------------------------

/// Rendering category of a table, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Waveform,
    SpectrumHz,
    SpectrumOrder,
    Generic,
}

impl ChartKind {
    /// Map a table name to its chart kind. Case-insensitive substring
    /// tests in fixed order: waveform wins over the spectrum kinds,
    /// everything unrecognised is generic.
    pub fn from_table_name(table_name: &str) -> Self {
        let lower = table_name.to_lowercase();
        if lower.contains("waveform") {
            ChartKind::Waveform
        } else if lower.contains("spectrum_hz") {
            ChartKind::SpectrumHz
        } else if lower.contains("spectrum_order") {
            ChartKind::SpectrumOrder
        } else {
            ChartKind::Generic
        }
    }

    /// Display ordering used by the table sorter: Hz spectra first, then
    /// order spectra, then waveforms, then everything else.
    pub fn sort_priority(self) -> u8 {
        match self {
            ChartKind::SpectrumHz => 1,
            ChartKind::SpectrumOrder => 2,
            ChartKind::Waveform => 3,
            ChartKind::Generic => 4,
        }
    }

    /// Stable lower-case label, used in session summaries.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Waveform => "waveform",
            ChartKind::SpectrumHz => "spectrum_hz",
            ChartKind::SpectrumOrder => "spectrum_order",
            ChartKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
