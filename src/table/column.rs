use std::cmp::Ordering;
use std::fmt;

/// A value read out of a row, used for sorting and default rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Flag(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(text) => CellValue::Text(text.to_string()),
            None => CellValue::Empty,
        }
    }

    /// Parses numeric strings such as `"1200.00"`, falling back to text.
    pub fn numeric_text(value: &str) -> Self {
        match value.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => CellValue::Number(number),
            _ => CellValue::text(value),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Empty => 0,
            CellValue::Flag(_) => 1,
            CellValue::Number(_) => 2,
            CellValue::Text(_) => 3,
        }
    }

    /// Total order used by the sort engine: `Empty < Flag < Number < Text`.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Flag(a), CellValue::Flag(b)) => a.cmp(b),
            (CellValue::Number(a), CellValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (CellValue::Text(a), CellValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Flag(true) => write!(f, "Yes"),
            CellValue::Flag(false) => write!(f, "No"),
            CellValue::Number(number) if number.fract() == 0.0 => write!(f, "{number:.0}"),
            CellValue::Number(number) => write!(f, "{number}"),
            CellValue::Text(text) => write!(f, "{text}"),
        }
    }
}

pub type Accessor<T> = fn(&T) -> CellValue;
pub type Renderer<T> = fn(&T) -> String;

/// Declares how one column reads, sorts, and renders a row.
pub struct Column<T> {
    pub id: &'static str,
    pub header: &'static str,
    pub sortable: bool,
    accessor: Accessor<T>,
    renderer: Option<Renderer<T>>,
}

impl<T> Column<T> {
    pub fn new(id: &'static str, header: &'static str, accessor: Accessor<T>) -> Self {
        Self {
            id,
            header,
            sortable: false,
            accessor,
            renderer: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn render_with(mut self, renderer: Renderer<T>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }

    pub fn render(&self, row: &T) -> String {
        match self.renderer {
            Some(renderer) => renderer(row),
            None => self.value(row).to_string(),
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .finish()
    }
}
