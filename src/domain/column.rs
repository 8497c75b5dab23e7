use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::utils::format_grouped;

/// Escape hatch for cells that none of the built-in kinds can render.
pub type CellRenderer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

#[derive(Clone)]
pub enum ColumnKind {
    Text,
    Numeric { decimals: usize },
    Currency,
    Custom(CellRenderer),
}

impl fmt::Debug for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Text => write!(f, "Text"),
            ColumnKind::Numeric { decimals } => write!(f, "Numeric({decimals})"),
            ColumnKind::Currency => write!(f, "Currency"),
            ColumnKind::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl PartialEq for ColumnKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColumnKind::Text, ColumnKind::Text) => true,
            (ColumnKind::Currency, ColumnKind::Currency) => true,
            (ColumnKind::Numeric { decimals: a }, ColumnKind::Numeric { decimals: b }) => a == b,
            (ColumnKind::Custom(a), ColumnKind::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub id: String,
    pub header: String,
    pub kind: ColumnKind,
    pub align: Align,
    pub sortable: bool,
}

impl ColumnDescriptor {
    pub fn new(id: impl Into<String>, header: impl Into<String>, kind: ColumnKind) -> Self {
        let align = match kind {
            ColumnKind::Numeric { .. } | ColumnKind::Currency => Align::Right,
            _ => Align::Left,
        };
        Self {
            id: id.into(),
            header: header.into(),
            kind,
            align,
            sortable: true,
        }
    }

    pub fn text(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self::new(id, header, ColumnKind::Text)
    }

    pub fn numeric(id: impl Into<String>, header: impl Into<String>, decimals: usize) -> Self {
        Self::new(id, header, ColumnKind::Numeric { decimals })
    }

    pub fn currency(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self::new(id, header, ColumnKind::Currency)
    }

    pub fn custom<R>(id: impl Into<String>, header: impl Into<String>, render: R) -> Self
    where
        R: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self::new(id, header, ColumnKind::Custom(Arc::new(render)))
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Raw cell value of `row` for this column.
    pub fn value_of<'a>(&self, row: &'a Value) -> Option<&'a Value> {
        row.get(&self.id)
    }

    pub fn render(&self, value: Option<&Value>) -> String {
        let value = match value {
            None | Some(Value::Null) => return String::new(),
            Some(value) => value,
        };

        match &self.kind {
            ColumnKind::Text => plain_text(value),
            ColumnKind::Numeric { decimals } => match as_number(value) {
                Some(number) => format_grouped(number, *decimals),
                None => plain_text(value),
            },
            ColumnKind::Currency => match as_number(value) {
                Some(number) if number < 0.0 => format!("-${}", format_grouped(-number, 2)),
                Some(number) => format!("${}", format_grouped(number, 2)),
                None => plain_text(value),
            },
            ColumnKind::Custom(render) => render(value),
        }
    }

    pub fn render_cell(&self, row: &Value) -> String {
        self.render(self.value_of(row))
    }
}

/// Strings without quotes, everything else as compact JSON.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Numbers and numeric strings; the backend sends decimals as strings.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}
