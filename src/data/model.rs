use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell in a tabular column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common tabular dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
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
    /// Try to interpret the value as an `f64` for numeric filters and charts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the dataset
// ---------------------------------------------------------------------------

/// A single row: column_name → value.
pub type Record = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Broad column classification used by filters and prediction inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Every non-null cell is an integer or float.
    Numeric,
    /// Anything else (strings, bools, mixed).
    Categorical,
}

/// One entry of the enumerated dataset schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
}

// ---------------------------------------------------------------------------
// TabularDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
///
/// Immutable once built: a reload replaces the whole value, rows are never
/// mutated in place.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    /// All rows.
    pub records: Vec<Record>,
    /// Enumerated (name, type) schema, in column-name order.
    pub schema: Vec<ColumnSpec>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
    /// Observed (min, max) per numeric column, ignoring nulls.
    pub numeric_ranges: BTreeMap<String, (f64, f64)>,
}

impl TabularDataset {
    /// Build the schema and column indices from loaded rows.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut column_names: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = BTreeMap::new();

        for rec in &records {
            for (col, val) in rec {
                column_names.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }

        let schema: Vec<ColumnSpec> = column_names
            .into_iter()
            .map(|name| {
                let ty = infer_column_type(unique_values.get(&name));
                ColumnSpec { name, ty }
            })
            .collect();

        let mut numeric_ranges = BTreeMap::new();
        for spec in schema.iter().filter(|s| s.ty == ColumnType::Numeric) {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for rec in &records {
                if let Some(v) = rec.get(&spec.name).and_then(CellValue::as_f64) {
                    min = min.min(v);
                    max = max.max(v);
                }
            }
            if min <= max {
                numeric_ranges.insert(spec.name.clone(), (min, max));
            }
        }

        TabularDataset {
            records,
            schema,
            unique_values,
            numeric_ranges,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a column's schema entry.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.schema.iter().find(|c| c.name == name)
    }

    /// Names of all columns, in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of numeric columns only.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.schema
            .iter()
            .filter(|c| c.ty == ColumnType::Numeric)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Names of categorical columns only.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.schema
            .iter()
            .filter(|c| c.ty == ColumnType::Categorical)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Mean of a numeric column over non-null cells (slider defaults).
    pub fn column_mean(&self, name: &str) -> Option<f64> {
        let mut sum = 0.0;
        let mut n = 0usize;
        for rec in &self.records {
            if let Some(v) = rec.get(name).and_then(CellValue::as_f64) {
                sum += v;
                n += 1;
            }
        }
        if n == 0 {
            None
        } else {
            Some(sum / n as f64)
        }
    }
}

/// A column is numeric when every non-null value is a number and at least one
/// such value exists.
fn infer_column_type(values: Option<&BTreeSet<CellValue>>) -> ColumnType {
    let Some(values) = values else {
        return ColumnType::Categorical;
    };
    let mut saw_numeric = false;
    for v in values {
        match v {
            CellValue::Integer(_) | CellValue::Float(_) => saw_numeric = true,
            CellValue::Null => {}
            _ => return ColumnType::Categorical,
        }
    }
    if saw_numeric {
        ColumnType::Numeric
    } else {
        ColumnType::Categorical
    }
}
