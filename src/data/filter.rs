use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DatascopeError, Result};

use super::model::{CellValue, ColumnType, TabularDataset};

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// Accepted-value predicate for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Categorical membership: the cell value must be in the set.
    /// An empty set accepts nothing (deliberate, not an error).
    AnyOf(BTreeSet<CellValue>),
    /// Inclusive numeric interval `[lo, hi]`.
    Between(f64, f64),
}

impl Predicate {
    /// Whether a cell (possibly absent) satisfies this predicate.
    ///
    /// A missing cell passes an `AnyOf` filter only when `Null` is selected,
    /// and never passes an interval filter.
    fn accepts(&self, value: Option<&CellValue>) -> bool {
        match self {
            Predicate::AnyOf(selected) => match value {
                Some(v) => selected.contains(v),
                None => selected.contains(&CellValue::Null),
            },
            Predicate::Between(lo, hi) => value
                .and_then(CellValue::as_f64)
                .map(|v| *lo <= v && v <= *hi)
                .unwrap_or(false),
        }
    }
}

/// Per-column filter selections: column_name → predicate.
/// Columns absent from the map impose no constraint.
pub type FilterSpec = BTreeMap<String, Predicate>;

// ---------------------------------------------------------------------------
// DerivedView – the filtered subset plus its summary
// ---------------------------------------------------------------------------

/// Descriptive statistics for one numeric column over the retained rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    /// Non-null cells among retained rows.
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Indices of rows passing the current filters, with per-numeric-column
/// statistics.  Recomputed from scratch whenever the dataset or the filters
/// change; cheap at the target dataset sizes, so never cached.
#[derive(Debug, Clone, Default)]
pub struct DerivedView {
    pub indices: Vec<usize>,
    pub summaries: Vec<ColumnSummary>,
}

impl DerivedView {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply a filter spec to a dataset.
///
/// A row is retained iff every predicate in `filters` accepts its value for
/// that predicate's column (AND across filters, OR within a value set).
/// Fails with `SchemaMismatch` when a filter names a column missing from the
/// dataset schema, or puts an interval on a non-numeric column.
pub fn apply(dataset: &TabularDataset, filters: &FilterSpec) -> Result<DerivedView> {
    for (column, predicate) in filters {
        let Some(spec) = dataset.column(column) else {
            return Err(DatascopeError::SchemaMismatch {
                column: column.clone(),
                reason: "not in dataset schema".into(),
            });
        };
        if matches!(predicate, Predicate::Between(_, _)) && spec.ty != ColumnType::Numeric {
            return Err(DatascopeError::SchemaMismatch {
                column: column.clone(),
                reason: "interval filter on a non-numeric column".into(),
            });
        }
    }

    let indices: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            filters
                .iter()
                .all(|(col, pred)| pred.accepts(rec.get(col.as_str())))
        })
        .map(|(i, _)| i)
        .collect();

    let summaries = summarize(dataset, &indices);

    Ok(DerivedView { indices, summaries })
}

/// Describe each numeric column over the retained rows.
fn summarize(dataset: &TabularDataset, indices: &[usize]) -> Vec<ColumnSummary> {
    dataset
        .numeric_columns()
        .into_iter()
        .filter_map(|column| {
            let values: Vec<f64> = indices
                .iter()
                .filter_map(|&i| dataset.records[i].get(&column).and_then(CellValue::as_f64))
                .collect();
            if values.is_empty() {
                return None;
            }

            let count = values.len();
            let mean = values.iter().sum::<f64>() / count as f64;
            let std = if count > 1 {
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (count - 1) as f64;
                var.sqrt()
            } else {
                0.0
            };
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            Some(ColumnSummary {
                column,
                count,
                mean,
                std,
                min,
                max,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn class_dataset() -> TabularDataset {
        // 10 rows: class A ×6, class B ×4, with an increasing numeric column.
        let records: Vec<Record> = (0..10)
            .map(|i| {
                let mut rec = Record::new();
                let class = if i < 6 { "A" } else { "B" };
                rec.insert("class".into(), CellValue::String(class.into()));
                rec.insert("score".into(), CellValue::Float(i as f64));
                rec
            })
            .collect();
        TabularDataset::from_records(records)
    }

    fn any_of(values: &[CellValue]) -> Predicate {
        Predicate::AnyOf(values.iter().cloned().collect())
    }

    #[test]
    fn empty_spec_returns_everything() {
        let ds = class_dataset();
        let view = apply(&ds, &FilterSpec::new()).unwrap();
        assert_eq!(view.len(), ds.len());
    }

    #[test]
    fn filters_never_grow_the_view() {
        let ds = class_dataset();
        let mut filters = FilterSpec::new();
        filters.insert("class".into(), any_of(&[CellValue::String("A".into())]));
        filters.insert("score".into(), Predicate::Between(2.0, 8.0));

        let view = apply(&ds, &filters).unwrap();
        assert!(view.len() <= ds.len());
        // class ∈ {A} ∧ score ∈ [2, 8] → rows 2..=5
        assert_eq!(view.indices, vec![2, 3, 4, 5]);
    }

    #[test]
    fn class_membership_scenario() {
        let ds = class_dataset();
        let mut filters = FilterSpec::new();
        filters.insert("class".into(), any_of(&[CellValue::String("A".into())]));

        let view = apply(&ds, &filters).unwrap();
        assert_eq!(view.len(), 6);
        for &i in &view.indices {
            assert_eq!(ds.records[i]["class"], CellValue::String("A".into()));
        }
    }

    #[test]
    fn all_satisfying_filter_changes_nothing() {
        let ds = class_dataset();
        let baseline = apply(&ds, &FilterSpec::new()).unwrap();

        let mut filters = FilterSpec::new();
        filters.insert(
            "class".into(),
            any_of(&[
                CellValue::String("A".into()),
                CellValue::String("B".into()),
            ]),
        );
        let view = apply(&ds, &filters).unwrap();
        assert_eq!(view.indices, baseline.indices);
    }

    #[test]
    fn empty_selection_yields_empty_view() {
        let ds = class_dataset();
        let mut filters = FilterSpec::new();
        filters.insert("class".into(), any_of(&[]));

        let view = apply(&ds, &filters).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn interval_is_inclusive_on_both_ends() {
        let ds = class_dataset();
        let mut filters = FilterSpec::new();
        filters.insert("score".into(), Predicate::Between(3.0, 5.0));

        let view = apply(&ds, &filters).unwrap();
        assert_eq!(view.indices, vec![3, 4, 5]);
    }

    #[test]
    fn unknown_column_is_schema_mismatch() {
        let ds = class_dataset();
        let mut filters = FilterSpec::new();
        filters.insert("cabin".into(), any_of(&[CellValue::Null]));

        let err = apply(&ds, &filters).unwrap_err();
        match err {
            DatascopeError::SchemaMismatch { column, .. } => assert_eq!(column, "cabin"),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn interval_on_categorical_is_schema_mismatch() {
        let ds = class_dataset();
        let mut filters = FilterSpec::new();
        filters.insert("class".into(), Predicate::Between(0.0, 1.0));

        let err = apply(&ds, &filters).unwrap_err();
        assert!(matches!(err, DatascopeError::SchemaMismatch { .. }));
    }

    #[test]
    fn summary_describes_the_filtered_rows() {
        let ds = class_dataset();
        let mut filters = FilterSpec::new();
        filters.insert("score".into(), Predicate::Between(0.0, 2.0));

        let view = apply(&ds, &filters).unwrap();
        let summary = view
            .summaries
            .iter()
            .find(|s| s.column == "score")
            .unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 1.0).abs() < 1e-12);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 2.0);
    }
}
