/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TabularDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ TabularDataset│  Vec<Record>, typed schema, column index
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply column predicates → DerivedView
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
