/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///      DATA.csv (UTF-8, else ISO-8859-1)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode + parse → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, schema, derived Conversion_Rate / Month
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSelection → FilteredView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ aggregate, stats  │  group-by sums/means, top-N, correlation, bins
///   └──────────────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
