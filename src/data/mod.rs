/// Data layer: typed records, loading, and selector queries.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .tsv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset / TrendDataset (validated once)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<YieldRecord>, state / crop index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  districts for a state, crop/year slices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;

pub use model::{CropYear, Dataset, Season, TrendDataset, TrendRecord, YieldRecord};
