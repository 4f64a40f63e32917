//! Market data suppliers: CSV files on disk and a deterministic synthetic walk.

pub mod csv_import;
pub mod provider;
pub mod synthetic;

pub use csv_import::{parse_csv, read_csv_series, CsvProvider};
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::{price_limit, synthetic_series, SyntheticProvider};
