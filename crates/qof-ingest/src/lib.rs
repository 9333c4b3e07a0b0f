pub mod csv_table;
pub mod discovery;
pub mod error;
pub mod polars_utils;

pub use csv_table::{CsvTable, read_csv_table, read_practice_ids};
pub use discovery::{
    MeasureFile, PRACTICE_COUNT_PREFIX, discover_measure_files, list_csv_files,
    list_practice_count_files,
};
pub use error::{IngestError, Result};
pub use polars_utils::{
    CountCell, any_to_f64, any_to_string, any_to_string_non_empty, format_numeric, parse_count,
    parse_f64,
};
