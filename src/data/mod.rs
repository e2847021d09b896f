//! Input data: the entity dataset and its CSV readers.

mod dataset;
mod io;

pub use dataset::Dataset;
pub use io::{
    parse_year, read_csv, read_csv_path, read_long_csv, read_wide_csv, CsvLayout, DATE_COLUMN,
    ENTITY_COLUMN, VARIABLE_COLUMN,
};
