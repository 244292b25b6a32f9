// Adapters layer: concrete implementations of the domain ports.

pub mod csv_table;

pub use csv_table::CsvTableStore;
