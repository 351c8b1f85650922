pub mod csv_file;

pub use csv_file::{read_csv, write_csv};
