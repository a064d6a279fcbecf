pub mod fields;
pub mod header;
pub mod rows;

pub use fields::{resolve, Field};
pub use header::locate_header;
pub use rows::{decode_rows, DecodedRow, RateSheet, RowOutcome};
