//! Bulk export of a sheet.

pub mod tsv;

pub use tsv::{texts_to_string, values_to_string, write_texts, write_values};
