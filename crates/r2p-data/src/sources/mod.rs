pub mod arrow_source;

pub use arrow_source::table_from_record_batch;
