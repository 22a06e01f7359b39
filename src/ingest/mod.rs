pub mod column_mapping;
pub mod loader;

pub use column_mapping::{stamp_upload, ColumnMapping, IGNORE_COLUMN};
pub use loader::{load_records, write_csv};
