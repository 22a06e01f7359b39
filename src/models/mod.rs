pub mod columns;
pub mod match_result;
pub mod record;

pub use match_result::MatchResult;
pub use record::{RecordSet, ReferenceRecord, SourceRecord};
