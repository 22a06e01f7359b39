pub mod error;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod utils;
pub mod warehouse;

pub use error::{RecordSide, ResolveError};
pub use matching::assembler::ResolvedBatch;
pub use matching::resolver::{resolve, Resolver};
pub use models::{MatchResult, RecordSet};
pub use utils::matching_config::MatchingConfig;
