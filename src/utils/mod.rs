pub mod db_connect;
pub mod env;
pub mod matching_config;
pub mod progress_bars;
