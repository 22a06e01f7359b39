// src/utils/env.rs
use log::{debug, info};

/// Loads variables from a `.env` file in the working directory (or a parent)
/// without overriding anything already set in the process environment.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}
