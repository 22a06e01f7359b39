//! Matching parameters for the resolution engine.
//! Values come from the environment; anything unparsable falls back to its default.

use log::{info, warn};
use std::env;
use std::str::FromStr;

use crate::matching::comparator::{default_field_rules, FieldRule, DEFAULT_SIMILARITY_THRESHOLD};
use crate::matching::selector::{TieBreak, DEFAULT_MIN_SCORE};
use crate::models::columns;

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Minimum `TotalScore` a pair needs to be kept.
    pub min_score: i32,
    /// Jaro-Winkler similarity at or above which a field counts as matched.
    pub similarity_threshold: f64,
    /// Column both sides are bucketed on before comparison.
    pub blocking_key: String,
    pub tie_break: TieBreak,
    /// Worker threads used for pair comparison.
    pub workers: usize,
    pub field_rules: Vec<FieldRule>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            blocking_key: columns::STATE.to_string(),
            tie_break: TieBreak::default(),
            workers: num_cpus::get(),
            field_rules: default_field_rules(),
        }
    }
}

impl MatchingConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_score: env_or("MATCH_MIN_SCORE", defaults.min_score),
            similarity_threshold: env_or("MATCH_SIMILARITY_THRESHOLD", defaults.similarity_threshold),
            blocking_key: env::var("MATCH_BLOCKING_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .unwrap_or(defaults.blocking_key),
            tie_break: env_or("MATCH_TIE_BREAK", defaults.tie_break),
            workers: env_or("MATCH_WORKERS", defaults.workers).max(1),
            field_rules: defaults.field_rules,
        }
    }

    pub fn with_min_score(mut self, min_score: i32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn log_config(&self) {
        info!("🔗 Matching configuration:");
        info!("   Minimum score: {} of {}", self.min_score, self.field_rules.len());
        info!("   Similarity threshold: {:.2}", self.similarity_threshold);
        info!("   Blocking key: {}", self.blocking_key);
        info!("   Tie-break: {}", self.tie_break);
        info!("   Comparison workers: {}", self.workers);
        if let Some(message) = self.min_score_warning() {
            warn!("   {}", message);
        }
    }

    /// Describes a minimum score that cannot behave as a threshold.
    pub fn min_score_warning(&self) -> Option<String> {
        let max = self.field_rules.len() as i32;
        if (0..=max).contains(&self.min_score) {
            return None;
        }
        Some(format!(
            "Minimum score {} is outside 0..={}; this matches {}",
            self.min_score,
            max,
            if self.min_score < 0 { "every candidate" } else { "nothing" }
        ))
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}='{}', using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = MatchingConfig::default();
        assert_eq!(config.min_score, 2);
        assert_eq!(config.similarity_threshold, 0.85);
        assert_eq!(config.blocking_key, "State");
        assert_eq!(config.tie_break, TieBreak::LowestEntityId);
        assert!(config.workers >= 1);
        assert_eq!(config.field_rules.len(), 4);
    }

    #[test]
    fn test_env_config() {
        env::set_var("MATCH_MIN_SCORE", "3");
        env::set_var("MATCH_SIMILARITY_THRESHOLD", "0.9");
        env::set_var("MATCH_BLOCKING_KEY", "Zip");
        env::set_var("MATCH_TIE_BREAK", "first_generated");
        env::set_var("MATCH_WORKERS", "not-a-number");

        let config = MatchingConfig::from_env();
        assert_eq!(config.min_score, 3);
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.blocking_key, "Zip");
        assert_eq!(config.tie_break, TieBreak::FirstGenerated);
        assert_eq!(config.workers, num_cpus::get().max(1));

        // Clean up
        env::remove_var("MATCH_MIN_SCORE");
        env::remove_var("MATCH_SIMILARITY_THRESHOLD");
        env::remove_var("MATCH_BLOCKING_KEY");
        env::remove_var("MATCH_TIE_BREAK");
        env::remove_var("MATCH_WORKERS");
    }

    #[test]
    fn test_min_score_warning_outside_field_count() {
        assert!(MatchingConfig::default().min_score_warning().is_none());
        assert!(MatchingConfig::default().with_min_score(4).min_score_warning().is_none());

        let negative = MatchingConfig::default().with_min_score(-1).min_score_warning();
        assert!(negative.unwrap().contains("every candidate"));
        let too_high = MatchingConfig::default().with_min_score(5).min_score_warning();
        assert!(too_high.unwrap().contains("nothing"));
    }

    #[test]
    fn test_with_min_score_overrides() {
        let config = MatchingConfig::default().with_min_score(4);
        assert_eq!(config.min_score, 4);
    }
}
