// src/utils/progress_bars/logging.rs - Logging helpers for resolution runs
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Tags every line of one `resolve` invocation with its batch id and elapsed time.
#[derive(Clone)]
pub struct ResolveLogger {
    batch_id: String,
    start_time: Instant,
}

impl ResolveLogger {
    const TAG: &'static str = "RESOLVE";
    const EMOJI: &'static str = "🔗";

    pub fn new(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, source_rows: usize, reference_rows: usize, min_score: i32) {
        info!(
            "[{}] {} 🚀 Starting resolution (batch ID: {}): {} source records vs {} reference records, min score {}",
            Self::TAG, Self::EMOJI, self.batch_id, source_rows, reference_rows, min_score
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                Self::TAG, Self::EMOJI, phase, details, elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                Self::TAG, Self::EMOJI, phase, elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_state_codes(&self, applied: bool) {
        if applied {
            info!(
                "[{}] {} 🗺️  Reference regions use postal codes; mapping source regions to codes",
                Self::TAG, Self::EMOJI
            );
        } else {
            debug!(
                "[{}] {} Reference regions are not postal codes; source regions left as submitted",
                Self::TAG, Self::EMOJI
            );
        }
    }

    pub fn log_duplicate_source_ids(&self, duplicates: usize) {
        if duplicates > 0 {
            warn!(
                "[{}] {} ⚠️  {} source records repeat an earlier SourceID; each repeated id keeps a single match",
                Self::TAG, Self::EMOJI, duplicates
            );
        }
    }

    pub fn log_degraded_blocking(&self, key: &str, pairs: usize) {
        warn!(
            "[{}] {} ⚠️  Blocking key '{}' missing from an input; comparing the full cross product ({} pairs)",
            Self::TAG, Self::EMOJI, key, pairs
        );
    }

    pub fn log_candidates(&self, pairs: usize, shared_buckets: usize) {
        info!(
            "[{}] {} 📈 Candidate pairs to evaluate: {} (from {} shared blocks)",
            Self::TAG, Self::EMOJI, pairs, shared_buckets
        );
    }

    pub fn log_no_matches(&self, reason: &str) {
        info!(
            "[{}] {} ✨ No matches: {}; every record keeps default scores",
            Self::TAG, Self::EMOJI, reason
        );
    }

    pub fn log_selection(&self, surviving_pairs: usize, candidate_pairs: usize, sources_matched: usize) {
        let percent_kept = if candidate_pairs > 0 {
            (surviving_pairs as f64 / candidate_pairs as f64) * 100.0
        } else {
            0.0
        };
        info!(
            "[{}] {} 🎯 Score filtering: {} of {} pairs kept ({:.1}%), best match chosen for {} source ids",
            Self::TAG, Self::EMOJI, surviving_pairs, candidate_pairs, percent_kept, sources_matched
        );
    }

    pub fn log_completion(&self, total_rows: usize, matched_rows: usize, avg_score: f64) {
        info!(
            "[{}] {} ✅ Completed in {:.2?}: {} records, {} matched, {} unmatched, avg matched score {:.2}",
            Self::TAG,
            Self::EMOJI,
            self.get_elapsed(),
            total_rows,
            matched_rows,
            total_rows.saturating_sub(matched_rows),
            avg_score
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", Self::TAG, Self::EMOJI, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", Self::TAG, Self::EMOJI, message);
    }

    pub fn get_elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

pub fn log_run_start(run_id: &str, source_name: &str, file_name: &str) {
    info!("🚀 === DSO reconciliation run {} ===", run_id);
    info!("   Source organization: {}", source_name);
    info!("   Upload: {}", file_name);
}

pub fn log_run_phase(phase: &str, details: Option<&str>) {
    match details {
        Some(details) => info!("📋 {} - {}", phase, details),
        None => info!("📋 {}", phase),
    }
}

pub fn log_run_completion(phase_times: &[(&str, Duration)], rows: usize, matched: usize) {
    let total: Duration = phase_times.iter().map(|(_, d)| *d).sum();
    info!("=== Run Summary ===");
    info!("Records processed: {} ({} matched)", rows, matched);
    for (phase, duration) in phase_times {
        info!("{}: {:.2?}", phase, duration);
    }
    info!("Total execution time: {:.2?}", total);
}
