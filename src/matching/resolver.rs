// src/matching/resolver.rs - Entry point tying normalization, blocking, scoring and selection together
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{RecordSide, ResolveError};
use crate::matching::assembler::{assemble, ResolvedBatch};
use crate::matching::blocking::{generate_candidate_pairs, CandidatePair};
use crate::matching::comparator::{FieldComparator, PairFeatures};
use crate::matching::normalize::normalize_record_set;
use crate::matching::selector::{select_best_matches, ReferenceKeys};
use crate::matching::state_codes::{normalize_state, uses_state_codes};
use crate::models::{columns, RecordSet};
use crate::utils::matching_config::MatchingConfig;
use crate::utils::progress_bars::logging::ResolveLogger;

/// Resolves `source` against `reference` with default settings and the given
/// minimum score. The output has one row per source row, in source order.
pub fn resolve(
    source: &RecordSet,
    reference: &RecordSet,
    min_score: i32,
) -> Result<ResolvedBatch, ResolveError> {
    Resolver::new(MatchingConfig::default().with_min_score(min_score)).resolve(source, reference)
}

pub struct Resolver {
    config: MatchingConfig,
    multi_progress: Option<MultiProgress>,
}

impl Resolver {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            config,
            multi_progress: None,
        }
    }

    /// Shows a comparison progress bar under `multi_progress`.
    pub fn with_progress(mut self, multi_progress: Option<MultiProgress>) -> Self {
        self.multi_progress = multi_progress;
        self
    }

    pub fn resolve(
        &self,
        source: &RecordSet,
        reference: &RecordSet,
    ) -> Result<ResolvedBatch, ResolveError> {
        let logger = ResolveLogger::new(Uuid::new_v4().to_string());
        logger.log_start(source.len(), reference.len(), self.config.min_score);
        if let Some(message) = self.config.min_score_warning() {
            logger.log_warning(&message);
        }

        logger.log_phase("Validating inputs", None);
        let source_ids = validated_source_ids(source)?;
        let reference_keys = validated_reference_keys(reference)?;
        let comparator = FieldComparator::new(
            &self.config.field_rules,
            source,
            reference,
            self.config.similarity_threshold,
        )?;
        logger.log_debug(&format!("Comparing fields: {:?}", comparator.compared_fields()));
        logger.log_duplicate_source_ids(count_duplicates(&source_ids));

        logger.log_phase("Normalizing fields", None);
        let (source_work, reference_work) = self.normalized_copies(source, reference, &logger);

        logger.log_phase("Generating candidate pairs", Some(&self.config.blocking_key));
        let candidates =
            generate_candidate_pairs(&source_work, &reference_work, &self.config.blocking_key);
        if candidates.degraded {
            logger.log_degraded_blocking(&self.config.blocking_key, candidates.len());
        } else {
            logger.log_candidates(candidates.len(), candidates.shared_buckets);
        }

        let best = if candidates.is_empty() {
            logger.log_no_matches("blocking produced no candidate pairs");
            Default::default()
        } else {
            logger.log_phase("Comparing fields", None);
            let features = self.compare(
                &comparator,
                &candidates.pairs,
                &source_work,
                &reference_work,
                &logger,
            );

            logger.log_phase("Selecting best matches", None);
            let selection = select_best_matches(
                &features,
                &source_ids,
                &reference_keys,
                self.config.min_score,
                self.config.tie_break,
            );
            logger.log_selection(selection.surviving_pairs, features.len(), selection.best.len());
            if selection.best.is_empty() {
                logger.log_no_matches("no pair reached the minimum score");
            }
            selection.best
        };

        logger.log_phase("Assembling results", None);
        let batch = assemble(source, &best);
        logger.log_completion(batch.len(), batch.matched_count(), batch.average_matched_score());
        Ok(batch)
    }

    fn normalized_copies(
        &self,
        source: &RecordSet,
        reference: &RecordSet,
        logger: &ResolveLogger,
    ) -> (RecordSet, RecordSet) {
        let mut source_work = source.clone();
        let state_codes = reference
            .column_values(columns::STATE)
            .map_or(false, |values| uses_state_codes(values));
        if state_codes {
            source_work.map_column(columns::STATE, normalize_state);
        }
        logger.log_state_codes(state_codes);

        (normalize_record_set(&source_work), normalize_record_set(reference))
    }

    fn compare(
        &self,
        comparator: &FieldComparator,
        pairs: &[CandidatePair],
        source: &RecordSet,
        reference: &RecordSet,
        logger: &ResolveLogger,
    ) -> Vec<PairFeatures> {
        let progress = self.multi_progress.as_ref().map(|mp| {
            let pb = mp.add(ProgressBar::new(pairs.len() as u64));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  🔗 [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} Comparing pairs...")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            pb
        });

        let run = || comparator.compare_all(pairs, source, reference, progress.as_ref());
        let features = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                logger.log_warning(&format!("Falling back to the global thread pool: {}", e));
                run()
            }
        };

        if let Some(pb) = progress {
            pb.finish_with_message(format!("Compared {} pairs", features.len()));
        }
        features
    }
}

fn validated_source_ids(source: &RecordSet) -> Result<Vec<&str>, ResolveError> {
    let ids = source
        .column_values(columns::SOURCE_ID)
        .ok_or_else(|| ResolveError::MissingColumn {
            side: RecordSide::Source,
            column: columns::SOURCE_ID.to_string(),
        })?;
    if let Some(row) = ids.iter().position(|id| id.trim().is_empty()) {
        return Err(ResolveError::MissingSourceId { row });
    }
    Ok(ids)
}

fn validated_reference_keys(reference: &RecordSet) -> Result<ReferenceKeys<'_>, ResolveError> {
    let required = |column: &str| {
        reference
            .column_values(column)
            .ok_or_else(|| ResolveError::MissingColumn {
                side: RecordSide::Reference,
                column: column.to_string(),
            })
    };
    Ok(ReferenceKeys {
        entity_ids: required(columns::MATCHED_ENTITY_ID)?,
        practice_names: required(columns::NAME)?,
    })
}

fn count_duplicates(ids: &[&str]) -> usize {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().filter(|id| !seen.insert(**id)).count()
}
