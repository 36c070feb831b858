use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, error, info};

use super::{
    classify, Fragment, IntronSpliceStitcher, Outcome, OutcomeLedger, ReconcileError,
    ReferenceContext, Route, ScaffoldFragments, ScaffoldKey,
};
use crate::gateway::{
    fetch_or_empty, search_or_empty, HomologySearch, SearchProgram, SearchQuery, SequenceDatabase,
};
use crate::sequence::Strand;

/// Resolves multi-alignment scaffolds against per-species reference
/// proteins.
#[derive(Debug)]
pub struct MultiAlignmentEngine<'a, D: ?Sized, S: ?Sized> {
    db: &'a D,
    search: &'a S,
    references: HashMap<String, ReferenceContext>,
}

impl<'a, D, S> MultiAlignmentEngine<'a, D, S>
where
    D: SequenceDatabase + ?Sized,
    S: HomologySearch + ?Sized,
{
    /// Engine over the given gateways with no references configured.
    pub fn new(db: &'a D, search: &'a S) -> Self {
        Self {
            db,
            search,
            references: HashMap::new(),
        }
    }

    /// Register the reference protein of a query species.
    pub fn with_reference(mut self, reference: ReferenceContext) -> Self {
        self.references.insert(reference.species.clone(), reference);
        self
    }

    /// Reference context of `species`.
    pub fn reference(&self, species: &str) -> Result<&ReferenceContext, ReconcileError> {
        self.references
            .get(species)
            .ok_or_else(|| ReconcileError::MissingReference(species.to_string()))
    }

    /// Indices of the fragments whose top `blastx` hit is the reference
    /// protein, in fragment order.
    pub fn validate_fragments(
        &self,
        scaffold: &ScaffoldFragments,
        reference: &ReferenceContext,
    ) -> Vec<usize> {
        scaffold
            .fragments
            .iter()
            .enumerate()
            .filter(|(_, fragment)| self.top_hit_is_reference(scaffold, fragment, reference))
            .map(|(index, _)| index)
            .collect()
    }

    fn top_hit_is_reference(
        &self,
        scaffold: &ScaffoldFragments,
        fragment: &Fragment,
        reference: &ReferenceContext,
    ) -> bool {
        let (start, stop) = match fragment.strand() {
            Strand::Plus => (fragment.subject_start, fragment.subject_stop),
            Strand::Minus => (fragment.subject_stop, fragment.subject_start),
        };
        let bases = if start < stop {
            fetch_or_empty(self.db, &scaffold.scaffold_id, Strand::Plus, Some((start, stop)))
        } else {
            fetch_or_empty(self.db, &scaffold.scaffold_id, Strand::Minus, Some((stop, start)))
        };

        let query = SearchQuery::new(
            scaffold.scaffold_id.as_str(),
            scaffold.species_name.as_str(),
            bases,
        );
        search_or_empty(self.search, SearchProgram::BlastX, &query, &reference.protein_db)
            .first()
            .is_some_and(|hit| hit.subject_id == reference.reference_protein_id)
    }

    /// Keep a lone validated fragment; send several to manual review.
    pub fn process_manual(&self, scaffold: &ScaffoldFragments) -> Result<Outcome, ReconcileError> {
        let reference = self.reference(&scaffold.query_species)?;
        let valid = self.validate_fragments(scaffold, reference);
        Ok(match valid.as_slice() {
            [] => Outcome::Remove,
            [only] => Outcome::Keep {
                fragment_index: *only,
            },
            _ => Outcome::FurtherAnnotation,
        })
    }

    /// Keep the validated fragment with the longest scaffold span.
    ///
    /// Equal spans keep the earlier fragment.
    pub fn process_longer(&self, scaffold: &ScaffoldFragments) -> Result<Outcome, ReconcileError> {
        let reference = self.reference(&scaffold.query_species)?;
        let valid = self.validate_fragments(scaffold, reference);
        let Some((&first, rest)) = valid.split_first() else {
            return Ok(Outcome::Remove);
        };

        let span = |index: usize| scaffold.fragments[index].subject_length();
        let mut best = first;
        let mut best_len = span(first);
        for &index in rest {
            let len = span(index);
            if len > best_len {
                best = index;
                best_len = len;
            }
        }
        Ok(Outcome::Keep {
            fragment_index: best,
        })
    }

    /// Splice the two fragments into one gene.
    pub fn process_no_overlaps(
        &self,
        scaffold: &ScaffoldFragments,
    ) -> Result<Outcome, ReconcileError> {
        let reference = self.reference(&scaffold.query_species)?;
        IntronSpliceStitcher::new(self.db, self.search)
            .stitch(scaffold, reference)
            .map(Outcome::Combine)
    }

    /// Route `scaffold` and resolve it.
    pub fn reconcile(&self, scaffold: &ScaffoldFragments) -> Result<Outcome, ReconcileError> {
        let route = classify(scaffold);
        let outcome = match route {
            Route::Manual => self.process_manual(scaffold),
            Route::Longer => self.process_longer(scaffold),
            Route::NoOverlaps => self.process_no_overlaps(scaffold),
        }?;
        debug!(
            scaffold = %ScaffoldKey::of(scaffold),
            ?route,
            outcome = outcome.label(),
            "reconciled scaffold"
        );
        Ok(outcome)
    }

    /// Reconcile every scaffold on a pool of `workers` threads.
    ///
    /// A failing scaffold is logged and listed as unresolved; the batch
    /// carries on. A scaffold listed twice keeps its first outcome.
    pub fn reconcile_all(
        &self,
        scaffolds: &[ScaffoldFragments],
        workers: usize,
    ) -> Result<OutcomeLedger, ReconcileError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()?;

        let ledger = pool.install(|| {
            scaffolds
                .par_iter()
                .fold(OutcomeLedger::new, |mut ledger, scaffold| {
                    let key = ScaffoldKey::of(scaffold);
                    match self.reconcile(scaffold) {
                        Ok(outcome) => {
                            if let Err(err) = ledger.record(key, outcome) {
                                error!(error = %err, "duplicate scaffold ignored");
                            }
                        }
                        Err(err) => {
                            error!(scaffold = %key, error = %err, "scaffold left unresolved");
                            ledger.mark_unresolved(key, err.to_string());
                        }
                    }
                    ledger
                })
                .reduce(OutcomeLedger::new, |mut left, right| {
                    if let Err(err) = left.merge(right) {
                        error!(error = %err, "conflicting outcomes across workers");
                    }
                    left
                })
        });

        info!(
            scaffolds = scaffolds.len(),
            resolved = ledger.len(),
            unresolved = ledger.unresolved().len(),
            "reconciliation finished"
        );
        Ok(ledger)
    }
}
