//! Reconciliation of scaffolds carrying several alignments of one query.
//!
//! Each scaffold is routed by [`classify`] and resolved by the
//! [`MultiAlignmentEngine`] into exactly one [`Outcome`], collected in an
//! [`OutcomeLedger`]. Exon-split pairs go through the
//! [`IntronSpliceStitcher`].

mod engine;
mod fragments;
mod outcome;
mod splice;

use std::path::PathBuf;

use thiserror::Error;

pub use engine::MultiAlignmentEngine;
pub use fragments::{alignments_overlap, classify, Fragment, Route, ScaffoldFragments};
pub use outcome::{
    CombinedGene, KeptAlignment, Outcome, OutcomeLedger, ReconciliationReport, ScaffoldKey,
    SpeciesCounts, UnresolvedScaffold,
};
pub use splice::{IntronSpliceStitcher, SplicedGene};

/// Errors raised while reconciling a scaffold.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No donor/acceptor pair produced a validated coding sequence.
    #[error("no valid splice combination for {0}")]
    NoValidCombination(ScaffoldKey),

    /// A second outcome was recorded for a scaffold.
    #[error("scaffold {0} already has an outcome")]
    DuplicateOutcome(ScaffoldKey),

    /// Splice stitching needs exactly two fragments.
    #[error("scaffold {key} has {count} fragments; stitching needs two")]
    UnsupportedFragmentCount {
        /// Which scaffold.
        key: ScaffoldKey,
        /// Fragments present.
        count: usize,
    },

    /// Splice stitching needs both fragments on one strand.
    #[error("scaffold {0} mixes strands")]
    MixedStrand(ScaffoldKey),

    /// No reference protein was configured for the query species.
    #[error("no reference configured for query species '{0}'")]
    MissingReference(String),

    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Reference protein of one query species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceContext {
    /// Query species name.
    pub species: String,
    /// Protein id every reciprocal search must hit.
    pub reference_protein_id: String,
    /// Protein database of the query species.
    pub protein_db: PathBuf,
}

impl ReferenceContext {
    /// Reference context for `species`.
    pub fn new(
        species: impl Into<String>,
        reference_protein_id: impl Into<String>,
        protein_db: impl Into<PathBuf>,
    ) -> Self {
        Self {
            species: species.into(),
            reference_protein_id: reference_protein_id.into(),
            protein_db: protein_db.into(),
        }
    }
}
