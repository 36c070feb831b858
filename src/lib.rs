//! # ORF annotation of protein-to-genome alignments
//!
//! This library turns raw `tblastn` hits of a query protein against genomic
//! scaffolds into gene models.
//!
//! ## Core Algorithm
//!
//! 1. **Gap classification**: alignments whose query side carries a long gap
//!    run are set aside for manual handling
//! 2. **Codon boundary resolution**: from each clean alignment, walk outward
//!    in frame to the flanking stop codons and the first start codon
//! 3. **Multi-alignment reconciliation**: scaffolds with several hits are
//!    validated by reciprocal search, then trimmed to one fragment, removed
//!    or sent to review
//! 4. **Splice stitching**: two exon fragments are joined over a canonical
//!    `GT..AG` intron and checked with a reciprocal `blastp`
//!
//! External tools sit behind the [`gateway::SequenceDatabase`] and
//! [`gateway::HomologySearch`] traits.
//!
//! ## Usage Example
//!
//! ```ignore
//! use orfmend::{Annotator, AnnotatorConfig};
//! use orfmend::gateway::BlastDbCmd;
//!
//! let db = BlastDbCmd::new("nucl");
//! let annotator = Annotator::new(AnnotatorConfig::default());
//! let run = annotator.annotate(&db, records)?;
//! println!("{} ORFs, {} demoted", run.output.annotated.len(), run.output.missing_start.len());
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod annotation; // Gap classification, codon boundaries, ORF extraction
pub mod gateway; // Sequence database and homology search interfaces
pub mod io; // TSV tables
pub mod reconcile; // Multi-alignment reconciliation and splice stitching
pub mod sequence; // Codons, strands, translation

use std::path::PathBuf;

pub use annotation::{
    AlignmentRecord, AnnotatedOrf, GapClassifier, GapPartition, OrfAnnotationPipeline, OrfCall,
    PipelineOutput, ResolverError,
};
pub use gateway::GatewayError;
pub use io::TableError;
pub use reconcile::{
    MultiAlignmentEngine, Outcome, OutcomeLedger, ReconcileError, ReconciliationReport,
    ReferenceContext, ScaffoldFragments,
};

use thiserror::Error;
use tracing::info;

use crate::gateway::{HomologySearch, SequenceDatabase};

/// Configuration shared by the annotation and reconciliation passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatorConfig {
    /// Consecutive query gaps that send an alignment to manual handling.
    pub gap_run_threshold: usize,

    /// Threads handed to each BLAST search (`-num_threads`).
    pub search_threads: usize,

    /// Scaffolds reconciled in parallel.
    pub workers: usize,

    /// Directory holding the BLAST+ executables; `PATH` when unset.
    pub blast_bin_dir: Option<PathBuf>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            gap_run_threshold: annotation::DEFAULT_GAP_RUN_THRESHOLD,
            search_threads: 8,
            workers: 1,
            blast_bin_dir: None,
        }
    }
}

impl AnnotatorConfig {
    /// Set the gap-run threshold.
    pub fn with_gap_run_threshold(mut self, threshold: usize) -> Self {
        self.gap_run_threshold = threshold;
        self
    }

    /// Set the per-search thread count.
    pub fn with_search_threads(mut self, threads: usize) -> Self {
        self.search_threads = threads.max(1);
        self
    }

    /// Set the number of reconciliation workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the BLAST+ executable directory.
    pub fn with_blast_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.blast_bin_dir = Some(dir.into());
        self
    }
}

/// Errors that can occur during a run.
#[derive(Error, Debug)]
pub enum AnnotationError {
    /// External tool failure that could not be degraded.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Codon boundary resolution failed.
    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Reconciliation failed as a whole.
    #[error("reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Table could not be read or written.
    #[error("table error: {0}")]
    Table(#[from] TableError),
}

/// Clean/gapped split and the ORFs extracted from the clean side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRun {
    /// Partition after demotion of records without a start codon.
    pub partition: GapPartition,
    /// Annotated ORFs and the ids that were demoted.
    pub output: PipelineOutput,
}

/// Runs both passes with one configuration.
#[derive(Debug, Clone)]
pub struct Annotator {
    config: AnnotatorConfig,
}

impl Annotator {
    /// Create an annotator.
    pub fn new(config: AnnotatorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Partition `records` by gap runs and annotate the clean side.
    pub fn annotate<D>(
        &self,
        db: &D,
        records: Vec<AlignmentRecord>,
    ) -> Result<AnnotationRun, AnnotationError>
    where
        D: SequenceDatabase + ?Sized,
    {
        let mut partition =
            GapClassifier::new(self.config.gap_run_threshold).partition(records);
        let output = OrfAnnotationPipeline::new(db).run(&mut partition)?;
        Ok(AnnotationRun { partition, output })
    }

    /// Reconcile multi-alignment scaffolds against `references`.
    pub fn reconcile<D, S>(
        &self,
        db: &D,
        search: &S,
        references: impl IntoIterator<Item = ReferenceContext>,
        scaffolds: &[ScaffoldFragments],
    ) -> Result<ReconciliationReport, AnnotationError>
    where
        D: SequenceDatabase + ?Sized,
        S: HomologySearch + ?Sized,
    {
        let engine = references
            .into_iter()
            .fold(MultiAlignmentEngine::new(db, search), |engine, reference| {
                engine.with_reference(reference)
            });
        let ledger = engine.reconcile_all(scaffolds, self.config.workers)?;
        let report = ledger.into_report(scaffolds);
        info!(
            further_annotation = report.further_annotation.len(),
            auto_annotated = report.auto_annotated.len(),
            combined = report.combined.len(),
            removed = report.removed.len(),
            unresolved = report.unresolved.len(),
            "reconciliation report ready"
        );
        Ok(report)
    }
}
